// ============================================================================
// Erreurs de la couche réseau
// ============================================================================
// Toute erreur de fetch est capturée à la frontière du client : l'appelant
// la traite comme "pas de données pour ce cycle".
// ============================================================================

use reqwest::StatusCode;
use thiserror::Error;

/// Échec d'un appel à l'API de prix
#[derive(Error, Debug)]
pub enum FetchError {
    /// La requête n'a pas abouti (connexion, DNS, timeout client)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Statut HTTP hors 2xx
    #[error("Bad response: HTTP {status}")]
    BadStatus { status: StatusCode },

    /// Corps de réponse illisible ou de forme inattendue
    #[error("Bad response: {0}")]
    BadBody(String),

    /// Opération tentée sans clé API (jamais envoyée sur le réseau)
    #[error("No API key configured")]
    NoApiKey,
}

impl FetchError {
    /// Vrai pour les erreurs que la taxonomie range sous "BadResponse"
    pub fn is_bad_response(&self) -> bool {
        matches!(self, FetchError::BadStatus { .. } | FetchError::BadBody(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::BadBody(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::BadStatus { status }
        } else {
            FetchError::Network(err)
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::BadBody(err.to_string())
    }
}

/// Alias pour les résultats de la couche réseau
pub type FetchResult<T> = std::result::Result<T, FetchError>;
