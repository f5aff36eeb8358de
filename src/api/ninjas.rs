// ============================================================================
// API Client : API Ninjas (crypto)
// ============================================================================
// Deux endpoints, authentifiés par le header X-Api-Key :
// - GET {base}/v1/cryptoprice?symbol=btc  -> { "symbol": "BTCUSD", "price": "61234.5", ... }
// - GET {base}/v1/cryptosymbols           -> { "symbols": ["BTCUSD", "ETHUSD", ...] }
//
// Les appels sont faits strictement l'un après l'autre : pas de batch, pas
// de parallélisme. Un seul échec abandonne tout le cycle.
// ============================================================================

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::api::error::{FetchError, FetchResult};
use crate::models::{PriceQuote, PRICE_UNAVAILABLE};

/// URL de base de l'API en production
pub const DEFAULT_API_BASE: &str = "https://api.api-ninjas.com";

/// Header d'authentification attendu par l'API
const API_KEY_HEADER: &str = "X-Api-Key";

/// Réponse de l'endpoint `cryptosymbols`
#[derive(Debug, Deserialize)]
struct SymbolsResponse {
    symbols: Vec<String>,
}

/// Client pour les endpoints crypto d'API Ninjas
///
/// CONCEPT RUST : Clone bon marché
/// - reqwest::Client est un Arc interne, le cloner partage le pool de connexions
#[derive(Debug, Clone)]
pub struct NinjasClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NinjasClient {
    /// Crée un client avec le client HTTP par défaut de reqwest
    pub fn new(base_url: &str, api_key: &str) -> FetchResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("cryptopanel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Network)?;

        Ok(Self::with_http(http, base_url, api_key))
    }

    /// Crée un client qui réutilise un `reqwest::Client` existant
    pub fn with_http(http: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
        }
    }

    fn price_url(&self) -> String {
        format!("{}/v1/cryptoprice", self.base_url)
    }

    fn symbols_url(&self) -> String {
        format!("{}/v1/cryptosymbols", self.base_url)
    }

    /// Refuse d'émettre une requête sans clé
    fn ensure_api_key(&self) -> FetchResult<()> {
        if self.api_key.is_empty() {
            return Err(FetchError::NoApiKey);
        }
        Ok(())
    }

    /// Récupère un prix par symbole, dans l'ordre des symboles fournis.
    ///
    /// - Liste vide : `Ok(vec![])` sans aucun appel réseau
    /// - Symboles blancs : ignorés
    /// - Un seul échec : `Err`, les quotes déjà obtenues sont jetées
    #[instrument(skip(self), fields(count = symbols.len()))]
    pub async fn fetch_prices(&self, symbols: &[String]) -> FetchResult<Vec<PriceQuote>> {
        let wanted: Vec<&String> = symbols.iter().filter(|s| !s.trim().is_empty()).collect();
        if wanted.is_empty() {
            debug!("No symbols configured, skipping price fetch");
            return Ok(Vec::new());
        }
        self.ensure_api_key()?;

        let mut quotes = Vec::with_capacity(wanted.len());

        // Boucle explicitement séquentielle : une requête en vol à la fois
        for (i, symbol) in wanted.iter().enumerate() {
            debug!(symbol = %symbol, progress = i + 1, total = wanted.len(), "Fetching price");
            match self.fetch_price(symbol).await {
                Ok(quote) => quotes.push(quote),
                Err(e) => {
                    error!(symbol = %symbol, error = %e, "Price fetch failed, abandoning cycle");
                    return Err(e);
                }
            }
        }

        info!(quotes = quotes.len(), "Crypto data refreshed");
        Ok(quotes)
    }

    /// Prix d'un seul symbole ; la clé est vérifiée par `fetch_prices`
    async fn fetch_price(&self, symbol: &str) -> FetchResult<PriceQuote> {
        let body = self
            .get_json(self.http.get(self.price_url()).query(&[("symbol", symbol)]))
            .await?;

        Ok(PriceQuote::new(symbol.to_string(), extract_price(&body)))
    }

    /// Récupère l'univers complet des symboles connus de l'API
    #[instrument(skip(self))]
    pub async fn fetch_universe(&self) -> FetchResult<Vec<String>> {
        self.ensure_api_key()?;

        let body = self.get_json(self.http.get(self.symbols_url())).await?;
        let response: SymbolsResponse = serde_json::from_value(body)?;

        info!(symbols = response.symbols.len(), "Fetched symbol universe");
        Ok(response.symbols)
    }

    /// Envoie la requête avec la clé, vérifie le statut et parse le JSON
    async fn get_json(&self, request: reqwest::RequestBuilder) -> FetchResult<Value> {
        let response = request
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(FetchError::Network)?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if !status.is_success() {
            return Err(FetchError::BadStatus { status });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Extrait le champ `price` d'une réponse `cryptoprice`.
///
/// L'API renvoie le prix en texte ; un nombre JSON est accepté aussi.
/// Champ absent, nul ou vide : "N/A".
fn extract_price(body: &Value) -> String {
    match body.get("price") {
        Some(Value::String(price)) if !price.trim().is_empty() => price.clone(),
        Some(Value::Number(price)) => price.to_string(),
        _ => PRICE_UNAVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_price() {
        assert_eq!(extract_price(&json!({ "price": "61234.5" })), "61234.5");
        assert_eq!(extract_price(&json!({ "price": 42.5 })), "42.5");
        assert_eq!(extract_price(&json!({ "symbol": "BTCUSD" })), "N/A");
        assert_eq!(extract_price(&json!({ "price": null })), "N/A");
        assert_eq!(extract_price(&json!({ "price": "" })), "N/A");
        assert_eq!(extract_price(&json!([])), "N/A");
    }

    #[test]
    fn test_urls() {
        let client = NinjasClient::with_http(reqwest::Client::new(), "http://localhost:8080/", " key ");
        assert_eq!(client.price_url(), "http://localhost:8080/v1/cryptoprice");
        assert_eq!(client.symbols_url(), "http://localhost:8080/v1/cryptosymbols");
        assert_eq!(client.api_key, "key");
    }

    #[tokio::test]
    async fn test_empty_symbols_never_touch_network() {
        // Port 9 (discard) : toute requête échouerait
        let client = NinjasClient::with_http(reqwest::Client::new(), "http://127.0.0.1:9", "");
        let quotes = client.fetch_prices(&[]).await.unwrap();
        assert!(quotes.is_empty());

        let blanks = vec![String::new(), "  ".to_string()];
        assert!(client.fetch_prices(&blanks).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_api_key_is_preempted() {
        let client = NinjasClient::with_http(reqwest::Client::new(), "http://127.0.0.1:9", "  ");
        let result = client.fetch_prices(&["btc".to_string()]).await;
        assert!(matches!(result, Err(FetchError::NoApiKey)));

        let result = client.fetch_universe().await;
        assert!(matches!(result, Err(FetchError::NoApiKey)));
    }
}
