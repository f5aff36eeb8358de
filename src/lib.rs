// ============================================================================
// CryptoPanel - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;       // Client API de prix crypto
pub mod app;       // État de l'application
pub mod config;    // Configuration d'exécution
pub mod models;    // Structures de données
pub mod refresh;   // Garde de fraîcheur / cycle unique
pub mod scheduler; // Timer de rafraîchissement
pub mod storage;   // Persistance des settings
pub mod ui;        // Interface utilisateur
