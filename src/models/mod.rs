// ============================================================================
// Module : models
// ============================================================================
// Structures de données de l'application : réglages, quotes, validation
// des symboles.
// ============================================================================

pub mod quote;    // PriceQuote et filtrage par symboles configurés
pub mod settings; // Settings persistés
pub mod symbol;   // Classification Empty / Valid / Invalid

pub use quote::{filter_configured, PriceQuote, PRICE_UNAVAILABLE};
pub use settings::{AvailableSymbols, Settings, DEFAULT_REFRESH_INTERVAL_SECS, MAX_SYMBOLS};
pub use symbol::{classify, SymbolValidity};
