// ============================================================================
// Module : api
// ============================================================================
// Client HTTP pour l'API de prix crypto et ses erreurs
// ============================================================================

pub mod error;  // FetchError
pub mod ninjas; // Client API Ninjas

pub use error::{FetchError, FetchResult};
pub use ninjas::{NinjasClient, DEFAULT_API_BASE};
