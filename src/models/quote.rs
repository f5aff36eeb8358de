// ============================================================================
// Structure : PriceQuote
// ============================================================================
// Une observation de prix pour un symbole, avec son instant de capture.
// Créée à chaque cycle de fetch, jamais persistée, remplacée en bloc au cycle
// suivant.
// ============================================================================

use chrono::{DateTime, Local, TimeZone, Utc};

/// Valeur affichée quand l'API ne renvoie pas de prix
pub const PRICE_UNAVAILABLE: &str = "N/A";

/// Prix d'une crypto à un instant donné
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuote {
    /// Symbole tel que configuré (ex: "btc")
    pub symbol: String,

    /// Prix en texte (tel que renvoyé par l'API) ou "N/A"
    pub price: String,

    /// Instant de capture en millisecondes epoch
    pub timestamp: i64,
}

impl PriceQuote {
    /// Crée une quote horodatée maintenant
    pub fn new(symbol: String, price: String) -> Self {
        Self::at(symbol, price, Utc::now())
    }

    pub fn at(symbol: String, price: String, captured_at: DateTime<Utc>) -> Self {
        Self {
            symbol,
            price,
            timestamp: captured_at.timestamp_millis(),
        }
    }

    pub fn has_price(&self) -> bool {
        self.price != PRICE_UNAVAILABLE
    }

    /// Horodatage formaté en heure locale : "YYYY-MM-DD HH:MM"
    pub fn formatted_timestamp(&self) -> String {
        match Local.timestamp_millis_opt(self.timestamp).single() {
            Some(local) => local.format("%Y-%m-%d %H:%M").to_string(),
            None => "-".to_string(),
        }
    }
}

/// Garde uniquement les quotes dont le symbole est encore configuré.
///
/// Les settings peuvent changer pendant qu'un cycle est en vol : on n'affiche
/// jamais un symbole retiré entre-temps.
pub fn filter_configured<'a>(quotes: &'a [PriceQuote], symbols: &[String]) -> Vec<&'a PriceQuote> {
    quotes
        .iter()
        .filter(|quote| symbols.iter().any(|s| s == &quote.symbol))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let quote = PriceQuote::at("btc".to_string(), "61234.5".to_string(), at);
        assert_eq!(quote.timestamp, at.timestamp_millis());
        assert!(quote.has_price());

        let expected = at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string();
        assert_eq!(quote.formatted_timestamp(), expected);
    }

    #[test]
    fn test_unavailable_price() {
        let quote = PriceQuote::new("eth".to_string(), PRICE_UNAVAILABLE.to_string());
        assert!(!quote.has_price());
    }

    #[test]
    fn test_filter_configured() {
        let quotes = vec![
            PriceQuote::new("btc".to_string(), "1".to_string()),
            PriceQuote::new("eth".to_string(), "2".to_string()),
        ];
        let symbols = vec!["eth".to_string()];

        let filtered = filter_configured(&quotes, &symbols);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].symbol, "eth");
    }
}
