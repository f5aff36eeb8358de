// ============================================================================
// Structure : Settings
// ============================================================================
// Réglages utilisateur du panneau crypto : clé API, intervalle de
// rafraîchissement, symboles choisis et univers de symboles connus de l'API.
//
// Le document persisté garde les clés camelCase historiques :
// { apiKey, symbols, refreshInterval, availableSymbols: { symbols: [...] } }
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::symbol::{classify, fold, SymbolValidity};

/// Nombre de cases de saisie de symboles (borne de `Settings::symbols`)
pub const MAX_SYMBOLS: usize = 5;

/// Intervalle de rafraîchissement par défaut : 60 minutes
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60 * 60;

/// Univers des symboles reconnus par l'API, tel que renvoyé par
/// l'endpoint `cryptosymbols`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSymbols {
    #[serde(default)]
    pub symbols: Vec<String>,
}

/// Réglages persistés du panneau
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Clé envoyée dans le header `X-Api-Key`
    pub api_key: String,

    /// Symboles par position de case (au plus `MAX_SYMBOLS`).
    /// Une chaîne vide représente une case vide.
    #[serde(deserialize_with = "deserialize_symbols")]
    pub symbols: Vec<String>,

    /// Intervalle de rafraîchissement en secondes
    pub refresh_interval: u64,

    /// Dernier univers récupéré avec succès (remplacé en bloc, jamais fusionné)
    pub available_symbols: AvailableSymbols,
}

/// Accepte les trous (`null`) laissés par d'anciens documents et tronque à
/// `MAX_SYMBOLS` entrées.
fn deserialize_symbols<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Option<String>> = Vec::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .take(MAX_SYMBOLS)
        .map(Option::unwrap_or_default)
        .collect())
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            symbols: Vec::new(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL_SECS,
            available_symbols: AvailableSymbols::default(),
        }
    }
}

impl Settings {
    /// Vrai si une clé API (non blanche) est configurée
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn refresh_interval_duration(&self) -> Duration {
        Duration::from_secs(self.refresh_interval)
    }

    /// Intervalle exprimé en minutes (unité de l'écran de settings),
    /// arrondi à la minute supérieure
    pub fn refresh_interval_minutes(&self) -> u64 {
        self.refresh_interval.div_ceil(60)
    }

    /// Met à jour l'intervalle depuis une saisie en minutes.
    ///
    /// Retourne `false` (sans rien modifier) si la saisie n'est pas un
    /// entier strictement positif ou dépasse la capacité en secondes.
    pub fn set_refresh_interval_minutes(&mut self, input: &str) -> bool {
        let seconds = input
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|minutes| *minutes > 0)
            .and_then(|minutes| minutes.checked_mul(60));

        match seconds {
            Some(seconds) => {
                self.refresh_interval = seconds;
                true
            }
            None => false,
        }
    }

    /// Symboles à interroger, dans l'ordre des cases, cases vides exclues
    pub fn active_symbols(&self) -> Vec<String> {
        self.symbols
            .iter()
            .filter(|s| !s.trim().is_empty())
            .cloned()
            .collect()
    }

    /// Contenu de la case `index` ("" si vide ou hors limites)
    pub fn symbol_at(&self, index: usize) -> &str {
        self.symbols.get(index).map(String::as_str).unwrap_or("")
    }

    /// Vrai si `symbol` appartient à l'univers connu (insensible à la casse)
    pub fn is_available(&self, symbol: &str) -> bool {
        classify(symbol, &self.available_symbols.symbols) == SymbolValidity::Valid
    }

    /// Remplace l'univers en bloc après un fetch réussi
    pub fn replace_universe(&mut self, symbols: Vec<String>) {
        self.available_symbols = AvailableSymbols { symbols };
    }

    /// Applique la saisie d'une case de symbole et retourne sa classification.
    ///
    /// - Valid : le symbole normalisé (minuscules) est écrit à `index`
    /// - Empty : la case `index` est vidée
    /// - Invalid : la valeur précédente est conservée
    pub fn apply_symbol_input(&mut self, index: usize, input: &str) -> SymbolValidity {
        let validity = classify(input, &self.available_symbols.symbols);
        if index >= MAX_SYMBOLS {
            return validity;
        }

        match validity {
            SymbolValidity::Valid => {
                if self.symbols.len() <= index {
                    self.symbols.resize(index + 1, String::new());
                }
                self.symbols[index] = fold(input);
            }
            SymbolValidity::Empty => {
                if let Some(slot) = self.symbols.get_mut(index) {
                    slot.clear();
                }
                // Les cases vides en fin de liste ne servent à rien
                while self.symbols.last().is_some_and(|s| s.is_empty()) {
                    self.symbols.pop();
                }
            }
            SymbolValidity::Invalid => {}
        }

        validity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_universe(universe: &[&str]) -> Settings {
        let mut settings = Settings::default();
        settings.replace_universe(universe.iter().map(|s| s.to_string()).collect());
        settings
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.refresh_interval, 3600);
        assert!(settings.symbols.is_empty());
        assert!(!settings.has_api_key());
    }

    #[test]
    fn test_valid_input_is_stored_lowercase() {
        let mut settings = settings_with_universe(&["BTC"]);

        assert_eq!(settings.apply_symbol_input(0, "btc"), SymbolValidity::Valid);
        assert_eq!(settings.symbol_at(0), "btc");

        assert_eq!(settings.apply_symbol_input(0, " BTC "), SymbolValidity::Valid);
        assert_eq!(settings.symbol_at(0), "btc");
    }

    #[test]
    fn test_invalid_input_keeps_previous_value() {
        let mut settings = settings_with_universe(&["BTC", "ETH"]);
        settings.symbols = vec!["btc".to_string(), "eth".to_string()];

        assert_eq!(settings.apply_symbol_input(1, "xrp"), SymbolValidity::Invalid);
        assert_eq!(settings.symbols, vec!["btc", "eth"]);
    }

    #[test]
    fn test_empty_input_clears_slot_in_place() {
        let mut settings = settings_with_universe(&["BTC", "ETH", "SOL"]);
        settings.symbols = vec!["btc".to_string(), "eth".to_string(), "sol".to_string()];

        assert_eq!(settings.apply_symbol_input(1, "   "), SymbolValidity::Empty);
        assert_eq!(settings.symbols, vec!["btc", "", "sol"]);
        assert_eq!(settings.active_symbols(), vec!["btc", "sol"]);

        settings.apply_symbol_input(2, "");
        assert_eq!(settings.symbols, vec!["btc"]);
    }

    #[test]
    fn test_valid_input_past_end_pads_slots() {
        let mut settings = settings_with_universe(&["SOL"]);
        settings.apply_symbol_input(3, "sol");
        assert_eq!(settings.symbols, vec!["", "", "", "sol"]);
        assert_eq!(settings.active_symbols(), vec!["sol"]);
    }

    #[test]
    fn test_slot_index_is_bounded() {
        let mut settings = settings_with_universe(&["BTC"]);
        settings.apply_symbol_input(MAX_SYMBOLS, "btc");
        assert!(settings.symbols.is_empty());
    }

    #[test]
    fn test_refresh_interval_minutes() {
        let mut settings = Settings::default();
        assert!(settings.set_refresh_interval_minutes("1"));
        assert_eq!(settings.refresh_interval, 60);
        assert_eq!(settings.refresh_interval_duration(), Duration::from_secs(60));

        assert!(!settings.set_refresh_interval_minutes("abc"));
        assert!(!settings.set_refresh_interval_minutes("0"));
        assert_eq!(settings.refresh_interval, 60);
    }

    #[test]
    fn test_refresh_interval_overflow_is_rejected() {
        let mut settings = Settings::default();
        assert!(!settings.set_refresh_interval_minutes("999999999999999999"));
        assert!(!settings.set_refresh_interval_minutes("99999999999999999999999"));
        assert_eq!(settings.refresh_interval, DEFAULT_REFRESH_INTERVAL_SECS);

        assert!(settings.set_refresh_interval_minutes("1440"));
        assert_eq!(settings.refresh_interval, 86_400);
    }

    #[test]
    fn test_sub_minute_interval_rounds_up() {
        let mut settings = Settings::default();
        settings.refresh_interval = 30;
        assert_eq!(settings.refresh_interval_minutes(), 1);

        settings.refresh_interval = 90;
        assert_eq!(settings.refresh_interval_minutes(), 2);

        settings.refresh_interval = 3600;
        assert_eq!(settings.refresh_interval_minutes(), 60);
    }

    #[test]
    fn test_document_shape() {
        let mut settings = settings_with_universe(&["BTC"]);
        settings.api_key = "key".to_string();
        settings.symbols = vec!["btc".to_string()];

        let doc = serde_json::to_value(&settings).unwrap();
        assert_eq!(doc["apiKey"], "key");
        assert_eq!(doc["refreshInterval"], 3600);
        assert_eq!(doc["availableSymbols"]["symbols"][0], "BTC");
    }

    #[test]
    fn test_symbols_with_holes_deserialize() {
        let doc = serde_json::json!({
            "apiKey": "",
            "symbols": ["btc", null, "eth", "sol", "ada", "dot", "xrp"],
            "refreshInterval": 60,
            "availableSymbols": { "symbols": [] }
        });
        let settings: Settings = serde_json::from_value(doc).unwrap();
        assert_eq!(settings.symbols, vec!["btc", "", "eth", "sol", "ada"]);
    }
}
