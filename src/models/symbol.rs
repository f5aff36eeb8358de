// ============================================================================
// Validation des symboles
// ============================================================================
// Compare une saisie utilisateur à l'univers de symboles connu de l'API.
// Fonction pure : aucun effet de bord, seulement une classification.
// ============================================================================

/// Classification d'une saisie de symbole
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolValidity {
    /// Saisie vide (après trim)
    Empty,

    /// Présent dans l'univers (insensible à la casse)
    Valid,

    /// Absent de l'univers
    Invalid,
}

impl SymbolValidity {
    /// Icône affichée à côté de la case de saisie
    pub fn icon(self) -> &'static str {
        match self {
            SymbolValidity::Empty => "·",
            SymbolValidity::Valid => "👍",
            SymbolValidity::Invalid => "👎",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SymbolValidity::Empty => "Empty",
            SymbolValidity::Valid => "Valid",
            SymbolValidity::Invalid => "Invalid",
        }
    }
}

/// Forme normalisée d'un symbole : sans espaces autour, en minuscules
pub fn fold(symbol: &str) -> String {
    symbol.trim().to_lowercase()
}

/// Classe `candidate` par rapport à `universe`.
///
/// # Exemple
/// classify("btc", &["BTC".to_string()]) == SymbolValidity::Valid
pub fn classify(candidate: &str, universe: &[String]) -> SymbolValidity {
    let folded = fold(candidate);
    if folded.is_empty() {
        return SymbolValidity::Empty;
    }

    if universe.iter().any(|known| fold(known) == folded) {
        SymbolValidity::Valid
    } else {
        SymbolValidity::Invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universe(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_blank_is_empty_whatever_the_universe() {
        for u in [universe(&[]), universe(&["BTC", ""])] {
            assert_eq!(classify("", &u), SymbolValidity::Empty);
            assert_eq!(classify("   ", &u), SymbolValidity::Empty);
            assert_eq!(classify("\t\n", &u), SymbolValidity::Empty);
        }
    }

    #[test]
    fn test_case_insensitive_match() {
        let u = universe(&["BTC", "ETH", "SOL"]);
        assert_eq!(classify("btc", &u), SymbolValidity::Valid);
        assert_eq!(classify("Eth", &u), SymbolValidity::Valid);
        assert_eq!(classify("  sol ", &u), SymbolValidity::Valid);

        let lower = universe(&["btc"]);
        assert_eq!(classify("BTC", &lower), SymbolValidity::Valid);
    }

    #[test]
    fn test_unknown_is_invalid() {
        let u = universe(&["BTC"]);
        assert_eq!(classify("xrp", &u), SymbolValidity::Invalid);
        assert_eq!(classify("bt", &u), SymbolValidity::Invalid);
        assert_eq!(classify("btc", &universe(&[])), SymbolValidity::Invalid);
    }

    #[test]
    fn test_icons() {
        assert_eq!(SymbolValidity::Valid.icon(), "👍");
        assert_eq!(SymbolValidity::Invalid.label(), "Invalid");
    }
}
