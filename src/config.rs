// ============================================================================
// Configuration d'exécution
// ============================================================================
// Ce qui n'est pas un réglage utilisateur : URL de l'API, emplacement du
// document de settings, répertoire des logs. Surchargeable par variables
// d'environnement.
// ============================================================================

use std::path::PathBuf;

use crate::api::DEFAULT_API_BASE;

pub const ENV_API_BASE: &str = "CRYPTOPANEL_API_BASE";
pub const ENV_SETTINGS_PATH: &str = "CRYPTOPANEL_SETTINGS";
pub const ENV_LOG_DIR: &str = "CRYPTOPANEL_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// URL de base de l'API de prix
    pub api_base: String,

    /// Fichier JSON des settings
    pub settings_path: PathBuf,

    /// Répertoire des fichiers de log
    pub log_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            settings_path: default_settings_path(),
            log_dir: PathBuf::from("./logs"),
        }
    }
}

impl AppConfig {
    /// Valeurs par défaut surchargées par l'environnement du process
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Même chose avec une source de variables injectée
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(base) = non_empty(ENV_API_BASE) {
            config.api_base = base.trim().trim_end_matches('/').to_string();
        }
        if let Some(path) = non_empty(ENV_SETTINGS_PATH) {
            config.settings_path = PathBuf::from(path);
        }
        if let Some(dir) = non_empty(ENV_LOG_DIR) {
            config.log_dir = PathBuf::from(dir);
        }
        config
    }
}

/// ~/.config/cryptopanel/settings.json sur Linux (équivalents ailleurs)
fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cryptopanel")
        .join("settings.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.api_base, "https://api.api-ninjas.com");
        assert!(config.settings_path.ends_with("cryptopanel/settings.json"));
        assert_eq!(config.log_dir, PathBuf::from("./logs"));
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(|key| match key {
            ENV_API_BASE => Some("http://localhost:3000/".to_string()),
            ENV_SETTINGS_PATH => Some("/tmp/panel.json".to_string()),
            ENV_LOG_DIR => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.api_base, "http://localhost:3000");
        assert_eq!(config.settings_path, PathBuf::from("/tmp/panel.json"));
        assert_eq!(config.log_dir, PathBuf::from("./logs"));
    }
}
