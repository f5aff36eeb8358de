// ============================================================================
// Settings Store
// ============================================================================
// Charge et sauvegarde les Settings via un collaborateur "document clé-valeur".
//
// load() : fusion superficielle du document persisté par-dessus les valeurs
//          par défaut (les clés persistées gagnent, les clés absentes
//          retombent sur le défaut ; availableSymbols est remplacé en entier)
// save() : écriture synchrone, terminée avant tout refresh qui en dépend
// ============================================================================

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::models::Settings;

// ============================================================================
// Trait DocumentStore
// ============================================================================
// CONCEPT RUST : Trait comme point de jonction
// - Le store ne sait pas où vit le document (fichier, mémoire, ...)
// - Box<dyn DocumentStore> permet de choisir à l'exécution
// ============================================================================

/// Collaborateur de persistance d'un document JSON opaque
pub trait DocumentStore: Send {
    /// Retourne le document persisté, ou `None` s'il n'existe pas encore
    fn load(&self) -> Result<Option<Value>>;

    /// Remplace le document persisté
    fn save(&self, document: &Value) -> Result<()>;
}

/// Document stocké dans un fichier JSON
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for JsonFileStore {
    fn load(&self) -> Result<Option<Value>> {
        if !self.path.exists() {
            debug!(path = ?self.path, "No settings file yet");
            return Ok(None);
        }

        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Échec de la lecture de {}", self.path.display()))?;
        let document = serde_json::from_str(&text)
            .with_context(|| format!("Settings illisibles dans {}", self.path.display()))?;
        Ok(Some(document))
    }

    fn save(&self, document: &Value) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .context("Échec de la création du répertoire de settings")?;
        }

        let text = serde_json::to_string_pretty(document)?;
        fs::write(&self.path, text)
            .with_context(|| format!("Échec de l'écriture de {}", self.path.display()))?;
        Ok(())
    }
}

/// Document gardé en mémoire (tests, mode sans disque)
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<Option<Value>>,
}

impl MemoryStore {
    pub fn new(document: Option<Value>) -> Self {
        Self {
            document: Mutex::new(document),
        }
    }

    /// Copie du dernier document sauvegardé
    pub fn snapshot(&self) -> Option<Value> {
        self.document.lock().ok().and_then(|doc| doc.clone())
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self) -> Result<Option<Value>> {
        Ok(self.snapshot())
    }

    fn save(&self, document: &Value) -> Result<()> {
        let mut slot = self
            .document
            .lock()
            .map_err(|e| anyhow::anyhow!("Memory store poisoned: {}", e))?;
        *slot = Some(document.clone());
        Ok(())
    }
}

// ============================================================================
// SettingsStore
// ============================================================================

/// Propriétaire des Settings en mémoire et de leur persistance
pub struct SettingsStore {
    backend: Box<dyn DocumentStore>,
    settings: Settings,
}

impl SettingsStore {
    /// Crée un store avec les valeurs par défaut (sans rien lire)
    pub fn new(backend: Box<dyn DocumentStore>) -> Self {
        Self {
            backend,
            settings: Settings::default(),
        }
    }

    /// Crée le store et charge immédiatement le document persisté.
    ///
    /// Un document illisible n'empêche pas de démarrer : on garde les
    /// valeurs par défaut et on le signale dans les logs.
    pub fn open(backend: Box<dyn DocumentStore>) -> Self {
        let mut store = Self::new(backend);
        if let Err(e) = store.load() {
            warn!(error = ?e, "Failed to load settings, using defaults");
        }
        store
    }

    /// Recharge les settings depuis le collaborateur
    pub fn load(&mut self) -> Result<&Settings> {
        let persisted = self.backend.load()?;
        self.settings = match persisted {
            Some(document) => merge_over_defaults(document),
            None => Settings::default(),
        };
        info!(
            symbols = ?self.settings.symbols,
            refresh_interval = self.settings.refresh_interval,
            universe = self.settings.available_symbols.symbols.len(),
            "Settings loaded"
        );
        Ok(&self.settings)
    }

    /// Persiste les settings courants
    pub fn save(&self) -> Result<()> {
        let document = serde_json::to_value(&self.settings)
            .context("Échec de la sérialisation des settings")?;
        self.backend.save(&document)?;
        debug!("Settings saved");
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Applique une modification puis persiste immédiatement.
    ///
    /// # Exemple
    /// store.update(|s| s.api_key = "key".to_string())?;
    pub fn update<R>(&mut self, change: impl FnOnce(&mut Settings) -> R) -> Result<R> {
        let result = change(&mut self.settings);
        self.save()?;
        Ok(result)
    }
}

/// Fusion superficielle d'un document persisté sur les valeurs par défaut.
///
/// Une clé persistée de mauvais type est ignorée individuellement (les
/// autres clés sont gardées).
fn merge_over_defaults(persisted: Value) -> Settings {
    let Value::Object(persisted) = persisted else {
        warn!("Settings document is not an object, using defaults");
        return Settings::default();
    };

    let defaults = match serde_json::to_value(Settings::default()) {
        Ok(Value::Object(map)) => map,
        _ => return Settings::default(),
    };

    let mut merged: Map<String, Value> = defaults.clone();
    for (key, value) in &persisted {
        if !defaults.contains_key(key) {
            continue;
        }

        // Chaque clé est validée seule avant d'être acceptée
        let mut candidate = merged.clone();
        candidate.insert(key.clone(), value.clone());
        if serde_json::from_value::<Settings>(Value::Object(candidate)).is_ok() {
            merged.insert(key.clone(), value.clone());
        } else {
            warn!(key = %key, "Ignoring persisted setting with unexpected shape");
        }
    }

    serde_json::from_value(Value::Object(merged)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_with(document: Option<Value>) -> SettingsStore {
        SettingsStore::open(Box::new(MemoryStore::new(document)))
    }

    #[test]
    fn test_load_without_document_gives_defaults() {
        let store = store_with(None);
        assert_eq!(store.settings(), &Settings::default());
    }

    #[test]
    fn test_persisted_keys_win_missing_fall_back() {
        let store = store_with(Some(json!({
            "apiKey": "secret",
            "symbols": ["btc"]
        })));

        let settings = store.settings();
        assert_eq!(settings.api_key, "secret");
        assert_eq!(settings.symbols, vec!["btc"]);
        assert_eq!(settings.refresh_interval, 3600);
        assert!(settings.available_symbols.symbols.is_empty());
    }

    #[test]
    fn test_available_symbols_replaced_whole() {
        let store = store_with(Some(json!({
            "availableSymbols": { "symbols": ["BTCUSD", "ETHUSD"] }
        })));
        assert_eq!(
            store.settings().available_symbols.symbols,
            vec!["BTCUSD", "ETHUSD"]
        );
    }

    #[test]
    fn test_bad_key_is_ignored_alone() {
        let store = store_with(Some(json!({
            "apiKey": "secret",
            "refreshInterval": "soon"
        })));
        assert_eq!(store.settings().api_key, "secret");
        assert_eq!(store.settings().refresh_interval, 3600);
    }

    #[test]
    fn test_non_object_document_gives_defaults() {
        let store = store_with(Some(json!(["not", "settings"])));
        assert_eq!(store.settings(), &Settings::default());
    }

    #[test]
    fn test_update_persists_immediately() {
        let backend = std::sync::Arc::new(MemoryStore::default());

        struct Shared(std::sync::Arc<MemoryStore>);
        impl DocumentStore for Shared {
            fn load(&self) -> Result<Option<Value>> {
                self.0.load()
            }
            fn save(&self, document: &Value) -> Result<()> {
                self.0.save(document)
            }
        }

        let mut store = SettingsStore::open(Box::new(Shared(backend.clone())));
        store.update(|s| s.refresh_interval = 60).unwrap();

        let saved = backend.snapshot().unwrap();
        assert_eq!(saved["refreshInterval"], 60);

        // Un nouveau store relit la même valeur
        let reopened = SettingsStore::open(Box::new(Shared(backend)));
        assert_eq!(reopened.settings().refresh_interval, 60);
    }

    #[test]
    fn test_json_file_store_roundtrip() {
        let path = std::env::temp_dir()
            .join(format!("cryptopanel-test-{}", std::process::id()))
            .join("settings.json");
        let file_store = JsonFileStore::new(&path);
        assert!(file_store.load().unwrap().is_none());

        let mut store = SettingsStore::open(Box::new(file_store.clone()));
        store.update(|s| s.api_key = "file-key".to_string()).unwrap();

        let reopened = SettingsStore::open(Box::new(JsonFileStore::new(&path)));
        assert_eq!(reopened.settings().api_key, "file-key");

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
