use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::prelude::{eprintln, *};

const API_KEYS_FILE: &str = "api-keys.json";
const SETTINGS_FILE: &str = "settings.json";
const PATH_HISTORY_FILE: &str = "path-history.json";
const ALIBABA_KEYS_FILE: &str = "alibaba-keys.json";

/// Stored provider API keys. Empty string means "not configured".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeys {
    #[serde(default)]
    pub openrouter_api_key: String,
    #[serde(default)]
    pub moonshot_api_key: String,
}

/// Partial key update: only the fields present in the request are written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiKeysUpdate {
    pub openrouter_api_key: Option<String>,
    pub moonshot_api_key: Option<String>,
}

/// User-facing generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_model_key")]
    pub selected_model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            selected_model: default_model_key(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            output_dir: default_output_dir(),
        }
    }
}

/// Partial settings update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub selected_model: Option<String>,
    pub max_tokens: Option<u64>,
    pub temperature: Option<f64>,
    pub output_dir: Option<String>,
}

/// Recently used output paths, most recent first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathHistory {
    #[serde(default)]
    pub recent_paths: Vec<String>,
    #[serde(default = "default_max_paths")]
    pub max_paths: usize,
}

impl Default for PathHistory {
    fn default() -> Self {
        PathHistory {
            recent_paths: Vec::new(),
            max_paths: default_max_paths(),
        }
    }
}

fn default_model_key() -> String {
    "kimi".to_string()
}

fn default_max_tokens() -> u64 {
    100_000
}

fn default_temperature() -> f64 {
    0.6
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_max_paths() -> usize {
    20
}

/// JSON-file-backed configuration store.
///
/// Constructed once at startup and handed to callers explicitly; there is no
/// process-global instance. Every read goes back to disk so external edits
/// are picked up, and read-modify-write updates serialize on an internal
/// lock.
#[derive(Debug)]
pub struct ConfigStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl ConfigStore {
    /// Open (and initialize, if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .wrap_err_with(|| format!("Failed to create config directory {}", dir.display()))?;

        let store = ConfigStore {
            dir,
            write_lock: Mutex::new(()),
        };
        store.write_defaults(false)?;
        Ok(store)
    }

    /// Default per-user config directory.
    pub fn default_dir() -> Result<PathBuf> {
        Ok(dirs_next::config_dir()
            .ok_or_eyre("Unable to determine config directory")?
            .join("prdgen"))
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    fn write_defaults(&self, overwrite: bool) -> Result<()> {
        self.write_default(API_KEYS_FILE, &ApiKeys::default(), overwrite)?;
        self.write_default(SETTINGS_FILE, &Settings::default(), overwrite)?;
        self.write_default(PATH_HISTORY_FILE, &PathHistory::default(), overwrite)?;
        Ok(())
    }

    fn write_default<T: Serialize>(&self, name: &str, value: &T, overwrite: bool) -> Result<()> {
        if overwrite || !self.dir.join(name).exists() {
            self.save(name, value)?;
        }
        Ok(())
    }

    fn load<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.dir.join(name);
        let parsed = fs::read_to_string(&path)
            .map_err(|e| eyre!(e))
            .and_then(|text| serde_json::from_str(&text).map_err(|e| eyre!(e)));

        match parsed {
            Ok(value) => value,
            Err(err) => {
                eprintln!("Error loading {}: {err}", path.display());
                T::default()
            }
        }
    }

    fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let text = serde_json::to_string_pretty(value)?;
        fs::write(&path, text).wrap_err_with(|| format!("Failed to write {}", path.display()))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| eyre!("Config write lock poisoned"))
    }

    // API keys

    pub fn api_keys(&self) -> ApiKeys {
        self.load(API_KEYS_FILE)
    }

    /// Stored keys with environment variables as a fallback for fields the
    /// store leaves empty.
    pub fn api_keys_with_env(&self) -> ApiKeys {
        let mut keys = self.api_keys();
        if keys.openrouter_api_key.is_empty() {
            keys.openrouter_api_key = std::env::var("OPENROUTER_API_KEY").unwrap_or_default();
        }
        if keys.moonshot_api_key.is_empty() {
            keys.moonshot_api_key = std::env::var("MOONSHOT_API_KEY").unwrap_or_default();
        }
        keys
    }

    pub fn save_api_keys(&self, update: ApiKeysUpdate) -> Result<()> {
        let _guard = self.lock()?;
        let mut keys = self.api_keys();
        if let Some(value) = update.openrouter_api_key {
            keys.openrouter_api_key = value;
        }
        if let Some(value) = update.moonshot_api_key {
            keys.moonshot_api_key = value;
        }
        self.save(API_KEYS_FILE, &keys)
    }

    // Settings

    pub fn settings(&self) -> Settings {
        self.load(SETTINGS_FILE)
    }

    pub fn save_settings(&self, update: SettingsUpdate) -> Result<()> {
        let _guard = self.lock()?;
        let mut settings = self.settings();
        if let Some(value) = update.selected_model {
            settings.selected_model = value;
        }
        if let Some(value) = update.max_tokens {
            settings.max_tokens = value;
        }
        if let Some(value) = update.temperature {
            settings.temperature = value;
        }
        if let Some(value) = update.output_dir {
            settings.output_dir = value;
        }
        self.save(SETTINGS_FILE, &settings)
    }

    // Path history

    pub fn path_history(&self) -> Vec<String> {
        self.load::<PathHistory>(PATH_HISTORY_FILE).recent_paths
    }

    /// Push a path to the front of the history, deduplicating and capping
    /// at the stored maximum. The literal default directory is not worth
    /// remembering.
    pub fn add_path(&self, path: &str) -> Result<()> {
        if path.is_empty() || path == default_output_dir() {
            return Ok(());
        }

        let _guard = self.lock()?;
        let mut history: PathHistory = self.load(PATH_HISTORY_FILE);
        history.recent_paths.retain(|p| p != path);
        history.recent_paths.insert(0, path.to_string());
        history.recent_paths.truncate(history.max_paths);
        self.save(PATH_HISTORY_FILE, &history)
    }

    pub fn remove_path(&self, path: &str) -> Result<()> {
        let _guard = self.lock()?;
        let mut history: PathHistory = self.load(PATH_HISTORY_FILE);
        history.recent_paths.retain(|p| p != path);
        self.save(PATH_HISTORY_FILE, &history)
    }

    /// Reset every config file to its defaults.
    pub fn clear_all(&self) -> Result<()> {
        let _guard = self.lock()?;
        self.write_defaults(true)
    }

    // Alibaba keys

    /// Server-held Alibaba keys: `ALIBABA_API_KEY_1..=3` env vars first,
    /// then the optional key file in the config directory.
    pub fn alibaba_keys(&self) -> Vec<String> {
        let from_env: Vec<String> = (1..=3)
            .filter_map(|i| std::env::var(format!("ALIBABA_API_KEY_{i}")).ok())
            .filter(|key| !key.is_empty())
            .collect();

        if !from_env.is_empty() {
            return from_env;
        }

        match fs::read_to_string(self.dir.join(ALIBABA_KEYS_FILE)) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_initializes_default_files() {
        let (dir, _store) = store();
        assert!(dir.path().join(API_KEYS_FILE).exists());
        assert!(dir.path().join(SETTINGS_FILE).exists());
        assert!(dir.path().join(PATH_HISTORY_FILE).exists());
    }

    #[test]
    fn test_default_settings() {
        let (_dir, store) = store();
        let settings = store.settings();
        assert_eq!(settings.selected_model, "kimi");
        assert_eq!(settings.max_tokens, 100_000);
        assert_eq!(settings.output_dir, "output");
    }

    #[test]
    fn test_save_api_keys_is_a_partial_update() {
        let (_dir, store) = store();
        store
            .save_api_keys(ApiKeysUpdate {
                openrouter_api_key: Some("or-key".to_string()),
                moonshot_api_key: None,
            })
            .unwrap();
        store
            .save_api_keys(ApiKeysUpdate {
                openrouter_api_key: None,
                moonshot_api_key: Some("ms-key".to_string()),
            })
            .unwrap();

        let keys = store.api_keys();
        assert_eq!(keys.openrouter_api_key, "or-key");
        assert_eq!(keys.moonshot_api_key, "ms-key");
    }

    #[test]
    fn test_save_settings_partial_update() {
        let (_dir, store) = store();
        store
            .save_settings(SettingsUpdate {
                selected_model: Some("gemini".to_string()),
                max_tokens: None,
                temperature: None,
                output_dir: None,
            })
            .unwrap();

        let settings = store.settings();
        assert_eq!(settings.selected_model, "gemini");
        assert_eq!(settings.max_tokens, 100_000);
    }

    #[test]
    fn test_path_history_dedup_and_order() {
        let (_dir, store) = store();
        store.add_path("/a").unwrap();
        store.add_path("/b").unwrap();
        store.add_path("/a").unwrap();

        assert_eq!(store.path_history(), vec!["/a", "/b"]);
    }

    #[test]
    fn test_path_history_skips_default_and_empty() {
        let (_dir, store) = store();
        store.add_path("").unwrap();
        store.add_path("output").unwrap();

        assert!(store.path_history().is_empty());
    }

    #[test]
    fn test_path_history_capped() {
        let (_dir, store) = store();
        for i in 0..25 {
            store.add_path(&format!("/path/{i}")).unwrap();
        }

        let history = store.path_history();
        assert_eq!(history.len(), 20);
        assert_eq!(history[0], "/path/24");
    }

    #[test]
    fn test_remove_path() {
        let (_dir, store) = store();
        store.add_path("/a").unwrap();
        store.add_path("/b").unwrap();
        store.remove_path("/a").unwrap();

        assert_eq!(store.path_history(), vec!["/b"]);
    }

    #[test]
    fn test_clear_all_resets_existing_data() {
        let (_dir, store) = store();
        store
            .save_api_keys(ApiKeysUpdate {
                openrouter_api_key: Some("secret".to_string()),
                moonshot_api_key: None,
            })
            .unwrap();
        store.add_path("/somewhere").unwrap();

        store.clear_all().unwrap();

        assert_eq!(store.api_keys(), ApiKeys::default());
        assert!(store.path_history().is_empty());
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let (dir, store) = store();
        fs::write(dir.path().join(SETTINGS_FILE), "not json at all").unwrap();

        assert_eq!(store.settings(), Settings::default());
    }
}
