//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\radio-roulette\config.toml
//! - macOS: ~/Library/Application Support/radio-roulette/config.toml
//! - Linux: ~/.config/radio-roulette/config.toml
//!
//! The config file is human-readable and editable. Every section is
//! optional; missing keys fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::composer::client::{DEFAULT_BASE_URL, DEFAULT_MODEL_ID, DEFAULT_OUTPUT_FORMAT};
use crate::composer::DEFAULT_TRACK_DURATION_MS;
use crate::player::{DEFAULT_PREFETCH_THRESHOLD, SchedulerSettings};
use crate::storage::LocalStore;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API credentials (keep separate for potential future encryption)
    pub credentials: Credentials,

    /// Composition service settings
    pub composer: ComposerConfig,

    /// Queue / prefetch settings
    pub queue: QueueConfig,

    /// Style roulette settings
    pub roulette: RouletteConfig,

    /// Where generated audio is kept
    pub storage: StorageConfig,

    /// Database location
    pub database: DatabaseConfig,
}

/// API credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// ElevenLabs API key for music composition
    pub elevenlabs_api_key: Option<String>,
}

/// Composition service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    pub base_url: String,
    pub model_id: String,
    /// Encoding requested from the service, e.g. "mp3_44100_128"
    pub output_format: String,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
        }
    }
}

/// Queue settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Tracks to keep generated ahead of the current one
    pub prefetch_threshold: usize,

    /// Length of each generated track in milliseconds
    pub track_duration_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            prefetch_threshold: DEFAULT_PREFETCH_THRESHOLD,
            track_duration_ms: DEFAULT_TRACK_DURATION_MS,
        }
    }
}

/// Roulette settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouletteConfig {
    /// Styles drawn per genre when spinning
    pub styles_per_genre: usize,
}

impl Default for RouletteConfig {
    fn default() -> Self {
        Self { styles_per_genre: 3 }
    }
}

/// Audio storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Cache directory for generated tracks (empty = user cache dir)
    pub cache_dir: Option<PathBuf>,

    /// Base URL the cache directory is served under, if any
    pub public_base_url: Option<String>,
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(crate::db::DEFAULT_DB_NAME),
        }
    }
}

impl Config {
    /// API key from `explicit` (CLI/env) or the config file.
    pub fn api_key(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .map(str::to_string)
            .or_else(|| self.credentials.elevenlabs_api_key.clone())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            prefetch_threshold: self.queue.prefetch_threshold,
            track_duration_ms: self.queue.track_duration_ms,
        }
    }

    /// Audio store described by the `[storage]` section.
    pub fn audio_store(&self) -> LocalStore {
        let store = match &self.storage.cache_dir {
            Some(dir) => LocalStore::new(dir),
            None => LocalStore::default_location(),
        };
        match &self.storage.public_base_url {
            Some(base) => store.with_public_base_url(base),
            None => store,
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("radio-roulette"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from disk
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };
    load_from(&path)
}

/// Load configuration from a specific file, with the same fallbacks as [`load`].
pub fn load_from(path: &Path) -> Config {
    if !path.exists() {
        tracing::debug!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::debug!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to disk
///
/// Creates the config directory if it doesn't exist.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &path)
}

/// Save configuration to a specific file.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    // Serialize to pretty TOML
    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[credentials]"));
        assert!(toml.contains("[composer]"));
        assert!(toml.contains("[queue]"));
        assert!(toml.contains("[roulette]"));
        assert!(toml.contains("[database]"));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.credentials.elevenlabs_api_key = Some("test-key-123".to_string());
        config.queue.prefetch_threshold = 4;
        config.storage.cache_dir = Some(PathBuf::from("/tmp/radio"));

        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();

        assert_eq!(
            parsed.credentials.elevenlabs_api_key,
            Some("test-key-123".to_string())
        );
        assert_eq!(parsed.queue.prefetch_threshold, 4);
        assert_eq!(parsed.storage.cache_dir, Some(PathBuf::from("/tmp/radio")));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[queue]
track_duration_ms = 60000
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.queue.track_duration_ms, 60_000);
        assert_eq!(config.queue.prefetch_threshold, 2);
        assert_eq!(config.roulette.styles_per_genre, 3);
        assert_eq!(config.composer, ComposerConfig::default());
        assert_eq!(config.database.path, PathBuf::from("radio_roulette.db"));
        assert!(config.credentials.elevenlabs_api_key.is_none());
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let mut config = Config::default();
        assert_eq!(config.api_key(None), None);

        config.credentials.elevenlabs_api_key = Some("from-file".to_string());
        assert_eq!(config.api_key(None).as_deref(), Some("from-file"));
        assert_eq!(config.api_key(Some("from-env")).as_deref(), Some("from-env"));
        assert_eq!(config.api_key(Some("  ")), None);
    }

    #[test]
    fn test_save_and_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.roulette.styles_per_genre = 5;
        save_to(&config, &path).unwrap();

        assert_eq!(load_from(&path).roulette.styles_per_genre, 5);
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_unparsable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "queue = [not toml").unwrap();

        let config = load_from(&path);
        assert_eq!(config.queue.prefetch_threshold, DEFAULT_PREFETCH_THRESHOLD);
    }

    #[test]
    fn test_scheduler_settings_and_store_from_config() {
        let mut config = Config::default();
        config.queue.prefetch_threshold = 3;
        config.storage.cache_dir = Some(PathBuf::from("/tmp/radio-tracks"));

        assert_eq!(config.scheduler_settings().prefetch_threshold, 3);
        assert_eq!(
            config.audio_store().cache_dir(),
            Path::new("/tmp/radio-tracks")
        );
    }
}
