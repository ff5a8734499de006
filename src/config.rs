use instaurant_core::FirebaseConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Which remote service backs the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// JSON file under the data directory
    Local,
    /// Firebase project (auth, realtime database, storage)
    Firebase,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Local => write!(f, "local"),
            Backend::Firebase => write!(f, "firebase"),
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Backend::Local),
            "firebase" => Ok(Backend::Firebase),
            other => Err(ConfigError::InvalidValue("backend", other.to_string())),
        }
    }
}

/// Firebase project settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FirebaseSettings {
    /// Web API key
    pub api_key: Option<String>,
    /// Realtime Database URL (e.g., "https://project-default-rtdb.firebaseio.com")
    pub database_url: Option<String>,
    /// Storage bucket (e.g., "project.appspot.com")
    pub storage_bucket: Option<String>,
}

impl FirebaseSettings {
    /// Returns true if every setting needed to reach the project is present
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.database_url.is_some() && self.storage_bucket.is_some()
    }

    /// Builds the gateway configuration, naming the first missing setting
    pub fn gateway_config(&self) -> Result<FirebaseConfig, ConfigError> {
        let api_key = self
            .api_key
            .clone()
            .ok_or(ConfigError::NotConfigured("firebase.api_key"))?;
        let database_url = self
            .database_url
            .clone()
            .ok_or(ConfigError::NotConfigured("firebase.database_url"))?;
        let storage_bucket = self
            .storage_bucket
            .clone()
            .ok_or(ConfigError::NotConfigured("firebase.storage_bucket"))?;

        Ok(FirebaseConfig::new(api_key, database_url, storage_bucket))
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Remote service backing the menu
    pub backend: ConfigValue<Backend>,
    /// Directory for the session file and the local backend
    pub data_dir: ConfigValue<PathBuf>,
    /// Log filter (tracing EnvFilter syntax)
    pub log_level: ConfigValue<String>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    /// Firebase configuration
    pub firebase: FirebaseSettings,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    backend: Option<Backend>,
    data_dir: Option<PathBuf>,
    log_level: Option<String>,
    firebase: Option<FirebaseSettings>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut backend = ConfigValue::new(Backend::Local, ConfigSource::Default);
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut log_level = ConfigValue::new("warn".to_string(), ConfigSource::Default);
        let mut config_file = None;
        let mut firebase = FirebaseSettings::default();

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(value) = file_config.backend {
                backend = ConfigValue::new(value, ConfigSource::File);
            }
            if let Some(dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(level) = file_config.log_level {
                log_level = ConfigValue::new(level, ConfigSource::File);
            }
            if let Some(settings) = file_config.firebase {
                firebase = settings;
            }
        }

        // Apply environment variable overrides
        if let Ok(value) = std::env::var("INSTAURANT_BACKEND") {
            backend = ConfigValue::new(value.parse()?, ConfigSource::Environment);
        }
        if let Ok(dir) = std::env::var("INSTAURANT_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(level) = std::env::var("INSTAURANT_LOG") {
            log_level = ConfigValue::new(level, ConfigSource::Environment);
        }
        // Firebase env var overrides
        if let Ok(key) = std::env::var("INSTAURANT_FIREBASE_API_KEY") {
            firebase.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("INSTAURANT_FIREBASE_DATABASE_URL") {
            firebase.database_url = Some(url);
        }
        if let Ok(bucket) = std::env::var("INSTAURANT_FIREBASE_STORAGE_BUCKET") {
            firebase.storage_bucket = Some(bucket);
        }

        Ok(Self {
            backend,
            data_dir,
            log_level,
            config_file,
            firebase,
        })
    }

    /// Session file holding the signed-in account
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.value.join("session.yaml")
    }

    /// Directory used by the local backend
    pub fn local_backend_dir(&self) -> PathBuf {
        self.data_dir.value.join("local")
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/instaurant/
    /// - macOS: ~/Library/Application Support/instaurant/
    /// - Windows: %APPDATA%/instaurant/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("instaurant")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/instaurant/
    /// - macOS: ~/Library/Application Support/instaurant/
    /// - Windows: %APPDATA%/instaurant/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("instaurant")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(&'static str, String),
    NotConfigured(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(name, value) => {
                write!(f, "Invalid value for {}: '{}'", name, value)
            }
            ConfigError::NotConfigured(name) => {
                write!(f, "Firebase backend not configured. Set {} in config.", name)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.backend.value, Backend::Local);
        assert_eq!(config.backend.source, ConfigSource::Default);
        assert!(config
            .data_dir
            .value
            .to_string_lossy()
            .contains("instaurant"));
        assert_eq!(config.log_level.value, "warn");
        assert!(config.config_file.is_none());
        assert!(!config.firebase.is_configured());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "backend: firebase").unwrap();
        writeln!(file, "data_dir: /custom/instaurant").unwrap();
        writeln!(file, "firebase:").unwrap();
        writeln!(file, "  api_key: web-key").unwrap();
        writeln!(file, "  database_url: https://menu-rtdb.firebaseio.com").unwrap();
        writeln!(file, "  storage_bucket: menu.appspot.com").unwrap();

        let config = Config::load(Some(config_path.clone())).unwrap();
        assert_eq!(config.backend.value, Backend::Firebase);
        assert_eq!(config.backend.source, ConfigSource::File);
        assert_eq!(config.data_dir.value, PathBuf::from("/custom/instaurant"));
        assert_eq!(config.config_file, Some(config_path));

        let firebase = config.firebase.gateway_config().unwrap();
        assert_eq!(firebase.api_key, "web-key");
        assert_eq!(firebase.storage_bucket, "menu.appspot.com");
    }

    #[test]
    fn test_relative_data_dir_resolves_against_config_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "data_dir: menu-data\n").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.data_dir.value, temp_dir.path().join("menu-data"));
        assert_eq!(
            config.session_path(),
            temp_dir.path().join("menu-data").join("session.yaml")
        );
    }

    #[test]
    #[ignore] // Run with --ignored; env vars can pollute parallel tests
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "backend: local").unwrap();

        // Set env var
        std::env::set_var("INSTAURANT_BACKEND", "firebase");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.backend.value, Backend::Firebase);
        assert_eq!(config.backend.source, ConfigSource::Environment);

        // Clean up
        std::env::remove_var("INSTAURANT_BACKEND");
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(Some(config_path));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_partial_firebase_settings() {
        let settings = FirebaseSettings {
            api_key: Some("web-key".into()),
            database_url: Some("https://menu-rtdb.firebaseio.com".into()),
            storage_bucket: None,
        };

        assert!(!settings.is_configured());
        let err = settings.gateway_config().unwrap_err();
        assert!(err.to_string().contains("firebase.storage_bucket"));
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("Firebase".parse::<Backend>().unwrap(), Backend::Firebase);
        assert_eq!(" local ".parse::<Backend>().unwrap(), Backend::Local);
        assert!("postgres".parse::<Backend>().is_err());
    }
}
