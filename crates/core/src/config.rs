//! Configuration management
//!
//! This module handles loading, saving, and migrating the s3u configuration file.
//! The configuration file is stored in TOML format at ~/.config/s3u/config.toml,
//! or under `$S3U_CONFIG_DIR` when that is set.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ops::{BulkOptions, DEFAULT_PAGE_SIZE, DEFAULT_PARALLEL};

/// Current configuration schema version
///
/// Bumping this version requires a migration step in [`ConfigManager::load`].
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "S3U_CONFIG_DIR";

/// Default output format
const DEFAULT_OUTPUT: &str = "human";

/// Default color setting
const DEFAULT_COLOR: &str = "auto";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Default settings
    #[serde(default)]
    pub defaults: Defaults,

    /// Object store endpoint
    #[serde(default)]
    pub endpoint: EndpointConfig,
}

/// Default settings for CLI behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Output format: "human" or "json"
    #[serde(default = "default_output")]
    pub output: String,

    /// Color mode: "auto", "always", or "never"
    #[serde(default = "default_color")]
    pub color: String,

    /// Maximum number of requests running in parallel
    #[serde(default = "default_parallel")]
    pub max_parallel_requests: usize,

    /// Keys requested per listing page
    #[serde(default = "default_page_size")]
    pub page_size: i32,
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_parallel() -> usize {
    DEFAULT_PARALLEL
}

fn default_page_size() -> i32 {
    DEFAULT_PAGE_SIZE
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            max_parallel_requests: default_parallel(),
            page_size: default_page_size(),
        }
    }
}

/// Timeout configuration for store requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_ms: u64,

    /// Per-request timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_ms: Option<u64>,
}

fn default_connect_timeout() -> u64 {
    5000
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: default_connect_timeout(),
            operation_ms: None,
        }
    }
}

/// Connection details for the object store
///
/// Unset credentials fall back to the AWS default credential chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Alternative endpoint URL (S3-compatible servers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Region override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Static access key ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,

    /// Static secret access key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,

    /// Force path-style addressing; defaults to on for custom endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_path_style: Option<bool>,

    /// Timeout configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<TimeoutConfig>,
}

impl EndpointConfig {
    /// Check the endpoint URL and credential pairing
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.url {
            url::Url::parse(url)?;
        }
        match (&self.access_key, &self.secret_key) {
            (Some(_), None) | (None, Some(_)) => Err(Error::Config(
                "access_key and secret_key must be set together".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Whether requests should use path-style addressing
    pub fn path_style(&self) -> bool {
        self.force_path_style.unwrap_or(self.url.is_some())
    }

    /// Get the effective timeout configuration
    pub fn timeout_config(&self) -> TimeoutConfig {
        self.timeout.clone().unwrap_or_default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defaults: Defaults::default(),
            endpoint: EndpointConfig::default(),
        }
    }
}

impl Config {
    /// Bulk operation tuning from the defaults section
    pub fn bulk_options(&self) -> BulkOptions {
        BulkOptions {
            parallel: self.defaults.max_parallel_requests.max(1),
            flatten: false,
            page_size: Some(self.defaults.page_size.clamp(1, DEFAULT_PAGE_SIZE)),
        }
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("Could not determine config directory".into()))?
                .join("s3u"),
        };
        Ok(Self {
            config_path: config_dir.join("config.toml"),
        })
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    /// If the schema version doesn't match, attempts migration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        if config.schema_version < SCHEMA_VERSION {
            config = self.migrate(config)?;
        } else if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade s3u.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        config.endpoint.validate()?;
        Ok(config)
    }

    /// Save configuration to disk
    ///
    /// Creates parent directories if they don't exist.
    /// Sets file permissions to 600 (owner read/write only).
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config_path, permissions)?;
        }

        Ok(())
    }

    /// Migrate configuration from older schema version
    fn migrate(&self, config: Config) -> Result<Config> {
        let mut config = config;
        tracing::debug!(from = config.schema_version, to = SCHEMA_VERSION, "migrating config");
        config.schema_version = SCHEMA_VERSION;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let manager = ConfigManager::with_path(config_path);
        (manager, temp_dir)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.defaults.output, "human");
        assert_eq!(config.defaults.color, "auto");
        assert_eq!(config.defaults.max_parallel_requests, 10);
        assert!(config.endpoint.url.is_none());
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let (manager, _temp_dir) = temp_config_manager();
        let config = manager.load().unwrap();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn test_save_and_load() {
        let (manager, _temp_dir) = temp_config_manager();

        let mut config = Config::default();
        config.defaults.max_parallel_requests = 32;
        config.endpoint = EndpointConfig {
            url: Some("http://localhost:9000".to_string()),
            region: Some("us-east-1".to_string()),
            access_key: Some("minioadmin".to_string()),
            secret_key: Some("minioadmin".to_string()),
            force_path_style: None,
            timeout: Some(TimeoutConfig {
                connect_ms: 1000,
                operation_ms: Some(30000),
            }),
        };

        manager.save(&config).unwrap();
        let loaded = manager.load().unwrap();

        assert_eq!(loaded.defaults.max_parallel_requests, 32);
        assert_eq!(loaded.endpoint, config.endpoint);
        assert!(loaded.endpoint.path_style());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let (manager, _temp_dir) = temp_config_manager();
        std::fs::write(
            manager.config_path(),
            "schema_version = 1\n[endpoint]\nurl = \"http://127.0.0.1:9000\"\n",
        )
        .unwrap();

        let config = manager.load().unwrap();
        assert_eq!(config.defaults.page_size, 1000);
        assert_eq!(config.endpoint.timeout_config().connect_ms, 5000);
        assert_eq!(config.bulk_options().parallel, 10);
    }

    #[test]
    fn test_invalid_endpoint_url() {
        let (manager, _temp_dir) = temp_config_manager();
        std::fs::write(
            manager.config_path(),
            "schema_version = 1\n[endpoint]\nurl = \"not a url\"\n",
        )
        .unwrap();

        let err = manager.load().unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn test_unpaired_credentials() {
        let endpoint = EndpointConfig {
            access_key: Some("key".into()),
            ..Default::default()
        };
        assert!(matches!(endpoint.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_schema_version_too_new() {
        let (manager, _temp_dir) = temp_config_manager();

        let content = format!(
            r#"
            schema_version = {}
            "#,
            SCHEMA_VERSION + 1
        );
        std::fs::write(manager.config_path(), content).unwrap();

        let result = manager.load();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("newer than supported")
        );
    }
}
