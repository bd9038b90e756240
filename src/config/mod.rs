//! Configuration management
//!
//! Configuration is loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Lookup cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// List paging configuration
    #[serde(default)]
    pub paging: PagingConfig,
    /// Upload (Excel import) configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// View template configuration
    #[serde(default)]
    pub views: ViewsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file path or URL (`:memory:` for an in-memory database)
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/projekti.db".to_string()
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of cached entries
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_ttl() -> u64 {
    600
}

fn default_max_capacity() -> u64 {
    1000
}

/// Paging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagingConfig {
    /// Rows per list page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> u32 {
    10
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum uploaded file size in bytes (default: 5MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Maximum number of data rows accepted by one Excel import
    #[serde(default = "default_max_import_rows")]
    pub max_import_rows: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            max_import_rows: default_max_import_rows(),
        }
    }
}

fn default_max_file_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_max_import_rows() -> usize {
    1000
}

/// View template configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewsConfig {
    /// Directory with `*.html` templates overriding the embedded ones
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - PROJEKTI_SERVER_HOST
    /// - PROJEKTI_SERVER_PORT
    /// - PROJEKTI_DATABASE_URL
    /// - PROJEKTI_CACHE_TTL_SECONDS
    /// - PROJEKTI_PAGING_PAGE_SIZE
    /// - PROJEKTI_UPLOAD_MAX_FILE_SIZE
    /// - PROJEKTI_UPLOAD_MAX_IMPORT_ROWS
    /// - PROJEKTI_VIEWS_PATH
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("PROJEKTI_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PROJEKTI_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }

        if let Ok(url) = std::env::var("PROJEKTI_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(ttl) = std::env::var("PROJEKTI_CACHE_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.cache.ttl_seconds = ttl;
            }
        }

        if let Ok(size) = std::env::var("PROJEKTI_PAGING_PAGE_SIZE") {
            if let Ok(size) = size.parse::<u32>() {
                self.paging.page_size = size;
            }
        }

        if let Ok(size) = std::env::var("PROJEKTI_UPLOAD_MAX_FILE_SIZE") {
            if let Ok(size) = size.parse::<u64>() {
                self.upload.max_file_size = size;
            }
        }
        if let Ok(rows) = std::env::var("PROJEKTI_UPLOAD_MAX_IMPORT_ROWS") {
            if let Ok(rows) = rows.parse::<usize>() {
                self.upload.max_import_rows = rows;
            }
        }

        if let Ok(path) = std::env::var("PROJEKTI_VIEWS_PATH") {
            self.views.path = Some(PathBuf::from(path));
        }
    }

    /// Check values that have no sensible meaning when out of range.
    ///
    /// A page size above 100 is clamped rather than rejected.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be greater than 0".to_string(),
            ));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.url must not be empty".to_string(),
            ));
        }
        if self.paging.page_size == 0 {
            return Err(ConfigError::ValidationError(
                "paging.page_size must be greater than 0".to_string(),
            ));
        }
        if self.upload.max_import_rows == 0 {
            return Err(ConfigError::ValidationError(
                "upload.max_import_rows must be greater than 0".to_string(),
            ));
        }
        self.paging.page_size = self.paging.page_size.min(100);
        Ok(())
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "PROJEKTI_SERVER_HOST",
    "PROJEKTI_SERVER_PORT",
    "PROJEKTI_DATABASE_URL",
    "PROJEKTI_CACHE_TTL_SECONDS",
    "PROJEKTI_PAGING_PAGE_SIZE",
    "PROJEKTI_UPLOAD_MAX_FILE_SIZE",
    "PROJEKTI_UPLOAD_MAX_IMPORT_ROWS",
    "PROJEKTI_VIEWS_PATH",
];

#[cfg(test)]
fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        super::CONFIG_ENV_MUTEX
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::path::Path::new("nonexistent_projekti_config.yml");
        let config = Config::load(path).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url, "data/projekti.db");
        assert_eq!(config.cache.ttl_seconds, 600);
        assert_eq!(config.paging.page_size, 10);
        assert_eq!(config.upload.max_file_size, 5 * 1024 * 1024);
        assert_eq!(config.upload.max_import_rows, 1000);
        assert!(config.views.path.is_none());
    }

    #[test]
    fn test_load_empty_file_returns_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "   \n").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 9000\npaging:\n  page_size: 25\n").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.paging.page_size, 25);
        assert_eq!(config.database.url, "data/projekti.db");
    }

    #[test]
    fn test_load_full_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
server:
  host: 127.0.0.1
  port: 3000
database:
  url: /var/lib/projekti/db.sqlite
cache:
  ttl_seconds: 60
  max_capacity: 50
paging:
  page_size: 20
upload:
  max_file_size: 1024
  max_import_rows: 10
views:
  path: /etc/projekti/templates
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.url, "/var/lib/projekti/db.sqlite");
        assert_eq!(config.cache.ttl_seconds, 60);
        assert_eq!(config.cache.max_capacity, 50);
        assert_eq!(config.paging.page_size, 20);
        assert_eq!(config.upload.max_file_size, 1024);
        assert_eq!(config.upload.max_import_rows, 10);
        assert_eq!(
            config.views.path,
            Some(PathBuf::from("/etc/projekti/templates"))
        );
    }

    #[test]
    fn test_load_invalid_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: not_a_number\n").unwrap();

        let result = Config::load(file.path());
        assert!(result.is_err());
        let message = result.unwrap_err().to_string();
        assert!(message.contains("Failed to parse config file"));
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let mut config = Config::default();
        config.paging.page_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_clamps_large_page_size() {
        let mut config = Config::default();
        config.paging.page_size = 500;
        config.validate().unwrap();
        assert_eq!(config.paging.page_size, 100);
    }

    #[test]
    fn test_validate_rejects_empty_database_url() {
        let mut config = Config::default();
        config.database.url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_override_server_and_database() {
        let _guard = lock_env();
        clear_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "").unwrap();

        std::env::set_var("PROJEKTI_SERVER_HOST", "10.0.0.1");
        std::env::set_var("PROJEKTI_SERVER_PORT", "9999");
        std::env::set_var("PROJEKTI_DATABASE_URL", ":memory:");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.server.host, "10.0.0.1");
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.database.url, ":memory:");

        clear_env();
    }

    #[test]
    fn test_env_override_paging_upload_views() {
        let _guard = lock_env();
        clear_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "").unwrap();

        std::env::set_var("PROJEKTI_PAGING_PAGE_SIZE", "30");
        std::env::set_var("PROJEKTI_UPLOAD_MAX_FILE_SIZE", "2048");
        std::env::set_var("PROJEKTI_UPLOAD_MAX_IMPORT_ROWS", "5");
        std::env::set_var("PROJEKTI_VIEWS_PATH", "/tmp/views");
        std::env::set_var("PROJEKTI_CACHE_TTL_SECONDS", "15");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.paging.page_size, 30);
        assert_eq!(config.upload.max_file_size, 2048);
        assert_eq!(config.upload.max_import_rows, 5);
        assert_eq!(config.views.path, Some(PathBuf::from("/tmp/views")));
        assert_eq!(config.cache.ttl_seconds, 15);

        clear_env();
    }

    #[test]
    fn test_env_override_invalid_number_ignored() {
        let _guard = lock_env();
        clear_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 8081\n").unwrap();

        std::env::set_var("PROJEKTI_SERVER_PORT", "not_a_number");
        std::env::set_var("PROJEKTI_PAGING_PAGE_SIZE", "-3");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.server.port, 8081);
        assert_eq!(config.paging.page_size, 10);

        clear_env();
    }
}
