//! Shortlink Configuration System
//!
//! TOML-based configuration with environment variable override support.
//! Every service binary loads the same [`AppConfig`]; each one reads only the
//! sections it needs. The `auth.jwt_secret` value must be identical across the
//! auth service and every resource service, since tokens are verified locally.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Minimum HS256 secret length in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime: ten years
pub const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub allocator: AllocatorConfig,
    pub link: LinkConfig,
    pub file: FileConfig,
    pub note: NoteConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            allocator: AllocatorConfig::default(),
            link: LinkConfig::default(),
            file: FileConfig::default(),
            note: NoteConfig::default(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub port: u16,
    /// Separate listener for /metrics, /health and /ready
    pub metrics_port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            metrics_port: 9090,
            host: "0.0.0.0".to_string(),
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
        }
    }
}

/// SQLite database configuration (sqlx connection URL)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/shortlink.db?mode=rwc".to_string(),
            max_connections: 10,
        }
    }
}

/// Token configuration shared by the issuer and all verifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for HS256 token signatures
    pub jwt_secret: String,
    /// Token lifetime in seconds
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: 86400, // 24 hours
        }
    }
}

/// Short code allocation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Insert attempts before giving up with an exhaustion error
    pub max_attempts: u32,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self { max_attempts: 16 }
    }
}

/// URL shortener service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub base_url: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9002".to_string(),
        }
    }
}

/// File sharing service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub base_url: String,
    pub upload_dir: String,
    /// Maximum accepted upload size in bytes
    pub max_file_size: usize,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9003".to_string(),
            upload_dir: "./uploads".to_string(),
            max_file_size: 10 * 1024 * 1024,
        }
    }
}

/// Note sharing service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteConfig {
    pub base_url: String,
}

impl Default for NoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9004".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        let loader = ConfigLoader::new();
        loader.load()
    }

    /// Reject settings no service can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::ValidationError(format!(
                "auth.jwt_secret must be at least {} bytes (set SHORTLINK_JWT_SECRET)",
                MIN_JWT_SECRET_LEN
            )));
        }
        if self.auth.token_ttl_secs == 0 || self.auth.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::ValidationError(format!(
                "auth.token_ttl_secs must be between 1 and {}",
                MAX_TOKEN_TTL_SECS
            )));
        }
        if self.allocator.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "allocator.max_attempts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# Shortlink Configuration
# Environment variables (SHORTLINK_*) override these settings

[http]
port = 8080
metrics_port = 9090
host = "0.0.0.0"
cors_origins = ["http://localhost:5173", "http://localhost:3000"]

[database]
url = "sqlite://data/shortlink.db?mode=rwc"
max_connections = 10

[auth]
# Must be the same value in every service
jwt_secret = ""
token_ttl_secs = 86400

[allocator]
max_attempts = 16

[link]
base_url = "http://localhost:9002"

[file]
base_url = "http://localhost:9003"
upload_dir = "./uploads"
max_file_size = 10485760

[note]
base_url = "http://localhost:9004"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_toml_parses_to_defaults() {
        let config: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.auth.token_ttl_secs, 86400);
        assert_eq!(config.allocator.max_attempts, 16);
        assert_eq!(config.file.max_file_size, 10 * 1024 * 1024);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str("[link]\nbase_url = \"https://s.example\"\n").unwrap();
        assert_eq!(config.link.base_url, "https://s.example");
        assert_eq!(config.note.base_url, "http://localhost:9004");
    }

    #[test]
    fn test_validate_rejects_short_secret() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "too-short".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        config.auth.jwt_secret = "x".repeat(MIN_JWT_SECRET_LEN);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bounds_token_ttl() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "x".repeat(MIN_JWT_SECRET_LEN);

        config.auth.token_ttl_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        config.auth.token_ttl_secs = 9_000_000_000_000;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        config.auth.token_ttl_secs = MAX_TOKEN_TTL_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[http]\nport = 9002\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.http.port, 9002);
    }
}
