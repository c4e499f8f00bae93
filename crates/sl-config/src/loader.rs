//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "shortlink.toml",
    "./config/config.toml",
    "/etc/shortlink/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file() {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        self.apply_env_overrides(&mut config);

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
        }

        if let Ok(path) = env::var("SHORTLINK_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&self, config: &mut AppConfig) {
        // HTTP
        if let Ok(val) = env::var("SHORTLINK_HTTP_PORT") {
            if let Ok(port) = val.parse() {
                config.http.port = port;
            }
        }
        if let Ok(val) = env::var("SHORTLINK_METRICS_PORT") {
            if let Ok(port) = val.parse() {
                config.http.metrics_port = port;
            }
        }
        if let Ok(val) = env::var("SHORTLINK_HTTP_HOST") {
            config.http.host = val;
        }
        if let Ok(val) = env::var("SHORTLINK_CORS_ORIGINS") {
            config.http.cors_origins = val.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Database
        if let Ok(val) = env::var("SHORTLINK_DATABASE_URL") {
            config.database.url = val;
        }
        if let Ok(val) = env::var("SHORTLINK_DATABASE_MAX_CONNECTIONS") {
            if let Ok(max) = val.parse() {
                config.database.max_connections = max;
            }
        }

        // Auth
        if let Ok(val) = env::var("SHORTLINK_JWT_SECRET") {
            config.auth.jwt_secret = val;
        }
        if let Ok(val) = env::var("SHORTLINK_TOKEN_TTL_SECS") {
            if let Ok(ttl) = val.parse() {
                config.auth.token_ttl_secs = ttl;
            }
        }

        // Allocator
        if let Ok(val) = env::var("SHORTLINK_ALLOCATOR_MAX_ATTEMPTS") {
            if let Ok(attempts) = val.parse() {
                config.allocator.max_attempts = attempts;
            }
        }

        // Resource services
        if let Ok(val) = env::var("SHORTLINK_LINK_BASE_URL") {
            config.link.base_url = val;
        }
        if let Ok(val) = env::var("SHORTLINK_FILE_BASE_URL") {
            config.file.base_url = val;
        }
        if let Ok(val) = env::var("SHORTLINK_UPLOAD_DIR") {
            config.file.upload_dir = val;
        }
        if let Ok(val) = env::var("SHORTLINK_MAX_FILE_SIZE") {
            if let Ok(size) = val.parse() {
                config.file.max_file_size = size;
            }
        }
        if let Ok(val) = env::var("SHORTLINK_NOTE_BASE_URL") {
            config.note.base_url = val;
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shortlink.toml");
        std::fs::write(&path, "[allocator]\nmax_attempts = 3\n").unwrap();

        let config = ConfigLoader::with_path(&path).load().unwrap();
        assert_eq!(config.allocator.max_attempts, 3);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[http\nport = ").unwrap();

        let result = ConfigLoader::with_path(&path).load();
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
