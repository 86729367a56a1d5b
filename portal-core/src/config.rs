//! Configuration management

use crate::config_error;
use crate::error::{ErrorContext, PortalError, PortalResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "exam-portal";

/// Top-level configuration file layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub guard: GuardConfig,
    pub logging: LoggingConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every request path is appended to
    pub base_url: String,
    /// Overall request deadline in milliseconds
    pub timeout_ms: u64,
    /// Header the session token is sent in
    pub token_header: String,
    /// Optional scheme prefix, e.g. "Bearer"
    pub token_scheme: Option<String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_ms: 10_000,
            token_header: "token".to_string(),
            token_scheme: None,
            user_agent: format!("exam-portal/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Durable session storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// File holding the durable token entry
    pub token_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            token_file: default_data_dir().join("session.json"),
        }
    }
}

/// Navigation guard settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Check route role requirements against the session role, not only
    /// token presence
    pub enforce_roles: bool,
}

/// Per-user data directory, falling back to the working directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".").join(format!(".{}", APP_DIR)))
}

/// Default location of the configuration file
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".").join(format!(".{}", APP_DIR)))
        .join("config.toml")
}

impl PortalConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> PortalResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PortalError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: PortalConfig = toml::from_str(&content).map_err(|e| PortalError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Load the file if it exists, otherwise use defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> PortalResult<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> PortalResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| PortalError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content).map_err(|e| PortalError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> PortalResult<()> {
        let url = url::Url::parse(&self.api.base_url).map_err(|e| PortalError::Config {
            message: format!("Invalid api.base_url '{}': {}", self.api.base_url, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("validate")
                .with_suggestion("Use an absolute URL such as http://localhost:8080"),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(PortalError::Config {
                message: format!("Unsupported URL scheme: {}", url.scheme()),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set api.base_url to an http or https URL"),
            });
        }

        if self.api.timeout_ms == 0 {
            return Err(config_error!("api.timeout_ms must be greater than 0", "config"));
        }

        if self.api.token_header.trim().is_empty() {
            return Err(config_error!("api.token_header must not be empty", "config"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PortalConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.timeout_ms, 10_000);
        assert_eq!(config.api.token_header, "token");
        assert!(!config.guard.enforce_roles);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PortalConfig::default();
        config.api.base_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(PortalError::Config { .. })));

        let mut config = PortalConfig::default();
        config.api.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = PortalConfig::default();
        config.api.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = PortalConfig::default();
        config.api.token_header = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert_eq!(err.user_message(), "api.token_header must not be empty");
        assert!(err
            .context()
            .is_some_and(|c| !c.recovery_suggestions.is_empty()));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[api]\nbase_url = \"https://portal.example.edu/api\"\n\n[guard]\nenforce_roles = true\n",
        )
        .unwrap();

        let config = PortalConfig::from_file(&path).unwrap();
        assert_eq!(config.api.base_url, "https://portal.example.edu/api");
        assert_eq!(config.api.timeout_ms, 10_000);
        assert!(config.guard.enforce_roles);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = PortalConfig::default();
        config.api.token_scheme = Some("Bearer".to_string());
        config.save_to_file(&path).unwrap();

        let loaded = PortalConfig::load_or_default(&path).unwrap();
        assert_eq!(loaded.api.token_scheme.as_deref(), Some("Bearer"));
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = PortalConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8080");
    }
}
