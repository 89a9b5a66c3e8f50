// crates/deckhand-server/src/config.rs
// ============================================================================
// Module: Deckhand Configuration
// Description: Configuration loading and validation for the Deckhand server.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size limits. A
//! missing file yields the built-in defaults; a present but invalid file
//! fails closed. Only the settings the launching environment may change
//! reach the core: the bind host and port, plus audit sink selection.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::IpAddr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "deckhand.toml";
/// Environment variable used to override the config path.
const CONFIG_ENV_VAR: &str = "DECKHAND_CONFIG";
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 64 * 1024;
/// Default bind host.
const DEFAULT_HOST: &str = "127.0.0.1";
/// Default bind port.
const DEFAULT_PORT: u16 = 12346;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Deckhand server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeckhandConfig {
    /// Server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Audit sink configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Server bind configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind host, IPv4 dotted form.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Audit sink configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditConfig {
    /// Whether audit events are recorded.
    #[serde(default)]
    pub enabled: bool,
    /// Audit log file path; stderr when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Returns the default bind host.
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

/// Returns the default bind port.
const fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Returns the bind address in `host:port` form.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validates the bind configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Invalid("server.host must not be empty".to_string()));
        }
        if self.host.parse::<IpAddr>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "server.host is not an IP address: {}",
                self.host
            )));
        }
        Ok(())
    }
}

impl DeckhandConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit path argument, then the `DECKHAND_CONFIG`
    /// environment variable, then `deckhand.toml` in the working directory.
    /// A missing default file yields the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an explicitly named file is missing or
    /// when any file fails to parse or validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = path.map(Path::to_path_buf).or_else(env_config_path);
        let resolved = match explicit {
            Some(path) => path,
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_NAME);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        if self.audit.enabled
            && let Some(path) = &self.audit.path
            && path.as_os_str().is_empty()
        {
            return Err(ConfigError::Invalid("audit.path must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Reads the config path override from the environment.
fn env_config_path() -> Option<PathBuf> {
    env::var_os(CONFIG_ENV_VAR).map(PathBuf::from)
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Filesystem errors while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parse errors.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Semantic validation errors.
    #[error("config invalid: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions."
    )]

    use super::DeckhandConfig;
    use super::ServerConfig;

    #[test]
    fn defaults_match_reference_environment() {
        let config = DeckhandConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 12346);
        assert!(!config.audit.enabled);
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 7777,
        };
        assert_eq!(server.bind_addr(), "127.0.0.1:7777");
    }

    #[test]
    fn parse_overrides_port() {
        let config: DeckhandConfig =
            toml::from_str("[server]\nport = 9000\n").expect("valid toml");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn validate_rejects_non_ip_host() {
        let config: DeckhandConfig =
            toml::from_str("[server]\nhost = \"not an ip\"\n").expect("valid toml");
        let error = config.validate().expect_err("invalid host");
        assert!(error.to_string().contains("not an IP address"));
    }

    #[test]
    fn load_rejects_malformed_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("deckhand.toml");
        std::fs::write(&path, "[server\nport=1").expect("write config");
        let result = DeckhandConfig::load(Some(&path));
        assert!(result.is_err());
    }

    #[test]
    fn load_reads_explicit_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("deckhand.toml");
        std::fs::write(&path, "[server]\nport = 4242\n").expect("write config");
        let config = DeckhandConfig::load(Some(&path)).expect("load config");
        assert_eq!(config.server.port, 4242);
    }
}
