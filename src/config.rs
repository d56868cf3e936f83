//! Discovery subsystem configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Runtime capability toggles.
///
/// The C source gates these behind compile-time `#ifdef`s
/// (`UA_ENABLE_DISCOVERY`, `UA_ENABLE_DISCOVERY_SEMAPHORE`,
/// `UA_ENABLE_DISCOVERY_MULTICAST`, `UA_ENABLE_MULTITHREADING`); this crate
/// models each as an independently toggleable runtime flag instead, since a
/// single binary serving multiple deployments is more useful than four
/// build variants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Capabilities {
    /// Enables the registry (`RegisterServer`/`RegisterServer2`/sweep) at all.
    /// When disabled, `FindServers` only ever reports the self-description.
    #[serde(default = "default_true")]
    pub discovery: bool,

    /// Enables the semaphore-file liveness check on register and sweep.
    #[serde(default = "default_true")]
    pub semaphore: bool,

    /// Enables the mDNS TXT-record update hook on register.
    #[serde(default)]
    pub multicast: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            discovery: default_true(),
            semaphore: default_true(),
            multicast: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Discovery Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// This application's own URI, compared against `FindServers` filters.
    #[serde(default = "default_application_uri")]
    pub application_uri: String,

    /// Registration cleanup timeout in seconds. `0` disables the timeout
    /// check in `sweep` (only the semaphore check then runs).
    #[serde(default = "default_cleanup_timeout_secs")]
    pub cleanup_timeout_secs: u64,

    /// Default interval for the periodic self-registration job, in
    /// milliseconds. The OPC-UA-recommended default is 10 minutes.
    #[serde(default = "default_register_interval_ms")]
    pub register_interval_ms: u64,

    pub capabilities: Capabilities,
}

fn default_application_uri() -> String {
    "urn:opcua-discovery:server".to_string()
}

fn default_cleanup_timeout_secs() -> u64 {
    3600
}

fn default_register_interval_ms() -> u64 {
    10 * 60 * 1000
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            application_uri: default_application_uri(),
            cleanup_timeout_secs: default_cleanup_timeout_secs(),
            register_interval_ms: default_register_interval_ms(),
            capabilities: Capabilities::default(),
        }
    }
}

impl DiscoveryConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))
    }

    pub fn cleanup_timeout(&self) -> Duration {
        Duration::from_secs(self.cleanup_timeout_secs)
    }

    pub fn register_interval(&self) -> Duration {
        Duration::from_millis(self.register_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application_uri.is_empty() {
            return Err(ConfigError::InvalidValue(
                "application_uri cannot be empty".into(),
            ));
        }
        if self.register_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "register_interval_ms cannot be 0".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, Clone)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Serialize(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(s) => write!(f, "I/O error: {s}"),
            Self::Parse(s) => write!(f, "Parse error: {s}"),
            Self::Serialize(s) => write!(f, "Serialize error: {s}"),
            Self::InvalidValue(s) => write!(f, "Invalid value: {s}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.register_interval_ms, 10 * 60 * 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = DiscoveryConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: DiscoveryConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.application_uri, parsed.application_uri);
    }

    #[test]
    fn validation_rejects_empty_application_uri() {
        let config = DiscoveryConfig {
            application_uri: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_zero_interval() {
        let config = DiscoveryConfig {
            register_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("discovery.json");

        let config = DiscoveryConfig {
            application_uri: "urn:example:server".into(),
            ..Default::default()
        };
        config.to_file(&path).unwrap();

        let loaded = DiscoveryConfig::from_file(&path).unwrap();
        assert_eq!(loaded.application_uri, "urn:example:server");
    }

    #[test]
    fn from_file_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = DiscoveryConfig::from_file(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
