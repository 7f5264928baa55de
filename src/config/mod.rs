//! Configuration management for the fleet OTA gateway

pub mod file;

use std::fmt;
use std::path::Path;

use crate::fleet::{BatteryThresholds, DeviceDefaults};
use crate::{Error, Result};

use self::file::FleetConfigFile;

/// Default HTTP API port
pub const DEFAULT_PORT: u16 = 18800;

/// Fleet gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API server configuration
    pub api_server: ApiServerConfig,

    /// Factory defaults for seeded devices
    pub devices: DeviceDefaults,
}

/// HTTP API server configuration
#[derive(Clone)]
pub struct ApiServerConfig {
    /// Port to listen on
    pub port: u16,

    /// API key for mutating endpoints (from `FLEET_API_KEY` env)
    pub api_key: Option<String>,
}

impl fmt::Debug for ApiServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiServerConfig")
            .field("port", &self.port)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_server: ApiServerConfig {
                port: DEFAULT_PORT,
                api_key: None,
            },
            devices: DeviceDefaults::default(),
        }
    }
}

impl Config {
    /// Load configuration from the standard config file and environment
    ///
    /// Priority is env > toml > default
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration is invalid
    pub fn load() -> Result<Self> {
        Self::from_file_config(file::load_config_file())
    }

    /// Load configuration with an explicit config file path
    ///
    /// Unlike [`Config::load`], a file that can't be read or parsed is an error
    ///
    /// # Errors
    ///
    /// Returns error if the file can't be read or parsed, or if the
    /// resulting configuration is invalid
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::from_file_config(file::read_config_file(path)?)
    }

    fn from_file_config(fc: FleetConfigFile) -> Result<Self> {
        let api_server = ApiServerConfig {
            port: std::env::var("FLEET_API_PORT")
                .or_else(|_| std::env::var("PORT"))
                .ok()
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
            api_key: std::env::var("FLEET_API_KEY").ok().or(fc.server.api_key),
        };

        let base = DeviceDefaults::default();
        let devices = DeviceDefaults {
            node_version: fc.devices.node_version.unwrap_or(base.node_version),
            endpoint_version: fc.devices.endpoint_version.unwrap_or(base.endpoint_version),
            battery: BatteryThresholds {
                high_power_type: fc
                    .devices
                    .high_power_type
                    .unwrap_or(base.battery.high_power_type),
                high_power: fc
                    .devices
                    .high_power_threshold
                    .unwrap_or(base.battery.high_power),
                default: fc
                    .devices
                    .default_threshold
                    .unwrap_or(base.battery.default),
            },
        };

        let config = Self {
            api_server,
            devices,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if a device default is empty or a threshold is negative
    pub fn validate(&self) -> Result<()> {
        if self.devices.node_version.is_empty() || self.devices.endpoint_version.is_empty() {
            return Err(Error::Config("initial firmware versions must not be empty".to_string()));
        }
        if self.devices.battery.high_power_type.is_empty() {
            return Err(Error::Config("high_power_type must not be empty".to_string()));
        }
        if self.devices.battery.high_power < 0 || self.devices.battery.default < 0 {
            return Err(Error::Config("battery thresholds must not be negative".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api_server.port, DEFAULT_PORT);
        assert_eq!(config.devices.battery.high_power, 3600);
    }

    #[test]
    fn negative_threshold_rejected() {
        let mut config = Config::default();
        config.devices.battery.default = -1;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn empty_version_rejected() {
        let mut config = Config::default();
        config.devices.node_version.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn file_overlays_device_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[devices]\nnode_version = \"1\"\nhigh_power_type = \"Heavy\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.devices.node_version, "1");
        assert_eq!(config.devices.endpoint_version, "10");
        assert_eq!(config.devices.battery.high_power_type, "Heavy");
        assert_eq!(config.devices.battery.default, 2500);
    }

    #[test]
    fn explicit_file_with_bad_value_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[devices]\nhigh_power_threshold = \"not a number\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn explicit_path_to_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn debug_output_hides_api_key() {
        let mut config = Config::default();
        config.api_server.api_key = Some("super-secret-token".to_string());

        let printed = format!("{config:?}");
        assert!(!printed.contains("super-secret-token"));
        assert!(printed.contains("[redacted]"));
    }
}
