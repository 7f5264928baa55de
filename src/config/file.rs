//! TOML configuration file loading
//!
//! Supports `~/.config/fleet-ota/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct FleetConfigFile {
    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Device factory defaults
    #[serde(default)]
    pub devices: DevicesFileConfig,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,

    /// Bearer token required on mutating routes
    pub api_key: Option<String>,
}

/// Device factory defaults
#[derive(Debug, Default, Deserialize)]
pub struct DevicesFileConfig {
    /// Firmware version nodes start at
    pub node_version: Option<String>,

    /// Firmware version endpoints start at
    pub endpoint_version: Option<String>,

    /// Endpoint hardware type with the higher battery threshold
    pub high_power_type: Option<String>,

    pub high_power_threshold: Option<i64>,

    pub default_threshold: Option<i64>,
}

/// Load the TOML config file from the standard path
///
/// Returns `FleetConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> FleetConfigFile {
    let Some(path) = config_file_path() else {
        return FleetConfigFile::default();
    };

    if !path.exists() {
        return FleetConfigFile::default();
    }

    match read_config_file(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            FleetConfigFile::default()
        }
    }
}

/// Read and parse a TOML config file from an explicit path
///
/// # Errors
///
/// Returns [`Error::Io`] if the file can't be read and [`Error::Toml`]
/// if it isn't valid config
pub fn read_config_file(path: &Path) -> Result<FleetConfigFile> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Return the config file path: `~/.config/fleet-ota/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("fleet-ota").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_file() {
        let fc: FleetConfigFile = toml::from_str(
            r#"
            [server]
            port = 9000

            [devices]
            high_power_threshold = 3700
            "#,
        )
        .unwrap();

        assert_eq!(fc.server.port, Some(9000));
        assert!(fc.server.api_key.is_none());
        assert_eq!(fc.devices.high_power_threshold, Some(3700));
        assert!(fc.devices.node_version.is_none());
    }

    #[test]
    fn empty_file_is_default() {
        let fc: FleetConfigFile = toml::from_str("").unwrap();
        assert!(fc.server.port.is_none());
    }

    #[test]
    fn missing_path_is_io_error() {
        let err = read_config_file(Path::new("/nonexistent/fleet-ota/config.toml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn invalid_file_is_toml_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();

        let err = read_config_file(&path).unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }
}
