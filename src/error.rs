//! Error types for the fleet OTA gateway

use thiserror::Error;

/// Result type alias for fleet operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the fleet OTA gateway
///
/// Expected admission failures (busy device, low battery, wrong hardware)
/// are not errors; they are reported as [`crate::fleet::Rejection`] values.
#[derive(Debug, Error)]
pub enum Error {
    /// Artifact name does not follow `<tag>_<version>.swu`
    #[error("malformed artifact '{artifact}': {reason}")]
    MalformedArtifact {
        artifact: String,
        reason: &'static str,
    },

    /// A node with this identity already exists in the fleet
    #[error("duplicate node: {0}")]
    DuplicateNode(String),

    /// An endpoint with this serial already exists in the fleet
    #[error("duplicate endpoint: {0}")]
    DuplicateEndpoint(String),

    /// Endpoint is already attached to a node
    #[error("endpoint {serial} already owned by {owner}")]
    EndpointAlreadyOwned { serial: String, owner: String },

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
