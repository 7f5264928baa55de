//! Gateway fleet and OTA distribution
//!
//! Nodes pull firmware from per-node OTA channels; endpoints are
//! flashed directly. Both go through the same admission sequence

pub mod artifact;
pub mod context;
pub mod policy;
pub mod registry;
pub mod types;

pub use artifact::Artifact;
pub use context::Fleet;
pub use policy::{AdmissionPolicy, Rejection, UpdateOutcome, admit};
pub use registry::{ChannelStatus, OtaRegistry, StagedArtifact};
pub use types::{BatteryThresholds, DeviceDefaults, Endpoint, EndpointRecord, Node, NodeRecord};
