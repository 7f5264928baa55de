//! Fleet OTA - firmware distribution for IoT gateway fleets
//!
//! This library provides the core functionality for the fleet gateway:
//! - Device state for gateway nodes and their sensor endpoints
//! - Update admission (hardware match, backlog and battery gates)
//! - OTA channels that stage artifacts until nodes pull them
//! - An HTTP API over a shared fleet
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 HTTP API / CLI                       │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                     Fleet                            │
//! │   OTA channels  │  trigger  │  direct endpoint flash │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │               Admission policies                     │
//! │   Node: hardware  │  Endpoint: backlog, battery, hw  │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod fleet;

pub use config::Config;
pub use error::{Error, Result};
pub use fleet::{
    Artifact, ChannelStatus, DeviceDefaults, Endpoint, EndpointRecord, Fleet, Node, NodeRecord,
    Rejection, UpdateOutcome,
};
