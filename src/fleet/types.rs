//! Device state for gateway nodes and their sensor endpoints

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Battery thresholds below which endpoint updates are deferred
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryThresholds {
    /// Hardware type that draws more power while flashing
    pub high_power_type: String,
    /// Threshold for the high-power hardware type
    pub high_power: i64,
    /// Threshold for every other hardware type
    pub default: i64,
}

impl Default for BatteryThresholds {
    fn default() -> Self {
        Self {
            high_power_type: "Canary".to_string(),
            high_power: 3600,
            default: 2500,
        }
    }
}

impl BatteryThresholds {
    /// Threshold that applies to the given hardware type
    #[must_use]
    pub fn for_hardware(&self, hardware_type: &str) -> i64 {
        if hardware_type == self.high_power_type {
            self.high_power
        } else {
            self.default
        }
    }
}

/// Factory defaults applied when devices are constructed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDefaults {
    pub node_version: String,
    pub endpoint_version: String,
    pub battery: BatteryThresholds,
}

impl Default for DeviceDefaults {
    fn default() -> Self {
        Self {
            node_version: "33".to_string(),
            endpoint_version: "10".to_string(),
            battery: BatteryThresholds::default(),
        }
    }
}

/// A gateway device with its own firmware and a fixed set of endpoints
#[derive(Debug, Clone)]
pub struct Node {
    hardware_type: String,
    serial: String,
    uuid: String,
    ota_channel: String,
    pub(crate) firmware_version: String,
    endpoints: Vec<Endpoint>,
}

impl Node {
    /// Create a node; identity and OTA channel are derived from the inputs
    #[must_use]
    pub fn new(hardware_type: &str, serial: &str, defaults: &DeviceDefaults) -> Self {
        let uuid = format!("{hardware_type}_{serial}");
        let ota_channel = format!("OTA_{uuid}");
        Self {
            hardware_type: hardware_type.to_string(),
            serial: serial.to_string(),
            uuid,
            ota_channel,
            firmware_version: defaults.node_version.clone(),
            endpoints: Vec::new(),
        }
    }

    #[must_use]
    pub fn hardware_type(&self) -> &str {
        &self.hardware_type
    }

    #[must_use]
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Node identity (`<hardware type>_<serial>`)
    #[must_use]
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Broadcast channel this node pulls artifacts from
    #[must_use]
    pub fn ota_channel(&self) -> &str {
        &self.ota_channel
    }

    #[must_use]
    pub fn firmware_version(&self) -> &str {
        &self.firmware_version
    }

    /// Endpoints in attachment order
    #[must_use]
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub(crate) fn endpoint_mut(&mut self, index: usize) -> Option<&mut Endpoint> {
        self.endpoints.get_mut(index)
    }

    /// Take ownership of an endpoint, returning its index on this node
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint already belongs to a node
    pub(crate) fn attach_endpoint(&mut self, mut endpoint: Endpoint) -> Result<usize> {
        if let Some(owner) = &endpoint.owner {
            return Err(Error::EndpointAlreadyOwned {
                serial: endpoint.serial,
                owner: owner.clone(),
            });
        }
        endpoint.owner = Some(self.uuid.clone());
        self.endpoints.push(endpoint);
        Ok(self.endpoints.len() - 1)
    }

    /// Serializable view of this node
    #[must_use]
    pub fn record(&self) -> NodeRecord {
        NodeRecord {
            uuid: self.uuid.clone(),
            ota_channel: self.ota_channel.clone(),
            version: self.firmware_version.clone(),
            endpoints: self.endpoints.iter().map(Endpoint::record).collect(),
        }
    }
}

/// A sensor device owned by exactly one node
#[derive(Debug, Clone)]
pub struct Endpoint {
    hardware_type: String,
    serial: String,
    owner: Option<String>,
    battery_threshold: i64,
    pub(crate) firmware_version: String,
    pub(crate) battery: i64,
    pub(crate) backlog: u32,
}

impl Endpoint {
    /// Create an unattached endpoint with an empty backlog
    #[must_use]
    pub fn new(hardware_type: &str, serial: &str, battery: i64, defaults: &DeviceDefaults) -> Self {
        Self {
            hardware_type: hardware_type.to_string(),
            serial: serial.to_string(),
            owner: None,
            battery_threshold: defaults.battery.for_hardware(hardware_type),
            firmware_version: defaults.endpoint_version.clone(),
            battery,
            backlog: 0,
        }
    }

    #[must_use]
    pub fn hardware_type(&self) -> &str {
        &self.hardware_type
    }

    #[must_use]
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Identity of the owning node, once attached
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    #[must_use]
    pub fn firmware_version(&self) -> &str {
        &self.firmware_version
    }

    #[must_use]
    pub const fn battery(&self) -> i64 {
        self.battery
    }

    #[must_use]
    pub const fn battery_threshold(&self) -> i64 {
        self.battery_threshold
    }

    /// Pending work that defers updates while non-zero
    #[must_use]
    pub const fn backlog(&self) -> u32 {
        self.backlog
    }

    pub fn set_battery(&mut self, level: i64) {
        self.battery = level;
    }

    pub fn set_backlog(&mut self, pending: u32) {
        self.backlog = pending;
    }

    /// Serializable view of this endpoint
    #[must_use]
    pub fn record(&self) -> EndpointRecord {
        EndpointRecord {
            serial_number: self.serial.clone(),
            battery: self.battery,
            hardware_type: self.hardware_type.clone(),
            uuid: self.owner.clone(),
            version: self.firmware_version.clone(),
        }
    }
}

/// Snapshot of a node as exposed to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub uuid: String,
    pub ota_channel: String,
    pub version: String,
    pub endpoints: Vec<EndpointRecord>,
}

/// Snapshot of an endpoint as exposed to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRecord {
    pub serial_number: String,
    pub battery: i64,
    pub hardware_type: String,
    /// Owning node identity
    pub uuid: Option<String>,
    pub version: String,
}
