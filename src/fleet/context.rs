//! Fleet context: devices plus the OTA registry they pull from

use std::collections::HashMap;

use super::policy::{self, Rejection, UpdateOutcome};
use super::registry::{ChannelStatus, OtaRegistry, StagedArtifact};
use super::types::{DeviceDefaults, Endpoint, EndpointRecord, Node, NodeRecord};
use crate::{Error, Result};

/// Node hardware types and serials of the seeded fleet
pub const SEED_NODES: [(&str, &str); 3] = [
    ("AHN2", "ABC123"),
    ("Cassia", "XYZ789"),
    ("Moxa", "TBCDB1045001"),
];

/// Endpoint hardware types and starting battery levels attached to every
/// seeded node; serials are `<node hardware type>_<endpoint type>_001`
pub const SEED_ENDPOINTS: [(&str, i64); 3] = [("EP1", 3000), ("EP2", 3000), ("Canary", 4000)];

/// All nodes and endpoints under management plus their OTA channels
#[derive(Debug)]
pub struct Fleet {
    defaults: DeviceDefaults,
    nodes: Vec<Node>,
    by_uuid: HashMap<String, usize>,
    by_channel: HashMap<String, usize>,
    /// Endpoint serial -> (node index, endpoint index on that node)
    endpoints: HashMap<String, (usize, usize)>,
    registry: OtaRegistry,
}

impl Fleet {
    /// Create an empty fleet
    #[must_use]
    pub fn new(defaults: DeviceDefaults) -> Self {
        Self {
            defaults,
            nodes: Vec::new(),
            by_uuid: HashMap::new(),
            by_channel: HashMap::new(),
            endpoints: HashMap::new(),
            registry: OtaRegistry::new(),
        }
    }

    /// Create the standard three-node fleet, three endpoints per node
    ///
    /// # Errors
    ///
    /// Returns error if the seed produces duplicate identities
    pub fn seeded(defaults: DeviceDefaults) -> Result<Self> {
        let mut fleet = Self::new(defaults);

        for (hardware_type, serial) in SEED_NODES {
            let uuid = fleet.add_node(hardware_type, serial)?;
            for (ep_type, battery) in SEED_ENDPOINTS {
                let ep_serial = format!("{hardware_type}_{ep_type}_001");
                fleet.add_endpoint(&uuid, ep_type, &ep_serial, battery)?;
            }
        }

        tracing::debug!(
            nodes = fleet.nodes.len(),
            endpoints = fleet.endpoints.len(),
            "seeded fleet"
        );
        Ok(fleet)
    }

    /// Defaults new devices are built with
    #[must_use]
    pub const fn defaults(&self) -> &DeviceDefaults {
        &self.defaults
    }

    /// Add a node, returning its identity
    ///
    /// # Errors
    ///
    /// Returns error if the identity or channel is already taken
    pub(crate) fn add_node(&mut self, hardware_type: &str, serial: &str) -> Result<String> {
        let node = Node::new(hardware_type, serial, &self.defaults);
        if self.by_uuid.contains_key(node.uuid()) || self.by_channel.contains_key(node.ota_channel())
        {
            return Err(Error::DuplicateNode(node.uuid().to_string()));
        }

        let index = self.nodes.len();
        let uuid = node.uuid().to_string();
        self.by_uuid.insert(uuid.clone(), index);
        self.by_channel.insert(node.ota_channel().to_string(), index);
        self.nodes.push(node);
        Ok(uuid)
    }

    /// Attach a new endpoint to an existing node
    ///
    /// # Errors
    ///
    /// Returns error if the node is unknown or the serial is already in use
    pub(crate) fn add_endpoint(
        &mut self,
        node_uuid: &str,
        hardware_type: &str,
        serial: &str,
        battery: i64,
    ) -> Result<()> {
        if self.endpoints.contains_key(serial) {
            return Err(Error::DuplicateEndpoint(serial.to_string()));
        }
        let node_index = *self
            .by_uuid
            .get(node_uuid)
            .ok_or_else(|| Error::NotFound(format!("node {node_uuid}")))?;
        let node = self
            .nodes
            .get_mut(node_index)
            .ok_or_else(|| Error::NotFound(format!("node {node_uuid}")))?;

        let endpoint = Endpoint::new(hardware_type, serial, battery, &self.defaults);
        let ep_index = node.attach_endpoint(endpoint)?;
        self.endpoints
            .insert(serial.to_string(), (node_index, ep_index));
        Ok(())
    }

    /// Get a node by identity
    #[must_use]
    pub fn node(&self, uuid: &str) -> Option<&Node> {
        self.by_uuid.get(uuid).and_then(|&i| self.nodes.get(i))
    }

    /// Get the node listening on a channel
    #[must_use]
    pub fn node_by_channel(&self, channel: &str) -> Option<&Node> {
        self.by_channel.get(channel).and_then(|&i| self.nodes.get(i))
    }

    /// Get an endpoint by serial
    #[must_use]
    pub fn endpoint(&self, serial: &str) -> Option<&Endpoint> {
        let &(node, ep) = self.endpoints.get(serial)?;
        self.nodes.get(node)?.endpoints().get(ep)
    }

    fn endpoint_mut(&mut self, serial: &str) -> Option<&mut Endpoint> {
        let &(node, ep) = self.endpoints.get(serial)?;
        self.nodes.get_mut(node)?.endpoint_mut(ep)
    }

    /// Node snapshot by identity
    #[must_use]
    pub fn node_record(&self, uuid: &str) -> Option<NodeRecord> {
        self.node(uuid).map(Node::record)
    }

    /// Endpoint snapshot by serial
    #[must_use]
    pub fn endpoint_record(&self, serial: &str) -> Option<EndpointRecord> {
        self.endpoint(serial).map(Endpoint::record)
    }

    /// All node snapshots in the order nodes were added
    #[must_use]
    pub fn list_nodes(&self) -> Vec<NodeRecord> {
        self.nodes.iter().map(Node::record).collect()
    }

    /// Stage an artifact on a channel
    pub fn post_artifact(&mut self, channel: &str, artifact: &str) -> ChannelStatus {
        if !self.by_channel.contains_key(channel) {
            tracing::debug!(channel, "staging artifact on a channel no node listens to");
        }
        self.registry.post(channel, artifact)
    }

    /// Remove a staged artifact if it is still the one on the channel
    pub fn clear_artifact(&mut self, channel: &str, artifact: &str) -> ChannelStatus {
        self.registry.clear(channel, artifact)
    }

    /// Artifact currently staged on a channel
    #[must_use]
    pub fn staged_artifact(&self, channel: &str) -> Option<&StagedArtifact> {
        self.registry.get(channel)
    }

    /// Pull the node's staged artifact and try to apply it
    ///
    /// The staged artifact stays on the channel afterwards
    ///
    /// # Errors
    ///
    /// Returns error if the staged artifact name is malformed
    pub fn trigger_update(&mut self, uuid: &str) -> Result<UpdateOutcome> {
        let Some(node) = self.by_uuid.get(uuid).and_then(|&i| self.nodes.get_mut(i)) else {
            tracing::warn!(uuid, "trigger for unknown node");
            return Ok(UpdateOutcome::Rejected(Rejection::UnknownNode {
                uuid: uuid.to_string(),
            }));
        };

        let Some(staged) = self.registry.get(node.ota_channel()) else {
            tracing::info!(uuid, channel = %node.ota_channel(), "no artifact staged");
            return Ok(UpdateOutcome::Rejected(Rejection::NothingStaged {
                channel: node.ota_channel().to_string(),
            }));
        };

        policy::admit(node, &staged.artifact)
    }

    /// Apply an artifact directly to an endpoint, bypassing channels
    ///
    /// # Errors
    ///
    /// Returns error if the artifact name is malformed
    pub fn update_endpoint(&mut self, serial: &str, artifact: &str) -> Result<UpdateOutcome> {
        let Some(endpoint) = self.endpoint_mut(serial) else {
            tracing::warn!(serial, "update for unknown endpoint");
            return Ok(UpdateOutcome::Rejected(Rejection::UnknownEndpoint {
                serial: serial.to_string(),
            }));
        };
        policy::admit(endpoint, artifact)
    }

    /// Set an endpoint's pending work counter; unknown serials are ignored
    pub fn set_backlog(&mut self, serial: &str, pending: u32) {
        match self.endpoint_mut(serial) {
            Some(endpoint) => endpoint.set_backlog(pending),
            None => tracing::debug!(serial, "set_backlog ignored: unknown endpoint"),
        }
    }

    /// Set an endpoint's battery level; unknown serials are ignored
    pub fn set_battery(&mut self, serial: &str, level: i64) {
        match self.endpoint_mut(serial) {
            Some(endpoint) => endpoint.set_battery(level),
            None => tracing::debug!(serial, "set_battery ignored: unknown endpoint"),
        }
    }
}
