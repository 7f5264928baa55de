//! Update admission policies for nodes and endpoints
//!
//! Every updatable device runs the same validate-then-apply sequence:
//! the artifact name is parsed once, the device's gates are checked in
//! order, and only when all pass is the new version written

use std::fmt;

use serde::Serialize;

use super::artifact::Artifact;
use super::types::{Endpoint, Node};
use crate::Result;

/// Why an update was not applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    /// Artifact was built for different hardware
    HardwareMismatch { expected: String, found: String },
    /// Endpoint has pending work
    Backlog { pending: u32 },
    /// Endpoint battery is below its threshold
    LowBattery { level: i64, threshold: i64 },
    /// No node with this identity
    UnknownNode { uuid: String },
    /// No endpoint with this serial
    UnknownEndpoint { serial: String },
    /// Node channel has no staged artifact
    NothingStaged { channel: String },
}

impl Rejection {
    /// Whether the update may succeed later without a different artifact
    #[must_use]
    pub const fn is_deferred(&self) -> bool {
        matches!(self, Self::Backlog { .. } | Self::LowBattery { .. })
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HardwareMismatch { expected, found } => {
                write!(f, "hardware mismatch: expected {expected}, artifact is for {found}")
            }
            Self::Backlog { pending } => write!(f, "deferred: backlog={pending}"),
            Self::LowBattery { level, threshold } => {
                write!(f, "deferred: battery={level} below {threshold}")
            }
            Self::UnknownNode { uuid } => write!(f, "unknown node {uuid}"),
            Self::UnknownEndpoint { serial } => write!(f, "unknown endpoint {serial}"),
            Self::NothingStaged { channel } => write!(f, "nothing staged on {channel}"),
        }
    }
}

/// Result of an update attempt that reached a decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied { version: String },
    Rejected(Rejection),
}

impl UpdateOutcome {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// Rejection reason, if the update was not applied
    #[must_use]
    pub const fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Applied { .. } => None,
            Self::Rejected(reason) => Some(reason),
        }
    }
}

/// A device that can accept firmware artifacts
pub trait AdmissionPolicy {
    /// Name used in log lines (node identity or endpoint serial)
    fn label(&self) -> &str;

    fn hardware_type(&self) -> &str;

    /// Check every gate in order, stopping at the first failure
    ///
    /// # Errors
    ///
    /// Returns the first failing gate as a [`Rejection`]
    fn check(&self, artifact: &Artifact) -> std::result::Result<(), Rejection>;

    /// Write the artifact's version as the running firmware
    fn apply(&mut self, artifact: &Artifact);

    /// Gate shared by every device: the artifact must target this hardware
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::HardwareMismatch`] when the tag does not match
    fn check_hardware(&self, artifact: &Artifact) -> std::result::Result<(), Rejection> {
        if artifact.targets(self.hardware_type()) {
            Ok(())
        } else {
            Err(Rejection::HardwareMismatch {
                expected: self.hardware_type().to_string(),
                found: artifact.hardware_tag.clone(),
            })
        }
    }
}

impl AdmissionPolicy for Node {
    fn label(&self) -> &str {
        self.uuid()
    }

    fn hardware_type(&self) -> &str {
        Self::hardware_type(self)
    }

    fn check(&self, artifact: &Artifact) -> std::result::Result<(), Rejection> {
        self.check_hardware(artifact)
    }

    fn apply(&mut self, artifact: &Artifact) {
        self.firmware_version.clone_from(&artifact.version);
    }
}

impl AdmissionPolicy for Endpoint {
    fn label(&self) -> &str {
        self.serial()
    }

    fn hardware_type(&self) -> &str {
        Self::hardware_type(self)
    }

    fn check(&self, artifact: &Artifact) -> std::result::Result<(), Rejection> {
        // Busy devices are never flashed, whatever their battery says
        if self.backlog > 0 {
            return Err(Rejection::Backlog {
                pending: self.backlog,
            });
        }
        if self.battery < self.battery_threshold() {
            return Err(Rejection::LowBattery {
                level: self.battery,
                threshold: self.battery_threshold(),
            });
        }
        self.check_hardware(artifact)
    }

    fn apply(&mut self, artifact: &Artifact) {
        self.firmware_version.clone_from(&artifact.version);
    }
}

/// Run the admission sequence for one device
///
/// # Errors
///
/// Returns [`crate::Error::MalformedArtifact`] if the artifact name cannot
/// be parsed; the device is left untouched
pub fn admit<P: AdmissionPolicy + ?Sized>(device: &mut P, artifact: &str) -> Result<UpdateOutcome> {
    let artifact = Artifact::parse(artifact)?;

    if let Err(rejection) = device.check(&artifact) {
        match &rejection {
            Rejection::HardwareMismatch { .. } => {
                tracing::error!(device = %device.label(), %artifact, "{rejection}");
            }
            _ => tracing::info!(device = %device.label(), %artifact, "{rejection}"),
        }
        return Ok(UpdateOutcome::Rejected(rejection));
    }

    device.apply(&artifact);
    tracing::info!(device = %device.label(), version = %artifact.version, "firmware updated");

    Ok(UpdateOutcome::Applied {
        version: artifact.version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::types::DeviceDefaults;
    use crate::Error;

    fn moxa_node() -> Node {
        Node::new("Moxa", "TBCDB1045001", &DeviceDefaults::default())
    }

    fn ep1(battery: i64) -> Endpoint {
        Endpoint::new("EP1", "Moxa_EP1_001", battery, &DeviceDefaults::default())
    }

    #[test]
    fn node_accepts_matching_hardware() {
        let mut node = moxa_node();
        let outcome = admit(&mut node, "moxa_34.swu").unwrap();
        assert_eq!(
            outcome,
            UpdateOutcome::Applied {
                version: "34".to_string()
            }
        );
        assert_eq!(node.firmware_version(), "34");
    }

    #[test]
    fn node_rejects_foreign_hardware() {
        let mut node = Node::new("Cassia", "XYZ789", &DeviceDefaults::default());
        let outcome = admit(&mut node, "moxa_40.swu").unwrap();
        assert!(matches!(
            outcome.rejection(),
            Some(Rejection::HardwareMismatch { .. })
        ));
        assert_eq!(node.firmware_version(), "33");
    }

    #[test]
    fn node_tag_match_ignores_case() {
        let mut node = moxa_node();
        assert!(admit(&mut node, "MOXA_35.swu").unwrap().is_applied());
    }

    #[test]
    fn endpoint_backlog_defers_update() {
        let mut ep = ep1(3000);
        ep.set_backlog(50);
        let outcome = admit(&mut ep, "ep1_15.swu").unwrap();
        assert_eq!(outcome.rejection(), Some(&Rejection::Backlog { pending: 50 }));
        assert_eq!(ep.firmware_version(), "10");

        ep.set_backlog(0);
        assert!(admit(&mut ep, "ep1_15.swu").unwrap().is_applied());
        assert_eq!(ep.firmware_version(), "15");
    }

    #[test]
    fn backlog_takes_precedence_over_battery() {
        let mut ep = ep1(100);
        ep.set_backlog(1);
        let outcome = admit(&mut ep, "ep1_15.swu").unwrap();
        assert!(matches!(outcome.rejection(), Some(Rejection::Backlog { .. })));
    }

    #[test]
    fn battery_is_checked_before_hardware() {
        let mut ep = ep1(2000);
        let outcome = admit(&mut ep, "moxa_15.swu").unwrap();
        assert_eq!(
            outcome.rejection(),
            Some(&Rejection::LowBattery {
                level: 2000,
                threshold: 2500
            })
        );
    }

    #[test]
    fn battery_at_threshold_is_enough() {
        let mut ep = ep1(2500);
        assert!(admit(&mut ep, "ep1_11.swu").unwrap().is_applied());
    }

    #[test]
    fn endpoint_rejects_foreign_hardware_in_every_state() {
        for (battery, backlog) in [(5000, 0), (5000, 3), (0, 0), (0, 7)] {
            let mut ep = ep1(battery);
            ep.set_backlog(backlog);
            let outcome = admit(&mut ep, "ep2_99.swu").unwrap();
            assert!(!outcome.is_applied());
            assert_eq!(ep.firmware_version(), "10");
        }
    }

    #[test]
    fn malformed_artifact_is_an_error() {
        let mut ep = ep1(3000);
        let err = admit(&mut ep, "ep1-15.swu").unwrap_err();
        assert!(matches!(err, Error::MalformedArtifact { .. }));
        assert_eq!(ep.firmware_version(), "10");
    }

    #[test]
    fn deferred_reasons() {
        assert!(Rejection::Backlog { pending: 1 }.is_deferred());
        assert!(
            Rejection::LowBattery {
                level: 1,
                threshold: 2
            }
            .is_deferred()
        );
        assert!(
            !Rejection::HardwareMismatch {
                expected: "a".into(),
                found: "b".into()
            }
            .is_deferred()
        );
    }
}
