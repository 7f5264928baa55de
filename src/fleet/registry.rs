//! OTA channel registry for staging artifacts

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Status returned by channel operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    Ok,
    Rejected,
}

impl ChannelStatus {
    /// HTTP-style status code for this result
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::Rejected => 400,
        }
    }

    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// An artifact waiting on a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedArtifact {
    pub artifact: String,
    pub posted_at: DateTime<Utc>,
}

/// Registry of staged artifacts keyed by channel
///
/// Each channel holds at most one artifact; posting replaces it
#[derive(Debug, Default)]
pub struct OtaRegistry {
    channels: HashMap<String, StagedArtifact>,
}

impl OtaRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an artifact, replacing whatever the channel held
    pub fn post(&mut self, channel: &str, artifact: &str) -> ChannelStatus {
        let staged = StagedArtifact {
            artifact: artifact.to_string(),
            posted_at: Utc::now(),
        };
        if let Some(previous) = self.channels.insert(channel.to_string(), staged) {
            tracing::debug!(
                channel,
                replaced = %previous.artifact,
                artifact,
                "replaced staged artifact"
            );
        } else {
            tracing::debug!(channel, artifact, "staged artifact");
        }
        ChannelStatus::Ok
    }

    /// Remove the channel's artifact if it is exactly `artifact`
    ///
    /// A clear for an artifact that has since been superseded is rejected
    pub fn clear(&mut self, channel: &str, artifact: &str) -> ChannelStatus {
        match self.channels.get(channel) {
            Some(staged) if staged.artifact == artifact => {
                self.channels.remove(channel);
                tracing::debug!(channel, artifact, "cleared staged artifact");
                ChannelStatus::Ok
            }
            Some(staged) => {
                tracing::debug!(
                    channel,
                    artifact,
                    staged = %staged.artifact,
                    "clear rejected: artifact not staged"
                );
                ChannelStatus::Rejected
            }
            None => {
                tracing::debug!(channel, artifact, "clear rejected: channel empty");
                ChannelStatus::Rejected
            }
        }
    }

    /// Get the staged artifact for a channel
    #[must_use]
    pub fn get(&self, channel: &str) -> Option<&StagedArtifact> {
        self.channels.get(channel)
    }

    /// Number of channels with a staged artifact
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether no channel has a staged artifact
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_and_get() {
        let mut registry = OtaRegistry::new();
        assert_eq!(registry.post("OTA_a", "moxa_34.swu"), ChannelStatus::Ok);

        let staged = registry.get("OTA_a").unwrap();
        assert_eq!(staged.artifact, "moxa_34.swu");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn post_overwrites() {
        let mut registry = OtaRegistry::new();
        registry.post("OTA_a", "moxa_34.swu");
        registry.post("OTA_a", "moxa_35.swu");

        assert_eq!(registry.get("OTA_a").unwrap().artifact, "moxa_35.swu");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn clear_superseded_artifact_fails() {
        let mut registry = OtaRegistry::new();
        registry.post("OTA_a", "moxa_34.swu");
        registry.post("OTA_a", "moxa_35.swu");

        assert_eq!(registry.clear("OTA_a", "moxa_34.swu"), ChannelStatus::Rejected);
        assert!(registry.get("OTA_a").is_some());

        assert_eq!(registry.clear("OTA_a", "moxa_35.swu"), ChannelStatus::Ok);
        assert!(registry.is_empty());
    }

    #[test]
    fn clear_empty_channel_fails() {
        let mut registry = OtaRegistry::new();
        assert_eq!(registry.clear("OTA_a", "moxa_34.swu"), ChannelStatus::Rejected);
    }

    #[test]
    fn channels_are_independent() {
        let mut registry = OtaRegistry::new();
        registry.post("OTA_a", "moxa_34.swu");
        registry.post("OTA_b", "cassia_2.swu");

        assert_eq!(registry.clear("OTA_a", "moxa_34.swu"), ChannelStatus::Ok);
        assert_eq!(registry.get("OTA_b").unwrap().artifact, "cassia_2.swu");
    }

    #[test]
    fn status_codes() {
        assert_eq!(ChannelStatus::Ok.code(), 200);
        assert_eq!(ChannelStatus::Rejected.code(), 400);
        assert!(!ChannelStatus::Rejected.is_ok());
    }
}
