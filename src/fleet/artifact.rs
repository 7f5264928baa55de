//! Firmware artifact names
//!
//! Artifacts are referenced by name only, in the form
//! `<hardware tag>_<version>.swu` (e.g. `moxa_34.swu`)

use std::fmt;

use serde::Serialize;

use crate::{Error, Result};

/// File suffix every artifact name carries
pub const ARTIFACT_SUFFIX: &str = ".swu";

/// A parsed artifact name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub hardware_tag: String,
    pub version: String,
}

impl Artifact {
    /// Parse an artifact name
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedArtifact`] if the suffix is missing, there is
    /// no tag separator, or either the tag or the version is empty
    pub fn parse(name: &str) -> Result<Self> {
        let malformed = |reason| Error::MalformedArtifact {
            artifact: name.to_string(),
            reason,
        };

        let stem = name
            .strip_suffix(ARTIFACT_SUFFIX)
            .ok_or_else(|| malformed("missing .swu suffix"))?;
        let (tag, version) = stem
            .split_once('_')
            .ok_or_else(|| malformed("missing '_' between hardware tag and version"))?;

        if tag.is_empty() {
            return Err(malformed("empty hardware tag"));
        }
        if version.is_empty() {
            return Err(malformed("empty version"));
        }
        if version.contains('_') {
            return Err(malformed("version contains '_'"));
        }

        Ok(Self {
            hardware_tag: tag.to_string(),
            version: version.to_string(),
        })
    }

    /// Whether this artifact was built for the given hardware type
    ///
    /// Comparison ignores ASCII case, so `moxa_34.swu` targets `Moxa`
    #[must_use]
    pub fn targets(&self, hardware_type: &str) -> bool {
        self.hardware_tag.eq_ignore_ascii_case(hardware_type)
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}{ARTIFACT_SUFFIX}", self.hardware_tag, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tag_and_version() {
        let artifact = Artifact::parse("moxa_34.swu").unwrap();
        assert_eq!(artifact.hardware_tag, "moxa");
        assert_eq!(artifact.version, "34");
    }

    #[test]
    fn keeps_dotted_versions() {
        let artifact = Artifact::parse("ep1_1.2.3.swu").unwrap();
        assert_eq!(artifact.version, "1.2.3");
    }

    #[test]
    fn rejects_missing_suffix() {
        let err = Artifact::parse("moxa_34.bin").unwrap_err();
        assert!(matches!(err, Error::MalformedArtifact { .. }));
    }

    #[test]
    fn rejects_missing_separator() {
        assert!(Artifact::parse("moxa34.swu").is_err());
    }

    #[test]
    fn rejects_empty_parts() {
        assert!(Artifact::parse("_34.swu").is_err());
        assert!(Artifact::parse("moxa_.swu").is_err());
        assert!(Artifact::parse(".swu").is_err());
    }

    #[test]
    fn rejects_extra_separator() {
        assert!(Artifact::parse("moxa_34_beta.swu").is_err());
    }

    #[test]
    fn tag_match_ignores_case() {
        let artifact = Artifact::parse("MOXA_40.swu").unwrap();
        assert!(artifact.targets("Moxa"));
        assert!(artifact.targets("moxa"));
        assert!(!artifact.targets("Cassia"));
    }

    #[test]
    fn tag_match_is_exact_not_prefix() {
        let artifact = Artifact::parse("ep_2.swu").unwrap();
        assert!(!artifact.targets("EP2"));
    }

    #[test]
    fn display_restores_name() {
        let artifact = Artifact::parse("cassia_7.swu").unwrap();
        assert_eq!(artifact.to_string(), "cassia_7.swu");
    }
}
