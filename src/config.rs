//! Explicit configuration for exports, validation and royalty splits.
//!
//! Everything that the registration pipeline used to read from ambient
//! settings is carried in one [`Config`] value passed into the functions
//! that need it: the publisher profile, per-society overrides, the
//! publisher's retained shares per right type, and enforcement flags.
//! There is no process-wide mutable state.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::royalty::RightType;

// =============================================================================
// Publisher profile
// =============================================================================

/// The registering publisher as it appears in SPU/PWR records and headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherProfile {
    /// Short alphanumeric code prefixed to submitter work ids.
    pub code: String,
    pub name: String,
    /// 11-digit IPI name number.
    pub ipi_name: String,
    /// IPI base number, `I-NNNNNNNNN-C`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ipi_base: Option<String>,
    /// Performing-rights affiliation, zero-padded society code.
    pub pr_society: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mr_society: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sr_society: Option<String>,
}

impl Default for PublisherProfile {
    fn default() -> Self {
        Self {
            code: "MUS".into(),
            name: "MUSIC PUBLISHER".into(),
            // Valid sentinel-adjacent test IPI; replace in real deployments.
            ipi_name: "00000000199".into(),
            ipi_base: None,
            pr_society: "052".into(),
            mr_society: Some("044".into()),
            sr_society: None,
        }
    }
}

// =============================================================================
// Retained shares
// =============================================================================

/// Fraction of each right type the publisher keeps from controlled
/// writers, the rest being ceded to the writer. Values are in `[0, 1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetainedShares {
    pub pr: f64,
    pub mr: f64,
    pub sr: f64,
}

impl Default for RetainedShares {
    fn default() -> Self {
        // The customary split: half of performance, all of mechanical
        // and synchronization collected by the publisher.
        Self {
            pr: 0.5,
            mr: 1.0,
            sr: 1.0,
        }
    }
}

impl RetainedShares {
    pub fn for_right(&self, right: RightType) -> f64 {
        match right {
            RightType::Performance => self.pr,
            RightType::Mechanical => self.mr,
            RightType::Synchronization => self.sr,
        }
    }
}

// =============================================================================
// Enforcement flags
// =============================================================================

/// Validation strictness knobs, passed into validation functions
/// explicitly instead of living in ambient settings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EnforcementPolicy {
    /// Require a society-assigned agreement number on every controlled row
    /// (or the writer's blanket agreement).
    #[serde(default)]
    pub require_saan: bool,
    /// Require a publisher fee on every controlled row (or the writer's
    /// blanket agreement).
    #[serde(default)]
    pub require_publisher_fee: bool,
    /// Generally-controlled writers must carry a society affiliation and
    /// IPI name number in addition to a last name.
    #[serde(default)]
    pub strict_writer_identification: bool,
}

// =============================================================================
// Config
// =============================================================================

/// Top-level configuration consumed by the export serializer, the
/// aggregate validator and the royalty engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub publisher: PublisherProfile,
    /// Per-society override profiles; absence means the default profile.
    #[serde(default)]
    pub society_overrides: HashMap<String, PublisherProfile>,
    #[serde(default)]
    pub retained: RetainedShares,
    #[serde(default)]
    pub enforcement: EnforcementPolicy,
}

impl Config {
    /// The publisher profile to use when registering with a society.
    pub fn publisher_for_society(&self, society_code: &str) -> &PublisherProfile {
        let normalized = format!("{:0>3}", society_code.trim());
        self.society_overrides
            .get(&normalized)
            .unwrap_or(&self.publisher)
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, crate::error::StoreError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retained_shares() {
        let retained = RetainedShares::default();
        assert_eq!(retained.for_right(RightType::Performance), 0.5);
        assert_eq!(retained.for_right(RightType::Mechanical), 1.0);
        assert_eq!(retained.for_right(RightType::Synchronization), 1.0);
    }

    #[test]
    fn test_society_override_lookup() {
        let mut config = Config::default();
        let override_profile = PublisherProfile {
            code: "USP".into(),
            name: "US PUBLISHING".into(),
            ..PublisherProfile::default()
        };
        config
            .society_overrides
            .insert("010".into(), override_profile);

        assert_eq!(config.publisher_for_society("010").code, "USP");
        assert_eq!(config.publisher_for_society("10").code, "USP");
        assert_eq!(config.publisher_for_society("052").code, "MUS");
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.publisher.code, config.publisher.code);
    }
}
