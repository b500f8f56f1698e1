//! Configuration for acquisition unit protection.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

/// Environment variables with this prefix override file values
/// (e.g. `ACQ_UNITS_PROTECTION_MANAGE_PERMISSION=custom.manage`).
pub const ENV_PREFIX: &str = "ACQ_UNITS_PROTECTION_";

/// Permission that allows changing a record's unit assignment.
pub const MANAGE_ASSIGNMENTS_PERMISSION: &str =
    "organizations.acquisitions-units-assignments.manage";

/// Configuration.
///
/// Page sizes are not configurable: complete-set lookups always request
/// `UNBOUNDED_LIMIT`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ProtectionConfig {
    /// Permission required to change the set of units a record is assigned to.
    pub manage_permission: String,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            manage_permission: MANAGE_ASSIGNMENTS_PERMISSION.to_owned(),
        }
    }
}

impl ProtectionConfig {
    /// Load configuration: defaults, then the YAML file at `path` (skipped if
    /// absent), then `ACQ_UNITS_PROTECTION_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns the figment error if a source cannot be parsed or contains
    /// unknown keys.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        Self::figment(path.as_ref()).extract()
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
    }
}
