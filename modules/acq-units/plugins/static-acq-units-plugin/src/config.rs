//! Configuration for the static acquisition units plugin.

use std::path::Path;

use acq_units_sdk::{AcquisitionUnit, AcquisitionUnitMembership};
use figment::Figment;
use figment::providers::{Format, Json, Yaml};
use serde::Deserialize;

/// Plugin configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticAcqUnitsPluginConfig {
    /// Units served by the plugin, in storage order.
    pub units: Vec<AcquisitionUnit>,

    /// Memberships served by the plugin.
    pub memberships: Vec<AcquisitionUnitMembership>,
}

impl StaticAcqUnitsPluginConfig {
    /// Read seed data from a YAML or JSON file, chosen by extension.
    ///
    /// # Errors
    ///
    /// Returns the figment error if the file is missing, malformed or has
    /// unknown keys.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        let path = path.as_ref();
        let figment = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Figment::from(Json::file_exact(path)),
            _ => Figment::from(Yaml::file_exact(path)),
        };
        figment.extract()
    }
}
