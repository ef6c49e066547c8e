use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::analyzers::types::{
    BUILDING_CAPACITY_DEFAULT, Granularity, ZONE_CAPACITY_DEFAULT,
};

/// Engine settings, read from a JSON file:
///
/// ```json
/// {
///   "zone_capacity_default": 50,
///   "building_capacity_default": 200,
///   "ground_floor_id": "1F",
///   "hide_unrecognized_zones": false
/// }
/// ```
///
/// Every field is optional and falls back to [`RollupConfig::default`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RollupConfig {
    /// Capacity assumed for a zone or floor that never reported one.
    pub zone_capacity_default: f64,
    /// Capacity assumed for the entrance counter and the building.
    pub building_capacity_default: f64,
    /// Floor with no sensor of its own, derived from the entrance counter.
    pub ground_floor_id: String,
    /// Leave unrecognized zone names out of zone views. Building and floor
    /// totals keep them either way.
    pub hide_unrecognized_zones: bool,
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self {
            zone_capacity_default: ZONE_CAPACITY_DEFAULT,
            building_capacity_default: BUILDING_CAPACITY_DEFAULT,
            ground_floor_id: "1F".to_string(),
            hide_unrecognized_zones: false,
        }
    }
}

impl RollupConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid config '{}'", path.display()))
    }

    /// Loads `path` if given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Capacity fallback for a reconciliation scope.
    pub fn capacity_default(&self, granularity: Granularity) -> f64 {
        match granularity {
            Granularity::Building => self.building_capacity_default,
            Granularity::Floor | Granularity::Zone => self.zone_capacity_default,
        }
    }
}
