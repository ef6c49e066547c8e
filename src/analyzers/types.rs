//! Data types produced by the aggregation pipeline.

use serde::Serialize;
use std::collections::BTreeMap;

/// Fallback capacity for a single zone or floor with no reported capacity.
pub const ZONE_CAPACITY_DEFAULT: f64 = 50.0;

/// Fallback capacity for the entrance counter or the whole building.
pub const BUILDING_CAPACITY_DEFAULT: f64 = 200.0;

/// Rolled-up occupancy for one floor or one zone.
///
/// `peak_occupancy` starts at zero and only rises, so a group whose readings
/// are all negative reports a peak of 0 while `total_occupancy` stays negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyAggregate {
    pub key: String,
    pub total_occupancy: f64,
    pub peak_occupancy: f64,
    pub total_percentage: f64,
    pub sample_count: usize,
    pub avg_occupancy_percentage: f64,
    pub max_capacity: Option<f64>,
}

pub type FloorAggregate = OccupancyAggregate;
pub type ZoneAggregate = OccupancyAggregate;

impl OccupancyAggregate {
    /// An aggregate with no samples: every figure is zero.
    pub fn empty(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            total_occupancy: 0.0,
            peak_occupancy: 0.0,
            total_percentage: 0.0,
            sample_count: 0,
            avg_occupancy_percentage: 0.0,
            max_capacity: None,
        }
    }

    /// Recorded capacity, or `default` when no reading carried one.
    pub fn capacity_or(&self, default: f64) -> f64 {
        self.max_capacity.unwrap_or(default)
    }
}

/// Whole-building roll-up composed from per-floor aggregates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingAggregate {
    pub total_occupancy: f64,
    pub peak_occupancy: f64,
    pub total_percentage: f64,
    pub sample_count: usize,
    pub avg_occupancy_percentage: f64,
    pub total_max_capacity: f64,
    pub floor_breakdown: BTreeMap<String, FloorAggregate>,
}

/// The scope a peak reconciliation runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Building,
    Floor,
    Zone,
}

/// A peak seen in one source: the hourly series or the live snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakObservation {
    pub value: f64,
    #[serde(rename = "sourceHourUTC")]
    pub source_hour_utc: Option<u32>,
    pub source_zone: Option<String>,
    pub max_capacity: Option<f64>,
}

impl PeakObservation {
    /// A live snapshot value; live readings carry no hour label.
    pub fn live(value: f64, max_capacity: Option<f64>) -> Self {
        Self {
            value,
            source_hour_utc: None,
            source_zone: None,
            max_capacity,
        }
    }
}

/// The "current peak" after merging a historical and a live observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledPeak {
    pub value: f64,
    pub is_live: bool,
    #[serde(rename = "hourUTC")]
    pub hour_utc: Option<u32>,
    pub max_capacity: Option<f64>,
}

impl ReconciledPeak {
    /// Peak as a percentage of its capacity, or of `default_capacity` if none was seen.
    pub fn percentage(&self, default_capacity: f64) -> f64 {
        let capacity = self.max_capacity.unwrap_or(default_capacity);
        if capacity <= 0.0 {
            0.0
        } else {
            self.value * 100.0 / capacity
        }
    }
}

/// One chronological point of a trend chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub timestamp: String,
    pub average_occupancy_percentage: f64,
    pub peak_occupancy: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_serializes_key_and_missing_capacity() {
        let json = serde_json::to_value(OccupancyAggregate::empty("ZoneA")).unwrap();

        assert_eq!(json["key"], "ZoneA");
        assert!(json["maxCapacity"].is_null());
        assert_eq!(json["avgOccupancyPercentage"], 0.0);
    }
}
