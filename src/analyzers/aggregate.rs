use crate::analyzers::types::OccupancyAggregate;
use crate::analyzers::utility::average;
use crate::analyzers::zone::{is_excluded, normalize, CanonicalZone};
use crate::readings::Reading;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Which key readings are folded under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Floor,
    Zone,
}

/// Restricts which readings reach an aggregate. Excluded zones are always dropped.
#[derive(Debug, Clone, Default)]
pub struct AggregateFilter {
    /// Only fold readings from this floor.
    pub floor: Option<String>,
    /// Drop zones the normalizer did not recognize. Floor and zone views may
    /// hide them; building totals should keep them.
    pub hide_unrecognized: bool,
    /// Drop the main entrance counter.
    pub skip_entrance: bool,
}

impl AggregateFilter {
    pub fn for_floor(floor: &str) -> Self {
        Self {
            floor: Some(floor.to_string()),
            ..Default::default()
        }
    }

    fn admits(&self, reading: &Reading, zone: &CanonicalZone) -> bool {
        if let Some(floor) = &self.floor {
            if reading.floor_id != *floor {
                return false;
            }
        }
        if self.hide_unrecognized && !zone.is_recognized() {
            return false;
        }
        !(self.skip_entrance && zone.is_entrance())
    }
}

impl OccupancyAggregate {
    /// Folds one reading into the running totals.
    ///
    /// Occupancy and percentage are summed as reported, negatives included.
    /// The first reading carrying a capacity sets it; later ones are ignored.
    pub fn fold(&mut self, reading: &Reading) {
        self.total_occupancy += reading.total_occupancy;
        self.peak_occupancy = self.peak_occupancy.max(reading.total_occupancy);
        self.total_percentage += reading.occupancy_percentage;
        self.sample_count += 1;
        self.avg_occupancy_percentage = average(self.total_percentage, self.sample_count);
        if self.max_capacity.is_none() {
            self.max_capacity = reading.max_capacity;
        }
    }
}

/// Readings that survive the exclusion filter, paired with their canonical zone.
pub fn canonical_readings<'a>(
    readings: &'a [Reading],
) -> impl Iterator<Item = (&'a Reading, CanonicalZone)> + 'a {
    readings.iter().filter_map(|reading| {
        if is_excluded(&reading.zone_name) {
            debug!(
                floor_id = %reading.floor_id,
                zone_name = %reading.zone_name,
                "Skipping excluded zone reading"
            );
            return None;
        }
        Some((reading, normalize(&reading.zone_name)))
    })
}

/// Logs each negative, non-excluded reading once and returns how many there were.
///
/// Negative values are folded as reported; call this once per fetched batch.
pub fn warn_sensor_drift(readings: &[Reading]) -> usize {
    let mut drifting = 0;
    for (reading, _) in canonical_readings(readings) {
        if reading.total_occupancy < 0.0 || reading.occupancy_percentage < 0.0 {
            warn!(
                floor_id = %reading.floor_id,
                zone_name = %reading.zone_name,
                timestamp = %reading.timestamp,
                total_occupancy = reading.total_occupancy,
                occupancy_percentage = reading.occupancy_percentage,
                "Negative occupancy reading, possible sensor drift"
            );
            drifting += 1;
        }
    }
    drifting
}

/// Folds readings into one aggregate per floor or per canonical zone.
///
/// The result does not depend on reading order, apart from which capacity
/// wins when readings of one key disagree on it.
pub fn aggregate(
    readings: &[Reading],
    group_by: GroupBy,
    filter: &AggregateFilter,
) -> BTreeMap<String, OccupancyAggregate> {
    let mut groups: BTreeMap<String, OccupancyAggregate> = BTreeMap::new();

    for (reading, zone) in canonical_readings(readings) {
        if !filter.admits(reading, &zone) {
            continue;
        }

        let key = match group_by {
            GroupBy::Floor => reading.floor_id.as_str(),
            GroupBy::Zone => zone.label(),
        };

        groups
            .entry(key.to_string())
            .or_insert_with(|| OccupancyAggregate::empty(key))
            .fold(reading);
    }

    debug!(groups = groups.len(), ?group_by, "Aggregated readings");
    groups
}

/// Folds every admitted reading into a single aggregate named `key`.
///
/// With no admitted readings the aggregate is all zeros.
pub fn aggregate_all(readings: &[Reading], key: &str, filter: &AggregateFilter) -> OccupancyAggregate {
    let mut total = OccupancyAggregate::empty(key);
    for (reading, zone) in canonical_readings(readings) {
        if filter.admits(reading, &zone) {
            total.fold(reading);
        }
    }
    total
}

/// Per-floor view over all recognized and unrecognized zones.
pub fn aggregate_floors(readings: &[Reading]) -> BTreeMap<String, OccupancyAggregate> {
    aggregate(readings, GroupBy::Floor, &AggregateFilter::default())
}

/// Per-zone view of a single floor.
pub fn aggregate_zones(readings: &[Reading], floor: &str) -> BTreeMap<String, OccupancyAggregate> {
    aggregate(readings, GroupBy::Zone, &AggregateFilter::for_floor(floor))
}
