use crate::analyzers::aggregate::canonical_readings;
use crate::analyzers::types::{PeakObservation, ReconciledPeak};
use crate::readings::Reading;
use std::collections::{BTreeMap, BTreeSet};

impl PeakObservation {
    /// The highest occupancy a historical series reached at any one timestamp.
    ///
    /// Readings sharing a timestamp are summed, so a floor series yields the
    /// floor's busiest instant rather than its busiest zone. Tracking starts at
    /// zero and only a strictly higher instant replaces the current peak, so
    /// the earliest of equal peaks keeps its hour. `source_zone` is set when
    /// the series covers one canonical zone only.
    pub fn from_series(readings: &[Reading]) -> Self {
        let mut instants: BTreeMap<&str, (f64, Option<u32>)> = BTreeMap::new();
        let mut zones = BTreeSet::new();
        let mut max_capacity = None;

        for (reading, zone) in canonical_readings(readings) {
            let instant = instants
                .entry(reading.timestamp.as_str())
                .or_insert_with(|| (0.0, reading.hour_utc()));
            instant.0 += reading.total_occupancy;
            zones.insert(zone);
            if max_capacity.is_none() {
                max_capacity = reading.max_capacity;
            }
        }

        let mut value = 0.0;
        let mut source_hour_utc = None;
        for (total, hour) in instants.into_values() {
            if total > value {
                value = total;
                source_hour_utc = hour;
            }
        }

        let source_zone = if zones.len() == 1 {
            zones.into_iter().next().map(|z| z.label().to_string())
        } else {
            None
        };

        Self {
            value,
            source_hour_utc,
            source_zone,
            max_capacity,
        }
    }
}

/// Merges a historical peak with a live value into the "current peak".
///
/// The live value wins only when strictly greater; a tie keeps the historical
/// observation and its hour label.
pub fn reconcile(historical: &PeakObservation, live_peak: f64) -> ReconciledPeak {
    reconcile_observations(historical, &PeakObservation::live(live_peak, None))
}

/// Like [`reconcile`], with the live side able to supply a capacity.
///
/// Capacity comes from whichever side has one, the historical side first.
pub fn reconcile_observations(historical: &PeakObservation, live: &PeakObservation) -> ReconciledPeak {
    let is_live = live.value > historical.value;

    ReconciledPeak {
        value: historical.value.max(live.value),
        is_live,
        hour_utc: if is_live {
            None
        } else {
            historical.source_hour_utc
        },
        max_capacity: historical.max_capacity.or(live.max_capacity),
    }
}
