//! Floor, zone and building views composed over one batch of readings.
//!
//! [`OccupancyReport`] is the same projection for a live snapshot and for a
//! historical window; [`PeakReport`] pairs the two and reconciles a current
//! peak for every scope independently.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::analyzers::aggregate::{aggregate, aggregate_all, AggregateFilter, GroupBy};
use crate::analyzers::building::aggregate_building;
use crate::analyzers::derived::derive_ground_floor;
use crate::analyzers::peak::reconcile_observations;
use crate::analyzers::trend::group_by_timestamp;
use crate::analyzers::utility::available_capacity;
use crate::analyzers::types::{
    BuildingAggregate, Granularity, OccupancyAggregate, PeakObservation, ReconciledPeak,
    TrendPoint, ZoneAggregate,
};
use crate::analyzers::zone::normalize;
use crate::config::RollupConfig;
use crate::readings::Reading;

/// Occupancy at building, floor and zone level for one batch of readings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyReport {
    pub building: BuildingAggregate,
    /// Entrance counter totals, when the batch carried any.
    pub entrance: Option<OccupancyAggregate>,
    /// Zone aggregates keyed by floor, then canonical zone.
    pub zones: BTreeMap<String, BTreeMap<String, ZoneAggregate>>,
    pub trend: Vec<TrendPoint>,
}

impl OccupancyReport {
    /// Builds every view from one batch.
    ///
    /// Entrance readings are set apart from the sensored floors. When the batch
    /// has any, the ground floor is replaced by the entrance count minus every
    /// other floor, so the building total is never double counted.
    pub fn build(readings: &[Reading], config: &RollupConfig) -> Self {
        let (entrance_readings, sensored): (Vec<Reading>, Vec<Reading>) = readings
            .iter()
            .cloned()
            .partition(|r| normalize(&r.zone_name).is_entrance());

        let mut floors = aggregate(&sensored, GroupBy::Floor, &AggregateFilter::default());

        let entrance = if entrance_readings.is_empty() {
            None
        } else {
            let entrance = aggregate_all(
                &entrance_readings,
                "MainEntrance",
                &AggregateFilter::default(),
            );
            let others: Vec<&OccupancyAggregate> = floors
                .values()
                .filter(|f| f.key != config.ground_floor_id)
                .collect();
            let mut ground = derive_ground_floor(
                &config.ground_floor_id,
                &entrance,
                &others,
                config.building_capacity_default,
            );
            ground.peak_occupancy = derived_peak(&entrance_readings, &sensored, config);
            floors.insert(config.ground_floor_id.clone(), ground);
            Some(entrance)
        };

        let zone_filter = |floor: &str| AggregateFilter {
            floor: Some(floor.to_string()),
            hide_unrecognized: config.hide_unrecognized_zones,
            skip_entrance: true,
        };
        let zones: BTreeMap<String, BTreeMap<String, ZoneAggregate>> = floors
            .keys()
            .map(|floor| {
                (
                    floor.clone(),
                    aggregate(&sensored, GroupBy::Zone, &zone_filter(floor)),
                )
            })
            .filter(|(_, zones)| !zones.is_empty())
            .collect();

        let trend = group_by_timestamp(&sensored);
        let building = aggregate_building(floors, config.building_capacity_default);

        debug!(
            readings = readings.len(),
            floors = building.floor_breakdown.len(),
            has_entrance = entrance.is_some(),
            "Built occupancy report"
        );

        Self {
            building,
            entrance,
            zones,
            trend,
        }
    }
}

/// Highest derived ground-floor occupancy at any single timestamp.
///
/// Over a window the entrance minus the other floors is a sum across every
/// instant, so the peak is derived again per timestamp. Timestamps with no
/// entrance reading have no derived floor and are skipped.
fn derived_peak(entrance: &[Reading], sensored: &[Reading], config: &RollupConfig) -> f64 {
    let mut instants: BTreeMap<&str, (Vec<Reading>, Vec<Reading>)> = BTreeMap::new();
    for reading in entrance {
        instants
            .entry(reading.timestamp.as_str())
            .or_default()
            .0
            .push(reading.clone());
    }
    for reading in sensored {
        if let Some((_, others)) = instants.get_mut(reading.timestamp.as_str()) {
            others.push(reading.clone());
        }
    }

    instants
        .values()
        .map(|(entrance_readings, others_readings)| {
            let entrance =
                aggregate_all(entrance_readings, "MainEntrance", &AggregateFilter::default());
            let floors = aggregate(others_readings, GroupBy::Floor, &AggregateFilter::default());
            let others: Vec<&OccupancyAggregate> = floors
                .values()
                .filter(|f| f.key != config.ground_floor_id)
                .collect();
            derive_ground_floor(
                &config.ground_floor_id,
                &entrance,
                &others,
                config.building_capacity_default,
            )
            .total_occupancy
        })
        .fold(0.0, f64::max)
}

/// A reconciled peak for one scope, with the live figures a card shows next to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopedPeak {
    pub granularity: Granularity,
    pub historical: PeakObservation,
    pub current: ReconciledPeak,
    pub peak_percentage: f64,
    pub live_occupancy: f64,
    pub available_capacity: f64,
}

impl ScopedPeak {
    fn new(
        granularity: Granularity,
        historical: PeakObservation,
        live: PeakObservation,
        config: &RollupConfig,
    ) -> Self {
        let current = reconcile_observations(&historical, &live);
        let default_capacity = config.capacity_default(granularity);
        let capacity = current.max_capacity.unwrap_or(default_capacity);
        Self {
            granularity,
            peak_percentage: current.percentage(default_capacity),
            live_occupancy: live.value,
            available_capacity: available_capacity(capacity, live.value),
            historical,
            current,
        }
    }
}

/// Current peaks for the building, each floor and each zone.
///
/// Every scope is reconciled from its own historical and live pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakReport {
    pub building: ScopedPeak,
    pub floors: BTreeMap<String, ScopedPeak>,
    pub zones: BTreeMap<String, BTreeMap<String, ScopedPeak>>,
}

/// Running historical peak for one scope.
#[derive(Default)]
struct PeakTracker {
    value: f64,
    hour: Option<u32>,
    max_capacity: Option<f64>,
}

impl PeakTracker {
    fn observe(&mut self, value: f64, hour: Option<u32>, max_capacity: Option<f64>) {
        if value > self.value {
            self.value = value;
            self.hour = hour;
        }
        if self.max_capacity.is_none() {
            self.max_capacity = max_capacity;
        }
    }

    fn into_observation(self, source_zone: Option<String>) -> PeakObservation {
        PeakObservation {
            value: self.value,
            source_hour_utc: self.hour,
            source_zone,
            max_capacity: self.max_capacity,
        }
    }
}

impl PeakReport {
    /// Reconciles a historical window against a live snapshot.
    ///
    /// The historical side is replayed one timestamp at a time through
    /// [`OccupancyReport::build`], so the derived ground floor and the building
    /// total are computed the same way for each past instant as for the live
    /// snapshot. Zone peaks come straight from each zone's series.
    pub fn build(historical: &[Reading], live: &[Reading], config: &RollupConfig) -> Self {
        let live_report = OccupancyReport::build(live, config);

        let mut instants: BTreeMap<&str, Vec<Reading>> = BTreeMap::new();
        for reading in historical {
            instants
                .entry(reading.timestamp.as_str())
                .or_default()
                .push(reading.clone());
        }

        let mut building_peak = PeakTracker::default();
        let mut floor_peaks: BTreeMap<String, PeakTracker> = BTreeMap::new();
        for batch in instants.values() {
            let hour = batch.first().and_then(Reading::hour_utc);
            let instant = OccupancyReport::build(batch, config);
            building_peak.observe(
                instant.building.total_occupancy,
                hour,
                Some(instant.building.total_max_capacity),
            );
            for (floor_id, floor) in &instant.building.floor_breakdown {
                floor_peaks.entry(floor_id.clone()).or_default().observe(
                    floor.total_occupancy,
                    hour,
                    floor.max_capacity,
                );
            }
        }

        let live_building = PeakObservation::live(
            live_report.building.total_occupancy,
            Some(live_report.building.total_max_capacity),
        );
        let building = ScopedPeak::new(
            Granularity::Building,
            building_peak.into_observation(None),
            live_building,
            config,
        );

        let mut floor_ids: Vec<String> = floor_peaks.keys().cloned().collect();
        floor_ids.extend(live_report.building.floor_breakdown.keys().cloned());
        floor_ids.sort();
        floor_ids.dedup();

        let floors = floor_ids
            .into_iter()
            .map(|floor_id| {
                let historical = floor_peaks
                    .remove(&floor_id)
                    .unwrap_or_default()
                    .into_observation(None);
                let live = live_report
                    .building
                    .floor_breakdown
                    .get(&floor_id)
                    .map(|f| PeakObservation::live(f.total_occupancy, f.max_capacity))
                    .unwrap_or_else(|| PeakObservation::live(0.0, None));
                let peak = ScopedPeak::new(Granularity::Floor, historical, live, config);
                (floor_id, peak)
            })
            .collect();

        let zones = Self::zone_peaks(historical, &live_report, config);

        info!(
            building_peak = building.current.value,
            building_peak_is_live = building.current.is_live,
            "Reconciled peaks"
        );

        Self {
            building,
            floors,
            zones,
        }
    }

    fn zone_peaks(
        historical: &[Reading],
        live_report: &OccupancyReport,
        config: &RollupConfig,
    ) -> BTreeMap<String, BTreeMap<String, ScopedPeak>> {
        let mut series: BTreeMap<(String, String), Vec<Reading>> = BTreeMap::new();
        for reading in historical {
            let zone = normalize(&reading.zone_name);
            if zone.is_entrance() || (config.hide_unrecognized_zones && !zone.is_recognized()) {
                continue;
            }
            series
                .entry((reading.floor_id.clone(), zone.label().to_string()))
                .or_default()
                .push(reading.clone());
        }

        let mut keys: Vec<(String, String)> = series.keys().cloned().collect();
        for (floor_id, zones) in &live_report.zones {
            keys.extend(zones.keys().map(|zone| (floor_id.clone(), zone.clone())));
        }
        keys.sort();
        keys.dedup();

        let mut peaks: BTreeMap<String, BTreeMap<String, ScopedPeak>> = BTreeMap::new();
        for (floor_id, zone) in keys {
            let historical = series
                .get(&(floor_id.clone(), zone.clone()))
                .map(|readings| PeakObservation::from_series(readings))
                .unwrap_or_else(|| PeakObservation::live(0.0, None));
            let live = live_report
                .zones
                .get(&floor_id)
                .and_then(|zones| zones.get(&zone))
                .map(|z| PeakObservation::live(z.total_occupancy, z.max_capacity))
                .unwrap_or_else(|| PeakObservation::live(0.0, None));
            peaks
                .entry(floor_id)
                .or_default()
                .insert(zone, ScopedPeak::new(Granularity::Zone, historical, live, config));
        }
        peaks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(floor: &str, zone: &str, ts: &str, occ: f64, pct: f64, cap: Option<f64>) -> Reading {
        Reading {
            floor_id: floor.into(),
            zone_name: zone.into(),
            timestamp: ts.into(),
            total_occupancy: occ,
            occupancy_percentage: pct,
            max_capacity: cap,
        }
    }

    const T9: &str = "2024-05-01T09:00:00Z";
    const T14: &str = "2024-05-01T14:00:00Z";

    #[test]
    fn test_report_without_entrance_keeps_sensored_ground_floor() {
        let readings = vec![
            reading("1F", "South-zone", T9, 10.0, 20.0, Some(50.0)),
            reading("1F", "South-Zone", T14, 5.0, 10.0, Some(50.0)),
        ];

        let report = OccupancyReport::build(&readings, &RollupConfig::default());

        let ground = &report.building.floor_breakdown["1F"];
        assert_eq!(ground.total_occupancy, 15.0);
        assert_eq!(ground.peak_occupancy, 10.0);
        assert_eq!(ground.avg_occupancy_percentage, 15.0);
        assert_eq!(ground.max_capacity, Some(50.0));
        assert!(report.entrance.is_none());
        assert_eq!(report.zones["1F"]["ZoneA"].sample_count, 2);
        assert_eq!(report.trend.len(), 2);
    }

    #[test]
    fn test_report_derives_ground_floor_from_entrance() {
        let readings = vec![
            reading("1F", "Main-Entrance", T9, 100.0, 50.0, Some(300.0)),
            reading("2F", "South-zone", T9, 30.0, 10.0, Some(50.0)),
            reading("3F", "North-zone", T9, 20.0, 15.0, Some(50.0)),
        ];

        let report = OccupancyReport::build(&readings, &RollupConfig::default());

        let ground = &report.building.floor_breakdown["1F"];
        assert_eq!(ground.total_occupancy, 50.0);
        assert_eq!(ground.avg_occupancy_percentage, 25.0);
        assert_eq!(ground.max_capacity, Some(300.0));
        assert_eq!(report.building.total_occupancy, 100.0);
        assert_eq!(report.building.total_max_capacity, 400.0);
        assert_eq!(report.entrance.as_ref().unwrap().total_occupancy, 100.0);
        assert!(!report.zones.contains_key("1F"));
        assert_eq!(report.trend.len(), 1);
        assert_eq!(report.trend[0].peak_occupancy, 30.0);
    }

    #[test]
    fn test_derived_ground_floor_peak_is_per_instant() {
        let readings = vec![
            reading("1F", "Main-Entrance", T9, 90.0, 45.0, Some(200.0)),
            reading("2F", "South-zone", T9, 30.0, 60.0, Some(50.0)),
            reading("1F", "Main-Entrance", T14, 120.0, 60.0, Some(200.0)),
            reading("2F", "South-zone", T14, 40.0, 80.0, Some(50.0)),
        ];
        let config = RollupConfig::default();

        let report = OccupancyReport::build(&readings, &config);

        // 210 - 70 over the window, but 60 and 80 at each instant.
        let ground = &report.building.floor_breakdown["1F"];
        assert_eq!(ground.total_occupancy, 140.0);
        assert_eq!(ground.peak_occupancy, 80.0);
        assert_eq!(report.building.peak_occupancy, 80.0);

        let peaks = PeakReport::build(&readings, &[], &config);
        assert_eq!(ground.peak_occupancy, peaks.floors["1F"].historical.value);
    }

    #[test]
    fn test_report_keeps_unrecognized_in_building_totals() {
        let readings = vec![
            reading("2F", "South-zone", T9, 4.0, 8.0, None),
            reading("2F", "Atrium", T9, 6.0, 12.0, None),
            reading("2F", "relocated", T9, 50.0, 50.0, None),
        ];
        let config = RollupConfig {
            hide_unrecognized_zones: true,
            ..Default::default()
        };

        let report = OccupancyReport::build(&readings, &config);

        assert_eq!(report.building.total_occupancy, 10.0);
        assert_eq!(report.zones["2F"].len(), 1);
        assert!(report.zones["2F"].contains_key("ZoneA"));
    }

    #[test]
    fn test_peak_report_scopes_are_independent() {
        let historical = vec![
            reading("2F", "South-zone", T9, 10.0, 20.0, Some(50.0)),
            reading("2F", "North-zone", T9, 15.0, 30.0, Some(50.0)),
            reading("2F", "South-zone", T14, 20.0, 40.0, Some(50.0)),
            reading("2F", "North-zone", T14, 2.0, 4.0, Some(50.0)),
        ];
        let live = vec![
            reading("2F", "South-zone", "2024-05-01T15:02:00Z", 21.0, 42.0, Some(50.0)),
            reading("2F", "North-zone", "2024-05-01T15:02:00Z", 3.0, 6.0, Some(50.0)),
        ];

        let peaks = PeakReport::build(&historical, &live, &RollupConfig::default());

        // Floor and building: 25 at 09:00 beats the live 24.
        let floor = &peaks.floors["2F"].current;
        assert_eq!(floor.value, 25.0);
        assert!(!floor.is_live);
        assert_eq!(floor.hour_utc, Some(9));
        assert_eq!(peaks.building.current.value, 25.0);
        assert_eq!(peaks.building.current.hour_utc, Some(9));

        // South zone: live 21 beats its own historical 20.
        let south = &peaks.zones["2F"]["ZoneA"].current;
        assert_eq!(south.value, 21.0);
        assert!(south.is_live);
        assert_eq!(south.hour_utc, None);
        assert_eq!(peaks.zones["2F"]["ZoneA"].peak_percentage, 42.0);
        assert_eq!(peaks.zones["2F"]["ZoneA"].available_capacity, 29.0);

        // North zone: historical 15 at 09:00 holds.
        let north = &peaks.zones["2F"]["ZoneC"].current;
        assert_eq!(north.value, 15.0);
        assert_eq!(north.hour_utc, Some(9));
    }

    #[test]
    fn test_peak_report_with_empty_history() {
        let live = vec![reading("3F", "Central-zone", T14, 7.0, 14.0, None)];

        let peaks = PeakReport::build(&[], &live, &RollupConfig::default());

        assert!(peaks.floors["3F"].current.is_live);
        assert_eq!(peaks.floors["3F"].peak_percentage, 14.0);
        assert_eq!(peaks.floors["3F"].live_occupancy, 7.0);
        assert_eq!(peaks.floors["3F"].available_capacity, 43.0);
        assert!(peaks.building.current.is_live);
        assert_eq!(peaks.building.current.value, 7.0);
    }
}
