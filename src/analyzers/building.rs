use crate::analyzers::types::{BuildingAggregate, FloorAggregate};
use crate::analyzers::utility::average;
use std::collections::BTreeMap;

/// Composes per-floor aggregates into a whole-building aggregate.
///
/// - occupancy is the sum over floors;
/// - the peak is the single highest floor peak, since floors need not peak at
///   the same instant;
/// - the average percentage is taken over every underlying sample, not over
///   the floor averages;
/// - capacity sums each floor's recorded capacity once. Floors without one add
///   nothing, and a building where no floor recorded a capacity gets
///   `building_capacity_default`.
pub fn aggregate_building(
    per_floor: BTreeMap<String, FloorAggregate>,
    building_capacity_default: f64,
) -> BuildingAggregate {
    let total_occupancy: f64 = per_floor.values().map(|f| f.total_occupancy).sum();
    let peak_occupancy: f64 = per_floor
        .values()
        .map(|f| f.peak_occupancy)
        .fold(0.0, f64::max);
    let total_percentage: f64 = per_floor.values().map(|f| f.total_percentage).sum();
    let sample_count: usize = per_floor.values().map(|f| f.sample_count).sum();

    let recorded: Vec<f64> = per_floor.values().filter_map(|f| f.max_capacity).collect();
    let total_max_capacity = if recorded.is_empty() {
        building_capacity_default
    } else {
        recorded.iter().sum()
    };

    BuildingAggregate {
        total_occupancy,
        peak_occupancy,
        total_percentage,
        sample_count,
        avg_occupancy_percentage: average(total_percentage, sample_count),
        total_max_capacity,
        floor_breakdown: per_floor,
    }
}

/// Mean of the per-floor averages. This is the figure the building average
/// must NOT be computed from; it is exposed for floor comparison charts.
pub fn mean_of_floor_averages(per_floor: &BTreeMap<String, FloorAggregate>) -> f64 {
    let averages: Vec<f64> = per_floor
        .values()
        .map(|f| f.avg_occupancy_percentage)
        .collect();
    average(averages.iter().sum(), averages.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::OccupancyAggregate;

    fn floor(key: &str, total: f64, peak: f64, avg: f64, samples: usize, cap: Option<f64>) -> FloorAggregate {
        OccupancyAggregate {
            key: key.into(),
            total_occupancy: total,
            peak_occupancy: peak,
            total_percentage: avg * samples as f64,
            sample_count: samples,
            avg_occupancy_percentage: avg,
            max_capacity: cap,
        }
    }

    fn floors(list: Vec<FloorAggregate>) -> BTreeMap<String, FloorAggregate> {
        list.into_iter().map(|f| (f.key.clone(), f)).collect()
    }

    #[test]
    fn test_average_uses_flattened_samples() {
        let per_floor = floors(vec![
            floor("1F", 5.0, 5.0, 10.0, 1, None),
            floor("2F", 30.0, 12.0, 50.0, 3, None),
        ]);

        assert_eq!(mean_of_floor_averages(&per_floor), 30.0);

        let building = aggregate_building(per_floor, 200.0);
        assert_eq!(building.avg_occupancy_percentage, 40.0);
        assert_eq!(building.sample_count, 4);
    }

    #[test]
    fn test_peak_is_max_not_sum() {
        let building = aggregate_building(
            floors(vec![
                floor("2F", 20.0, 12.0, 10.0, 2, Some(50.0)),
                floor("3F", 25.0, 18.0, 10.0, 2, Some(60.0)),
            ]),
            200.0,
        );

        assert_eq!(building.peak_occupancy, 18.0);
        assert_eq!(building.total_occupancy, 45.0);
        assert_eq!(building.total_max_capacity, 110.0);
        assert_eq!(building.floor_breakdown.len(), 2);
    }

    #[test]
    fn test_capacity_default_when_nothing_recorded() {
        let building = aggregate_building(
            floors(vec![floor("2F", 1.0, 1.0, 1.0, 1, None)]),
            200.0,
        );
        assert_eq!(building.total_max_capacity, 200.0);
    }

    #[test]
    fn test_floor_without_capacity_adds_nothing() {
        let building = aggregate_building(
            floors(vec![
                floor("2F", 5.0, 5.0, 10.0, 1, Some(50.0)),
                floor("3F", 5.0, 5.0, 10.0, 1, None),
            ]),
            200.0,
        );
        assert_eq!(building.total_max_capacity, 50.0);
    }

    #[test]
    fn test_empty_building() {
        let building = aggregate_building(BTreeMap::new(), 200.0);

        assert_eq!(building.total_occupancy, 0.0);
        assert_eq!(building.peak_occupancy, 0.0);
        assert_eq!(building.avg_occupancy_percentage, 0.0);
        assert_eq!(building.sample_count, 0);
    }

    #[test]
    fn test_negative_floor_totals_pass_through() {
        let building = aggregate_building(
            floors(vec![
                floor("2F", -4.0, 0.0, -2.0, 2, None),
                floor("3F", 10.0, 10.0, 6.0, 2, None),
            ]),
            200.0,
        );

        assert_eq!(building.total_occupancy, 6.0);
        assert_eq!(building.avg_occupancy_percentage, 2.0);
    }
}
