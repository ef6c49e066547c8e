use crate::analyzers::types::{FloorAggregate, OccupancyAggregate};
use crate::analyzers::utility::clamp_zero;
use tracing::debug;

/// Infers the occupancy of a floor that has no sensor of its own.
///
/// The entrance counter sees everyone in the building, so the unsensored
/// floor holds whatever the sensored floors do not account for. Occupancy and
/// average percentage are each clamped at zero on their own: a result can
/// carry zero occupancy next to a positive percentage.
///
/// The synthetic aggregate keeps the entrance sample count, with its
/// percentage total rebuilt from the derived average so the two stay
/// consistent. Capacity comes from the entrance, or `entrance_capacity_default`.
/// The peak equals the derived occupancy, which only holds for a single
/// instant; callers folding a window must derive the peak per timestamp.
pub fn derive_ground_floor(
    key: &str,
    entrance: &OccupancyAggregate,
    others: &[&FloorAggregate],
    entrance_capacity_default: f64,
) -> FloorAggregate {
    let others_occupancy: f64 = others.iter().map(|f| f.total_occupancy).sum();
    let others_percentage: f64 = others.iter().map(|f| f.avg_occupancy_percentage).sum();

    let occupancy = clamp_zero(entrance.total_occupancy - others_occupancy);
    let avg_percentage = clamp_zero(entrance.avg_occupancy_percentage - others_percentage);

    debug!(
        floor_id = key,
        entrance_occupancy = entrance.total_occupancy,
        others_occupancy,
        occupancy,
        avg_percentage,
        "Derived unsensored floor"
    );

    OccupancyAggregate {
        key: key.to_string(),
        total_occupancy: occupancy,
        peak_occupancy: occupancy,
        total_percentage: avg_percentage * entrance.sample_count as f64,
        sample_count: entrance.sample_count,
        avg_occupancy_percentage: avg_percentage,
        max_capacity: Some(entrance.capacity_or(entrance_capacity_default)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::BUILDING_CAPACITY_DEFAULT;

    fn floor(key: &str, occupancy: f64, pct: f64) -> FloorAggregate {
        OccupancyAggregate {
            key: key.into(),
            total_occupancy: occupancy,
            peak_occupancy: occupancy.max(0.0),
            total_percentage: pct,
            sample_count: 1,
            avg_occupancy_percentage: pct,
            max_capacity: None,
        }
    }

    #[test]
    fn test_clamps_are_independent() {
        let entrance = floor("entrance", 40.0, 30.0);
        let second = floor("2F", 30.0, 6.0);
        let third = floor("3F", 25.0, 4.0);

        let ground = derive_ground_floor("1F", &entrance, &[&second, &third], 200.0);

        assert_eq!(ground.total_occupancy, 0.0);
        assert_eq!(ground.avg_occupancy_percentage, 20.0);
    }

    #[test]
    fn test_positive_remainder() {
        let entrance = floor("entrance", 100.0, 50.0);
        let second = floor("2F", 30.0, 10.0);
        let third = floor("3F", 20.0, 15.0);

        let ground = derive_ground_floor("1F", &entrance, &[&second, &third], 200.0);

        assert_eq!(ground.key, "1F");
        assert_eq!(ground.total_occupancy, 50.0);
        assert_eq!(ground.peak_occupancy, 50.0);
        assert_eq!(ground.avg_occupancy_percentage, 25.0);
        assert_eq!(ground.total_percentage, 25.0);
        assert_eq!(ground.sample_count, 1);
    }

    #[test]
    fn test_percentage_clamps_while_occupancy_stays() {
        let entrance = floor("entrance", 80.0, 10.0);
        let second = floor("2F", 20.0, 25.0);

        let ground = derive_ground_floor("1F", &entrance, &[&second], 200.0);

        assert_eq!(ground.total_occupancy, 60.0);
        assert_eq!(ground.avg_occupancy_percentage, 0.0);
    }

    #[test]
    fn test_capacity_from_entrance_or_default() {
        let mut entrance = floor("entrance", 10.0, 5.0);
        let ground = derive_ground_floor("1F", &entrance, &[], BUILDING_CAPACITY_DEFAULT);
        assert_eq!(ground.max_capacity, Some(200.0));

        entrance.max_capacity = Some(350.0);
        let ground = derive_ground_floor("1F", &entrance, &[], BUILDING_CAPACITY_DEFAULT);
        assert_eq!(ground.max_capacity, Some(350.0));
        assert_eq!(ground.total_occupancy, 10.0);
    }

    #[test]
    fn test_empty_entrance_yields_zero_floor() {
        let entrance = OccupancyAggregate::empty("entrance");
        let second = floor("2F", 12.0, 9.0);

        let ground = derive_ground_floor("1F", &entrance, &[&second], 200.0);

        assert_eq!(ground.total_occupancy, 0.0);
        assert_eq!(ground.avg_occupancy_percentage, 0.0);
        assert_eq!(ground.sample_count, 0);
        assert_eq!(ground.total_percentage, 0.0);
    }
}
