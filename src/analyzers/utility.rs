/// Divides a running total by its sample count. Returns 0.0 when there are no samples.
pub fn average(total: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    total / count as f64
}

/// Clamps a derived figure at zero.
pub fn clamp_zero(value: f64) -> f64 {
    value.max(0.0)
}

/// Seats left before `capacity` is reached. Never negative, even when
/// occupancy overshoots capacity.
pub fn available_capacity(capacity: f64, occupancy: f64) -> f64 {
    clamp_zero(capacity - occupancy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_zero_count() {
        assert_eq!(average(12.0, 0), 0.0);
        assert!(!average(0.0, 0).is_nan());
    }

    #[test]
    fn test_average_signed_total() {
        assert_eq!(average(30.0, 3), 10.0);
        assert_eq!(average(-9.0, 3), -3.0);
    }

    #[test]
    fn test_available_capacity_clamps() {
        assert_eq!(available_capacity(50.0, 20.0), 30.0);
        assert_eq!(available_capacity(50.0, 70.0), 0.0);
        assert_eq!(available_capacity(50.0, -5.0), 55.0);
    }
}
