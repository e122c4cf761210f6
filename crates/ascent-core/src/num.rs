//! Numeric helpers shared by every scoring formula.

/// Clamp to the `[0, 100]` score range. Non-finite input collapses to 0.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Arithmetic mean, 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean of the last `n` values.
pub fn mean_last(values: &[f64], n: usize) -> f64 {
    mean(tail(values, n))
}

/// The last `n` values (or all of them when shorter).
pub fn tail<T>(values: &[T], n: usize) -> &[T] {
    &values[values.len().saturating_sub(n)..]
}

/// Round to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Drop the oldest entries so at most `cap` remain.
pub fn enforce_cap<T>(values: &mut Vec<T>, cap: usize) {
    if values.len() > cap {
        let excess = values.len() - cap;
        values.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_handles_extremes() {
        assert_eq!(clamp_score(-5.0), 0.0);
        assert_eq!(clamp_score(150.0), 100.0);
        assert_eq!(clamp_score(f64::NAN), 0.0);
        assert_eq!(clamp_score(f64::INFINITY), 0.0);
        assert_eq!(clamp_score(42.5), 42.5);
    }

    #[test]
    fn mean_last_uses_window() {
        let values = [10.0, 20.0, 30.0, 40.0];
        assert_eq!(mean_last(&values, 2), 35.0);
        assert_eq!(mean_last(&values, 10), 25.0);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn enforce_cap_drops_oldest() {
        let mut values = vec![1, 2, 3, 4, 5];
        enforce_cap(&mut values, 3);
        assert_eq!(values, vec![3, 4, 5]);
    }

    #[test]
    fn round_to_two_places() {
        assert_eq!(round_to(80.0 * 1.025, 2), 82.0);
        assert_eq!(round_to(0.15000000000000002, 2), 0.15);
    }
}
