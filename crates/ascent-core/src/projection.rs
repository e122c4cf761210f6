//! Short and long horizon forecasts from score velocity.

use crate::num::clamp_score;
use crate::state::ProjectionState;

/// Entries back from the newest score used for velocity.
pub const VELOCITY_SPAN: usize = 14;
const SHORT_HORIZON_DAYS: f64 = 90.0;
const LONG_HORIZON_DAYS: f64 = 1095.0;

const HIGH_RISK_RELAPSES: u32 = 3;
const HIGH_RISK_DISCIPLINE: f64 = 60.0;
/// Regression risk above this raises the dashboard's high-risk flag.
pub const HIGH_RISK_FLAG: f64 = 60.0;

/// Inputs the estimator reads besides the score history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionInputs {
    pub global_score: f64,
    pub discipline_index: f64,
    pub stability_index: f64,
    pub relapse_count: u32,
    /// The mental module's recent-relapse alert.
    pub relapse_alert: bool,
}

/// Score change per cycle over the last fourteen cycles; zero until
/// fifteen entries exist.
pub fn growth_velocity(current: f64, history: &[f64]) -> f64 {
    let n = history.len();
    if n <= VELOCITY_SPAN {
        return 0.0;
    }
    (current - history[n - 1 - VELOCITY_SPAN]) / VELOCITY_SPAN as f64
}

/// Risk in the high band (70..=100) when any trigger fires, else the low
/// band (20..=40).
pub fn regression_risk(inputs: &ProjectionInputs, velocity: f64) -> f64 {
    let high = inputs.relapse_count >= HIGH_RISK_RELAPSES
        || inputs.discipline_index < HIGH_RISK_DISCIPLINE
        || velocity < 0.0;
    if high {
        let surge = if inputs.relapse_alert { 15.0 } else { 0.0 };
        (70.0 + 3.0 * f64::from(inputs.relapse_count) + surge).clamp(70.0, 100.0)
    } else {
        let surge = if inputs.relapse_alert { 10.0 } else { 0.0 };
        (20.0 + 0.2 * (100.0 - clamp_score(inputs.stability_index)) + surge).clamp(20.0, 40.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectionEstimator;

impl ProjectionEstimator {
    pub fn estimate(&self, inputs: &ProjectionInputs, history: &[f64]) -> ProjectionState {
        let current = clamp_score(inputs.global_score);
        let velocity = growth_velocity(current, history);
        ProjectionState {
            growth_velocity: velocity,
            projected_90_days_score: clamp_score(current + velocity * SHORT_HORIZON_DAYS),
            projected_3_years_score: clamp_score(
                current
                    + velocity * LONG_HORIZON_DAYS * (clamp_score(inputs.discipline_index) / 100.0),
            ),
            regression_risk: regression_risk(inputs, velocity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steady() -> ProjectionInputs {
        ProjectionInputs {
            global_score: 80.0,
            discipline_index: 80.0,
            stability_index: 70.0,
            relapse_count: 0,
            relapse_alert: false,
        }
    }

    #[test]
    fn short_history_has_zero_velocity() {
        let history = vec![50.0; VELOCITY_SPAN];
        let p = ProjectionEstimator.estimate(&steady(), &history);
        assert_eq!(p.growth_velocity, 0.0);
        assert_eq!(p.projected_90_days_score, 80.0);
        assert_eq!(p.projected_3_years_score, 80.0);
    }

    #[test]
    fn velocity_uses_fifteenth_entry_back() {
        let mut history = vec![52.0];
        history.extend(vec![60.0; VELOCITY_SPAN]);
        assert_eq!(growth_velocity(80.0, &history), 2.0);
    }

    #[test]
    fn long_horizon_discounted_by_discipline() {
        let mut history = vec![79.86];
        history.extend(vec![80.0; VELOCITY_SPAN]);
        let inputs = ProjectionInputs {
            global_score: 80.0,
            discipline_index: 50.0,
            ..steady()
        };
        let p = ProjectionEstimator.estimate(&inputs, &history);
        let v = p.growth_velocity;
        assert!((p.projected_90_days_score - (80.0 + 90.0 * v)).abs() < 1e-9);
        assert!((p.projected_3_years_score - (80.0 + 1095.0 * v * 0.5)).abs() < 1e-9);
    }

    #[test]
    fn projections_are_clamped() {
        let mut history = vec![0.0];
        history.extend(vec![50.0; VELOCITY_SPAN]);
        let p = ProjectionEstimator.estimate(&steady(), &history);
        assert_eq!(p.projected_90_days_score, 100.0);
        assert_eq!(p.projected_3_years_score, 100.0);
    }

    #[test]
    fn negative_velocity_forces_high_band() {
        let mut history = vec![95.0];
        history.extend(vec![90.0; VELOCITY_SPAN]);
        let inputs = ProjectionInputs {
            discipline_index: 100.0,
            stability_index: 100.0,
            ..steady()
        };
        let p = ProjectionEstimator.estimate(&inputs, &history);
        assert!(p.growth_velocity < 0.0);
        assert!(p.regression_risk >= 70.0);
        assert!(p.regression_risk > HIGH_RISK_FLAG);
    }

    #[test]
    fn band_triggers() {
        let low = regression_risk(&steady(), 0.0);
        assert!((20.0..=40.0).contains(&low));
        assert!((low - 26.0).abs() < 1e-9);

        let relapsing = ProjectionInputs {
            relapse_count: 3,
            ..steady()
        };
        assert_eq!(regression_risk(&relapsing, 0.0), 79.0);

        let undisciplined = ProjectionInputs {
            discipline_index: 59.9,
            ..steady()
        };
        assert_eq!(regression_risk(&undisciplined, 0.0), 70.0);

        let capped = ProjectionInputs {
            relapse_count: 40,
            relapse_alert: true,
            ..steady()
        };
        assert_eq!(regression_risk(&capped, 1.0), 100.0);
    }
}
