//! Weighted composite score and alert-level derivation.

use serde::{Deserialize, Serialize};

use crate::domain::{Domain, DomainScores, DomainWeights};
use crate::num::clamp_score;
use crate::state::AlertState;

/// Output of one aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Weighted sum before the under-performance multiplier.
    pub base_score: f64,
    pub global_score: f64,
    pub under_threshold: usize,
    pub multiplier: f64,
    pub alert_state: AlertState,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreAggregator {
    weights: DomainWeights,
    under_threshold: f64,
}

impl ScoreAggregator {
    pub fn new(weights: DomainWeights, under_threshold: f64) -> Self {
        Self {
            weights,
            under_threshold,
        }
    }

    /// Scores as the aggregator sees them: clamped, with non-essential
    /// domains forced to zero under strict mode. The zeroed score still counts
    /// toward the under-threshold tally.
    pub fn effective_scores(&self, scores: &DomainScores, strict_mode: bool) -> DomainScores {
        let mut effective = DomainScores::default();
        for (domain, score) in scores.iter() {
            let score = if strict_mode && !domain.is_essential() {
                0.0
            } else {
                clamp_score(score)
            };
            effective.set(domain, score);
        }
        effective
    }

    pub fn aggregate(&self, scores: &DomainScores, strict_mode: bool) -> Aggregate {
        let effective = self.effective_scores(scores, strict_mode);
        let base_score: f64 = Domain::ALL
            .iter()
            .map(|d| self.weights.get(*d) * effective.get(*d))
            .sum();
        let under_threshold = effective
            .iter()
            .filter(|(_, score)| *score < self.under_threshold)
            .count();
        let alert_state = AlertState::from_under_count(under_threshold);
        let multiplier = alert_state.multiplier();
        Aggregate {
            base_score,
            global_score: clamp_score(base_score * multiplier),
            under_threshold,
            multiplier,
            alert_state,
        }
    }
}

impl Default for ScoreAggregator {
    fn default() -> Self {
        Self::new(DomainWeights::default(), 60.0)
    }
}
