use serde::{Deserialize, Serialize};

use super::{MentalState, ModuleUpdate, ModuleUpdater};
use crate::domain::Domain;
use crate::error::ValidationError;
use crate::num::clamp_score;
use crate::validator::{finite, in_range};

const STALE_AFTER_DAYS: u32 = 7;
const STALE_PENALTY: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPayload {
    pub content_produced_week: u32,
    /// 0-100
    #[serde(default)]
    pub engagement_score: f64,
    /// Audience growth, percent.
    #[serde(default)]
    pub growth_rate: f64,
    #[serde(default)]
    pub days_since_last_publish: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentState {
    pub score: f64,
    pub content_produced_week: u32,
    pub engagement_score: f64,
    pub growth_rate: f64,
    pub consistency_index: f64,
    pub authority_score: f64,
    pub days_since_last_publish: u32,
}

impl ModuleUpdater for ContentState {
    type Payload = ContentPayload;
    const DOMAIN: Domain = Domain::Content;

    fn validate(payload: &ContentPayload) -> Result<(), ValidationError> {
        in_range("engagement_score", payload.engagement_score, 0.0, 100.0)?;
        finite("growth_rate", payload.growth_rate)?;
        Ok(())
    }

    fn apply(&self, payload: &ContentPayload, _mental: &MentalState) -> ModuleUpdate<Self> {
        let mut next = self.clone();
        next.content_produced_week = payload.content_produced_week;
        next.engagement_score = payload.engagement_score;
        next.growth_rate = clamp_score(payload.growth_rate);
        next.days_since_last_publish = payload.days_since_last_publish;

        let stale = if payload.days_since_last_publish >= STALE_AFTER_DAYS {
            STALE_PENALTY
        } else {
            0.0
        };
        next.consistency_index =
            clamp_score(10.0 * f64::from(payload.content_produced_week) + 30.0 - stale);
        next.authority_score =
            clamp_score(0.5 * next.consistency_index + 0.5 * next.engagement_score);
        next.score = clamp_score(
            0.4 * next.consistency_index + 0.3 * next.engagement_score + 0.3 * next.growth_rate,
        );

        ModuleUpdate::clean(next)
    }

    fn score(&self) -> f64 {
        self.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(days_since: u32) -> ContentPayload {
        ContentPayload {
            content_produced_week: 4,
            engagement_score: 70.0,
            growth_rate: 12.0,
            days_since_last_publish: days_since,
        }
    }

    #[test]
    fn blends_consistency_engagement_growth() {
        let s = ContentState::default().apply(&payload(0), &MentalState::default()).state;
        assert_eq!(s.consistency_index, 70.0);
        assert_eq!(s.authority_score, 70.0);
        assert!((s.score - (28.0 + 21.0 + 3.6)).abs() < 1e-9);
    }

    #[test]
    fn week_without_publishing_penalizes_consistency() {
        let fresh = ContentState::default().apply(&payload(0), &MentalState::default()).state;
        let stale = ContentState::default().apply(&payload(7), &MentalState::default()).state;
        assert_eq!(stale.consistency_index, fresh.consistency_index - 20.0);
        assert!(stale.score < fresh.score);
    }

    #[test]
    fn negative_growth_clamps() {
        let mut p = payload(0);
        p.growth_rate = -40.0;
        let s = ContentState::default().apply(&p, &MentalState::default()).state;
        assert_eq!(s.growth_rate, 0.0);
    }
}
