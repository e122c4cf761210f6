//! Mental state: dopamine and impulse-resistance proxies, emotional
//! volatility, and the shared relapse counter.
//!
//! `relapse_count` is owned here but incremented only by the discipline
//! tracker when a violation arrives from any domain.

use serde::{Deserialize, Serialize};

use super::{ModuleUpdate, ModuleUpdater};
use crate::domain::Domain;
use crate::error::ValidationError;
use crate::num::clamp_score;
use crate::validator::in_range;

/// Recent relapses at or above this elevate volatility and regression risk.
pub const RELAPSE_ALERT: u32 = 3;
const VOLATILITY_SURGE: f64 = 15.0;
const RELAPSE_SCORE_PENALTY: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentalPayload {
    /// 0-100, higher is less stable.
    pub emotional_volatility: f64,
    #[serde(default)]
    pub sleep_quality: Option<f64>,
    #[serde(default)]
    pub emotional_stability: Option<f64>,
    #[serde(default)]
    pub compulsion_free: bool,
    #[serde(default)]
    pub urge_deflections: u32,
    #[serde(default)]
    pub recent_relapses_7d: Option<u32>,
    #[serde(default)]
    pub mood_score: Option<f64>,
    #[serde(default)]
    pub triggers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MentalState {
    pub score: f64,
    pub relapse_count: u32,
    pub recent_relapses: u32,
    pub urge_deflections: u32,
    pub dopamine_index: f64,
    pub impulse_resistance_score: f64,
    pub emotional_volatility_index: f64,
    pub stability_trend: Vec<f64>,
    pub mood_trend: Vec<f64>,
    pub trigger_log: Vec<String>,
}

impl Default for MentalState {
    fn default() -> Self {
        Self {
            score: 0.0,
            relapse_count: 0,
            recent_relapses: 0,
            urge_deflections: 0,
            dopamine_index: 50.0,
            impulse_resistance_score: 50.0,
            emotional_volatility_index: 50.0,
            stability_trend: Vec::new(),
            mood_trend: Vec::new(),
            trigger_log: Vec::new(),
        }
    }
}

impl MentalState {
    pub fn relapse_alert(&self) -> bool {
        self.recent_relapses >= RELAPSE_ALERT
    }

    fn impulse_resistance(&self) -> f64 {
        clamp_score(
            10.0 * f64::from(self.urge_deflections) - 3.0 * f64::from(self.relapse_count) + 40.0,
        )
    }

    /// Recompute the score from the stored indices.
    pub fn rescore(&mut self) {
        self.impulse_resistance_score = self.impulse_resistance();
        let alert_penalty = if self.relapse_alert() {
            RELAPSE_SCORE_PENALTY
        } else {
            0.0
        };
        self.score = clamp_score(
            0.4 * self.dopamine_index
                + 0.4 * self.impulse_resistance_score
                + 0.2 * (100.0 - self.emotional_volatility_index)
                - 2.0 * f64::from(self.relapse_count)
                - alert_penalty,
        );
    }

    /// Count a violation raised anywhere in the system. It also counts as
    /// recent until the next mental check-in reports the weekly figure.
    pub fn record_relapse(&mut self) {
        self.relapse_count = self.relapse_count.saturating_add(1);
        self.recent_relapses = self.recent_relapses.saturating_add(1);
        self.rescore();
    }
}

impl ModuleUpdater for MentalState {
    type Payload = MentalPayload;
    const DOMAIN: Domain = Domain::Mental;

    fn validate(payload: &MentalPayload) -> Result<(), ValidationError> {
        in_range("emotional_volatility", payload.emotional_volatility, 0.0, 100.0)?;
        if let Some(sleep) = payload.sleep_quality {
            in_range("sleep_quality", sleep, 0.0, 100.0)?;
        }
        if let Some(stability) = payload.emotional_stability {
            in_range("emotional_stability", stability, 0.0, 100.0)?;
        }
        if let Some(mood) = payload.mood_score {
            in_range("mood_score", mood, 0.0, 100.0)?;
        }
        Ok(())
    }

    fn apply(&self, payload: &MentalPayload, _shared: &MentalState) -> ModuleUpdate<Self> {
        let mut next = self.clone();
        next.recent_relapses = payload.recent_relapses_7d.unwrap_or(self.relapse_count);
        next.urge_deflections = payload.urge_deflections;

        let surge = if next.relapse_alert() {
            VOLATILITY_SURGE
        } else {
            0.0
        };
        next.emotional_volatility_index = clamp_score(payload.emotional_volatility + surge);

        let sleep = payload.sleep_quality.unwrap_or(50.0);
        let stability = payload
            .emotional_stability
            .unwrap_or(100.0 - payload.emotional_volatility);
        let compulsion = if payload.compulsion_free { 30.0 } else { 0.0 };
        next.dopamine_index = clamp_score(0.4 * sleep + compulsion + 0.3 * stability);

        next.rescore();
        next.stability_trend
            .push(clamp_score((next.dopamine_index + next.impulse_resistance_score) / 2.0));
        if let Some(mood) = payload.mood_score {
            next.mood_trend.push(mood);
        }
        next.trigger_log.extend(
            payload
                .triggers
                .iter()
                .filter(|t| !t.trim().is_empty())
                .cloned(),
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

    fn payload(volatility: f64) -> MentalPayload {
        MentalPayload {
            emotional_volatility: volatility,
            sleep_quality: Some(80.0),
            emotional_stability: Some(70.0),
            compulsion_free: true,
            urge_deflections: 4,
            recent_relapses_7d: None,
            mood_score: Some(65.0),
            triggers: vec!["late-night scrolling".into()],
        }
    }

    #[test]
    fn composite_of_proxies() {
        let s = MentalState::default().apply(&payload(30.0), &MentalState::default()).state;
        // dopamine 32 + 30 + 21
        assert!((s.dopamine_index - 83.0).abs() < 1e-9);
        assert_eq!(s.impulse_resistance_score, 80.0);
        assert!((s.score - (0.4 * 83.0 + 32.0 + 14.0)).abs() < 1e-9);
        assert_eq!(s.stability_trend.len(), 1);
        assert_eq!(s.trigger_log, vec!["late-night scrolling".to_string()]);
    }

    #[test]
    fn recent_relapses_elevate_volatility() {
        let mut p = payload(30.0);
        p.recent_relapses_7d = Some(3);
        let s = MentalState::default().apply(&p, &MentalState::default()).state;
        assert_eq!(s.emotional_volatility_index, 45.0);
        assert!(s.relapse_alert());
        let calm = MentalState::default().apply(&payload(30.0), &MentalState::default()).state;
        assert!(s.score < calm.score);
    }

    #[test]
    fn relapse_count_penalizes_score() {
        let mut s = MentalState::default().apply(&payload(30.0), &MentalState::default()).state;
        let before = s.score;
        s.record_relapse();
        assert_eq!(s.relapse_count, 1);
        assert_eq!(s.impulse_resistance_score, 77.0);
        assert!(s.score < before);
    }

    #[test]
    fn violations_raise_the_relapse_alert() {
        let mut s = MentalState::default();
        for _ in 0..3 {
            s.record_relapse();
        }
        assert_eq!(s.recent_relapses, 3);
        assert!(s.relapse_alert());
    }

    #[test]
    fn unreported_recent_relapses_fall_back_to_total() {
        let shared = MentalState::default();
        let mut prior = MentalState {
            relapse_count: 3,
            ..MentalState::default()
        };
        let s = prior.apply(&payload(30.0), &shared).state;
        assert_eq!(s.recent_relapses, 3);
        assert_eq!(s.emotional_volatility_index, 45.0);

        prior.relapse_count = 1;
        let mut reported = payload(30.0);
        reported.recent_relapses_7d = Some(0);
        let s = prior.apply(&reported, &shared).state;
        assert_eq!(s.recent_relapses, 0);
        assert!(!s.relapse_alert());
    }

    #[test]
    fn volatility_is_required_and_bounded() {
        assert!(serde_json::from_value::<MentalPayload>(serde_json::json!({})).is_err());
        assert!(MentalState::validate(&payload(140.0)).is_err());
    }
}
