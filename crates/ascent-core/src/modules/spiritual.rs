use serde::{Deserialize, Serialize};

use super::{MentalState, ModuleUpdate, ModuleUpdater};
use crate::domain::Domain;
use crate::error::ValidationError;
use crate::events::ViolationKind;
use crate::num::clamp_score;
use crate::validator::in_range;

/// Both flags are required: a missing relapse flag is a rejected payload,
/// never an implicit "clean".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpiritualPayload {
    pub prayed: bool,
    pub relapse: bool,
    /// Sacraments per week.
    #[serde(default)]
    pub sacramental_frequency: Option<u32>,
    #[serde(default)]
    pub confession: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiritualState {
    pub score: f64,
    pub clean_days: u32,
    pub prayer_streak: u32,
    pub sacramental_frequency: u32,
    pub moral_stability_score: f64,
    pub confession_log: Vec<String>,
    pub relapse_flag: bool,
}

impl ModuleUpdater for SpiritualState {
    type Payload = SpiritualPayload;
    const DOMAIN: Domain = Domain::Spiritual;

    fn validate(payload: &SpiritualPayload) -> Result<(), ValidationError> {
        if let Some(freq) = payload.sacramental_frequency {
            in_range("sacramental_frequency", f64::from(freq), 0.0, 14.0)?;
        }
        Ok(())
    }

    fn apply(&self, payload: &SpiritualPayload, _mental: &MentalState) -> ModuleUpdate<Self> {
        let mut next = self.clone();
        next.relapse_flag = payload.relapse;
        next.clean_days = if payload.relapse {
            0
        } else {
            self.clean_days.saturating_add(1)
        };
        next.prayer_streak = if payload.prayed {
            self.prayer_streak.saturating_add(1)
        } else {
            0
        };
        if let Some(freq) = payload.sacramental_frequency {
            next.sacramental_frequency = freq;
        }
        if let Some(confession) = payload.confession.as_ref().filter(|c| !c.trim().is_empty()) {
            next.confession_log.push(confession.clone());
        }

        next.moral_stability_score = clamp_score(
            1.5 * f64::from(next.prayer_streak)
                + 0.8 * f64::from(next.clean_days)
                + 8.0 * f64::from(next.sacramental_frequency),
        );
        next.score = next.moral_stability_score;

        if payload.relapse {
            ModuleUpdate::with_violation(next, ViolationKind::Relapse, Domain::Spiritual)
        } else {
            ModuleUpdate::clean(next)
        }
    }

    fn score(&self) -> f64 {
        self.score
    }
}
