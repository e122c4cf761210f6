//! Per-domain module updaters.
//!
//! Each updater is a pure transform `(previous state, payload, shared mental
//! state) -> new state`. The only cross-domain effect a module may have is to
//! return a [`Violation`], which the discipline tracker applies.

mod academics;
mod content;
mod diet;
mod finance;
mod mental;
mod spiritual;
mod training;

pub use academics::{AcademicsPayload, AcademicsState, Subject};
pub use content::{ContentPayload, ContentState};
pub use diet::{DietGuide, DietPayload, DietState, MacroTargets, Macros, Meal};
pub use finance::{savings_rate, FinancePayload, FinanceState};
pub use mental::{MentalPayload, MentalState, RELAPSE_ALERT};
pub use spiritual::{SpiritualPayload, SpiritualState};
pub use training::{
    fatigue_index, next_load, DayType, ExerciseSet, GuidedSession, LoadRecord, StrengthGoal,
    TrackedExercise, TrainingPayload, TrainingState,
};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::{Domain, DomainScores};
use crate::error::ValidationError;
use crate::events::{Violation, ViolationKind};
use crate::num::enforce_cap;
use crate::storage::RetentionConfig;

/// Result of a module update.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleUpdate<S> {
    pub state: S,
    pub violation: Option<Violation>,
}

impl<S> ModuleUpdate<S> {
    pub fn clean(state: S) -> Self {
        Self {
            state,
            violation: None,
        }
    }

    pub fn with_violation(state: S, kind: ViolationKind, domain: Domain) -> Self {
        Self {
            state,
            violation: Some(Violation { kind, domain }),
        }
    }
}

/// A domain's state plus its payload schema and update rule.
pub trait ModuleUpdater: Sized + Clone {
    type Payload: DeserializeOwned;
    const DOMAIN: Domain;

    /// Domain-specific bounds checks. Structural presence is enforced by
    /// deserialization.
    fn validate(payload: &Self::Payload) -> Result<(), ValidationError>;

    fn apply(&self, payload: &Self::Payload, mental: &MentalState) -> ModuleUpdate<Self>;

    fn score(&self) -> f64;
}

/// A typed execution payload for one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "domain", rename_all = "lowercase")]
pub enum ExecutionPayload {
    Training(TrainingPayload),
    Diet(DietPayload),
    Finance(FinancePayload),
    Academics(AcademicsPayload),
    Spiritual(SpiritualPayload),
    Mental(MentalPayload),
    Content(ContentPayload),
}

fn parse<T: DeserializeOwned>(value: &serde_json::Value) -> Result<T, ValidationError> {
    serde_json::from_value(value.clone()).map_err(|e| {
        let message = e.to_string();
        match message
            .strip_prefix("missing field `")
            .and_then(|rest| rest.split('`').next())
        {
            Some(field) => ValidationError::MissingField(field.to_string()),
            None => ValidationError::Malformed(message),
        }
    })
}

impl ExecutionPayload {
    pub fn domain(&self) -> Domain {
        match self {
            ExecutionPayload::Training(_) => Domain::Training,
            ExecutionPayload::Diet(_) => Domain::Diet,
            ExecutionPayload::Finance(_) => Domain::Finance,
            ExecutionPayload::Academics(_) => Domain::Academics,
            ExecutionPayload::Spiritual(_) => Domain::Spiritual,
            ExecutionPayload::Mental(_) => Domain::Mental,
            ExecutionPayload::Content(_) => Domain::Content,
        }
    }

    /// Read an untyped payload as the schema of `domain`.
    pub fn from_json(domain: Domain, value: &serde_json::Value) -> Result<Self, ValidationError> {
        Ok(match domain {
            Domain::Training => ExecutionPayload::Training(parse(value)?),
            Domain::Diet => ExecutionPayload::Diet(parse(value)?),
            Domain::Finance => ExecutionPayload::Finance(parse(value)?),
            Domain::Academics => ExecutionPayload::Academics(parse(value)?),
            Domain::Spiritual => ExecutionPayload::Spiritual(parse(value)?),
            Domain::Mental => ExecutionPayload::Mental(parse(value)?),
            Domain::Content => ExecutionPayload::Content(parse(value)?),
        })
    }
}

/// All seven module states.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleStates {
    pub training: TrainingState,
    pub diet: DietState,
    pub finance: FinanceState,
    pub academics: AcademicsState,
    pub spiritual: SpiritualState,
    pub mental: MentalState,
    pub content: ContentState,
}

impl ModuleStates {
    pub fn scores(&self) -> DomainScores {
        let mut scores = DomainScores::default();
        for domain in Domain::ALL {
            let score = match domain {
                Domain::Training => self.training.score(),
                Domain::Diet => self.diet.score(),
                Domain::Finance => self.finance.score(),
                Domain::Academics => self.academics.score(),
                Domain::Spiritual => self.spiritual.score(),
                Domain::Mental => self.mental.score(),
                Domain::Content => self.content.score(),
            };
            scores.set(domain, score);
        }
        scores
    }

    /// Run the matching updater, replacing that one module's state.
    /// Returns the violation the update raised, if any.
    pub fn apply(&mut self, payload: &ExecutionPayload) -> Option<Violation> {
        fn step<S: ModuleUpdater>(
            slot: &mut S,
            payload: &S::Payload,
            mental: &MentalState,
        ) -> Option<Violation> {
            let update = slot.apply(payload, mental);
            *slot = update.state;
            update.violation
        }

        let mental = self.mental.clone();
        match payload {
            ExecutionPayload::Training(p) => step(&mut self.training, p, &mental),
            ExecutionPayload::Diet(p) => step(&mut self.diet, p, &mental),
            ExecutionPayload::Finance(p) => step(&mut self.finance, p, &mental),
            ExecutionPayload::Academics(p) => step(&mut self.academics, p, &mental),
            ExecutionPayload::Spiritual(p) => step(&mut self.spiritual, p, &mental),
            ExecutionPayload::Mental(p) => step(&mut self.mental, p, &mental),
            ExecutionPayload::Content(p) => step(&mut self.content, p, &mental),
        }
    }

    /// Trim trend vectors to the configured rolling windows.
    pub fn enforce_retention(&mut self, retention: &RetentionConfig) {
        enforce_cap(&mut self.diet.weekly_weight_trend, retention.weight_trend);
        enforce_cap(&mut self.training.performance_trend, retention.trend);
        for exercise in &mut self.training.exercises {
            enforce_cap(&mut exercise.history, retention.trend);
        }
        enforce_cap(&mut self.finance.growth_trend, retention.trend);
        enforce_cap(&mut self.academics.mastery_trend, retention.trend);
        enforce_cap(&mut self.academics.grade_trend, retention.trend);
        enforce_cap(&mut self.spiritual.confession_log, retention.trend);
        enforce_cap(&mut self.mental.stability_trend, retention.trend);
        enforce_cap(&mut self.mental.mood_trend, retention.trend);
        enforce_cap(&mut self.mental.trigger_log, retention.trend);
    }

    /// Every module score clamped to [0, 100].
    pub fn clamp_scores(&mut self) {
        use crate::num::clamp_score;
        self.training.score = clamp_score(self.training.score);
        self.diet.score = clamp_score(self.diet.score);
        self.finance.score = clamp_score(self.finance.score);
        self.academics.score = clamp_score(self.academics.score);
        self.spiritual.score = clamp_score(self.spiritual.score);
        self.mental.score = clamp_score(self.mental.score);
        self.content.score = clamp_score(self.content.score);
    }
}
