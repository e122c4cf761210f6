//! Strength training: progressive overload, fatigue and strength indices.
//!
//! A set succeeds when `reps >= target_reps` and `rpe <= 8`. Success adds
//! 2.5% to the next load; a failure holds the load, and only the second
//! consecutive failure on the same exercise drops it by 2.5%.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MentalState, ModuleUpdate, ModuleUpdater};
use crate::domain::Domain;
use crate::error::ValidationError;
use crate::num::{clamp_score, mean, round_to};
use crate::validator::{at_most, in_range, positive};

const PROGRESSION: f64 = 0.025;
const MAX_SUCCESS_RPE: f64 = 8.0;
const DELOAD_FATIGUE: f64 = 80.0;
const DEFAULT_REST_SECONDS: u32 = 120;
const MAX_LOAD_KG: f64 = 1000.0;
const MAX_SETS: u32 = 100;
const MAX_REPS: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DayType {
    #[default]
    Push,
    Pull,
    Legs,
}

impl DayType {
    pub fn next(self) -> Self {
        match self {
            DayType::Push => DayType::Pull,
            DayType::Pull => DayType::Legs,
            DayType::Legs => DayType::Push,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DayType::Push => "PUSH",
            DayType::Pull => "PULL",
            DayType::Legs => "LEGS",
        }
    }
}

/// One performed exercise as submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSet {
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    /// Defaults to `reps` when absent.
    #[serde(default)]
    pub target_reps: Option<u32>,
    /// Kilograms.
    pub load: f64,
    /// Rate of perceived exertion, 0-10.
    pub rpe: f64,
    #[serde(default)]
    pub rest_seconds: Option<u32>,
}

impl ExerciseSet {
    pub fn is_success(&self) -> bool {
        self.reps >= self.target_reps.unwrap_or(self.reps) && self.rpe <= MAX_SUCCESS_RPE
    }

    /// Epley one-rep-max estimate.
    pub fn one_rep_max(&self) -> f64 {
        self.load * (1.0 + f64::from(self.reps) / 30.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPayload {
    #[serde(default)]
    pub day_type: Option<DayType>,
    pub exercises: Vec<ExerciseSet>,
    #[serde(default)]
    pub consecutive_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRecord {
    pub date: DateTime<Utc>,
    pub load: f64,
    pub reps: u32,
}

/// An exercise with its progression state. Exercises persist across
/// sessions; one not trained today keeps its history and failure count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedExercise {
    pub name: String,
    /// Day type of the session it was last trained in.
    #[serde(default)]
    pub day_type: DayType,
    pub sets: u32,
    pub reps: u32,
    pub target_reps: u32,
    pub load: f64,
    pub rpe: f64,
    pub rest_seconds: u32,
    pub next_load: f64,
    #[serde(default)]
    pub consecutive_failures: u32,
    #[serde(default)]
    pub history: Vec<LoadRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthGoal {
    pub exercise: String,
    pub kg: f64,
}

impl Default for StrengthGoal {
    fn default() -> Self {
        Self {
            exercise: "Squat".into(),
            kg: 200.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingState {
    pub score: f64,
    pub day_type: DayType,
    pub sessions_logged: u32,
    pub exercises: Vec<TrackedExercise>,
    pub weekly_volume: f64,
    pub fatigue_index: f64,
    pub strength_index: f64,
    pub long_term_goal: StrengthGoal,
    /// Strength index after each session.
    pub performance_trend: Vec<f64>,
}

impl Default for TrainingState {
    fn default() -> Self {
        Self {
            score: 0.0,
            day_type: DayType::Push,
            sessions_logged: 0,
            exercises: Vec::new(),
            weekly_volume: 0.0,
            fatigue_index: 0.0,
            strength_index: 0.0,
            long_term_goal: StrengthGoal::default(),
            performance_trend: Vec::new(),
        }
    }
}

/// Directives for the current training day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidedSession {
    pub day_type: DayType,
    pub directives: Vec<String>,
    pub strength_index: f64,
    pub long_term_goal: String,
    pub deload_suggested: bool,
}

impl TrainingState {
    pub fn deload_suggested(&self) -> bool {
        self.fatigue_index > DELOAD_FATIGUE
    }

    pub fn exercise(&self, name: &str) -> Option<&TrackedExercise> {
        self.exercises
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Directives for the exercises tracked under the current day type.
    pub fn guided_session(&self) -> GuidedSession {
        let directives = self
            .exercises
            .iter()
            .filter(|ex| ex.day_type == self.day_type)
            .map(|ex| {
                format!(
                    "{}: {}x{} @ {}kg, rest {}s",
                    ex.name, ex.sets, ex.reps, ex.next_load, ex.rest_seconds
                )
            })
            .collect();
        GuidedSession {
            day_type: self.day_type,
            directives,
            strength_index: self.strength_index,
            long_term_goal: format!("{} {}kg", self.long_term_goal.exercise, self.long_term_goal.kg),
            deload_suggested: self.deload_suggested(),
        }
    }
}

/// Next working load after a session.
pub fn next_load(load: f64, success: bool, consecutive_failures: u32) -> f64 {
    let next = if success {
        load * (1.0 + PROGRESSION)
    } else if consecutive_failures >= 2 {
        load * (1.0 - PROGRESSION)
    } else {
        load
    };
    round_to(next, 2)
}

/// Weighted fatigue from volume, effort and training frequency.
pub fn fatigue_index(weekly_volume: f64, avg_rpe: f64, consecutive_days: u32) -> f64 {
    clamp_score(weekly_volume / 500.0 + avg_rpe * 8.0 + f64::from(consecutive_days) * 5.0)
}

impl ModuleUpdater for TrainingState {
    type Payload = TrainingPayload;
    const DOMAIN: Domain = Domain::Training;

    fn validate(payload: &TrainingPayload) -> Result<(), ValidationError> {
        if payload.exercises.is_empty() {
            return Err(ValidationError::EmptyCollection("exercises".into()));
        }
        for (i, ex) in payload.exercises.iter().enumerate() {
            if ex.name.trim().is_empty() {
                return Err(ValidationError::invalid(
                    format!("exercises[{i}].name"),
                    "must not be blank",
                ));
            }
            positive(&format!("exercises[{i}].load"), ex.load)?;
            at_most(&format!("exercises[{i}].load"), ex.load, MAX_LOAD_KG)?;
            in_range(&format!("exercises[{i}].sets"), f64::from(ex.sets), 1.0, f64::from(MAX_SETS))?;
            in_range(&format!("exercises[{i}].reps"), f64::from(ex.reps), 1.0, f64::from(MAX_REPS))?;
            in_range(&format!("exercises[{i}].rpe"), ex.rpe, 0.0, 10.0)?;
            if let Some(target) = ex.target_reps {
                positive(&format!("exercises[{i}].target_reps"), f64::from(target))?;
            }
        }
        Ok(())
    }

    fn apply(&self, payload: &TrainingPayload, _mental: &MentalState) -> ModuleUpdate<Self> {
        let mut next = self.clone();
        let now = Utc::now();

        next.day_type = match payload.day_type {
            Some(day) => day,
            None if self.sessions_logged == 0 => self.day_type,
            None => self.day_type.next(),
        };
        next.sessions_logged = self.sessions_logged.saturating_add(1);

        for ex in &payload.exercises {
            let slot = next
                .exercises
                .iter()
                .position(|e| e.name.eq_ignore_ascii_case(&ex.name));
            let prior = slot.map(|i| &next.exercises[i]);
            let success = ex.is_success();
            let consecutive_failures = if success {
                0
            } else {
                prior.map_or(0, |p| p.consecutive_failures) + 1
            };
            let mut history = prior.map(|p| p.history.clone()).unwrap_or_default();
            history.push(LoadRecord {
                date: now,
                load: ex.load,
                reps: ex.reps,
            });
            let tracked = TrackedExercise {
                name: ex.name.clone(),
                day_type: next.day_type,
                sets: ex.sets,
                reps: ex.reps,
                target_reps: ex.target_reps.unwrap_or(ex.reps),
                load: ex.load,
                rpe: ex.rpe,
                rest_seconds: ex.rest_seconds.unwrap_or(DEFAULT_REST_SECONDS),
                next_load: next_load(ex.load, success, consecutive_failures),
                consecutive_failures,
                history,
            };
            match slot {
                Some(i) => next.exercises[i] = tracked,
                None => next.exercises.push(tracked),
            }
        }

        next.weekly_volume = payload
            .exercises
            .iter()
            .map(|ex| f64::from(ex.sets) * f64::from(ex.reps) * ex.load)
            .sum();
        let avg_rpe = mean(&payload.exercises.iter().map(|ex| ex.rpe).collect::<Vec<_>>());
        next.fatigue_index = fatigue_index(
            next.weekly_volume,
            avg_rpe,
            payload.consecutive_days.unwrap_or(1),
        );

        let one_rep_max = mean(
            &payload
                .exercises
                .iter()
                .map(ExerciseSet::one_rep_max)
                .collect::<Vec<_>>(),
        );
        next.strength_index = if next.long_term_goal.kg > 0.0 {
            clamp_score(one_rep_max / next.long_term_goal.kg * 100.0)
        } else {
            0.0
        };
        next.performance_trend.push(next.strength_index);

        let effort_bonus = if avg_rpe <= MAX_SUCCESS_RPE { 20.0 } else { 5.0 };
        next.score = clamp_score(
            0.5 * next.strength_index + 0.3 * (100.0 - next.fatigue_index) + effort_bonus,
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

    fn bench(load: f64, reps: u32, rpe: f64) -> ExerciseSet {
        ExerciseSet {
            name: "Bench Press".into(),
            sets: 4,
            reps,
            target_reps: Some(6),
            load,
            rpe,
            rest_seconds: None,
        }
    }

    fn session(ex: ExerciseSet) -> TrainingPayload {
        TrainingPayload {
            day_type: Some(DayType::Push),
            exercises: vec![ex],
            consecutive_days: None,
        }
    }

    #[test]
    fn success_adds_two_and_a_half_percent() {
        let state = TrainingState::default();
        let update = state.apply(&session(bench(80.0, 6, 8.0)), &MentalState::default());
        assert_eq!(update.state.exercises[0].next_load, 82.0);
        assert!(update.violation.is_none());
    }

    #[test]
    fn first_failure_holds_second_failure_drops() {
        let mental = MentalState::default();
        let state = TrainingState::default();
        let first = state.apply(&session(bench(80.0, 4, 9.0)), &mental).state;
        assert_eq!(first.exercises[0].next_load, 80.0);
        assert_eq!(first.exercises[0].consecutive_failures, 1);

        let second = first.apply(&session(bench(80.0, 4, 9.0)), &mental).state;
        assert_eq!(second.exercises[0].next_load, 78.0);
        assert_eq!(second.exercises[0].consecutive_failures, 2);
        assert_eq!(second.exercises[0].history.len(), 2);
    }

    #[test]
    fn rotation_keeps_untrained_exercises() {
        let mental = MentalState::default();
        let row = ExerciseSet {
            name: "Row".into(),
            ..bench(70.0, 6, 7.0)
        };
        let pull = TrainingPayload {
            day_type: Some(DayType::Pull),
            exercises: vec![row],
            consecutive_days: None,
        };
        let state = TrainingState::default()
            .apply(&session(bench(80.0, 4, 9.0)), &mental)
            .state
            .apply(&pull, &mental)
            .state
            .apply(&session(bench(80.0, 4, 9.0)), &mental)
            .state;

        assert_eq!(state.exercises.len(), 2);
        let bench = state.exercise("bench press").unwrap();
        assert_eq!(bench.consecutive_failures, 2);
        assert_eq!(bench.next_load, 78.0);
        assert_eq!(bench.history.len(), 2);
        assert_eq!(state.exercise("Row").unwrap().day_type, DayType::Pull);
    }

    #[test]
    fn success_resets_failure_count() {
        let mental = MentalState::default();
        let failed = TrainingState::default()
            .apply(&session(bench(80.0, 4, 9.0)), &mental)
            .state;
        let recovered = failed.apply(&session(bench(80.0, 6, 7.0)), &mental).state;
        assert_eq!(recovered.exercises[0].consecutive_failures, 0);
        assert_eq!(recovered.exercises[0].next_load, 82.0);
    }

    #[test]
    fn volume_strength_and_score() {
        let update = TrainingState::default()
            .apply(&session(bench(80.0, 6, 8.0)), &MentalState::default());
        let s = update.state;
        assert_eq!(s.weekly_volume, 1920.0);
        // 1920/500 + 8*8 + 5
        assert!((s.fatigue_index - 72.84).abs() < 1e-9);
        // 1RM 96 against a 200kg goal
        assert!((s.strength_index - 48.0).abs() < 1e-9);
        assert!((s.score - (24.0 + 0.3 * (100.0 - 72.84) + 20.0)).abs() < 1e-9);
        assert_eq!(s.performance_trend, vec![48.0]);
    }

    #[test]
    fn heavy_volume_suggests_deload() {
        let mut ex = bench(200.0, 10, 9.5);
        ex.sets = 10;
        let payload = TrainingPayload {
            day_type: None,
            exercises: vec![ex],
            consecutive_days: Some(5),
        };
        let state = TrainingState::default()
            .apply(&payload, &MentalState::default())
            .state;
        assert!(state.deload_suggested());
        assert!(state.score <= 100.0 && state.score >= 0.0);
    }

    #[test]
    fn validation_rejects_zero_load() {
        let err = TrainingState::validate(&session(bench(0.0, 6, 8.0))).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { ref field, .. } if field == "exercises[0].load"));
    }

    #[test]
    fn validation_rejects_empty_session() {
        let payload = TrainingPayload {
            day_type: None,
            exercises: vec![],
            consecutive_days: None,
        };
        assert!(matches!(
            TrainingState::validate(&payload),
            Err(ValidationError::EmptyCollection(_))
        ));
    }

    #[test]
    fn day_type_rotates_when_omitted() {
        let mental = MentalState::default();
        let mut payload = session(bench(80.0, 6, 8.0));
        payload.day_type = None;
        let first = TrainingState::default().apply(&payload, &mental).state;
        assert_eq!(first.day_type, DayType::Push);
        let second = first.apply(&payload, &mental).state;
        assert_eq!(second.day_type, DayType::Pull);
    }

    #[test]
    fn guided_session_lists_next_loads() {
        let state = TrainingState::default()
            .apply(&session(bench(80.0, 6, 8.0)), &MentalState::default())
            .state;
        let guided = state.guided_session();
        assert_eq!(guided.directives, vec!["Bench Press: 4x6 @ 82kg, rest 120s"]);
        assert_eq!(guided.long_term_goal, "Squat 200kg");
    }

    #[test]
    fn guided_session_follows_day_type() {
        let mental = MentalState::default();
        let pull = TrainingPayload {
            day_type: Some(DayType::Pull),
            exercises: vec![ExerciseSet {
                name: "Row".into(),
                ..bench(70.0, 6, 7.0)
            }],
            consecutive_days: None,
        };
        let state = TrainingState::default()
            .apply(&session(bench(80.0, 6, 8.0)), &mental)
            .state
            .apply(&pull, &mental)
            .state;
        let guided = state.guided_session();
        assert_eq!(guided.day_type, DayType::Pull);
        assert_eq!(guided.directives, vec!["Row: 4x6 @ 71.75kg, rest 120s"]);
    }
}
