//! The engine facade.
//!
//! One trigger at a time runs to completion:
//!
//! ```text
//! submit_execution:  validate -> module update -> violation -> xp
//!                    -> aggregate (+history) -> indices -> projections -> save
//! daily_evaluation:  aggregate (+history) -> discipline transition
//!                    -> indices -> projections -> day + 1 -> save
//! ```
//!
//! A rejected submission changes nothing but the event log.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregator::ScoreAggregator;
use crate::discipline::{growth_index, stability_index, DisciplineTracker};
use crate::domain::{Domain, DomainScores};
use crate::error::{Result, ValidationError};
use crate::events::{Event, LogEntry};
use crate::mentor::{MentorAdvisor, MentorContext, MentorDirective, MentorInputs};
use crate::modules::{DayType, DietGuide, ExecutionPayload, GuidedSession, Macros};
use crate::num::enforce_cap;
use crate::projection::{ProjectionEstimator, ProjectionInputs, HIGH_RISK_FLAG};
use crate::report::{ReportFormat, WeeklyReport};
use crate::state::{AlertState, Snapshot};
use crate::storage::{Config, SnapshotStore};
use crate::validator::ExecutionValidator;

const STRICT_MIN_STUDY_HOURS: f64 = 2.0;
const STRICT_MIN_PRAYERS: u32 = 1;

/// Result of one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp_granted: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_score: Option<f64>,
}

impl SubmissionOutcome {
    fn rejected(reason: String) -> Self {
        Self {
            accepted: false,
            reason: Some(reason),
            xp_granted: None,
            global_score: None,
        }
    }
}

/// Read-only dashboard view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub current_day: u32,
    pub total_days: u32,
    pub global_score: f64,
    pub xp: u64,
    pub level: u32,
    pub streak: u32,
    pub discipline_index: f64,
    pub stability_index: f64,
    pub growth_index: f64,
    pub alert_state: AlertState,
    pub strict_mode: bool,
    pub per_domain_scores: BTreeMap<Domain, f64>,
    pub high_risk_flag: bool,
}

/// The reduced plan shown while strict mode is on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrictModeView {
    pub day_type: DayType,
    pub calorie_target: f64,
    pub min_study_hours: f64,
    pub min_prayers: u32,
    pub content_blocked: bool,
    pub projections_hidden: bool,
}

pub struct Engine<S: SnapshotStore> {
    config: Config,
    store: S,
    state: Snapshot,
}

impl<S: SnapshotStore> Engine<S> {
    /// Start from a fresh state, ignoring anything the store holds.
    pub fn new(config: Config, store: S) -> Result<Self> {
        config.validate()?;
        let state = Snapshot::initial(&config);
        Ok(Self {
            config,
            store,
            state,
        })
    }

    /// Restore the stored snapshot, or start fresh when there is none.
    pub fn load(config: Config, store: S) -> Result<Self> {
        config.validate()?;
        let state = match store.load()? {
            Some(mut snapshot) => {
                snapshot.normalize(&config);
                debug!(day = snapshot.core.current_day, "snapshot restored");
                snapshot
            }
            None => Snapshot::initial(&config),
        };
        Ok(Self {
            config,
            store,
            state,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.state.logs
    }

    fn strict_mode(&self) -> bool {
        self.state.discipline.strict_mode_enabled
    }

    fn aggregator(&self) -> ScoreAggregator {
        ScoreAggregator::new(self.config.weights, self.config.discipline.under_threshold)
    }

    fn log(&mut self, event: Event) {
        self.state.logs.push(LogEntry::new(event));
        enforce_cap(&mut self.state.logs, self.config.retention.logs);
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.state) {
            warn!(error = %e, "failed to persist snapshot");
        }
    }

    /// Parse an untyped payload as `domain`'s schema, then submit it.
    pub fn submit_json(&mut self, domain: Domain, value: &serde_json::Value) -> SubmissionOutcome {
        match ExecutionPayload::from_json(domain, value) {
            Ok(payload) => self.submit_execution(payload),
            Err(e) => self.reject(domain, e),
        }
    }

    fn reject(&mut self, domain: Domain, error: ValidationError) -> SubmissionOutcome {
        let reason = error.to_string();
        warn!(%domain, %reason, "execution rejected");
        self.log(Event::ExecutionInvalid {
            domain,
            reason: reason.clone(),
        });
        self.persist();
        SubmissionOutcome::rejected(reason)
    }

    pub fn submit_execution(&mut self, payload: ExecutionPayload) -> SubmissionOutcome {
        let domain = payload.domain();
        if let Err(e) = ExecutionValidator::new(self.strict_mode()).validate(&payload) {
            return self.reject(domain, e);
        }

        let violation = self.state.modules.apply(&payload);
        if let Some(violation) = violation {
            let tracker = DisciplineTracker::new(&self.config.discipline);
            let Snapshot {
                core,
                discipline,
                modules,
                ..
            } = &mut self.state;
            let event = tracker.record_violation(violation, core, discipline, &mut modules.mental);
            self.log(event);
        }

        let xp = domain.xp_grant();
        self.state.core.grant_xp(xp);

        self.aggregate_pass();
        self.refresh_indices();

        if domain == Domain::Training && self.state.modules.training.deload_suggested() {
            let fatigue_index = self.state.modules.training.fatigue_index;
            info!(fatigue_index, "deload suggested");
            self.log(Event::DeloadSuggested { fatigue_index });
        }

        let global_score = self.state.core.global_score;
        info!(%domain, xp, global_score, "execution accepted");
        self.log(Event::ExecutionAccepted {
            domain,
            xp_granted: xp,
            global_score,
        });
        self.state.enforce_retention(&self.config);
        self.persist();

        SubmissionOutcome {
            accepted: true,
            reason: None,
            xp_granted: Some(xp),
            global_score: Some(global_score),
        }
    }

    /// Aggregate current module scores and append the result to history.
    fn aggregate_pass(&mut self) {
        self.state.modules.clamp_scores();
        let aggregate = self
            .aggregator()
            .aggregate(&self.state.modules.scores(), self.strict_mode());
        let core = &mut self.state.core;
        core.global_score = aggregate.global_score;
        core.alert_state = aggregate.alert_state;
        core.score_history.push(aggregate.global_score);
        enforce_cap(&mut core.score_history, self.config.retention.score_history);
        debug!(
            global_score = aggregate.global_score,
            alert_state = aggregate.alert_state.as_str(),
            under_threshold = aggregate.under_threshold,
            "aggregated"
        );
    }

    /// Stability, growth and projections from the latest aggregate.
    fn refresh_indices(&mut self) {
        let core = &mut self.state.core;
        let mental = &self.state.modules.mental;
        core.stability_index = stability_index(mental);
        core.growth_index = growth_index(core.global_score, &core.score_history);
        let inputs = ProjectionInputs {
            global_score: core.global_score,
            discipline_index: core.discipline_index,
            stability_index: core.stability_index,
            relapse_count: mental.relapse_count,
            relapse_alert: mental.relapse_alert(),
        };
        self.state.projections = ProjectionEstimator.estimate(&inputs, &core.score_history);
    }

    /// The once-per-day tick. Returns the discipline events it produced.
    pub fn daily_evaluation(&mut self) -> Vec<Event> {
        let now = Utc::now();
        self.aggregate_pass();

        let tracker = DisciplineTracker::new(&self.config.discipline);
        let events = tracker.daily_transition(
            &mut self.state.core,
            &mut self.state.discipline,
            &self.state.modules,
            now,
        );
        for event in &events {
            self.log(event.clone());
        }

        self.refresh_indices();
        let core = &mut self.state.core;
        core.current_day = core.current_day.saturating_add(1);
        core.last_evaluation_date = Some(now);
        info!(
            day = core.current_day,
            global_score = core.global_score,
            alert_state = core.alert_state.as_str(),
            "daily evaluation complete"
        );

        self.state.enforce_retention(&self.config);
        self.persist();
        events
    }

    pub fn guided_session(&self) -> GuidedSession {
        self.state.modules.training.guided_session()
    }

    pub fn diet_guide(&self, consumed: &Macros) -> DietGuide {
        self.state.modules.diet.guide(consumed)
    }

    /// Module scores as aggregation sees them.
    fn effective_scores(&self) -> DomainScores {
        self.aggregator()
            .effective_scores(&self.state.modules.scores(), self.strict_mode())
    }

    pub fn mentor_directive(&self, context: &MentorContext) -> MentorDirective {
        let scores = self.effective_scores();
        let core = &self.state.core;
        let inputs = MentorInputs {
            scores: &scores,
            alert_state: core.alert_state,
            strict_mode: self.strict_mode(),
            violations_since_evaluation: self.state.discipline.violations_since_evaluation,
            discipline_index: core.discipline_index,
            growth_index: core.growth_index,
            day_type: self.state.modules.training.day_type,
        };
        MentorAdvisor::new(self.config.mentor.weak_domain_threshold).directive(&inputs, context)
    }

    pub fn dashboard(&self) -> DashboardSnapshot {
        let core = &self.state.core;
        DashboardSnapshot {
            current_day: core.current_day,
            total_days: core.total_days,
            global_score: core.global_score,
            xp: core.xp,
            level: core.level,
            streak: core.streak,
            discipline_index: core.discipline_index,
            stability_index: core.stability_index,
            growth_index: core.growth_index,
            alert_state: core.alert_state,
            strict_mode: self.strict_mode(),
            per_domain_scores: self.effective_scores().to_map(),
            high_risk_flag: self.state.projections.regression_risk > HIGH_RISK_FLAG,
        }
    }

    /// `None` unless strict mode is on.
    pub fn strict_mode_view(&self) -> Option<StrictModeView> {
        if !self.strict_mode() {
            return None;
        }
        Some(StrictModeView {
            day_type: self.state.modules.training.day_type,
            calorie_target: self.state.modules.diet.calorie_target,
            min_study_hours: STRICT_MIN_STUDY_HOURS,
            min_prayers: STRICT_MIN_PRAYERS,
            content_blocked: true,
            projections_hidden: true,
        })
    }

    pub fn weekly_report(&self) -> WeeklyReport {
        WeeklyReport::from_snapshot(&self.state)
    }

    pub fn export_weekly_report(&self, format: ReportFormat) -> Result<String> {
        self.weekly_report().render(format)
    }

    /// Discard all progress and persist the initial state.
    pub fn reset(&mut self) {
        self.state = Snapshot::initial(&self.config);
        info!("state reset");
        self.persist();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn engine() -> Engine<MemoryStore> {
        Engine::new(Config::default(), MemoryStore::new()).unwrap()
    }

    #[test]
    fn accepted_submission_grants_xp_and_history() {
        let mut engine = engine();
        let outcome = engine.submit_json(
            Domain::Spiritual,
            &json!({ "prayed": true, "relapse": false, "sacramental_frequency": 2 }),
        );
        assert!(outcome.accepted);
        assert_eq!(outcome.xp_granted, Some(35));
        assert_eq!(engine.snapshot().core.xp, 35);
        assert_eq!(engine.snapshot().core.score_history.len(), 1);
        assert!(engine.store().raw().is_some());
        assert!(matches!(
            engine.logs().last().map(|l| &l.event),
            Some(Event::ExecutionAccepted { .. })
        ));
    }

    #[test]
    fn rejected_submission_only_logs() {
        let mut engine = engine();
        let before = engine.snapshot().clone();
        let outcome = engine.submit_json(Domain::Mental, &json!({}));
        assert!(!outcome.accepted);
        assert!(outcome.reason.unwrap().contains("emotional_volatility"));
        let after = engine.snapshot();
        assert_eq!(after.core, before.core);
        assert_eq!(after.modules, before.modules);
        assert_eq!(after.logs.len(), 1);
    }

    #[test]
    fn violation_lands_before_aggregation() {
        let mut engine = engine();
        engine.submit_json(
            Domain::Finance,
            &json!({ "monthly_income": 3000, "monthly_expenses": 2000, "gambling": true }),
        );
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.modules.mental.relapse_count, 1);
        assert_eq!(snapshot.discipline.violations_since_evaluation, 1);
        assert!(engine
            .logs()
            .iter()
            .any(|l| matches!(l.event, Event::ViolationRecorded { .. })));
    }

    #[test]
    fn strict_mode_view_only_when_strict() {
        let mut engine = engine();
        assert!(engine.strict_mode_view().is_none());
        engine.state.discipline.strict_mode_enabled = true;
        let view = engine.strict_mode_view().unwrap();
        assert!(view.content_blocked);
        assert_eq!(view.calorie_target, 2243.0);
    }

    #[test]
    fn daily_evaluation_advances_day() {
        let mut engine = engine();
        let events = engine.daily_evaluation();
        let core = &engine.snapshot().core;
        assert_eq!(core.current_day, 2);
        assert!(core.last_evaluation_date.is_some());
        // every module starts at zero, so the first day fails
        assert!(matches!(events[0], Event::DayFailed { .. }));
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut engine = engine();
        engine.daily_evaluation();
        engine.reset();
        assert_eq!(engine.snapshot(), &Snapshot::initial(&Config::default()));
    }
}
