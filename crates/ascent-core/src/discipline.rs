//! Discipline state machine.
//!
//! ## State Transitions
//!
//! Runs once per daily evaluation, driven by the current alert state:
//!
//! ```text
//! FAILED day:   streak = 0, failed_days += 1, restriction += 1, xp -= penalty
//! other days:   streak += 1, xp += bonus
//! every day:    strict mode ON and exit predicate holds
//!                                           -> restriction -= 1, strict mode OFF
//!               restriction >= entry level  -> strict mode ON
//! ```
//!
//! An exit that leaves restriction at or above the entry level only eases the
//! level; strict mode stays on until the level drops below it.
//!
//! Violations (binge, relapse, gambling) are consumed here and nowhere else.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::events::{Event, Violation};
use crate::modules::{MentalState, ModuleStates};
use crate::num::{clamp_score, mean_last, tail};
use crate::state::{AlertState, CoreState, DisciplineState};
use crate::storage::DisciplineConfig;

/// Window used by the rolling discipline and stability averages.
pub const INDEX_WINDOW: usize = 7;
/// Cycles back used by the growth index.
const GROWTH_LOOKBACK: usize = 7;
const RELAPSE_STABILITY_WEIGHT: f64 = 2.0;

/// `clamp(0.4·streak + 0.4·avg(last 7 history) − 0.2·failed_days)`
pub fn discipline_index(streak: u32, history: &[f64], failed_days: u32) -> f64 {
    clamp_score(
        0.4 * f64::from(streak) + 0.4 * mean_last(history, INDEX_WINDOW)
            - 0.2 * f64::from(failed_days),
    )
}

/// Recent mental stability, discounted by volatility and relapses.
pub fn stability_index(mental: &MentalState) -> f64 {
    clamp_score(
        mean_last(&mental.stability_trend, INDEX_WINDOW)
            - 0.5 * mental.emotional_volatility_index
            - RELAPSE_STABILITY_WEIGHT * f64::from(mental.relapse_count),
    )
}

/// Five times the score change over the last seven cycles; zero until the
/// history is long enough.
pub fn growth_index(global_score: f64, history: &[f64]) -> f64 {
    let n = history.len();
    if n <= GROWTH_LOOKBACK {
        return 0.0;
    }
    clamp_score(5.0 * (global_score - history[n - 1 - GROWTH_LOOKBACK]))
}

#[derive(Debug, Clone, Copy)]
pub struct DisciplineTracker<'a> {
    config: &'a DisciplineConfig,
}

impl<'a> DisciplineTracker<'a> {
    pub fn new(config: &'a DisciplineConfig) -> Self {
        Self { config }
    }

    /// Apply a violation: bump the shared relapse counter and dock the
    /// discipline index immediately.
    pub fn record_violation(
        &self,
        violation: Violation,
        core: &mut CoreState,
        discipline: &mut DisciplineState,
        mental: &mut MentalState,
    ) -> Event {
        mental.record_relapse();
        let penalty = self.config.violation_penalty(violation.kind);
        core.discipline_index = clamp_score(core.discipline_index - penalty);
        discipline.violations_since_evaluation =
            discipline.violations_since_evaluation.saturating_add(1);
        warn!(
            kind = violation.kind.as_str(),
            domain = %violation.domain,
            relapse_count = mental.relapse_count,
            "violation recorded"
        );
        Event::ViolationRecorded {
            violation,
            relapse_count: mental.relapse_count,
            discipline_index: core.discipline_index,
        }
    }

    /// Whether strict mode may be lifted right now.
    pub fn exit_ready(&self, core: &CoreState, modules: &ModuleStates) -> bool {
        let window = tail(&core.score_history, self.config.strict_exit_window);
        let min = self.config.strict_exit_min_score;
        let history_ok =
            window.len() == self.config.strict_exit_window && window.iter().all(|s| *s >= min);
        let clean = modules.mental.relapse_count == 0;
        let core_domains_ok = !self.config.exit_requires_core_domains
            || (modules.training.score >= min && modules.diet.score >= min);
        history_ok && clean && core_domains_ok
    }

    /// The once-per-day transition. Returns the events it produced.
    pub fn daily_transition(
        &self,
        core: &mut CoreState,
        discipline: &mut DisciplineState,
        modules: &ModuleStates,
        now: DateTime<Utc>,
    ) -> Vec<Event> {
        let mut events = Vec::new();

        if core.alert_state == AlertState::Failed {
            core.streak = 0;
            discipline.failed_days_count = discipline.failed_days_count.saturating_add(1);
            discipline.restriction_level = discipline.restriction_level.saturating_add(1);
            discipline.last_penalty_date = Some(now);
            core.deduct_xp(self.config.failure_xp_penalty);
            info!(
                day = core.current_day,
                restriction_level = discipline.restriction_level,
                "day failed"
            );
            events.push(Event::DayFailed {
                day: core.current_day,
                failed_days: discipline.failed_days_count,
                restriction_level: discipline.restriction_level,
                xp_penalty: self.config.failure_xp_penalty,
            });
        } else {
            core.streak = core.streak.saturating_add(1);
            core.grant_xp(self.config.daily_xp_bonus);
            events.push(Event::DayPassed {
                day: core.current_day,
                streak: core.streak,
                global_score: core.global_score,
            });
        }

        if discipline.strict_mode_enabled && self.exit_ready(core, modules) {
            discipline.restriction_level = discipline.restriction_level.saturating_sub(1);
            if discipline.restriction_level < self.config.strict_entry_level {
                discipline.strict_mode_enabled = false;
                info!(
                    restriction_level = discipline.restriction_level,
                    "strict mode exited"
                );
                events.push(Event::StrictModeExited {
                    restriction_level: discipline.restriction_level,
                });
            } else {
                debug!(
                    restriction_level = discipline.restriction_level,
                    "restriction eased, strict mode held"
                );
            }
        }

        // Holds after every cycle: restriction at or above the entry level
        // means strict mode is on.
        if !discipline.strict_mode_enabled
            && discipline.restriction_level >= self.config.strict_entry_level
        {
            discipline.strict_mode_enabled = true;
            info!(
                restriction_level = discipline.restriction_level,
                "strict mode entered"
            );
            events.push(Event::StrictModeEntered {
                restriction_level: discipline.restriction_level,
            });
        }

        discipline.violations_since_evaluation = 0;
        core.discipline_index = discipline_index(
            core.streak,
            &core.score_history,
            discipline.failed_days_count,
        );
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;
    use crate::events::ViolationKind;

    fn failed_core() -> CoreState {
        CoreState {
            alert_state: AlertState::Failed,
            xp: 100,
            ..CoreState::default()
        }
    }

    #[test]
    fn failed_day_applies_penalties() {
        let config = DisciplineConfig::default();
        let tracker = DisciplineTracker::new(&config);
        let mut core = failed_core();
        core.streak = 5;
        let mut discipline = DisciplineState::default();
        let events =
            tracker.daily_transition(&mut core, &mut discipline, &ModuleStates::default(), Utc::now());
        assert_eq!(core.streak, 0);
        assert_eq!(core.xp, 80);
        assert_eq!(discipline.failed_days_count, 1);
        assert_eq!(discipline.restriction_level, 1);
        assert!(discipline.last_penalty_date.is_some());
        assert!(!discipline.strict_mode_enabled);
        assert!(matches!(events[0], Event::DayFailed { .. }));
    }

    #[test]
    fn three_failures_enter_strict_mode() {
        let config = DisciplineConfig::default();
        let tracker = DisciplineTracker::new(&config);
        let mut core = failed_core();
        let mut discipline = DisciplineState::default();
        let modules = ModuleStates::default();
        let mut events = Vec::new();
        for _ in 0..3 {
            events = tracker.daily_transition(&mut core, &mut discipline, &modules, Utc::now());
        }
        assert_eq!(discipline.restriction_level, 3);
        assert!(discipline.strict_mode_enabled);
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::StrictModeEntered { restriction_level: 3 })));
    }

    #[test]
    fn passing_day_extends_streak() {
        let config = DisciplineConfig::default();
        let tracker = DisciplineTracker::new(&config);
        let mut core = CoreState {
            alert_state: AlertState::Alert,
            streak: 2,
            ..CoreState::default()
        };
        let mut discipline = DisciplineState::default();
        tracker.daily_transition(&mut core, &mut discipline, &ModuleStates::default(), Utc::now());
        assert_eq!(core.streak, 3);
        assert_eq!(core.xp, 5);
    }

    fn strict_ready() -> (CoreState, DisciplineState, ModuleStates) {
        let core = CoreState {
            alert_state: AlertState::Alert,
            score_history: vec![80.0; 7],
            ..CoreState::default()
        };
        let discipline = DisciplineState {
            strict_mode_enabled: true,
            restriction_level: 3,
            ..DisciplineState::default()
        };
        let mut modules = ModuleStates::default();
        modules.training.score = 90.0;
        modules.diet.score = 90.0;
        (core, discipline, modules)
    }

    #[test]
    fn strict_mode_exits_and_decrements() {
        let config = DisciplineConfig::default();
        let tracker = DisciplineTracker::new(&config);
        let (mut core, mut discipline, modules) = strict_ready();
        tracker.daily_transition(&mut core, &mut discipline, &modules, Utc::now());
        assert!(!discipline.strict_mode_enabled);
        assert_eq!(discipline.restriction_level, 2);
    }

    #[test]
    fn high_restriction_eases_before_strict_mode_lifts() {
        let config = DisciplineConfig::default();
        let tracker = DisciplineTracker::new(&config);
        let (mut core, mut discipline, modules) = strict_ready();
        discipline.restriction_level = 4;

        let events = tracker.daily_transition(&mut core, &mut discipline, &modules, Utc::now());
        assert_eq!(discipline.restriction_level, 3);
        assert!(discipline.strict_mode_enabled);
        assert!(!events
            .iter()
            .any(|e| matches!(e, Event::StrictModeExited { .. })));

        let events = tracker.daily_transition(&mut core, &mut discipline, &modules, Utc::now());
        assert_eq!(discipline.restriction_level, 2);
        assert!(!discipline.strict_mode_enabled);
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::StrictModeExited { restriction_level: 2 })));
    }

    #[test]
    fn restriction_at_entry_level_reenters_on_passing_day() {
        let config = DisciplineConfig::default();
        let tracker = DisciplineTracker::new(&config);
        let (mut core, mut discipline, modules) = strict_ready();
        discipline.strict_mode_enabled = false;
        core.score_history = vec![50.0; 7];

        let events = tracker.daily_transition(&mut core, &mut discipline, &modules, Utc::now());
        assert_eq!(core.streak, 1);
        assert!(discipline.strict_mode_enabled);
        assert_eq!(discipline.restriction_level, 3);
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::StrictModeEntered { restriction_level: 3 })));
    }

    #[test]
    fn strict_exit_needs_full_window() {
        let config = DisciplineConfig::default();
        let tracker = DisciplineTracker::new(&config);
        let (mut core, discipline, modules) = strict_ready();
        core.score_history = vec![80.0; 6];
        assert!(!tracker.exit_ready(&core, &modules));
        core.score_history = vec![80.0, 80.0, 80.0, 74.9, 80.0, 80.0, 80.0];
        assert!(!tracker.exit_ready(&core, &modules));
        assert!(discipline.strict_mode_enabled);
    }

    #[test]
    fn strict_exit_blocked_by_relapse() {
        let config = DisciplineConfig::default();
        let tracker = DisciplineTracker::new(&config);
        let (core, _, mut modules) = strict_ready();
        modules.mental.relapse_count = 1;
        assert!(!tracker.exit_ready(&core, &modules));
    }

    #[test]
    fn core_domain_requirement_is_configurable() {
        let (core, _, mut modules) = strict_ready();
        modules.diet.score = 50.0;
        let strict = DisciplineConfig::default();
        assert!(!DisciplineTracker::new(&strict).exit_ready(&core, &modules));
        let lenient = DisciplineConfig {
            exit_requires_core_domains: false,
            ..DisciplineConfig::default()
        };
        assert!(DisciplineTracker::new(&lenient).exit_ready(&core, &modules));
    }

    #[test]
    fn violation_bumps_relapse_and_docks_discipline() {
        let config = DisciplineConfig::default();
        let tracker = DisciplineTracker::new(&config);
        let mut core = CoreState {
            discipline_index: 50.0,
            ..CoreState::default()
        };
        let mut discipline = DisciplineState::default();
        let mut mental = MentalState::default();
        let event = tracker.record_violation(
            Violation {
                kind: ViolationKind::Gambling,
                domain: Domain::Finance,
            },
            &mut core,
            &mut discipline,
            &mut mental,
        );
        assert_eq!(mental.relapse_count, 1);
        assert_eq!(core.discipline_index, 35.0);
        assert_eq!(discipline.violations_since_evaluation, 1);
        assert!(event.is_failure());
    }

    #[test]
    fn index_formulas() {
        assert!((discipline_index(10, &[50.0; 7], 5) - (4.0 + 20.0 - 1.0)).abs() < 1e-9);
        assert_eq!(discipline_index(0, &[], 30), 0.0);

        let history: Vec<f64> = (0..8).map(|i| 50.0 + f64::from(i)).collect();
        // 57 against 50 seven cycles earlier
        assert_eq!(growth_index(57.0, &history), 35.0);
        assert_eq!(growth_index(57.0, &history[1..]), 0.0);

        let mental = MentalState {
            stability_trend: vec![80.0; 7],
            emotional_volatility_index: 20.0,
            relapse_count: 2,
            ..MentalState::default()
        };
        assert_eq!(stability_index(&mental), 66.0);
    }
}
