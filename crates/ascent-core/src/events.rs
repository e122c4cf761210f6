use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Domain;

/// Kind of violation a module update can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationKind {
    Binge,
    Relapse,
    Gambling,
}

impl ViolationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationKind::Binge => "binge",
            ViolationKind::Relapse => "relapse",
            ViolationKind::Gambling => "gambling",
        }
    }
}

/// A violation emitted by a module updater.
///
/// Updaters never touch other domains; they hand this back and the
/// discipline tracker consumes it exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub domain: Domain,
}

/// Every state change in the engine produces an Event.
/// Events are kept in the snapshot log and drive the weekly report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    ExecutionAccepted {
        domain: Domain,
        xp_granted: u64,
        global_score: f64,
    },
    ExecutionInvalid {
        domain: Domain,
        reason: String,
    },
    ViolationRecorded {
        violation: Violation,
        relapse_count: u32,
        discipline_index: f64,
    },
    DeloadSuggested {
        fatigue_index: f64,
    },
    DayPassed {
        day: u32,
        streak: u32,
        global_score: f64,
    },
    DayFailed {
        day: u32,
        failed_days: u32,
        restriction_level: u32,
        xp_penalty: u64,
    },
    StrictModeEntered {
        restriction_level: u32,
    },
    StrictModeExited {
        restriction_level: u32,
    },
}

impl Event {
    /// Human-readable one-line description.
    pub fn message(&self) -> String {
        match self {
            Event::ExecutionAccepted {
                domain,
                xp_granted,
                global_score,
            } => format!("{domain} execution accepted: +{xp_granted} xp, global score {global_score:.1}"),
            Event::ExecutionInvalid { domain, reason } => {
                format!("{domain} execution rejected: {reason}")
            }
            Event::ViolationRecorded {
                violation,
                relapse_count,
                discipline_index,
            } => format!(
                "{} violation in {}: relapse count {relapse_count}, discipline {discipline_index:.1}",
                violation.kind.as_str(),
                violation.domain
            ),
            Event::DeloadSuggested { fatigue_index } => {
                format!("Deload suggested: fatigue index {fatigue_index:.1} > 80")
            }
            Event::DayPassed {
                day,
                streak,
                global_score,
            } => format!("Day {day} passed: streak {streak}, global score {global_score:.1}"),
            Event::DayFailed {
                day,
                failed_days,
                restriction_level,
                xp_penalty,
            } => format!(
                "Day {day} failed: -{xp_penalty} xp, {failed_days} failed days, restriction level {restriction_level}"
            ),
            Event::StrictModeEntered { restriction_level } => {
                format!("Strict mode entered at restriction level {restriction_level}")
            }
            Event::StrictModeExited { restriction_level } => {
                format!("Strict mode exited, restriction level now {restriction_level}")
            }
        }
    }

    /// Whether this event marks a failure point for reporting.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Event::ViolationRecorded { .. } | Event::DayFailed { .. } | Event::StrictModeEntered { .. }
        )
    }
}

/// Append-only log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event: Event,
}

impl LogEntry {
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }

    pub fn message(&self) -> String {
        self.event.message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_with_type_tag() {
        let event = Event::ExecutionInvalid {
            domain: Domain::Training,
            reason: "bad load".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "execution_invalid");
        assert_eq!(json["domain"], "training");
    }

    #[test]
    fn failure_events_are_flagged() {
        let failed = Event::DayFailed {
            day: 3,
            failed_days: 3,
            restriction_level: 3,
            xp_penalty: 20,
        };
        assert!(failed.is_failure());
        assert!(failed.message().contains("Day 3 failed"));
        let passed = Event::DayPassed {
            day: 1,
            streak: 1,
            global_score: 80.0,
        };
        assert!(!passed.is_failure());
    }
}
