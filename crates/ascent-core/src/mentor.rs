//! Priority-ordered mentor rules. The first rule that matches produces the
//! directive; nothing is blended.

use serde::{Deserialize, Serialize};

use crate::domain::{Domain, DomainScores};
use crate::modules::DayType;
use crate::state::AlertState;

/// Caller-supplied context for a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MentorContext {
    /// A relapse or binge happened and has not been submitted yet.
    pub relapse: bool,
    /// Today's training session has not been done.
    pub training_pending: bool,
}

/// Which rule produced a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentorRule {
    WeakDomain,
    StrictNotice,
    TrainingPending,
    Encouragement,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentorDirective {
    pub rule: MentorRule,
    pub message: String,
}

/// Everything the rules read, borrowed from engine state.
#[derive(Debug, Clone, Copy)]
pub struct MentorInputs<'a> {
    pub scores: &'a DomainScores,
    pub alert_state: AlertState,
    pub strict_mode: bool,
    pub violations_since_evaluation: u32,
    pub discipline_index: f64,
    pub growth_index: f64,
    pub day_type: DayType,
}

const ENCOURAGEMENT_DISCIPLINE: f64 = 75.0;

fn corrective(domain: Domain, score: f64) -> String {
    let action = match domain {
        Domain::Training => "run the guided session and hit every target rep",
        Domain::Diet => "cut carbs by 20g tomorrow and hit the protein target",
        Domain::Finance => "cut discretionary spending and log every expense",
        Domain::Academics => "schedule a study block before anything else",
        Domain::Spiritual => "pray before the day starts",
        Domain::Mental => "sleep early and log every trigger",
        Domain::Content => "publish one piece this week",
    };
    format!("{domain} is at {score:.0}: {action}.")
}

#[derive(Debug, Clone, Copy)]
pub struct MentorAdvisor {
    weak_domain_threshold: f64,
}

impl MentorAdvisor {
    pub fn new(weak_domain_threshold: f64) -> Self {
        Self {
            weak_domain_threshold,
        }
    }

    pub fn directive(&self, inputs: &MentorInputs<'_>, context: &MentorContext) -> MentorDirective {
        // Content is zeroed under strict mode; it is not a correction target then.
        let weakest = inputs
            .scores
            .weakest(|d| !(inputs.strict_mode && !d.is_essential()));
        if let Some((domain, score)) = weakest {
            if score < self.weak_domain_threshold {
                return MentorDirective {
                    rule: MentorRule::WeakDomain,
                    message: corrective(domain, score),
                };
            }
        }

        if context.relapse
            || inputs.violations_since_evaluation > 0
            || inputs.alert_state == AlertState::Failed
        {
            let message = if inputs.strict_mode {
                "Failure recorded. Strict mode is active."
            } else {
                "Failure recorded. Repeated failures put you in strict mode: essentials only."
            };
            return MentorDirective {
                rule: MentorRule::StrictNotice,
                message: message.to_string(),
            };
        }

        if context.training_pending {
            return MentorDirective {
                rule: MentorRule::TrainingPending,
                message: format!(
                    "Run {} now. The guided session is ready.",
                    inputs.day_type.as_str()
                ),
            };
        }

        if inputs.discipline_index >= ENCOURAGEMENT_DISCIPLINE && inputs.growth_index > 0.0 {
            return MentorDirective {
                rule: MentorRule::Encouragement,
                message: "Real progress. Keep going.".to_string(),
            };
        }

        MentorDirective {
            rule: MentorRule::Default,
            message: "Complete the remaining required tasks and submit complete data.".to_string(),
        }
    }
}

impl Default for MentorAdvisor {
    fn default() -> Self {
        Self::new(40.0)
    }
}
