use serde::{Deserialize, Serialize};

use super::{MentalState, ModuleUpdate, ModuleUpdater};
use crate::domain::Domain;
use crate::error::ValidationError;
use crate::num::{clamp_score, mean, tail};
use crate::validator::{at_most, in_range, positive};

const AUTHORITY_WINDOW: usize = 4;
const SUSTAINED_MASTERY: f64 = 80.0;
const HIGH_GRADE: f64 = 8.0;
const DEFAULT_TARGET_HOURS: f64 = 14.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    /// 0-100
    pub mastery_score: f64,
    /// 0-10
    #[serde(default)]
    pub exam_performance: f64,
    #[serde(default)]
    pub revision_cycle_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicsPayload {
    pub study_hours_week: f64,
    #[serde(default)]
    pub target_hours: Option<f64>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    /// 0-10; falls back to the subjects' average exam performance.
    #[serde(default)]
    pub average_grade: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcademicsState {
    pub score: f64,
    pub study_hours_week: f64,
    pub study_hours_total: f64,
    pub target_hours_week: f64,
    pub subjects: Vec<Subject>,
    pub authority_index: f64,
    pub mastery_trend: Vec<f64>,
    pub grade_trend: Vec<f64>,
}

impl Default for AcademicsState {
    fn default() -> Self {
        Self {
            score: 0.0,
            study_hours_week: 0.0,
            study_hours_total: 0.0,
            target_hours_week: DEFAULT_TARGET_HOURS,
            subjects: Vec::new(),
            authority_index: 0.0,
            mastery_trend: Vec::new(),
            grade_trend: Vec::new(),
        }
    }
}

impl AcademicsState {
    pub fn average_mastery(&self) -> f64 {
        mean(&self.subjects.iter().map(|s| s.mastery_score).collect::<Vec<_>>())
    }

    /// Sustained high mastery pins authority at 80; otherwise it follows the
    /// recent mastery average. High grades add 20.
    fn authority(&self, grade: f64) -> f64 {
        let recent = tail(&self.mastery_trend, AUTHORITY_WINDOW);
        let sustained =
            recent.len() == AUTHORITY_WINDOW && recent.iter().all(|m| *m >= SUSTAINED_MASTERY);
        let base = if sustained {
            SUSTAINED_MASTERY
        } else {
            mean(recent)
        };
        let grade_bonus = if grade >= HIGH_GRADE { 20.0 } else { 0.0 };
        clamp_score(base + grade_bonus)
    }
}

impl ModuleUpdater for AcademicsState {
    type Payload = AcademicsPayload;
    const DOMAIN: Domain = Domain::Academics;

    fn validate(payload: &AcademicsPayload) -> Result<(), ValidationError> {
        in_range("study_hours_week", payload.study_hours_week, 0.0, 168.0)?;
        if let Some(target) = payload.target_hours {
            positive("target_hours", target)?;
            at_most("target_hours", target, 168.0)?;
        }
        if let Some(grade) = payload.average_grade {
            in_range("average_grade", grade, 0.0, 10.0)?;
        }
        for (i, subject) in payload.subjects.iter().enumerate() {
            if subject.name.trim().is_empty() {
                return Err(ValidationError::invalid(
                    format!("subjects[{i}].name"),
                    "must not be blank",
                ));
            }
            in_range(&format!("subjects[{i}].mastery_score"), subject.mastery_score, 0.0, 100.0)?;
            in_range(
                &format!("subjects[{i}].exam_performance"),
                subject.exam_performance,
                0.0,
                10.0,
            )?;
        }
        Ok(())
    }

    fn apply(&self, payload: &AcademicsPayload, _mental: &MentalState) -> ModuleUpdate<Self> {
        let mut next = self.clone();
        next.study_hours_week = payload.study_hours_week;
        next.study_hours_total += payload.study_hours_week;
        if let Some(target) = payload.target_hours {
            next.target_hours_week = target;
        }
        if !payload.subjects.is_empty() {
            next.subjects = payload.subjects.clone();
        }

        let mastery = next.average_mastery();
        next.mastery_trend.push(mastery);

        let grade = payload.average_grade.unwrap_or_else(|| {
            mean(
                &next
                    .subjects
                    .iter()
                    .map(|s| s.exam_performance)
                    .collect::<Vec<_>>(),
            )
        });
        next.grade_trend.push(grade);
        next.authority_index = next.authority(grade);

        let hours_ratio = if next.target_hours_week > 0.0 {
            (next.study_hours_week / next.target_hours_week).min(1.0)
        } else {
            1.0
        };
        next.score = clamp_score(40.0 * hours_ratio + 0.4 * mastery + 0.2 * next.authority_index);

        ModuleUpdate::clean(next)
    }

    fn score(&self) -> f64 {
        self.score
    }
}
