//! Execution gatekeeping.
//!
//! Validation is a pure predicate: it never mutates state. The engine logs a
//! rejection and returns before any module, xp or history change.

use crate::error::ValidationError;
use crate::modules::{
    AcademicsState, ContentState, DietState, ExecutionPayload, FinanceState, MentalState,
    ModuleUpdater, SpiritualState, TrainingState,
};

pub(crate) fn finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::invalid(field, "must be a finite number"))
    }
}

pub(crate) fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::invalid(field, format!("must be positive, got {value}")))
    }
}

pub(crate) fn at_most(field: &str, value: f64, max: f64) -> Result<(), ValidationError> {
    finite(field, value)?;
    if value <= max {
        Ok(())
    } else {
        Err(ValidationError::invalid(
            field,
            format!("must not exceed {max}, got {value}"),
        ))
    }
}

pub(crate) fn in_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    finite(field, value)?;
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::invalid(
            field,
            format!("must be within [{min}, {max}], got {value}"),
        ))
    }
}

/// Structural and policy checks for incoming executions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionValidator {
    strict_mode: bool,
}

impl ExecutionValidator {
    pub fn new(strict_mode: bool) -> Self {
        Self { strict_mode }
    }

    pub fn validate(&self, payload: &ExecutionPayload) -> Result<(), ValidationError> {
        let domain = payload.domain();
        if self.strict_mode && !domain.is_essential() {
            return Err(ValidationError::Blocked {
                domain: domain.to_string(),
            });
        }
        match payload {
            ExecutionPayload::Training(p) => TrainingState::validate(p),
            ExecutionPayload::Diet(p) => DietState::validate(p),
            ExecutionPayload::Finance(p) => FinanceState::validate(p),
            ExecutionPayload::Academics(p) => AcademicsState::validate(p),
            ExecutionPayload::Spiritual(p) => SpiritualState::validate(p),
            ExecutionPayload::Mental(p) => MentalState::validate(p),
            ExecutionPayload::Content(p) => ContentState::validate(p),
        }
    }
}
