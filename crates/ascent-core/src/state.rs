//! Engine state and its persisted snapshot form.
//!
//! ## Alert bands
//!
//! | Domains under 60 | Alert state | Score multiplier |
//! |------------------|-------------|------------------|
//! | 0                | NORMAL      | 1.00             |
//! | 1                | ALERT       | 0.85             |
//! | 2                | RESTRICTED  | 0.65             |
//! | 3+               | FAILED      | 0.40             |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SnapshotError};
use crate::events::LogEntry;
use crate::modules::ModuleStates;
use crate::num::{clamp_score, enforce_cap};
use crate::storage::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertState {
    #[default]
    Normal,
    Alert,
    Restricted,
    Failed,
}

impl AlertState {
    /// Band for a count of under-performing domains.
    pub fn from_under_count(under: usize) -> Self {
        match under {
            0 => AlertState::Normal,
            1 => AlertState::Alert,
            2 => AlertState::Restricted,
            _ => AlertState::Failed,
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            AlertState::Normal => 1.0,
            AlertState::Alert => 0.85,
            AlertState::Restricted => 0.65,
            AlertState::Failed => 0.4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AlertState::Normal => "NORMAL",
            AlertState::Alert => "ALERT",
            AlertState::Restricted => "RESTRICTED",
            AlertState::Failed => "FAILED",
        }
    }
}

/// `1 + floor(sqrt(xp / 50))`
pub fn level_for_xp(xp: u64) -> u32 {
    1 + (xp as f64 / 50.0).sqrt().floor() as u32
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreState {
    pub current_day: u32,
    pub total_days: u32,
    pub xp: u64,
    pub level: u32,
    pub global_score: f64,
    pub discipline_index: f64,
    pub stability_index: f64,
    pub growth_index: f64,
    pub streak: u32,
    pub alert_state: AlertState,
    pub last_evaluation_date: Option<DateTime<Utc>>,
    /// One composite score per recompute pass, oldest first.
    pub score_history: Vec<f64>,
}

impl Default for CoreState {
    fn default() -> Self {
        Self {
            current_day: 1,
            total_days: 90,
            xp: 0,
            level: 1,
            global_score: 0.0,
            discipline_index: 0.0,
            stability_index: 0.0,
            growth_index: 0.0,
            streak: 0,
            alert_state: AlertState::Normal,
            last_evaluation_date: None,
            score_history: Vec::new(),
        }
    }
}

impl CoreState {
    pub fn grant_xp(&mut self, amount: u64) {
        self.xp = self.xp.saturating_add(amount);
        self.level = level_for_xp(self.xp);
    }

    /// Deduct xp, never below zero.
    pub fn deduct_xp(&mut self, amount: u64) {
        self.xp = self.xp.saturating_sub(amount);
        self.level = level_for_xp(self.xp);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisciplineState {
    pub strict_mode_enabled: bool,
    pub failed_days_count: u32,
    pub restriction_level: u32,
    pub last_penalty_date: Option<DateTime<Utc>>,
    /// Violations recorded since the last daily evaluation.
    pub violations_since_evaluation: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionState {
    pub growth_velocity: f64,
    pub projected_90_days_score: f64,
    pub projected_3_years_score: f64,
    pub regression_risk: f64,
}

impl Default for ProjectionState {
    fn default() -> Self {
        Self {
            growth_velocity: 0.0,
            projected_90_days_score: 0.0,
            projected_3_years_score: 0.0,
            regression_risk: 50.0,
        }
    }
}

/// Everything the engine persists, versioned for forward-safe restores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub version: u32,
    pub core: CoreState,
    pub modules: ModuleStates,
    pub discipline: DisciplineState,
    pub projections: ProjectionState,
    pub logs: Vec<LogEntry>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            core: CoreState::default(),
            modules: ModuleStates::default(),
            discipline: DisciplineState::default(),
            projections: ProjectionState::default(),
            logs: Vec::new(),
        }
    }
}

impl Snapshot {
    pub const CURRENT_VERSION: u32 = 1;

    /// Fresh state for the given configuration.
    pub fn initial(config: &Config) -> Self {
        let mut snapshot = Self::default();
        snapshot.core.total_days = config.horizon.total_days;
        snapshot
    }

    /// Parse a stored snapshot. Missing fields take their defaults; a
    /// snapshot from a newer schema is refused.
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| SnapshotError::Corrupt(e.to_string()))?;
        let version = value
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0) as u32;
        if version > Self::CURRENT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: version,
                supported: Self::CURRENT_VERSION,
            }
            .into());
        }
        let mut snapshot: Snapshot =
            serde_json::from_value(value).map_err(|e| SnapshotError::Corrupt(e.to_string()))?;
        snapshot.version = Self::CURRENT_VERSION;
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Re-derive computed fields and re-apply retention after a restore.
    pub fn normalize(&mut self, config: &Config) {
        self.core.level = level_for_xp(self.core.xp);
        self.core.total_days = config.horizon.total_days;
        self.modules.diet.refresh_targets();
        self.modules.clamp_scores();
        self.core.global_score = clamp_score(self.core.global_score);
        self.core.discipline_index = clamp_score(self.core.discipline_index);
        self.core.stability_index = clamp_score(self.core.stability_index);
        self.core.growth_index = clamp_score(self.core.growth_index);
        self.projections.regression_risk = clamp_score(self.projections.regression_risk);
        self.enforce_retention(config);
    }

    pub fn enforce_retention(&mut self, config: &Config) {
        enforce_cap(&mut self.core.score_history, config.retention.score_history);
        enforce_cap(&mut self.logs, config.retention.logs);
        self.modules.enforce_retention(&config.retention);
    }
}
