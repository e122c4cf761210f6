//! TOML-based engine configuration.
//!
//! Stores the tunable rule set:
//! - Domain aggregation weights
//! - Discipline thresholds, penalties and the strict-mode exit policy
//! - Retention windows for history, logs and trends
//! - Mentor thresholds
//!
//! Configuration is stored at `<data dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::domain::DomainWeights;
use crate::error::{ConfigError, CoreError, Result};
use crate::events::ViolationKind;

/// Shortest history window that still supports the 14-cycle velocity.
pub const MIN_SCORE_HISTORY: usize = 15;

/// Discipline state machine tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisciplineConfig {
    /// A domain below this counts as under-performing.
    pub under_threshold: f64,
    pub strict_entry_level: u32,
    pub strict_exit_window: usize,
    pub strict_exit_min_score: f64,
    /// Also require training and diet at or above the exit score.
    pub exit_requires_core_domains: bool,
    pub failure_xp_penalty: u64,
    pub daily_xp_bonus: u64,
    pub binge_penalty: f64,
    pub relapse_penalty: f64,
    pub gambling_penalty: f64,
}

impl Default for DisciplineConfig {
    fn default() -> Self {
        Self {
            under_threshold: 60.0,
            strict_entry_level: 3,
            strict_exit_window: 7,
            strict_exit_min_score: 75.0,
            exit_requires_core_domains: true,
            failure_xp_penalty: 20,
            daily_xp_bonus: 5,
            binge_penalty: 10.0,
            relapse_penalty: 10.0,
            gambling_penalty: 15.0,
        }
    }
}

impl DisciplineConfig {
    pub fn violation_penalty(&self, kind: ViolationKind) -> f64 {
        match kind {
            ViolationKind::Binge => self.binge_penalty,
            ViolationKind::Relapse => self.relapse_penalty,
            ViolationKind::Gambling => self.gambling_penalty,
        }
    }
}

/// Rolling-window sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub score_history: usize,
    pub logs: usize,
    pub weight_trend: usize,
    pub trend: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            score_history: 90,
            logs: 200,
            weight_trend: 12,
            trend: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MentorConfig {
    pub weak_domain_threshold: f64,
}

impl Default for MentorConfig {
    fn default() -> Self {
        Self {
            weak_domain_threshold: 40.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizonConfig {
    pub total_days: u32,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self { total_days: 90 }
    }
}

/// Engine configuration.
///
/// Serialized to/from TOML at `<data dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub weights: DomainWeights,
    pub discipline: DisciplineConfig,
    pub retention: RetentionConfig,
    pub mentor: MentorConfig,
    pub horizon: HorizonConfig,
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                ),
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<u64>() {
                        serde_json::Value::Number(n.into())
                    } else if let Ok(n) = value.parse::<f64>() {
                        serde_json::Number::from_f64(n)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                    } else {
                        return Err(invalid(format!("cannot parse '{value}' as number")));
                    }
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    return Err(invalid("cannot overwrite a whole section".into()));
                }
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Reject configurations the engine cannot run under.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights
            .validate()
            .map_err(|message| ConfigError::InvalidValue {
                key: "weights".into(),
                message,
            })?;
        if self.retention.score_history < MIN_SCORE_HISTORY {
            return Err(ConfigError::InvalidValue {
                key: "retention.score_history".into(),
                message: format!("must be at least {MIN_SCORE_HISTORY}"),
            });
        }
        if self.discipline.strict_exit_window == 0
            || self.discipline.strict_exit_window > self.retention.score_history
        {
            return Err(ConfigError::InvalidValue {
                key: "discipline.strict_exit_window".into(),
                message: "must be between 1 and retention.score_history".into(),
            });
        }
        if self.discipline.strict_entry_level == 0 {
            return Err(ConfigError::InvalidValue {
                key: "discipline.strict_entry_level".into(),
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from `path`, or write and return the default when absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(CoreError::Io(e)),
        }
    }

    /// Load from the data directory or return default.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without persisting. The result must still
    /// pass [`Config::validate`].
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json)?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
