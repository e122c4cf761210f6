//! Weekly progress report.

use std::fmt::Write as _;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::events::LogEntry;
use crate::num::tail;
use crate::state::{ProjectionState, Snapshot};

/// Entries per trend in the report.
pub const REPORT_WINDOW: usize = 7;
const MAX_FAILURE_POINTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Text,
}

impl FromStr for ReportFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "text" | "txt" => Ok(ReportFormat::Text),
            other => Err(CoreError::Custom(format!(
                "Unknown report format: {other}. Valid formats: json, text"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    pub training_evolution: Vec<f64>,
    pub weight_evolution: Vec<f64>,
    pub score_evolution: Vec<f64>,
    pub failure_points: Vec<LogEntry>,
    pub projections: ProjectionState,
}

impl WeeklyReport {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let failures: Vec<LogEntry> = snapshot
            .logs
            .iter()
            .filter(|entry| entry.event.is_failure())
            .cloned()
            .collect();
        Self {
            training_evolution: tail(&snapshot.modules.training.performance_trend, REPORT_WINDOW)
                .to_vec(),
            weight_evolution: tail(&snapshot.modules.diet.weekly_weight_trend, REPORT_WINDOW)
                .to_vec(),
            score_evolution: tail(&snapshot.core.score_history, REPORT_WINDOW).to_vec(),
            failure_points: tail(&failures, MAX_FAILURE_POINTS).to_vec(),
            projections: snapshot.projections.clone(),
        }
    }

    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            ReportFormat::Text => Ok(self.render_text()),
        }
    }

    fn render_text(&self) -> String {
        fn series(values: &[f64]) -> String {
            if values.is_empty() {
                return "-".to_string();
            }
            values
                .iter()
                .map(|v| format!("{v:.1}"))
                .collect::<Vec<_>>()
                .join(" ")
        }

        let mut out = String::new();
        let _ = writeln!(out, "Weekly report");
        let _ = writeln!(out, "  Training: {}", series(&self.training_evolution));
        let _ = writeln!(out, "  Weight:   {}", series(&self.weight_evolution));
        let _ = writeln!(out, "  Score:    {}", series(&self.score_evolution));
        let p = &self.projections;
        let _ = writeln!(
            out,
            "  Projection: velocity {:.2}/day, 90d {:.1}, 3y {:.1}, regression risk {:.0}",
            p.growth_velocity,
            p.projected_90_days_score,
            p.projected_3_years_score,
            p.regression_risk
        );
        if self.failure_points.is_empty() {
            let _ = writeln!(out, "  Failure points: none");
        } else {
            let _ = writeln!(out, "  Failure points:");
            for entry in &self.failure_points {
                let _ = writeln!(
                    out,
                    "    {} {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    entry.message()
                );
            }
        }
        out
    }
}
