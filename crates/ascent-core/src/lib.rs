//! # Ascent Core Library
//!
//! This library provides the scoring and discipline engine behind the Ascent
//! progress tracker. Daily "executions" across seven life domains become
//! per-domain scores, a weighted composite score and an alert level, which in
//! turn drive a discipline state machine and trend projections.
//!
//! ## Architecture
//!
//! - **Validation**: Every payload is checked before anything mutates
//! - **Modules**: One pure updater per domain; violations travel back as
//!   typed events instead of cross-domain writes
//! - **Aggregation**: Weighted composite with a discrete under-performance
//!   multiplier and derived alert state
//! - **Discipline**: Streaks, failure penalties and strict mode, evaluated once
//!   per day
//! - **Storage**: SQLite key-value snapshot storage and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`Engine`]: Facade over the whole pipeline
//! - [`Database`]: Snapshot persistence
//! - [`Config`]: Application configuration management
//! - [`ModuleUpdater`]: Trait implemented by each domain state

pub mod aggregator;
pub mod discipline;
pub mod domain;
pub mod engine;
pub mod error;
pub mod events;
pub mod mentor;
pub mod modules;
pub mod num;
pub mod projection;
pub mod report;
pub mod state;
pub mod storage;
pub mod validator;

pub use aggregator::{Aggregate, ScoreAggregator};
pub use discipline::DisciplineTracker;
pub use domain::{Domain, DomainScores, DomainWeights};
pub use engine::{DashboardSnapshot, Engine, StrictModeView, SubmissionOutcome};
pub use error::{ConfigError, CoreError, DatabaseError, SnapshotError, ValidationError};
pub use events::{Event, LogEntry, Violation, ViolationKind};
pub use mentor::{MentorAdvisor, MentorContext, MentorDirective, MentorRule};
pub use modules::{ExecutionPayload, Macros, ModuleStates, ModuleUpdater};
pub use projection::ProjectionEstimator;
pub use report::{ReportFormat, WeeklyReport};
pub use state::{AlertState, CoreState, DisciplineState, ProjectionState, Snapshot};
pub use storage::{Config, Database, MemoryStore, SnapshotStore};
pub use validator::ExecutionValidator;
