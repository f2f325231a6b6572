//! Audit tracing and session reporting for OfficeClaw.
//!
//! Provides a per-task event trace (guard decisions, reasoning calls, action
//! dispatches, final outcomes) with pluggable sinks, and session report files
//! summarising a run of many tasks.

pub mod report;
pub mod trace;

pub use report::{
    ReasoningEntry, SessionReport, SessionStatistics, TaskReport, TaskSummary, events_to_reasoning,
    session_hash,
};
pub use trace::{JsonlSink, TaskTrace, TraceEvent, TraceRecord, TraceSink, TracingSink, short};

/// Errors from the telemetry subsystem.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}
