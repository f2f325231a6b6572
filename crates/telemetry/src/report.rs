//! Session reports: per-task JSON files, error text reports, and a session
//! summary with statistics.
//!
//! Layout under the report directory:
//! ```text
//! tasks/<hash>_task_<idx>_<ts>_<pass|fail>.json
//! errors/<hash>_error_task_<idx>_<ts>.txt
//! sessions/<hash>_session_<session_id>_<ts>.json
//! ```

use crate::TelemetryError;
use crate::trace::{TraceRecord, short};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Short 4-letter hash used to keep report filenames compact.
pub fn session_hash(seed: &str) -> String {
    if seed.is_empty() {
        return "xxxx".into();
    }
    let digest = Sha256::digest(seed.as_bytes());
    digest
        .iter()
        .take(4)
        .map(|b| (b'a' + b % 26) as char)
        .collect()
}

/// One compact reasoning entry derived from a trace event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningEntry {
    pub step: usize,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    pub summary: String,
}

/// Turn trace events into a compact reasoning log.
pub fn events_to_reasoning(events: &[TraceRecord], max_field_len: usize) -> Vec<ReasoningEntry> {
    events
        .iter()
        .enumerate()
        .map(|(i, ev)| {
            let d = &ev.data;
            let text = |key: &str| match d.get(key) {
                Some(Value::String(s)) => short(s, max_field_len),
                Some(other) => short(&other.to_string(), max_field_len),
                None => String::new(),
            };
            let summary = match ev.event.as_str() {
                "task_start" => format!("Task start {}", text("text")),
                "llm_response" => format!("llm_response: {}", text("raw")),
                "llm_request" => format!("llm_request: {}", text("hint")),
                "step_start" => format!("step {}", text("step")),
                "tool_call" => format!("tool_call {}: {}", text("name"), text("args")),
                "tool_result" if d.get("ok") == Some(&Value::Bool(false)) => {
                    format!("tool_error {}: {}", text("name"), text("error"))
                }
                "tool_result" => format!("tool_result {}: {}", text("name"), text("output")),
                other => format!("{other}: {}", short(&d.to_string(), max_field_len)),
            };
            ReasoningEntry {
                step: i + 1,
                timestamp: ev.ts,
                kind: ev.event.clone(),
                summary,
            }
        })
        .collect()
}

/// Everything known about one finished task.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub index: usize,
    pub task_id: String,
    pub spec_id: Option<String>,
    pub text: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Reported outcome label, if the task reached one
    pub outcome: Option<String>,
    pub message: Option<String>,
    pub success: bool,
    /// Infrastructure error that prevented a normal run
    pub error: Option<String>,
    pub events: Vec<TraceRecord>,
}

impl TaskReport {
    pub fn duration_secs(&self) -> f64 {
        (self.ended_at - self.started_at).num_milliseconds().max(0) as f64 / 1000.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSummary {
    pub task_id: String,
    pub spec_id: Option<String>,
    pub file: String,
    pub success: bool,
    pub outcome: Option<String>,
    pub duration_sec: f64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// Aggregate numbers for a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionStatistics {
    pub total_tasks: usize,
    pub successful: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub avg_duration_sec: f64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub outcomes: BTreeMap<String, usize>,
}

fn round(v: f64, places: i32) -> f64 {
    let f = 10f64.powi(places);
    (v * f).round() / f
}

fn token_totals(events: &[TraceRecord]) -> (u64, u64) {
    events
        .iter()
        .filter(|e| e.event == "llm_response")
        .fold((0, 0), |(p, c), e| {
            (
                p + e.data.get("prompt_tokens").and_then(Value::as_u64).unwrap_or(0),
                c + e.data.get("completion_tokens").and_then(Value::as_u64).unwrap_or(0),
            )
        })
}

/// Writes report files for one run of the task list.
#[derive(Debug)]
pub struct SessionReport {
    base_dir: PathBuf,
    session_id: String,
    hash: String,
    started_at: DateTime<Utc>,
    metadata: Value,
    tasks: Vec<TaskSummary>,
}

impl SessionReport {
    /// Start a session, creating the report directories.
    pub fn start(base_dir: impl Into<PathBuf>, metadata: Value) -> Result<Self, TelemetryError> {
        let base_dir = base_dir.into();
        for sub in ["tasks", "sessions", "errors"] {
            std::fs::create_dir_all(base_dir.join(sub))?;
        }
        let started_at = Utc::now();
        let session_id = uuid::Uuid::new_v4().to_string();
        let hash = session_hash(&format!("{session_id}{}", started_at.timestamp_millis()));
        Ok(Self {
            base_dir,
            session_id,
            hash,
            started_at,
            metadata,
            tasks: Vec::new(),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn write_json(path: &Path, payload: &Value) -> Result<(), TelemetryError> {
        std::fs::write(path, serde_json::to_string_pretty(payload)?)?;
        Ok(())
    }

    /// Write the per-task JSON report.
    pub fn log_task(&mut self, report: &TaskReport) -> Result<PathBuf, TelemetryError> {
        let ts = report.started_at.format("%m%d-%H-%M-%S");
        let status = if report.success { "pass" } else { "fail" };
        let filename = format!("{}_task_{:03}_{ts}_{status}.json", self.hash, report.index);
        let path = self.base_dir.join("tasks").join(&filename);
        let (prompt_tokens, completion_tokens) = token_totals(&report.events);

        let payload = json!({
            "task_id": report.task_id,
            "spec_id": report.spec_id,
            "task_text": report.text,
            "session_id": self.session_id,
            "session_hash": self.hash,
            "metadata": {
                "start_time": report.started_at.to_rfc3339(),
                "end_time": report.ended_at.to_rfc3339(),
                "duration_sec": round(report.duration_secs(), 2),
                "run": self.metadata,
            },
            "success": report.success,
            "outcome": report.outcome,
            "message": report.message,
            "error": report.error,
            "usage": {
                "prompt_tokens": prompt_tokens,
                "completion_tokens": completion_tokens,
            },
            "reasoning": events_to_reasoning(&report.events, 400),
            "events": report.events,
        });
        Self::write_json(&path, &payload)?;

        self.tasks.push(TaskSummary {
            task_id: report.task_id.clone(),
            spec_id: report.spec_id.clone(),
            file: format!("tasks/{filename}"),
            success: report.success,
            outcome: report.outcome.clone(),
            duration_sec: round(report.duration_secs(), 2),
            prompt_tokens,
            completion_tokens,
        });
        Ok(path)
    }

    /// Write a plain-text error report for a failed task.
    pub fn log_error(&self, report: &TaskReport) -> Result<PathBuf, TelemetryError> {
        let ts = self.started_at.format("%m%d-%H-%M-%S");
        let filename = format!("{}_error_task_{:03}_{ts}.txt", self.hash, report.index);
        let path = self.base_dir.join("errors").join(filename);

        let mut lines = vec![
            format!(
                "Task: {} ({})",
                report.task_id,
                report.spec_id.as_deref().unwrap_or("-")
            ),
            format!("Session: {} ({})", self.session_id, self.hash),
            format!("Task text: {}", report.text),
        ];
        if let Some(outcome) = &report.outcome {
            lines.push(format!(
                "\nOutcome: {outcome}: {}",
                report.message.as_deref().unwrap_or("")
            ));
        }
        if let Some(error) = &report.error {
            lines.push("\nError:".into());
            lines.push(error.clone());
        }
        let reasoning = events_to_reasoning(&report.events, 400);
        if !reasoning.is_empty() {
            lines.push("\nLast reasoning steps:".into());
            let skip = reasoning.len().saturating_sub(10);
            for entry in &reasoning[skip..] {
                lines.push(format!("- [{}] {}: {}", entry.timestamp, entry.kind, entry.summary));
            }
        }
        if !report.events.is_empty() {
            lines.push("\nTrace events (latest last):".into());
            let skip = report.events.len().saturating_sub(20);
            for ev in &report.events[skip..] {
                lines.push(format!("- [{}] {}: {}", ev.ts, ev.event, ev.data));
            }
        }
        std::fs::write(&path, lines.join("\n"))?;
        Ok(path)
    }

    /// Statistics over the tasks logged so far.
    pub fn statistics(&self) -> SessionStatistics {
        let total = self.tasks.len();
        let successful = self.tasks.iter().filter(|t| t.success).count();
        let mut outcomes = BTreeMap::new();
        for t in &self.tasks {
            let key = t.outcome.clone().unwrap_or_else(|| "none".into());
            *outcomes.entry(key).or_insert(0) += 1;
        }
        let total_duration: f64 = self.tasks.iter().map(|t| t.duration_sec).sum();
        SessionStatistics {
            total_tasks: total,
            successful,
            failed: total - successful,
            success_rate: if total > 0 {
                round(successful as f64 / total as f64 * 100.0, 1)
            } else {
                0.0
            },
            avg_duration_sec: if total > 0 {
                round(total_duration / total as f64, 2)
            } else {
                0.0
            },
            prompt_tokens: self.tasks.iter().map(|t| t.prompt_tokens).sum(),
            completion_tokens: self.tasks.iter().map(|t| t.completion_tokens).sum(),
            outcomes,
        }
    }

    /// Write the session summary and return its path.
    pub fn finish(self) -> Result<PathBuf, TelemetryError> {
        let ended_at = Utc::now();
        let filename = format!(
            "{}_session_{}_{}.json",
            self.hash,
            self.session_id,
            self.started_at.format("%m%d-%H-%M-%S")
        );
        let path = self.base_dir.join("sessions").join(filename);
        let duration = (ended_at - self.started_at).num_milliseconds().max(0) as f64 / 1000.0;

        let payload = json!({
            "session_id": self.session_id,
            "session_hash": self.hash,
            "session_metadata": {
                "run": self.metadata,
                "start_time": self.started_at.to_rfc3339(),
                "end_time": ended_at.to_rfc3339(),
                "duration_sec": round(duration, 2),
            },
            "tasks": self.tasks,
            "statistics": self.statistics(),
        });
        Self::write_json(&path, &payload)?;
        Ok(path)
    }
}
