//! Per-task audit trace.
//!
//! Every guard decision, reasoning call, dispatch attempt and final outcome of
//! a task is recorded as a [`TraceRecord`]. Records are kept in memory with
//! long values truncated, and forwarded to every configured [`TraceSink`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Lists longer than this are cut in truncated records.
pub const MAX_LIST_ITEMS: usize = 50;

/// A typed trace event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum TraceEvent {
    TaskStart {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        spec_id: Option<String>,
        text: String,
        user: String,
    },
    Guard {
        decision: String,
        reason: String,
    },
    StepStart {
        step: usize,
        note: String,
    },
    LlmRequest {
        step: usize,
        hint: String,
    },
    LlmResponse {
        step: usize,
        model: String,
        raw: String,
        duration_ms: u64,
        prompt_tokens: u32,
        completion_tokens: u32,
    },
    LlmError {
        step: usize,
        error: String,
        failures: u32,
    },
    LimitOverride {
        original: u32,
        new: u32,
    },
    Rejected {
        reason: String,
    },
    Blocked {
        required: String,
        blocks: u32,
    },
    ForceAllow {
        step: usize,
        required: String,
        blocks: u32,
    },
    ToolCall {
        name: String,
        args: Value,
    },
    ToolResult {
        name: String,
        ok: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
    },
    Hint {
        text: String,
    },
    Final {
        outcome: String,
        message: String,
        links: Vec<String>,
    },
}

impl TraceEvent {
    /// Split into the event name and its data object.
    fn into_parts(self) -> (String, Value) {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => {
                let name = map
                    .remove("event")
                    .and_then(|v| v.as_str().map(String::from))
                    .unwrap_or_else(|| "unknown".into());
                let data = map.remove("data").unwrap_or(Value::Object(Default::default()));
                (name, data)
            }
            _ => ("unknown".into(), Value::Null),
        }
    }
}

/// One recorded event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceRecord {
    pub ts: DateTime<Utc>,
    pub task: String,
    pub event: String,
    pub data: Value,
}

impl TraceRecord {
    /// String field of `data`, or "".
    pub fn str_field(&self, key: &str) -> &str {
        self.data.get(key).and_then(Value::as_str).unwrap_or("")
    }
}

/// Shorten text to `limit` characters, marking the cut with an ellipsis.
pub fn short(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(limit.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Truncate strings to `max_len` characters and lists to [`MAX_LIST_ITEMS`].
pub fn truncate_value(value: &Value, max_len: usize) -> Value {
    match value {
        Value::String(s) => Value::String(short(s, max_len)),
        Value::Array(items) => {
            let mut trimmed: Vec<Value> = items
                .iter()
                .take(MAX_LIST_ITEMS)
                .map(|v| truncate_value(v, max_len))
                .collect();
            if items.len() > MAX_LIST_ITEMS {
                trimmed.push(Value::String(format!(
                    "... trimmed {} items ...",
                    items.len() - MAX_LIST_ITEMS
                )));
            }
            Value::Array(trimmed)
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), truncate_value(v, max_len)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Where trace records are written.
///
/// `full` carries untruncated values; `truncated` is what the trace keeps in
/// memory. Sinks choose which to persist.
pub trait TraceSink: Send + Sync {
    fn record(&self, full: &TraceRecord, truncated: &TraceRecord);
}

/// Trace for one task.
pub struct TaskTrace {
    task_id: String,
    max_field_len: usize,
    events: Mutex<Vec<TraceRecord>>,
    sinks: Vec<Arc<dyn TraceSink>>,
}

impl std::fmt::Debug for TaskTrace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskTrace")
            .field("task_id", &self.task_id)
            .field("event_count", &self.count())
            .field("sink_count", &self.sinks.len())
            .finish()
    }
}

impl TaskTrace {
    /// A trace with no sinks (in-memory only).
    pub fn new(task_id: impl Into<String>, max_field_len: usize) -> Self {
        Self::with_sinks(task_id, max_field_len, Vec::new())
    }

    pub fn with_sinks(
        task_id: impl Into<String>,
        max_field_len: usize,
        sinks: Vec<Arc<dyn TraceSink>>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            max_field_len,
            events: Mutex::new(Vec::new()),
            sinks,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Record an event.
    pub fn record(&self, event: TraceEvent) {
        let (name, data) = event.into_parts();
        let full = TraceRecord {
            ts: Utc::now(),
            task: self.task_id.clone(),
            event: name,
            data,
        };
        let truncated = TraceRecord {
            data: truncate_value(&full.data, self.max_field_len),
            ..full.clone()
        };

        for sink in &self.sinks {
            sink.record(&full, &truncated);
        }
        self.events.lock().unwrap().push(truncated);
    }

    /// All recorded (truncated) events, oldest first.
    pub fn events(&self) -> Vec<TraceRecord> {
        self.events.lock().unwrap().clone()
    }

    /// Events with the given name.
    pub fn events_named(&self, name: &str) -> Vec<TraceRecord> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.event == name)
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

/// Console sink: one concise `tracing` line per event.
pub struct TracingSink {
    /// `[i/n]` prefix for the task-start line
    pub order: Option<(usize, usize)>,
}

impl TracingSink {
    pub fn new() -> Self {
        Self { order: None }
    }

    pub fn with_order(index: usize, total: usize) -> Self {
        Self {
            order: Some((index, total)),
        }
    }

    fn format(&self, r: &TraceRecord) -> String {
        let task = &r.task;
        match r.event.as_str() {
            "task_start" => {
                let prefix = self
                    .order
                    .map(|(i, n)| format!("[{i}/{n}] "))
                    .unwrap_or_default();
                format!(
                    "{prefix}[{task}] TASK {} :: {}",
                    r.str_field("spec_id"),
                    r.str_field("text")
                )
            }
            "step_start" => format!(
                "[{task}] STEP {} :: {}",
                r.data.get("step").cloned().unwrap_or(Value::Null),
                short(r.str_field("note"), 200)
            ),
            "llm_request" => format!("[{task}] LLM-> {}", short(r.str_field("hint"), 200)),
            "llm_response" => format!("[{task}] LLM<- {}", short(r.str_field("raw"), 200)),
            "tool_call" => format!(
                "[{task}] TOOL {} args={}",
                r.str_field("name"),
                short(&r.data.get("args").map(Value::to_string).unwrap_or_default(), 120)
            ),
            "tool_result" => {
                let ok = r.data.get("ok").and_then(Value::as_bool).unwrap_or(false);
                let body = if ok { r.str_field("output") } else { r.str_field("error") };
                format!(
                    "[{task}] TOOL {} {}",
                    if ok { "OK" } else { "ERR" },
                    short(body, 200)
                )
            }
            "guard" => format!(
                "[{task}] GUARD {}: {}",
                r.str_field("decision"),
                r.str_field("reason")
            ),
            "final" => format!(
                "[{task}] FINAL {}: {}",
                r.str_field("outcome"),
                short(r.str_field("message"), 200)
            ),
            other => format!("[{task}] {other}: {}", short(&r.data.to_string(), 200)),
        }
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceSink for TracingSink {
    fn record(&self, full: &TraceRecord, _truncated: &TraceRecord) {
        tracing::info!(task_id = %full.task, event = %full.event, "{}", self.format(full));
    }
}

/// Disk sink: appends one JSON object per line to `<dir>/<task_id>.jsonl`.
pub struct JsonlSink {
    dir: PathBuf,
    mask_disk: bool,
}

impl JsonlSink {
    /// Create the sink, creating `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>, mask_disk: bool) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, mask_disk })
    }

    pub fn path_for(&self, task_id: &str) -> PathBuf {
        self.dir.join(format!("{task_id}.jsonl"))
    }

    fn append(&self, record: &TraceRecord) -> std::io::Result<()> {
        let line = serde_json::to_string(record)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(&record.task))?;
        writeln!(file, "{line}")
    }
}

impl TraceSink for JsonlSink {
    fn record(&self, full: &TraceRecord, truncated: &TraceRecord) {
        let record = if self.mask_disk { truncated } else { full };
        if let Err(e) = self.append(record) {
            tracing::warn!(error = %e, task_id = %record.task, "Failed to append trace record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_and_retrieve_events() {
        let trace = TaskTrace::new("t1", 4000);
        trace.record(TraceEvent::Guard {
            decision: "deny".into(),
            reason: "Data wipe requires HR approval.".into(),
        });
        trace.record(TraceEvent::Final {
            outcome: "denied_security".into(),
            message: "Data wipe requires HR approval.".into(),
            links: vec![],
        });

        assert_eq!(trace.count(), 2);
        let events = trace.events();
        assert_eq!(events[0].event, "guard");
        assert_eq!(events[0].str_field("decision"), "deny");
        assert_eq!(events[1].task, "t1");
        assert_eq!(trace.events_named("final").len(), 1);
    }

    #[test]
    fn long_values_are_truncated_in_memory() {
        let trace = TaskTrace::new("t1", 10);
        trace.record(TraceEvent::Hint {
            text: "x".repeat(100),
        });
        let text = trace.events()[0].str_field("text").to_string();
        assert_eq!(text.chars().count(), 10);
        assert!(text.ends_with('…'));
    }

    #[test]
    fn long_lists_are_trimmed() {
        let items: Vec<Value> = (0..60).map(|i| json!(i)).collect();
        let out = truncate_value(&Value::Array(items), 100);
        let arr = out.as_array().unwrap();
        assert_eq!(arr.len(), MAX_LIST_ITEMS + 1);
        assert_eq!(arr[MAX_LIST_ITEMS], json!("... trimmed 10 items ..."));
    }

    #[test]
    fn short_keeps_short_text() {
        assert_eq!(short("abc", 10), "abc");
        assert_eq!(short("abcdef", 4), "abc…");
    }

    #[test]
    fn jsonl_sink_writes_untruncated_lines() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(JsonlSink::new(dir.path(), false).unwrap());
        let trace = TaskTrace::with_sinks("t42", 5, vec![sink.clone()]);
        trace.record(TraceEvent::Hint {
            text: "a long hint text".into(),
        });
        trace.record(TraceEvent::StepStart {
            step: 1,
            note: "go".into(),
        });

        let content = std::fs::read_to_string(sink.path_for("t42")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "hint");
        assert_eq!(first["data"]["text"], "a long hint text");
    }

    #[test]
    fn jsonl_sink_masks_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(JsonlSink::new(dir.path(), true).unwrap());
        let trace = TaskTrace::with_sinks("t43", 5, vec![sink.clone()]);
        trace.record(TraceEvent::Hint {
            text: "a long hint text".into(),
        });
        let content = std::fs::read_to_string(sink.path_for("t43")).unwrap();
        let first: Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(first["data"]["text"], "a lo…");
    }

    #[test]
    fn custom_sink_receives_events() {
        struct TestSink {
            received: Arc<Mutex<Vec<String>>>,
        }

        impl TraceSink for TestSink {
            fn record(&self, full: &TraceRecord, _truncated: &TraceRecord) {
                self.received.lock().unwrap().push(full.event.clone());
            }
        }

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::new(TestSink {
            received: received.clone(),
        });
        let trace = TaskTrace::with_sinks("t1", 100, vec![sink]);
        trace.record(TraceEvent::Rejected {
            reason: "hallucinated id proj_105".into(),
        });

        assert_eq!(received.lock().unwrap().as_slice(), ["rejected".to_string()]);
    }

    #[test]
    fn console_lines_are_concise() {
        let sink = TracingSink::with_order(2, 10);
        let record = TraceRecord {
            ts: Utc::now(),
            task: "t1".into(),
            event: "task_start".into(),
            data: json!({"spec_id": "wipe", "text": "wipe my data", "user": "ana"}),
        };
        assert_eq!(sink.format(&record), "[2/10] [t1] TASK wipe :: wipe my data");

        let result = TraceRecord {
            event: "tool_result".into(),
            data: json!({"name": "GetProject", "ok": false, "error": "not found"}),
            ..record
        };
        assert_eq!(sink.format(&result), "[t1] TOOL ERR not found");
    }

    #[test]
    fn debug_format() {
        let trace = TaskTrace::new("t9", 100);
        let debug_str = format!("{trace:?}");
        assert!(debug_str.contains("TaskTrace"));
        assert!(debug_str.contains("event_count"));
    }
}
