//! `officeclaw run`: run a task list with a pool of workers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use officeclaw_config::AppConfig;
use officeclaw_core::task::TaskIntake;
use officeclaw_telemetry::{SessionReport, TaskReport};
use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::runtime::Runtime;

pub struct RunArgs {
    pub tasks: PathBuf,
    pub select: Vec<String>,
    pub model: Option<String>,
    pub workers: Option<usize>,
    pub sequential: bool,
}

/// A task file is either a bare list or `{"tasks": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum TaskFile {
    List(Vec<TaskIntake>),
    Wrapped { tasks: Vec<TaskIntake> },
}

pub fn load_tasks(path: &Path) -> Result<Vec<TaskIntake>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read task file {}: {e}", path.display()))?;
    let file: TaskFile = serde_json::from_str(&content)
        .map_err(|e| format!("Invalid task file {}: {e}", path.display()))?;
    Ok(match file {
        TaskFile::List(tasks) | TaskFile::Wrapped { tasks } => tasks,
    })
}

/// Pick tasks by 1-based index, task id, or spec id, keeping each 1-based
/// position. No selectors, or none matching, selects everything.
pub fn select_tasks(all: &[TaskIntake], selectors: &[String]) -> Vec<(usize, TaskIntake)> {
    let everything = || all.iter().cloned().enumerate().map(|(i, t)| (i + 1, t)).collect();
    if selectors.is_empty() {
        return everything();
    }

    let mut picked: Vec<usize> = Vec::new();
    for selector in selectors {
        let token = selector.trim();
        if let Ok(index) = token.parse::<usize>() {
            if (1..=all.len()).contains(&index) && !picked.contains(&index) {
                picked.push(index);
            }
            continue;
        }
        for (i, task) in all.iter().enumerate() {
            let matches = task.task_id == token || task.spec_id.as_deref() == Some(token);
            if matches && !picked.contains(&(i + 1)) {
                picked.push(i + 1);
            }
        }
    }

    if picked.is_empty() {
        return everything();
    }
    picked.into_iter().map(|i| (i, all[i - 1].clone())).collect()
}

pub async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let all = load_tasks(&args.tasks)?;
    let selected = select_tasks(&all, &args.select);
    let total = selected.len();
    let workers = if args.sequential {
        1
    } else {
        args.workers.unwrap_or(config.runtime.workers).max(1)
    };

    let runtime = Runtime::build(&config, args.model.as_deref(), workers)?;
    println!("[config] Model: {} | Workers: {workers} | Tasks: {total}", runtime.model);

    let mut session = SessionReport::start(
        &config.trace.report_dir,
        serde_json::json!({
            "model_id": runtime.model,
            "workers": workers,
            "task_file": args.tasks.display().to_string(),
        }),
    )?;
    info!(session = session.session_id(), hash = session.hash(), total, "Session started");

    let started = Instant::now();
    let permits = Arc::new(Semaphore::new(workers));
    let mut set = JoinSet::new();
    for (index, intake) in selected {
        let permit = permits.clone().acquire_owned().await?;
        let runtime = runtime.clone();
        set.spawn(async move {
            let _permit = permit;
            runtime.execute(index, total, intake).await
        });
    }

    let mut outcomes: BTreeMap<String, usize> = BTreeMap::new();
    while let Some(joined) = set.join_next().await {
        let (report, outcome) = match joined {
            Ok(done) => done,
            Err(e) => {
                warn!(error = %e, "Worker failed");
                continue;
            }
        };
        *outcomes.entry(outcome.kind.as_str().to_string()).or_insert(0) += 1;
        print_status(&report, total);
        record(&mut session, &report);
    }

    let elapsed = started.elapsed().as_secs_f64();
    let stats = session.statistics();
    let summary = session.finish()?;

    println!();
    println!(
        "Done: {}/{} without internal errors ({:.1}%), {elapsed:.1}s, {:.2} tasks/min",
        stats.successful,
        stats.total_tasks,
        stats.success_rate,
        if elapsed > 0.0 { stats.total_tasks as f64 / elapsed * 60.0 } else { 0.0 }
    );
    for (outcome, count) in &outcomes {
        println!("  {outcome:<28} {count}");
    }
    println!("Tokens: {} prompt / {} completion", stats.prompt_tokens, stats.completion_tokens);
    println!("Session report: {}", summary.display());
    Ok(())
}

fn print_status(report: &TaskReport, total: usize) {
    let mark = if report.success { "✓" } else { "✗" };
    println!(
        "[{:02}/{total}] {mark} {} ({:.1}s) {}: {}",
        report.index,
        report.spec_id.as_deref().unwrap_or(&report.task_id),
        report.duration_secs(),
        report.outcome.as_deref().unwrap_or("none"),
        report.message.as_deref().unwrap_or("")
    );
}

fn record(session: &mut SessionReport, report: &TaskReport) {
    if let Err(e) = session.log_task(report) {
        warn!(task_id = %report.task_id, error = %e, "Failed to write task report");
    }
    if !report.success {
        if let Err(e) = session.log_error(report) {
            warn!(task_id = %report.task_id, error = %e, "Failed to write error report");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks() -> Vec<TaskIntake> {
        ["t1", "t2", "t3"]
            .iter()
            .enumerate()
            .map(|(i, id)| TaskIntake {
                task_id: id.to_string(),
                spec_id: Some(format!("spec_{i}")),
                text: format!("task {id}"),
            })
            .collect()
    }

    fn ids(selected: &[(usize, TaskIntake)]) -> Vec<(usize, &str)> {
        selected.iter().map(|(i, t)| (*i, t.task_id.as_str())).collect()
    }

    #[test]
    fn no_selectors_selects_all() {
        assert_eq!(ids(&select_tasks(&tasks(), &[])), vec![(1, "t1"), (2, "t2"), (3, "t3")]);
    }

    #[test]
    fn selects_by_index_and_id() {
        let all = tasks();
        let picked = select_tasks(&all, &["3".into(), "t1".into(), "spec_1".into(), "3".into()]);
        assert_eq!(ids(&picked), vec![(3, "t3"), (1, "t1"), (2, "t2")]);
    }

    #[test]
    fn unmatched_selectors_fall_back_to_all() {
        let all = tasks();
        assert_eq!(select_tasks(&all, &["99".into(), "nope".into()]).len(), 3);
    }

    #[test]
    fn loads_both_file_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("list.json");
        std::fs::write(&list, r#"[{"task_id": "t1", "task_text": "what is my salary?"}]"#).unwrap();
        let wrapped = dir.path().join("wrapped.json");
        std::fs::write(
            &wrapped,
            r#"{"tasks": [{"task_id": "t1", "spec_id": "salary", "text": "what is my salary?"}]}"#,
        )
        .unwrap();

        assert_eq!(load_tasks(&list).unwrap()[0].text, "what is my salary?");
        assert_eq!(load_tasks(&wrapped).unwrap()[0].spec_id.as_deref(), Some("salary"));
        assert!(load_tasks(&dir.path().join("missing.json")).is_err());
    }
}
