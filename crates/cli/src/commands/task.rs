//! `officeclaw task`: Run a single instruction end to end.

use chrono::Utc;
use officeclaw_config::AppConfig;
use officeclaw_core::task::TaskIntake;

use super::runtime::Runtime;

pub async fn run(instruction: String, model: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let runtime = Runtime::build(&config, model.as_deref(), 1)?;

    let intake = TaskIntake {
        task_id: format!("task-{}", Utc::now().format("%Y%m%d%H%M%S")),
        spec_id: None,
        text: instruction,
    };
    let (report, outcome) = runtime.execute(1, 1, intake).await;

    println!();
    println!("Outcome: {}", outcome.kind.as_str());
    println!("Message: {}", outcome.message);
    for link in &outcome.links {
        println!("  - {}", link.id);
    }
    println!("({:.1}s, {} trace events)", report.duration_secs(), report.events.len());
    Ok(())
}
