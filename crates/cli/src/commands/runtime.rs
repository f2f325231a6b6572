//! Shared wiring for the commands that run tasks.

use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use officeclaw_agent::{AgentLoop, LlmReasoner};
use officeclaw_client::ErcClient;
use officeclaw_config::AppConfig;
use officeclaw_core::outcome::{Outcome, OutcomeKind};
use officeclaw_core::provider::Provider;
use officeclaw_core::task::TaskIntake;
use officeclaw_providers::{RateLimitedProvider, RateLimiter, build_from_config};
use officeclaw_telemetry::{JsonlSink, TaskReport, TaskTrace, TraceSink, TracingSink};
use tracing::warn;

/// Everything a worker needs to run one task. Cheap to clone.
#[derive(Clone)]
pub struct Runtime {
    agent: Arc<AgentLoop>,
    client: ErcClient,
    jsonl: Option<Arc<JsonlSink>>,
    console: bool,
    max_field_len: usize,
    pub model: String,
}

impl Runtime {
    /// Build the provider stack, reasoner, and agent loop from `config`.
    ///
    /// The rate limiter is shared by every worker: its interval is
    /// `1 / (rps * workers)`.
    pub fn build(
        config: &AppConfig,
        model: Option<&str>,
        workers: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        if !config.has_api_key() {
            eprintln!();
            eprintln!("  ERROR: No API key configured!");
            eprintln!();
            eprintln!("  Set one of these environment variables:");
            eprintln!("    OFFICECLAW_API_KEY, OPENROUTER_API_KEY, OPENAI_API_KEY");
            eprintln!();
            eprintln!("  Or add it to your config file:");
            eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
            eprintln!();
            return Err("No API key found. See above for setup instructions.".into());
        }

        let (model, routing) = config.resolve_model(model)?;
        let router = build_from_config(config);
        let provider = router.default().ok_or("No default provider configured")?;
        let limiter = Arc::new(RateLimiter::new(config.runtime.rate_limit_rps, workers));
        let provider: Arc<dyn Provider> = Arc::new(
            RateLimitedProvider::new(provider, limiter).with_retries(config.runtime.retry_count),
        );

        let reasoner = LlmReasoner::new(provider, &model)
            .with_routing(routing)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens);
        let agent = AgentLoop::from_config(Arc::new(reasoner), config)?;

        let client = ErcClient::new(
            &config.api.base_url,
            Duration::from_secs(config.api.timeout_secs),
        );
        let jsonl = match JsonlSink::new(&config.trace.log_dir, config.trace.mask_disk) {
            Ok(sink) => Some(Arc::new(sink)),
            Err(e) => {
                warn!(dir = %config.trace.log_dir.display(), error = %e, "Trace files disabled");
                None
            }
        };

        Ok(Self {
            agent: Arc::new(agent),
            client,
            jsonl,
            console: config.trace.console,
            max_field_len: config.trace.max_field_len,
            model,
        })
    }

    /// Run one task and collect its report. `index` is 1-based.
    pub async fn execute(&self, index: usize, total: usize, intake: TaskIntake) -> (TaskReport, Outcome) {
        let mut sinks: Vec<Arc<dyn TraceSink>> = Vec::new();
        if self.console {
            sinks.push(Arc::new(TracingSink::with_order(index, total)));
        }
        if let Some(jsonl) = &self.jsonl {
            sinks.push(jsonl.clone());
        }
        let trace = TaskTrace::with_sinks(&intake.task_id, self.max_field_len, sinks);
        let api = self.client.for_task(&intake.task_id);

        let started_at = Utc::now();
        let outcome = self.agent.run(&api, intake.clone(), &trace).await;
        let ended_at = Utc::now();

        let report = TaskReport {
            index,
            task_id: intake.task_id,
            spec_id: intake.spec_id,
            text: intake.text,
            started_at,
            ended_at,
            outcome: Some(outcome.kind.as_str().into()),
            message: Some(outcome.message.clone()),
            success: outcome.kind != OutcomeKind::ErrorInternal,
            error: None,
            events: trace.events(),
        };
        (report, outcome)
    }
}
