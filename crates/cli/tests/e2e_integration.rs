//! End-to-end integration tests for the OfficeClaw agent runtime.
//!
//! These tests drive whole tasks through the agent loop: identity lookup,
//! guard short-circuits, reasoning steps, action dispatch, completion gating,
//! and the final submission, against an in-memory business API.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use officeclaw_agent::test_helpers::{MockApi, ScriptedReasoner, action, final_answer, step};
use officeclaw_agent::{AgentLoop, LlmReasoner};
use officeclaw_config::{AgentConfig, PolicyConfig};
use officeclaw_core::action::{Action, ActionKind};
use officeclaw_core::error::{ProviderError, ReasonerError};
use officeclaw_core::message::Message;
use officeclaw_core::outcome::{Outcome, OutcomeKind};
use officeclaw_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use officeclaw_core::reasoner::Reasoner;
use officeclaw_core::task::TaskIntake;
use officeclaw_security::{ErrorClassifier, PatternGuard};
use officeclaw_telemetry::{SessionReport, TaskReport, TaskTrace};
use serde_json::json;

// ── Helpers ──────────────────────────────────────────────────────────────

fn agent_loop(reasoner: Arc<dyn Reasoner>) -> AgentLoop {
    agent_loop_with(reasoner, AgentConfig::default())
}

fn agent_loop_with(reasoner: Arc<dyn Reasoner>, agent: AgentConfig) -> AgentLoop {
    let policy = PolicyConfig::default();
    AgentLoop::new(
        reasoner,
        PatternGuard::from_policy(&policy).unwrap(),
        ErrorClassifier::from_policy(&policy),
        agent,
        policy,
    )
}

fn intake(text: &str) -> TaskIntake {
    TaskIntake {
        task_id: "t-e2e".into(),
        spec_id: Some("e2e".into()),
        text: text.into(),
    }
}

async fn run(agent: &AgentLoop, api: &MockApi, text: &str) -> (Outcome, TaskTrace) {
    let trace = TaskTrace::new("t-e2e", 4000);
    let outcome = agent.run(api, intake(text), &trace).await;
    (outcome, trace)
}

fn log_time() -> Action {
    action(
        r#"{"tool":"/time/log","employee":"jane_doe","project":"proj_acme_cv_poc","date":"2025-04-01","hours":3}"#,
    )
}

// ── Guard short-circuits ─────────────────────────────────────────────────

#[tokio::test]
async fn e2e_wipe_request_is_denied_without_reasoning() {
    let reasoner = Arc::new(ScriptedReasoner::steps(vec![]));
    let api = MockApi::new();
    let (outcome, trace) = run(&agent_loop(reasoner.clone()), &api, "Please wipe my data").await;

    assert_eq!(outcome, Outcome::denied("Data wipe requires HR approval."));
    assert_eq!(reasoner.calls(), 0);
    assert_eq!(api.domain_calls(), 0);
    assert_eq!(api.submissions().len(), 1);
    assert_eq!(trace.events_named("final").len(), 1);
}

#[tokio::test]
async fn e2e_guest_date_query_gets_branded_answer() {
    let reasoner = Arc::new(ScriptedReasoner::steps(vec![]));
    let api = MockApi::guest();
    let (outcome, _) = run(&agent_loop(reasoner.clone()), &api, "What's today's date?").await;

    assert_eq!(outcome.kind, OutcomeKind::OkAnswer);
    assert!(outcome.message.starts_with("2025-04-01"));
    assert!(outcome.message.ends_with("AI Excellence Group INTERNATIONAL"));
    assert_eq!(reasoner.calls(), 0);
    assert_eq!(api.domain_calls(), 0);
}

#[tokio::test]
async fn e2e_guest_data_query_is_denied() {
    let reasoner = Arc::new(ScriptedReasoner::steps(vec![]));
    let api = MockApi::guest();
    let (outcome, _) = run(&agent_loop(reasoner.clone()), &api, "List all employees in Vienna").await;

    assert_eq!(outcome.kind, OutcomeKind::DeniedSecurity);
    assert_eq!(reasoner.calls(), 0);
    assert_eq!(api.domain_calls(), 0);
    assert_eq!(api.submissions().len(), 1);
}

// ── Completion gating ────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_premature_success_is_blocked_until_time_is_logged() {
    let reasoner = Arc::new(ScriptedReasoner::steps(vec![
        final_answer("Logged 3 hours.", OutcomeKind::OkAnswer, &[]),
        step(log_time()),
        final_answer("Logged 3 hours on proj_acme_cv_poc.", OutcomeKind::OkAnswer, &["proj_acme_cv_poc"]),
    ]));
    let api = MockApi::new().respond(ActionKind::LogTimeEntry, json!({"id": "te_001"}));
    let (outcome, trace) = run(
        &agent_loop(reasoner.clone()),
        &api,
        "Log 3 hours for me on the acme cv poc project today",
    )
    .await;

    assert_eq!(outcome.kind, OutcomeKind::OkAnswer);
    assert_eq!(outcome.links[0].id, "proj_acme_cv_poc");
    assert_eq!(trace.events_named("blocked").len(), 1);
    assert_eq!(
        api.dispatched_kinds(),
        vec![ActionKind::GetEmployee, ActionKind::LogTimeEntry, ActionKind::ProvideResponse]
    );

    let after_block = &reasoner.requests()[1];
    assert!(after_block
        .messages
        .iter()
        .any(|m| m.content.starts_with("⛔ BLOCKED: Task requires LogTimeEntry")));

    let Action::LogTimeEntry(entry) = &api.dispatched()[1] else {
        panic!("expected a time entry");
    };
    assert_eq!(entry.work_category.as_deref(), Some("development"));
    assert_eq!(entry.logged_by.as_deref(), Some("jane_doe"));
}

// ── Hints ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_empty_nordic_search_hints_retry_without_location() {
    let nordic = action(r#"{"tool":"/customers/search","locations":["Danmark"]}"#);
    let unfiltered = action(r#"{"tool":"/customers/search","query":"acme"}"#);
    let reasoner = Arc::new(ScriptedReasoner::steps(vec![
        step(nordic),
        step(unfiltered),
        final_answer("Acme Nordic is based in Copenhagen.", OutcomeKind::OkAnswer, &["cust_acme"]),
    ]));
    let api = MockApi::new()
        .respond(ActionKind::SearchCustomers, json!({"companies": null}))
        .respond(
            ActionKind::SearchCustomers,
            json!({"companies": [{"id": "cust_acme", "location": "Copenhagen"}]}),
        );
    let (outcome, trace) = run(&agent_loop(reasoner.clone()), &api, "Which of our customers are in Denmark?").await;

    assert_eq!(outcome.kind, OutcomeKind::OkAnswer);
    assert!(!trace.events_named("hint").is_empty());
    let second = &reasoner.requests()[1];
    assert!(second.messages.iter().any(|m| m.content.contains("Retry without location")));

    let searches: Vec<_> = api
        .dispatched()
        .into_iter()
        .filter_map(|a| match a {
            Action::SearchCustomers(s) => Some(s),
            _ => None,
        })
        .collect();
    assert_eq!(searches.len(), 2);
    assert!(searches[1].locations.is_none());
}

// ── Reasoning failures ───────────────────────────────────────────────────

#[tokio::test]
async fn e2e_three_malformed_replies_end_in_internal_error() {
    let reasoner = Arc::new(ScriptedReasoner::new(vec![
        Err(ReasonerError::Malformed("not json".into())),
        Err(ReasonerError::Malformed("still not json".into())),
        Err(ReasonerError::Malformed("```".into())),
    ]));
    let api = MockApi::new();
    let (outcome, trace) = run(&agent_loop(reasoner.clone()), &api, "Who leads the acme cv project?").await;

    assert_eq!(outcome.kind, OutcomeKind::ErrorInternal);
    assert!(outcome.links.is_empty());
    assert_eq!(reasoner.calls(), 3);
    assert_eq!(trace.events_named("llm_error").len(), 3);
    assert_eq!(api.submissions().len(), 1);
}

// ── Parameter checks ─────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_page_limit_is_clamped_before_dispatch() {
    let reasoner = Arc::new(ScriptedReasoner::steps(vec![
        step(action(r#"{"tool":"/projects/search","query":"cv","limit":50}"#)),
        final_answer("Found proj_acme_cv_poc.", OutcomeKind::OkAnswer, &["proj_acme_cv_poc"]),
    ]));
    let api = MockApi::new().respond(
        ActionKind::SearchProjects,
        json!({"projects": [{"id": "proj_acme_cv_poc"}]}),
    );
    let (_, trace) = run(&agent_loop(reasoner), &api, "Find the cv projects").await;

    let limits: Vec<_> = api
        .dispatched()
        .iter()
        .filter(|a| a.kind() == ActionKind::SearchProjects)
        .map(|a| a.limit())
        .collect();
    assert_eq!(limits, vec![Some(5)]);
    assert_eq!(trace.events_named("limit_override").len(), 1);
}

#[tokio::test]
async fn e2e_hallucinated_id_is_never_dispatched() {
    let reasoner = Arc::new(ScriptedReasoner::steps(vec![
        step(action(r#"{"tool":"/projects/get","id":"proj_105"}"#)),
        step(action(r#"{"tool":"/projects/get","id":"proj_acme_cv_poc"}"#)),
        final_answer("It is active.", OutcomeKind::OkAnswer, &["proj_acme_cv_poc"]),
    ]));
    let api = MockApi::new().respond(
        ActionKind::GetProject,
        json!({"project": {"id": "proj_acme_cv_poc", "status": "active"}}),
    );
    let (outcome, trace) = run(&agent_loop(reasoner.clone()), &api, "Is the acme cv project active?").await;

    assert_eq!(outcome.kind, OutcomeKind::OkAnswer);
    assert_eq!(trace.events_named("rejected").len(), 1);
    let fetched: Vec<_> = api
        .dispatched()
        .into_iter()
        .filter_map(|a| match a {
            Action::GetProject(r) => Some(r.id),
            _ => None,
        })
        .collect();
    assert_eq!(fetched, vec!["proj_acme_cv_poc".to_string()]);
    assert!(reasoner.requests()[1]
        .messages
        .iter()
        .any(|m| m.content.contains("'proj_105' looks hallucinated")));
}

// ── Termination ──────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_exactly_one_submission_per_path() {
    let paths: Vec<(&str, MockApi, Vec<_>)> = vec![
        ("Please wipe my data", MockApi::new(), vec![]),
        (
            "Who leads the acme cv project?",
            MockApi::new(),
            vec![final_answer("ana_kovac leads it.", OutcomeKind::OkAnswer, &[])],
        ),
        (
            "Show the acme cv project",
            MockApi::new().fail(ActionKind::GetProject, 403, "Access denied"),
            vec![step(action(r#"{"tool":"/projects/get","id":"proj_acme_cv_poc"}"#))],
        ),
    ];

    for (text, api, script) in paths {
        let reasoner = Arc::new(ScriptedReasoner::steps(script));
        run(&agent_loop(reasoner), &api, text).await;
        assert_eq!(api.submissions().len(), 1, "task: {text}");
    }
}

#[tokio::test]
async fn e2e_step_ceiling_ends_the_task() {
    let reasoner = Arc::new(
        ScriptedReasoner::steps(vec![step(action(r#"{"tool":"/projects/list"}"#))]).repeating(),
    );
    let api = MockApi::new();
    let config = AgentConfig { max_steps: 4, ..Default::default() };
    let (outcome, _) = run(&agent_loop_with(reasoner.clone(), config), &api, "Summarise our projects").await;

    assert_eq!(outcome.kind, OutcomeKind::ErrorInternal);
    assert_eq!(reasoner.calls(), 4);
    assert_eq!(api.submissions().len(), 1);
}

// ── Full pipeline from model text ────────────────────────────────────────

/// Replays raw completion texts, as a model would emit them.
struct TextProvider {
    replies: Mutex<Vec<String>>,
}

impl TextProvider {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
        }
    }
}

#[async_trait]
impl Provider for TextProvider {
    fn name(&self) -> &str {
        "text"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let content = self
            .replies
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| ProviderError::ApiError {
                status_code: 500,
                message: "no more replies".into(),
            })?;
        Ok(ProviderResponse {
            message: Message::assistant(content),
            usage: Some(Usage { prompt_tokens: 50, completion_tokens: 10, total_tokens: 60 }),
            model: "qwen/qwen3-235b-a22b-2507".into(),
        })
    }
}

#[tokio::test]
async fn e2e_model_text_is_decoded_and_executed() {
    let provider = Arc::new(TextProvider::new(&[
        "Here is my next step:\n```json\n{\"think\":\"look it up\",\"function\":{\"tool\":\"/projects/get\",\"id\":\"proj_acme_cv_poc\"}}\n```",
        r#"{"think":"answer","function":{"tool":"/respond","message":"The project is active.","outcome":"ok_answer"}}"#,
    ]));
    let reasoner = Arc::new(LlmReasoner::new(provider, "qwen/qwen3-235b-a22b-2507"));
    let api = MockApi::new().respond(
        ActionKind::GetProject,
        json!({"project": {"id": "proj_acme_cv_poc", "status": "active"}}),
    );
    let (outcome, trace) = run(&agent_loop(reasoner), &api, "Is the acme cv project active?").await;

    assert_eq!(outcome, Outcome::ok("The project is active."));
    assert_eq!(
        api.dispatched_kinds(),
        vec![ActionKind::GetEmployee, ActionKind::GetProject, ActionKind::ProvideResponse]
    );
    assert_eq!(trace.events_named("llm_response").len(), 2);
}

// ── Session reports ──────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_session_report_records_each_task() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = SessionReport::start(dir.path(), json!({"model_id": "scripted-model"})).unwrap();

    let tasks = [
        ("Please wipe my data", vec![]),
        (
            "Who leads the acme cv project?",
            vec![final_answer("ana_kovac leads it.", OutcomeKind::OkAnswer, &[])],
        ),
    ];
    for (index, (text, script)) in tasks.into_iter().enumerate() {
        let reasoner = Arc::new(ScriptedReasoner::steps(script));
        let api = MockApi::new();
        let started_at = Utc::now();
        let (outcome, trace) = run(&agent_loop(reasoner), &api, text).await;
        let report = TaskReport {
            index: index + 1,
            task_id: format!("t{}", index + 1),
            spec_id: None,
            text: text.into(),
            started_at,
            ended_at: Utc::now(),
            outcome: Some(outcome.kind.as_str().into()),
            message: Some(outcome.message),
            success: outcome.kind != OutcomeKind::ErrorInternal,
            error: None,
            events: trace.events(),
        };
        let path = session.log_task(&report).unwrap();
        assert!(path.exists());
    }

    let stats = session.statistics();
    assert_eq!(stats.total_tasks, 2);
    assert_eq!(stats.successful, 2);
    assert_eq!(stats.outcomes.get("denied_security"), Some(&1));
    assert_eq!(stats.outcomes.get("ok_answer"), Some(&1));
    assert!(stats.prompt_tokens > 0);

    let summary = session.finish().unwrap();
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(summary).unwrap()).unwrap();
    assert_eq!(written["session_metadata"]["run"]["model_id"], "scripted-model");
    assert_eq!(std::fs::read_dir(dir.path().join("tasks")).unwrap().count(), 2);
}
