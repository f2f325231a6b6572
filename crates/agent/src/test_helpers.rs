//! Scripted test doubles for the reasoning engine and the business API.

use async_trait::async_trait;
use officeclaw_core::action::{Action, ActionKind, ProvideResponse};
use officeclaw_core::api::{ApiResponse, BusinessApi, WhoAmI};
use officeclaw_core::error::{ApiError, ReasonerError};
use officeclaw_core::outcome::{EntityLink, OutcomeKind};
use officeclaw_core::reasoner::{NextStep, Reasoner, ReasoningReply, ReasoningRequest};
use officeclaw_core::provider::Usage;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// A reasoner that replays a fixed script of steps and failures.
///
/// Panics if called more often than scripted, unless built with
/// [`ScriptedReasoner::repeating`], in which case the last entry repeats.
pub struct ScriptedReasoner {
    script: Mutex<VecDeque<Result<NextStep, ReasonerError>>>,
    repeat_last: bool,
    requests: Mutex<Vec<ReasoningRequest>>,
}

impl ScriptedReasoner {
    pub fn new(script: Vec<Result<NextStep, ReasonerError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            repeat_last: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A script of successful steps.
    pub fn steps(steps: Vec<NextStep>) -> Self {
        Self::new(steps.into_iter().map(Ok).collect())
    }

    pub fn repeating(mut self) -> Self {
        self.repeat_last = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every request received, oldest first.
    pub fn requests(&self) -> Vec<ReasoningRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Reasoner for ScriptedReasoner {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn propose(&self, request: ReasoningRequest) -> Result<ReasoningReply, ReasonerError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };
        let next = {
            let mut script = self.script.lock().unwrap();
            if script.len() == 1 && self.repeat_last {
                script.front().cloned()
            } else {
                script.pop_front()
            }
        };
        let Some(entry) = next else {
            panic!("ScriptedReasoner: no more steps (call #{call})");
        };
        entry.map(|step| ReasoningReply {
            raw: serde_json::to_string(&step).unwrap_or_default(),
            step,
            model: "scripted-model".into(),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            duration_ms: 1,
        })
    }
}

/// A step proposing `action` with a short thought.
pub fn step(action: Action) -> NextStep {
    NextStep::propose(action)
}

/// A step proposing `action` and carrying a memory delta.
pub fn step_with_memory(action: Action, memory: &str) -> NextStep {
    let mut s = NextStep::propose(action);
    s.memory = memory.into();
    s
}

/// A final-response step.
pub fn final_answer(message: &str, outcome: OutcomeKind, link_ids: &[&str]) -> NextStep {
    NextStep::propose(Action::ProvideResponse(ProvideResponse {
        message: message.into(),
        outcome,
        links: link_ids.iter().filter_map(|id| EntityLink::from_id(id)).collect(),
    }))
}

/// Decode an action from its wire JSON.
pub fn action(json: &str) -> Action {
    serde_json::from_str(json).unwrap()
}

/// In-memory business API with scripted results per operation.
///
/// Each operation replays its queue of results; the last one repeats.
/// Unscripted operations answer `{}`.
pub struct MockApi {
    who: WhoAmI,
    scripted: Mutex<HashMap<ActionKind, VecDeque<Result<Value, ApiError>>>>,
    dispatched: Mutex<Vec<Action>>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockApi {
    /// Authenticated as `jane_doe` on 2025-04-01.
    pub fn new() -> Self {
        Self {
            who: WhoAmI {
                current_user: Some("jane_doe".into()),
                is_public: false,
                today: "2025-04-01".into(),
                ..Default::default()
            },
            scripted: Mutex::new(HashMap::new()),
            dispatched: Mutex::new(Vec::new()),
        }
    }

    /// Public access without an identity.
    pub fn guest() -> Self {
        let mut api = Self::new();
        api.who.current_user = None;
        api.who.is_public = true;
        api
    }

    pub fn as_user(mut self, user: &str) -> Self {
        self.who.current_user = Some(user.into());
        self.who.is_public = false;
        self
    }

    fn push(self, kind: ActionKind, result: Result<Value, ApiError>) -> Self {
        self.scripted
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push_back(result);
        self
    }

    pub fn respond(self, kind: ActionKind, body: Value) -> Self {
        self.push(kind, Ok(body))
    }

    pub fn fail(self, kind: ActionKind, status: u16, message: &str) -> Self {
        self.push(kind, Err(ApiError::domain(status, message)))
    }

    pub fn fault(self, kind: ActionKind, message: &str) -> Self {
        self.push(kind, Err(ApiError::Transport(message.into())))
    }

    /// Every dispatched action, oldest first.
    pub fn dispatched(&self) -> Vec<Action> {
        self.dispatched.lock().unwrap().clone()
    }

    pub fn dispatched_kinds(&self) -> Vec<ActionKind> {
        self.dispatched().iter().map(Action::kind).collect()
    }

    /// Dispatches other than the final submission.
    pub fn domain_calls(&self) -> usize {
        self.dispatched().iter().filter(|a| !a.is_final()).count()
    }

    /// Final submissions received.
    pub fn submissions(&self) -> Vec<ProvideResponse> {
        self.dispatched()
            .into_iter()
            .filter_map(|a| match a {
                Action::ProvideResponse(r) => Some(r),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl BusinessApi for MockApi {
    async fn who_am_i(&self) -> Result<WhoAmI, ApiError> {
        Ok(self.who.clone())
    }

    async fn dispatch(&self, action: &Action) -> Result<ApiResponse, ApiError> {
        self.dispatched.lock().unwrap().push(action.clone());
        let mut scripted = self.scripted.lock().unwrap();
        let result = match scripted.get_mut(&action.kind()) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        match result {
            Some(Ok(body)) => Ok(ApiResponse::new(body)),
            Some(Err(e)) => Err(e),
            None => Ok(ApiResponse::new(Value::Object(Default::default()))),
        }
    }
}
