//! The agent loop: guard, reason, validate, dispatch, until one outcome.

use std::sync::Arc;
use officeclaw_config::{AgentConfig, AppConfig, PolicyConfig};
use officeclaw_core::action::{Action, ActionKind, ProvideResponse};
use officeclaw_core::api::BusinessApi;
use officeclaw_core::message::{Message, MessageToolCall};
use officeclaw_core::outcome::{Outcome, OutcomeKind};
use officeclaw_core::reasoner::{NextStep, Reasoner, ReasoningRequest};
use officeclaw_core::task::{Task, TaskIntake};
use officeclaw_security::{ErrorCategory, ErrorClassifier, GuardDecision, PatternGuard, PolicyError};
use officeclaw_telemetry::{TaskTrace, TraceEvent, short};
use tracing::{debug, info, warn};

use crate::dispatcher::{DispatchError, Dispatcher};
use crate::hints;
use crate::prompt;
use crate::state::{LoopState, head_chars};
use crate::validator::{self, ActionValidator, Completion};

const SCHEMA_REMINDER: &str = "Return valid JSON for NextStep schema.";

/// Drives one task from intake to its single submitted outcome.
///
/// The loop is stateless between tasks: every call to [`AgentLoop::run`]
/// builds a fresh [`LoopState`] and conversation, so one instance can serve
/// many concurrent workers.
pub struct AgentLoop {
    reasoner: Arc<dyn Reasoner>,
    guard: PatternGuard,
    classifier: ErrorClassifier,
    validator: ActionValidator,
    agent: AgentConfig,
    policy: PolicyConfig,
    exhaustion_words: Vec<String>,
}

impl AgentLoop {
    pub fn new(
        reasoner: Arc<dyn Reasoner>,
        guard: PatternGuard,
        classifier: ErrorClassifier,
        agent: AgentConfig,
        policy: PolicyConfig,
    ) -> Self {
        let validator = ActionValidator::new(&agent, &policy);
        let exhaustion_words = policy
            .exhaustion_status_words
            .iter()
            .map(|w| w.to_lowercase())
            .collect();
        Self {
            reasoner,
            guard,
            classifier,
            validator,
            agent,
            policy,
            exhaustion_words,
        }
    }

    /// Compile the guard and classifier from the `[policy]` tables.
    pub fn from_config(reasoner: Arc<dyn Reasoner>, config: &AppConfig) -> Result<Self, PolicyError> {
        let guard = PatternGuard::from_policy(&config.policy)?;
        let classifier = ErrorClassifier::from_policy(&config.policy);
        Ok(Self::new(
            reasoner,
            guard,
            classifier,
            config.agent.clone(),
            config.policy.clone(),
        ))
    }

    pub fn reasoner_name(&self) -> &str {
        self.reasoner.name()
    }

    /// Run one task to completion. Submits exactly one outcome to `api` and
    /// returns it.
    pub async fn run(&self, api: &dyn BusinessApi, intake: TaskIntake, trace: &TaskTrace) -> Outcome {
        let about = match api.who_am_i().await {
            Ok(about) => about,
            Err(e) => {
                warn!(task_id = %intake.task_id, error = %e, "Identity lookup failed");
                trace.record(TraceEvent::TaskStart {
                    spec_id: intake.spec_id.clone(),
                    text: intake.text.clone(),
                    user: "UNKNOWN".into(),
                });
                return self
                    .finish(api, trace, Outcome::internal_error("System unavailable."))
                    .await;
            }
        };

        let task = Task::from_intake(intake, &about);
        info!(task_id = %task.task_id, user = task.actor.label(), "Task started");
        trace.record(TraceEvent::TaskStart {
            spec_id: task.spec_id.clone(),
            text: task.instruction.clone(),
            user: task.actor.label().to_string(),
        });

        if let GuardDecision::ShortCircuit { rule, outcome } = self.guard.check(&task) {
            trace.record(TraceEvent::Guard {
                decision: rule.as_str().into(),
                reason: outcome.message.clone(),
            });
            return self.finish(api, trace, outcome).await;
        }
        trace.record(TraceEvent::Guard {
            decision: "continue".into(),
            reason: String::new(),
        });

        let outcome = self.drive(api, &task, trace).await;
        self.finish(api, trace, outcome).await
    }

    async fn drive(&self, api: &dyn BusinessApi, task: &Task, trace: &TaskTrace) -> Outcome {
        let lower = task.instruction_lower();
        let dispatcher = Dispatcher::new(api, &self.classifier, trace);
        let mut state = LoopState::new(&self.agent);
        let max_steps = self.agent.max_steps;

        let mut messages = vec![
            Message::system(prompt::build(api, task, self.agent.page_limit).await),
            Message::user(task.instruction.clone()),
        ];
        let code = hints::customer_code(&task.instruction);
        if let Some(code) = code {
            let hint = hints::customer_code_hint(code);
            trace.record(TraceEvent::Hint { text: hint.clone() });
            messages.push(Message::system(hint));
        }

        for step_index in 0..max_steps {
            let step_no = step_index + 1;
            if state.system_failures >= self.agent.system_failure_limit {
                return Outcome::internal_error("System unavailable.");
            }

            state.compress_memory();
            let context = state.context_note(
                step_no,
                max_steps,
                self.agent.scratch_tail,
                self.agent.ids_tail,
                code,
            );
            trace.record(TraceEvent::StepStart {
                step: step_no,
                note: short(&state.memory, 200),
            });
            trace.record(TraceEvent::LlmRequest {
                step: step_no,
                hint: context.clone(),
            });

            let request = ReasoningRequest {
                task_id: task.task_id.clone(),
                step: step_no,
                messages: messages.clone(),
                context,
            };
            let reply = match self.reasoner.propose(request).await {
                Ok(reply) => reply,
                Err(e) => {
                    state.reasoning_failures += 1;
                    warn!(
                        task_id = %task.task_id,
                        step = step_no,
                        failures = state.reasoning_failures,
                        error = %e,
                        "Reasoning step failed"
                    );
                    trace.record(TraceEvent::LlmError {
                        step: step_no,
                        error: e.to_string(),
                        failures: state.reasoning_failures,
                    });
                    if state.reasoning_failures >= self.agent.reasoning_retry_limit {
                        return Outcome::internal_error("System error.");
                    }
                    messages.push(Message::assistant(SCHEMA_REMINDER));
                    continue;
                }
            };

            let usage = reply.usage.clone().unwrap_or_default();
            trace.record(TraceEvent::LlmResponse {
                step: step_no,
                model: reply.model.clone(),
                raw: reply.raw.clone(),
                duration_ms: reply.duration_ms,
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
            });
            state.absorb_step(&reply.step);
            let NextStep {
                think,
                done,
                function: mut action,
                ..
            } = reply.step;

            if let Some((original, new)) = self.validator.clamp_limit(&mut action) {
                debug!(task_id = %task.task_id, original, new, "Page limit clamped");
                trace.record(TraceEvent::LimitOverride { original, new });
            }
            if let Some(id) = validator::find_hallucinated(&action) {
                let note = validator::hallucination_note(id);
                info!(task_id = %task.task_id, step = step_no, id, "Rejected fabricated id");
                trace.record(TraceEvent::Rejected { reason: note.clone() });
                messages.push(Message::system(note));
                continue;
            }
            let action = validator::enrich(action, task.actor.user_id());

            let action = match action {
                Action::ProvideResponse(response) => {
                    match self.complete(response, &mut state, &lower, step_index, task, trace) {
                        Ok(outcome) => return outcome,
                        Err(notes) => {
                            messages.extend(notes.into_iter().map(Message::system));
                            continue;
                        }
                    }
                }
                other => other,
            };

            let kind = action.kind();
            let call_id = format!("s{step_index}");
            messages.push(Message::assistant_call(
                think,
                MessageToolCall {
                    id: call_id.clone(),
                    name: kind.name().into(),
                    arguments: action.to_arguments_json(),
                },
            ));

            let response = match dispatcher.execute(&action).await {
                Ok(response) => response,
                Err(DispatchError::Domain { category, message }) => {
                    state.note(&format!("ERR[{category}]: {}", head_chars(&message, 60)));
                    match category {
                        ErrorCategory::Permission => return Outcome::denied("Permission denied."),
                        ErrorCategory::NotFound
                            if matches!(
                                kind,
                                ActionKind::UpdateProjectStatus | ActionKind::UpdateProjectTeam
                            ) =>
                        {
                            return Outcome::denied("You are not authorized to modify this project.");
                        }
                        ErrorCategory::System => {
                            state.system_failures += 1;
                            state.system_broken = true;
                            warn!(task_id = %task.task_id, action = %kind, %message, "Platform failure, stopping");
                            return Outcome::internal_error("System error.");
                        }
                        _ => {
                            messages.push(Message::tool_result(
                                &call_id,
                                format!("ERROR[{category}]: {message}"),
                            ));
                            continue;
                        }
                    }
                }
                Err(DispatchError::Fault(message)) => {
                    state.note(&format!("ERR: {}", head_chars(&message, 60)));
                    messages.push(Message::tool_result(&call_id, format!("ERROR: {message}")));
                    continue;
                }
            };

            let tool_out = response.to_text();
            if kind.is_mutation() {
                state.remember(&format!("✓{kind}"));
            }
            messages.push(Message::tool_result(
                &call_id,
                head_chars(&tool_out, self.agent.result_cap),
            ));

            let repeats = state.record_call(kind, action.key_argument());
            if repeats >= self.agent.loop_repeat_threshold {
                state.note(&format!("LOOP: {kind} x{repeats}"));
                let warning = format!(
                    "⚠️ WARNING: You called {kind} {repeats} times with same arguments. Change approach or provide final answer NOW."
                );
                trace.record(TraceEvent::Hint { text: warning.clone() });
                messages.push(Message::system(warning));
            }

            state.seen_ids.observe(&tool_out);
            state.remember(&short(&tool_out, 200));

            let found = hints::for_response(&action, &response, &lower, &self.policy.nordic_locations);
            if let Some(scratch) = &found.scratch {
                state.append_scratch(scratch);
            }
            for text in found.messages {
                trace.record(TraceEvent::Hint { text: text.clone() });
                messages.push(Message::system(text));
            }

            if done {
                let response = ProvideResponse {
                    message: "Done.".into(),
                    outcome: OutcomeKind::OkAnswer,
                    links: state.seen_ids.links_from_tail(5),
                };
                match self.complete(response, &mut state, &lower, step_index, task, trace) {
                    Ok(outcome) => return outcome,
                    Err(notes) => messages.extend(notes.into_iter().map(Message::system)),
                }
            }
        }

        info!(task_id = %task.task_id, max_steps, "Step budget exhausted");
        if state.system_broken {
            Outcome::internal_error("System error.")
        } else if self.exhaustion_words.iter().any(|w| lower.contains(w.as_str())) {
            Outcome::denied("Project not found or not authorized.")
        } else {
            Outcome::internal_error("Could not complete.").with_links(state.seen_ids.links_from_tail(3))
        }
    }

    /// Pass a final answer through the completion checks. `Err` carries the
    /// notes to feed back when the answer is premature.
    fn complete(
        &self,
        response: ProvideResponse,
        state: &mut LoopState,
        lower: &str,
        step_index: usize,
        task: &Task,
        trace: &TaskTrace,
    ) -> Result<Outcome, Vec<String>> {
        match self.validator.review_completion(response, state, lower, step_index) {
            Completion::Blocked { required, notes } => {
                info!(
                    task_id = %task.task_id,
                    step = step_index + 1,
                    %required,
                    blocks = state.block_count,
                    "Completion blocked"
                );
                trace.record(TraceEvent::Blocked {
                    required: required.name().into(),
                    blocks: state.block_count,
                });
                Err(notes)
            }
            Completion::Submit { response, forced } => {
                if let Some(required) = forced {
                    trace.record(TraceEvent::ForceAllow {
                        step: step_index,
                        required: required.name().into(),
                        blocks: state.block_count,
                    });
                }
                Ok(Outcome::new(response.outcome, response.message).with_links(response.links))
            }
        }
    }

    /// Submit the outcome. A failed submission is logged; the task still ends.
    async fn finish(&self, api: &dyn BusinessApi, trace: &TaskTrace, outcome: Outcome) -> Outcome {
        let submission = Action::ProvideResponse(ProvideResponse {
            message: outcome.message.clone(),
            outcome: outcome.kind,
            links: outcome.links.clone(),
        });
        if let Err(e) = api.dispatch(&submission).await {
            warn!(task_id = %trace.task_id(), error = %e, "Outcome submission failed");
            trace.record(TraceEvent::ToolResult {
                name: ActionKind::ProvideResponse.name().into(),
                ok: false,
                output: None,
                error: Some(e.to_string()),
                category: None,
            });
        }

        info!(task_id = %trace.task_id(), outcome = %outcome.kind, "Task finished");
        trace.record(TraceEvent::Final {
            outcome: outcome.kind.as_str().into(),
            message: outcome.message.clone(),
            links: outcome.links.iter().map(|l| l.id.clone()).collect(),
        });
        outcome
    }
}
