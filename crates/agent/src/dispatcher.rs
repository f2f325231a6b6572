//! Domain action dispatch.
//!
//! One action, one platform call. Failures come back classified so the loop
//! can pick a recovery policy without inspecting raw messages itself.

use officeclaw_core::action::Action;
use officeclaw_core::api::{ApiResponse, BusinessApi};
use officeclaw_core::error::ApiError;
use officeclaw_security::{ErrorCategory, ErrorClassifier};
use officeclaw_telemetry::{TaskTrace, TraceEvent, short};
use tracing::debug;

/// Characters of a successful response kept in the trace event.
const TRACE_OUTPUT_LEN: usize = 300;

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchError {
    /// The platform rejected the request with a readable message.
    Domain {
        category: ErrorCategory,
        message: String,
    },
    /// Anything else: connection failures, undecodable responses.
    Fault(String),
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Domain { category, message } => write!(f, "[{category}] {message}"),
            Self::Fault(message) => f.write_str(message),
        }
    }
}

pub struct Dispatcher<'a> {
    api: &'a dyn BusinessApi,
    classifier: &'a ErrorClassifier,
    trace: &'a TaskTrace,
}

impl<'a> Dispatcher<'a> {
    pub fn new(api: &'a dyn BusinessApi, classifier: &'a ErrorClassifier, trace: &'a TaskTrace) -> Self {
        Self { api, classifier, trace }
    }

    /// Execute `action` as exactly one platform call.
    pub async fn execute(&self, action: &Action) -> Result<ApiResponse, DispatchError> {
        let name = action.kind().name().to_string();
        self.trace.record(TraceEvent::ToolCall {
            name: name.clone(),
            args: serde_json::to_value(action).unwrap_or_default(),
        });

        match self.api.dispatch(action).await {
            Ok(response) => {
                self.trace.record(TraceEvent::ToolResult {
                    name,
                    ok: true,
                    output: Some(short(&response.to_text(), TRACE_OUTPUT_LEN)),
                    error: None,
                    category: None,
                });
                Ok(response)
            }
            Err(ApiError::Domain { status, message }) => {
                let category = self.classifier.classify_status(status, &message);
                debug!(action = %name, status, %category, "Domain error");
                self.trace.record(TraceEvent::ToolResult {
                    name,
                    ok: false,
                    output: None,
                    error: Some(message.clone()),
                    category: Some(category.as_str().into()),
                });
                Err(DispatchError::Domain { category, message })
            }
            Err(ApiError::Transport(message)) => {
                self.trace.record(TraceEvent::ToolResult {
                    name,
                    ok: false,
                    output: None,
                    error: Some(message.clone()),
                    category: None,
                });
                Err(DispatchError::Fault(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockApi;
    use officeclaw_core::action::{ActionKind, EntityRef, UpdateProjectStatus};
    use serde_json::json;

    fn get_project() -> Action {
        Action::GetProject(EntityRef { id: "proj_acme_cv_poc".into() })
    }

    #[tokio::test]
    async fn success_is_traced_with_output() {
        let api = MockApi::new().respond(ActionKind::GetProject, json!({"project": {"id": "proj_acme_cv_poc"}}));
        let classifier = ErrorClassifier::default();
        let trace = TaskTrace::new("t1", 4000);
        let dispatcher = Dispatcher::new(&api, &classifier, &trace);

        let response = dispatcher.execute(&get_project()).await.unwrap();
        assert_eq!(response.0["project"]["id"], "proj_acme_cv_poc");
        assert_eq!(api.dispatched_kinds(), vec![ActionKind::GetProject]);

        let results = trace.events_named("tool_result");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].data["ok"], true);
        assert_eq!(trace.events_named("tool_call")[0].str_field("name"), "GetProject");
    }

    #[tokio::test]
    async fn domain_error_is_classified() {
        let api = MockApi::new().fail(ActionKind::UpdateProjectStatus, 403, "Only lead can change status");
        let classifier = ErrorClassifier::default();
        let trace = TaskTrace::new("t2", 4000);
        let dispatcher = Dispatcher::new(&api, &classifier, &trace);
        let action = Action::UpdateProjectStatus(UpdateProjectStatus {
            id: "proj_acme_cv_poc".into(),
            status: "archived".into(),
            changed_by: None,
        });

        let err = dispatcher.execute(&action).await.unwrap_err();
        assert_eq!(
            err,
            DispatchError::Domain {
                category: ErrorCategory::Permission,
                message: "Only lead can change status".into()
            }
        );
        assert_eq!(trace.events_named("tool_result")[0].str_field("category"), "permission");
    }

    #[tokio::test]
    async fn server_status_without_code_in_body_is_system() {
        let api = MockApi::new().fail(ActionKind::GetProject, 502, "Bad Gateway");
        let classifier = ErrorClassifier::default();
        let trace = TaskTrace::new("t4", 4000);
        let dispatcher = Dispatcher::new(&api, &classifier, &trace);

        let err = dispatcher.execute(&get_project()).await.unwrap_err();
        assert_eq!(
            err,
            DispatchError::Domain {
                category: ErrorCategory::System,
                message: "Bad Gateway".into()
            }
        );
        assert_eq!(trace.events_named("tool_result")[0].str_field("category"), "system");
    }

    #[tokio::test]
    async fn transport_failure_is_a_fault() {
        let api = MockApi::new().fault(ActionKind::GetProject, "connection reset");
        let classifier = ErrorClassifier::default();
        let trace = TaskTrace::new("t3", 4000);
        let dispatcher = Dispatcher::new(&api, &classifier, &trace);

        let err = dispatcher.execute(&get_project()).await.unwrap_err();
        assert_eq!(err, DispatchError::Fault("connection reset".into()));
        assert_eq!(err.to_string(), "connection reset");
    }
}
