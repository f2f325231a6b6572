//! LLM-backed reasoner.
//!
//! Sends the conversation plus the step's context note to a chat provider,
//! asks for a JSON object, and decodes the reply into a [`NextStep`].
//! Replies wrapped in a role prefix or a code fence are unwrapped, and the
//! first balanced `{...}` object is used.

use async_trait::async_trait;
use officeclaw_core::error::ReasonerError;
use officeclaw_core::message::Message;
use officeclaw_core::provider::{Provider, ProviderRequest};
use officeclaw_core::reasoner::{NextStep, Reasoner, ReasoningReply, ReasoningRequest};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

const PREFIXES: &[&str] = &["Assistant:", "assistant:", "```json", "```"];

/// Strip known wrappers and cut out the first balanced JSON object.
///
/// Input without any `{` is returned stripped but otherwise unchanged; an
/// unterminated object runs to the end of the text.
pub fn extract_json(raw: &str) -> &str {
    let mut text = raw.trim();
    for prefix in PREFIXES {
        if text.len() >= prefix.len()
            && text.is_char_boundary(prefix.len())
            && text[..prefix.len()].eq_ignore_ascii_case(prefix)
        {
            text = text[prefix.len()..].trim();
        }
    }
    if let Some(stripped) = text.strip_suffix("```") {
        text = stripped.trim();
    }

    let Some(start) = text.find('{') else {
        return text;
    };
    let mut depth: i64 = 0;
    for (i, c) in text[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
        if depth == 0 {
            return &text[start..start + i + 1];
        }
    }
    &text[start..]
}

/// Decode a step, falling back to [`extract_json`] when the raw text is not
/// a bare JSON object.
pub fn decode_step(raw: &str) -> Result<NextStep, ReasonerError> {
    if raw.trim().is_empty() {
        return Err(ReasonerError::Malformed("empty completion".into()));
    }
    if let Ok(step) = serde_json::from_str::<NextStep>(raw) {
        return Ok(step);
    }
    serde_json::from_str::<NextStep>(extract_json(raw))
        .map_err(|e| ReasonerError::Malformed(format!("no NextStep in completion: {e}")))
}

/// Reasoner over any chat-completion [`Provider`].
pub struct LlmReasoner {
    provider: Arc<dyn Provider>,
    model: String,
    routing: Option<Value>,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl LlmReasoner {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            routing: None,
            temperature: 0.0,
            max_tokens: None,
        }
    }

    /// Provider-routing preferences forwarded with every request.
    pub fn with_routing(mut self, routing: Option<Value>) -> Self {
        self.routing = routing;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, request: ReasoningRequest) -> ProviderRequest {
        let mut messages = request.messages;
        messages.push(Message::system(request.context));

        let mut provider_request = ProviderRequest::new(&self.model, messages);
        provider_request.temperature = self.temperature;
        provider_request.max_tokens = self.max_tokens;
        provider_request.response_format = Some(serde_json::json!({ "type": "json_object" }));
        provider_request.routing = self.routing.clone();
        provider_request
    }
}

#[async_trait]
impl Reasoner for LlmReasoner {
    fn name(&self) -> &str {
        &self.model
    }

    async fn propose(&self, request: ReasoningRequest) -> Result<ReasoningReply, ReasonerError> {
        let task_id = request.task_id.clone();
        let step = request.step;
        let provider_request = self.build_request(request);

        let started = Instant::now();
        let response = self.provider.complete(provider_request).await?;
        let duration_ms = started.elapsed().as_millis() as u64;

        let raw = response.message.content.trim().to_string();
        debug!(%task_id, step, duration_ms, chars = raw.len(), "Reasoning reply");

        let next = decode_step(&raw)?;
        Ok(ReasoningReply {
            step: next,
            raw,
            model: if response.model.is_empty() {
                self.model.clone()
            } else {
                response.model
            },
            usage: response.usage,
            duration_ms,
        })
    }
}
