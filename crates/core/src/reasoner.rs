//! Reasoner trait: the reasoning engine as a black box.
//!
//! Given the ordered conversation plus an ephemeral per-step context note, a
//! reasoner returns one [`NextStep`]: notes, flags, and exactly one proposed
//! [`Action`]. Any output that cannot be decoded into this record is a
//! failure (`ReasonerError::Malformed`), never a partial step.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::action::Action;
use crate::error::ReasonerError;
use crate::message::Message;
use crate::provider::Usage;

/// One structured reasoning step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextStep {
    /// Brief reasoning (1-2 sentences)
    #[serde(default)]
    pub think: String,

    /// Working notes, overwritten each step
    #[serde(default)]
    pub scratch: String,

    /// Confirmed facts to append to memory
    #[serde(default)]
    pub memory: String,

    /// Mutations the engine believes it has performed
    #[serde(default)]
    pub actions_done: Vec<String>,

    /// Search filters already tried
    #[serde(default)]
    pub filters_tried: Vec<String>,

    /// Next 1-2 steps
    #[serde(default)]
    pub plan: Vec<String>,

    #[serde(default)]
    pub done: bool,

    #[serde(default)]
    pub confirm: bool,

    #[serde(default)]
    pub fallback: bool,

    /// The single proposed action
    pub function: Action,
}

impl NextStep {
    /// A bare step proposing `action` with no notes.
    pub fn propose(action: Action) -> Self {
        Self {
            think: String::new(),
            scratch: String::new(),
            memory: String::new(),
            actions_done: Vec::new(),
            filters_tried: Vec::new(),
            plan: Vec::new(),
            done: false,
            confirm: false,
            fallback: false,
            function: action,
        }
    }
}

/// Input to one reasoning call.
#[derive(Debug, Clone)]
pub struct ReasoningRequest {
    pub task_id: String,
    /// 1-based step number
    pub step: usize,
    /// Full conversation so far (system prompt, instruction, turns)
    pub messages: Vec<Message>,
    /// Ephemeral context note for this step only
    pub context: String,
}

/// A decoded step plus what the trace needs to know about the call.
#[derive(Debug, Clone)]
pub struct ReasoningReply {
    pub step: NextStep,
    /// Raw completion text as returned by the engine
    pub raw: String,
    pub model: String,
    pub usage: Option<Usage>,
    pub duration_ms: u64,
}

#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Human-readable name (model id or test double name).
    fn name(&self) -> &str;

    /// Propose the next step.
    async fn propose(&self, request: ReasoningRequest) -> Result<ReasoningReply, ReasonerError>;
}
