//! The OfficeClaw agent loop.
//!
//! One task at a time, the loop follows a **guard → reason → validate →
//! dispatch** cycle:
//!
//! 1. **Guard** the instruction and identity against policy patterns
//! 2. **Reason**: ask the engine for one structured step
//! 3. **Validate**: clamp limits, reject fabricated ids, enrich payloads,
//!    and hold back premature completions
//! 4. **Dispatch** the action, classify failures, feed results back
//!
//! The loop ends the moment an outcome exists, and that outcome is submitted
//! exactly once.

pub mod context;
pub mod dispatcher;
pub mod hints;
pub mod loop_runner;
pub mod prompt;
pub mod reasoner;
pub mod state;
pub mod validator;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use context::{CompressorLimits, SeenIds, compress, compress_with, extract_ids};
pub use dispatcher::{DispatchError, Dispatcher};
pub use loop_runner::AgentLoop;
pub use reasoner::{LlmReasoner, decode_step, extract_json};
pub use state::LoopState;
pub use validator::{ActionValidator, Completion};
