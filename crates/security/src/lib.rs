//! Security policy for OfficeClaw: pre-loop guard and error classification.
//!
//! Provides:
//! - **Pattern guard**: guest restriction, deny/unsupported/vague instruction
//!   patterns that end a task before any reasoning step runs
//! - **Error classifier**: maps a domain error message to a recovery category
//!
//! Both are compiled once from the `[policy]` tables of the configuration and
//! passed explicitly to the agent loop.

pub mod classifier;
pub mod guard;

pub use classifier::{ErrorCategory, ErrorClassifier};
pub use guard::{GuardDecision, GuardRule, PatternGuard, PolicyError};
