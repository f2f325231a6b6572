//! # OfficeClaw Core
//!
//! Domain types, traits, and error definitions for the OfficeClaw business
//! task agent. This crate has **no framework dependencies**: it defines the
//! domain model every other crate implements against.
//!
//! ## Design Philosophy
//!
//! The two external collaborators of the agent loop are traits defined here:
//! - [`Reasoner`]: context in, one structured step out
//! - [`BusinessApi`]: typed action in, typed response or typed error out
//!
//! Implementations live in their respective crates, so the loop can be driven
//! by scripted doubles in tests and by real HTTP backends in production.

pub mod action;
pub mod api;
pub mod error;
pub mod message;
pub mod outcome;
pub mod provider;
pub mod reasoner;
pub mod task;

// Re-export key types at crate root for ergonomics
pub use action::{Action, ActionKind, IdField, SkillFilter, TeamMember};
pub use api::{ApiResponse, BusinessApi, WhoAmI};
pub use error::{ApiError, Error, ProviderError, ReasonerError, Result};
pub use message::{Message, MessageToolCall, Role};
pub use outcome::{EntityKind, EntityLink, Outcome, OutcomeKind};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use reasoner::{NextStep, Reasoner, ReasoningReply, ReasoningRequest};
pub use task::{Actor, Task, TaskIntake};
