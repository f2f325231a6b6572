//! LLM Provider implementations for OfficeClaw.
//!
//! All providers implement the `officeclaw_core::Provider` trait.
//! The router selects the correct provider based on configuration, and
//! [`RateLimitedProvider`] paces calls shared across concurrent workers.

pub mod openai_compat;
pub mod rate_limit;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use rate_limit::{RateLimitedProvider, RateLimiter};
pub use router::{ProviderRouter, build_from_config};
