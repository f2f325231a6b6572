//! BusinessApi trait: the boundary to the business-domain platform.
//!
//! One typed request in, one typed response or typed error out. A client is
//! bound to a single task; the loop never shares one across tasks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::action::Action;
use crate::error::ApiError;

/// Identity and as-of date reported by the platform for a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhoAmI {
    /// Employee id of the acting user; absent for public access
    #[serde(default)]
    pub current_user: Option<String>,

    /// True when the task runs without an authenticated identity
    #[serde(default)]
    pub is_public: bool,

    /// As-of date (e.g. "2025-04-01")
    #[serde(default)]
    pub today: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiki_sha1: Option<String>,
}

/// A successful platform response.
///
/// The body is kept as JSON: the loop only ever inspects a handful of
/// collection fields and otherwise forwards the text to the reasoning engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiResponse(pub Value);

impl ApiResponse {
    pub fn new(body: Value) -> Self {
        Self(body)
    }

    /// Number of items in an array field, or `None` if absent or null.
    pub fn count(&self, field: &str) -> Option<usize> {
        self.0.get(field).and_then(Value::as_array).map(Vec::len)
    }

    /// True when the field is missing, null, or an empty array.
    pub fn is_empty_collection(&self, field: &str) -> bool {
        self.count(field).is_none_or(|n| n == 0)
    }

    /// Compact JSON text of the body.
    pub fn to_text(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }
}

/// The business-domain API as consumed by the agent loop.
#[async_trait]
pub trait BusinessApi: Send + Sync {
    /// Identity and date context for the bound task.
    async fn who_am_i(&self) -> Result<WhoAmI, ApiError>;

    /// Execute exactly one action as exactly one platform call.
    async fn dispatch(&self, action: &Action) -> Result<ApiResponse, ApiError>;
}
