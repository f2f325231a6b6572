//! Terminal task outcomes and entity links.

use serde::{Deserialize, Serialize};

/// Outcome label.
///
/// `OkNotFound` may be *proposed* by a reasoning step but is never surfaced;
/// see [`OutcomeKind::surfaced`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    #[default]
    OkAnswer,
    OkNotFound,
    DeniedSecurity,
    ErrorInternal,
    NoneUnsupported,
    NoneClarificationNeeded,
}

impl OutcomeKind {
    /// The label reported to the caller. "Entity confirmed absent" is
    /// reported as a plain answer.
    pub fn surfaced(self) -> Self {
        match self {
            Self::OkNotFound => Self::OkAnswer,
            other => other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OkAnswer => "ok_answer",
            Self::OkNotFound => "ok_not_found",
            Self::DeniedSecurity => "denied_security",
            Self::ErrorInternal => "error_internal",
            Self::NoneUnsupported => "none_unsupported",
            Self::NoneClarificationNeeded => "none_clarification_needed",
        }
    }
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Project,
    Employee,
    Customer,
}

/// A typed reference to an entity mentioned in the answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityLink {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityLink {
    /// Infer the link kind from the identifier prefix.
    pub fn from_id(id: &str) -> Option<Self> {
        let kind = if id.contains("proj_") {
            EntityKind::Project
        } else if id.contains("emp_") {
            EntityKind::Employee
        } else if id.contains("cust_") {
            EntityKind::Customer
        } else {
            return None;
        };
        Some(Self { kind, id: id.to_string() })
    }
}

/// The single terminal report of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub message: String,
    #[serde(default)]
    pub links: Vec<EntityLink>,
}

impl Outcome {
    pub fn new(kind: OutcomeKind, message: impl Into<String>) -> Self {
        Self {
            kind: kind.surfaced(),
            message: message.into(),
            links: Vec::new(),
        }
    }

    pub fn with_links(mut self, links: Vec<EntityLink>) -> Self {
        self.links = links;
        self
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(OutcomeKind::OkAnswer, message)
    }

    pub fn denied(message: impl Into<String>) -> Self {
        Self::new(OutcomeKind::DeniedSecurity, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(OutcomeKind::ErrorInternal, message)
    }
}
