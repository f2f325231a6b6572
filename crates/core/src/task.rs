//! Task intake records.

use serde::{Deserialize, Serialize};
use crate::api::WhoAmI;

/// A task as handed over by the scheduler, before the acting identity is known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskIntake {
    /// Opaque task identifier
    pub task_id: String,

    /// Benchmark/spec identifier, if the scheduler provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_id: Option<String>,

    /// Free-text instruction
    #[serde(alias = "task_text")]
    pub text: String,
}

/// Who the task runs as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Actor {
    /// An authenticated employee
    User(String),
    /// Anonymous/public access
    Guest,
}

impl Actor {
    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }

    /// The employee id of the acting user, if authenticated.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::User(id) => Some(id),
            Self::Guest => None,
        }
    }

    /// Label used in prompts and traces.
    pub fn label(&self) -> &str {
        match self {
            Self::User(id) => id,
            Self::Guest => "GUEST",
        }
    }
}

/// An immutable task: instruction, acting identity, and as-of date.
///
/// Read-only to the agent; never mutated once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_id: Option<String>,
    pub instruction: String,
    pub actor: Actor,
    /// As-of date reported by the platform (e.g. "2025-04-01")
    pub today: String,
}

impl Task {
    /// Bind an intake record to the identity reported by the platform.
    pub fn from_intake(intake: TaskIntake, about: &WhoAmI) -> Self {
        let actor = match (&about.current_user, about.is_public) {
            (Some(user), false) if !user.is_empty() => Actor::User(user.clone()),
            _ => Actor::Guest,
        };
        Self {
            task_id: intake.task_id,
            spec_id: intake.spec_id,
            instruction: intake.text,
            actor,
            today: about.today.clone(),
        }
    }

    /// Lowercased instruction, used by keyword heuristics.
    pub fn instruction_lower(&self) -> String {
        self.instruction.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intake() -> TaskIntake {
        TaskIntake {
            task_id: "t-1".into(),
            spec_id: Some("raise_salary".into()),
            text: "Raise salary of ana_kovac to 100k".into(),
        }
    }

    #[test]
    fn authenticated_user_becomes_actor() {
        let about = WhoAmI {
            current_user: Some("ana_kovac".into()),
            is_public: false,
            today: "2025-04-01".into(),
            ..WhoAmI::default()
        };
        let task = Task::from_intake(intake(), &about);
        assert_eq!(task.actor, Actor::User("ana_kovac".into()));
        assert_eq!(task.today, "2025-04-01");
    }

    #[test]
    fn public_access_is_guest_even_with_user() {
        let about = WhoAmI {
            current_user: Some("ana_kovac".into()),
            is_public: true,
            today: "2025-04-01".into(),
            ..WhoAmI::default()
        };
        let task = Task::from_intake(intake(), &about);
        assert!(task.actor.is_guest());
        assert_eq!(task.actor.label(), "GUEST");
    }

    #[test]
    fn intake_accepts_task_text_alias() {
        let intake: TaskIntake =
            serde_json::from_str(r#"{"task_id":"t1","task_text":"what's today's date?"}"#).unwrap();
        assert_eq!(intake.text, "what's today's date?");
        assert!(intake.spec_id.is_none());
    }
}
