//! Domain error classification.
//!
//! Case-insensitive substring match against fixed indicator lists. The first
//! matching category wins in the order permission, system, not_found. An
//! HTTP 5xx status counts as a system indicator.

use officeclaw_config::PolicyConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Permission,
    System,
    NotFound,
    Other,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Permission => "permission",
            Self::System => "system",
            Self::NotFound => "not_found",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Indicator lists, lowercased once at construction.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    categories: [(ErrorCategory, Vec<String>); 3],
}

fn lowered(items: &[String]) -> Vec<String> {
    items.iter().map(|s| s.to_lowercase()).collect()
}

impl ErrorClassifier {
    pub fn from_policy(policy: &PolicyConfig) -> Self {
        Self {
            categories: [
                (ErrorCategory::Permission, lowered(&policy.permission_indicators)),
                (ErrorCategory::System, lowered(&policy.system_indicators)),
                (ErrorCategory::NotFound, lowered(&policy.not_found_indicators)),
            ],
        }
    }

    pub fn classify(&self, message: &str) -> ErrorCategory {
        let lower = message.to_lowercase();
        self.categories
            .iter()
            .find(|(_, indicators)| indicators.iter().any(|i| lower.contains(i.as_str())))
            .map(|(category, _)| *category)
            .unwrap_or(ErrorCategory::Other)
    }

    /// Classify a failed call by body and HTTP status. A 5xx status is a
    /// system failure unless the body already signals a permission problem.
    pub fn classify_status(&self, status: u16, message: &str) -> ErrorCategory {
        match self.classify(message) {
            ErrorCategory::Permission => ErrorCategory::Permission,
            _ if status >= 500 => ErrorCategory::System,
            category => category,
        }
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::from_policy(&PolicyConfig::default())
    }
}
