//! Pattern guard: static policy checks that run before the agent loop.
//!
//! Checks, in order, first match wins:
//! 1. guest with a non-date instruction → denied
//! 2. guest with a date/time instruction → branded date answer
//! 3. deny pattern → denied with the rule's message
//! 4. unsupported-capability pattern → unsupported
//! 5. vague-reference pattern → clarification needed
//!
//! Patterns are matched against the lowercased instruction.

use officeclaw_config::{PatternRule, PolicyConfig};
use officeclaw_core::{Outcome, OutcomeKind, Task};
use regex_lite::Regex;

/// Which check produced a short-circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardRule {
    GuestDenied,
    GuestDate,
    Deny,
    Unsupported,
    Vague,
}

impl GuardRule {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GuestDenied => "guest_denied",
            Self::GuestDate => "guest_date",
            Self::Deny => "deny",
            Self::Unsupported => "unsupported",
            Self::Vague => "clarification",
        }
    }
}

/// Result of running the guard over a task.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardDecision {
    /// No rule matched; run the agent loop
    Continue,
    /// The task ends here with this outcome
    ShortCircuit { rule: GuardRule, outcome: Outcome },
}

/// Policy tables could not be compiled.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("Invalid policy pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

struct CompiledRule {
    regex: Regex,
    message: String,
}

/// Compiled pre-loop guard.
pub struct PatternGuard {
    deny: Vec<CompiledRule>,
    unsupported: Vec<CompiledRule>,
    vague: Vec<Regex>,
    date_words: Vec<String>,
    clarification_message: String,
    guest_denied_message: String,
    guest_brand: String,
}

impl std::fmt::Debug for PatternGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternGuard")
            .field("deny_rules", &self.deny.len())
            .field("unsupported_rules", &self.unsupported.len())
            .field("vague_rules", &self.vague.len())
            .finish()
    }
}

fn compile(pattern: &str) -> Result<Regex, PolicyError> {
    Regex::new(pattern).map_err(|e| PolicyError::InvalidPattern {
        pattern: pattern.into(),
        reason: e.to_string(),
    })
}

fn compile_rules(rules: &[PatternRule]) -> Result<Vec<CompiledRule>, PolicyError> {
    rules
        .iter()
        .map(|r| {
            Ok(CompiledRule {
                regex: compile(&r.pattern)?,
                message: r.message.clone(),
            })
        })
        .collect()
}

impl PatternGuard {
    /// Compile the guard from the `[policy]` tables.
    pub fn from_policy(policy: &PolicyConfig) -> Result<Self, PolicyError> {
        Ok(Self {
            deny: compile_rules(&policy.deny_patterns)?,
            unsupported: compile_rules(&policy.unsupported_patterns)?,
            vague: policy
                .vague_patterns
                .iter()
                .map(|p| compile(p))
                .collect::<Result<_, _>>()?,
            date_words: policy.date_words.iter().map(|w| w.to_lowercase()).collect(),
            clarification_message: policy.clarification_message.clone(),
            guest_denied_message: policy.guest_denied_message.clone(),
            guest_brand: policy.guest_brand.clone(),
        })
    }

    /// Whether a (lowercased) instruction is a pure date/time query.
    pub fn is_date_query(&self, lower: &str) -> bool {
        self.date_words.iter().any(|w| lower.contains(w.as_str()))
    }

    /// The branded answer to a guest date query.
    pub fn branded_date(&self, today: &str) -> String {
        format!("{today} — {}", self.guest_brand)
    }

    fn first_match<'a>(rules: &'a [CompiledRule], lower: &str) -> Option<&'a str> {
        rules
            .iter()
            .find(|r| r.regex.is_match(lower))
            .map(|r| r.message.as_str())
    }

    /// Run all checks against a task.
    pub fn check(&self, task: &Task) -> GuardDecision {
        let lower = task.instruction_lower();

        if task.actor.is_guest() {
            return if self.is_date_query(&lower) {
                short(
                    GuardRule::GuestDate,
                    Outcome::ok(self.branded_date(&task.today)),
                )
            } else {
                short(
                    GuardRule::GuestDenied,
                    Outcome::denied(self.guest_denied_message.clone()),
                )
            };
        }

        if let Some(message) = Self::first_match(&self.deny, &lower) {
            return short(GuardRule::Deny, Outcome::denied(message));
        }
        if let Some(message) = Self::first_match(&self.unsupported, &lower) {
            return short(
                GuardRule::Unsupported,
                Outcome::new(OutcomeKind::NoneUnsupported, message),
            );
        }
        if self.vague.iter().any(|re| re.is_match(&lower)) {
            return short(
                GuardRule::Vague,
                Outcome::new(
                    OutcomeKind::NoneClarificationNeeded,
                    self.clarification_message.clone(),
                ),
            );
        }

        GuardDecision::Continue
    }
}

fn short(rule: GuardRule, outcome: Outcome) -> GuardDecision {
    tracing::debug!(rule = rule.as_str(), outcome = %outcome.kind, "guard short-circuit");
    GuardDecision::ShortCircuit { rule, outcome }
}
