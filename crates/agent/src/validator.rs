//! Action validation and enrichment.
//!
//! Runs between decoding a reasoning step and dispatching its action:
//!
//! - page-size parameters are clamped to the platform ceiling
//! - identifiers that look fabricated reject the action outright
//! - time entries, employee searches, and employee updates are normalized
//! - a final response claiming success is held back while a mutation the
//!   instruction clearly asks for has never been executed

use officeclaw_config::{AgentConfig, PolicyConfig};
use officeclaw_core::action::{
    Action, ActionKind, LogTimeEntry, ProvideResponse, SearchEmployees, UpdateEmployeeInfo,
};
use officeclaw_core::outcome::OutcomeKind;
use regex_lite::Regex;
use std::sync::LazyLock;
use crate::state::{LoopState, tail_chars};

static NUMERIC_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(proj|emp|cust)_\d{1,5}$").expect("numeric id regex"));
static WORD_EMPLOYEE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^emp_[a-z]+$").expect("word employee regex"));

pub const DEFAULT_WORK_CATEGORY: &str = "development";
pub const DEFAULT_ENTRY_STATUS: &str = "draft";

/// Message used when a status change was asked for but never executed.
pub const STATUS_NOT_CHANGED: &str = "Project not found or you are not authorized to modify it.";

/// Identifier shapes the platform never issues (`proj_105`, `emp_1`, `emp_jane`).
pub fn looks_hallucinated(id: &str) -> bool {
    if id.is_empty() {
        return false;
    }
    NUMERIC_ID.is_match(id) || WORD_EMPLOYEE_ID.is_match(id)
}

/// The first identifier-bearing parameter that looks fabricated.
pub fn find_hallucinated(action: &Action) -> Option<&str> {
    action
        .id_fields()
        .into_iter()
        .map(|(_, id)| id)
        .find(|id| looks_hallucinated(id))
}

pub fn hallucination_note(id: &str) -> String {
    format!("⛔ ID '{id}' looks hallucinated. Use exact ID from API response.")
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Fill policy defaults and strip values that must not be sent.
pub fn enrich(action: Action, current_user: Option<&str>) -> Action {
    match action {
        Action::LogTimeEntry(entry) => Action::LogTimeEntry(enrich_time_entry(entry, current_user)),
        Action::SearchEmployees(search) => Action::SearchEmployees(clear_zero_max_levels(search)),
        Action::UpdateEmployeeInfo(update) => {
            Action::UpdateEmployeeInfo(whitelist_employee_update(update, current_user))
        }
        other => other,
    }
}

fn enrich_time_entry(mut entry: LogTimeEntry, current_user: Option<&str>) -> LogTimeEntry {
    entry.logged_by = non_blank(entry.logged_by).or_else(|| current_user.map(String::from));
    entry.work_category =
        non_blank(entry.work_category).or_else(|| Some(DEFAULT_WORK_CATEGORY.into()));
    entry.status = non_blank(entry.status).or_else(|| Some(DEFAULT_ENTRY_STATUS.into()));
    entry.billable = entry.billable.or(Some(true));
    entry
}

/// A maximum level of 0 means "no upper bound".
fn clear_zero_max_levels(mut search: SearchEmployees) -> SearchEmployees {
    for skill in &mut search.skills {
        if skill.max_level == Some(0) {
            skill.max_level = None;
        }
    }
    search
}

/// Rebuild the update from explicitly supplied, non-empty fields only.
/// Anything omitted stays omitted so the platform leaves it untouched.
fn whitelist_employee_update(update: UpdateEmployeeInfo, current_user: Option<&str>) -> UpdateEmployeeInfo {
    UpdateEmployeeInfo {
        employee: update.employee,
        changed_by: non_blank(update.changed_by).or_else(|| current_user.map(String::from)),
        salary: update.salary,
        department: non_blank(update.department),
        location: non_blank(update.location),
        notes: non_blank(update.notes),
        skills: update.skills.filter(|s| !s.is_empty()),
        wills: update.wills.filter(|w| !w.is_empty()),
    }
}

/// What to do with a proposed final response.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Submit this (possibly rewritten) response. `forced` names a required
    /// mutation that was waived because the step budget is nearly spent.
    Submit {
        response: ProvideResponse,
        forced: Option<ActionKind>,
    },
    /// Do not submit; push `notes` into the conversation and reason again.
    Blocked {
        required: ActionKind,
        notes: Vec<String>,
    },
}

/// Policy-driven checks applied to proposed actions.
#[derive(Debug, Clone)]
pub struct ActionValidator {
    page_limit: u32,
    max_steps: usize,
    force_allow_window: usize,
    block_escalation: u32,
    status_words: Vec<String>,
}

impl ActionValidator {
    pub fn new(agent: &AgentConfig, policy: &PolicyConfig) -> Self {
        Self {
            page_limit: agent.page_limit,
            max_steps: agent.max_steps,
            force_allow_window: agent.force_allow_window,
            block_escalation: agent.block_escalation,
            status_words: policy.status_words.iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    /// Clamp the page size. Returns `(requested, clamped)` when a change was made.
    pub fn clamp_limit(&self, action: &mut Action) -> Option<(u32, u32)> {
        let limit = action.limit_mut()?;
        match *limit {
            Some(requested) if requested > self.page_limit => {
                *limit = Some(self.page_limit);
                Some((requested, self.page_limit))
            }
            _ => None,
        }
    }

    /// The instruction asks for a project status change.
    pub fn is_status_task(&self, lower: &str) -> bool {
        lower.contains("status") && self.status_words.iter().any(|w| lower.contains(w.as_str()))
    }

    /// Mutations implied by the instruction, in check order.
    pub fn implied_mutations(&self, lower: &str) -> Vec<ActionKind> {
        let mut kinds = Vec::new();
        if (lower.contains("log") || lower.contains("record")) && lower.contains("hour") {
            kinds.push(ActionKind::LogTimeEntry);
        }
        if (lower.contains("raise") || lower.contains("increase")) && lower.contains("salary") {
            kinds.push(ActionKind::UpdateEmployeeInfo);
        }
        if self.is_status_task(lower) {
            kinds.push(ActionKind::UpdateProjectStatus);
        }
        kinds
    }

    /// The mutation still missing before success may be reported. When
    /// several are missing the last one checked is reported.
    pub fn missing_mutation(&self, lower: &str, state: &LoopState) -> Option<ActionKind> {
        self.implied_mutations(lower)
            .into_iter()
            .rev()
            .find(|kind| !state.has_called(*kind))
    }

    /// Gate a proposed final response. `step` is the zero-based step index.
    pub fn review_completion(
        &self,
        mut response: ProvideResponse,
        state: &mut LoopState,
        lower: &str,
        step: usize,
    ) -> Completion {
        let proposed = response.outcome;
        response.outcome = proposed.surfaced();
        let mut forced = None;

        if response.outcome == OutcomeKind::OkAnswer && !state.system_broken {
            if let Some(required) = self.missing_mutation(lower, state) {
                state.block_count += 1;
                if step + self.force_allow_window < self.max_steps {
                    let mut notes = vec![format!(
                        "⛔ BLOCKED: Task requires {required} but it was never called. Execute it first."
                    )];
                    if state.block_count >= self.block_escalation {
                        notes.push(format!(
                            "⛔ CRITICAL: Blocked {}x. STOP SEARCHING. Call {required} NOW with IDs from memory: {}",
                            state.block_count,
                            tail_chars(&state.memory, 200)
                        ));
                    }
                    return Completion::Blocked { required, notes };
                }
                forced = Some(required);
            }

            if self.is_status_task(lower) && !state.has_called(ActionKind::UpdateProjectStatus) {
                response.outcome = OutcomeKind::DeniedSecurity;
                response.message = STATUS_NOT_CHANGED.into();
            }
        }

        if proposed == OutcomeKind::ErrorInternal || state.system_broken {
            response.links.clear();
        }

        Completion::Submit { response, forced }
    }
}
