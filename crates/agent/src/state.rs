//! Per-task loop state.
//!
//! Owned by a single run of the loop and dropped when the task ends. Memory
//! and scratch are bounded strings; identifiers and call history only grow.

use officeclaw_config::AgentConfig;
use officeclaw_core::action::ActionKind;
use officeclaw_core::reasoner::NextStep;
use crate::context::{CompressorLimits, SeenIds, compress_with, compressor};

/// Last `n` characters of `s`.
pub fn tail_chars(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    match s.char_indices().nth(count - n) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

/// First `n` characters of `s`.
pub fn head_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[derive(Debug, Clone)]
pub struct LoopState {
    /// Compressed confirmed facts, `|`-delimited
    pub memory: String,
    /// Working notes, replaced by each reasoning step
    pub scratch: String,
    pub seen_ids: SeenIds,
    /// (operation, key argument) of every successful dispatch
    pub call_history: Vec<(ActionKind, String)>,
    pub reasoning_failures: u32,
    pub system_failures: u32,
    /// Premature-completion attempts blocked so far
    pub block_count: u32,
    pub system_broken: bool,
    limits: CompressorLimits,
    scratch_keep: usize,
}

impl LoopState {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            memory: String::new(),
            scratch: String::new(),
            seen_ids: SeenIds::new(),
            call_history: Vec::new(),
            reasoning_failures: 0,
            system_failures: 0,
            block_count: 0,
            system_broken: false,
            limits: CompressorLimits {
                window: config.memory_window,
                keep: config.memory_keep,
            },
            scratch_keep: config.scratch_keep,
        }
    }

    pub fn compress_memory(&mut self) {
        self.memory = compress_with(&self.memory, self.limits);
    }

    /// Append a fragment verbatim. Compression runs before the next reasoning call.
    pub fn note(&mut self, fragment: &str) {
        self.memory.push_str(" | ");
        self.memory.push_str(fragment);
    }

    /// Append a fragment and compress immediately.
    pub fn remember(&mut self, fragment: &str) {
        self.memory = compressor::append(&self.memory, fragment, self.limits);
    }

    pub fn append_scratch(&mut self, text: &str) {
        self.scratch.push_str(text);
        self.scratch = tail_chars(&self.scratch, self.scratch_keep).to_string();
    }

    /// Fold a decoded reasoning step into state: memory delta, scratch, and
    /// any identifiers mentioned in either.
    pub fn absorb_step(&mut self, step: &NextStep) {
        self.reasoning_failures = 0;
        let memory_delta = step.memory.trim();
        if !memory_delta.is_empty() {
            self.remember(memory_delta);
        }
        if !step.scratch.is_empty() {
            self.scratch = tail_chars(&step.scratch, self.scratch_keep).to_string();
        }
        self.seen_ids.observe(&format!("{}{}", step.memory, step.scratch));
    }

    /// Record a successful call; returns how many times this exact call has now succeeded.
    pub fn record_call(&mut self, kind: ActionKind, key: String) -> usize {
        let count = self
            .call_history
            .iter()
            .filter(|(k, a)| *k == kind && *a == key)
            .count()
            + 1;
        self.call_history.push((kind, key));
        count
    }

    pub fn has_called(&self, kind: ActionKind) -> bool {
        self.call_history.iter().any(|(k, _)| *k == kind)
    }

    /// The ephemeral note appended after the conversation for one reasoning call.
    pub fn context_note(
        &self,
        step: usize,
        max_steps: usize,
        scratch_tail: usize,
        ids_tail: usize,
        customer_code: Option<&str>,
    ) -> String {
        let mut ctx = format!("\n[Step {step}/{max_steps}]");
        if !self.memory.is_empty() {
            ctx.push_str(&format!("\nMemory: {}", self.memory));
        }
        if !self.scratch.is_empty() {
            ctx.push_str(&format!("\nScratch: {}", tail_chars(&self.scratch, scratch_tail)));
        }
        if !self.seen_ids.is_empty() {
            ctx.push_str(&format!(
                "\nIDs: [{}]",
                self.seen_ids.recent_distinct(ids_tail).join(", ")
            ));
        }
        if let Some(code) = customer_code {
            ctx.push_str(&format!(
                "\n⚠️ Customer code specified: {code} — search customer by this code, NOT from project."
            ));
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use officeclaw_core::action::{Action, EntityRef};

    fn state() -> LoopState {
        LoopState::new(&AgentConfig::default())
    }

    #[test]
    fn char_helpers_respect_boundaries() {
        assert_eq!(tail_chars("héllo→", 2), "o→");
        assert_eq!(tail_chars("ab", 5), "ab");
        assert_eq!(head_chars("→→→", 2), "→→");
        assert_eq!(head_chars("ab", 5), "ab");
    }

    #[test]
    fn absorb_step_merges_and_harvests_ids() {
        let mut s = state();
        s.reasoning_failures = 2;
        let mut step = NextStep::propose(Action::GetProject(EntityRef { id: "proj_x".into() }));
        step.memory = "lead of proj_acme_cv_poc is emp_ana".into();
        step.scratch = "try cust_acme next".into();
        s.absorb_step(&step);

        assert_eq!(s.reasoning_failures, 0);
        assert_eq!(s.memory, "lead of proj_acme_cv_poc is emp_ana");
        assert_eq!(s.scratch, "try cust_acme next");
        assert!(s.seen_ids.contains("proj_acme_cv_poc"));
        assert!(s.seen_ids.contains("cust_acme"));
        // The proposed action's id is not harvested; only notes are.
        assert!(!s.seen_ids.contains("proj_x"));
    }

    #[test]
    fn scratch_is_bounded() {
        let mut s = state();
        let mut step = NextStep::propose(Action::GetProject(EntityRef { id: "p".into() }));
        step.scratch = "x".repeat(2000);
        s.absorb_step(&step);
        assert_eq!(s.scratch.chars().count(), 500);
        s.append_scratch(" | DISAMBIGUATE: check team for 'ana'");
        assert_eq!(s.scratch.chars().count(), 500);
        assert!(s.scratch.ends_with("'ana'"));
    }

    #[test]
    fn call_history_counts_repeats() {
        let mut s = state();
        assert_eq!(s.record_call(ActionKind::SearchProjects, "CV".into()), 1);
        assert_eq!(s.record_call(ActionKind::SearchProjects, "PoC".into()), 1);
        assert_eq!(s.record_call(ActionKind::SearchProjects, "CV".into()), 2);
        assert_eq!(s.record_call(ActionKind::SearchProjects, "CV".into()), 3);
        assert!(s.has_called(ActionKind::SearchProjects));
        assert!(!s.has_called(ActionKind::LogTimeEntry));
    }

    #[test]
    fn context_note_layout() {
        let mut s = state();
        s.memory = "proj_a".into();
        s.scratch = "abcdef".into();
        s.seen_ids.observe("proj_a emp_b");
        let ctx = s.context_note(3, 30, 4, 10, Some("CC-NORD-AI12"));
        assert!(ctx.starts_with("\n[Step 3/30]"));
        assert!(ctx.contains("\nMemory: proj_a"));
        assert!(ctx.contains("\nScratch: cdef"));
        assert!(ctx.contains("\nIDs: [proj_a, emp_b]"));
        assert!(ctx.contains("Customer code specified: CC-NORD-AI12"));
    }

    #[test]
    fn empty_state_note_is_just_the_step() {
        assert_eq!(state().context_note(1, 30, 400, 10, None), "\n[Step 1/30]");
    }

    #[test]
    fn notes_are_raw_until_compressed() {
        let mut s = state();
        s.remember("proj_a");
        s.note("ERR[other]: bad input");
        assert!(s.memory.contains("ERR"));
        s.compress_memory();
        assert_eq!(s.memory, "proj_a");
    }

    #[test]
    fn remember_compresses_on_append() {
        let mut s = state();
        s.remember("proj_a");
        s.remember("nothing here");
        s.remember("emp_b");
        assert_eq!(s.memory, "proj_a | emp_b");
    }
}
