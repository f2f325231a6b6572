//! Entity identifiers seen during a task.
//!
//! Identifiers are only ever collected by pattern-matching text the agent has
//! actually seen (reasoning notes and API responses); nothing is synthesized.

use officeclaw_core::outcome::EntityLink;
use regex_lite::Regex;
use std::sync::LazyLock;

static ENTITY_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(proj_[A-Za-z0-9_]+|emp_[A-Za-z0-9_]+|cust_[A-Za-z0-9_]+)").expect("entity id regex")
});

/// Distinct identifiers in `text`, in order of first appearance.
pub fn extract_ids(text: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for m in ENTITY_ID.find_iter(text) {
        if !ids.iter().any(|id| id == m.as_str()) {
            ids.push(m.as_str().to_string());
        }
    }
    ids
}

/// Append-only log of identifiers, in the order they were observed.
#[derive(Debug, Clone, Default)]
pub struct SeenIds {
    ids: Vec<String>,
}

impl SeenIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every identifier found in `text`. Returns how many were found.
    pub fn observe(&mut self, text: &str) -> usize {
        let found = extract_ids(text);
        let n = found.len();
        self.ids.extend(found);
        n
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }

    /// Up to `n` most recent distinct identifiers, oldest first.
    pub fn recent_distinct(&self, n: usize) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for id in self.ids.iter().rev() {
            if out.len() == n {
                break;
            }
            if !out.contains(&id.as_str()) {
                out.push(id);
            }
        }
        out.reverse();
        out
    }

    /// Links for the distinct identifiers among the last `n` observations.
    pub fn links_from_tail(&self, n: usize) -> Vec<EntityLink> {
        let start = self.ids.len().saturating_sub(n);
        let mut links: Vec<EntityLink> = Vec::new();
        for id in &self.ids[start..] {
            if let Some(link) = EntityLink::from_id(id) {
                if !links.contains(&link) {
                    links.push(link);
                }
            }
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use officeclaw_core::outcome::EntityKind;

    #[test]
    fn extracts_all_prefixes_once() {
        let ids = extract_ids(r#"{"id":"proj_acme_cv_poc","lead":"emp_ana","customer":"cust_acme","again":"proj_acme_cv_poc"}"#);
        assert_eq!(ids, vec!["proj_acme_cv_poc", "emp_ana", "cust_acme"]);
    }

    #[test]
    fn plain_names_are_not_ids() {
        assert!(extract_ids("ana_kovac works on the CV project").is_empty());
    }

    #[test]
    fn recent_distinct_tail() {
        let mut seen = SeenIds::new();
        seen.observe("proj_a emp_b");
        seen.observe("proj_a cust_c");
        seen.observe("proj_d");
        assert_eq!(seen.len(), 5);
        assert_eq!(seen.recent_distinct(3), vec!["proj_a", "cust_c", "proj_d"]);
        assert_eq!(seen.recent_distinct(10), vec!["emp_b", "proj_a", "cust_c", "proj_d"]);
    }

    #[test]
    fn links_from_tail_are_typed_and_distinct() {
        let mut seen = SeenIds::new();
        seen.observe("cust_old");
        seen.observe("proj_x emp_y");
        seen.observe("proj_x");
        let links = seen.links_from_tail(3);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].kind, EntityKind::Project);
        assert_eq!(links[1].kind, EntityKind::Employee);
        assert!(!links.iter().any(|l| l.id == "cust_old"));
    }

    #[test]
    fn observe_reports_count() {
        let mut seen = SeenIds::new();
        assert_eq!(seen.observe("nothing here"), 0);
        assert_eq!(seen.observe("emp_a and emp_b"), 2);
        assert!(seen.contains("emp_b"));
    }
}
