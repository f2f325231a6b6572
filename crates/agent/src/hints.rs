//! Structural hints injected into the conversation.
//!
//! Hints never change what gets dispatched; they only steer the next
//! reasoning step when a response is ambiguous or suspiciously empty.

use officeclaw_core::action::{Action, SearchCustomers};
use officeclaw_core::api::ApiResponse;
use regex_lite::Regex;
use std::sync::LazyLock;

static CUSTOMER_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z]{2,4}-[A-Z0-9]+-[A-Z0-9]+)\b").expect("customer code regex")
});
static FOR_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bfor\s+(\w+)\b").expect("for-name regex"));

/// A customer code such as `CC-NORD-AI12` in the (original-case) instruction.
pub fn customer_code(instruction: &str) -> Option<&str> {
    CUSTOMER_CODE
        .captures(instruction)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

pub fn customer_code_hint(code: &str) -> String {
    format!(
        "[SYSTEM HINT] Customer code '{code}' detected. First action: SearchCustomers(query='{code}') to find the correct customer."
    )
}

/// Whether the (lowercased) instruction asks to log time.
pub fn is_time_logging(lower: &str) -> bool {
    (lower.contains("log") || lower.contains("record")) && lower.contains("hour")
}

/// Hints produced by one successful call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseHints {
    pub messages: Vec<String>,
    /// Appended to scratch
    pub scratch: Option<String>,
}

impl ResponseHints {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.scratch.is_none()
    }
}

/// Inspect a successful response for ambiguity that needs steering.
pub fn for_response(
    action: &Action,
    response: &ApiResponse,
    lower: &str,
    nordic_locations: &[String],
) -> ResponseHints {
    let mut hints = ResponseHints::default();
    match action {
        Action::SearchProjects(_) => {
            let found = response.count("projects").unwrap_or(0);
            if found > 1 {
                if let Some(name) = FOR_NAME.captures(lower).and_then(|c| c.get(1)) {
                    let name = name.as_str();
                    hints.messages.push(format!(
                        "⚠️ Multiple projects found! Task mentions '{name}'. Call GetProject for each and pick one where that employee is in team."
                    ));
                    hints.scratch = Some(format!(" | DISAMBIGUATE: check team for '{name}'"));
                }
                if is_time_logging(lower) {
                    hints.messages.push(format!(
                        "⚠️ CRITICAL: {found} project(s) found. For time logging, call GetProject on each and select where the target employee is on the team. You can log time even if you are not on that project."
                    ));
                }
            }
        }
        Action::SearchCustomers(search) => {
            if response.is_empty_collection("companies") && has_nordic_filter(search, nordic_locations) {
                hints.messages.push(
                    "⚠️ No results for Nordic location. Retry without location, then filter manually by GetCustomer location."
                        .into(),
                );
            }
        }
        _ => {}
    }
    hints
}

fn has_nordic_filter(search: &SearchCustomers, nordic_locations: &[String]) -> bool {
    search.locations.as_deref().unwrap_or_default().iter().any(|loc| {
        let loc = loc.trim().to_lowercase();
        nordic_locations.iter().any(|n| n.to_lowercase() == loc)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use officeclaw_config::PolicyConfig;
    use officeclaw_core::action::SearchProjects;
    use serde_json::json;

    fn nordic() -> Vec<String> {
        PolicyConfig::default().nordic_locations
    }

    fn two_projects() -> ApiResponse {
        ApiResponse::new(json!({"projects": [{"id": "proj_a_cv"}, {"id": "proj_b_cv"}]}))
    }

    #[test]
    fn detects_customer_code() {
        assert_eq!(
            customer_code("Who is the account manager for CC-NORD-AI12O?"),
            Some("CC-NORD-AI12O")
        );
        assert_eq!(customer_code("log 3 hours on the cv poc"), None);
        assert!(customer_code_hint("CC-NORD-AI12O").contains("SearchCustomers(query='CC-NORD-AI12O')"));
    }

    #[test]
    fn multiple_projects_with_named_person() {
        let action = Action::SearchProjects(SearchProjects { query: Some("cv".into()), ..Default::default() });
        let hints = for_response(&action, &two_projects(), "log 3 hours for jane on cv poc", &nordic());
        assert_eq!(hints.messages.len(), 2);
        assert!(hints.messages[0].contains("Task mentions 'jane'"));
        assert!(hints.messages[1].starts_with("⚠️ CRITICAL: 2 project(s) found."));
        assert_eq!(hints.scratch.as_deref(), Some(" | DISAMBIGUATE: check team for 'jane'"));
    }

    #[test]
    fn single_project_needs_no_hint() {
        let action = Action::SearchProjects(SearchProjects::default());
        let one = ApiResponse::new(json!({"projects": [{"id": "proj_a_cv"}]}));
        assert!(for_response(&action, &one, "log 3 hours for jane", &nordic()).is_empty());
    }

    #[test]
    fn empty_nordic_customer_search() {
        let action = Action::SearchCustomers(SearchCustomers {
            locations: Some(vec!["Danmark".into()]),
            ..Default::default()
        });
        let hints = for_response(&action, &ApiResponse::new(json!({"companies": null})), "find nordic customers", &nordic());
        assert_eq!(hints.messages.len(), 1);
        assert!(hints.messages[0].contains("Retry without location"));
    }

    #[test]
    fn non_nordic_or_non_empty_customer_search() {
        let other = Action::SearchCustomers(SearchCustomers {
            locations: Some(vec!["Vienna".into()]),
            ..Default::default()
        });
        let empty = ApiResponse::new(json!({"companies": []}));
        assert!(for_response(&other, &empty, "x", &nordic()).is_empty());

        let nordic_search = Action::SearchCustomers(SearchCustomers {
            locations: Some(vec!["Denmark".into()]),
            ..Default::default()
        });
        let found = ApiResponse::new(json!({"companies": [{"id": "cust_nordlys"}]}));
        assert!(for_response(&nordic_search, &found, "x", &nordic()).is_empty());
    }
}
