//! Actions: the closed set of operations a reasoning step may propose.
//!
//! Exactly one [`Action`] is proposed per step. The wire form is tagged by the
//! platform endpoint path in a `tool` field:
//!
//! ```json
//! { "tool": "/projects/search", "query": "CV PoC", "limit": 5 }
//! ```
//!
//! Variants expose their identifier-bearing fields through
//! [`Action::id_fields`] so validators never inspect fields generically.

use serde::{Deserialize, Serialize};
use crate::outcome::{EntityLink, OutcomeKind};

/// One proposed domain operation plus its typed parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool")]
pub enum Action {
    #[serde(rename = "/respond")]
    ProvideResponse(ProvideResponse),

    #[serde(rename = "/projects/list")]
    ListProjects(Page),
    #[serde(rename = "/projects/search")]
    SearchProjects(SearchProjects),
    #[serde(rename = "/projects/get")]
    GetProject(EntityRef),
    #[serde(rename = "/projects/status/update")]
    UpdateProjectStatus(UpdateProjectStatus),
    #[serde(rename = "/projects/team/update")]
    UpdateProjectTeam(UpdateProjectTeam),

    #[serde(rename = "/wiki/update")]
    UpdateWiki(UpdateWiki),
    #[serde(rename = "/wiki/delete")]
    DeleteWikiPage(DeleteWikiPage),

    #[serde(rename = "/employees/list")]
    ListEmployees(Page),
    #[serde(rename = "/employees/search")]
    SearchEmployees(SearchEmployees),
    #[serde(rename = "/employees/get")]
    GetEmployee(EntityRef),
    #[serde(rename = "/employees/update")]
    UpdateEmployeeInfo(UpdateEmployeeInfo),

    #[serde(rename = "/customers/list")]
    ListCustomers(Page),
    #[serde(rename = "/customers/search")]
    SearchCustomers(SearchCustomers),
    #[serde(rename = "/customers/get")]
    GetCustomer(EntityRef),

    #[serde(rename = "/time/log")]
    LogTimeEntry(LogTimeEntry),

    #[serde(rename = "/all-projects-for-user")]
    ListProjectsForUser(UserRef),
    #[serde(rename = "/all-customers-for-user")]
    ListCustomersForUser(UserRef),
}

/// Discriminant of [`Action`], cheap to copy into call history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ProvideResponse,
    ListProjects,
    SearchProjects,
    GetProject,
    UpdateProjectStatus,
    UpdateProjectTeam,
    UpdateWiki,
    DeleteWikiPage,
    ListEmployees,
    SearchEmployees,
    GetEmployee,
    UpdateEmployeeInfo,
    ListCustomers,
    SearchCustomers,
    GetCustomer,
    LogTimeEntry,
    ListProjectsForUser,
    ListCustomersForUser,
}

impl ActionKind {
    /// Short operation name used in traces, hints, and call history.
    pub fn name(self) -> &'static str {
        match self {
            Self::ProvideResponse => "ProvideResponse",
            Self::ListProjects => "ListProjects",
            Self::SearchProjects => "SearchProjects",
            Self::GetProject => "GetProject",
            Self::UpdateProjectStatus => "UpdateProjectStatus",
            Self::UpdateProjectTeam => "UpdateProjectTeam",
            Self::UpdateWiki => "UpdateWiki",
            Self::DeleteWikiPage => "DeleteWikiPage",
            Self::ListEmployees => "ListEmployees",
            Self::SearchEmployees => "SearchEmployees",
            Self::GetEmployee => "GetEmployee",
            Self::UpdateEmployeeInfo => "UpdateEmployeeInfo",
            Self::ListCustomers => "ListCustomers",
            Self::SearchCustomers => "SearchCustomers",
            Self::GetCustomer => "GetCustomer",
            Self::LogTimeEntry => "LogTimeEntry",
            Self::ListProjectsForUser => "ListProjectsForUser",
            Self::ListCustomersForUser => "ListCustomersForUser",
        }
    }

    /// Platform endpoint path for this operation.
    pub fn path(self) -> &'static str {
        match self {
            Self::ProvideResponse => "/respond",
            Self::ListProjects => "/projects/list",
            Self::SearchProjects => "/projects/search",
            Self::GetProject => "/projects/get",
            Self::UpdateProjectStatus => "/projects/status/update",
            Self::UpdateProjectTeam => "/projects/team/update",
            Self::UpdateWiki => "/wiki/update",
            Self::DeleteWikiPage => "/wiki/delete",
            Self::ListEmployees => "/employees/list",
            Self::SearchEmployees => "/employees/search",
            Self::GetEmployee => "/employees/get",
            Self::UpdateEmployeeInfo => "/employees/update",
            Self::ListCustomers => "/customers/list",
            Self::SearchCustomers => "/customers/search",
            Self::GetCustomer => "/customers/get",
            Self::LogTimeEntry => "/time/log",
            Self::ListProjectsForUser => "/all-projects-for-user",
            Self::ListCustomersForUser => "/all-customers-for-user",
        }
    }

    /// Whether the operation changes platform state.
    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            Self::UpdateProjectStatus
                | Self::UpdateProjectTeam
                | Self::UpdateWiki
                | Self::DeleteWikiPage
                | Self::UpdateEmployeeInfo
                | Self::LogTimeEntry
        )
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Which kind of entity an identifier-bearing parameter refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdField {
    Id,
    Employee,
    Project,
    Customer,
}

// ── Parameter records ────────────────────────────────────────────────────

/// Final answer submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvideResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub outcome: OutcomeKind,
    #[serde(default)]
    pub links: Vec<EntityLink>,
}

/// Plain pagination parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Lookup of a single entity by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
}

/// Per-user listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamFilter {
    pub employee_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_time_slice: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchProjects {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<TeamFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_archived: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateProjectStatus {
    pub id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub employee: String,
    #[serde(default)]
    pub time_slice: f32,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateProjectTeam {
    pub id: String,
    pub team: Vec<TeamMember>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateWiki {
    pub file: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteWikiPage {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_by: Option<String>,
}

/// Skill filter for employee search. Levels are inclusive bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillFilter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_level: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchEmployees {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<SkillFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wills: Vec<SkillFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillLevel {
    pub name: String,
    pub level: u8,
}

/// Partial employee update. Absent fields are left untouched by the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateEmployeeInfo {
    pub employee: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<SkillLevel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wills: Option<Vec<SkillLevel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchCustomers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_phase: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_managers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogTimeEntry {
    pub employee: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub date: String,
    pub hours: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logged_by: Option<String>,
}

// ── Accessors ────────────────────────────────────────────────────────────

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::ProvideResponse(_) => ActionKind::ProvideResponse,
            Self::ListProjects(_) => ActionKind::ListProjects,
            Self::SearchProjects(_) => ActionKind::SearchProjects,
            Self::GetProject(_) => ActionKind::GetProject,
            Self::UpdateProjectStatus(_) => ActionKind::UpdateProjectStatus,
            Self::UpdateProjectTeam(_) => ActionKind::UpdateProjectTeam,
            Self::UpdateWiki(_) => ActionKind::UpdateWiki,
            Self::DeleteWikiPage(_) => ActionKind::DeleteWikiPage,
            Self::ListEmployees(_) => ActionKind::ListEmployees,
            Self::SearchEmployees(_) => ActionKind::SearchEmployees,
            Self::GetEmployee(_) => ActionKind::GetEmployee,
            Self::UpdateEmployeeInfo(_) => ActionKind::UpdateEmployeeInfo,
            Self::ListCustomers(_) => ActionKind::ListCustomers,
            Self::SearchCustomers(_) => ActionKind::SearchCustomers,
            Self::GetCustomer(_) => ActionKind::GetCustomer,
            Self::LogTimeEntry(_) => ActionKind::LogTimeEntry,
            Self::ListProjectsForUser(_) => ActionKind::ListProjectsForUser,
            Self::ListCustomersForUser(_) => ActionKind::ListCustomersForUser,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::ProvideResponse(_))
    }

    /// Mutable access to the page-size parameter of list/search operations.
    pub fn limit_mut(&mut self) -> Option<&mut Option<u32>> {
        match self {
            Self::ListProjects(p) | Self::ListEmployees(p) | Self::ListCustomers(p) => {
                Some(&mut p.limit)
            }
            Self::SearchProjects(s) => Some(&mut s.limit),
            Self::SearchEmployees(s) => Some(&mut s.limit),
            Self::SearchCustomers(s) => Some(&mut s.limit),
            _ => None,
        }
    }

    /// The page-size parameter, if this operation has one.
    pub fn limit(&self) -> Option<u32> {
        match self {
            Self::ListProjects(p) | Self::ListEmployees(p) | Self::ListCustomers(p) => p.limit,
            Self::SearchProjects(s) => s.limit,
            Self::SearchEmployees(s) => s.limit,
            Self::SearchCustomers(s) => s.limit,
            _ => None,
        }
    }

    /// Every identifier-bearing parameter this action carries.
    pub fn id_fields(&self) -> Vec<(IdField, &str)> {
        let mut fields = Vec::new();
        match self {
            Self::GetProject(r) | Self::GetEmployee(r) | Self::GetCustomer(r) => {
                fields.push((IdField::Id, r.id.as_str()));
            }
            Self::UpdateProjectStatus(u) => fields.push((IdField::Id, u.id.as_str())),
            Self::UpdateProjectTeam(u) => {
                fields.push((IdField::Id, u.id.as_str()));
                for member in &u.team {
                    fields.push((IdField::Employee, member.employee.as_str()));
                }
            }
            Self::SearchProjects(s) => {
                if let Some(customer) = &s.customer_id {
                    fields.push((IdField::Customer, customer.as_str()));
                }
                if let Some(team) = &s.team {
                    fields.push((IdField::Employee, team.employee_id.as_str()));
                }
            }
            Self::UpdateEmployeeInfo(u) => fields.push((IdField::Employee, u.employee.as_str())),
            Self::LogTimeEntry(t) => {
                fields.push((IdField::Employee, t.employee.as_str()));
                if let Some(project) = &t.project {
                    fields.push((IdField::Project, project.as_str()));
                }
                if let Some(customer) = &t.customer {
                    fields.push((IdField::Customer, customer.as_str()));
                }
            }
            Self::ListProjectsForUser(u) | Self::ListCustomersForUser(u) => {
                fields.push((IdField::Employee, u.user.as_str()));
            }
            _ => {}
        }
        fields
    }

    /// The argument that identifies "the same call" for repetition detection:
    /// the search query if any, else the primary id, else the subject employee.
    pub fn key_argument(&self) -> String {
        let key = match self {
            Self::SearchProjects(s) => s.query.clone().unwrap_or_default(),
            Self::SearchEmployees(s) => s.query.clone().unwrap_or_default(),
            Self::SearchCustomers(s) => s.query.clone().unwrap_or_default(),
            Self::GetProject(r) | Self::GetEmployee(r) | Self::GetCustomer(r) => r.id.clone(),
            Self::UpdateProjectStatus(u) => u.id.clone(),
            Self::UpdateProjectTeam(u) => u.id.clone(),
            Self::UpdateEmployeeInfo(u) => u.employee.clone(),
            Self::LogTimeEntry(t) => t.employee.clone(),
            Self::UpdateWiki(w) => w.file.clone(),
            Self::DeleteWikiPage(w) => w.file.clone(),
            Self::ListProjectsForUser(u) | Self::ListCustomersForUser(u) => u.user.clone(),
            Self::ListProjects(p) | Self::ListEmployees(p) | Self::ListCustomers(p) => {
                p.offset.unwrap_or(0).to_string()
            }
            Self::ProvideResponse(_) => String::new(),
        };
        key.trim().chars().take(40).collect()
    }

    /// Compact JSON used for traces and recorded assistant turns.
    pub fn to_arguments_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_tagged_search() {
        let action: Action =
            serde_json::from_str(r#"{"tool":"/projects/search","query":"CV PoC","limit":10}"#)
                .unwrap();
        assert_eq!(action.kind(), ActionKind::SearchProjects);
        assert_eq!(action.limit(), Some(10));
        assert_eq!(action.key_argument(), "CV PoC");
    }

    #[test]
    fn log_time_entry_exposes_all_id_fields() {
        let action = Action::LogTimeEntry(LogTimeEntry {
            employee: "jane_doe".into(),
            project: Some("proj_acme_cv_poc".into()),
            date: "2024-01-05".into(),
            hours: 3.0,
            ..LogTimeEntry::default()
        });
        let fields = action.id_fields();
        assert_eq!(fields.len(), 2);
        assert!(fields.contains(&(IdField::Employee, "jane_doe")));
        assert!(fields.contains(&(IdField::Project, "proj_acme_cv_poc")));
        assert!(action.kind().is_mutation());
    }

    #[test]
    fn employee_update_skips_absent_fields_on_the_wire() {
        let action = Action::UpdateEmployeeInfo(UpdateEmployeeInfo {
            employee: "ana_kovac".into(),
            salary: Some(100_000),
            changed_by: Some("ceo_boss".into()),
            ..UpdateEmployeeInfo::default()
        });
        let json = action.to_arguments_json();
        assert!(json.contains("\"salary\":100000"));
        assert!(!json.contains("skills"));
        assert!(!json.contains("notes"));
    }

    #[test]
    fn key_argument_is_capped() {
        let action = Action::SearchProjects(SearchProjects {
            query: Some(format!("  {}  ", "x".repeat(80))),
            ..SearchProjects::default()
        });
        assert_eq!(action.key_argument().len(), 40);
    }

    #[test]
    fn kind_path_matches_wire_tag() {
        let action = Action::GetCustomer(EntityRef { id: "cust_nordic_ai".into() });
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["tool"], action.kind().path());
    }

    #[test]
    fn final_response_defaults_to_ok_answer() {
        let action: Action =
            serde_json::from_str(r#"{"tool":"/respond","message":"Done"}"#).unwrap();
        match action {
            Action::ProvideResponse(r) => {
                assert_eq!(r.outcome, OutcomeKind::OkAnswer);
                assert!(r.links.is_empty());
            }
            other => panic!("unexpected action {other:?}"),
        }
    }
}
