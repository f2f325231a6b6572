//! System policy prompt.

use officeclaw_core::action::{Action, EntityRef};
use officeclaw_core::api::BusinessApi;
use officeclaw_core::task::Task;
use tracing::debug;

const POLICY: &str = r#"You are a business assistant operating a company ERP through typed actions.
Reply with ONE JSON object per step: think, scratch, memory, actions_done, filters_tried, plan, done, confirm, fallback, function.
`function` is exactly one action, selected by its "tool" path.

# ACTIONS
- /respond (ProvideResponse): message, outcome, links [{kind, id}]
- /projects/list, /employees/list, /customers/list: offset, limit
- /projects/search (SearchProjects): query, customer_id, status, team {employee_id, role}, include_archived, offset, limit
- /projects/get (GetProject), /employees/get (GetEmployee), /customers/get (GetCustomer): id
- /projects/status/update (UpdateProjectStatus): id, status, changed_by
- /projects/team/update (UpdateProjectTeam): id, team [{employee, time_slice, role}], changed_by
- /wiki/update (UpdateWiki): file, content, changed_by
- /wiki/delete (DeleteWikiPage): file, changed_by
- /employees/search (SearchEmployees): query, location, department, manager, skills [{name, min_level, max_level}], wills, offset, limit
- /employees/update (UpdateEmployeeInfo): employee, salary, department, location, notes, skills, wills, changed_by
- /customers/search (SearchCustomers): query, deal_phase, account_managers, locations, offset, limit
- /time/log (LogTimeEntry): employee, project, customer, date, hours, work_category, notes, billable, status, logged_by
- /all-projects-for-user (ListProjectsForUser), /all-customers-for-user (ListCustomersForUser): user

# API LIMITS
- Every search/list action takes limit <= {page_limit}. Larger limits fail the whole task.
- Paginate with offset 0, {page_limit}, {page_limit2}, ... while next_offset >= 0.

# SEARCH LADDER
1. Exact name from the task ("Data Foundations Audit").
2. First two or three words ("Data Foundations").
3. A single keyword ("Audit"), then singular/plural variants.
4. Still nothing: answer ok_answer listing the queries you tried.
- Completed or PoC work: set include_archived=true.
- Empty skills filter: drop it, search by location or name, then check skills with GetEmployee. Skill names vary (cv / computer_vision); try one at a time.
- Empty location filter: try spelling variants (Danmark/Denmark, Wien/Vienna), then drop the location and filter manually.
- A customer code such as CC-NORD-AI-12O: SearchCustomers(query=<code>) first; do not reuse a customer from a project unless the code matches.

# TIME LOGGING
- Find the employee id, find the project id, then call LogTimeEntry(employee, project, date YYYY-MM-DD, hours).
- Finding both is not logging. The task is done only after LogTimeEntry succeeded.
- Several candidate projects: GetProject on each and pick the one where the target employee is on the team. Never pick the first match blindly.
- Defaults: billable=true, work_category="development", status="draft". Omit customer unless the task names one.

# PROJECT STATUS AND TEAM
- GetProject first and read the lead. Only the lead may change status or team; otherwise answer denied_security without calling the update.
- Project not found after the ladder: denied_security.

# EMPLOYEE UPDATES
- UpdateEmployeeInfo carries only the fields being changed plus changed_by.
- Never send skills, wills, notes, location or department unless the task changes them. Empty values erase data.

# WIKI
- Update pages with UpdateWiki(file, content, changed_by). Remove them with DeleteWikiPage(file, changed_by).

# ERRORS
- System failures (page limit, 5xx, timeout): error_internal and stop.
- Permission denied: denied_security.
- Entity not found: ok_answer with what you searched. Use ok_not_found only when asked whether something exists.

# DISCIPLINE
- Calling the same action with the same arguments twice means change approach or finish.
- Check memory and scratch for earlier attempts before repeating one.
- Never invent ids like proj_105 or emp_1. Copy ids exactly from responses (proj_scandifoods_packaging_cv_poc, ana_kovac).
- Track performed mutations in actions_done. A found salary is not a raised salary.

# NOTES
- scratch: current attempts and disambiguation, replaced each step.
- memory: confirmed ids and facts only, appended.

# FINAL ANSWER
- ProvideResponse(message, outcome, links). Link only entities the answer mentions.
- Set done=true and confirm=true when the work succeeded; fallback=true when answering without a perfect match.
"#;

/// Render the policy text for a task.
pub fn render(task: &Task, page_limit: u32) -> String {
    let policy = POLICY
        .replace("{page_limit}", &page_limit.to_string())
        .replace("{page_limit2}", &(page_limit * 2).to_string());
    format!("{policy}\nDate: {}\nUser: {}\n", task.today, task.actor.label())
}

/// Build the system prompt, appending the acting user's own profile when
/// one can be fetched.
pub async fn build(api: &dyn BusinessApi, task: &Task, page_limit: u32) -> String {
    let mut prompt = render(task, page_limit);
    let Some(user) = task.actor.user_id() else {
        return prompt;
    };
    let lookup = Action::GetEmployee(EntityRef { id: user.to_string() });
    match api.dispatch(&lookup).await {
        Ok(profile) => {
            prompt.push_str("\nYour employee info:\n");
            prompt.push_str(&profile.to_text());
        }
        Err(e) => debug!(task_id = %task.task_id, error = %e, "Profile lookup skipped"),
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockApi;
    use officeclaw_core::action::ActionKind;
    use officeclaw_core::api::WhoAmI;
    use officeclaw_core::task::TaskIntake;
    use serde_json::json;

    fn task_for(who: &WhoAmI) -> Task {
        Task::from_intake(
            TaskIntake { task_id: "t1".into(), spec_id: None, text: "hi".into() },
            who,
        )
    }

    fn user() -> WhoAmI {
        WhoAmI { current_user: Some("jane_doe".into()), today: "2025-04-01".into(), ..Default::default() }
    }

    #[test]
    fn render_fills_limits_and_identity() {
        let prompt = render(&task_for(&user()), 5);
        assert!(prompt.contains("limit <= 5"));
        assert!(prompt.contains("offset 0, 5, 10"));
        assert!(prompt.ends_with("Date: 2025-04-01\nUser: jane_doe\n"));
        assert!(!prompt.contains("{page_limit}"));
    }

    #[tokio::test]
    async fn appends_profile_for_users() {
        let api = MockApi::new().respond(
            ActionKind::GetEmployee,
            json!({"employee": {"id": "jane_doe", "location": "Vienna"}}),
        );
        let prompt = build(&api, &task_for(&user()), 5).await;
        assert!(prompt.contains("Your employee info:"));
        assert!(prompt.contains("Vienna"));
        assert_eq!(api.dispatched_kinds(), vec![ActionKind::GetEmployee]);
    }

    #[tokio::test]
    async fn profile_failure_is_ignored() {
        let api = MockApi::new().fail(ActionKind::GetEmployee, 404, "employee not found");
        let prompt = build(&api, &task_for(&user()), 5).await;
        assert!(!prompt.contains("Your employee info:"));
        assert!(prompt.contains("User: jane_doe"));
    }

    #[tokio::test]
    async fn guests_get_no_lookup() {
        let api = MockApi::guest();
        let who = WhoAmI { is_public: true, today: "2025-04-01".into(), ..Default::default() };
        let prompt = build(&api, &task_for(&who), 5).await;
        assert!(prompt.contains("User: GUEST"));
        assert!(api.dispatched().is_empty());
    }
}
