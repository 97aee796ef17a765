pub mod action;
use std::collections::HashMap;

use axum::{http::HeaderMap, routing::get, Router};
use serde_json::json;

use crate::{
    bearer, database::get_conn, libs::perm::Operator, pages::employee::data::Role,
    parse_jwt_macro, ResponseResult,
};
use action::*;

/// group -> allowed actions
pub type PermissionGroupMap = HashMap<&'static str, Vec<&'static str>>;

lazy_static::lazy_static! {
    pub static ref ROLES_GROUP_MAP: HashMap<Role, PermissionGroupMap> = {
        let mut map = HashMap::new();
        map.insert(Role::Agent, role_agent());
        map.insert(Role::Manager, role_manager());
        map.insert(Role::Admin, role_admin());
        map
    };
}

fn role_agent() -> PermissionGroupMap {
    let mut map = HashMap::new();
    map.insert(PROPERTY, vec![PropertyGroup::QUERY, PropertyGroup::SELL]);
    map.insert(TASK, vec![TaskGroup::QUERY_OWN, TaskGroup::UPDATE_STATUS]);
    map.insert(SALE, vec![SaleGroup::QUERY_OWN]);
    map.insert(
        REPORT,
        vec![ReportGroup::HOME, ReportGroup::AGENT, ReportGroup::LOG_HOURS],
    );
    map
}

fn role_manager() -> PermissionGroupMap {
    let mut map = role_agent();
    map.insert(PROPERTY, PROPERTY_ACTIONS.to_vec());
    map.insert(TASK, TASK_ACTIONS.to_vec());
    map.insert(EMPLOYEE, vec![EmployeeGroup::QUERY]);
    map
}

fn role_admin() -> PermissionGroupMap {
    groups()
        .into_iter()
        .map(|(group, actions)| (group, actions.to_vec()))
        .collect()
}

pub fn verify_permissions(role: Role, group: &str, action: &str) -> bool {
    let perms = op::some!(ROLES_GROUP_MAP.get(&role); ret false);
    op::some!(perms.get(group); ret false)
        .iter()
        .any(|a| *a == action)
}

pub fn perm_router() -> Router {
    Router::new().route("/get/perm", get(get_perm))
}

async fn get_perm(headers: HeaderMap) -> ResponseResult {
    let bearer = bearer!(&headers);
    let mut conn = get_conn()?;
    let id = parse_jwt_macro!(&bearer, &mut conn);
    let operator = Operator::new(&id, &mut conn)?;
    if operator.user.is_superuser {
        return Ok(crate::Response::ok(json!({ "perm": "all" })));
    }
    let perms = operator
        .role()
        .and_then(|role| ROLES_GROUP_MAP.get(&role))
        .cloned()
        .unwrap_or_default();
    Ok(crate::Response::ok(json!({ "role": operator.role(), "perm": perms })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_holds_every_action() {
        for (group, actions) in groups() {
            for action in actions {
                assert!(verify_permissions(Role::Admin, group, action), "{group}.{action}");
            }
        }
    }

    #[test]
    fn managers_run_tasks_but_not_payroll() {
        assert!(verify_permissions(Role::Manager, TASK, TaskGroup::ASSIGN));
        assert!(verify_permissions(Role::Manager, PROPERTY, PropertyGroup::IMPORT));
        assert!(!verify_permissions(Role::Manager, EMPLOYEE, EmployeeGroup::CREATE));
        assert!(!verify_permissions(Role::Manager, REPORT, ReportGroup::ADMIN));
    }

    #[test]
    fn agents_work_their_own_tasks() {
        assert!(verify_permissions(Role::Agent, TASK, TaskGroup::UPDATE_STATUS));
        assert!(verify_permissions(Role::Agent, PROPERTY, PropertyGroup::SELL));
        assert!(!verify_permissions(Role::Agent, TASK, TaskGroup::ASSIGN));
        assert!(!verify_permissions(Role::Agent, SALE, SaleGroup::QUERY_ALL));
        assert!(!verify_permissions(Role::Agent, "unknown", "query"));
    }
}
