use mysql::{prelude::Queryable, PooledConn};

use super::cache::EMPLOYEE_CACHE;
use crate::{
    pages::{
        account::{User, USER_FIELDS},
        employee::data::{Employee, Role, EMPLOYEE_FIELDS},
    },
    perm::verify_permissions,
    Response,
};

/// The authenticated user of a request and their employee profile, if any.
#[derive(Debug, Clone)]
pub struct Operator {
    pub user: User,
    pub employee: Option<Employee>,
}

impl Operator {
    pub fn new(user_id: &str, conn: &mut PooledConn) -> Result<Self, Response> {
        let user: User = op::some!(
            conn.exec_first(format!("SELECT {USER_FIELDS} FROM user WHERE id = ?"), (user_id,))?;
            ret Err(Response::not_exist(format!("user {user_id}")))
        );
        let employee = match EMPLOYEE_CACHE.get(user_id) {
            Some(e) => Some(e.clone()),
            None => {
                let employee: Option<Employee> = conn.exec_first(
                    format!("SELECT {EMPLOYEE_FIELDS} FROM employee WHERE user_id = ?"),
                    (user_id,),
                )?;
                if let Some(e) = &employee {
                    EMPLOYEE_CACHE.insert(user_id.to_owned(), e.clone());
                }
                employee
            }
        };
        Ok(Self { user, employee })
    }

    pub fn id(&self) -> &str {
        &self.user.id
    }

    pub fn role(&self) -> Option<Role> {
        self.employee.as_ref().map(|e| e.role)
    }

    /// The employee profile, required by anything that is credited to an employee.
    pub fn employee(&self) -> Result<&Employee, Response> {
        self.employee
            .as_ref()
            .ok_or_else(|| Response::not_exist("No employee profile found for the user."))
    }

    pub fn can(&self, group: &str, action: &str) -> bool {
        self.user.is_superuser || self.role().is_some_and(|r| verify_permissions(r, group, action))
    }

    /// `Err(permission_denied)` unless the operator may run `group.action`.
    pub fn require(&self, group: &str, action: &str) -> Result<(), Response> {
        if self.can(group, action) {
            Ok(())
        } else {
            tracing::warn!(user = %self.user.id, group, action, "permission denied");
            Err(Response::permission_denied())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perm::action::{EmployeeGroup, PropertyGroup, EMPLOYEE, PROPERTY};

    fn operator(role: Option<Role>, is_superuser: bool) -> Operator {
        Operator {
            user: User {
                id: "u1".into(),
                username: "jdoe".into(),
                first_name: "Jane".into(),
                last_name: "Doe".into(),
                email: "jane@example.com".into(),
                is_superuser,
            },
            employee: role.map(|role| Employee {
                id: "e1".into(),
                user_id: "u1".into(),
                role,
                join_date: "2024-01-01".into(),
                performance_score: 0.0,
            }),
        }
    }

    #[test]
    fn superuser_without_profile_may_do_anything() {
        let op = operator(None, true);
        assert!(op.require(EMPLOYEE, EmployeeGroup::DELETE).is_ok());
        assert_eq!(op.employee().unwrap_err().code(), axum::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn agent_is_limited_to_its_actions() {
        let op = operator(Some(Role::Agent), false);
        assert!(op.require(PROPERTY, PropertyGroup::QUERY).is_ok());
        let denied = op.require(EMPLOYEE, EmployeeGroup::CREATE).unwrap_err();
        assert_eq!(denied.code(), axum::http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn user_without_profile_has_no_permissions() {
        let op = operator(None, false);
        assert!(!op.can(PROPERTY, PropertyGroup::QUERY));
    }
}
