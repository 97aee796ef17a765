use mysql_common::prelude::FromRow;

use crate::choices;

choices! {
    pub enum Role {
        Agent => "Agent",
        Manager => "Manager",
        Admin => "Admin",
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Agent
    }
}

impl Role {
    /// Page a freshly logged in employee lands on.
    pub fn landing(&self) -> &'static str {
        match self {
            Role::Admin => "admin_panel",
            Role::Agent => "agent_workpage",
            Role::Manager => "home",
        }
    }
}

pub static EMPLOYEE_FIELDS: &str = "id, user_id, role, join_date, performance_score";

/// Brokerage staff profile, one per user account.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, FromRow, PartialEq)]
pub struct Employee {
    pub id: String,
    pub user_id: String,
    pub role: Role,
    pub join_date: String,
    pub performance_score: f64,
}

/// Employee joined with the name fields of its user account.
#[derive(Debug, Clone, serde::Serialize, FromRow)]
pub struct EmployeeInfo {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub join_date: String,
    pub performance_score: f64,
}

pub static EMPLOYEE_INFO_SQL: &str = "SELECT e.id, e.user_id, u.username, u.first_name, u.last_name,
    u.email, e.role, e.join_date, e.performance_score
    FROM employee e JOIN user u ON u.id = e.user_id";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landing_follows_role() {
        assert_eq!(Role::Admin.landing(), "admin_panel");
        assert_eq!(Role::Agent.landing(), "agent_workpage");
        assert_eq!(Role::Manager.landing(), "home");
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(serde_json::from_str::<Role>(r#""Intern""#).is_err());
        assert_eq!(serde_json::from_str::<Role>(r#""Manager""#).unwrap(), Role::Manager);
    }
}
