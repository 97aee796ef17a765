use axum::{
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use mysql::{params, prelude::Queryable, PooledConn};
use mysql_common::prelude::FromRow;
use rand::RngCore;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

mod login;
mod register;
pub use register::{insert_user, NewUser};

use crate::{
    base64_encode, bearer,
    database::get_conn,
    libs::perm::Operator,
    pages::{
        report::data::{PerformanceMetrics, Revenue},
        sale::data::{Sale, SALE_FIELDS},
        task::data::TaskStatus,
    },
    parse_jwt_macro, token, Response, ResponseResult,
};

pub static USER_FIELDS: &str = "id, username, first_name, last_name, email, is_superuser";

/// Login account. The password digest and its salt never leave the database layer.
#[derive(Debug, Clone, serde::Serialize, FromRow, PartialEq)]
#[mysql(table_name = "user")]
pub struct User {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_superuser: bool,
}

/// Fresh random salt, url-safe base64.
pub fn gen_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64_encode(bytes)
}

pub fn password_digest(salt: &str, password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

pub fn check_password(password: &str) -> Result<(), Response> {
    if password.chars().count() < 8 {
        return Err(Response::invalid_value("password must be at least 8 characters"));
    }
    Ok(())
}

pub fn account_router() -> Router {
    Router::new()
        .route("/user/login", post(login::user_login))
        .route("/user/signup", post(register::signup))
        .route("/user/logout", post(logout))
        .route("/user/set/psw", post(set_user_password))
        .route("/user/redirect", get(role_based_redirect))
        .route("/user/profile", get(user_profile))
}

#[derive(serde::Deserialize)]
struct Password {
    password: String,
}

async fn set_user_password(headers: HeaderMap, Json(value): Json<Value>) -> ResponseResult {
    let bearer = bearer!(&headers);
    let mut conn = get_conn()?;
    let id = parse_jwt_macro!(&bearer, &mut conn);
    let password: Password = serde_json::from_value(value)?;
    check_password(&password.password)?;
    let salt = gen_salt();
    conn.exec_drop(
        "UPDATE user SET salt = :salt, password = :password WHERE id = :id",
        params! {
            "password" => password_digest(&salt, &password.password),
            "salt" => &salt,
            "id" => &id
        },
    )?;
    // every token issued so far is now stale
    token::revoke(&id, &mut conn)?;
    tracing::info!(user = %id, "password changed");
    Ok(Response::empty())
}

async fn logout(headers: HeaderMap) -> ResponseResult {
    let bearer = bearer!(&headers);
    let mut conn = get_conn()?;
    let id = parse_jwt_macro!(&bearer, &mut conn);
    token::revoke(&id, &mut conn)?;
    tracing::info!(user = %id, "logged out");
    Ok(Response::empty())
}

async fn role_based_redirect(headers: HeaderMap) -> ResponseResult {
    let bearer = bearer!(&headers);
    let mut conn = get_conn()?;
    let id = parse_jwt_macro!(&bearer, &mut conn);
    let operator = Operator::new(&id, &mut conn)?;
    Ok(Response::ok(landing_of(&operator)))
}

pub(crate) fn landing_of(operator: &Operator) -> Value {
    match operator.role() {
        Some(role) => json!({ "landing": role.landing(), "role": role }),
        None if operator.user.is_superuser => json!({ "landing": "admin_panel", "role": null }),
        None => json!({
            "landing": "home",
            "role": null,
            "message": "Employee profile not found."
        }),
    }
}

async fn user_profile(headers: HeaderMap) -> ResponseResult {
    let bearer = bearer!(&headers);
    let mut conn = get_conn()?;
    let id = parse_jwt_macro!(&bearer, &mut conn);
    let operator = Operator::new(&id, &mut conn)?;
    let employee = operator.employee()?;
    let metrics: Option<PerformanceMetrics> = conn.exec_first(
        "SELECT employee_id, tasks_completed, sales_closed, aggregate_points
        FROM performance_metrics WHERE employee_id = ?",
        (&employee.id,),
    )?;
    let sales: Vec<Sale> = conn.exec(
        format!("SELECT {SALE_FIELDS} FROM sale WHERE agent_id = ? ORDER BY sale_date DESC LIMIT 10"),
        (&employee.id,),
    )?;
    let task_status_counts = task_status_counts(&employee.id, &mut conn)?;
    let revenue: Vec<Revenue> = conn.query(
        "SELECT id, year, month, total_revenue, total_expenses, net_profit
        FROM revenue ORDER BY year, month",
    )?;
    Ok(Response::ok(json!({
        "user": operator.user,
        "employee": employee,
        "performance_metrics": metrics.unwrap_or_else(|| PerformanceMetrics::new(&employee.id)),
        "sales": sales,
        "task_status_counts": task_status_counts,
        "revenue_data": {
            "labels": revenue.iter().map(Revenue::period).collect::<Vec<_>>(),
            "net_profits": revenue.iter().map(|r| r.net_profit).collect::<Vec<_>>(),
        }
    })))
}

/// Number of tasks per status for one assignee, in `TaskStatus::ALL` order.
pub(crate) fn task_status_counts(
    employee_id: &str,
    conn: &mut PooledConn,
) -> Result<Vec<(TaskStatus, u64)>, Response> {
    let mut counts = Vec::with_capacity(TaskStatus::ALL.len());
    for status in TaskStatus::ALL {
        let count: Option<u64> = conn.exec_first(
            "SELECT COUNT(*) FROM task WHERE assigned_to = ? AND status = ?",
            (employee_id, *status),
        )?;
        counts.push((*status, count.unwrap_or_default()));
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_depends_on_salt() {
        let a = password_digest("salt-a", "correct horse");
        assert_eq!(a.len(), 32);
        assert_eq!(a, password_digest("salt-a", "correct horse"));
        assert_ne!(a, password_digest("salt-b", "correct horse"));
        assert_ne!(a, password_digest("salt-a", "correct horsf"));
    }

    #[test]
    fn salts_are_random_and_url_safe() {
        let (a, b) = (gen_salt(), gen_salt());
        assert_ne!(a, b);
        assert_eq!(a.len(), 22);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn short_passwords_are_refused() {
        assert!(check_password("short").is_err());
        assert!(check_password("long enough").is_ok());
    }

    #[test]
    fn landing_without_profile_reports_it() {
        let operator = Operator {
            user: User {
                id: "u".into(),
                username: "u".into(),
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
                is_superuser: false,
            },
            employee: None,
        };
        let landing = landing_of(&operator);
        assert_eq!(landing["landing"], "home");
        assert_eq!(landing["message"], "Employee profile not found.");
    }
}
