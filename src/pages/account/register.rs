use axum::Json;
use mysql::{params, prelude::Queryable, PooledConn};
use serde_json::{json, Value};

use crate::{
    catch, commit_or_rollback,
    database::get_conn,
    libs::{gen_id, is_email},
    token::generate_jwt,
    Response, ResponseResult,
};

use super::{check_password, gen_salt, password_digest};

/// Account fields of a signup or employee form.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NewUser {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), Response> {
        let username = self.username.trim();
        if username.is_empty() || username.chars().count() > 150 {
            return Err(Response::invalid_value("username must be 1 to 150 characters"));
        }
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
        {
            return Err(Response::invalid_value(
                "username may only contain letters, digits and @/./+/-/_",
            ));
        }
        if !self.email.is_empty() && !is_email(&self.email) {
            return Err(Response::invalid_value("email is not a valid email address"));
        }
        check_password(&self.password)
    }
}

/// Insert a user account and return its id.
pub fn insert_user(conn: &mut PooledConn, user: &NewUser, is_superuser: bool) -> Result<String, Response> {
    user.validate()?;
    let id = gen_id();
    let salt = gen_salt();
    catch!(conn.exec_drop(
        "INSERT INTO user (id, username, first_name, last_name, email, salt, password, is_superuser)
        VALUES (:id, :username, :first_name, :last_name, :email, :salt, :password, :is_superuser)",
        params! {
            "id" => &id,
            "username" => user.username.trim(),
            "first_name" => &user.first_name,
            "last_name" => &user.last_name,
            "email" => &user.email,
            "password" => password_digest(&salt, &user.password),
            "salt" => &salt,
            "is_superuser" => is_superuser,
        },
    ) => dup, format!("username {} is taken", user.username.trim()))?;
    Ok(id)
}

/// Locks the first user row, or the empty table's gap, until commit. Two
/// signups racing on an empty table cannot both read it as empty.
const FIRST_ACCOUNT_SQL: &str = "SELECT id FROM user ORDER BY id LIMIT 1 FOR UPDATE";

fn __signup(conn: &mut PooledConn, user: &NewUser) -> Result<(String, bool), Response> {
    let existing: Option<String> = conn.query_first(FIRST_ACCOUNT_SQL)?;
    let is_superuser = existing.is_none();
    let id = insert_user(conn, user, is_superuser)?;
    Ok((id, is_superuser))
}

/// Open signup. The very first account becomes the superuser.
pub async fn signup(Json(value): Json<Value>) -> ResponseResult {
    let mut conn = get_conn()?;
    let user: NewUser = serde_json::from_value(value)?;
    let (id, is_superuser) = commit_or_rollback!(__signup, &mut conn, &user)?;
    tracing::info!(user = %id, username = %user.username, is_superuser, "account created");
    let token = generate_jwt(&id)?;
    Ok(Response::ok(json!({ "id": id, "token": token, "is_superuser": is_superuser })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: &str, email: &str, password: &str) -> NewUser {
        NewUser {
            username: username.into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn first_account_check_holds_a_lock() {
        let sql = FIRST_ACCOUNT_SQL.to_ascii_uppercase();
        assert!(sql.starts_with("SELECT"));
        assert!(sql.contains("FROM USER"));
        assert!(sql.ends_with("FOR UPDATE"));
        assert!(!sql.contains("LOCK IN SHARE MODE"));
    }

    #[test]
    fn validates_account_fields() {
        assert!(user("ada", "ada@example.com", "12345678").validate().is_ok());
        assert!(user("ada", "", "12345678").validate().is_ok());
        assert!(user("  ", "ada@example.com", "12345678").validate().is_err());
        assert!(user("ada lovelace", "ada@example.com", "12345678").validate().is_err());
        assert!(user("ada", "not-mail", "12345678").validate().is_err());
        assert!(user("ada", "ada@example.com", "1234").validate().is_err());
    }
}
