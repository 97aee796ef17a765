use axum::{http::HeaderMap, Json};
use mysql::prelude::Queryable;
use serde_json::{json, Value};

use crate::{
    bearer,
    database::get_conn,
    libs::perm::Operator,
    response::Response,
    token::{generate_jwt, verify},
    ResponseResult,
};

use super::{landing_of, password_digest};

#[derive(serde::Deserialize)]
struct LoginID {
    username: String,
    password: String,
}

/// Log in with username and password, or re-validate an existing bearer
/// token when one is sent.
pub async fn user_login(headers: HeaderMap, Json(value): Json<Value>) -> ResponseResult {
    let mut conn = get_conn()?;

    if let Some(bearer) = bearer!(&headers, Allow Missing) {
        let id = verify(bearer.token(), &mut conn)?;
        let operator = Operator::new(&id, &mut conn)?;
        return Ok(Response::ok(json!({
            "token": bearer.token(),
            "info": operator.user,
            "employee": operator.employee,
            "redirect": landing_of(&operator),
        })));
    }
    let login: LoginID = serde_json::from_value(value)?;
    let stored: Option<(String, String, Vec<u8>)> = conn.exec_first(
        "SELECT id, salt, password FROM user WHERE username = ?",
        (&login.username,),
    )?;
    let (id, salt, password) = op::some!(stored;
        ret Err(Response::not_exist("Username or password does not exist.")));
    if password != password_digest(&salt, &login.password) {
        tracing::info!(username = %login.username, "rejected login");
        return Err(Response::wrong_password());
    }
    let token = generate_jwt(&id)?;
    let operator = Operator::new(&id, &mut conn)?;
    tracing::info!(user = %id, role = ?operator.role(), "logged in");
    Ok(Response::ok(json!({
        "token": token,
        "info": operator.user,
        "employee": operator.employee,
        "redirect": landing_of(&operator),
    })))
}
