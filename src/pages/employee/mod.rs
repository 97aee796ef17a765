pub mod data;

use axum::{
    extract::Path,
    http::HeaderMap,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveDate;
use mysql::{params, prelude::Queryable, PooledConn};
use serde_json::{json, Value};

use crate::{
    bearer, commit_or_rollback,
    database::get_conn,
    libs::{
        cache::invalidate_employee,
        dser::deser_empty_to_none,
        gen_id, is_email,
        perm::Operator,
        time::{format_date, parse_date},
        TIME,
    },
    pages::account::{insert_user, NewUser},
    parse_jwt_macro,
    perm::action::{EmployeeGroup, EMPLOYEE},
    workflow, Response, ResponseResult,
};
use data::{Employee, EmployeeInfo, Role, EMPLOYEE_INFO_SQL};

pub fn employee_router() -> Router {
    Router::new()
        .route("/employees", get(query_employees))
        .route("/employee/add", post(add_employee))
        .route("/employee/edit/:id", post(edit_employee))
        .route("/employee/delete/:id", delete(delete_employee))
}

async fn query_employees(headers: HeaderMap) -> ResponseResult {
    let bearer = bearer!(&headers);
    let mut conn = get_conn()?;
    let id = parse_jwt_macro!(&bearer, &mut conn);
    Operator::new(&id, &mut conn)?.require(EMPLOYEE, EmployeeGroup::QUERY)?;
    let employees: Vec<EmployeeInfo> = conn.query(format!(
        "{EMPLOYEE_INFO_SQL} ORDER BY u.first_name, u.last_name"
    ))?;
    Ok(Response::ok(json!(employees)))
}

/// Role and join date of an employee form.
#[derive(Debug, serde::Deserialize)]
struct Staffing {
    role: Role,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    join_date: Option<String>,
}

impl Staffing {
    fn join_date(&self, today: NaiveDate) -> Result<String, Response> {
        match self.join_date.as_deref() {
            None => Ok(format_date(today)),
            Some(d) => parse_date(d)
                .map(format_date)
                .ok_or_else(|| Response::invalid_value("join_date must be formatted as YYYY-MM-DD")),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct NewEmployee {
    #[serde(flatten)]
    user: NewUser,
    #[serde(flatten)]
    staffing: Staffing,
}

async fn add_employee(headers: HeaderMap, Json(value): Json<Value>) -> ResponseResult {
    let bearer = bearer!(&headers);
    let mut conn = get_conn()?;
    let id = parse_jwt_macro!(&bearer, &mut conn);
    Operator::new(&id, &mut conn)?.require(EMPLOYEE, EmployeeGroup::CREATE)?;
    let data: NewEmployee = serde_json::from_value(value)?;
    let join_date = data.staffing.join_date(TIME::now()?.date())?;
    let employee = commit_or_rollback!(__add_employee, &mut conn, &data, join_date)?;
    tracing::info!(operator = %id, employee = %employee.id, "employee added");
    Ok(Response::ok(json!(employee)))
}

fn __add_employee(conn: &mut PooledConn, data: &NewEmployee, join_date: String) -> Result<Employee, Response> {
    let user_id = insert_user(conn, &data.user, false)?;
    let employee = Employee {
        id: gen_id(),
        user_id,
        role: data.staffing.role,
        join_date,
        performance_score: 0.0,
    };
    workflow::register_employee(conn, &employee)?;
    Ok(employee)
}

#[derive(Debug, serde::Deserialize)]
struct EditEmployee {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    email: String,
    #[serde(flatten)]
    staffing: Staffing,
}

async fn edit_employee(
    headers: HeaderMap,
    Path(employee_id): Path<String>,
    Json(value): Json<Value>,
) -> ResponseResult {
    let bearer = bearer!(&headers);
    let mut conn = get_conn()?;
    let id = parse_jwt_macro!(&bearer, &mut conn);
    Operator::new(&id, &mut conn)?.require(EMPLOYEE, EmployeeGroup::UPDATE)?;
    let data: EditEmployee = serde_json::from_value(value)?;
    if !data.email.is_empty() && !is_email(&data.email) {
        return Err(Response::invalid_value("email is not a valid email address"));
    }
    let join_date = data.staffing.join_date(TIME::now()?.date())?;
    let user_id: String = op::some!(
        conn.exec_first("SELECT user_id FROM employee WHERE id = ?", (&employee_id,))?;
        ret Err(Response::not_exist(format!("employee {employee_id}")))
    );
    commit_or_rollback!(__edit_employee, &mut conn, &employee_id, &user_id, &data, join_date)?;
    invalidate_employee(&user_id);
    tracing::info!(operator = %id, employee = %employee_id, role = %data.staffing.role, "employee updated");
    Ok(Response::empty())
}

fn __edit_employee(
    conn: &mut PooledConn,
    employee_id: &str,
    user_id: &str,
    data: &EditEmployee,
    join_date: String,
) -> Result<(), Response> {
    conn.exec_drop(
        "UPDATE user SET first_name = :first_name, last_name = :last_name, email = :email
        WHERE id = :id",
        params! {
            "first_name" => &data.first_name,
            "last_name" => &data.last_name,
            "email" => &data.email,
            "id" => user_id,
        },
    )?;
    conn.exec_drop(
        "UPDATE employee SET role = :role, join_date = :join_date WHERE id = :id",
        params! {
            "role" => data.staffing.role,
            "join_date" => join_date,
            "id" => employee_id,
        },
    )?;
    Ok(())
}

async fn delete_employee(headers: HeaderMap, Path(employee_id): Path<String>) -> ResponseResult {
    let bearer = bearer!(&headers);
    let mut conn = get_conn()?;
    let id = parse_jwt_macro!(&bearer, &mut conn);
    let operator = Operator::new(&id, &mut conn)?;
    operator.require(EMPLOYEE, EmployeeGroup::DELETE)?;
    let user_id: String = op::some!(
        conn.exec_first("SELECT user_id FROM employee WHERE id = ?", (&employee_id,))?;
        ret Err(Response::not_exist(format!("employee {employee_id}")))
    );
    if user_id == operator.id() {
        return Err(Response::invalid_value("you cannot delete your own account"));
    }
    // the employee row and its metrics go with the user
    conn.exec_drop("DELETE FROM user WHERE id = ?", (&user_id,))?;
    invalidate_employee(&user_id);
    tracing::info!(operator = %id, employee = %employee_id, "employee deleted");
    Ok(Response::empty())
}
