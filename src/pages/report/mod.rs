pub mod data;

use axum::{
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use chrono::Datelike;
use mysql::{params, prelude::Queryable, PooledConn};
use serde_json::{json, Value};

use crate::{
    bearer, commit_or_rollback,
    database::get_conn,
    libs::{dser::deser_empty_to_none, gen_id, perm::Operator, time::parse_date, TIME},
    pages::{
        property::data::{PropertyListing, PropertyStatus, PROPERTY_FIELDS},
        sale::data::{Sale, SALE_FIELDS},
        task::data::{TaskInfo, TASK_INFO_SQL},
    },
    parse_jwt_macro,
    perm::action::{ReportGroup, REPORT},
    workflow, Response, ResponseResult,
};
use data::{
    sample_revenue, FinancialOverview, MetricsInfo, ProductivityTracker, Revenue, Series,
    METRICS_INFO_SQL,
};

pub fn report_router() -> Router {
    Router::new()
        .route("/dashboard/home", get(home_dashboard))
        .route("/dashboard/admin", get(admin_dashboard))
        .route("/dashboard/agent", get(agent_dashboard))
        .route("/productivity/log", post(log_hours))
        .route("/revenue/upsert", post(upsert_revenue))
        .route("/revenues", get(query_revenues))
        .route("/revenue/sample", post(seed_sample_revenue))
}

fn operator_with(headers: &HeaderMap, conn: &mut PooledConn, action: &str) -> Result<Operator, Response> {
    let bearer = bearer!(headers);
    let id = parse_jwt_macro!(&bearer, conn);
    let operator = Operator::new(&id, conn)?;
    operator.require(REPORT, action)?;
    Ok(operator)
}

fn revenues(conn: &mut PooledConn) -> Result<Vec<Revenue>, Response> {
    Ok(conn.query(
        "SELECT id, year, month, total_revenue, total_expenses, net_profit
        FROM revenue ORDER BY year, month",
    )?)
}

/// Trend charts shared by every role.
async fn home_dashboard(headers: HeaderMap) -> ResponseResult {
    let mut conn = get_conn()?;
    operator_with(&headers, &mut conn, ReportGroup::HOME)?;
    let sales: Series = conn
        .query::<(String, f64), _>(
            "SELECT LEFT(sale_date, 7) AS period, SUM(sale_price) FROM sale
            WHERE sale_date IS NOT NULL GROUP BY period ORDER BY period",
        )?
        .into_iter()
        .collect();
    let productivity: Series = conn
        .query::<(String, f64), _>(
            "SELECT date, SUM(hours_worked) FROM productivity_tracker GROUP BY date ORDER BY date",
        )?
        .into_iter()
        .collect();
    let revenue: Series = revenues(&mut conn)?
        .iter()
        .map(|r| (r.period(), r.total_revenue))
        .collect();
    let agents: Vec<MetricsInfo> = conn.query(format!(
        "{METRICS_INFO_SQL} ORDER BY m.aggregate_points DESC, name"
    ))?;
    Ok(Response::ok(json!({
        "sales_chart": sales,
        "productivity_chart": productivity,
        "revenue_chart": revenue,
        "agent_performance": agents,
    })))
}

async fn admin_dashboard(headers: HeaderMap) -> ResponseResult {
    let mut conn = get_conn()?;
    operator_with(&headers, &mut conn, ReportGroup::ADMIN)?;
    let employees: Vec<MetricsInfo> = conn.query(format!("{METRICS_INFO_SQL} ORDER BY name"))?;
    let mut property_status = serde_json::Map::new();
    let mut total: u64 = 0;
    for status in PropertyStatus::ALL {
        let count: Option<u64> = conn.exec_first(
            "SELECT COUNT(*) FROM property_listing WHERE status = ?",
            (*status,),
        )?;
        let count = count.unwrap_or_default();
        total += count;
        property_status.insert(status.as_str().to_owned(), json!(count));
    }
    property_status.insert("Total".into(), json!(total));
    let recent_sales: Vec<Sale> = conn.query(format!(
        "SELECT {SALE_FIELDS} FROM sale ORDER BY sale_date DESC, id LIMIT 5"
    ))?;
    let recent_tasks: Vec<TaskInfo> =
        conn.query(format!("{TASK_INFO_SQL} ORDER BY t.due_date DESC, t.id LIMIT 5"))?;
    Ok(Response::ok(json!({
        "employee_performance": employees,
        "property_status": property_status,
        "financial_overview": FinancialOverview::of(&revenues(&mut conn)?),
        "recent_sales": recent_sales,
        "recent_tasks": recent_tasks,
    })))
}

/// The caller's own work queue and numbers.
async fn agent_dashboard(headers: HeaderMap) -> ResponseResult {
    let mut conn = get_conn()?;
    let operator = operator_with(&headers, &mut conn, ReportGroup::AGENT)?;
    let employee = operator.employee()?;
    let tasks: Vec<TaskInfo> = conn.exec(
        format!("{TASK_INFO_SQL} WHERE t.assigned_to = ? ORDER BY t.due_date"),
        (&employee.id,),
    )?;
    let properties: Vec<PropertyListing> = conn.exec(
        format!("SELECT {PROPERTY_FIELDS} FROM property_listing WHERE status = ? ORDER BY location, address"),
        (PropertyStatus::Available,),
    )?;
    let metrics = workflow::metrics_of(&mut conn, &employee.id)?;
    let productivity: Vec<ProductivityTracker> = conn.exec(
        "SELECT id, employee_id, date, hours_worked, tasks_completed
        FROM productivity_tracker WHERE employee_id = ? ORDER BY date",
        (&employee.id,),
    )?;
    let sales: Vec<Sale> = conn.exec(
        format!("SELECT {SALE_FIELDS} FROM sale WHERE agent_id = ? ORDER BY sale_date DESC, id"),
        (&employee.id,),
    )?;
    Ok(Response::ok(json!({
        "tasks": tasks,
        "properties": properties,
        "performance_metrics": metrics,
        "productivity_data": productivity,
        "sales": sales,
    })))
}

#[derive(Debug, serde::Deserialize)]
struct HoursForm {
    hours: f64,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    date: Option<String>,
    /// someone else's hours, admins only
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    employee_id: Option<String>,
}

async fn log_hours(headers: HeaderMap, Json(value): Json<Value>) -> ResponseResult {
    let mut conn = get_conn()?;
    let operator = operator_with(&headers, &mut conn, ReportGroup::LOG_HOURS)?;
    let form: HoursForm = serde_json::from_value(value)?;
    let employee_id = match form.employee_id {
        Some(id) if operator.can(REPORT, ReportGroup::ADMIN) => id,
        Some(_) => return Err(Response::permission_denied()),
        None => operator.employee()?.id.clone(),
    };
    let date = match form.date.as_deref() {
        Some(d) => op::some!(parse_date(d);
            ret Err(Response::invalid_value("date must be formatted as YYYY-MM-DD"))),
        None => TIME::now()?.date(),
    };
    commit_or_rollback!(workflow::log_hours, &mut conn, &employee_id, date, form.hours)?;
    Ok(Response::empty())
}

fn __upsert_revenue(conn: &mut PooledConn, periods: &[Revenue]) -> Result<(), Response> {
    for r in periods {
        r.validate().map_err(Response::invalid_value)?;
        conn.exec_drop(
            "INSERT INTO revenue (id, year, month, total_revenue, total_expenses, net_profit)
            VALUES (:id, :year, :month, :total_revenue, :total_expenses, :net_profit)
            ON DUPLICATE KEY UPDATE total_revenue = VALUES(total_revenue),
            total_expenses = VALUES(total_expenses), net_profit = VALUES(net_profit)",
            params! {
                "id" => gen_id(),
                "year" => r.year,
                "month" => r.month,
                "total_revenue" => r.total_revenue,
                "total_expenses" => r.total_expenses,
                "net_profit" => r.net_profit,
            },
        )?;
    }
    Ok(())
}

async fn upsert_revenue(headers: HeaderMap, Json(value): Json<Value>) -> ResponseResult {
    let mut conn = get_conn()?;
    let operator = operator_with(&headers, &mut conn, ReportGroup::REVENUE)?;
    let form: Revenue = serde_json::from_value(value)?;
    // net profit is derived, whatever the form says
    let revenue = Revenue::new(form.year, form.month, form.total_revenue, form.total_expenses);
    commit_or_rollback!(__upsert_revenue, &mut conn, std::slice::from_ref(&revenue))?;
    tracing::info!(operator = %operator.id(), period = %revenue.period(), "revenue saved");
    Ok(Response::ok(json!(revenue)))
}

async fn query_revenues(headers: HeaderMap) -> ResponseResult {
    let mut conn = get_conn()?;
    operator_with(&headers, &mut conn, ReportGroup::HOME)?;
    let periods = revenues(&mut conn)?;
    Ok(Response::ok(json!({
        "data": periods,
        "overview": FinancialOverview::of(&periods),
    })))
}

/// Fill the twelve months up to the current one with sample figures.
async fn seed_sample_revenue(headers: HeaderMap) -> ResponseResult {
    let mut conn = get_conn()?;
    let operator = operator_with(&headers, &mut conn, ReportGroup::REVENUE)?;
    let today = TIME::now()?.date();
    let periods = sample_revenue(today.year() as u32, today.month());
    commit_or_rollback!(__upsert_revenue, &mut conn, &periods)?;
    tracing::info!(operator = %operator.id(), periods = periods.len(), "sample revenue seeded");
    Ok(Response::ok(json!(periods)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hours_form_defaults_to_today_and_self() {
        let form: HoursForm =
            serde_json::from_value(json!({"hours": 6.5, "date": "", "employee_id": ""})).unwrap();
        assert_eq!(form.hours, 6.5);
        assert!(form.date.is_none());
        assert!(form.employee_id.is_none());
        assert!(serde_json::from_value::<HoursForm>(json!({"date": "2025-01-01"})).is_err());
    }

    #[test]
    fn revenue_form_net_profit_is_optional() {
        let form: Revenue = serde_json::from_value(json!({
            "year": 2025, "month": 4, "total_revenue": 900.0, "total_expenses": 250.0
        }))
        .unwrap();
        let revenue = Revenue::new(form.year, form.month, form.total_revenue, form.total_expenses);
        assert_eq!(revenue.net_profit, 650.0);
        assert_eq!(revenue.period(), "2025-04");
    }
}
