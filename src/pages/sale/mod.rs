pub mod data;

use axum::{
    extract::Path,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use mysql::{prelude::Queryable, PooledConn};
use serde_json::{json, Value};

use crate::{
    bearer, commit_or_rollback,
    database::get_conn,
    libs::{perm::Operator, TIME},
    parse_jwt_macro,
    perm::action::{PropertyGroup, SaleGroup, PROPERTY, SALE},
    workflow, Response, ResponseResult,
};
use data::{Sale, SaleDraft, SALE_FIELDS};

pub fn sale_router() -> Router {
    Router::new()
        .route("/property/sale/:id", post(record_sale))
        .route("/sales", get(query_own_sales))
        .route("/sales/all", get(query_all_sales))
}

fn operator(headers: &HeaderMap, conn: &mut PooledConn) -> Result<Operator, Response> {
    let bearer = bearer!(headers);
    let id = parse_jwt_macro!(&bearer, conn);
    Operator::new(&id, conn)
}

/// Close the sale of a property. The caller is credited as the agent.
async fn record_sale(headers: HeaderMap, Path(property_id): Path<String>, Json(value): Json<Value>) -> ResponseResult {
    let mut conn = get_conn()?;
    let operator = operator(&headers, &mut conn)?;
    operator.require(PROPERTY, PropertyGroup::SELL)?;
    let agent_id = operator.employee()?.id.clone();
    let draft: SaleDraft = serde_json::from_value(value)?;
    let today = TIME::now()?.date();
    let sale = commit_or_rollback!(workflow::record_sale, &mut conn, &property_id, &agent_id, draft, today)?;
    tracing::info!(operator = %operator.id(), sale = %sale.id, property = %property_id, "sale saved");
    Ok(Response::ok(json!(sale)))
}

async fn query_own_sales(headers: HeaderMap) -> ResponseResult {
    let mut conn = get_conn()?;
    let operator = operator(&headers, &mut conn)?;
    operator.require(SALE, SaleGroup::QUERY_OWN)?;
    let employee = operator.employee()?;
    let sales: Vec<Sale> = conn.exec(
        format!("SELECT {SALE_FIELDS} FROM sale WHERE agent_id = ? ORDER BY sale_date DESC, id"),
        (&employee.id,),
    )?;
    Ok(Response::ok(json!(sales)))
}

async fn query_all_sales(headers: HeaderMap) -> ResponseResult {
    let mut conn = get_conn()?;
    operator(&headers, &mut conn)?.require(SALE, SaleGroup::QUERY_ALL)?;
    let sales: Vec<Sale> = conn.query(format!(
        "SELECT {SALE_FIELDS} FROM sale ORDER BY sale_date DESC, id"
    ))?;
    let total: f64 = sales.iter().map(|s| s.sale_price).sum();
    let profit: f64 = sales.iter().map(Sale::profit).sum();
    Ok(Response::ok(json!({
        "data": sales,
        "total_sales": total,
        "total_profit": profit,
    })))
}
