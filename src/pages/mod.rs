use axum::Router;

pub mod account;
pub mod employee;
pub mod property;
pub mod report;
pub mod sale;
pub mod task;

pub fn pages_router() -> Router {
    account::account_router()
        .merge(employee::employee_router())
        .merge(property::property_router())
        .merge(task::task_router())
        .merge(sale::sale_router())
        .merge(report::report_router())
}
