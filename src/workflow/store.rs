use chrono::NaiveDate;

use crate::pages::{
    employee::data::Employee,
    property::data::{PropertyListing, PropertyStatus},
    report::data::PerformanceMetrics,
    sale::data::{AgentProfit, Sale},
    task::data::{PredefinedTask, Task},
};

/// Persistence operations the bookkeeping workflow needs.
///
/// Counter methods must be atomic read-modify-write operations in the
/// backing store; callers never read a counter, bump it and write it back.
pub trait WorkflowStore {
    fn employee(&mut self, id: &str) -> mysql::Result<Option<Employee>>;
    fn insert_employee(&mut self, employee: &Employee) -> mysql::Result<()>;

    /// Create the metrics row for `employee_id` unless it already exists.
    fn ensure_metrics(&mut self, employee_id: &str) -> mysql::Result<()>;
    fn metrics(&mut self, employee_id: &str) -> mysql::Result<Option<PerformanceMetrics>>;
    /// `tasks_completed += 1` and recompute `aggregate_points`.
    fn record_task_completed(&mut self, employee_id: &str) -> mysql::Result<()>;
    /// `sales_closed += 1` and recompute `aggregate_points`.
    fn record_sale_closed(&mut self, employee_id: &str) -> mysql::Result<()>;
    /// Add to the `(employee_id, date)` productivity row, creating it at zero first.
    fn add_productivity(
        &mut self,
        employee_id: &str,
        date: NaiveDate,
        tasks_completed: u32,
        hours_worked: f64,
    ) -> mysql::Result<()>;

    fn predefined_task(&mut self, id: &str) -> mysql::Result<Option<PredefinedTask>>;
    /// Load a task, locking it for the rest of the transaction.
    fn task_for_update(&mut self, id: &str) -> mysql::Result<Option<Task>>;
    fn insert_task(&mut self, task: &Task) -> mysql::Result<()>;
    fn update_task(&mut self, task: &Task) -> mysql::Result<()>;

    /// Load a property, locking it for the rest of the transaction.
    fn property_for_update(&mut self, id: &str) -> mysql::Result<Option<PropertyListing>>;
    fn set_property_status(&mut self, id: &str, status: PropertyStatus) -> mysql::Result<()>;
    fn insert_sale(&mut self, sale: &Sale) -> mysql::Result<()>;
    fn insert_agent_profit(&mut self, profit: &AgentProfit) -> mysql::Result<()>;
}
