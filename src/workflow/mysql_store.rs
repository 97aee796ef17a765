use chrono::NaiveDate;
use mysql::{params, prelude::Queryable, PooledConn};

use super::WorkflowStore;
use crate::{
    libs::{gen_id, time::format_date},
    pages::{
        employee::data::{Employee, EMPLOYEE_FIELDS},
        property::data::{PropertyListing, PropertyStatus, PROPERTY_FIELDS},
        report::data::{PerformanceMetrics, SALE_POINTS, TASK_POINTS},
        sale::data::{AgentProfit, Sale, SALE_FIELDS},
        task::data::{PredefinedTask, Task, TASK_FIELDS},
    },
};

impl WorkflowStore for PooledConn {
    fn employee(&mut self, id: &str) -> mysql::Result<Option<Employee>> {
        self.exec_first(
            format!("SELECT {EMPLOYEE_FIELDS} FROM employee WHERE id = ?"),
            (id,),
        )
    }

    fn insert_employee(&mut self, employee: &Employee) -> mysql::Result<()> {
        self.exec_drop(
            format!(
                "INSERT INTO employee ({EMPLOYEE_FIELDS}) VALUES
                (:id, :user_id, :role, :join_date, :performance_score)"
            ),
            params! {
                "id" => &employee.id,
                "user_id" => &employee.user_id,
                "role" => employee.role,
                "join_date" => &employee.join_date,
                "performance_score" => employee.performance_score,
            },
        )
    }

    fn ensure_metrics(&mut self, employee_id: &str) -> mysql::Result<()> {
        self.exec_drop(
            "INSERT IGNORE INTO performance_metrics
            (employee_id, tasks_completed, sales_closed, aggregate_points) VALUES (?, 0, 0, 0)",
            (employee_id,),
        )
    }

    fn metrics(&mut self, employee_id: &str) -> mysql::Result<Option<PerformanceMetrics>> {
        self.exec_first(
            "SELECT employee_id, tasks_completed, sales_closed, aggregate_points
            FROM performance_metrics WHERE employee_id = ?",
            (employee_id,),
        )
    }

    fn record_task_completed(&mut self, employee_id: &str) -> mysql::Result<()> {
        self.ensure_metrics(employee_id)?;
        self.exec_drop(counter_sql("tasks_completed"), (employee_id,))
    }

    fn record_sale_closed(&mut self, employee_id: &str) -> mysql::Result<()> {
        self.ensure_metrics(employee_id)?;
        self.exec_drop(counter_sql("sales_closed"), (employee_id,))
    }

    fn add_productivity(
        &mut self,
        employee_id: &str,
        date: NaiveDate,
        tasks_completed: u32,
        hours_worked: f64,
    ) -> mysql::Result<()> {
        self.exec_drop(
            "INSERT INTO productivity_tracker (id, employee_id, date, hours_worked, tasks_completed)
            VALUES (:id, :employee_id, :date, :hours, :tasks)
            ON DUPLICATE KEY UPDATE tasks_completed = tasks_completed + :tasks,
            hours_worked = hours_worked + :hours",
            params! {
                "id" => gen_id(),
                "employee_id" => employee_id,
                "date" => format_date(date),
                "hours" => hours_worked,
                "tasks" => tasks_completed,
            },
        )
    }

    fn predefined_task(&mut self, id: &str) -> mysql::Result<Option<PredefinedTask>> {
        self.exec_first(
            "SELECT id, title, description, priority FROM predefined_task WHERE id = ?",
            (id,),
        )
    }

    fn task_for_update(&mut self, id: &str) -> mysql::Result<Option<Task>> {
        self.exec_first(
            format!("SELECT {TASK_FIELDS} FROM task WHERE id = ? FOR UPDATE"),
            (id,),
        )
    }

    fn insert_task(&mut self, task: &Task) -> mysql::Result<()> {
        self.exec_drop(
            format!(
                "INSERT INTO task ({TASK_FIELDS}) VALUES (:id, :predefined_task_id, :assigned_to,
                :description, :priority, :due_date, :status, :document)"
            ),
            task_params(task),
        )
    }

    fn update_task(&mut self, task: &Task) -> mysql::Result<()> {
        self.exec_drop(
            "UPDATE task SET predefined_task_id = :predefined_task_id, assigned_to = :assigned_to,
            description = :description, priority = :priority, due_date = :due_date,
            status = :status, document = :document WHERE id = :id",
            task_params(task),
        )
    }

    fn property_for_update(&mut self, id: &str) -> mysql::Result<Option<PropertyListing>> {
        self.exec_first(
            format!("SELECT {PROPERTY_FIELDS} FROM property_listing WHERE id = ? FOR UPDATE"),
            (id,),
        )
    }

    fn set_property_status(&mut self, id: &str, status: PropertyStatus) -> mysql::Result<()> {
        self.exec_drop(
            "UPDATE property_listing SET status = ? WHERE id = ?",
            (status, id),
        )
    }

    fn insert_sale(&mut self, sale: &Sale) -> mysql::Result<()> {
        self.exec_drop(
            format!(
                "INSERT INTO sale ({SALE_FIELDS}) VALUES (:id, :property_id, :agent_id,
                :buyer_name, :buyer_id, :buyer_email, :buyer_tel, :buyer_address, :payment_method,
                :seller_name, :seller_tel, :seller_email, :seller_address, :ownership_verification,
                :sale_date, :sale_price, :title_insurance, :legal_fees, :deposit, :closing_date)"
            ),
            params! {
                "id" => &sale.id,
                "property_id" => &sale.property_id,
                "agent_id" => &sale.agent_id,
                "buyer_name" => &sale.buyer_name,
                "buyer_id" => &sale.buyer_id,
                "buyer_email" => &sale.buyer_email,
                "buyer_tel" => &sale.buyer_tel,
                "buyer_address" => &sale.buyer_address,
                "payment_method" => &sale.payment_method,
                "seller_name" => &sale.seller_name,
                "seller_tel" => &sale.seller_tel,
                "seller_email" => &sale.seller_email,
                "seller_address" => &sale.seller_address,
                "ownership_verification" => &sale.ownership_verification,
                "sale_date" => &sale.sale_date,
                "sale_price" => sale.sale_price,
                "title_insurance" => sale.title_insurance,
                "legal_fees" => sale.legal_fees,
                "deposit" => sale.deposit,
                "closing_date" => &sale.closing_date,
            },
        )
    }

    fn insert_agent_profit(&mut self, profit: &AgentProfit) -> mysql::Result<()> {
        self.exec_drop(
            "INSERT INTO agent_profit (id, agent_id, sale_id, profit_amount, recorded_at)
            VALUES (:id, :agent_id, :sale_id, :profit_amount, :recorded_at)",
            params! {
                "id" => &profit.id,
                "agent_id" => &profit.agent_id,
                "sale_id" => &profit.sale_id,
                "profit_amount" => profit.profit_amount,
                "recorded_at" => &profit.recorded_at,
            },
        )
    }
}

/// Bump one metrics counter and recompute the points in the same statement.
/// MySQL evaluates single-table UPDATE assignments left to right, so the
/// increment must come before `aggregate_points`.
fn counter_sql(counter: &str) -> String {
    format!(
        "UPDATE performance_metrics SET {counter} = {counter} + 1,
        aggregate_points = sales_closed * {SALE_POINTS} + tasks_completed * {TASK_POINTS}
        WHERE employee_id = ?"
    )
}

fn task_params(task: &Task) -> mysql::Params {
    params! {
        "id" => &task.id,
        "predefined_task_id" => &task.predefined_task_id,
        "assigned_to" => &task.assigned_to,
        "description" => &task.description,
        "priority" => task.priority,
        "due_date" => &task.due_date,
        "status" => task.status,
        "document" => &task.document,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_is_bumped_before_points_are_recomputed() {
        for counter in ["tasks_completed", "sales_closed"] {
            let sql = counter_sql(counter);
            let bump = sql.find(&format!("{counter} = {counter} + 1")).unwrap();
            let points = sql.find("aggregate_points =").unwrap();
            assert!(bump < points, "{sql}");
            assert!(sql.contains(&format!("sales_closed * {SALE_POINTS}")));
            assert!(sql.contains(&format!("tasks_completed * {TASK_POINTS}")));
            assert!(sql.trim_end().ends_with("WHERE employee_id = ?"));
        }
    }
}
