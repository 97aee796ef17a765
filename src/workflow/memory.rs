use std::collections::HashMap;

use chrono::NaiveDate;

use super::WorkflowStore;
use crate::{
    libs::{gen_id, time::format_date},
    pages::{
        employee::data::Employee,
        property::data::{PropertyListing, PropertyStatus},
        report::data::{PerformanceMetrics, ProductivityTracker},
        sale::data::{AgentProfit, Sale},
        task::data::{PredefinedTask, Task},
    },
};

/// In-memory store with the same counter semantics as the MySQL tables.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub employees: HashMap<String, Employee>,
    pub metrics: HashMap<String, PerformanceMetrics>,
    pub productivity: Vec<ProductivityTracker>,
    pub predefined: HashMap<String, PredefinedTask>,
    pub tasks: HashMap<String, Task>,
    pub properties: HashMap<String, PropertyListing>,
    pub sales: Vec<Sale>,
    pub profits: Vec<AgentProfit>,
}

impl MemoryStore {
    pub fn productivity_of(&self, employee_id: &str) -> Vec<&ProductivityTracker> {
        self.productivity
            .iter()
            .filter(|p| p.employee_id == employee_id)
            .collect()
    }
}

impl WorkflowStore for MemoryStore {
    fn employee(&mut self, id: &str) -> mysql::Result<Option<Employee>> {
        Ok(self.employees.get(id).cloned())
    }

    fn insert_employee(&mut self, employee: &Employee) -> mysql::Result<()> {
        self.employees.insert(employee.id.clone(), employee.clone());
        Ok(())
    }

    fn ensure_metrics(&mut self, employee_id: &str) -> mysql::Result<()> {
        self.metrics
            .entry(employee_id.to_owned())
            .or_insert_with(|| PerformanceMetrics::new(employee_id));
        Ok(())
    }

    fn metrics(&mut self, employee_id: &str) -> mysql::Result<Option<PerformanceMetrics>> {
        Ok(self.metrics.get(employee_id).cloned())
    }

    fn record_task_completed(&mut self, employee_id: &str) -> mysql::Result<()> {
        self.ensure_metrics(employee_id)?;
        if let Some(m) = self.metrics.get_mut(employee_id) {
            m.tasks_completed += 1;
            m.update_aggregate_points();
        }
        Ok(())
    }

    fn record_sale_closed(&mut self, employee_id: &str) -> mysql::Result<()> {
        self.ensure_metrics(employee_id)?;
        if let Some(m) = self.metrics.get_mut(employee_id) {
            m.sales_closed += 1;
            m.update_aggregate_points();
        }
        Ok(())
    }

    fn add_productivity(
        &mut self,
        employee_id: &str,
        date: NaiveDate,
        tasks_completed: u32,
        hours_worked: f64,
    ) -> mysql::Result<()> {
        let date = format_date(date);
        match self
            .productivity
            .iter_mut()
            .find(|p| p.employee_id == employee_id && p.date == date)
        {
            Some(row) => {
                row.tasks_completed += tasks_completed;
                row.hours_worked += hours_worked;
            }
            None => self.productivity.push(ProductivityTracker {
                id: gen_id(),
                employee_id: employee_id.to_owned(),
                date,
                hours_worked,
                tasks_completed,
            }),
        }
        Ok(())
    }

    fn predefined_task(&mut self, id: &str) -> mysql::Result<Option<PredefinedTask>> {
        Ok(self.predefined.get(id).cloned())
    }

    fn task_for_update(&mut self, id: &str) -> mysql::Result<Option<Task>> {
        Ok(self.tasks.get(id).cloned())
    }

    fn insert_task(&mut self, task: &Task) -> mysql::Result<()> {
        self.tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    fn update_task(&mut self, task: &Task) -> mysql::Result<()> {
        self.tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    fn property_for_update(&mut self, id: &str) -> mysql::Result<Option<PropertyListing>> {
        Ok(self.properties.get(id).cloned())
    }

    fn set_property_status(&mut self, id: &str, status: PropertyStatus) -> mysql::Result<()> {
        if let Some(p) = self.properties.get_mut(id) {
            p.status = status;
        }
        Ok(())
    }

    fn insert_sale(&mut self, sale: &Sale) -> mysql::Result<()> {
        self.sales.push(sale.clone());
        Ok(())
    }

    fn insert_agent_profit(&mut self, profit: &AgentProfit) -> mysql::Result<()> {
        self.profits.push(profit.clone());
        Ok(())
    }
}
