//! Task, sale and performance bookkeeping.
//!
//! Every mutation that affects an employee's score goes through here. The
//! follow-up bookkeeping (metrics counters, productivity rows, agent profit)
//! is performed explicitly by the operation that caused it, in the caller's
//! transaction. Handlers wrap these calls in `commit_or_rollback!`.

mod mysql_store;
mod store;
#[cfg(test)]
pub(crate) mod memory;

use chrono::NaiveDate;

pub use store::WorkflowStore;

use crate::{
    error::{WorkflowError, WorkflowResult},
    libs::{
        gen_id,
        time::{format_date, parse_date},
    },
    pages::{
        employee::data::{Employee, Role},
        property::data::PropertyStatus,
        report::data::PerformanceMetrics,
        sale::data::{AgentProfit, Sale, SaleDraft},
        task::data::{Priority, Task, TaskDraft, TaskStatus},
    },
};

/// Insert a new employee together with its metrics record.
pub fn register_employee<S: WorkflowStore>(store: &mut S, employee: &Employee) -> WorkflowResult<()> {
    store.insert_employee(employee)?;
    store.ensure_metrics(&employee.id)?;
    tracing::info!(employee = %employee.id, role = %employee.role, "employee registered");
    Ok(())
}

pub fn metrics_of<S: WorkflowStore>(store: &mut S, employee_id: &str) -> WorkflowResult<PerformanceMetrics> {
    Ok(store
        .metrics(employee_id)?
        .unwrap_or_else(|| PerformanceMetrics::new(employee_id)))
}

fn parse_status(value: &str) -> WorkflowResult<TaskStatus> {
    value.parse().map_err(WorkflowError::Validation)
}

/// Build a task from a draft, taking priority and description from the
/// template when the draft leaves them empty.
pub fn prepare_task<S: WorkflowStore>(store: &mut S, id: String, draft: &TaskDraft) -> WorkflowResult<Task> {
    let template = store
        .predefined_task(&draft.predefined_task_id)?
        .ok_or_else(|| WorkflowError::not_found(format!("predefined task {}", draft.predefined_task_id)))?;
    let priority = match draft.priority.as_deref() {
        Some(p) => p.parse::<Priority>().map_err(WorkflowError::Validation)?,
        None => template.priority,
    };
    let description = draft
        .description
        .clone()
        .unwrap_or_else(|| template.description.clone());
    let status = match draft.status.as_deref() {
        Some(s) => parse_status(s)?,
        None => TaskStatus::Pending,
    };
    Ok(Task {
        id,
        predefined_task_id: template.id,
        assigned_to: draft.assigned_to.clone(),
        description,
        priority,
        due_date: draft.due_date.trim().to_owned(),
        status,
        document: None,
    })
}

fn due_date_not_past(value: &str, today: NaiveDate) -> WorkflowResult<NaiveDate> {
    let due = parse_date(value).ok_or_else(|| WorkflowError::validation("Invalid due date format."))?;
    if due < today {
        return Err(WorkflowError::validation("Due date cannot be in the past."));
    }
    Ok(due)
}

fn require_agent<S: WorkflowStore>(store: &mut S, employee_id: Option<&str>) -> WorkflowResult<Employee> {
    let employee_id = employee_id.ok_or_else(|| WorkflowError::validation("employee_id is required"))?;
    let employee = store
        .employee(employee_id)?
        .ok_or_else(|| WorkflowError::not_found(format!("employee {employee_id}")))?;
    if employee.role != Role::Agent {
        return Err(WorkflowError::validation("Selected user is not an agent."));
    }
    Ok(employee)
}

/// Assign a new Pending task to an agent.
pub fn assign_task<S: WorkflowStore>(store: &mut S, draft: &TaskDraft, today: NaiveDate) -> WorkflowResult<Task> {
    let agent = require_agent(store, draft.assigned_to.as_deref())?;
    due_date_not_past(&draft.due_date, today)?;
    let mut task = prepare_task(store, gen_id(), draft)?;
    task.status = TaskStatus::Pending;
    store.insert_task(&task)?;
    tracing::info!(task = %task.id, agent = %agent.id, priority = %task.priority, "task assigned");
    Ok(task)
}

/// Result of a status change.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskTransition {
    pub task: Task,
    pub previous: TaskStatus,
    /// Whether this save moved the task into Completed and was counted.
    pub counted: bool,
}

/// Count a completion for `employee_id`: metrics and today's productivity.
fn count_completion<S: WorkflowStore>(store: &mut S, employee_id: &str, today: NaiveDate) -> WorkflowResult<()> {
    if store.employee(employee_id)?.is_none() {
        return Err(WorkflowError::not_found(format!("employee {employee_id}")));
    }
    store.record_task_completed(employee_id)?;
    store.add_productivity(employee_id, today, 1, 0.0)?;
    Ok(())
}

/// Apply `status` (and an optional freshly uploaded document link) to a
/// loaded task, counting the completion on a transition into Completed.
fn apply_status<S: WorkflowStore>(
    store: &mut S,
    mut task: Task,
    status: TaskStatus,
    document: Option<String>,
    today: NaiveDate,
) -> WorkflowResult<TaskTransition> {
    let previous = task.status;
    let document = document.filter(|d| !d.trim().is_empty());
    if status == TaskStatus::Completed && document.is_none() && !task.has_document() {
        return Err(WorkflowError::validation(
            "Document submission is required to mark the task as completed",
        ));
    }
    let counted = status == TaskStatus::Completed && previous != TaskStatus::Completed;
    if counted && task.assigned_to.is_none() {
        return Err(WorkflowError::validation(
            "task has no assignee to credit the completion to",
        ));
    }
    if status == TaskStatus::Completed && document.is_some() {
        task.document = document;
    }
    task.status = status;
    store.update_task(&task)?;
    if counted {
        if let Some(employee_id) = task.assigned_to.as_deref() {
            count_completion(store, employee_id, today)?;
        }
    }
    tracing::info!(task = %task.id, from = %previous, to = %status, counted, "task status updated");
    Ok(TaskTransition { task, previous, counted })
}

/// Status change requested by the task's assignee.
pub fn update_task_status<S: WorkflowStore>(
    store: &mut S,
    actor: &Employee,
    task_id: &str,
    status: &str,
    document: Option<String>,
    today: NaiveDate,
) -> WorkflowResult<TaskTransition> {
    let status = parse_status(status)?;
    let task = store
        .task_for_update(task_id)?
        .ok_or_else(|| WorkflowError::not_found(format!("task {task_id}")))?;
    if task.assigned_to.as_deref() != Some(actor.id.as_str()) {
        return Err(WorkflowError::Forbidden(format!(
            "employee {} is not assigned to task {task_id}",
            actor.id
        )));
    }
    apply_status(store, task, status, document, today)
}

/// Manager edit of an existing task. Priority and description the form
/// leaves out stay as stored; template defaults apply only when the template
/// changes or nothing is stored. A change into Completed is counted for the
/// (possibly new) assignee.
pub fn edit_task<S: WorkflowStore>(
    store: &mut S,
    task_id: &str,
    draft: &TaskDraft,
    today: NaiveDate,
) -> WorkflowResult<TaskTransition> {
    let current = store
        .task_for_update(task_id)?
        .ok_or_else(|| WorkflowError::not_found(format!("task {task_id}")))?;
    if parse_date(&draft.due_date).is_none() {
        return Err(WorkflowError::validation("Invalid due date format."));
    }
    if draft.assigned_to.is_some() {
        require_agent(store, draft.assigned_to.as_deref())?;
    }
    let status = match draft.status.as_deref() {
        Some(s) => parse_status(s)?,
        None => TaskStatus::Pending,
    };
    let template = store
        .predefined_task(&draft.predefined_task_id)?
        .ok_or_else(|| WorkflowError::not_found(format!("predefined task {}", draft.predefined_task_id)))?;
    let template_changed = template.id != current.predefined_task_id;
    let priority = match draft.priority.as_deref() {
        Some(p) => p.parse::<Priority>().map_err(WorkflowError::Validation)?,
        None if template_changed => template.priority,
        None => current.priority,
    };
    let description = match &draft.description {
        Some(d) => d.clone(),
        None if template_changed || current.description.trim().is_empty() => template.description,
        None => current.description.clone(),
    };
    let edited = Task {
        predefined_task_id: template.id,
        assigned_to: draft.assigned_to.clone(),
        description,
        priority,
        due_date: draft.due_date.trim().to_owned(),
        // the edit form carries no document and the status change is judged
        // against the stored one below
        ..current
    };
    apply_status(store, edited, status, None, today)
}

/// Record worked hours for an employee on `date`.
pub fn log_hours<S: WorkflowStore>(
    store: &mut S,
    employee_id: &str,
    date: NaiveDate,
    hours: f64,
) -> WorkflowResult<()> {
    if !hours.is_finite() || hours <= 0.0 || hours > 24.0 {
        return Err(WorkflowError::validation("hours must be greater than 0 and at most 24"));
    }
    if store.employee(employee_id)?.is_none() {
        return Err(WorkflowError::not_found(format!("employee {employee_id}")));
    }
    store.add_productivity(employee_id, date, 0, hours)?;
    tracing::debug!(employee = employee_id, date = %date, hours, "hours logged");
    Ok(())
}

/// Close the sale of a property: insert the sale, mark the property Sold,
/// credit the agent and book the agent's profit.
pub fn record_sale<S: WorkflowStore>(
    store: &mut S,
    property_id: &str,
    agent_id: &str,
    draft: SaleDraft,
    today: NaiveDate,
) -> WorkflowResult<Sale> {
    draft.validate().map_err(WorkflowError::Validation)?;
    let property = store
        .property_for_update(property_id)?
        .ok_or_else(|| WorkflowError::not_found(format!("property {property_id}")))?;
    if property.status == PropertyStatus::Sold {
        return Err(WorkflowError::validation(format!(
            "property {property_id} has already been sold"
        )));
    }
    if store.employee(agent_id)?.is_none() {
        return Err(WorkflowError::not_found(format!("agent {agent_id}")));
    }
    let sale = draft.into_sale(
        gen_id(),
        property.id.clone(),
        agent_id.to_owned(),
        format_date(today),
    );
    store.insert_sale(&sale)?;
    store.set_property_status(&property.id, PropertyStatus::Sold)?;
    store.record_sale_closed(agent_id)?;
    store.insert_agent_profit(&AgentProfit {
        id: gen_id(),
        agent_id: agent_id.to_owned(),
        sale_id: sale.id.clone(),
        profit_amount: sale.profit(),
        recorded_at: format_date(today),
    })?;
    tracing::info!(
        sale = %sale.id,
        property = %property.id,
        agent = agent_id,
        price = sale.sale_price,
        profit = sale.profit(),
        "sale recorded"
    );
    Ok(sale)
}

/// Sold is reached through a sale only, and is final once reached.
pub fn check_manual_status(current: PropertyStatus, new: PropertyStatus) -> WorkflowResult<()> {
    match (current, new) {
        (PropertyStatus::Sold, PropertyStatus::Sold) => Ok(()),
        (PropertyStatus::Sold, _) => Err(WorkflowError::validation("a sold property cannot change status")),
        (_, PropertyStatus::Sold) => Err(WorkflowError::validation(
            "record a sale through /property/sale/:id to mark a property Sold",
        )),
        _ => Ok(()),
    }
}

/// Manual status change of a listing, checked against the locked row.
/// Returns the status it replaced.
pub fn change_property_status<S: WorkflowStore>(
    store: &mut S,
    property_id: &str,
    status: PropertyStatus,
) -> WorkflowResult<PropertyStatus> {
    let property = store
        .property_for_update(property_id)?
        .ok_or_else(|| WorkflowError::not_found(format!("property {property_id}")))?;
    check_manual_status(property.status, status)?;
    store.set_property_status(&property.id, status)?;
    Ok(property.status)
}
