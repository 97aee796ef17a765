pub mod data;

use axum::{
    extract::{Multipart, Path},
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
        gen_id, parse_multipart, perm::Operator, read_file, remove_file, store_file,
        time::format_date, TIME,
    },
    pages::employee::data::{Employee, EmployeeInfo, EMPLOYEE_INFO_SQL},
    parse_jwt_macro,
    perm::action::{TaskGroup, TASK},
    response::BodyFile,
    workflow, Config, Response, ResponseResult,
};
use data::{PredefinedTask, Priority, TaskDraft, TaskInfo, TaskStatus, TASK_INFO_SQL};

pub fn task_router() -> Router {
    Router::new()
        .route("/predefined/tasks", get(query_predefined_tasks))
        .route("/predefined/task/add", post(add_predefined_task))
        .route("/task/assign", post(assign_task))
        .route("/tasks/assigned", get(query_assigned_tasks))
        .route("/task/edit/:id", post(edit_task))
        .route("/task/delete/:id", delete(delete_task))
        .route("/tasks/dashboard", get(task_dashboard))
        .route("/tasks/performance", get(task_performance))
        .route("/tasks/clear", post(clear_tasks))
        .route("/task/:id", get(task_detail))
        .route("/task/status/:id", post(update_task_status))
        .route("/task/document/:file", get(task_document))
}

fn operator_with(headers: &HeaderMap, conn: &mut PooledConn, action: &str) -> Result<Operator, Response> {
    let bearer = bearer!(headers);
    let id = parse_jwt_macro!(&bearer, conn);
    let operator = Operator::new(&id, conn)?;
    operator.require(TASK, action)?;
    Ok(operator)
}

async fn query_predefined_tasks(headers: HeaderMap) -> ResponseResult {
    let mut conn = get_conn()?;
    operator_with(&headers, &mut conn, TaskGroup::QUERY_OWN)?;
    let tasks: Vec<PredefinedTask> =
        conn.query("SELECT id, title, description, priority FROM predefined_task ORDER BY title")?;
    Ok(Response::ok(json!(tasks)))
}

async fn add_predefined_task(headers: HeaderMap, Json(value): Json<Value>) -> ResponseResult {
    let mut conn = get_conn()?;
    let operator = operator_with(&headers, &mut conn, TaskGroup::TEMPLATE)?;
    let mut task: PredefinedTask = serde_json::from_value(value)?;
    if task.title.trim().is_empty() || task.title.chars().count() > 255 {
        return Err(Response::invalid_value("title must be 1 to 255 characters"));
    }
    task.id = gen_id();
    conn.exec_drop(
        "INSERT INTO predefined_task (id, title, description, priority)
        VALUES (:id, :title, :description, :priority)",
        params! {
            "id" => &task.id,
            "title" => task.title.trim(),
            "description" => &task.description,
            "priority" => task.priority,
        },
    )?;
    tracing::info!(operator = %operator.id(), template = %task.id, "predefined task added");
    Ok(Response::ok(json!(task)))
}

async fn assign_task(headers: HeaderMap, Json(value): Json<Value>) -> ResponseResult {
    let mut conn = get_conn()?;
    let operator = operator_with(&headers, &mut conn, TaskGroup::ASSIGN)?;
    let draft: TaskDraft = serde_json::from_value(value)?;
    let today = TIME::now()?.date();
    let task = commit_or_rollback!(workflow::assign_task, &mut conn, &draft, today)?;
    tracing::info!(operator = %operator.id(), task = %task.id, "task assignment saved");
    Ok(Response::ok(json!(task)))
}

fn agents(conn: &mut PooledConn) -> Result<Vec<EmployeeInfo>, Response> {
    Ok(conn.query(format!(
        "{EMPLOYEE_INFO_SQL} WHERE e.role = 'Agent' ORDER BY u.first_name, u.last_name"
    ))?)
}

/// Everything the assignment screen shows.
async fn query_assigned_tasks(headers: HeaderMap) -> ResponseResult {
    let mut conn = get_conn()?;
    operator_with(&headers, &mut conn, TaskGroup::QUERY_ALL)?;
    let predefined: Vec<PredefinedTask> =
        conn.query("SELECT id, title, description, priority FROM predefined_task ORDER BY title")?;
    let assigned: Vec<TaskInfo> = conn.query(format!(
        "{TASK_INFO_SQL} WHERE t.assigned_to IS NOT NULL ORDER BY t.due_date"
    ))?;
    Ok(Response::ok(json!({
        "predefined_tasks": predefined,
        "agents": agents(&mut conn)?,
        "assigned_tasks": assigned,
    })))
}

async fn edit_task(headers: HeaderMap, Path(id): Path<String>, Json(value): Json<Value>) -> ResponseResult {
    let mut conn = get_conn()?;
    let operator = operator_with(&headers, &mut conn, TaskGroup::ASSIGN)?;
    let draft: TaskDraft = serde_json::from_value(value)?;
    let today = TIME::now()?.date();
    let transition = commit_or_rollback!(workflow::edit_task, &mut conn, &id, &draft, today)?;
    tracing::info!(operator = %operator.id(), task = %id, counted = transition.counted, "task edited");
    Ok(Response::ok(json!(transition.task)))
}

fn document_of(id: &str, conn: &mut PooledConn) -> Result<Option<String>, Response> {
    let document: Option<Option<String>> =
        conn.exec_first("SELECT document FROM task WHERE id = ?", (id,))?;
    let document = op::some!(document; ret Err(Response::not_exist(format!("task {id}"))));
    Ok(document.filter(|d| !d.is_empty()))
}

async fn delete_task(headers: HeaderMap, Path(id): Path<String>) -> ResponseResult {
    let mut conn = get_conn()?;
    let operator = operator_with(&headers, &mut conn, TaskGroup::DELETE)?;
    let document = document_of(&id, &mut conn)?;
    conn.exec_drop("DELETE FROM task WHERE id = ?", (&id,))?;
    if let Some(document) = document {
        remove_file(&Config::get().task_dir(), &document);
    }
    tracing::info!(operator = %operator.id(), task = %id, "task deleted");
    Ok(Response::empty())
}

#[derive(Debug, Default, serde::Deserialize)]
struct ClearForm {
    #[serde(default)]
    status: Option<TaskStatus>,
}

/// Delete every task, or only those in `status`.
async fn clear_tasks(headers: HeaderMap, Json(value): Json<Value>) -> ResponseResult {
    let mut conn = get_conn()?;
    let operator = operator_with(&headers, &mut conn, TaskGroup::DELETE)?;
    let form: ClearForm = match value {
        Value::Null => ClearForm::default(),
        value => serde_json::from_value(value)?,
    };
    let status = form.status.map(|s| s.as_str()).unwrap_or_default();
    let filter = "WHERE (:status = '' OR status = :status)";
    let documents: Vec<Option<String>> = conn.exec(
        format!("SELECT document FROM task {filter}"),
        params! { "status" => status },
    )?;
    conn.exec_drop(format!("DELETE FROM task {filter}"), params! { "status" => status })?;
    let dir = Config::get().task_dir();
    for document in documents.iter().flatten().filter(|d| !d.is_empty()) {
        remove_file(&dir, document);
    }
    tracing::info!(operator = %operator.id(), status, removed = documents.len(), "tasks cleared");
    Ok(Response::ok(json!({ "removed": documents.len() })))
}

/// Counts and attention lists over every task.
#[derive(Debug, Default, serde::Serialize)]
pub struct TaskDashboard {
    pub by_status: Vec<(TaskStatus, usize)>,
    pub by_priority: Vec<(Priority, usize)>,
    /// open tasks past their due date
    pub overdue: Vec<TaskInfo>,
    /// open tasks due within the next seven days
    pub due_soon: Vec<TaskInfo>,
}

impl TaskDashboard {
    pub fn build(tasks: Vec<TaskInfo>, today: NaiveDate) -> Self {
        let by_status = TaskStatus::ALL
            .iter()
            .map(|s| (*s, tasks.iter().filter(|t| t.status == *s).count()))
            .collect();
        let by_priority = Priority::ALL
            .iter()
            .map(|p| (*p, tasks.iter().filter(|t| t.priority == *p).count()))
            .collect();
        let today_s = format_date(today);
        let horizon = format_date(today + chrono::Days::new(7));
        let mut dashboard = TaskDashboard {
            by_status,
            by_priority,
            ..Default::default()
        };
        // dates are YYYY-MM-DD so string order is date order
        for task in tasks.into_iter().filter(|t| t.status != TaskStatus::Completed) {
            if task.status == TaskStatus::Overdue || task.due_date < today_s {
                dashboard.overdue.push(task);
            } else if task.due_date <= horizon {
                dashboard.due_soon.push(task);
            }
        }
        dashboard
    }
}

async fn task_dashboard(headers: HeaderMap) -> ResponseResult {
    let mut conn = get_conn()?;
    operator_with(&headers, &mut conn, TaskGroup::QUERY_ALL)?;
    let tasks: Vec<TaskInfo> = conn.query(format!("{TASK_INFO_SQL} ORDER BY t.due_date"))?;
    Ok(Response::ok(json!(TaskDashboard::build(tasks, TIME::now()?.date()))))
}

/// Completion percentage rounded to two decimals, 0 when there are no tasks.
pub fn completion_rate(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (completed as f64 / total as f64 * 10000.0).round() / 100.0
}

async fn task_performance(headers: HeaderMap) -> ResponseResult {
    let mut conn = get_conn()?;
    let operator = operator_with(&headers, &mut conn, TaskGroup::QUERY_OWN)?;
    let employee = operator.employee()?;
    let tasks: Vec<TaskInfo> = conn.exec(
        format!("{TASK_INFO_SQL} WHERE t.assigned_to = ? ORDER BY t.due_date"),
        (&employee.id,),
    )?;
    let total = tasks.len();
    let completed = tasks.iter().filter(|t| t.status == TaskStatus::Completed).count();
    Ok(Response::ok(json!({
        "agent": employee,
        "tasks": tasks,
        "performance": {
            "total_tasks": total,
            "completed_tasks": completed,
            "completion_rate": completion_rate(completed, total),
        }
    })))
}

/// Assignees see their own tasks, task managers see any.
async fn task_detail(headers: HeaderMap, Path(id): Path<String>) -> ResponseResult {
    let mut conn = get_conn()?;
    let operator = operator_with(&headers, &mut conn, TaskGroup::QUERY_OWN)?;
    let task: Option<TaskInfo> =
        conn.exec_first(format!("{TASK_INFO_SQL} WHERE t.id = ?"), (&id,))?;
    let task = op::some!(task; ret Err(Response::not_exist(format!("task {id}"))));
    let own = operator
        .employee
        .as_ref()
        .is_some_and(|e| task.assigned_to.as_deref() == Some(e.id.as_str()));
    if !own && !operator.can(TASK, TaskGroup::QUERY_ALL) {
        return Err(Response::not_exist(format!("task {id}")));
    }
    Ok(Response::ok(json!(task)))
}

#[derive(serde::Deserialize)]
struct StatusForm {
    status: String,
}

fn save_status(
    conn: &mut PooledConn,
    employee: &Employee,
    id: &str,
    status: &str,
    document: Option<String>,
    today: NaiveDate,
) -> Result<workflow::TaskTransition, Response> {
    Ok(commit_or_rollback!(workflow::update_task_status, conn, employee, id, status, document, today)?)
}

/// File to delete once the status save is over: the old document when the
/// upload replaced it, the upload itself when the save did not keep it.
fn stale_upload<'a>(upload: Option<&'a str>, previous: Option<&'a str>, kept: Option<&str>) -> Option<&'a str> {
    let upload = upload?;
    if kept == Some(upload) {
        previous.filter(|old| *old != upload)
    } else {
        Some(upload)
    }
}

async fn update_task_status(headers: HeaderMap, Path(id): Path<String>, part: Multipart) -> ResponseResult {
    let mut conn = get_conn()?;
    let operator = operator_with(&headers, &mut conn, TaskGroup::UPDATE_STATUS)?;
    let employee = operator.employee()?.clone();
    let part = parse_multipart(part).await?;
    let form: StatusForm = serde_json::from_str(part.json_or_empty())?;
    let previous_document = document_of(&id, &mut conn)?;
    let dir = Config::get().task_dir();
    let document = match part.files.iter().find(|f| !f.is_empty()) {
        Some(file) => Some(store_file(&dir, file)?),
        None => None,
    };
    let today = TIME::now()?.date();
    let result = save_status(&mut conn, &employee, &id, &form.status, document.clone(), today);
    let kept = result.as_ref().ok().and_then(|t| t.task.document.as_deref());
    if let Some(stale) = stale_upload(document.as_deref(), previous_document.as_deref(), kept) {
        remove_file(&dir, stale);
    }
    let transition = result?;
    tracing::info!(
        operator = %operator.id(),
        task = %id,
        status = %transition.task.status,
        counted = transition.counted,
        "task status saved"
    );
    Ok(Response::ok(json!({
        "task": transition.task,
        "previous": transition.previous,
        "counted": transition.counted,
    })))
}

async fn task_document(headers: HeaderMap, Path(file): Path<String>) -> Result<BodyFile, Response> {
    let mut conn = get_conn()?;
    operator_with(&headers, &mut conn, TaskGroup::QUERY_OWN)?;
    let bytes = read_file(&Config::get().task_dir(), &file)?;
    Ok(BodyFile::from_path(&file, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(id: &str, status: TaskStatus, priority: Priority, due_date: &str) -> TaskInfo {
        TaskInfo {
            id: id.into(),
            title: "Site visit".into(),
            assigned_to: Some("e1".into()),
            assignee: Some("Jane Doe".into()),
            description: String::new(),
            priority,
            due_date: due_date.into(),
            status,
            document: None,
        }
    }

    #[test]
    fn completion_rate_rounds_to_two_decimals() {
        assert_eq!(completion_rate(0, 0), 0.0);
        assert_eq!(completion_rate(1, 3), 33.33);
        assert_eq!(completion_rate(2, 3), 66.67);
        assert_eq!(completion_rate(4, 4), 100.0);
    }

    #[test]
    fn dashboard_sorts_open_tasks_by_urgency() {
        let today = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap();
        let dashboard = TaskDashboard::build(
            vec![
                info("late", TaskStatus::Pending, Priority::High, "2025-05-19"),
                info("flagged", TaskStatus::Overdue, Priority::Low, "2025-06-30"),
                info("soon", TaskStatus::Pending, Priority::Medium, "2025-05-27"),
                info("later", TaskStatus::Pending, Priority::Medium, "2025-05-28"),
                info("done", TaskStatus::Completed, Priority::High, "2025-05-01"),
            ],
            today,
        );
        let ids = |v: &[TaskInfo]| v.iter().map(|t| t.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&dashboard.overdue), ["late", "flagged"]);
        assert_eq!(ids(&dashboard.due_soon), ["soon"]);
        assert_eq!(
            dashboard.by_status,
            vec![
                (TaskStatus::Pending, 3),
                (TaskStatus::Completed, 1),
                (TaskStatus::Overdue, 1)
            ]
        );
        assert_eq!(dashboard.by_priority[2], (Priority::High, 2));
    }

    #[test]
    fn only_unused_documents_are_cleaned_up() {
        // failed or rejected save drops the upload
        assert_eq!(stale_upload(Some("new.pdf"), Some("old.pdf"), None), Some("new.pdf"));
        assert_eq!(stale_upload(Some("new.pdf"), None, Some("old.pdf")), Some("new.pdf"));
        // accepted upload replaces the old document
        assert_eq!(stale_upload(Some("new.pdf"), Some("old.pdf"), Some("new.pdf")), Some("old.pdf"));
        assert_eq!(stale_upload(Some("new.pdf"), None, Some("new.pdf")), None);
        // nothing uploaded, nothing to remove
        assert_eq!(stale_upload(None, Some("old.pdf"), None), None);
        assert_eq!(stale_upload(None, Some("old.pdf"), Some("old.pdf")), None);
    }

    #[test]
    fn clear_form_accepts_missing_status() {
        let form: ClearForm = serde_json::from_value(json!({})).unwrap();
        assert!(form.status.is_none());
        let form: ClearForm = serde_json::from_value(json!({"status": "Completed"})).unwrap();
        assert_eq!(form.status, Some(TaskStatus::Completed));
    }
}
