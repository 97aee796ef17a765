use mysql_common::prelude::FromRow;

use crate::{choices, libs::dser::deser_empty_to_none};

choices! {
    pub enum Priority {
        Low => "Low",
        Medium => "Medium",
        High => "High",
    }
}

choices! {
    pub enum TaskStatus {
        Pending => "Pending",
        Completed => "Completed",
        Overdue => "Overdue",
    }
}

/// Reusable task template.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, FromRow, PartialEq)]
pub struct PredefinedTask {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,
}

pub static TASK_FIELDS: &str =
    "id, predefined_task_id, assigned_to, description, priority, due_date, status, document";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, FromRow, PartialEq)]
pub struct Task {
    pub id: String,
    pub predefined_task_id: String,
    /// employee id
    pub assigned_to: Option<String>,
    pub description: String,
    pub priority: Priority,
    pub due_date: String,
    pub status: TaskStatus,
    /// link of the completion document
    pub document: Option<String>,
}

impl Task {
    pub fn has_document(&self) -> bool {
        self.document.as_deref().is_some_and(|d| !d.is_empty())
    }
}

/// Task as submitted by a manager, before template defaults are applied.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct TaskDraft {
    pub predefined_task_id: String,
    #[serde(default, alias = "employee_id", deserialize_with = "deser_empty_to_none")]
    pub assigned_to: Option<String>,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    pub priority: Option<String>,
    pub due_date: String,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    pub status: Option<String>,
}

/// Task joined with its template title and assignee name.
#[derive(Debug, Clone, serde::Serialize, FromRow)]
pub struct TaskInfo {
    pub id: String,
    pub title: String,
    pub assigned_to: Option<String>,
    pub assignee: Option<String>,
    pub description: String,
    pub priority: Priority,
    pub due_date: String,
    pub status: TaskStatus,
    pub document: Option<String>,
}

pub static TASK_INFO_SQL: &str = "SELECT t.id, p.title, t.assigned_to,
    TRIM(CONCAT(u.first_name, ' ', u.last_name)) AS assignee,
    t.description, t.priority, t.due_date, t.status, t.document
    FROM task t JOIN predefined_task p ON p.id = t.predefined_task_id
    LEFT JOIN employee e ON e.id = t.assigned_to
    LEFT JOIN user u ON u.id = e.user_id";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_accepts_form_aliases_and_blank_fields() {
        let draft: TaskDraft = serde_json::from_str(
            r#"{"predefined_task_id": "t1", "employee_id": "e1", "description": "", "due_date": "2030-01-01"}"#,
        )
        .unwrap();
        assert_eq!(draft.assigned_to.as_deref(), Some("e1"));
        assert!(draft.description.is_none());
        assert!(draft.priority.is_none());
    }

    #[test]
    fn empty_document_link_does_not_count() {
        let mut task = Task {
            id: "t".into(),
            predefined_task_id: "p".into(),
            assigned_to: None,
            description: String::new(),
            priority: Priority::Low,
            due_date: "2030-01-01".into(),
            status: TaskStatus::Pending,
            document: Some(String::new()),
        };
        assert!(!task.has_document());
        task.document = Some("abc.pdf".into());
        assert!(task.has_document());
    }
}
