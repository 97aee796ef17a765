//! Errors raised by the bookkeeping workflow.

use thiserror::Error;

use crate::Response;

#[derive(Error, Debug)]
pub enum WorkflowError {
    /// Bad status value, missing field, malformed number or date.
    #[error("{0}")]
    Validation(String),

    #[error("{0} does not exist")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("database error: {0}")]
    Database(#[from] mysql::Error),
}

impl WorkflowError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

impl From<WorkflowError> for Response {
    fn from(value: WorkflowError) -> Self {
        match value {
            WorkflowError::Validation(msg) => Response::invalid_value(msg),
            e @ WorkflowError::NotFound(_) => Response::not_exist(e),
            WorkflowError::Forbidden(msg) => {
                tracing::warn!(reason = %msg, "workflow refused operator");
                Response::permission_denied()
            }
            WorkflowError::Database(e) => Response::from(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn maps_onto_response_kinds() {
        let resp: Response = WorkflowError::not_found("task abc").into();
        assert_eq!(resp.code(), StatusCode::NOT_FOUND);
        assert_eq!(resp.data(), "task abc does not exist");

        let resp: Response = WorkflowError::Forbidden("not the assignee".into()).into();
        assert_eq!(resp.code(), StatusCode::FORBIDDEN);

        let resp: Response = WorkflowError::validation("bad status").into();
        assert_eq!(resp.status(), 7);
    }
}
