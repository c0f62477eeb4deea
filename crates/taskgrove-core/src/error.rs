use serde::Serialize;
use thiserror::Error;

use crate::task::TaskStatus;

/// A sibling that blocks a task from being started.
#[derive(Debug, Clone, Serialize)]
pub struct BlockingTask {
    /// 1-based position within the parent's child sequence (or the root forest).
    pub position: usize,
    pub name: String,
    pub status: TaskStatus,
    pub description: String,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    StateConflict(String),
    #[error("{message}")]
    OrderViolation {
        message: String,
        blockers: Vec<BlockingTask>,
    },
}

impl EngineError {
    /// Stable wire code for the request/response layer.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "VALIDATION_ERROR",
            EngineError::NotFound(_) => "NOT_FOUND",
            EngineError::StateConflict(_) => "STATE_CONFLICT",
            EngineError::OrderViolation { .. } => "ORDER_VIOLATION",
        }
    }

    pub fn task_not_found(id: &str) -> Self {
        EngineError::NotFound(format!("Task not found: {}", id))
    }
}
