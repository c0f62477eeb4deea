use std::fmt;
use std::str::FromStr;

use chrono::Local;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn glyph(self) -> &'static str {
        match self {
            TaskStatus::Todo => "⬜",
            TaskStatus::InProgress => "🔄",
            TaskStatus::Done => "✅",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        };
        f.write_str(label)
    }
}

impl FromStr for TaskStatus {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(EngineError::Validation(format!(
                "Unknown task status: {}",
                other
            ))),
        }
    }
}

/// A single unit of work. Children are exclusively owned; position in the
/// `children` vector is the execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    /// Set if and only if `status == Done`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub completion_criteria: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub children: Vec<Task>,
}

impl Task {
    pub fn new(name: &str, description: &str) -> Self {
        let now = now_timestamp();
        Task {
            id: Ulid::new().to_string(),
            name: name.trim().to_string(),
            description: description.to_string(),
            status: TaskStatus::Todo,
            resolution: None,
            completion_criteria: Vec::new(),
            constraints: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn all_children_done(&self) -> bool {
        self.children
            .iter()
            .all(|child| child.status == TaskStatus::Done)
    }

    pub fn has_in_progress_child(&self) -> bool {
        self.children
            .iter()
            .any(|child| child.status == TaskStatus::InProgress)
    }

    pub fn touch(&mut self) {
        self.updated_at = now_timestamp();
    }
}

/// The whole-snapshot root: an ordered forest of top-level tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskTree {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

pub fn now_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M").to_string()
}
