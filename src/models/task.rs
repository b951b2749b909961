use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
///
/// Any status may be set from any other; there is no transition table.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Newly created, nobody has started on it.
    Open,
    /// Currently being worked on.
    InProgress,
    /// Finished.
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "OPEN",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the wire form of a status. Matching is exact; `open` or `Done` are rejected.
impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "OPEN" => Ok(TaskStatus::Open),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "DONE" => Ok(TaskStatus::Done),
            other => Err(AppError::ValidationError(format!(
                "\"{}\" is an invalid status",
                other
            ))),
        }
    }
}

/// Input structure for creating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateTaskInput {
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// Must be between 1 and 1000 characters.
    #[validate(length(min = 1, max = 1000))]
    pub description: String,
}

/// Body of a status update. The status stays a raw string until `parse`
/// so an unknown value is reported as a validation failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateStatusInput {
    pub status: String,
}

impl UpdateStatusInput {
    pub fn parse(&self) -> Result<TaskStatus, AppError> {
        self.status.parse()
    }
}

/// Represents a task entity as stored and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    /// Identifier of the user who created, and exclusively owns, the task.
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new `OPEN` task owned by `owner_id`.
    pub fn new(input: CreateTaskInput, owner_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            status: TaskStatus::Open,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Raw query parameters for listing tasks.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

impl TaskQuery {
    /// Validates the raw parameters into a `TaskFilter`.
    /// An empty `search` is treated as absent.
    pub fn into_filter(self) -> Result<TaskFilter, AppError> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<TaskStatus>)
            .transpose()?;
        let search = self.search.filter(|s| !s.is_empty());
        Ok(TaskFilter { status, search })
    }
}

/// Optional restrictions applied on top of the owner scope when listing tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    /// Case-sensitive substring matched against title OR description.
    pub search: Option<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        match &self.search {
            Some(term) => {
                task.title.contains(term.as_str()) || task.description.contains(term.as_str())
            }
            None => true,
        }
    }
}
