use crate::entities::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

pub mod api;
pub mod repository;
pub mod service;

pub use repository::{SeaOrmTodoRepository, TodoRepository};
pub use service::{TodoService, TodoServiceImpl};

/// Lifecycle stage of a todo.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Created,
    Processing,
    Done,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Created, Status::Processing, Status::Done];

    /// Returns the literal stored in the database and used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Created => "created",
            Status::Processing => "processing",
            Status::Done => "done",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Status::Done)
    }
}

/// Urgency classification of a todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Returns the literal stored in the database and used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

/// Error returned when a status or priority literal is not one of the allowed values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {kind} '{value}', expected one of: {expected}")]
pub struct ParseLiteralError {
    kind: &'static str,
    value: String,
    expected: String,
}

impl ParseLiteralError {
    fn new(kind: &'static str, value: &str, allowed: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected: allowed.into_iter().collect::<Vec<_>>().join(", "),
        }
    }
}

impl FromStr for Status {
    type Err = ParseLiteralError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                ParseLiteralError::new("status", s, Status::ALL.map(|status| status.as_str()))
            })
    }
}

impl FromStr for Priority {
    type Err = ParseLiteralError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == s)
            .ok_or_else(|| {
                ParseLiteralError::new("priority", s, Priority::ALL.map(|priority| priority.as_str()))
            })
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Todo {
    id: i32,
    task: String,
    status: Status,
    priority: Priority,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Todo {
    pub fn new(
        id: i32,
        task: String,
        status: Status,
        priority: Priority,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            task,
            status,
            priority,
            created_at,
            updated_at,
        }
    }

    /// Returns the ID assigned by the database.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Returns the task description.
    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns a copy of this todo carrying the given task, status and priority.
    /// Identity and timestamps are kept.
    pub fn with_fields(&self, task: String, status: Status, priority: Priority) -> Self {
        Self {
            task,
            status,
            priority,
            ..self.clone()
        }
    }
}

impl TryFrom<todo::Model> for Todo {
    type Error = TodoError;

    fn try_from(model: todo::Model) -> Result<Self, Self::Error> {
        let status = model
            .status
            .parse::<Status>()
            .map_err(|e| sea_orm::DbErr::Custom(format!("Todo {}: {}", model.id, e)))?;
        let priority = model
            .priority
            .parse::<Priority>()
            .map_err(|e| sea_orm::DbErr::Custom(format!("Todo {}: {}", model.id, e)))?;
        Ok(Todo::new(
            model.id,
            model.task,
            status,
            priority,
            model.created_at.with_timezone(&Utc),
            model.updated_at.with_timezone(&Utc),
        ))
    }
}

/// A todo that has not been stored yet.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct NewTodo {
    pub task: String,
    pub status: Status,
    pub priority: Priority,
}

impl NewTodo {
    /// Creates a todo in the `created` status.
    pub fn new(task: String, priority: Priority) -> Self {
        Self {
            task,
            status: Status::Created,
            priority,
        }
    }
}

/// Fields to change on an existing todo. `None` keeps the stored value.
#[derive(Debug, Default, PartialEq, Clone, Eq)]
pub struct TodoChanges {
    pub task: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
}

/// Optional filters for listing todos. Filters that are `None` are not applied.
#[derive(Debug, Default, PartialEq, Clone, Eq)]
pub struct TodoFilter {
    /// Substring the task must contain.
    pub task: Option<String>,
    /// Exact status the todo must have.
    pub status: Option<Status>,
}

/// Todos split by completion, each keeping the order they were listed in.
#[derive(Debug, Default, PartialEq, Clone, Eq)]
pub struct PartitionedTodos {
    pub incomplete: Vec<Todo>,
    pub completed: Vec<Todo>,
}

/// Error type for todo repository and service operations.
#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    /// The referenced todo does not exist.
    #[error("Todo with ID {0} not found")]
    NotFound(i32),
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

pub type TodoResult<T> = Result<T, TodoError>;
