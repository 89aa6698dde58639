use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum, declared in ascending order so
/// that `ORDER BY priority DESC` yields High before Medium before Low.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_priority")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskPriority::Low => write!(f, "Low"),
            TaskPriority::Medium => write!(f, "Medium"),
            TaskPriority::High => write!(f, "High"),
        }
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(TaskPriority::Low),
            "Medium" => Ok(TaskPriority::Medium),
            "High" => Ok(TaskPriority::High),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

/// Sort key for task listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskSort {
    /// Newest first. The default.
    #[default]
    CreatedAt,
    /// High before Medium before Low.
    Priority,
    /// Pending before completed.
    Status,
}

impl TaskSort {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskSort::CreatedAt => "created_at",
            TaskSort::Priority => "priority",
            TaskSort::Status => "status",
        }
    }

    /// The ORDER BY body for this sort key.
    ///
    /// Each clause ends with `created_at DESC, id` so rows with equal keys
    /// keep a stable total order across calls.
    pub fn order_clause(self) -> &'static str {
        match self {
            TaskSort::CreatedAt => "created_at DESC, id",
            TaskSort::Priority => "priority DESC, created_at DESC, id",
            TaskSort::Status => "completed ASC, created_at DESC, id",
        }
    }
}

impl FromStr for TaskSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(TaskSort::CreatedAt),
            "priority" => Ok(TaskSort::Priority),
            "status" => Ok(TaskSort::Status),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

/// Input structure for creating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// The title of the task. Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// An optional description, up to 1000 characters.
    #[validate(length(max = 1000))]
    pub description: Option<String>,

    /// The priority of the task. Defaults to Medium when omitted.
    #[serde(default)]
    pub priority: TaskPriority,
}

/// Partial update for an existing task. Only supplied fields change.
#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub completed: Option<bool>,

    pub priority: Option<TaskPriority>,
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    /// The title of the task.
    pub title: String,
    /// An optional description for the task.
    pub description: Option<String>,
    /// Whether the task has been completed. Freely toggled between the two
    /// states; there are no other transitions.
    pub completed: bool,
    /// The priority of the task.
    pub priority: TaskPriority,
    /// Identifier of the user who owns the task.
    pub owner_id: i32,
    /// Timestamp of when the task was created. Set once, server-assigned.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last mutation.
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for listing tasks.
///
/// All three are optional and an empty value (`?status=&priority=`) counts as
/// absent, since browser clients submit filter forms with blank fields. The
/// literal `all` is accepted for `priority` as "no filter".
#[derive(Debug, Deserialize, Default)]
pub struct TaskQuery {
    /// Filter on the completed flag: `true` or `false`.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<bool>,
    /// Filter on priority: `Low`, `Medium`, `High`, or `all`.
    #[serde(default, deserialize_with = "priority_filter")]
    pub priority: Option<TaskPriority>,
    /// Sort key: `created_at` (default), `priority`, or `status`.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub sort_by: Option<TaskSort>,
}

fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}

fn priority_filter<'de, D>(deserializer: D) -> Result<Option<TaskPriority>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref() {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("all") => Ok(None),
        Some(s) => s
            .parse::<TaskPriority>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
