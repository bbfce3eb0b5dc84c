use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
///
/// Any status may follow any other; no transition order is enforced.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Task is yet to be started.
    #[default]
    Pending,
    /// Task is currently being worked on.
    InProgress,
    /// Task is completed.
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }
}

// PostgreSQL text columns cannot hold NUL.
fn validate_no_nul(value: &str) -> Result<(), ValidationError> {
    if value.contains('\0') {
        let mut err = ValidationError::new("nul");
        err.message = Some("must not contain NUL characters".into());
        return Err(err);
    }
    Ok(())
}

fn validate_title(value: &str) -> Result<(), ValidationError> {
    validate_no_nul(value)?;
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Payload for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTask {
    /// The title of the task.
    /// Must be between 1 and 100 characters and not only whitespace.
    #[validate(length(min = 1, max = 100), custom = "validate_title")]
    pub title: String,

    /// An optional description for the task.
    #[validate(length(max = 10000), custom = "validate_no_nul")]
    pub description: Option<String>,

    /// Initial status; `pending` when omitted.
    pub status: Option<TaskStatus>,
}

/// Partial update for a task. Only the fields present are applied.
///
/// There is deliberately no field for the owner, the id or the creation
/// timestamp; such keys in a request body are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTask {
    #[validate(length(min = 1, max = 100), custom = "validate_title")]
    pub title: Option<String>,

    /// `None` leaves the description alone; `Some(None)` (an explicit
    /// `null`) clears it.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    #[validate(length(max = 10000), custom = "validate_no_nul")]
    pub description: Option<Option<String>>,

    pub status: Option<TaskStatus>,
}

/// Marks a field as supplied even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    /// Set once, on creation.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation.
    pub updated_at: DateTime<Utc>,
    /// Identifier of the user who owns the task. Fixed at creation.
    pub user_id: Uuid,
}

/// Query parameters accepted when listing tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    /// Only return tasks with this status.
    pub status: Option<TaskStatus>,
    /// Number of matching tasks to skip.
    pub skip: Option<u32>,
    /// Maximum number of tasks to return. All remaining tasks when omitted.
    pub limit: Option<u32>,
}

impl Task {
    /// Creates a new `Task` owned by `owner`, with `created_at` and
    /// `updated_at` both set to `now`.
    pub fn new(input: CreateTask, owner: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            status: input.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
            user_id: owner,
        }
    }

    pub fn apply(&mut self, changes: UpdateTask, now: DateTime<Utc>) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        self.updated_at = now;
    }
}
