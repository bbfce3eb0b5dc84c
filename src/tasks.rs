//! Ownership-scoped task operations.
//!
//! Every function takes the caller's id and refuses to reveal or touch a task
//! owned by anyone else. A foreign task and a missing task are reported the
//! same way, so callers cannot discover other users' ids.

use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::{CreateTask, Task, TaskQuery, UpdateTask};
use crate::store::TaskRepository;

fn not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

/// Loads a task only if `owner` owns it.
async fn find_owned(
    tasks: &mut dyn TaskRepository,
    owner: Uuid,
    task_id: Uuid,
) -> Result<Task, AppError> {
    match tasks.find_by_id(task_id).await? {
        Some(task) if task.user_id == owner => Ok(task),
        _ => Err(not_found()),
    }
}

pub async fn create(
    tasks: &mut dyn TaskRepository,
    owner: Uuid,
    input: CreateTask,
    now: DateTime<Utc>,
) -> Result<Task, AppError> {
    input.validate()?;
    let task = Task::new(input, owner, now);
    Ok(tasks.create(&task).await?)
}

pub async fn list(
    tasks: &mut dyn TaskRepository,
    owner: Uuid,
    query: &TaskQuery,
) -> Result<Vec<Task>, AppError> {
    Ok(tasks.find_by_owner(owner, query).await?)
}

pub async fn get(
    tasks: &mut dyn TaskRepository,
    owner: Uuid,
    task_id: Uuid,
) -> Result<Task, AppError> {
    find_owned(tasks, owner, task_id).await
}

/// Merges the supplied fields into the task and refreshes `updated_at`.
///
/// Ownership is checked before validation, so a foreign id yields 404 even
/// with an invalid body.
pub async fn update(
    tasks: &mut dyn TaskRepository,
    owner: Uuid,
    task_id: Uuid,
    changes: UpdateTask,
    now: DateTime<Utc>,
) -> Result<Task, AppError> {
    let mut task = find_owned(tasks, owner, task_id).await?;
    changes.validate()?;
    task.apply(changes, now);

    tasks.update(&task).await?.ok_or_else(not_found)
}

pub async fn delete(
    tasks: &mut dyn TaskRepository,
    owner: Uuid,
    task_id: Uuid,
) -> Result<(), AppError> {
    let task = find_owned(tasks, owner, task_id).await?;
    if tasks.delete(task.id).await? {
        Ok(())
    } else {
        Err(not_found())
    }
}
