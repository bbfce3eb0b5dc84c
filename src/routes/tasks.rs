use crate::{
    auth::{CurrentUser, UnitOfWork},
    error::AppError,
    models::{CreateTask, TaskQuery, UpdateTask},
    tasks,
};
use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use uuid::Uuid;

/// Lists the caller's tasks.
///
/// ## Query Parameters:
/// - `status` (optional): only tasks with this status.
/// - `skip` (optional): number of tasks to skip, default 0.
/// - `limit` (optional): maximum number of tasks, default unlimited.
///
/// ## Responses:
/// - `200 OK`: a JSON array of `Task` objects in creation order.
/// - `401 Unauthorized`
/// - `422 Unprocessable Entity`: unparsable query parameters.
pub async fn list_tasks(
    user: CurrentUser,
    query: web::Query<TaskQuery>,
    mut uow: UnitOfWork,
) -> Result<impl Responder, AppError> {
    let tasks = tasks::list(uow.tasks(), user.0.id, &query).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a task owned by the caller.
///
/// ## Responses:
/// - `201 Created`: the new `Task`, with `status` defaulting to `pending`.
/// - `401 Unauthorized`
/// - `422 Unprocessable Entity`: blank or oversized title, unknown status.
pub async fn create_task(
    user: CurrentUser,
    task_data: web::Json<CreateTask>,
    mut uow: UnitOfWork,
) -> Result<impl Responder, AppError> {
    let task = tasks::create(uow.tasks(), user.0.id, task_data.into_inner(), Utc::now()).await?;
    uow.commit().await?;

    log::debug!("user {} created task {}", user.0.id, task.id);
    Ok(HttpResponse::Created().json(task))
}

/// Fetches one of the caller's tasks. Tasks of other users are reported as
/// missing (404).
pub async fn get_task(
    user: CurrentUser,
    task_id: web::Path<Uuid>,
    mut uow: UnitOfWork,
) -> Result<impl Responder, AppError> {
    let task = tasks::get(uow.tasks(), user.0.id, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Partially updates one of the caller's tasks. Serves both PUT and PATCH.
///
/// ## Responses:
/// - `200 OK`: the updated `Task`.
/// - `401 Unauthorized`
/// - `404 Not Found`: missing or not owned by the caller.
/// - `422 Unprocessable Entity`: invalid field values; the task is unchanged.
pub async fn update_task(
    user: CurrentUser,
    task_id: web::Path<Uuid>,
    task_data: web::Json<UpdateTask>,
    mut uow: UnitOfWork,
) -> Result<impl Responder, AppError> {
    let task = tasks::update(
        uow.tasks(),
        user.0.id,
        task_id.into_inner(),
        task_data.into_inner(),
        Utc::now(),
    )
    .await?;
    uow.commit().await?;

    Ok(HttpResponse::Ok().json(task))
}

pub async fn delete_task(
    user: CurrentUser,
    task_id: web::Path<Uuid>,
    mut uow: UnitOfWork,
) -> Result<impl Responder, AppError> {
    tasks::delete(uow.tasks(), user.0.id, task_id.into_inner()).await?;
    uow.commit().await?;

    Ok(HttpResponse::NoContent().finish())
}
