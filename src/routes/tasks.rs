use crate::{
    auth::Caller,
    error::AppError,
    models::{TaskCreate, TaskFilter, TaskQuery, TaskUpdate},
    tasks::TaskService,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;

/// Lists tasks.
///
/// ## Query Parameters:
/// - `status` (optional): `todo`, `in_progress` or `done`.
/// - `userId` (optional): owner to list for. Ignored when the request carries a
///   verified bearer token; the token's user is used instead.
///
/// ## Responses:
/// - `200 OK`: JSON array of tasks, in creation order.
/// - `400 Bad Request`: unparseable query string.
/// - `401 Unauthorized`: invalid token, or no token while authentication is required.
#[get("")]
pub async fn get_tasks(
    tasks: web::Data<TaskService>,
    query_params: web::Query<TaskQuery>,
    caller: Caller,
) -> Result<impl Responder, AppError> {
    let query = query_params.into_inner();
    let filter = TaskFilter {
        status: query.status,
        user_id: caller.or_claimed(query.user_id),
    };

    let tasks = tasks.list(filter).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a task.
///
/// The owner is the verified caller, or the `userId` field of the body when there is
/// no token. The new task always starts as `todo`.
///
/// ## Responses:
/// - `201 Created`: the new task.
/// - `400 Bad Request`: malformed body, or no owner could be determined.
/// - `422 Unprocessable Entity`: title or description out of bounds.
#[post("")]
pub async fn create_task(
    tasks: web::Data<TaskService>,
    task_data: web::Json<TaskCreate>,
    caller: Caller,
) -> Result<impl Responder, AppError> {
    let input = task_data.into_inner();
    let owner = caller
        .or_claimed(input.user_id)
        .ok_or_else(|| AppError::BadRequest("userId is required".into()))?;

    let task = tasks.create(owner, input).await?;
    Ok(HttpResponse::Created().json(task))
}

/// Retrieves a task by id.
///
/// ## Responses:
/// - `200 OK`: the task.
/// - `404 Not Found`: no such task, or it belongs to another user than the verified caller.
#[get("/{id}")]
pub async fn get_task(
    tasks: web::Data<TaskService>,
    task_id: web::Path<Uuid>,
    caller: Caller,
) -> Result<impl Responder, AppError> {
    let task = tasks.get(task_id.into_inner(), caller.0).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Applies a partial update to a task.
///
/// Only the fields present in the body change; `updated_at` is always refreshed.
///
/// ## Responses:
/// - `200 OK`: the updated task.
/// - `404 Not Found`: no such task, or it belongs to another user than the verified caller.
/// - `422 Unprocessable Entity`: a provided field is out of bounds.
#[put("/{id}")]
pub async fn update_task(
    tasks: web::Data<TaskService>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskUpdate>,
    caller: Caller,
) -> Result<impl Responder, AppError> {
    let task = tasks
        .update(task_id.into_inner(), task_data.into_inner(), caller.0)
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task.
///
/// ## Responses:
/// - `204 No Content`: on successful deletion.
/// - `404 Not Found`: no such task, or it belongs to another user than the verified caller.
#[delete("/{id}")]
pub async fn delete_task(
    tasks: web::Data<TaskService>,
    task_id: web::Path<Uuid>,
    caller: Caller,
) -> Result<impl Responder, AppError> {
    if !tasks.delete(task_id.into_inner(), caller.0).await? {
        return Err(AppError::NotFound("Task not found".into()));
    }

    Ok(HttpResponse::NoContent().finish())
}
