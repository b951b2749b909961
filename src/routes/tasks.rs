use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{CreateTaskInput, TaskQuery, UpdateStatusInput},
    state::AppState,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

/// Retrieves the authenticated user's tasks.
///
/// ## Query Parameters:
/// - `status` (optional): `OPEN`, `IN_PROGRESS` or `DONE`.
/// - `search` (optional): case-sensitive substring of the title or the description.
///
/// ## Responses:
/// - `200 OK`: JSON array of `Task`, newest first. Empty when nothing matches.
/// - `401 Unauthorized`: no valid token.
/// - `422 Unprocessable Entity`: unknown `status` value.
#[get("")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    query: web::Query<TaskQuery>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let filter = query.into_inner().into_filter()?;
    let tasks = state.tasks.list(&filter, user.id).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new `OPEN` task owned by the authenticated user.
///
/// ## Responses:
/// - `201 Created`: the new `Task`.
/// - `422 Unprocessable Entity`: empty or overlong title/description.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    input: web::Json<CreateTaskInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    input.validate()?;
    let task = state.tasks.create(input.into_inner(), user.id).await?;
    Ok(HttpResponse::Created().json(task))
}

/// Retrieves one task.
///
/// ## Responses:
/// - `200 OK`: the `Task`.
/// - `404 Not Found`: no such task, or it belongs to someone else.
#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = state.tasks.get_by_id(task_id.into_inner(), user.id).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Sets a task's status. Any status may follow any other.
///
/// ## Request Body:
/// `{ "status": "OPEN" | "IN_PROGRESS" | "DONE" }`
///
/// ## Responses:
/// - `200 OK`: the updated `Task`.
/// - `404 Not Found`: no such task, or it belongs to someone else.
/// - `422 Unprocessable Entity`: unknown status value.
#[patch("/{id}/status")]
pub async fn update_task_status(
    state: web::Data<AppState>,
    task_id: web::Path<Uuid>,
    input: web::Json<UpdateStatusInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let status = input.parse()?;
    let task = state
        .tasks
        .update_status(task_id.into_inner(), status, user.id)
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task.
///
/// ## Responses:
/// - `204 No Content`: deleted.
/// - `404 Not Found`: no such task, or it belongs to someone else.
#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    state.tasks.delete(task_id.into_inner(), user.id).await?;
    Ok(HttpResponse::NoContent().finish())
}
