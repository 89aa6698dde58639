use crate::{
    auth::AuthenticatedUserId,
    error::AppError,
    models::{Task, TaskInput, TaskQuery, TaskUpdate},
};
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const TASK_COLUMNS: &str = "id, title, description, completed, priority, owner_id, created_at, updated_at";

/// Retrieves the authenticated user's tasks.
///
/// Supports filtering by completion status and priority, and sorting by
/// creation time (default, newest first), priority (High first), or status
/// (pending first). Rows with equal sort keys keep a stable order.
///
/// ## Query Parameters:
/// - `status` (optional): `true` for completed tasks, `false` for pending.
/// - `priority` (optional): `Low`, `Medium`, `High`, or `all` for no filter.
/// - `sort_by` (optional): `created_at`, `priority`, or `status`.
///
/// Empty values are treated as absent.
#[get("")]
pub async fn list_tasks(
    pool: web::Data<PgPool>,
    query_params: web::Query<TaskQuery>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    // Base query scoped to the owner; filter conditions are appended with
    // incrementing placeholders, mirroring the bind order below.
    let mut sql = format!("SELECT {} FROM tasks WHERE owner_id = $1", TASK_COLUMNS);
    let mut param_count = 2;

    if query_params.status.is_some() {
        sql.push_str(&format!(" AND completed = ${}", param_count));
        param_count += 1;
    }
    if query_params.priority.is_some() {
        sql.push_str(&format!(" AND priority = ${}", param_count));
    }

    let sort = query_params.sort_by.unwrap_or_default();
    sql.push_str(" ORDER BY ");
    sql.push_str(sort.order_clause());

    let mut query_builder = sqlx::query_as::<_, Task>(&sql).bind(user.0);

    if let Some(status) = query_params.status {
        query_builder = query_builder.bind(status);
    }
    if let Some(priority) = query_params.priority {
        query_builder = query_builder.bind(priority);
    }

    let tasks = query_builder.fetch_all(&**pool).await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task owned by the authenticated user.
///
/// The completion flag starts false and both timestamps are server-assigned.
/// An empty title is rejected before anything touches the database.
///
/// ## Responses:
/// - `201 Created`: the new `Task` as JSON.
/// - `400 Bad Request`: empty or overlong title/description.
/// - `401 Unauthorized`: missing or invalid token.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    task_data: web::Json<TaskInput>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    // Validate input
    task_data.validate()?;

    let sql = format!(
        "INSERT INTO tasks (id, title, description, priority, owner_id)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {}",
        TASK_COLUMNS
    );
    let task = sqlx::query_as::<_, Task>(&sql)
        .bind(Uuid::new_v4())
        .bind(&task_data.title)
        .bind(&task_data.description)
        .bind(task_data.priority)
        .bind(user.0)
        .fetch_one(&**pool)
        .await?;

    Ok(HttpResponse::Created().json(task))
}

/// Retrieves a specific task by its ID.
///
/// The ownership check is folded into the lookup: a task owned by another
/// user produces the same 404 as a task that does not exist.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let sql = format!("SELECT {} FROM tasks WHERE id = $1 AND owner_id = $2", TASK_COLUMNS);
    let task = sqlx::query_as::<_, Task>(&sql)
        .bind(task_id.into_inner())
        .bind(user.0)
        .fetch_optional(&**pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Ok(HttpResponse::Ok().json(task))
}

/// Updates a task the authenticated user owns.
///
/// Partial update: only the supplied fields change, everything else keeps its
/// stored value. The update timestamp refreshes on every successful call.
/// Same ownership/404 semantics as `get_task`.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskUpdate>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let sql = format!(
        "UPDATE tasks
         SET title = COALESCE($1, title),
             description = COALESCE($2, description),
             completed = COALESCE($3, completed),
             priority = COALESCE($4, priority),
             updated_at = NOW()
         WHERE id = $5 AND owner_id = $6
         RETURNING {}",
        TASK_COLUMNS
    );
    let task = sqlx::query_as::<_, Task>(&sql)
        .bind(&task_data.title)
        .bind(&task_data.description)
        .bind(task_data.completed)
        .bind(task_data.priority)
        .bind(task_id.into_inner())
        .bind(user.0)
        .fetch_optional(&**pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Ok(HttpResponse::Ok().json(task))
}

/// Flips a task between pending and completed.
///
/// Toggling twice restores the original value. Same ownership/404 semantics
/// as `get_task`.
#[patch("/{id}/toggle")]
pub async fn toggle_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let sql = format!(
        "UPDATE tasks SET completed = NOT completed, updated_at = NOW()
         WHERE id = $1 AND owner_id = $2
         RETURNING {}",
        TASK_COLUMNS
    );
    let task = sqlx::query_as::<_, Task>(&sql)
        .bind(task_id.into_inner())
        .bind(user.0)
        .fetch_optional(&**pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Ok(HttpResponse::Ok().json(task))
}

/// Permanently deletes a task the authenticated user owns.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND owner_id = $2")
        .bind(task_id.into_inner())
        .bind(user.0)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Task not found".into()));
    }

    Ok(HttpResponse::NoContent().finish())
}
