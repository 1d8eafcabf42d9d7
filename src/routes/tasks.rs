use crate::{
    auth::{AuthUser, MessageResponse},
    error::AppError,
    models::{Pagination, Task, TaskInput, TaskListResponse, TaskQuery, TaskUpdate},
};
use actix_web::{delete, get, post, route, web, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const TASK_COLUMNS: &str =
    "id, title, description, status, priority, due_date, user_id, created_at, updated_at";

/// List the authenticated user's tasks.
///
/// Supports `status`, `priority`, and a `search` substring matched against
/// title or description, plus `sortBy`/`order`/`page`/`limit`. The listing
/// and the total count run under the same WHERE clause so the pagination
/// block stays aligned with the returned rows.
#[get("")]
pub async fn list_tasks(
    pool: web::Data<PgPool>,
    query: web::Query<TaskQuery>,
    user: AuthUser,
) -> Result<impl Responder, AppError> {
    let query = query.into_inner();

    // Conditions are appended positionally; binds below must follow the
    // same order.
    let mut where_clause = String::from("WHERE user_id = $1");
    let mut param = 2;

    if query.status.is_some() {
        where_clause.push_str(&format!(" AND status = ${}", param));
        param += 1;
    }
    if query.priority.is_some() {
        where_clause.push_str(&format!(" AND priority = ${}", param));
        param += 1;
    }
    if query.search.is_some() {
        where_clause.push_str(&format!(
            " AND (title ILIKE ${} OR description ILIKE ${})",
            param,
            param + 1
        ));
        param += 2;
    }

    let select_sql = format!(
        "SELECT {} FROM tasks {} ORDER BY {} {} LIMIT ${} OFFSET ${}",
        TASK_COLUMNS,
        where_clause,
        query.sort_column(),
        query.order().as_sql(),
        param,
        param + 1
    );
    let count_sql = format!("SELECT COUNT(*) FROM tasks {}", where_clause);

    let mut select_query = sqlx::query_as::<_, Task>(&select_sql).bind(user.id);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql).bind(user.id);

    if let Some(status) = query.status {
        select_query = select_query.bind(status);
        count_query = count_query.bind(status);
    }
    if let Some(priority) = query.priority {
        select_query = select_query.bind(priority);
        count_query = count_query.bind(priority);
    }
    if let Some(search) = &query.search {
        let pattern = format!("%{}%", search);
        select_query = select_query.bind(pattern.clone()).bind(pattern.clone());
        count_query = count_query.bind(pattern.clone()).bind(pattern);
    }

    let tasks = select_query
        .bind(query.limit())
        .bind(query.offset())
        .fetch_all(pool.get_ref())
        .await?;
    let total = count_query.fetch_one(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(TaskListResponse {
        tasks,
        pagination: Pagination::new(total, query.page(), query.limit()),
    }))
}

/// Create a task owned by the authenticated user.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    payload: web::Json<TaskInput>,
    user: AuthUser,
) -> Result<impl Responder, AppError> {
    payload.validate()?;

    let task = Task::new(payload.into_inner(), user.id);

    let created = sqlx::query_as::<_, Task>(&format!(
        "INSERT INTO tasks (id, title, description, status, priority, due_date, user_id, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(task.id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.status)
    .bind(task.priority)
    .bind(task.due_date)
    .bind(task.user_id)
    .bind(task.created_at)
    .bind(task.updated_at)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(created))
}

/// Fetch a single task. A task owned by someone else answers 404, exactly
/// like one that does not exist.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user: AuthUser,
) -> Result<impl Responder, AppError> {
    let task = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
        TASK_COLUMNS
    ))
    .bind(task_id.into_inner())
    .bind(user.id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Ok(HttpResponse::Ok().json(task))
}

/// Partially update a task. Absent fields keep their stored values;
/// `description` and `dueDate` sent as null or an empty string are cleared.
#[route("/{id}", method = "PUT", method = "PATCH")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    payload: web::Json<TaskUpdate>,
    user: AuthUser,
) -> Result<impl Responder, AppError> {
    payload.validate()?;

    let update = payload.into_inner();
    let task_id = task_id.into_inner();

    let existing = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
        TASK_COLUMNS
    ))
    .bind(task_id)
    .bind(user.id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    let title = update
        .title
        .map(|t| t.trim().to_string())
        .unwrap_or(existing.title);
    let description = update.description.unwrap_or(existing.description);
    let status = update.status.unwrap_or(existing.status);
    let priority = update.priority.unwrap_or(existing.priority);
    let due_date = update.due_date.unwrap_or(existing.due_date);

    let updated = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks \
         SET title = $1, description = $2, status = $3, priority = $4, due_date = $5, updated_at = NOW() \
         WHERE id = $6 AND user_id = $7 \
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(&title)
    .bind(&description)
    .bind(status)
    .bind(priority)
    .bind(due_date)
    .bind(task_id)
    .bind(user.id)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(updated))
}

/// Delete a task. 404 for a task that does not exist for this user.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user: AuthUser,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
        .bind(task_id.into_inner())
        .bind(user.id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Task not found".into()));
    }

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Task deleted".to_string(),
    }))
}
