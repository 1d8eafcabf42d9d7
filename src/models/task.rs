use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Task status. Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[sqlx(rename = "TODO")]
    Todo,
    #[sqlx(rename = "IN_PROGRESS")]
    InProgress,
    #[sqlx(rename = "DONE")]
    Done,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

/// Task priority. Corresponds to the `task_priority` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_priority")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    #[sqlx(rename = "LOW")]
    Low,
    #[sqlx(rename = "MEDIUM")]
    Medium,
    #[sqlx(rename = "HIGH")]
    High,
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

/// A task as stored and as returned by the API.
#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn validate_title_not_blank(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        let mut error = ValidationError::new("non_blank");
        error.message = Some("title must not be empty".into());
        return Err(error);
    }
    Ok(())
}

/// Payload for creating a task. `status` and `priority` fall back to their
/// defaults when omitted; an empty-string `description` or `dueDate` is
/// treated as absent.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    #[validate(custom = "validate_title_not_blank")]
    pub title: String,

    #[serde(default, deserialize_with = "de_optional_text")]
    pub description: Option<String>,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub priority: TaskPriority,

    #[serde(default, deserialize_with = "de_optional_datetime")]
    pub due_date: Option<DateTime<Utc>>,
}

/// Payload for a partial task update.
///
/// The nullable columns use a double `Option` so the handler can tell the
/// three cases apart: field absent (outer `None`, leave unchanged), field
/// present but null/empty-string (`Some(None)`, clear the column), field
/// present with a value (`Some(Some(v))`).
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[validate(custom = "validate_title_not_blank")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "de_clearable_text")]
    pub description: Option<Option<String>>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    #[serde(default, deserialize_with = "de_clearable_datetime")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

fn de_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn de_clearable_text<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(Some(value.filter(|s| !s.trim().is_empty())))
}

/// Accepts a timestamp, `null`, or an empty string (normalized to `None`).
#[derive(Deserialize)]
#[serde(untagged)]
enum DateTimeOrText {
    Timestamp(DateTime<Utc>),
    Text(String),
}

fn normalize_datetime<E>(value: Option<DateTimeOrText>) -> Result<Option<DateTime<Utc>>, E>
where
    E: serde::de::Error,
{
    match value {
        None => Ok(None),
        Some(DateTimeOrText::Timestamp(ts)) => Ok(Some(ts)),
        Some(DateTimeOrText::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(DateTimeOrText::Text(s)) => Err(E::custom(format!("invalid dueDate: {:?}", s))),
    }
}

fn de_optional_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    normalize_datetime(Option::<DateTimeOrText>::deserialize(deserializer)?)
}

fn de_clearable_datetime<'de, D>(
    deserializer: D,
) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    normalize_datetime(Option::<DateTimeOrText>::deserialize(deserializer)?).map(Some)
}

/// Sort direction for task listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Query parameters for `GET /api/tasks`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    /// Substring match against title or description.
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<SortOrder>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl TaskQuery {
    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p >= 1).unwrap_or(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.filter(|l| *l >= 1).unwrap_or(10)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }

    pub fn order(&self) -> SortOrder {
        self.order.unwrap_or(SortOrder::Desc)
    }

    /// Maps the wire-level `sortBy` name onto a task column. The result is
    /// interpolated into the ORDER BY clause, so it must come from this
    /// fixed set; unknown names fall back to the default.
    pub fn sort_column(&self) -> &'static str {
        match self.sort_by.as_deref() {
            Some("id") => "id",
            Some("title") => "title",
            Some("description") => "description",
            Some("status") => "status",
            Some("priority") => "priority",
            Some("dueDate") => "due_date",
            Some("updatedAt") => "updated_at",
            _ => "created_at",
        }
    }
}

/// Pagination block returned alongside a task listing.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        Self {
            total,
            page,
            limit,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

/// Response envelope for `GET /api/tasks`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
    pub pagination: Pagination,
}

impl Task {
    /// Builds a new task from a validated input payload and its owner.
    pub fn new(input: TaskInput, user_id: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            description: input.description,
            status: input.status,
            priority: input.priority,
            due_date: input.due_date,
            user_id,
            created_at: now,
            updated_at: now,
        }
    }
}
