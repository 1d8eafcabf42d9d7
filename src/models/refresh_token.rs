use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A `refresh_tokens` row. The `token` column stores the literal signed
/// token string and is unique; `expires_at` duplicates the expiry embedded
/// in the token itself, and both are checked on rotation.
#[derive(Debug, FromRow)]
pub struct RefreshTokenRow {
    pub id: i32,
    pub token: String,
    pub user_id: i32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Row shape for the rotation lookup: the stored token joined with its
/// owning user's email, which the replacement access token encodes.
#[derive(Debug, FromRow)]
pub struct RefreshTokenWithOwner {
    pub id: i32,
    pub user_id: i32,
    pub expires_at: DateTime<Utc>,
    pub email: String,
}
