//! Token service: issuing, verifying, rotating, and revoking tokens.
//!
//! Two token kinds, signed with separate secrets. The access token encodes
//! `{id, email}` and lives 15 minutes; it is trusted purely on its
//! signature (the gate never consults the store). The refresh token encodes
//! `{id}`, lives 7 days, and its literal value is additionally persisted in
//! `refresh_tokens` with an absolute `expires_at` — both the stored expiry
//! and the embedded one are checked on rotation.
//!
//! Rotation issues a new access token only; the refresh row stays in place
//! until logout, an expiry detection on rotate, or natural expiry. Stale
//! rows are not swept, so a user accumulates one row per login/register.

use crate::error::AppError;
use crate::models::refresh_token::RefreshTokenWithOwner;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

const ACCESS_TOKEN_TTL_MINUTES: i64 = 15;
const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

/// Claims carried by an access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Owning user's id.
    pub sub: i32,
    /// Owning user's email, so protected handlers get the full identity
    /// without a store lookup.
    pub email: String,
    /// Expiration, seconds since epoch.
    pub exp: usize,
}

/// Claims carried by a refresh token.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: i32,
    pub exp: usize,
}

/// An access/refresh pair as handed out by login, register, and the tests.
#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn access_secret() -> Result<String, AppError> {
    std::env::var("JWT_ACCESS_SECRET")
        .map_err(|_| AppError::Internal("JWT_ACCESS_SECRET not set".into()))
}

fn refresh_secret() -> Result<String, AppError> {
    std::env::var("JWT_REFRESH_SECRET")
        .map_err(|_| AppError::Internal("JWT_REFRESH_SECRET not set".into()))
}

/// Signs a 15-minute access token for the given identity.
pub fn generate_access_token(user_id: i32, email: &str) -> Result<String, AppError> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::minutes(ACCESS_TOKEN_TTL_MINUTES))
        .expect("valid timestamp")
        .timestamp() as usize;

    let claims = AccessClaims {
        sub: user_id,
        email: email.to_string(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(access_secret()?.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign access token: {}", e)))
}

/// Signs a 7-day refresh token. Persistence of the row is the caller's
/// business; see [`issue_token_pair`].
pub fn generate_refresh_token(user_id: i32) -> Result<String, AppError> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::days(REFRESH_TOKEN_TTL_DAYS))
        .expect("valid timestamp")
        .timestamp() as usize;

    let claims = RefreshClaims {
        sub: user_id,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(refresh_secret()?.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign refresh token: {}", e)))
}

/// Verifies signature and expiry of an access token.
/// Fails with `Forbidden` (via the jsonwebtoken `From` impl) on any defect.
pub fn verify_access_token(token: &str) -> Result<AccessClaims, AppError> {
    let claims = decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(access_secret()?.as_bytes()),
        &Validation::default(),
    )?
    .claims;
    Ok(claims)
}

/// Verifies signature and embedded expiry of a refresh token.
pub fn verify_refresh_token(token: &str) -> Result<RefreshClaims, AppError> {
    let claims = decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(refresh_secret()?.as_bytes()),
        &Validation::default(),
    )?
    .claims;
    Ok(claims)
}

/// Issues a fresh token pair and persists the refresh token's literal value
/// with its absolute expiry. One new row per call; earlier rows for the
/// same user are left untouched.
pub async fn issue_token_pair(
    pool: &PgPool,
    user_id: i32,
    email: &str,
) -> Result<TokenPair, AppError> {
    let access_token = generate_access_token(user_id, email)?;
    let refresh_token = generate_refresh_token(user_id)?;
    let expires_at = Utc::now() + Duration::days(REFRESH_TOKEN_TTL_DAYS);

    sqlx::query("INSERT INTO refresh_tokens (token, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(&refresh_token)
        .bind(user_id)
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Exchanges a refresh token for a new access token.
///
/// The stored row is checked first: no row, or a row whose `expires_at` has
/// passed (the expired row is deleted on detection), fails with the same
/// `Forbidden`. Only then is the token itself cryptographically verified.
/// The refresh token is not replaced.
pub async fn rotate_access_token(pool: &PgPool, refresh_token: &str) -> Result<String, AppError> {
    let row = sqlx::query_as::<_, RefreshTokenWithOwner>(
        "SELECT rt.id, rt.user_id, rt.expires_at, u.email \
         FROM refresh_tokens rt \
         JOIN users u ON u.id = rt.user_id \
         WHERE rt.token = $1",
    )
    .bind(refresh_token)
    .fetch_optional(pool)
    .await?;

    let row = match row {
        Some(row) => row,
        None => return Err(AppError::Forbidden("Invalid or expired refresh token".into())),
    };

    if row.expires_at < Utc::now() {
        sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
            .bind(row.id)
            .execute(pool)
            .await?;
        return Err(AppError::Forbidden("Invalid or expired refresh token".into()));
    }

    verify_refresh_token(refresh_token)
        .map_err(|_| AppError::Forbidden("Invalid refresh token".into()))?;

    generate_access_token(row.user_id, &row.email)
}

/// Deletes every stored row matching the literal token value. A no-op when
/// none match, so logout always succeeds.
pub async fn revoke_refresh_token(pool: &PgPool, refresh_token: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
        .bind(refresh_token)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    pub(crate) static JWT_ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Runs `test_logic` with both JWT secrets temporarily set, serialized
    /// against every other test that touches the secret env vars.
    pub(crate) fn with_jwt_secrets<F>(access: &str, refresh: &str, test_logic: F)
    where
        F: FnOnce(),
    {
        let _guard = JWT_ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        let saved_access = std::env::var("JWT_ACCESS_SECRET").ok();
        let saved_refresh = std::env::var("JWT_REFRESH_SECRET").ok();
        std::env::set_var("JWT_ACCESS_SECRET", access);
        std::env::set_var("JWT_REFRESH_SECRET", refresh);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(test_logic));

        match saved_access {
            Some(value) => std::env::set_var("JWT_ACCESS_SECRET", value),
            None => std::env::remove_var("JWT_ACCESS_SECRET"),
        }
        match saved_refresh {
            Some(value) => std::env::set_var("JWT_REFRESH_SECRET", value),
            None => std::env::remove_var("JWT_REFRESH_SECRET"),
        }

        if let Err(panic_payload) = result {
            std::panic::resume_unwind(panic_payload);
        }
    }
}
