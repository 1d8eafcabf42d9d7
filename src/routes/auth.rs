use crate::{
    auth::{
        hash_password, issue_token_pair, revoke_refresh_token, rotate_access_token,
        verify_password, AccessTokenResponse, AuthResponse, LoginRequest, LogoutRequest,
        MessageResponse, RefreshRequest, RegisterRequest,
    },
    error::AppError,
    models::{PublicUser, User},
};
use actix_web::{post, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// Register a new user.
///
/// Validates the payload, rejects an already-registered email, hashes the
/// password, and answers with a fresh token pair plus the public user view.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    payload: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;

    let existing: Option<(i32,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(pool.get_ref())
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) \
         RETURNING id, name, email, password_hash, created_at",
    )
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&password_hash)
    .fetch_one(pool.get_ref())
    .await?;

    let tokens = issue_token_pair(pool.get_ref(), user.id, &user.email).await?;

    Ok(HttpResponse::Created().json(AuthResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        user: PublicUser::from(user),
    }))
}

/// Login with email and password.
///
/// An unknown email and a wrong password fail identically, so the response
/// cannot be used to probe which addresses are registered.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    payload: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;

    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, password_hash, created_at FROM users WHERE email = $1",
    )
    .bind(&payload.email)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let tokens = issue_token_pair(pool.get_ref(), user.id, &user.email).await?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        user: PublicUser::from(user),
    }))
}

/// Exchange a refresh token for a new access token.
///
/// 401 when the token is missing from the body, 403 when it is unknown,
/// expired, or fails verification. The refresh token itself is not rotated.
#[post("/refresh")]
pub async fn refresh(
    pool: web::Data<PgPool>,
    payload: web::Json<RefreshRequest>,
) -> Result<impl Responder, AppError> {
    let token = payload
        .refresh_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Refresh token required".into()))?;

    let access_token = rotate_access_token(pool.get_ref(), token).await?;

    Ok(HttpResponse::Ok().json(AccessTokenResponse { access_token }))
}

/// Invalidate a refresh token. Always answers 200, whether or not the token
/// was known.
#[post("/logout")]
pub async fn logout(
    pool: web::Data<PgPool>,
    payload: web::Json<LogoutRequest>,
) -> Result<impl Responder, AppError> {
    if let Some(token) = payload
        .refresh_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        revoke_refresh_token(pool.get_ref(), token).await?;
    }

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}
