//!
//! # Error taxonomy
//!
//! `AppError` is the single error type flowing through route handlers, the
//! token service, and the auth gate. It implements
//! `actix_web::error::ResponseError`, so any handler returning
//! `Result<_, AppError>` produces the right status code and JSON body
//! without per-handler match arms.
//!
//! Mapping:
//! - `Validation` → 400 with a structured field→issues list
//! - `Conflict` → 400
//! - `InvalidCredentials` → 400, deliberately identical for unknown email
//!   and wrong password
//! - `Unauthorized` → 401 (missing token)
//! - `Forbidden` → 403 (invalid or expired token)
//! - `NotFound` → 404
//! - `Database` / `Internal` → 500, raw detail included in the body
//!
//! `From` impls for `sqlx::Error`, `validator::ValidationErrors`,
//! `jsonwebtoken::errors::Error`, and `bcrypt::BcryptError` let call sites
//! propagate with `?`. No failure is retried; every error terminates its
//! request.

use actix_web::{error::ResponseError, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

#[derive(Debug)]
pub enum AppError {
    /// Request payload failed schema validation (HTTP 400).
    /// Carries the field-level issue list produced by `validator`.
    Validation(ValidationErrors),
    /// A uniqueness constraint would be violated, e.g. an email that is
    /// already registered (HTTP 400).
    Conflict(String),
    /// Login failed (HTTP 400). Intentionally carries no detail so the
    /// response cannot be used for account enumeration.
    InvalidCredentials,
    /// No credentials were presented where some were required (HTTP 401).
    Unauthorized(String),
    /// Credentials were presented but did not verify (HTTP 403).
    Forbidden(String),
    /// The requested resource does not exist for this user (HTTP 404).
    NotFound(String),
    /// Error from the underlying store (HTTP 500).
    Database(String),
    /// Anything else unexpected (HTTP 500).
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Validation(errors) => write!(f, "Validation failed: {}", errors),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::InvalidCredentials => write!(f, "Invalid credentials"),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Database(msg) => write!(f, "Database Error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Validation(errors) => HttpResponse::BadRequest().json(json!({
                "error": "Validation failed",
                "details": errors.field_errors(),
            })),
            AppError::Conflict(msg) => HttpResponse::BadRequest().json(json!({
                "error": msg
            })),
            AppError::InvalidCredentials => HttpResponse::BadRequest().json(json!({
                "error": "Invalid credentials"
            })),
            AppError::Unauthorized(msg) => HttpResponse::Unauthorized().json(json!({
                "error": msg
            })),
            AppError::Forbidden(msg) => HttpResponse::Forbidden().json(json!({
                "error": msg
            })),
            AppError::NotFound(msg) => HttpResponse::NotFound().json(json!({
                "error": msg
            })),
            // Raw detail is surfaced to the caller; this service is not
            // hardened against information leakage.
            AppError::Database(msg) | AppError::Internal(msg) => {
                HttpResponse::InternalServerError().json(json!({
                    "error": "Internal server error",
                    "detail": msg,
                }))
            }
        }
    }
}

/// `sqlx::Error::RowNotFound` becomes a 404; everything else from the store
/// is a 500.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::Database(error.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        AppError::Validation(errors)
    }
}

/// JWT processing failures (bad signature, expiry, malformed token) are
/// 403s; the caller presented a token, it just did not verify.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Forbidden(format!("Invalid token: {}", error))
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::Internal(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 6))]
        password: String,
    }

    #[test]
    fn test_error_status_codes() {
        let error = AppError::Conflict("Email already registered".into());
        assert_eq!(error.error_response().status(), 400);

        let error = AppError::InvalidCredentials;
        assert_eq!(error.error_response().status(), 400);

        let error = AppError::Unauthorized("Missing token".into());
        assert_eq!(error.error_response().status(), 401);

        let error = AppError::Forbidden("Invalid token".into());
        assert_eq!(error.error_response().status(), 403);

        let error = AppError::NotFound("Task not found".into());
        assert_eq!(error.error_response().status(), 404);

        let error = AppError::Database("connection reset".into());
        assert_eq!(error.error_response().status(), 500);

        let error = AppError::Internal("boom".into());
        assert_eq!(error.error_response().status(), 500);
    }

    #[test]
    fn test_validation_error_keeps_field_details() {
        let probe = Probe {
            password: "123".into(),
        };
        let errors = probe.validate().unwrap_err();
        let error = AppError::from(errors);

        assert_eq!(error.error_response().status(), 400);
        match error {
            AppError::Validation(errors) => {
                assert!(errors.field_errors().contains_key("password"));
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let error = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(error.error_response().status(), 404);
    }
}
