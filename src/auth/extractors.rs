use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::token::AccessClaims;
use crate::error::AppError;

/// The authenticated identity attached by [`AuthGate`](crate::auth::AuthGate).
///
/// Handlers on protected routes take this as a parameter; if the claims are
/// missing from the request extensions (the gate was not applied), the
/// extractor fails with 401 rather than letting the handler run without an
/// identity.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub email: String,
}

impl FromRequest for AuthUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AccessClaims>() {
            Some(claims) => ready(Ok(AuthUser {
                id: claims.sub,
                email: claims.email.clone(),
            })),
            None => {
                let err = AppError::Unauthorized("No authenticated identity on request".into());
                ready(Err(err.into()))
            }
        }
    }
}
