use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::user::Role;

/// The authenticated identity resolved from a session token.
///
/// `AuthMiddleware` verifies the bearer token, resolves the account, and
/// inserts a `Principal` into request extensions; handlers receive it through
/// this extractor.
///
/// If no principal is present (e.g., the middleware did not run on this
/// route), extraction fails with `AppError::Unauthorized`.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
    pub email: String,
    pub name: String,
}

impl FromRequest for Principal {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Principal>().cloned() {
            Some(principal) => ready(Ok(principal)),
            None => {
                let err = AppError::Unauthorized("Authentication required".to_string());
                ready(Err(err.into()))
            }
        }
    }
}
