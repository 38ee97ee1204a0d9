//! Identity of the requesting user.
//!
//! The hosting layer authenticates users and forwards the login name in the
//! `X-User-Id` header. Handlers take [`CurrentUser`] as an argument and pass
//! the id down explicitly.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};

use crate::error::ErrorResponse;
use crate::models::UserId;

pub const USER_HEADER: &str = "X-User-Id";

#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserId);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let uid = parts
            .headers
            .get(USER_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|uid| !uid.is_empty());

        match uid {
            Some(uid) => Ok(Self(UserId::from(uid))),
            None => {
                tracing::warn!("Request without {} header", USER_HEADER);
                Err((
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse::new("missing user identity")),
                ))
            }
        }
    }
}
