use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::ids::UserId;

/// Header carrying the id of the user performing the request.
pub const ACTING_USER_HEADER: &str = "x-user-id";

/// Candidate or reviewer identified by the `x-user-id` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(ACTING_USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|id| *id > 0);

        match user {
            Some(id) => Ok(ActingUser(UserId(id))),
            None => {
                let payload = json!({
                    "error": format!("a positive numeric {ACTING_USER_HEADER} header is required"),
                });
                Err((StatusCode::UNAUTHORIZED, Json(payload)).into_response())
            }
        }
    }
}
