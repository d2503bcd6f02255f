use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;

use crate::validation::ValidationErrors;

/// Prefix axum puts in front of the `path: reason` text of a data error.
const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// JSON request body whose decoding failures answer with the same field-keyed
/// 422 payload as the workflow validators.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_response(rejection)),
        }
    }
}

fn rejection_response(rejection: JsonRejection) -> Response {
    match rejection {
        JsonRejection::JsonDataError(err) => decode_errors(&err.body_text()).into_response(),
        JsonRejection::JsonSyntaxError(_) => {
            ValidationErrors::single("body", "request body must be valid JSON").into_response()
        }
        other => other.into_response(),
    }
}

/// Turns a serde decoding message into a field-keyed error.
pub(crate) fn decode_errors(text: &str) -> ValidationErrors {
    let detail = text.strip_prefix(DATA_ERROR_PREFIX).unwrap_or(text);
    let detail = match detail.rfind(" at line ") {
        Some(position) => &detail[..position],
        None => detail,
    };

    let (path, reason) = match detail.split_once(": ") {
        Some((path, reason)) if is_field_path(path) => (Some(path), reason),
        _ => (None, detail),
    };
    let missing = reason
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next());

    let field = match (path, missing) {
        (Some(path), Some(name)) => format!("{path}.{name}"),
        (Some(path), None) => path.to_string(),
        (None, Some(name)) => name.to_string(),
        (None, None) => "body".to_string(),
    };
    ValidationErrors::single(&field, reason)
}

fn is_field_path(path: &str) -> bool {
    !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
}
