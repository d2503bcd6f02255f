//! Field-keyed validation messages returned as `422 Unprocessable Entity`.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Record `message` for `field` when `value` is missing or blank.
    pub fn require_text(&mut self, field: &str, value: Option<&str>, message: &str) {
        if value.map_or(true, |text| text.trim().is_empty()) {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `Ok(())` when nothing was recorded.
    pub fn finish(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    fn summary(&self) -> String {
        let first = self
            .fields
            .values()
            .flat_map(|messages| messages.first())
            .next()
            .cloned()
            .unwrap_or_else(|| "the given data was invalid".to_string());
        let remaining: usize = self.fields.values().map(Vec::len).sum::<usize>() - 1;
        if remaining == 0 {
            first
        } else {
            format!("{first} (and {remaining} more error(s))")
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "the given data was invalid");
        }
        write!(f, "{}", self.summary())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoResponse for ValidationErrors {
    fn into_response(self) -> Response {
        let payload = json!({
            "message": self.to_string(),
            "errors": self,
        });
        (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
    }
}

/// Reads an optional score sent either as a JSON number or as form text.
/// Blank text counts as no score.
pub fn optional_score<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawScore {
        Number(f32),
        Text(String),
    }

    match Option::<RawScore>::deserialize(deserializer) {
        Ok(None) => Ok(None),
        Ok(Some(RawScore::Number(score))) => Ok(Some(score)),
        Ok(Some(RawScore::Text(text))) if text.trim().is_empty() => Ok(None),
        Ok(Some(RawScore::Text(text))) => text
            .trim()
            .parse::<f32>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("score must be a number, got \"{text}\""))),
        Err(_) => Err(serde::de::Error::custom("score must be a number")),
    }
}
