use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Decision, InterviewSchedule, Stage};
use crate::validation::{optional_score, ValidationErrors};

pub const MAX_SCORE: f32 = 100.0;
pub const MAX_NOTES_LEN: usize = 2000;

/// Raw stage action payload posted by the HR review form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageActionRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "optional_score")]
    pub score: Option<f32>,
    #[serde(default)]
    pub zoom_url: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<String>,
}

/// Stage action that passed validation for a particular stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageAction {
    pub decision: Decision,
    pub notes: Option<String>,
    pub score: Option<f32>,
    pub schedule: Option<InterviewSchedule>,
}

impl StageActionRequest {
    /// Check the payload against the field rules of `stage`, collecting every failure.
    pub fn validate(
        &self,
        stage: Stage,
        now: DateTime<Utc>,
    ) -> Result<StageAction, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let decision = match self.status.as_deref().map(str::trim) {
            None | Some("") => {
                errors.add("status", "status is required");
                None
            }
            Some(raw) => {
                let decision = Decision::parse(raw);
                if decision.is_none() {
                    errors.add("status", "status must be either passed or rejected");
                }
                decision
            }
        };

        let notes = self
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
            .map(str::to_string);
        if let Some(text) = &notes {
            if text.chars().count() > MAX_NOTES_LEN {
                errors.add(
                    "notes",
                    format!("notes may not be longer than {MAX_NOTES_LEN} characters"),
                );
            }
        }

        if let Some(score) = self.score {
            if !score.is_finite() || !(0.0..=MAX_SCORE).contains(&score) {
                errors.add("score", format!("score must be between 0 and {MAX_SCORE}"));
            }
        }

        let mut schedule = None;
        match decision {
            Some(Decision::Passed) => {
                if stage.requires_score_on_pass() && self.score.is_none() {
                    errors.add(
                        "score",
                        format!("score is required to pass the {} stage", stage.label()),
                    );
                }
                if stage.requires_schedule_on_pass() {
                    schedule = validate_schedule(
                        self.zoom_url.as_deref(),
                        self.scheduled_at.as_deref(),
                        now,
                        &mut errors,
                    );
                }
            }
            Some(Decision::Rejected) => {
                if notes.is_none() {
                    errors.add("notes", "notes are required when rejecting a candidate");
                }
            }
            None => {}
        }

        errors.finish()?;
        let Some(decision) = decision else {
            return Err(ValidationErrors::single("status", "status is required"));
        };

        Ok(StageAction {
            decision,
            notes,
            score: self.score,
            schedule,
        })
    }
}

fn validate_schedule(
    zoom_url: Option<&str>,
    scheduled_at: Option<&str>,
    now: DateTime<Utc>,
    errors: &mut ValidationErrors,
) -> Option<InterviewSchedule> {
    let zoom_url = match zoom_url.map(str::trim).filter(|url| !url.is_empty()) {
        None => {
            errors.add("zoom_url", "zoom_url is required to schedule the interview");
            None
        }
        Some(url) if !is_http_url(url) => {
            errors.add("zoom_url", "zoom_url must be a valid http(s) URL");
            None
        }
        Some(url) => Some(url.to_string()),
    };

    let scheduled_at = match scheduled_at.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => {
            errors.add("scheduled_at", "scheduled_at is required to schedule the interview");
            None
        }
        Some(raw) => match parse_schedule(raw) {
            None => {
                errors.add("scheduled_at", "scheduled_at must be a valid date and time");
                None
            }
            Some(at) if at <= now => {
                errors.add("scheduled_at", "scheduled_at must be in the future");
                None
            }
            Some(at) => Some(at),
        },
    };

    Some(InterviewSchedule {
        zoom_url: zoom_url?,
        scheduled_at: scheduled_at?,
    })
}

/// Accepts RFC 3339 or the `datetime-local` shapes, the latter read as UTC.
pub fn parse_schedule(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

fn is_http_url(raw: &str) -> bool {
    let rest = raw
        .strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            !host.is_empty() && !rest.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
