use chrono::{DateTime, Utc};
use serde::Serialize;

use super::documents::score_text;
use super::ExportError;
use crate::workflows::pipeline::{Application, ApplicationHistory};

/// One applicant line of the period report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub application_id: i64,
    pub candidate: String,
    pub email: String,
    pub status: String,
    pub latest_score: String,
    pub applied_at: String,
}

impl ReportRow {
    /// `history` is expected oldest first; the latest scored row wins.
    pub fn new(
        application: &Application,
        candidate: Option<(&str, &str)>,
        history: &[ApplicationHistory],
    ) -> Self {
        let (candidate, email) = match candidate {
            Some((name, email)) => (name.to_string(), email.to_string()),
            None => (format!("Candidate #{}", application.user_id), String::new()),
        };
        Self {
            application_id: application.id.0,
            candidate,
            email,
            status: application.status.code().to_string(),
            latest_score: latest_score(history).map(score_text).unwrap_or_default(),
            applied_at: applied_at(application.created_at),
        }
    }
}

fn latest_score(history: &[ApplicationHistory]) -> Option<f32> {
    history.iter().rev().find_map(|entry| entry.score)
}

fn applied_at(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Serialise report rows to CSV with a header line.
pub fn write_report(rows: &[ReportRow]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if rows.is_empty() {
        writer.write_record([
            "application_id",
            "candidate",
            "email",
            "status",
            "latest_score",
            "applied_at",
        ])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Report(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| ExportError::Report(err.to_string()))
}
