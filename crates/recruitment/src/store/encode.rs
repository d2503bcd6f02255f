//! Conversions between domain values and their SQLite column text.
//!
//! Timestamps are RFC 3339 strings, calendar days `YYYY-MM-DD`, statuses
//! the `statuses.id` foreign key.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::Row;

use crate::workflows::pipeline::ApplicationStatus;

pub fn encode_dt(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

pub fn decode_dt(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| format!("invalid timestamp {raw:?}: {err}"))
}

pub fn encode_day(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

pub fn decode_day(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|err| format!("invalid date {raw:?}: {err}"))
}

fn conversion(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

/// Column readers usable inside `query_row` / `query_map` closures.
pub fn dt_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    decode_dt(&raw).map_err(|message| conversion(idx, message))
}

pub fn opt_dt_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| decode_dt(&raw).map_err(|message| conversion(idx, message)))
        .transpose()
}

pub fn day_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    decode_day(&raw).map_err(|message| conversion(idx, message))
}

pub fn opt_day_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| decode_day(&raw).map_err(|message| conversion(idx, message)))
        .transpose()
}

pub fn status_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<ApplicationStatus> {
    let id: i64 = row.get(idx)?;
    ApplicationStatus::from_id(id).ok_or_else(|| conversion(idx, format!("unknown status id {id}")))
}

/// Scores are kept as REAL and surfaced as `f32`.
pub fn opt_score_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<f32>> {
    let raw: Option<f64> = row.get(idx)?;
    Ok(raw.map(|score| score as f32))
}
