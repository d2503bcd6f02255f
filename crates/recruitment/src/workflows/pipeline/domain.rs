use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ApplicationId, HistoryId, UserId, VacancyId, VacancyPeriodId};

/// Position of an application in the recruitment pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    AdminSelection,
    Psychotest,
    Interview,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::AdminSelection,
        ApplicationStatus::Psychotest,
        ApplicationStatus::Interview,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
    ];

    /// Row id in the `statuses` table.
    pub const fn id(self) -> i64 {
        match self {
            ApplicationStatus::AdminSelection => 1,
            ApplicationStatus::Psychotest => 2,
            ApplicationStatus::Interview => 3,
            ApplicationStatus::Accepted => 4,
            ApplicationStatus::Rejected => 5,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.id() == id)
    }

    pub const fn code(self) -> &'static str {
        match self {
            ApplicationStatus::AdminSelection => "admin_selection",
            ApplicationStatus::Psychotest => "psychotest",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.code().eq_ignore_ascii_case(code))
    }

    pub const fn name(self) -> &'static str {
        match self {
            ApplicationStatus::AdminSelection => "Administrative Selection",
            ApplicationStatus::Psychotest => "Psychological Test",
            ApplicationStatus::Interview => "Interview",
            ApplicationStatus::Accepted => "Accepted",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    pub const fn stage(self) -> u8 {
        match self {
            ApplicationStatus::AdminSelection => 1,
            ApplicationStatus::Psychotest => 2,
            ApplicationStatus::Interview => 3,
            ApplicationStatus::Accepted | ApplicationStatus::Rejected => 4,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Accepted | ApplicationStatus::Rejected
        )
    }

    pub fn view(self) -> Status {
        Status {
            id: self.id(),
            code: self.code(),
            name: self.name(),
            stage: self.stage(),
            is_active: true,
        }
    }

    pub fn catalog() -> Vec<Status> {
        Self::ALL.into_iter().map(Self::view).collect()
    }
}

/// Status catalog entry as exposed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub id: i64,
    pub code: &'static str,
    pub name: &'static str,
    pub stage: u8,
    pub is_active: bool,
}

/// Reviewable step addressed by the stage action endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Administration,
    Psychotest,
    Interview,
}

impl Stage {
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment.trim().to_ascii_lowercase().as_str() {
            "administration" | "admin_selection" => Some(Stage::Administration),
            "psychotest" | "assessment" => Some(Stage::Psychotest),
            "interview" => Some(Stage::Interview),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Stage::Administration => "administration",
            Stage::Psychotest => "psychotest",
            Stage::Interview => "interview",
        }
    }

    /// Status the application must hold for this stage to be decided.
    pub const fn status(self) -> ApplicationStatus {
        match self {
            Stage::Administration => ApplicationStatus::AdminSelection,
            Stage::Psychotest => ApplicationStatus::Psychotest,
            Stage::Interview => ApplicationStatus::Interview,
        }
    }

    pub const fn next_on_pass(self) -> ApplicationStatus {
        match self {
            Stage::Administration => ApplicationStatus::Psychotest,
            Stage::Psychotest => ApplicationStatus::Interview,
            Stage::Interview => ApplicationStatus::Accepted,
        }
    }

    pub const fn requires_score_on_pass(self) -> bool {
        matches!(self, Stage::Administration | Stage::Interview)
    }

    pub const fn requires_schedule_on_pass(self) -> bool {
        matches!(self, Stage::Psychotest)
    }
}

/// HR verdict for a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Passed,
    Rejected,
}

impl Decision {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "passed" => Some(Decision::Passed),
            "rejected" => Some(Decision::Rejected),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Decision::Passed => "passed",
            Decision::Rejected => "rejected",
        }
    }
}

/// Status reached after deciding `stage`.
pub const fn next_status(stage: Stage, decision: Decision) -> ApplicationStatus {
    match decision {
        Decision::Passed => stage.next_on_pass(),
        Decision::Rejected => ApplicationStatus::Rejected,
    }
}

/// A candidate's submission against one vacancy period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub user_id: UserId,
    pub vacancy_period_id: VacancyPeriodId,
    pub status: ApplicationStatus,
    pub resume_path: Option<String>,
    pub cover_letter_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One stage visit in the append-only application ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationHistory {
    pub id: HistoryId,
    pub application_id: ApplicationId,
    pub status: ApplicationStatus,
    pub processed_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub score: Option<f32>,
    pub notes: Option<String>,
    pub reviewed_by: Option<UserId>,
    pub is_active: bool,
    pub zoom_url: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Online interview slot announced when a candidate passes the psychotest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewSchedule {
    pub zoom_url: String,
    pub scheduled_at: DateTime<Utc>,
}

/// Application window of a vacancy period, as needed to accept applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodWindow {
    pub id: VacancyPeriodId,
    pub vacancy_id: VacancyId,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
}

impl PeriodWindow {
    pub fn is_open_on(&self, day: NaiveDate) -> bool {
        self.starts_on <= day && day <= self.ends_on
    }
}

/// Application with its resolved status and ledger.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationDetail {
    pub application: Application,
    pub status: Status,
    pub history: Vec<ApplicationHistory>,
}

impl ApplicationDetail {
    pub fn active_entry(&self) -> Option<&ApplicationHistory> {
        self.history.iter().find(|entry| entry.is_active)
    }
}
