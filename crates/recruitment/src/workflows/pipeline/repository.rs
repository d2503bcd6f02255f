use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Application, ApplicationHistory, ApplicationStatus, InterviewSchedule, PeriodWindow,
};
use crate::error::RepositoryError;
use crate::ids::{ApplicationId, UserId, VacancyPeriodId};

/// Values recorded when a candidate applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub user_id: UserId,
    pub vacancy_period_id: VacancyPeriodId,
    pub applied_at: DateTime<Utc>,
}

/// Reviewer verdict written onto the history row being closed.
#[derive(Debug, Clone, PartialEq)]
pub struct StageReview {
    pub score: Option<f32>,
    pub notes: Option<String>,
    pub reviewed_by: UserId,
    pub reviewed_at: DateTime<Utc>,
}

/// Atomic move of an application from one status to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub application_id: ApplicationId,
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
    pub review: StageReview,
    pub schedule: Option<InterviewSchedule>,
}

/// Document paths to set on an application; `None` leaves a path untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentPaths {
    pub resume_path: Option<String>,
    pub cover_letter_path: Option<String>,
}

/// Psychotest answers of one application that already carry a score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssessmentTotal {
    pub score: f32,
    /// Answers still waiting for a manual grade.
    pub ungraded: u32,
}

/// Storage port for applications and their history ledger.
pub trait ApplicationRepository: Send + Sync {
    fn period_window(
        &self,
        period: VacancyPeriodId,
    ) -> Result<Option<PeriodWindow>, RepositoryError>;

    /// Insert the application in `admin_selection` together with its first active history row.
    /// Fails with `Conflict` when the user already applied to the period.
    fn create(&self, application: NewApplication) -> Result<Application, RepositoryError>;

    fn fetch(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError>;

    /// History rows ordered oldest first.
    fn history(&self, id: ApplicationId) -> Result<Vec<ApplicationHistory>, RepositoryError>;

    /// Close the active row, open the row for `transition.to`, and update the status in one unit.
    /// Fails with `StaleStatus` when the application no longer holds `transition.from`.
    fn transition(&self, transition: Transition) -> Result<Application, RepositoryError>;

    fn attach_documents(
        &self,
        id: ApplicationId,
        documents: DocumentPaths,
    ) -> Result<Application, RepositoryError>;

    fn list_for_period(
        &self,
        period: VacancyPeriodId,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<Application>, RepositoryError>;

    fn list_for_user(&self, user: UserId) -> Result<Vec<Application>, RepositoryError>;

    /// Sum of scored answers for the application, `None` when nothing is scored yet.
    fn assessment_total(
        &self,
        id: ApplicationId,
    ) -> Result<Option<AssessmentTotal>, RepositoryError>;
}

/// Outbound candidate messages (e-mail, chat, ...).
pub trait CandidateNotifier: Send + Sync {
    fn notify(&self, notification: CandidateNotification) -> Result<(), NotifyError>;
}

/// Message payload so transports and tests can assert on the template used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateNotification {
    pub template: String,
    pub application_id: ApplicationId,
    pub user_id: UserId,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Notifier that writes every message to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl CandidateNotifier for TracingNotifier {
    fn notify(&self, notification: CandidateNotification) -> Result<(), NotifyError> {
        tracing::info!(
            template = %notification.template,
            application_id = %notification.application_id,
            user_id = %notification.user_id,
            details = ?notification.details,
            "candidate notification"
        );
        Ok(())
    }
}
