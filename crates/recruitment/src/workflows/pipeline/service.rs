use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinError;
use tracing::{info, warn};

use super::domain::{
    next_status, Application, ApplicationDetail, ApplicationStatus, Decision, Stage,
};
use super::repository::{
    ApplicationRepository, CandidateNotification, CandidateNotifier, DocumentPaths,
    NewApplication, StageReview, Transition,
};
use super::stage::{StageAction, StageActionRequest};
use crate::error::RepositoryError;
use crate::ids::{ApplicationId, UserId, VacancyPeriodId};
use crate::storage::{FileStorage, StorageError, Upload};
use crate::validation::ValidationErrors;

pub const DOCUMENT_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];
const DOCUMENT_DIRECTORY: &str = "applications";

/// Service driving applications through the recruitment stages.
pub struct RecruitmentPipeline<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
    storage: Arc<dyn FileStorage>,
}

impl<R, N> RecruitmentPipeline<R, N>
where
    R: ApplicationRepository + 'static,
    N: CandidateNotifier + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>, storage: Arc<dyn FileStorage>) -> Self {
        Self {
            repository,
            notifier,
            storage,
        }
    }

    pub fn storage(&self) -> &Arc<dyn FileStorage> {
        &self.storage
    }

    /// Register `user` as a candidate for an open vacancy period.
    pub fn apply(
        &self,
        user: UserId,
        period: VacancyPeriodId,
    ) -> Result<Application, PipelineError> {
        let window = self
            .repository
            .period_window(period)?
            .ok_or_else(|| PipelineError::NotFound(format!("vacancy period {period}")))?;

        let now = Utc::now();
        if !window.is_open_on(now.date_naive()) {
            return Err(PipelineError::Validation(ValidationErrors::single(
                "vacancy_period_id",
                format!(
                    "vacancy period {period} only accepts applications from {} to {}",
                    window.starts_on, window.ends_on
                ),
            )));
        }

        let application = self
            .repository
            .create(NewApplication {
                user_id: user,
                vacancy_period_id: period,
                applied_at: now,
            })
            .map_err(|err| match err {
                RepositoryError::Conflict(_) => PipelineError::AlreadyApplied { user, period },
                other => PipelineError::Repository(other),
            })?;

        info!(
            application_id = %application.id,
            user_id = %user,
            vacancy_period_id = %period,
            "application received"
        );
        Ok(application)
    }

    /// Store the candidate's resume and/or cover letter, replacing earlier uploads.
    pub fn attach_documents(
        &self,
        id: ApplicationId,
        user: UserId,
        resume: Option<Upload>,
        cover_letter: Option<Upload>,
    ) -> Result<Application, PipelineError> {
        let application = self.get(id)?;
        if application.user_id != user {
            return Err(PipelineError::Forbidden);
        }

        let mut errors = ValidationErrors::new();
        if resume.is_none() && cover_letter.is_none() {
            errors.add("resume", "upload a resume or a cover letter");
        }
        for (field, upload) in [("resume", &resume), ("cover_letter", &cover_letter)] {
            if let Some(upload) = upload {
                if !upload.has_extension(&DOCUMENT_EXTENSIONS) {
                    errors.add(field, "documents must be pdf, doc, or docx files");
                }
            }
        }
        errors.finish()?;

        let store = |upload: Option<Upload>| -> Result<Option<String>, StorageError> {
            upload
                .map(|upload| {
                    self.storage
                        .put(DOCUMENT_DIRECTORY, &upload.file_name, &upload.bytes)
                })
                .transpose()
        };
        let resume_path = store(resume)?;
        let cover_letter_path = match store(cover_letter) {
            Ok(path) => path,
            Err(err) => {
                self.discard_documents(resume_path.iter(), "failed to remove orphaned document");
                return Err(err.into());
            }
        };
        let documents = DocumentPaths {
            resume_path,
            cover_letter_path,
        };
        let stored: Vec<String> = [&documents.resume_path, &documents.cover_letter_path]
            .into_iter()
            .flatten()
            .cloned()
            .collect();

        let replaced = [
            documents
                .resume_path
                .as_ref()
                .and(application.resume_path.clone()),
            documents
                .cover_letter_path
                .as_ref()
                .and(application.cover_letter_path.clone()),
        ];

        let updated = match self.repository.attach_documents(id, documents) {
            Ok(updated) => updated,
            Err(err) => {
                self.discard_documents(stored.iter(), "failed to remove orphaned document");
                return Err(err.into());
            }
        };
        self.discard_documents(
            replaced.iter().flatten(),
            "failed to remove replaced document",
        );
        Ok(updated)
    }

    fn discard_documents<'a>(&self, paths: impl Iterator<Item = &'a String>, failure: &str) {
        for path in paths {
            if let Err(err) = self.storage.delete(path) {
                warn!(%path, error = %err, "{failure}");
            }
        }
    }

    /// Record an HR decision for `stage` and move the application along.
    pub fn act(
        &self,
        id: ApplicationId,
        stage: Stage,
        request: &StageActionRequest,
        reviewer: UserId,
    ) -> Result<ApplicationDetail, PipelineError> {
        let now = Utc::now();
        let application = self.get(id)?;
        if application.status != stage.status() {
            return Err(PipelineError::StageMismatch {
                stage,
                current: application.status,
            });
        }

        let StageAction {
            decision,
            mut notes,
            score,
            schedule,
        } = request.validate(stage, now)?;

        let score = match (score, decision, stage) {
            (None, Decision::Passed, Stage::Psychotest) => {
                let total = self.repository.assessment_total(id)?;
                if let Some(total) = total.filter(|total| total.ungraded > 0) {
                    warn!(
                        application_id = %id,
                        ungraded_answers = total.ungraded,
                        "psychotest score covers graded answers only"
                    );
                    notes.get_or_insert_with(|| partial_score_note(total.ungraded));
                }
                total.map(|total| total.score)
            }
            (score, _, _) => score,
        };
        let to = next_status(stage, decision);

        let updated = self
            .repository
            .transition(Transition {
                application_id: id,
                from: application.status,
                to,
                review: StageReview {
                    score,
                    notes: notes.clone(),
                    reviewed_by: reviewer,
                    reviewed_at: now,
                },
                schedule: schedule.clone(),
            })
            .map_err(|err| match err {
                RepositoryError::StaleStatus { actual, .. } => PipelineError::StageMismatch {
                    stage,
                    current: actual,
                },
                other => PipelineError::Repository(other),
            })?;

        info!(
            application_id = %id,
            stage = stage.label(),
            decision = decision.label(),
            status = updated.status.code(),
            reviewer = %reviewer,
            "stage decided"
        );

        let mut details = BTreeMap::new();
        details.insert("stage".to_string(), stage.label().to_string());
        details.insert("status".to_string(), to.code().to_string());
        if let Some(notes) = notes {
            details.insert("notes".to_string(), notes);
        }
        let template = match (to, &schedule) {
            (ApplicationStatus::Rejected, _) => "application_rejected",
            (ApplicationStatus::Accepted, _) => "application_accepted",
            (_, Some(schedule)) => {
                details.insert("zoom_url".to_string(), schedule.zoom_url.clone());
                details.insert(
                    "scheduled_at".to_string(),
                    schedule.scheduled_at.to_rfc3339(),
                );
                "interview_scheduled"
            }
            _ => "stage_passed",
        };
        let notification = CandidateNotification {
            template: template.to_string(),
            application_id: id,
            user_id: updated.user_id,
            details,
        };
        if let Err(err) = self.notifier.notify(notification) {
            warn!(application_id = %id, error = %err, "candidate notification failed");
        }

        self.detail_of(updated)
    }

    pub fn get(&self, id: ApplicationId) -> Result<Application, PipelineError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| PipelineError::NotFound(format!("application {id}")))
    }

    pub fn detail(&self, id: ApplicationId) -> Result<ApplicationDetail, PipelineError> {
        let application = self.get(id)?;
        self.detail_of(application)
    }

    pub fn list_for_period(
        &self,
        period: VacancyPeriodId,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<Application>, PipelineError> {
        if self.repository.period_window(period)?.is_none() {
            return Err(PipelineError::NotFound(format!("vacancy period {period}")));
        }
        Ok(self.repository.list_for_period(period, status)?)
    }

    pub fn list_for_user(&self, user: UserId) -> Result<Vec<Application>, PipelineError> {
        Ok(self.repository.list_for_user(user)?)
    }

    fn detail_of(&self, application: Application) -> Result<ApplicationDetail, PipelineError> {
        let history = self.repository.history(application.id)?;
        Ok(ApplicationDetail {
            status: application.status.view(),
            application,
            history,
        })
    }
}

/// Error raised by the pipeline service.
fn partial_score_note(ungraded: u32) -> String {
    format!("Score covers graded answers only; {ungraded} essay answer(s) not yet graded.")
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error("{0} not found")]
    NotFound(String),
    #[error("application belongs to another candidate")]
    Forbidden,
    #[error("user {user} already applied to vacancy period {period}")]
    AlreadyApplied {
        user: UserId,
        period: VacancyPeriodId,
    },
    #[error("cannot decide the {} stage while the application is in {}", .stage.label(), .current.code())]
    StageMismatch {
        stage: Stage,
        current: ApplicationStatus,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("pipeline task failed: {0}")]
    Worker(#[from] JoinError),
}
