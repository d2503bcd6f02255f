use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};

use crate::error::RepositoryError;
use crate::ids::{ApplicationId, HistoryId, UserId, VacancyId, VacancyPeriodId};
use crate::storage::{FileStorage, LocalDiskStorage};
use crate::workflows::pipeline::{
    pipeline_router, Application, ApplicationHistory, ApplicationRepository, ApplicationStatus,
    AssessmentTotal, CandidateNotification, CandidateNotifier, DocumentPaths, NewApplication,
    NotifyError, PeriodWindow, RecruitmentPipeline, Transition,
};

pub(super) const CANDIDATE: UserId = UserId(7);
pub(super) const REVIEWER: UserId = UserId(900);
pub(super) const OPEN_PERIOD: VacancyPeriodId = VacancyPeriodId(1);
pub(super) const CLOSED_PERIOD: VacancyPeriodId = VacancyPeriodId(2);

#[derive(Default)]
struct MemoryState {
    applications: BTreeMap<ApplicationId, Application>,
    history: Vec<ApplicationHistory>,
    periods: BTreeMap<VacancyPeriodId, PeriodWindow>,
    totals: BTreeMap<ApplicationId, AssessmentTotal>,
    refuse_documents: bool,
    next_id: i64,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRepository {
    pub(super) fn with_periods() -> Self {
        let repository = Self::default();
        let today = Utc::now().date_naive();
        repository.add_period(PeriodWindow {
            id: OPEN_PERIOD,
            vacancy_id: VacancyId(1),
            starts_on: today - Duration::days(7),
            ends_on: today + Duration::days(7),
        });
        repository.add_period(PeriodWindow {
            id: CLOSED_PERIOD,
            vacancy_id: VacancyId(1),
            starts_on: today - Duration::days(30),
            ends_on: today - Duration::days(1),
        });
        repository
    }

    pub(super) fn add_period(&self, window: PeriodWindow) {
        self.state
            .lock()
            .expect("repository mutex poisoned")
            .periods
            .insert(window.id, window);
    }

    pub(super) fn set_assessment_total(&self, id: ApplicationId, score: f32, ungraded: u32) {
        self.state
            .lock()
            .expect("repository mutex poisoned")
            .totals
            .insert(id, AssessmentTotal { score, ungraded });
    }

    /// Makes every later `attach_documents` call fail as if the database dropped.
    pub(super) fn refuse_documents(&self) {
        self.state
            .lock()
            .expect("repository mutex poisoned")
            .refuse_documents = true;
    }

    pub(super) fn active_rows(&self, id: ApplicationId) -> usize {
        self.state
            .lock()
            .expect("repository mutex poisoned")
            .history
            .iter()
            .filter(|entry| entry.application_id == id && entry.is_active)
            .count()
    }
}

impl ApplicationRepository for MemoryRepository {
    fn period_window(
        &self,
        period: VacancyPeriodId,
    ) -> Result<Option<PeriodWindow>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.periods.get(&period).copied())
    }

    fn create(&self, application: NewApplication) -> Result<Application, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        let duplicate = guard.applications.values().any(|existing| {
            existing.user_id == application.user_id
                && existing.vacancy_period_id == application.vacancy_period_id
        });
        if duplicate {
            return Err(RepositoryError::Conflict("already applied".to_string()));
        }

        let id = ApplicationId(guard.next_id());
        let record = Application {
            id,
            user_id: application.user_id,
            vacancy_period_id: application.vacancy_period_id,
            status: ApplicationStatus::AdminSelection,
            resume_path: None,
            cover_letter_path: None,
            created_at: application.applied_at,
            updated_at: application.applied_at,
        };
        let history_id = HistoryId(guard.next_id());
        guard.history.push(ApplicationHistory {
            id: history_id,
            application_id: id,
            status: ApplicationStatus::AdminSelection,
            processed_at: application.applied_at,
            reviewed_at: None,
            completed_at: None,
            score: None,
            notes: None,
            reviewed_by: None,
            is_active: true,
            zoom_url: None,
            scheduled_at: None,
        });
        guard.applications.insert(id, record.clone());
        Ok(record)
    }

    fn fetch(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.applications.get(&id).cloned())
    }

    fn history(&self, id: ApplicationId) -> Result<Vec<ApplicationHistory>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard
            .history
            .iter()
            .filter(|entry| entry.application_id == id)
            .cloned()
            .collect())
    }

    fn transition(&self, transition: Transition) -> Result<Application, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        let current = guard
            .applications
            .get(&transition.application_id)
            .map(|application| application.status)
            .ok_or_else(|| RepositoryError::NotFound("application".to_string()))?;
        if current != transition.from {
            return Err(RepositoryError::StaleStatus {
                expected: transition.from,
                actual: current,
            });
        }

        let review = transition.review;
        for entry in guard
            .history
            .iter_mut()
            .filter(|entry| entry.application_id == transition.application_id && entry.is_active)
        {
            entry.is_active = false;
            entry.score = review.score;
            entry.notes = review.notes.clone();
            entry.reviewed_by = Some(review.reviewed_by);
            entry.reviewed_at = Some(review.reviewed_at);
            entry.completed_at = Some(review.reviewed_at);
        }

        let history_id = HistoryId(guard.next_id());
        let schedule = transition.schedule;
        guard.history.push(ApplicationHistory {
            id: history_id,
            application_id: transition.application_id,
            status: transition.to,
            processed_at: review.reviewed_at,
            reviewed_at: None,
            completed_at: transition.to.is_terminal().then_some(review.reviewed_at),
            score: None,
            notes: None,
            reviewed_by: None,
            is_active: true,
            zoom_url: schedule.as_ref().map(|slot| slot.zoom_url.clone()),
            scheduled_at: schedule.map(|slot| slot.scheduled_at),
        });

        let application = guard
            .applications
            .get_mut(&transition.application_id)
            .ok_or_else(|| RepositoryError::NotFound("application".to_string()))?;
        application.status = transition.to;
        application.updated_at = review.reviewed_at;
        Ok(application.clone())
    }

    fn attach_documents(
        &self,
        id: ApplicationId,
        documents: DocumentPaths,
    ) -> Result<Application, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        if guard.refuse_documents {
            return Err(RepositoryError::Unavailable("database offline".to_string()));
        }
        let application = guard
            .applications
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound("application".to_string()))?;
        if let Some(path) = documents.resume_path {
            application.resume_path = Some(path);
        }
        if let Some(path) = documents.cover_letter_path {
            application.cover_letter_path = Some(path);
        }
        Ok(application.clone())
    }

    fn list_for_period(
        &self,
        period: VacancyPeriodId,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard
            .applications
            .values()
            .filter(|application| application.vacancy_period_id == period)
            .filter(|application| status.map_or(true, |status| application.status == status))
            .cloned()
            .collect())
    }

    fn list_for_user(&self, user: UserId) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard
            .applications
            .values()
            .filter(|application| application.user_id == user)
            .cloned()
            .collect())
    }

    fn assessment_total(
        &self,
        id: ApplicationId,
    ) -> Result<Option<AssessmentTotal>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.totals.get(&id).copied())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    events: Arc<Mutex<Vec<CandidateNotification>>>,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<CandidateNotification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }

    pub(super) fn templates(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|event| event.template)
            .collect()
    }
}

impl CandidateNotifier for MemoryNotifier {
    fn notify(&self, notification: CandidateNotification) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl CandidateNotifier for FailingNotifier {
    fn notify(&self, _notification: CandidateNotification) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp offline".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn period_window(&self, _: VacancyPeriodId) -> Result<Option<PeriodWindow>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn create(&self, _: NewApplication) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn history(&self, _: ApplicationId) -> Result<Vec<ApplicationHistory>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn transition(&self, _: Transition) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn attach_documents(
        &self,
        _: ApplicationId,
        _: DocumentPaths,
    ) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_for_period(
        &self,
        _: VacancyPeriodId,
        _: Option<ApplicationStatus>,
    ) -> Result<Vec<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_for_user(&self, _: UserId) -> Result<Vec<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn assessment_total(
        &self,
        _: ApplicationId,
    ) -> Result<Option<AssessmentTotal>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) struct Fixture {
    pub(super) service: Arc<RecruitmentPipeline<MemoryRepository, MemoryNotifier>>,
    pub(super) repository: Arc<MemoryRepository>,
    pub(super) notifier: Arc<MemoryNotifier>,
    pub(super) storage: Arc<LocalDiskStorage>,
    _storage_dir: tempfile::TempDir,
}

impl Fixture {
    pub(super) fn router(&self) -> axum::Router {
        pipeline_router(self.service.clone())
    }
}

pub(super) fn storage() -> (tempfile::TempDir, Arc<LocalDiskStorage>) {
    let dir = tempfile::tempdir().expect("temp dir");
    let storage = Arc::new(LocalDiskStorage::new(dir.path(), "/storage"));
    (dir, storage)
}

pub(super) fn build_service() -> Fixture {
    let repository = Arc::new(MemoryRepository::with_periods());
    let notifier = Arc::new(MemoryNotifier::default());
    let (dir, storage) = storage();
    let shared: Arc<dyn FileStorage> = storage.clone();
    let service = Arc::new(RecruitmentPipeline::new(
        repository.clone(),
        notifier.clone(),
        shared,
    ));
    Fixture {
        service,
        repository,
        notifier,
        storage,
        _storage_dir: dir,
    }
}

pub(super) fn future_slot() -> String {
    (Utc::now() + Duration::days(3))
        .format("%Y-%m-%dT%H:%M")
        .to_string()
}
