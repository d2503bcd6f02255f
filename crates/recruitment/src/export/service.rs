use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::documents::{AnswerSheetDocument, CvDocument, DossierDocument, Position};
use super::report::{write_report, ReportRow};
use super::templates::Renderer;
use super::ExportError;
use crate::ids::{ApplicationId, UserId, VacancyPeriodId};
use crate::storage::FileStorage;
use crate::workflows::assessment::{sheet_for, AssessmentError, QuestionBank};
use crate::workflows::candidates::{CandidateRepository, CandidateResume};
use crate::workflows::catalog::CatalogRepository;
use crate::workflows::pipeline::ApplicationRepository;

/// Read-only view over the whole store that renders printable documents.
pub struct ExportService<S> {
    store: Arc<S>,
    renderer: Arc<Renderer>,
    storage: Arc<dyn FileStorage>,
}

impl<S> ExportService<S>
where
    S: ApplicationRepository + CatalogRepository + CandidateRepository + QuestionBank + 'static,
{
    pub fn new(store: Arc<S>, renderer: Arc<Renderer>, storage: Arc<dyn FileStorage>) -> Self {
        Self {
            store,
            renderer,
            storage,
        }
    }

    pub fn dossier(&self, id: ApplicationId) -> Result<String, ExportError> {
        let application = ApplicationRepository::fetch(&*self.store, id)?
            .ok_or_else(|| ExportError::NotFound(format!("application {id}")))?;
        let history = self.store.history(id)?;

        let period = self.store.fetch_period(application.vacancy_period_id)?;
        let vacancy = match &period {
            Some(period) => self.store.fetch_vacancy(period.vacancy_id)?,
            None => None,
        };
        let company = match &vacancy {
            Some(vacancy) => self.store.fetch_company(vacancy.company_id)?,
            None => None,
        };
        let resume = self.resume_of(application.user_id)?;

        let document = DossierDocument::new(
            &application,
            Position {
                company: company.as_ref(),
                vacancy: vacancy.as_ref(),
                period: period.as_ref(),
            },
            resume.as_ref(),
            &history,
            |path| self.storage.url(path),
            Utc::now().date_naive(),
        );
        let html = self.renderer.dossier(&document)?;
        info!(application_id = %id, "dossier rendered");
        Ok(html)
    }

    pub fn answer_sheet(&self, id: ApplicationId) -> Result<String, ExportError> {
        let context = self
            .store
            .application_context(id)?
            .ok_or_else(|| ExportError::NotFound(format!("application {id}")))?;
        let sheet = sheet_for(&*self.store, &context).map_err(|err| match err {
            AssessmentError::Repository(err) => ExportError::Repository(err),
            other => ExportError::Report(other.to_string()),
        })?;
        let profile = self.store.fetch_profile(context.user_id)?;

        let document = AnswerSheetDocument::new(
            &sheet,
            profile.as_ref().map(|profile| profile.full_name.as_str()),
            Utc::now().date_naive(),
        );
        Ok(self.renderer.answer_sheet(&document)?)
    }

    pub fn cv(&self, user: UserId) -> Result<String, ExportError> {
        let resume = self
            .resume_of(user)?
            .ok_or_else(|| ExportError::NotFound(format!("profile of candidate {user}")))?;
        self.renderer
            .cv(&CvDocument::new(&resume, Utc::now().date_naive()))
    }

    /// Applicants of `period` as CSV, oldest application first.
    pub fn period_report_csv(&self, period: VacancyPeriodId) -> Result<String, ExportError> {
        if self.store.fetch_period(period)?.is_none() {
            return Err(ExportError::NotFound(format!("vacancy period {period}")));
        }

        let applications = self.store.list_for_period(period, None)?;
        let mut rows = Vec::with_capacity(applications.len());
        for application in &applications {
            let profile = self.store.fetch_profile(application.user_id)?;
            let history = self.store.history(application.id)?;
            rows.push(ReportRow::new(
                application,
                profile
                    .as_ref()
                    .map(|profile| (profile.full_name.as_str(), profile.email.as_str())),
                &history,
            ));
        }

        let csv = write_report(&rows)?;
        info!(vacancy_period_id = %period, rows = rows.len(), "period report exported");
        Ok(csv)
    }

    fn resume_of(&self, user: UserId) -> Result<Option<CandidateResume>, ExportError> {
        let Some(profile) = self.store.fetch_profile(user)? else {
            return Ok(None);
        };
        Ok(Some(CandidateResume {
            profile,
            educations: self.store.educations(user)?,
            experiences: self.store.experiences(user)?,
            skills: self.store.skills(user)?,
        }))
    }
}
