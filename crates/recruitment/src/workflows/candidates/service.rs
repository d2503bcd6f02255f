use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinError;
use tracing::{info, warn};

use super::domain::{CandidateProfile, CandidateResume, Education, Experience, Skill};
use super::repository::{
    CandidateRepository, NewEducation, NewExperience, NewSkill, ProfileFields,
};
use crate::error::RepositoryError;
use crate::export::{CvDocument, ExportError, Renderer};
use crate::ids::{EducationId, ExperienceId, SkillId, UserId};
use crate::storage::{FileStorage, StorageError};
use crate::validation::ValidationErrors;

const CV_DIRECTORY: &str = "cv";
const MAX_GPA: f32 = 4.0;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationRequest {
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub field_of_study: Option<String>,
    #[serde(default)]
    pub start_year: Option<i32>,
    #[serde(default)]
    pub end_year: Option<i32>,
    #[serde(default)]
    pub gpa: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceRequest {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub started_on: Option<String>,
    #[serde(default)]
    pub ended_on: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
}

/// Stored CV file handed back for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvFile {
    pub file_name: String,
    pub path: String,
    pub bytes: Vec<u8>,
}

/// Candidate profiles, CV sections, and the generated CV document.
pub struct CandidateService<P> {
    repository: Arc<P>,
    storage: Arc<dyn FileStorage>,
    renderer: Arc<Renderer>,
}

impl<P> CandidateService<P>
where
    P: CandidateRepository + 'static,
{
    pub fn new(repository: Arc<P>, storage: Arc<dyn FileStorage>, renderer: Arc<Renderer>) -> Self {
        Self {
            repository,
            storage,
            renderer,
        }
    }

    pub fn storage(&self) -> &Arc<dyn FileStorage> {
        &self.storage
    }

    pub fn profile(&self, user: UserId) -> Result<CandidateProfile, CandidateError> {
        self.repository
            .fetch_profile(user)?
            .ok_or_else(|| CandidateError::NotFound(format!("profile of candidate {user}")))
    }

    pub fn upsert_profile(
        &self,
        user: UserId,
        request: &ProfileRequest,
    ) -> Result<CandidateProfile, CandidateError> {
        let mut errors = ValidationErrors::new();
        let full_name = clean(request.full_name.as_deref());
        errors.require_text("full_name", full_name.as_deref(), "full_name is required");
        let email = clean(request.email.as_deref());
        match &email {
            None => errors.add("email", "email is required"),
            Some(email) if !email.contains('@') => errors.add("email", "email must be a valid address"),
            Some(_) => {}
        }
        let birth_date = optional_day("birth_date", request.birth_date.as_deref(), &mut errors);
        if birth_date.is_some_and(|day| day >= Utc::now().date_naive()) {
            errors.add("birth_date", "birth_date must be in the past");
        }
        errors.finish()?;

        let profile = self.repository.upsert_profile(
            user,
            ProfileFields {
                full_name: full_name.unwrap_or_default(),
                email: email.unwrap_or_default(),
                phone: clean(request.phone.as_deref()),
                address: clean(request.address.as_deref()),
                birth_date,
                summary: clean(request.summary.as_deref()),
            },
            Utc::now(),
        )?;
        info!(user_id = %user, "candidate profile saved");
        Ok(profile)
    }

    /// Profile with every CV section.
    pub fn resume(&self, user: UserId) -> Result<CandidateResume, CandidateError> {
        let profile = self.profile(user)?;
        Ok(CandidateResume {
            profile,
            educations: self.repository.educations(user)?,
            experiences: self.repository.experiences(user)?,
            skills: self.repository.skills(user)?,
        })
    }

    pub fn add_education(
        &self,
        user: UserId,
        request: &EducationRequest,
    ) -> Result<Education, CandidateError> {
        let mut errors = ValidationErrors::new();
        let institution = clean(request.institution.as_deref());
        errors.require_text("institution", institution.as_deref(), "institution is required");

        let latest_year = Utc::now().year() + 10;
        match request.start_year {
            None => errors.add("start_year", "start_year is required"),
            Some(year) if !(1900..=latest_year).contains(&year) => {
                errors.add("start_year", format!("start_year must be between 1900 and {latest_year}"))
            }
            Some(_) => {}
        }
        if let (Some(start), Some(end)) = (request.start_year, request.end_year) {
            if end < start {
                errors.add("end_year", "end_year must not be before start_year");
            }
        }
        if let Some(gpa) = request.gpa {
            if !gpa.is_finite() || !(0.0..=MAX_GPA).contains(&gpa) {
                errors.add("gpa", format!("gpa must be between 0 and {MAX_GPA}"));
            }
        }
        errors.finish()?;

        let education = self.repository.add_education(
            user,
            NewEducation {
                institution: institution.unwrap_or_default(),
                degree: clean(request.degree.as_deref()),
                field_of_study: clean(request.field_of_study.as_deref()),
                start_year: request.start_year.unwrap_or_default(),
                end_year: request.end_year,
                gpa: request.gpa,
            },
        )?;
        Ok(education)
    }

    pub fn delete_education(&self, user: UserId, id: EducationId) -> Result<(), CandidateError> {
        if !self.repository.delete_education(user, id)? {
            return Err(CandidateError::NotFound(format!("education {id}")));
        }
        Ok(())
    }

    pub fn add_experience(
        &self,
        user: UserId,
        request: &ExperienceRequest,
    ) -> Result<Experience, CandidateError> {
        let mut errors = ValidationErrors::new();
        let company_name = clean(request.company_name.as_deref());
        errors.require_text("company_name", company_name.as_deref(), "company_name is required");
        let position = clean(request.position.as_deref());
        errors.require_text("position", position.as_deref(), "position is required");

        let started_on = match optional_day("started_on", request.started_on.as_deref(), &mut errors)
        {
            Some(day) => Some(day),
            None if !errors.has("started_on") => {
                errors.add("started_on", "started_on is required");
                None
            }
            None => None,
        };
        let ended_on = optional_day("ended_on", request.ended_on.as_deref(), &mut errors);
        if let (Some(start), Some(end)) = (started_on, ended_on) {
            if end < start {
                errors.add("ended_on", "ended_on must not be before started_on");
            }
        }
        errors.finish()?;
        let Some(started_on) = started_on else {
            return Err(ValidationErrors::single("started_on", "started_on is required").into());
        };

        let experience = self.repository.add_experience(
            user,
            NewExperience {
                company_name: company_name.unwrap_or_default(),
                position: position.unwrap_or_default(),
                started_on,
                ended_on,
                description: clean(request.description.as_deref()),
            },
        )?;
        Ok(experience)
    }

    pub fn delete_experience(&self, user: UserId, id: ExperienceId) -> Result<(), CandidateError> {
        if !self.repository.delete_experience(user, id)? {
            return Err(CandidateError::NotFound(format!("experience {id}")));
        }
        Ok(())
    }

    pub fn add_skill(&self, user: UserId, request: &SkillRequest) -> Result<Skill, CandidateError> {
        let mut errors = ValidationErrors::new();
        let name = clean(request.name.as_deref());
        errors.require_text("name", name.as_deref(), "name is required");
        errors.finish()?;

        let skill = self.repository.add_skill(
            user,
            NewSkill {
                name: name.unwrap_or_default(),
                level: clean(request.level.as_deref()),
            },
        )?;
        Ok(skill)
    }

    pub fn delete_skill(&self, user: UserId, id: SkillId) -> Result<(), CandidateError> {
        if !self.repository.delete_skill(user, id)? {
            return Err(CandidateError::NotFound(format!("skill {id}")));
        }
        Ok(())
    }

    /// Render the CV, store it under `cv/`, and drop the previous file.
    pub fn generate_cv(&self, user: UserId) -> Result<CandidateProfile, CandidateError> {
        let resume = self.resume(user)?;
        let html = self
            .renderer
            .cv(&CvDocument::new(&resume, Utc::now().date_naive()))?;
        let previous = resume.profile.cv_path.clone();

        let path = self
            .storage
            .put(CV_DIRECTORY, &format!("cv-{user}.html"), html.as_bytes())?;
        let profile = match self.repository.set_cv_path(user, Some(path.clone()), Utc::now()) {
            Ok(profile) => profile,
            Err(err) => {
                if let Err(cleanup) = self.storage.delete(&path) {
                    warn!(%path, error = %cleanup, "failed to remove unrecorded cv");
                }
                return Err(err.into());
            }
        };

        if let Some(previous) = previous {
            if let Err(err) = self.storage.delete(&previous) {
                warn!(path = %previous, error = %err, "failed to remove previous cv");
            }
        }
        info!(user_id = %user, %path, "cv generated");
        Ok(profile)
    }

    pub fn download_cv(&self, user: UserId) -> Result<CvFile, CandidateError> {
        let profile = self.profile(user)?;
        let path = profile
            .cv_path
            .ok_or_else(|| CandidateError::NotFound(format!("cv of candidate {user}")))?;
        let bytes = self.storage.read(&path).map_err(|err| match err {
            StorageError::NotFound(_) => CandidateError::NotFound(format!("cv of candidate {user}")),
            other => CandidateError::Storage(other),
        })?;
        Ok(CvFile {
            file_name: format!("cv-{}.html", slug(&profile.full_name)),
            path,
            bytes,
        })
    }
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn optional_day(field: &str, raw: Option<&str>, errors: &mut ValidationErrors) -> Option<NaiveDate> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty())?;
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(day) => Some(day),
        Err(_) => {
            errors.add(field, format!("{field} must be a date formatted YYYY-MM-DD"));
            None
        }
    }
}

fn slug(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch.to_ascii_lowercase() } else { '-' })
        .collect();
    let slug = slug
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "candidate".to_string()
    } else {
        slug
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CandidateError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("candidate task failed: {0}")]
    Worker(#[from] JoinError),
}
