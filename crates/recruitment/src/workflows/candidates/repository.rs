use chrono::{DateTime, NaiveDate, Utc};

use super::domain::{CandidateProfile, Education, Experience, Skill};
use crate::error::RepositoryError;
use crate::ids::{EducationId, ExperienceId, SkillId, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFields {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEducation {
    pub institution: String,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub start_year: i32,
    pub end_year: Option<i32>,
    pub gpa: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExperience {
    pub company_name: String,
    pub position: String,
    pub started_on: NaiveDate,
    pub ended_on: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSkill {
    pub name: String,
    pub level: Option<String>,
}

/// Storage port for candidate profiles and their CV sections.
///
/// Section deletes are scoped to `user` and return `false` when nothing matched.
pub trait CandidateRepository: Send + Sync {
    fn fetch_profile(&self, user: UserId) -> Result<Option<CandidateProfile>, RepositoryError>;

    fn upsert_profile(
        &self,
        user: UserId,
        fields: ProfileFields,
        at: DateTime<Utc>,
    ) -> Result<CandidateProfile, RepositoryError>;

    fn set_cv_path(
        &self,
        user: UserId,
        cv_path: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<CandidateProfile, RepositoryError>;

    fn educations(&self, user: UserId) -> Result<Vec<Education>, RepositoryError>;

    fn add_education(
        &self,
        user: UserId,
        education: NewEducation,
    ) -> Result<Education, RepositoryError>;

    fn delete_education(&self, user: UserId, id: EducationId) -> Result<bool, RepositoryError>;

    fn experiences(&self, user: UserId) -> Result<Vec<Experience>, RepositoryError>;

    fn add_experience(
        &self,
        user: UserId,
        experience: NewExperience,
    ) -> Result<Experience, RepositoryError>;

    fn delete_experience(&self, user: UserId, id: ExperienceId) -> Result<bool, RepositoryError>;

    fn skills(&self, user: UserId) -> Result<Vec<Skill>, RepositoryError>;

    fn add_skill(&self, user: UserId, skill: NewSkill) -> Result<Skill, RepositoryError>;

    fn delete_skill(&self, user: UserId, id: SkillId) -> Result<bool, RepositoryError>;
}
