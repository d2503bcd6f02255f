use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{EducationId, ExperienceId, SkillId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub user_id: UserId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub summary: Option<String>,
    pub cv_path: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub id: EducationId,
    pub user_id: UserId,
    pub institution: String,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub start_year: i32,
    pub end_year: Option<i32>,
    pub gpa: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub id: ExperienceId,
    pub user_id: UserId,
    pub company_name: String,
    pub position: String,
    pub started_on: NaiveDate,
    pub ended_on: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub user_id: UserId,
    pub name: String,
    pub level: Option<String>,
}

/// Everything a CV or dossier shows about a candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateResume {
    pub profile: CandidateProfile,
    pub educations: Vec<Education>,
    pub experiences: Vec<Experience>,
    pub skills: Vec<Skill>,
}
