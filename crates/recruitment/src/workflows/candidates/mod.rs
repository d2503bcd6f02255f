//! Candidate profile, CV sections, and generated CV documents.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{CandidateProfile, CandidateResume, Education, Experience, Skill};
pub use repository::{CandidateRepository, NewEducation, NewExperience, NewSkill, ProfileFields};
pub use router::candidates_router;
pub use service::{
    CandidateError, CandidateService, CvFile, EducationRequest, ExperienceRequest,
    ProfileRequest, SkillRequest,
};
