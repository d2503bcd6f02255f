use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;

use super::repository::CandidateRepository;
use super::service::{
    CandidateError, CandidateService, EducationRequest, ExperienceRequest, ProfileRequest,
    SkillRequest,
};
use crate::error::RepositoryError;
use crate::ids::{EducationId, ExperienceId, SkillId, UserId};
use crate::workflows::{run_blocking, JsonBody};

/// Router builder for candidate profiles and CVs.
pub fn candidates_router<P>(service: Arc<CandidateService<P>>) -> Router
where
    P: CandidateRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/candidates/:user_id/profile",
            get(profile_handler::<P>).put(upsert_profile_handler::<P>),
        )
        .route("/api/v1/candidates/:user_id/resume", get(resume_handler::<P>))
        .route(
            "/api/v1/candidates/:user_id/educations",
            post(add_education_handler::<P>),
        )
        .route(
            "/api/v1/candidates/:user_id/educations/:education_id",
            delete(delete_education_handler::<P>),
        )
        .route(
            "/api/v1/candidates/:user_id/experiences",
            post(add_experience_handler::<P>),
        )
        .route(
            "/api/v1/candidates/:user_id/experiences/:experience_id",
            delete(delete_experience_handler::<P>),
        )
        .route(
            "/api/v1/candidates/:user_id/skills",
            post(add_skill_handler::<P>),
        )
        .route(
            "/api/v1/candidates/:user_id/skills/:skill_id",
            delete(delete_skill_handler::<P>),
        )
        .route(
            "/api/v1/candidates/:user_id/cv",
            post(generate_cv_handler::<P>).get(download_cv_handler::<P>),
        )
        .with_state(service)
}

pub(crate) async fn profile_handler<P>(
    State(service): State<Arc<CandidateService<P>>>,
    Path(user_id): Path<i64>,
) -> Result<Response, CandidateError>
where
    P: CandidateRepository + 'static,
{
    let body = run_blocking(move || {
        let profile = service.profile(UserId(user_id))?;
        let cv_url = profile.cv_path.as_deref().map(|path| service.storage().url(path));
        Ok::<_, CandidateError>(json!({ "profile": profile, "cv_url": cv_url }))
    })
    .await?;
    Ok(Json(body).into_response())
}

pub(crate) async fn upsert_profile_handler<P>(
    State(service): State<Arc<CandidateService<P>>>,
    Path(user_id): Path<i64>,
    JsonBody(request): JsonBody<ProfileRequest>,
) -> Result<Response, CandidateError>
where
    P: CandidateRepository + 'static,
{
    let profile = run_blocking(move || service.upsert_profile(UserId(user_id), &request)).await?;
    Ok(Json(profile).into_response())
}

pub(crate) async fn resume_handler<P>(
    State(service): State<Arc<CandidateService<P>>>,
    Path(user_id): Path<i64>,
) -> Result<Response, CandidateError>
where
    P: CandidateRepository + 'static,
{
    let resume = run_blocking(move || service.resume(UserId(user_id))).await?;
    Ok(Json(resume).into_response())
}

pub(crate) async fn add_education_handler<P>(
    State(service): State<Arc<CandidateService<P>>>,
    Path(user_id): Path<i64>,
    JsonBody(request): JsonBody<EducationRequest>,
) -> Result<Response, CandidateError>
where
    P: CandidateRepository + 'static,
{
    let education =
        run_blocking(move || service.add_education(UserId(user_id), &request)).await?;
    Ok((StatusCode::CREATED, Json(education)).into_response())
}

pub(crate) async fn delete_education_handler<P>(
    State(service): State<Arc<CandidateService<P>>>,
    Path((user_id, education_id)): Path<(i64, i64)>,
) -> Result<Response, CandidateError>
where
    P: CandidateRepository + 'static,
{
    run_blocking(move || service.delete_education(UserId(user_id), EducationId(education_id)))
        .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn add_experience_handler<P>(
    State(service): State<Arc<CandidateService<P>>>,
    Path(user_id): Path<i64>,
    JsonBody(request): JsonBody<ExperienceRequest>,
) -> Result<Response, CandidateError>
where
    P: CandidateRepository + 'static,
{
    let experience =
        run_blocking(move || service.add_experience(UserId(user_id), &request)).await?;
    Ok((StatusCode::CREATED, Json(experience)).into_response())
}

pub(crate) async fn delete_experience_handler<P>(
    State(service): State<Arc<CandidateService<P>>>,
    Path((user_id, experience_id)): Path<(i64, i64)>,
) -> Result<Response, CandidateError>
where
    P: CandidateRepository + 'static,
{
    run_blocking(move || {
        service.delete_experience(UserId(user_id), ExperienceId(experience_id))
    })
    .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn add_skill_handler<P>(
    State(service): State<Arc<CandidateService<P>>>,
    Path(user_id): Path<i64>,
    JsonBody(request): JsonBody<SkillRequest>,
) -> Result<Response, CandidateError>
where
    P: CandidateRepository + 'static,
{
    let skill = run_blocking(move || service.add_skill(UserId(user_id), &request)).await?;
    Ok((StatusCode::CREATED, Json(skill)).into_response())
}

pub(crate) async fn delete_skill_handler<P>(
    State(service): State<Arc<CandidateService<P>>>,
    Path((user_id, skill_id)): Path<(i64, i64)>,
) -> Result<Response, CandidateError>
where
    P: CandidateRepository + 'static,
{
    run_blocking(move || service.delete_skill(UserId(user_id), SkillId(skill_id))).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn generate_cv_handler<P>(
    State(service): State<Arc<CandidateService<P>>>,
    Path(user_id): Path<i64>,
) -> Result<Response, CandidateError>
where
    P: CandidateRepository + 'static,
{
    let body = run_blocking(move || {
        let profile = service.generate_cv(UserId(user_id))?;
        let cv_url = profile.cv_path.as_deref().map(|path| service.storage().url(path));
        Ok::<_, CandidateError>(json!({ "profile": profile, "cv_url": cv_url }))
    })
    .await?;
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

pub(crate) async fn download_cv_handler<P>(
    State(service): State<Arc<CandidateService<P>>>,
    Path(user_id): Path<i64>,
) -> Result<Response, CandidateError>
where
    P: CandidateRepository + 'static,
{
    let cv = run_blocking(move || service.download_cv(UserId(user_id))).await?;
    let disposition = format!("attachment; filename=\"{}\"", cv.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        cv.bytes,
    )
        .into_response())
}

impl IntoResponse for CandidateError {
    fn into_response(self) -> Response {
        let status = match &self {
            CandidateError::Validation(errors) => return errors.clone().into_response(),
            CandidateError::NotFound(_)
            | CandidateError::Repository(RepositoryError::NotFound(_)) => StatusCode::NOT_FOUND,
            CandidateError::Repository(RepositoryError::Conflict(_))
            | CandidateError::Repository(RepositoryError::StaleStatus { .. }) => {
                StatusCode::CONFLICT
            }
            CandidateError::Repository(RepositoryError::Unavailable(_))
            | CandidateError::Storage(_)
            | CandidateError::Export(_)
            | CandidateError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "candidate request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
