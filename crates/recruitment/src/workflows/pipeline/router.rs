use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApplicationStatus, Stage};
use super::repository::{ApplicationRepository, CandidateNotifier};
use super::service::{PipelineError, RecruitmentPipeline};
use super::stage::StageActionRequest;
use crate::error::RepositoryError;
use crate::ids::{ApplicationId, UserId, VacancyPeriodId};
use crate::validation::ValidationErrors;
use crate::workflows::{run_blocking, ActingUser, JsonBody, MultipartForm};

/// Router builder exposing application intake and stage review endpoints.
pub fn pipeline_router<R, N>(service: Arc<RecruitmentPipeline<R, N>>) -> Router
where
    R: ApplicationRepository + 'static,
    N: CandidateNotifier + 'static,
{
    Router::new()
        .route("/api/v1/statuses", get(statuses_handler))
        .route("/api/v1/applications", post(apply_handler::<R, N>))
        .route(
            "/api/v1/applications/:application_id",
            get(detail_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/documents",
            post(documents_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/stages/:stage",
            post(stage_action_handler::<R, N>),
        )
        .route(
            "/api/v1/periods/:period_id/applications",
            get(period_applications_handler::<R, N>),
        )
        .route(
            "/api/v1/candidates/:user_id/applications",
            get(user_applications_handler::<R, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApplyRequest {
    pub(crate) vacancy_period_id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatusFilter {
    #[serde(default)]
    pub(crate) status: Option<String>,
}

pub(crate) async fn statuses_handler() -> Response {
    (StatusCode::OK, Json(ApplicationStatus::catalog())).into_response()
}

pub(crate) async fn apply_handler<R, N>(
    State(service): State<Arc<RecruitmentPipeline<R, N>>>,
    ActingUser(user): ActingUser,
    JsonBody(request): JsonBody<ApplyRequest>,
) -> Result<Response, PipelineError>
where
    R: ApplicationRepository + 'static,
    N: CandidateNotifier + 'static,
{
    let detail = run_blocking(move || {
        let application = service.apply(user, VacancyPeriodId(request.vacancy_period_id))?;
        service.detail(application.id)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(detail)).into_response())
}

pub(crate) async fn detail_handler<R, N>(
    State(service): State<Arc<RecruitmentPipeline<R, N>>>,
    Path(application_id): Path<i64>,
) -> Result<Response, PipelineError>
where
    R: ApplicationRepository + 'static,
    N: CandidateNotifier + 'static,
{
    let detail = run_blocking(move || service.detail(ApplicationId(application_id))).await?;
    Ok((StatusCode::OK, Json(detail)).into_response())
}

pub(crate) async fn documents_handler<R, N>(
    State(service): State<Arc<RecruitmentPipeline<R, N>>>,
    Path(application_id): Path<i64>,
    ActingUser(user): ActingUser,
    multipart: Multipart,
) -> Result<Response, PipelineError>
where
    R: ApplicationRepository + 'static,
    N: CandidateNotifier + 'static,
{
    let mut form = MultipartForm::read(multipart).await?;
    let resume = form.take_file("resume");
    let cover_letter = form.take_file("cover_letter");

    let payload = run_blocking(move || {
        let application = service.attach_documents(
            ApplicationId(application_id),
            user,
            resume,
            cover_letter,
        )?;
        let storage = service.storage();
        Ok::<_, PipelineError>(json!({
            "resume_url": application.resume_path.as_deref().map(|path| storage.url(path)),
            "cover_letter_url": application.cover_letter_path.as_deref().map(|path| storage.url(path)),
            "application": application,
        }))
    })
    .await?;
    Ok((StatusCode::OK, Json(payload)).into_response())
}

pub(crate) async fn stage_action_handler<R, N>(
    State(service): State<Arc<RecruitmentPipeline<R, N>>>,
    Path((application_id, stage)): Path<(i64, String)>,
    ActingUser(reviewer): ActingUser,
    JsonBody(request): JsonBody<StageActionRequest>,
) -> Result<Response, PipelineError>
where
    R: ApplicationRepository + 'static,
    N: CandidateNotifier + 'static,
{
    let stage = Stage::from_segment(&stage)
        .ok_or_else(|| PipelineError::NotFound(format!("stage '{stage}'")))?;
    let detail = run_blocking(move || {
        service.act(ApplicationId(application_id), stage, &request, reviewer)
    })
    .await?;
    Ok((StatusCode::OK, Json(detail)).into_response())
}

pub(crate) async fn period_applications_handler<R, N>(
    State(service): State<Arc<RecruitmentPipeline<R, N>>>,
    Path(period_id): Path<i64>,
    Query(filter): Query<StatusFilter>,
) -> Result<Response, PipelineError>
where
    R: ApplicationRepository + 'static,
    N: CandidateNotifier + 'static,
{
    let status = match filter.status.as_deref().filter(|raw| !raw.trim().is_empty()) {
        Some(raw) => Some(ApplicationStatus::from_code(raw).ok_or_else(|| {
            ValidationErrors::single("status", format!("unknown status '{raw}'"))
        })?),
        None => None,
    };
    let applications =
        run_blocking(move || service.list_for_period(VacancyPeriodId(period_id), status)).await?;
    Ok((StatusCode::OK, Json(applications)).into_response())
}

pub(crate) async fn user_applications_handler<R, N>(
    State(service): State<Arc<RecruitmentPipeline<R, N>>>,
    Path(user_id): Path<i64>,
) -> Result<Response, PipelineError>
where
    R: ApplicationRepository + 'static,
    N: CandidateNotifier + 'static,
{
    let applications = run_blocking(move || service.list_for_user(UserId(user_id))).await?;
    Ok((StatusCode::OK, Json(applications)).into_response())
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = match &self {
            PipelineError::Validation(errors) => return errors.clone().into_response(),
            PipelineError::NotFound(_) | PipelineError::Repository(RepositoryError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            PipelineError::Forbidden => StatusCode::FORBIDDEN,
            PipelineError::AlreadyApplied { .. }
            | PipelineError::StageMismatch { .. }
            | PipelineError::Repository(RepositoryError::Conflict(_))
            | PipelineError::Repository(RepositoryError::StaleStatus { .. }) => StatusCode::CONFLICT,
            PipelineError::Repository(RepositoryError::Unavailable(_))
            | PipelineError::Storage(_)
            | PipelineError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "pipeline request failed");
        }
        let payload = json!({ "error": self.to_string() });
        (status, Json(payload)).into_response()
    }
}
