use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::service::ExportService;
use super::ExportError;
use crate::error::RepositoryError;
use crate::ids::{ApplicationId, UserId, VacancyPeriodId};
use crate::workflows::assessment::QuestionBank;
use crate::workflows::candidates::CandidateRepository;
use crate::workflows::catalog::CatalogRepository;
use crate::workflows::pipeline::ApplicationRepository;
use crate::workflows::run_blocking;

pub fn export_router<S>(service: Arc<ExportService<S>>) -> Router
where
    S: ApplicationRepository + CatalogRepository + CandidateRepository + QuestionBank + 'static,
{
    Router::new()
        .route(
            "/api/v1/applications/:application_id/dossier",
            get(dossier_handler::<S>),
        )
        .route(
            "/api/v1/applications/:application_id/answer-sheet",
            get(answer_sheet_handler::<S>),
        )
        .route(
            "/api/v1/periods/:period_id/report.csv",
            get(period_report_handler::<S>),
        )
        .route(
            "/api/v1/candidates/:user_id/cv/preview",
            get(cv_preview_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn dossier_handler<S>(
    State(service): State<Arc<ExportService<S>>>,
    Path(application_id): Path<i64>,
) -> Result<Response, ExportError>
where
    S: ApplicationRepository + CatalogRepository + CandidateRepository + QuestionBank + 'static,
{
    let html = run_blocking(move || service.dossier(ApplicationId(application_id))).await?;
    Ok(Html(html).into_response())
}

pub(crate) async fn answer_sheet_handler<S>(
    State(service): State<Arc<ExportService<S>>>,
    Path(application_id): Path<i64>,
) -> Result<Response, ExportError>
where
    S: ApplicationRepository + CatalogRepository + CandidateRepository + QuestionBank + 'static,
{
    let html = run_blocking(move || service.answer_sheet(ApplicationId(application_id))).await?;
    Ok(Html(html).into_response())
}

pub(crate) async fn period_report_handler<S>(
    State(service): State<Arc<ExportService<S>>>,
    Path(period_id): Path<i64>,
) -> Result<Response, ExportError>
where
    S: ApplicationRepository + CatalogRepository + CandidateRepository + QuestionBank + 'static,
{
    let csv = run_blocking(move || service.period_report_csv(VacancyPeriodId(period_id))).await?;
    let disposition = format!("attachment; filename=\"period-{period_id}-applicants.csv\"");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

pub(crate) async fn cv_preview_handler<S>(
    State(service): State<Arc<ExportService<S>>>,
    Path(user_id): Path<i64>,
) -> Result<Response, ExportError>
where
    S: ApplicationRepository + CatalogRepository + CandidateRepository + QuestionBank + 'static,
{
    let html = run_blocking(move || service.cv(UserId(user_id))).await?;
    Ok(Html(html).into_response())
}

impl IntoResponse for ExportError {
    fn into_response(self) -> Response {
        let status = match &self {
            ExportError::NotFound(_) | ExportError::Repository(RepositoryError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "export failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
