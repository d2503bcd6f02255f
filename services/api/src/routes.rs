use crate::infra::{AppState, Services};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use recruitment::export::export_router;
use recruitment::storage::{content_type, StorageError};
use recruitment::workflows::assessment::assessment_router;
use recruitment::workflows::candidates::candidates_router;
use recruitment::workflows::catalog::catalog_router;
use recruitment::workflows::pipeline::pipeline_router;
use serde_json::json;
use std::sync::atomic::Ordering;

pub(crate) fn with_recruitment_routes(services: &Services) -> Router {
    Router::new()
        .merge(pipeline_router(services.pipeline.clone()))
        .merge(assessment_router(services.assessment.clone()))
        .merge(catalog_router(services.catalog.clone()))
        .merge(candidates_router(services.candidates.clone()))
        .merge(export_router(services.export.clone()))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/storage/*path", get(storage_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let started = state.readiness.load(Ordering::Relaxed);
    let store = state.store.clone();
    let database = match tokio::task::spawn_blocking(move || store.ping()).await {
        Ok(Ok(())) => true,
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "database ping failed");
            false
        }
        Err(err) => {
            tracing::warn!(error = %err, "database ping task failed");
            false
        }
    };

    if started && database {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else if started {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "database unavailable" })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        )
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Serves uploaded logos, application documents, and generated CVs.
pub(crate) async fn storage_endpoint(
    Extension(state): Extension<AppState>,
    Path(path): Path<String>,
) -> Response {
    let storage = state.storage.clone();
    let requested = path.clone();
    let read = match tokio::task::spawn_blocking(move || storage.read(&requested)).await {
        Ok(read) => read,
        Err(err) => {
            tracing::error!(%path, error = %err, "stored file read task failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response();
        }
    };

    match read {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type(&path))],
            bytes,
        )
            .into_response(),
        Err(StorageError::NotFound(_) | StorageError::InvalidPath(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("stored file '{path}' not found") })),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(%path, error = %err, "stored file could not be read");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}
