use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::repository::CatalogRepository;
use super::service::{
    AboutInput, CatalogError, CatalogService, CompanyInput, PeriodRequest, VacancyRequest,
};
use crate::error::RepositoryError;
use crate::ids::{CompanyId, VacancyId, VacancyPeriodId};
use crate::workflows::{run_blocking, JsonBody, MultipartForm};

/// Router builder for the HR catalog.
pub fn catalog_router<C>(service: Arc<CatalogService<C>>) -> Router
where
    C: CatalogRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/companies",
            post(create_company_handler::<C>).get(list_companies_handler::<C>),
        )
        .route(
            "/api/v1/companies/:company_id",
            get(company_handler::<C>)
                .post(update_company_handler::<C>)
                .delete(delete_company_handler::<C>),
        )
        .route(
            "/api/v1/companies/:company_id/about",
            get(about_handler::<C>).post(upsert_about_handler::<C>),
        )
        .route(
            "/api/v1/vacancies",
            post(create_vacancy_handler::<C>).get(list_vacancies_handler::<C>),
        )
        .route(
            "/api/v1/vacancies/:vacancy_id",
            get(vacancy_handler::<C>)
                .put(update_vacancy_handler::<C>)
                .delete(delete_vacancy_handler::<C>),
        )
        .route(
            "/api/v1/vacancies/:vacancy_id/periods",
            post(create_period_handler::<C>).get(list_periods_handler::<C>),
        )
        .route("/api/v1/periods/open", get(open_periods_handler::<C>))
        .route(
            "/api/v1/periods/:period_id",
            get(period_handler::<C>).delete(delete_period_handler::<C>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CompanyFilter {
    #[serde(default)]
    pub(crate) company_id: Option<i64>,
}

fn with_logo_url<C>(
    service: &CatalogService<C>,
    value: serde_json::Value,
    logo: Option<&str>,
) -> serde_json::Value
where
    C: CatalogRepository + 'static,
{
    let url = logo.map(|path| service.storage().url(path));
    match value {
        serde_json::Value::Object(mut map) => {
            map.insert("logo_url".to_string(), json!(url));
            serde_json::Value::Object(map)
        }
        other => other,
    }
}

pub(crate) async fn create_company_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    multipart: Multipart,
) -> Result<Response, CatalogError>
where
    C: CatalogRepository + 'static,
{
    let mut form = MultipartForm::read(multipart).await?;
    let logo = form.take_file("logo");
    let input = CompanyInput::from_form(&form);
    let body = run_blocking(move || {
        let company = service.create_company(&input, logo)?;
        Ok::<_, CatalogError>(with_logo_url(
            &service,
            json!(company),
            company.logo_path.as_deref(),
        ))
    })
    .await?;
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

pub(crate) async fn update_company_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Path(company_id): Path<i64>,
    multipart: Multipart,
) -> Result<Response, CatalogError>
where
    C: CatalogRepository + 'static,
{
    let mut form = MultipartForm::read(multipart).await?;
    let logo = form.take_file("logo");
    let input = CompanyInput::from_form(&form);
    let body = run_blocking(move || {
        let company = service.update_company(CompanyId(company_id), &input, logo)?;
        Ok::<_, CatalogError>(with_logo_url(
            &service,
            json!(company),
            company.logo_path.as_deref(),
        ))
    })
    .await?;
    Ok(Json(body).into_response())
}

pub(crate) async fn list_companies_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
) -> Result<Response, CatalogError>
where
    C: CatalogRepository + 'static,
{
    let companies = run_blocking(move || {
        let companies: Vec<_> = service
            .list_companies()?
            .into_iter()
            .map(|company| {
                let logo = company.logo_path.clone();
                with_logo_url(&service, json!(company), logo.as_deref())
            })
            .collect();
        Ok::<_, CatalogError>(companies)
    })
    .await?;
    Ok(Json(companies).into_response())
}

pub(crate) async fn company_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Path(company_id): Path<i64>,
) -> Result<Response, CatalogError>
where
    C: CatalogRepository + 'static,
{
    let body = run_blocking(move || {
        let company = service.company(CompanyId(company_id))?;
        Ok::<_, CatalogError>(with_logo_url(
            &service,
            json!(company),
            company.logo_path.as_deref(),
        ))
    })
    .await?;
    Ok(Json(body).into_response())
}

pub(crate) async fn delete_company_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Path(company_id): Path<i64>,
) -> Result<Response, CatalogError>
where
    C: CatalogRepository + 'static,
{
    run_blocking(move || service.delete_company(CompanyId(company_id))).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn about_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Path(company_id): Path<i64>,
) -> Result<Response, CatalogError>
where
    C: CatalogRepository + 'static,
{
    let body = run_blocking(move || {
        let about = service.about(CompanyId(company_id))?;
        Ok::<_, CatalogError>(with_logo_url(
            &service,
            json!(about),
            about.logo_path.as_deref(),
        ))
    })
    .await?;
    Ok(Json(body).into_response())
}

pub(crate) async fn upsert_about_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Path(company_id): Path<i64>,
    multipart: Multipart,
) -> Result<Response, CatalogError>
where
    C: CatalogRepository + 'static,
{
    let mut form = MultipartForm::read(multipart).await?;
    let logo = form.take_file("logo");
    let input = AboutInput::from_form(&form);
    let body = run_blocking(move || {
        let about = service.upsert_about(CompanyId(company_id), &input, logo)?;
        Ok::<_, CatalogError>(with_logo_url(
            &service,
            json!(about),
            about.logo_path.as_deref(),
        ))
    })
    .await?;
    Ok(Json(body).into_response())
}

pub(crate) async fn create_vacancy_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    JsonBody(request): JsonBody<VacancyRequest>,
) -> Result<Response, CatalogError>
where
    C: CatalogRepository + 'static,
{
    let vacancy = run_blocking(move || service.create_vacancy(&request)).await?;
    Ok((StatusCode::CREATED, Json(vacancy)).into_response())
}

pub(crate) async fn list_vacancies_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Query(filter): Query<CompanyFilter>,
) -> Result<Response, CatalogError>
where
    C: CatalogRepository + 'static,
{
    let vacancies =
        run_blocking(move || service.list_vacancies(filter.company_id.map(CompanyId))).await?;
    Ok(Json(vacancies).into_response())
}

pub(crate) async fn vacancy_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Path(vacancy_id): Path<i64>,
) -> Result<Response, CatalogError>
where
    C: CatalogRepository + 'static,
{
    let vacancy = run_blocking(move || service.vacancy(VacancyId(vacancy_id))).await?;
    Ok(Json(vacancy).into_response())
}

pub(crate) async fn update_vacancy_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Path(vacancy_id): Path<i64>,
    JsonBody(request): JsonBody<VacancyRequest>,
) -> Result<Response, CatalogError>
where
    C: CatalogRepository + 'static,
{
    let vacancy =
        run_blocking(move || service.update_vacancy(VacancyId(vacancy_id), &request)).await?;
    Ok(Json(vacancy).into_response())
}

pub(crate) async fn delete_vacancy_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Path(vacancy_id): Path<i64>,
) -> Result<Response, CatalogError>
where
    C: CatalogRepository + 'static,
{
    run_blocking(move || service.delete_vacancy(VacancyId(vacancy_id))).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn create_period_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Path(vacancy_id): Path<i64>,
    JsonBody(request): JsonBody<PeriodRequest>,
) -> Result<Response, CatalogError>
where
    C: CatalogRepository + 'static,
{
    let period =
        run_blocking(move || service.create_period(VacancyId(vacancy_id), &request)).await?;
    Ok((StatusCode::CREATED, Json(period)).into_response())
}

pub(crate) async fn list_periods_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Path(vacancy_id): Path<i64>,
) -> Result<Response, CatalogError>
where
    C: CatalogRepository + 'static,
{
    let periods = run_blocking(move || service.list_periods(VacancyId(vacancy_id))).await?;
    Ok(Json(periods).into_response())
}

pub(crate) async fn open_periods_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
) -> Result<Response, CatalogError>
where
    C: CatalogRepository + 'static,
{
    let today = Utc::now().date_naive();
    let positions = run_blocking(move || service.open_positions(today)).await?;
    Ok(Json(positions).into_response())
}

pub(crate) async fn period_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Path(period_id): Path<i64>,
) -> Result<Response, CatalogError>
where
    C: CatalogRepository + 'static,
{
    let period = run_blocking(move || service.period(VacancyPeriodId(period_id))).await?;
    Ok(Json(period).into_response())
}

pub(crate) async fn delete_period_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Path(period_id): Path<i64>,
) -> Result<Response, CatalogError>
where
    C: CatalogRepository + 'static,
{
    run_blocking(move || service.delete_period(VacancyPeriodId(period_id))).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = match &self {
            CatalogError::Validation(errors) => return errors.clone().into_response(),
            CatalogError::NotFound(_) | CatalogError::Repository(RepositoryError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            CatalogError::Repository(RepositoryError::Conflict(_))
            | CatalogError::Repository(RepositoryError::StaleStatus { .. }) => StatusCode::CONFLICT,
            CatalogError::Repository(RepositoryError::Unavailable(_))
            | CatalogError::Storage(_)
            | CatalogError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "catalog request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
