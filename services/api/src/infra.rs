use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use recruitment::error::AppError;
use recruitment::export::{ExportService, Renderer};
use recruitment::storage::FileStorage;
use recruitment::store::SqliteStore;
use recruitment::workflows::assessment::AssessmentService;
use recruitment::workflows::candidates::CandidateService;
use recruitment::workflows::catalog::CatalogService;
use recruitment::workflows::pipeline::{RecruitmentPipeline, TracingNotifier};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) store: Arc<SqliteStore>,
    pub(crate) storage: Arc<dyn FileStorage>,
}

/// Every workflow service, built over one store and one file storage.
pub(crate) struct Services {
    pub(crate) pipeline: Arc<RecruitmentPipeline<SqliteStore, TracingNotifier>>,
    pub(crate) assessment: Arc<AssessmentService<SqliteStore>>,
    pub(crate) catalog: Arc<CatalogService<SqliteStore>>,
    pub(crate) candidates: Arc<CandidateService<SqliteStore>>,
    pub(crate) export: Arc<ExportService<SqliteStore>>,
}

impl Services {
    pub(crate) fn build(
        store: Arc<SqliteStore>,
        storage: Arc<dyn FileStorage>,
    ) -> Result<Self, AppError> {
        let renderer = Arc::new(Renderer::new()?);
        Ok(Self {
            pipeline: Arc::new(RecruitmentPipeline::new(
                store.clone(),
                Arc::new(TracingNotifier),
                storage.clone(),
            )),
            assessment: Arc::new(AssessmentService::new(store.clone())),
            catalog: Arc::new(CatalogService::new(store.clone(), storage.clone())),
            candidates: Arc::new(CandidateService::new(
                store.clone(),
                storage.clone(),
                renderer.clone(),
            )),
            export: Arc::new(ExportService::new(store, renderer, storage)),
        })
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
