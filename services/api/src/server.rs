use crate::cli::ServeArgs;
use crate::infra::{AppState, Services};
use crate::routes::with_recruitment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use recruitment::config::AppConfig;
use recruitment::error::AppError;
use recruitment::storage::{FileStorage, LocalDiskStorage};
use recruitment::store::SqliteStore;
use recruitment::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let store = Arc::new(SqliteStore::open(&config.database.path)?);
    std::fs::create_dir_all(&config.storage.root)?;
    let storage: Arc<dyn FileStorage> = Arc::new(LocalDiskStorage::new(
        config.storage.root.clone(),
        config.storage.public_url.clone(),
    ));
    let services = Services::build(store.clone(), storage.clone())?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        store,
        storage,
    };

    let app = with_recruitment_routes(&services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        database = %config.database.path.display(),
        storage = %config.storage.root.display(),
        "recruitment admin ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
