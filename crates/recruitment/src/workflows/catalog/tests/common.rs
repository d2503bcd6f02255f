use std::sync::Arc;

use crate::storage::{FileStorage, LocalDiskStorage, Upload};
use crate::store::SqliteStore;
use crate::workflows::catalog::{catalog_router, CatalogService, CompanyInput, Company};

pub(super) struct Fixture {
    pub(super) service: Arc<CatalogService<SqliteStore>>,
    pub(super) store: Arc<SqliteStore>,
    pub(super) storage: Arc<LocalDiskStorage>,
    _storage_dir: tempfile::TempDir,
}

impl Fixture {
    pub(super) fn router(&self) -> axum::Router {
        catalog_router(self.service.clone())
    }

    pub(super) fn company(&self, name: &str) -> Company {
        self.service
            .create_company(&company_input(name), None)
            .expect("company created")
    }
}

pub(super) fn build_service() -> Fixture {
    let store = Arc::new(SqliteStore::open_in_memory().expect("in-memory store"));
    let dir = tempfile::tempdir().expect("temp dir");
    let storage = Arc::new(LocalDiskStorage::new(dir.path(), "/storage"));
    let shared: Arc<dyn FileStorage> = storage.clone();
    let service = Arc::new(CatalogService::new(store.clone(), shared));
    Fixture {
        service,
        store,
        storage,
        _storage_dir: dir,
    }
}

pub(super) fn company_input(name: &str) -> CompanyInput {
    CompanyInput {
        name: Some(name.to_string()),
        email: Some("hr@acme.test".to_string()),
        phone: Some("+62 21 555 0101".to_string()),
        address: Some("Jl. Sudirman 1, Jakarta".to_string()),
        description: None,
    }
}

pub(super) fn png(name: &str) -> Upload {
    Upload::new(name, b"\x89PNG\r\n\x1a\nlogo".to_vec())
}
