use std::sync::Arc;

use crate::export::Renderer;
use crate::ids::UserId;
use crate::storage::{FileStorage, LocalDiskStorage};
use crate::store::SqliteStore;
use crate::workflows::candidates::{candidates_router, CandidateService, ProfileRequest};

pub(super) const CANDIDATE: UserId = UserId(21);

pub(super) struct Fixture {
    pub(super) service: Arc<CandidateService<SqliteStore>>,
    pub(super) storage: Arc<LocalDiskStorage>,
    _storage_dir: tempfile::TempDir,
}

impl Fixture {
    pub(super) fn router(&self) -> axum::Router {
        candidates_router(self.service.clone())
    }

    pub(super) fn with_profile(self) -> Self {
        self.service
            .upsert_profile(CANDIDATE, &profile_request())
            .expect("profile saved");
        self
    }
}

pub(super) fn build_service() -> Fixture {
    let store = Arc::new(SqliteStore::open_in_memory().expect("in-memory store"));
    let dir = tempfile::tempdir().expect("temp dir");
    let storage = Arc::new(LocalDiskStorage::new(dir.path(), "/storage"));
    let shared: Arc<dyn FileStorage> = storage.clone();
    let renderer = Arc::new(Renderer::new().expect("templates compile"));
    Fixture {
        service: Arc::new(CandidateService::new(store, shared, renderer)),
        storage,
        _storage_dir: dir,
    }
}

pub(super) fn profile_request() -> ProfileRequest {
    ProfileRequest {
        full_name: Some("Rina Lubis".to_string()),
        email: Some("rina@example.test".to_string()),
        phone: Some("0812 0000 1111".to_string()),
        address: None,
        birth_date: Some("1996-08-17".to_string()),
        summary: Some("Backend developer who enjoys <b>tidy</b> schemas.".to_string()),
    }
}
