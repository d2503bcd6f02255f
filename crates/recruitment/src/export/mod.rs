//! Printable exports: candidate dossier, psychotest answer sheet, CV, and
//! the per-period applicant CSV.

pub mod documents;
pub mod report;
pub mod router;
pub mod service;
pub mod templates;

use tokio::task::JoinError;

use crate::error::RepositoryError;

pub use documents::{AnswerSheetDocument, CandidateSection, CvDocument, DossierDocument};
pub use report::{write_report, ReportRow};
pub use router::export_router;
pub use service::ExportService;
pub use templates::Renderer;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("report error: {0}")]
    Report(String),
    #[error("export task failed: {0}")]
    Worker(#[from] JoinError),
}
