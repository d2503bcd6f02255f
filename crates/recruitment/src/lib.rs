//! E-recruitment administration: candidate pipeline, assessments, HR catalog,
//! candidate profiles, document storage, and exports.

pub mod config;
pub mod error;
pub mod export;
pub mod ids;
pub mod storage;
pub mod store;
pub mod telemetry;
pub mod validation;
pub mod workflows;
