//! Application intake and the staged review workflow
//! (administrative selection, psychotest, interview, final decision).

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod stage;

#[cfg(test)]
mod tests;

pub use domain::{
    next_status, Application, ApplicationDetail, ApplicationHistory, ApplicationStatus, Decision,
    InterviewSchedule, PeriodWindow, Stage, Status,
};
pub use repository::{
    ApplicationRepository, AssessmentTotal, CandidateNotification, CandidateNotifier,
    DocumentPaths, NewApplication, NotifyError, StageReview, TracingNotifier, Transition,
};
pub use router::pipeline_router;
pub use service::{PipelineError, RecruitmentPipeline, DOCUMENT_EXTENSIONS};
pub use stage::{StageAction, StageActionRequest};
