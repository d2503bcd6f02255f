//! Psychotest question packs, candidate answers, and grading.

pub mod domain;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AnswerSheet, ApplicationContext, CandidateChoice, CandidateQuestion, CandidateTest, Choice,
    PackDetail, Question, QuestionKind, QuestionPack, SheetEntry, SheetSummary, UserAnswer,
};
pub use repository::{NewAnswer, NewChoice, NewQuestion, NewQuestionPack, QuestionBank};
pub use router::assessment_router;
pub use service::{
    sheet_for, AnswerRequest, AssessmentError, AssessmentService, ChoiceRequest, GradeRequest,
    PackRequest, QuestionRequest, SubmitAnswersRequest,
};
