use chrono::{DateTime, Utc};

use super::domain::{ApplicationContext, Question, QuestionKind, QuestionPack, UserAnswer};
use crate::error::RepositoryError;
use crate::ids::{AnswerId, ApplicationId, ChoiceId, QuestionId, QuestionPackId, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestionPack {
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: Option<u32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChoice {
    pub label: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub question_pack_id: QuestionPackId,
    pub kind: QuestionKind,
    pub prompt: String,
    pub points: u32,
    pub choices: Vec<NewChoice>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAnswer {
    pub user_id: UserId,
    pub question_id: QuestionId,
    pub application_id: ApplicationId,
    pub choice_id: Option<ChoiceId>,
    pub answer_text: Option<String>,
    pub score: Option<f32>,
    pub answered_at: DateTime<Utc>,
}

/// Storage port for question packs and candidate answers.
pub trait QuestionBank: Send + Sync {
    fn create_pack(&self, pack: NewQuestionPack) -> Result<QuestionPack, RepositoryError>;

    fn list_packs(&self) -> Result<Vec<QuestionPack>, RepositoryError>;

    fn fetch_pack(&self, id: QuestionPackId) -> Result<Option<QuestionPack>, RepositoryError>;

    /// Whether any vacancy still points at the pack.
    fn pack_in_use(&self, id: QuestionPackId) -> Result<bool, RepositoryError>;

    /// Removes the pack with its questions and choices. `false` when it did not exist.
    fn delete_pack(&self, id: QuestionPackId) -> Result<bool, RepositoryError>;

    /// Questions of a pack in insertion order, choices included.
    fn questions(&self, pack: QuestionPackId) -> Result<Vec<Question>, RepositoryError>;

    fn add_question(&self, question: NewQuestion) -> Result<Question, RepositoryError>;

    fn fetch_question(&self, id: QuestionId) -> Result<Option<Question>, RepositoryError>;

    /// Fails with `Conflict` once candidates answered the question.
    fn delete_question(&self, id: QuestionId) -> Result<bool, RepositoryError>;

    fn application_context(
        &self,
        id: ApplicationId,
    ) -> Result<Option<ApplicationContext>, RepositoryError>;

    fn answers_for_application(
        &self,
        id: ApplicationId,
    ) -> Result<Vec<UserAnswer>, RepositoryError>;

    /// Inserts every answer or none; `Conflict` when a question was already answered.
    fn record_answers(&self, answers: Vec<NewAnswer>) -> Result<Vec<UserAnswer>, RepositoryError>;

    fn fetch_answer(&self, id: AnswerId) -> Result<Option<UserAnswer>, RepositoryError>;

    fn grade_answer(
        &self,
        id: AnswerId,
        score: f32,
        graded_by: UserId,
    ) -> Result<UserAnswer, RepositoryError>;
}
