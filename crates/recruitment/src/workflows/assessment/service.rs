use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::task::JoinError;
use tracing::info;

use super::domain::{
    AnswerSheet, ApplicationContext, CandidateTest, PackDetail, Question, QuestionKind,
    QuestionPack, UserAnswer,
};
use super::repository::{NewAnswer, NewChoice, NewQuestion, NewQuestionPack, QuestionBank};
use super::scoring::{build_sheet, score_choice};
use crate::error::RepositoryError;
use crate::ids::{AnswerId, ApplicationId, ChoiceId, QuestionId, QuestionPackId, UserId};
use crate::validation::{optional_score, ValidationErrors};
use crate::workflows::pipeline::ApplicationStatus;

const MAX_NAME_LEN: usize = 255;
const MAX_ANSWER_LEN: usize = 10_000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceRequest {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRequest {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(default)]
    pub choices: Vec<ChoiceRequest>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub question_id: i64,
    #[serde(default)]
    pub choice_id: Option<i64>,
    #[serde(default)]
    pub answer_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAnswersRequest {
    #[serde(default)]
    pub answers: Vec<AnswerRequest>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeRequest {
    #[serde(default, deserialize_with = "optional_score")]
    pub score: Option<f32>,
}

/// Question pack administration and the candidate psychotest.
pub struct AssessmentService<B> {
    bank: Arc<B>,
}

impl<B> AssessmentService<B>
where
    B: QuestionBank + 'static,
{
    pub fn new(bank: Arc<B>) -> Self {
        Self { bank }
    }

    pub fn create_pack(&self, request: &PackRequest) -> Result<QuestionPack, AssessmentError> {
        let mut errors = ValidationErrors::new();
        let name = trimmed(request.name.as_deref());
        errors.require_text("name", name.as_deref(), "name is required");
        if name.as_ref().is_some_and(|name| name.chars().count() > MAX_NAME_LEN) {
            errors.add("name", format!("name may not be longer than {MAX_NAME_LEN} characters"));
        }
        let duration = match request.duration_minutes {
            Some(minutes) if !(1..=i64::from(u16::MAX)).contains(&minutes) => {
                errors.add("duration_minutes", "duration_minutes must be a positive number");
                None
            }
            Some(minutes) => u32::try_from(minutes).ok(),
            None => None,
        };
        errors.finish()?;

        let pack = self.bank.create_pack(NewQuestionPack {
            name: name.unwrap_or_default(),
            description: trimmed(request.description.as_deref()),
            duration_minutes: duration,
            created_at: Utc::now(),
        })?;
        info!(pack_id = %pack.id, name = %pack.name, "question pack created");
        Ok(pack)
    }

    pub fn list_packs(&self) -> Result<Vec<QuestionPack>, AssessmentError> {
        Ok(self.bank.list_packs()?)
    }

    /// HR view of a pack, answer key included.
    pub fn pack(&self, id: QuestionPackId) -> Result<PackDetail, AssessmentError> {
        let pack = self.find_pack(id)?;
        let questions = self.bank.questions(id)?;
        Ok(PackDetail { pack, questions })
    }

    pub fn delete_pack(&self, id: QuestionPackId) -> Result<(), AssessmentError> {
        self.find_pack(id)?;
        if self.bank.pack_in_use(id)? {
            return Err(AssessmentError::PackInUse(id));
        }
        self.bank.delete_pack(id)?;
        info!(pack_id = %id, "question pack deleted");
        Ok(())
    }

    pub fn add_question(
        &self,
        pack: QuestionPackId,
        request: &QuestionRequest,
    ) -> Result<Question, AssessmentError> {
        self.find_pack(pack)?;
        let question = validate_question(pack, request)?;
        let question = self.bank.add_question(question)?;
        info!(
            pack_id = %pack,
            question_id = %question.id,
            kind = question.kind.code(),
            "question added"
        );
        Ok(question)
    }

    pub fn delete_question(&self, id: QuestionId) -> Result<(), AssessmentError> {
        if !self.bank.delete_question(id)? {
            return Err(AssessmentError::NotFound(format!("question {id}")));
        }
        info!(question_id = %id, "question deleted");
        Ok(())
    }

    /// Questions for the candidate, only while the application sits in the psychotest.
    pub fn questions_for_application(
        &self,
        id: ApplicationId,
        user: UserId,
    ) -> Result<CandidateTest, AssessmentError> {
        let context = self.candidate_context(id, user)?;
        let pack_id = pack_of(&context)?;
        let pack = self.find_pack(pack_id)?;
        let questions = self
            .bank
            .questions(pack_id)?
            .iter()
            .map(Question::candidate_view)
            .collect();

        Ok(CandidateTest {
            application_id: id,
            pack_id,
            pack_name: pack.name,
            duration_minutes: pack.duration_minutes,
            questions,
        })
    }

    pub fn submit_answers(
        &self,
        id: ApplicationId,
        user: UserId,
        request: &SubmitAnswersRequest,
    ) -> Result<Vec<UserAnswer>, AssessmentError> {
        let context = self.candidate_context(id, user)?;
        let pack_id = pack_of(&context)?;
        let questions: BTreeMap<QuestionId, Question> = self
            .bank
            .questions(pack_id)?
            .into_iter()
            .map(|question| (question.id, question))
            .collect();

        let now = Utc::now();
        let mut errors = ValidationErrors::new();
        if request.answers.is_empty() {
            errors.add("answers", "submit at least one answer");
        }

        let mut seen = BTreeSet::new();
        let mut pending = Vec::with_capacity(request.answers.len());
        for (index, answer) in request.answers.iter().enumerate() {
            let field = |name: &str| format!("answers.{index}.{name}");
            let question_id = QuestionId(answer.question_id);
            let Some(question) = questions.get(&question_id) else {
                errors.add(
                    &field("question_id"),
                    format!("question {question_id} is not part of this test"),
                );
                continue;
            };
            if !seen.insert(question_id) {
                errors.add(
                    &field("question_id"),
                    format!("question {question_id} is answered more than once"),
                );
                continue;
            }

            match question.kind {
                QuestionKind::MultipleChoice => {
                    let choice = answer.choice_id.map(ChoiceId);
                    match choice.filter(|choice| question.choice(*choice).is_some()) {
                        Some(choice) => pending.push(NewAnswer {
                            user_id: user,
                            question_id,
                            application_id: id,
                            choice_id: Some(choice),
                            answer_text: None,
                            score: Some(score_choice(question, choice)),
                            answered_at: now,
                        }),
                        None if choice.is_none() => {
                            errors.add(&field("choice_id"), "pick one of the choices")
                        }
                        None => errors.add(
                            &field("choice_id"),
                            "choice does not belong to this question",
                        ),
                    }
                }
                QuestionKind::Essay => match trimmed(answer.answer_text.as_deref()) {
                    None => errors.add(&field("answer_text"), "an essay answer is required"),
                    Some(text) if text.chars().count() > MAX_ANSWER_LEN => errors.add(
                        &field("answer_text"),
                        format!("answers may not be longer than {MAX_ANSWER_LEN} characters"),
                    ),
                    Some(text) => pending.push(NewAnswer {
                        user_id: user,
                        question_id,
                        application_id: id,
                        choice_id: None,
                        answer_text: Some(text),
                        score: None,
                        answered_at: now,
                    }),
                },
            }
        }
        errors.finish()?;

        let answered: BTreeSet<QuestionId> = self
            .bank
            .answers_for_application(id)?
            .into_iter()
            .map(|answer| answer.question_id)
            .collect();
        if let Some(repeat) = pending.iter().find(|answer| answered.contains(&answer.question_id)) {
            return Err(AssessmentError::AlreadyAnswered(repeat.question_id));
        }

        let recorded = self.bank.record_answers(pending)?;
        info!(
            application_id = %id,
            user_id = %user,
            answers = recorded.len(),
            "psychotest answers recorded"
        );
        Ok(recorded)
    }

    /// Manual score for an essay answer.
    pub fn grade_answer(
        &self,
        id: AnswerId,
        request: &GradeRequest,
        reviewer: UserId,
    ) -> Result<UserAnswer, AssessmentError> {
        let answer = self
            .bank
            .fetch_answer(id)?
            .ok_or_else(|| AssessmentError::NotFound(format!("answer {id}")))?;
        let question = self
            .bank
            .fetch_question(answer.question_id)?
            .ok_or_else(|| AssessmentError::NotFound(format!("question {}", answer.question_id)))?;

        let mut errors = ValidationErrors::new();
        if question.kind != QuestionKind::Essay {
            errors.add("answer", "multiple-choice answers are scored automatically");
        }
        let max = question.points as f32;
        match request.score {
            None => errors.add("score", "score is required"),
            Some(score) if !score.is_finite() || !(0.0..=max).contains(&score) => {
                errors.add("score", format!("score must be between 0 and {max}"))
            }
            Some(_) => {}
        }
        errors.finish()?;
        let score = request.score.unwrap_or_default();

        let graded = self.bank.grade_answer(id, score, reviewer)?;
        info!(answer_id = %id, score, reviewer = %reviewer, "essay graded");
        Ok(graded)
    }

    pub fn answer_sheet(&self, id: ApplicationId) -> Result<AnswerSheet, AssessmentError> {
        let context = self
            .bank
            .application_context(id)?
            .ok_or_else(|| AssessmentError::NotFound(format!("application {id}")))?;
        sheet_for(self.bank.as_ref(), &context)
    }

    fn find_pack(&self, id: QuestionPackId) -> Result<QuestionPack, AssessmentError> {
        self.bank
            .fetch_pack(id)?
            .ok_or_else(|| AssessmentError::NotFound(format!("question pack {id}")))
    }

    fn candidate_context(
        &self,
        id: ApplicationId,
        user: UserId,
    ) -> Result<ApplicationContext, AssessmentError> {
        let context = self
            .bank
            .application_context(id)?
            .ok_or_else(|| AssessmentError::NotFound(format!("application {id}")))?;
        if context.user_id != user {
            return Err(AssessmentError::Forbidden);
        }
        if context.status != ApplicationStatus::Psychotest {
            return Err(AssessmentError::NotInPsychotest {
                status: context.status,
            });
        }
        Ok(context)
    }
}

/// Answer sheet for an application, usable by any holder of a question bank.
pub fn sheet_for<B>(bank: &B, context: &ApplicationContext) -> Result<AnswerSheet, AssessmentError>
where
    B: QuestionBank + ?Sized,
{
    let (pack, questions) = match context.question_pack_id {
        Some(pack_id) => (bank.fetch_pack(pack_id)?, bank.questions(pack_id)?),
        None => (None, Vec::new()),
    };
    let answers = bank.answers_for_application(context.application_id)?;
    Ok(build_sheet(context, pack, questions, answers))
}

fn pack_of(context: &ApplicationContext) -> Result<QuestionPackId, AssessmentError> {
    context.question_pack_id.ok_or_else(|| {
        AssessmentError::NotFound(format!(
            "question pack for application {}",
            context.application_id
        ))
    })
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn validate_question(
    pack: QuestionPackId,
    request: &QuestionRequest,
) -> Result<NewQuestion, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let kind = match request.kind.as_deref().map(str::trim) {
        None | Some("") => {
            errors.add("kind", "kind is required");
            None
        }
        Some(raw) => {
            let kind = QuestionKind::parse(raw);
            if kind.is_none() {
                errors.add("kind", "kind must be multiple_choice or essay");
            }
            kind
        }
    };

    let prompt = trimmed(request.prompt.as_deref());
    errors.require_text("prompt", prompt.as_deref(), "prompt is required");

    let points = match request.points {
        None => 1,
        Some(points) if points >= 1 && points <= i64::from(u16::MAX) => points as u32,
        Some(_) => {
            errors.add("points", "points must be at least 1");
            1
        }
    };

    let mut choices = Vec::with_capacity(request.choices.len());
    for (index, choice) in request.choices.iter().enumerate() {
        match trimmed(choice.label.as_deref()) {
            Some(label) => choices.push(NewChoice {
                label,
                is_correct: choice.is_correct,
            }),
            None => errors.add(&format!("choices.{index}.label"), "choice label is required"),
        }
    }

    match kind {
        Some(QuestionKind::MultipleChoice) => {
            if request.choices.len() < 2 {
                errors.add("choices", "multiple-choice questions need at least two choices");
            }
            let correct = request.choices.iter().filter(|choice| choice.is_correct).count();
            if correct != 1 {
                errors.add("choices", "mark exactly one choice as correct");
            }
        }
        Some(QuestionKind::Essay) => {
            if !request.choices.is_empty() {
                errors.add("choices", "essay questions take no choices");
            }
        }
        None => {}
    }

    errors.finish()?;
    let Some(kind) = kind else {
        return Err(ValidationErrors::single("kind", "kind is required"));
    };

    Ok(NewQuestion {
        question_pack_id: pack,
        kind,
        prompt: prompt.unwrap_or_default(),
        points,
        choices,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error("{0} not found")]
    NotFound(String),
    #[error("application belongs to another candidate")]
    Forbidden,
    #[error("the psychotest is not open while the application is in {}", .status.code())]
    NotInPsychotest { status: ApplicationStatus },
    #[error("question {0} was already answered")]
    AlreadyAnswered(QuestionId),
    #[error("question pack {0} is attached to a vacancy")]
    PackInUse(QuestionPackId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("assessment task failed: {0}")]
    Worker(#[from] JoinError),
}
