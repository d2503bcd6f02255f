use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{
    AnswerId, ApplicationId, ChoiceId, QuestionId, QuestionPackId, UserId, VacancyPeriodId,
};
use crate::workflows::pipeline::ApplicationStatus;

/// Named bundle of psychotest questions attached to vacancies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionPack {
    pub id: QuestionPackId,
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: Option<u32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    Essay,
}

impl QuestionKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "multiple_choice" | "multiple-choice" | "choice" => Some(QuestionKind::MultipleChoice),
            "essay" => Some(QuestionKind::Essay),
            _ => None,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::Essay => "essay",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: ChoiceId,
    pub question_id: QuestionId,
    pub label: String,
    pub is_correct: bool,
}

/// Question as seen by HR, correctness included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub question_pack_id: QuestionPackId,
    pub kind: QuestionKind,
    pub prompt: String,
    pub points: u32,
    pub choices: Vec<Choice>,
}

impl Question {
    pub fn choice(&self, id: ChoiceId) -> Option<&Choice> {
        self.choices.iter().find(|choice| choice.id == id)
    }

    /// Candidate-facing copy without the answer key.
    pub fn candidate_view(&self) -> CandidateQuestion {
        CandidateQuestion {
            id: self.id,
            kind: self.kind,
            prompt: self.prompt.clone(),
            points: self.points,
            choices: self
                .choices
                .iter()
                .map(|choice| CandidateChoice {
                    id: choice.id,
                    label: choice.label.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateChoice {
    pub id: ChoiceId,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateQuestion {
    pub id: QuestionId,
    pub kind: QuestionKind,
    pub prompt: String,
    pub points: u32,
    pub choices: Vec<CandidateChoice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackDetail {
    pub pack: QuestionPack,
    pub questions: Vec<Question>,
}

/// Test handed to a candidate whose application reached the psychotest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateTest {
    pub application_id: ApplicationId,
    pub pack_id: QuestionPackId,
    pub pack_name: String,
    pub duration_minutes: Option<u32>,
    pub questions: Vec<CandidateQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAnswer {
    pub id: AnswerId,
    pub user_id: UserId,
    pub question_id: QuestionId,
    pub application_id: ApplicationId,
    pub choice_id: Option<ChoiceId>,
    pub answer_text: Option<String>,
    pub score: Option<f32>,
    pub answered_at: DateTime<Utc>,
    pub graded_by: Option<UserId>,
}

/// What the assessment flow needs to know about an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplicationContext {
    pub application_id: ApplicationId,
    pub user_id: UserId,
    pub vacancy_period_id: VacancyPeriodId,
    pub status: ApplicationStatus,
    pub question_pack_id: Option<QuestionPackId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetEntry {
    pub question: Question,
    pub answer: Option<UserAnswer>,
    pub is_correct: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SheetSummary {
    pub questions: usize,
    pub answered: usize,
    pub correct: usize,
    pub multiple_choice_score: f32,
    pub essay_score: f32,
    pub pending_essays: usize,
    pub total_score: f32,
    pub max_score: f32,
}

/// Graded view of a candidate's answers against the pack.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerSheet {
    pub application_id: ApplicationId,
    pub user_id: UserId,
    pub pack: Option<QuestionPack>,
    pub entries: Vec<SheetEntry>,
    pub summary: SheetSummary,
}
