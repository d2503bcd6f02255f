use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::error::RepositoryError;
use crate::ids::{
    AnswerId, ApplicationId, ChoiceId, QuestionId, QuestionPackId, UserId, VacancyPeriodId,
};
use crate::workflows::assessment::{
    ApplicationContext, AssessmentService, Choice, ChoiceRequest, NewAnswer, NewQuestion,
    NewQuestionPack, PackRequest, Question, QuestionBank, QuestionPack, QuestionRequest,
    UserAnswer,
};
use crate::workflows::pipeline::ApplicationStatus;

pub(super) const CANDIDATE: UserId = UserId(11);
pub(super) const GRADER: UserId = UserId(500);
pub(super) const APPLICATION: ApplicationId = ApplicationId(40);

#[derive(Default)]
struct BankState {
    packs: BTreeMap<QuestionPackId, QuestionPack>,
    questions: BTreeMap<QuestionId, Question>,
    answers: BTreeMap<AnswerId, UserAnswer>,
    contexts: BTreeMap<ApplicationId, ApplicationContext>,
    packs_in_use: Vec<QuestionPackId>,
    next_id: i64,
}

impl BankState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryBank {
    state: Arc<Mutex<BankState>>,
}

impl MemoryBank {
    pub(super) fn put_application(&self, status: ApplicationStatus, pack: Option<QuestionPackId>) {
        self.state
            .lock()
            .expect("bank mutex poisoned")
            .contexts
            .insert(
                APPLICATION,
                ApplicationContext {
                    application_id: APPLICATION,
                    user_id: CANDIDATE,
                    vacancy_period_id: VacancyPeriodId(1),
                    status,
                    question_pack_id: pack,
                },
            );
    }

    pub(super) fn mark_in_use(&self, pack: QuestionPackId) {
        self.state
            .lock()
            .expect("bank mutex poisoned")
            .packs_in_use
            .push(pack);
    }

    pub(super) fn answer_count(&self) -> usize {
        self.state.lock().expect("bank mutex poisoned").answers.len()
    }
}

impl QuestionBank for MemoryBank {
    fn create_pack(&self, pack: NewQuestionPack) -> Result<QuestionPack, RepositoryError> {
        let mut guard = self.state.lock().expect("bank mutex poisoned");
        let record = QuestionPack {
            id: QuestionPackId(guard.next_id()),
            name: pack.name,
            description: pack.description,
            duration_minutes: pack.duration_minutes,
            created_at: pack.created_at,
        };
        guard.packs.insert(record.id, record.clone());
        Ok(record)
    }

    fn list_packs(&self) -> Result<Vec<QuestionPack>, RepositoryError> {
        let guard = self.state.lock().expect("bank mutex poisoned");
        Ok(guard.packs.values().cloned().collect())
    }

    fn fetch_pack(&self, id: QuestionPackId) -> Result<Option<QuestionPack>, RepositoryError> {
        let guard = self.state.lock().expect("bank mutex poisoned");
        Ok(guard.packs.get(&id).cloned())
    }

    fn pack_in_use(&self, id: QuestionPackId) -> Result<bool, RepositoryError> {
        let guard = self.state.lock().expect("bank mutex poisoned");
        Ok(guard.packs_in_use.contains(&id))
    }

    fn delete_pack(&self, id: QuestionPackId) -> Result<bool, RepositoryError> {
        let mut guard = self.state.lock().expect("bank mutex poisoned");
        guard.questions.retain(|_, question| question.question_pack_id != id);
        Ok(guard.packs.remove(&id).is_some())
    }

    fn questions(&self, pack: QuestionPackId) -> Result<Vec<Question>, RepositoryError> {
        let guard = self.state.lock().expect("bank mutex poisoned");
        Ok(guard
            .questions
            .values()
            .filter(|question| question.question_pack_id == pack)
            .cloned()
            .collect())
    }

    fn add_question(&self, question: NewQuestion) -> Result<Question, RepositoryError> {
        let mut guard = self.state.lock().expect("bank mutex poisoned");
        let id = QuestionId(guard.next_id());
        let mut choices = Vec::with_capacity(question.choices.len());
        for choice in question.choices {
            choices.push(Choice {
                id: ChoiceId(guard.next_id()),
                question_id: id,
                label: choice.label,
                is_correct: choice.is_correct,
            });
        }
        let record = Question {
            id,
            question_pack_id: question.question_pack_id,
            kind: question.kind,
            prompt: question.prompt,
            points: question.points,
            choices,
        };
        guard.questions.insert(id, record.clone());
        Ok(record)
    }

    fn fetch_question(&self, id: QuestionId) -> Result<Option<Question>, RepositoryError> {
        let guard = self.state.lock().expect("bank mutex poisoned");
        Ok(guard.questions.get(&id).cloned())
    }

    fn delete_question(&self, id: QuestionId) -> Result<bool, RepositoryError> {
        let mut guard = self.state.lock().expect("bank mutex poisoned");
        if guard.answers.values().any(|answer| answer.question_id == id) {
            return Err(RepositoryError::Conflict(format!(
                "question {id} already has answers"
            )));
        }
        Ok(guard.questions.remove(&id).is_some())
    }

    fn application_context(
        &self,
        id: ApplicationId,
    ) -> Result<Option<ApplicationContext>, RepositoryError> {
        let guard = self.state.lock().expect("bank mutex poisoned");
        Ok(guard.contexts.get(&id).copied())
    }

    fn answers_for_application(
        &self,
        id: ApplicationId,
    ) -> Result<Vec<UserAnswer>, RepositoryError> {
        let guard = self.state.lock().expect("bank mutex poisoned");
        Ok(guard
            .answers
            .values()
            .filter(|answer| answer.application_id == id)
            .cloned()
            .collect())
    }

    fn record_answers(&self, answers: Vec<NewAnswer>) -> Result<Vec<UserAnswer>, RepositoryError> {
        let mut guard = self.state.lock().expect("bank mutex poisoned");
        let mut recorded = Vec::with_capacity(answers.len());
        for answer in answers {
            let record = UserAnswer {
                id: AnswerId(guard.next_id()),
                user_id: answer.user_id,
                question_id: answer.question_id,
                application_id: answer.application_id,
                choice_id: answer.choice_id,
                answer_text: answer.answer_text,
                score: answer.score,
                answered_at: answer.answered_at,
                graded_by: None,
            };
            guard.answers.insert(record.id, record.clone());
            recorded.push(record);
        }
        Ok(recorded)
    }

    fn fetch_answer(&self, id: AnswerId) -> Result<Option<UserAnswer>, RepositoryError> {
        let guard = self.state.lock().expect("bank mutex poisoned");
        Ok(guard.answers.get(&id).cloned())
    }

    fn grade_answer(
        &self,
        id: AnswerId,
        score: f32,
        graded_by: UserId,
    ) -> Result<UserAnswer, RepositoryError> {
        let mut guard = self.state.lock().expect("bank mutex poisoned");
        let answer = guard
            .answers
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("answer {id}")))?;
        answer.score = Some(score);
        answer.graded_by = Some(graded_by);
        Ok(answer.clone())
    }
}

pub(super) struct SeededPack {
    pub(super) pack: QuestionPackId,
    pub(super) choice_question: Question,
    pub(super) essay_question: Question,
}

pub(super) fn build_service() -> (Arc<AssessmentService<MemoryBank>>, Arc<MemoryBank>) {
    let bank = Arc::new(MemoryBank::default());
    (Arc::new(AssessmentService::new(bank.clone())), bank)
}

pub(super) fn choice_request() -> QuestionRequest {
    QuestionRequest {
        kind: Some("multiple_choice".to_string()),
        prompt: Some("Which shape completes the pattern?".to_string()),
        points: Some(4),
        choices: vec![
            ChoiceRequest {
                label: Some("Circle".to_string()),
                is_correct: false,
            },
            ChoiceRequest {
                label: Some("Triangle".to_string()),
                is_correct: true,
            },
        ],
    }
}

pub(super) fn essay_request() -> QuestionRequest {
    QuestionRequest {
        kind: Some("essay".to_string()),
        prompt: Some("Describe a conflict you resolved.".to_string()),
        points: Some(10),
        choices: Vec::new(),
    }
}

/// Pack with one multiple-choice and one essay question, application in the psychotest.
pub(super) fn seed(
    service: &AssessmentService<MemoryBank>,
    bank: &MemoryBank,
) -> SeededPack {
    let pack = service
        .create_pack(&PackRequest {
            name: Some("General aptitude".to_string()),
            description: None,
            duration_minutes: Some(45),
        })
        .expect("pack created");
    let choice_question = service
        .add_question(pack.id, &choice_request())
        .expect("choice question");
    let essay_question = service
        .add_question(pack.id, &essay_request())
        .expect("essay question");
    bank.put_application(ApplicationStatus::Psychotest, Some(pack.id));
    SeededPack {
        pack: pack.id,
        choice_question,
        essay_question,
    }
}
