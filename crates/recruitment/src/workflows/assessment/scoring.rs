use std::collections::BTreeMap;

use super::domain::{
    AnswerSheet, ApplicationContext, Question, QuestionKind, QuestionPack, SheetEntry,
    SheetSummary, UserAnswer,
};
use crate::ids::{ChoiceId, QuestionId};

/// Automatic score for a multiple-choice pick: full points when correct, zero otherwise.
pub fn score_choice(question: &Question, choice: ChoiceId) -> f32 {
    match question.choice(choice) {
        Some(picked) if picked.is_correct => question.points as f32,
        _ => 0.0,
    }
}

/// Join the pack's questions with the recorded answers and total them up.
pub fn build_sheet(
    context: &ApplicationContext,
    pack: Option<QuestionPack>,
    questions: Vec<Question>,
    answers: Vec<UserAnswer>,
) -> AnswerSheet {
    let mut by_question: BTreeMap<QuestionId, UserAnswer> = answers
        .into_iter()
        .map(|answer| (answer.question_id, answer))
        .collect();

    let entries: Vec<SheetEntry> = questions
        .into_iter()
        .map(|question| {
            let answer = by_question.remove(&question.id);
            let is_correct = match (question.kind, &answer) {
                (QuestionKind::MultipleChoice, Some(answer)) => Some(
                    answer
                        .choice_id
                        .and_then(|id| question.choice(id))
                        .is_some_and(|choice| choice.is_correct),
                ),
                _ => None,
            };
            SheetEntry {
                question,
                answer,
                is_correct,
            }
        })
        .collect();

    let summary = summarize(&entries);
    AnswerSheet {
        application_id: context.application_id,
        user_id: context.user_id,
        pack,
        entries,
        summary,
    }
}

pub fn summarize(entries: &[SheetEntry]) -> SheetSummary {
    let mut summary = SheetSummary {
        questions: entries.len(),
        ..SheetSummary::default()
    };

    for entry in entries {
        summary.max_score += entry.question.points as f32;
        let Some(answer) = &entry.answer else {
            continue;
        };
        summary.answered += 1;
        match entry.question.kind {
            QuestionKind::MultipleChoice => {
                if entry.is_correct == Some(true) {
                    summary.correct += 1;
                }
                summary.multiple_choice_score += answer.score.unwrap_or(0.0);
            }
            QuestionKind::Essay => match answer.score {
                Some(score) => summary.essay_score += score,
                None => summary.pending_essays += 1,
            },
        }
    }

    summary.total_score = summary.multiple_choice_score + summary.essay_score;
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{AnswerId, ApplicationId, QuestionPackId, UserId, VacancyPeriodId};
    use crate::workflows::assessment::domain::Choice;
    use crate::workflows::pipeline::ApplicationStatus;
    use chrono::Utc;

    fn choice_question(id: i64, points: u32) -> Question {
        Question {
            id: QuestionId(id),
            question_pack_id: QuestionPackId(1),
            kind: QuestionKind::MultipleChoice,
            prompt: format!("question {id}"),
            points,
            choices: vec![
                Choice {
                    id: ChoiceId(id * 10 + 1),
                    question_id: QuestionId(id),
                    label: "right".to_string(),
                    is_correct: true,
                },
                Choice {
                    id: ChoiceId(id * 10 + 2),
                    question_id: QuestionId(id),
                    label: "wrong".to_string(),
                    is_correct: false,
                },
            ],
        }
    }

    fn essay(id: i64, points: u32) -> Question {
        Question {
            id: QuestionId(id),
            question_pack_id: QuestionPackId(1),
            kind: QuestionKind::Essay,
            prompt: "describe yourself".to_string(),
            points,
            choices: Vec::new(),
        }
    }

    fn answer(question: i64, choice: Option<i64>, score: Option<f32>) -> UserAnswer {
        UserAnswer {
            id: AnswerId(question + 100),
            user_id: UserId(3),
            question_id: QuestionId(question),
            application_id: ApplicationId(1),
            choice_id: choice.map(ChoiceId),
            answer_text: choice.is_none().then(|| "text".to_string()),
            score,
            answered_at: Utc::now(),
            graded_by: None,
        }
    }

    fn context() -> ApplicationContext {
        ApplicationContext {
            application_id: ApplicationId(1),
            user_id: UserId(3),
            vacancy_period_id: VacancyPeriodId(1),
            status: ApplicationStatus::Psychotest,
            question_pack_id: Some(QuestionPackId(1)),
        }
    }

    #[test]
    fn correct_choice_earns_points() {
        let question = choice_question(1, 5);
        assert_eq!(score_choice(&question, ChoiceId(11)), 5.0);
        assert_eq!(score_choice(&question, ChoiceId(12)), 0.0);
        assert_eq!(score_choice(&question, ChoiceId(99)), 0.0);
    }

    #[test]
    fn summary_separates_pending_essays() {
        let sheet = build_sheet(
            &context(),
            None,
            vec![
                choice_question(1, 2),
                choice_question(2, 3),
                essay(3, 10),
                essay(4, 10),
                choice_question(5, 1),
            ],
            vec![
                answer(1, Some(11), Some(2.0)),
                answer(2, Some(22), Some(0.0)),
                answer(3, None, Some(7.5)),
                answer(4, None, None),
            ],
        );

        let summary = &sheet.summary;
        assert_eq!(summary.questions, 5);
        assert_eq!(summary.answered, 4);
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.multiple_choice_score, 2.0);
        assert_eq!(summary.essay_score, 7.5);
        assert_eq!(summary.pending_essays, 1);
        assert_eq!(summary.total_score, 9.5);
        assert_eq!(summary.max_score, 26.0);

        assert_eq!(sheet.entries[0].is_correct, Some(true));
        assert_eq!(sheet.entries[1].is_correct, Some(false));
        assert_eq!(sheet.entries[2].is_correct, None);
        assert!(sheet.entries[4].answer.is_none());
    }
}
