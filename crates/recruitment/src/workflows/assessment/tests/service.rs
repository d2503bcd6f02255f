use super::common::*;
use crate::ids::{QuestionPackId, UserId};
use crate::workflows::assessment::{
    AnswerRequest, AssessmentError, ChoiceRequest, GradeRequest, PackRequest, Question, QuestionKind,
    QuestionRequest, SubmitAnswersRequest,
};
use crate::workflows::pipeline::ApplicationStatus;

fn submission(answers: Vec<AnswerRequest>) -> SubmitAnswersRequest {
    SubmitAnswersRequest { answers }
}

fn pick(question: &Question, label: &str) -> AnswerRequest {
    let choice = question
        .choices
        .iter()
        .find(|choice| choice.label == label)
        .expect("choice exists");
    AnswerRequest {
        question_id: question.id.0,
        choice_id: Some(choice.id.0),
        answer_text: None,
    }
}

fn write(question: &Question, text: &str) -> AnswerRequest {
    AnswerRequest {
        question_id: question.id.0,
        choice_id: None,
        answer_text: Some(text.to_string()),
    }
}

#[test]
fn pack_requires_a_name() {
    let (service, _) = build_service();
    match service.create_pack(&PackRequest::default()) {
        Err(AssessmentError::Validation(errors)) => assert!(errors.has("name")),
        other => panic!("expected name validation error, got {other:?}"),
    }
}

#[test]
fn multiple_choice_needs_exactly_one_correct_choice() {
    let (service, bank) = build_service();
    let seeded = seed(&service, &bank);

    let mut request = choice_request();
    request.choices.push(ChoiceRequest {
        label: Some("Square".to_string()),
        is_correct: true,
    });
    match service.add_question(seeded.pack, &request) {
        Err(AssessmentError::Validation(errors)) => assert!(errors.has("choices")),
        other => panic!("expected choices validation error, got {other:?}"),
    }

    let lonely = QuestionRequest {
        choices: vec![ChoiceRequest {
            label: Some("Only".to_string()),
            is_correct: true,
        }],
        ..choice_request()
    };
    assert!(matches!(
        service.add_question(seeded.pack, &lonely),
        Err(AssessmentError::Validation(_))
    ));
}

#[test]
fn essays_take_no_choices_and_default_to_one_point() {
    let (service, bank) = build_service();
    let seeded = seed(&service, &bank);

    let mut request = essay_request();
    request.choices = choice_request().choices;
    assert!(matches!(
        service.add_question(seeded.pack, &request),
        Err(AssessmentError::Validation(_))
    ));

    let question = service
        .add_question(
            seeded.pack,
            &QuestionRequest {
                points: None,
                ..essay_request()
            },
        )
        .expect("essay added");
    assert_eq!(question.kind, QuestionKind::Essay);
    assert_eq!(question.points, 1);
}

#[test]
fn adding_to_missing_pack_is_not_found() {
    let (service, _) = build_service();
    assert!(matches!(
        service.add_question(QuestionPackId(77), &essay_request()),
        Err(AssessmentError::NotFound(_))
    ));
}

#[test]
fn candidate_view_hides_answer_key() {
    let (service, bank) = build_service();
    let seeded = seed(&service, &bank);

    let test = service
        .questions_for_application(APPLICATION, CANDIDATE)
        .expect("questions available");
    assert_eq!(test.pack_id, seeded.pack);
    assert_eq!(test.duration_minutes, Some(45));
    assert_eq!(test.questions.len(), 2);

    let rendered = serde_json::to_string(&test).expect("serializes");
    assert!(!rendered.contains("is_correct"));
}

#[test]
fn questions_are_gated_on_owner_and_stage() {
    let (service, bank) = build_service();
    seed(&service, &bank);

    assert!(matches!(
        service.questions_for_application(APPLICATION, UserId(12)),
        Err(AssessmentError::Forbidden)
    ));

    bank.put_application(ApplicationStatus::AdminSelection, None);
    assert!(matches!(
        service.questions_for_application(APPLICATION, CANDIDATE),
        Err(AssessmentError::NotInPsychotest {
            status: ApplicationStatus::AdminSelection
        })
    ));
}

#[test]
fn multiple_choice_is_scored_and_essays_wait_for_grading() {
    let (service, bank) = build_service();
    let seeded = seed(&service, &bank);

    let recorded = service
        .submit_answers(
            APPLICATION,
            CANDIDATE,
            &submission(vec![
                pick(&seeded.choice_question, "Triangle"),
                write(&seeded.essay_question, "I mediated a scheduling dispute."),
            ]),
        )
        .expect("answers recorded");
    assert_eq!(recorded.len(), 2);
    assert_eq!(recorded[0].score, Some(4.0));
    assert_eq!(recorded[1].score, None);

    let sheet = service.answer_sheet(APPLICATION).expect("sheet");
    assert_eq!(sheet.summary.correct, 1);
    assert_eq!(sheet.summary.pending_essays, 1);
    assert_eq!(sheet.summary.total_score, 4.0);
    assert_eq!(sheet.summary.max_score, 14.0);

    let essay_answer = recorded[1].id;
    let graded = service
        .grade_answer(essay_answer, &GradeRequest { score: Some(8.5) }, GRADER)
        .expect("essay graded");
    assert_eq!(graded.score, Some(8.5));
    assert_eq!(graded.graded_by, Some(GRADER));

    let sheet = service.answer_sheet(APPLICATION).expect("sheet");
    assert_eq!(sheet.summary.pending_essays, 0);
    assert_eq!(sheet.summary.total_score, 12.5);
}

#[test]
fn wrong_choice_scores_zero() {
    let (service, bank) = build_service();
    let seeded = seed(&service, &bank);

    let recorded = service
        .submit_answers(
            APPLICATION,
            CANDIDATE,
            &submission(vec![pick(&seeded.choice_question, "Circle")]),
        )
        .expect("answer recorded");
    assert_eq!(recorded[0].score, Some(0.0));
}

#[test]
fn submission_outside_psychotest_is_refused() {
    let (service, bank) = build_service();
    let seeded = seed(&service, &bank);
    bank.put_application(ApplicationStatus::Interview, Some(seeded.pack));

    assert!(matches!(
        service.submit_answers(
            APPLICATION,
            CANDIDATE,
            &submission(vec![pick(&seeded.choice_question, "Triangle")]),
        ),
        Err(AssessmentError::NotInPsychotest { .. })
    ));
    assert_eq!(bank.answer_count(), 0);
}

#[test]
fn invalid_answers_are_reported_per_entry() {
    let (service, bank) = build_service();
    let seeded = seed(&service, &bank);

    let foreign_choice = AnswerRequest {
        question_id: seeded.choice_question.id.0,
        choice_id: Some(9_999),
        answer_text: None,
    };
    let blank_essay = write(&seeded.essay_question, "   ");
    let unknown = AnswerRequest {
        question_id: 9_999,
        choice_id: None,
        answer_text: Some("?".to_string()),
    };

    match service.submit_answers(
        APPLICATION,
        CANDIDATE,
        &submission(vec![foreign_choice, blank_essay, unknown]),
    ) {
        Err(AssessmentError::Validation(errors)) => {
            assert!(errors.has("answers.0.choice_id"));
            assert!(errors.has("answers.1.answer_text"));
            assert!(errors.has("answers.2.question_id"));
        }
        other => panic!("expected answer validation errors, got {other:?}"),
    }
    assert_eq!(bank.answer_count(), 0);
}

#[test]
fn each_question_is_answered_once() {
    let (service, bank) = build_service();
    let seeded = seed(&service, &bank);

    service
        .submit_answers(
            APPLICATION,
            CANDIDATE,
            &submission(vec![pick(&seeded.choice_question, "Triangle")]),
        )
        .expect("first answer");
    assert!(matches!(
        service.submit_answers(
            APPLICATION,
            CANDIDATE,
            &submission(vec![pick(&seeded.choice_question, "Circle")]),
        ),
        Err(AssessmentError::AlreadyAnswered(id)) if id == seeded.choice_question.id
    ));
}

#[test]
fn grading_is_limited_to_essays_within_points() {
    let (service, bank) = build_service();
    let seeded = seed(&service, &bank);
    let recorded = service
        .submit_answers(
            APPLICATION,
            CANDIDATE,
            &submission(vec![
                pick(&seeded.choice_question, "Triangle"),
                write(&seeded.essay_question, "Listened first."),
            ]),
        )
        .expect("answers recorded");

    match service.grade_answer(recorded[0].id, &GradeRequest { score: Some(1.0) }, GRADER) {
        Err(AssessmentError::Validation(errors)) => assert!(errors.has("answer")),
        other => panic!("expected essay-only error, got {other:?}"),
    }
    match service.grade_answer(recorded[1].id, &GradeRequest { score: Some(11.0) }, GRADER) {
        Err(AssessmentError::Validation(errors)) => assert!(errors.has("score")),
        other => panic!("expected score range error, got {other:?}"),
    }
}

#[test]
fn packs_in_use_cannot_be_deleted() {
    let (service, bank) = build_service();
    let seeded = seed(&service, &bank);
    bank.mark_in_use(seeded.pack);

    assert!(matches!(
        service.delete_pack(seeded.pack),
        Err(AssessmentError::PackInUse(_))
    ));

    let spare = service
        .create_pack(&PackRequest {
            name: Some("Spare".to_string()),
            ..PackRequest::default()
        })
        .expect("spare pack");
    service.delete_pack(spare.id).expect("unused pack deleted");
    assert!(matches!(
        service.pack(spare.id),
        Err(AssessmentError::NotFound(_))
    ));
}
