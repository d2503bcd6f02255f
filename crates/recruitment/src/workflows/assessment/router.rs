use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;

use super::repository::QuestionBank;
use super::service::{
    AssessmentError, AssessmentService, GradeRequest, PackRequest, QuestionRequest,
    SubmitAnswersRequest,
};
use crate::error::RepositoryError;
use crate::ids::{AnswerId, ApplicationId, QuestionId, QuestionPackId};
use crate::workflows::{run_blocking, ActingUser, JsonBody};

/// Router builder for question packs and the candidate psychotest.
pub fn assessment_router<B>(service: Arc<AssessmentService<B>>) -> Router
where
    B: QuestionBank + 'static,
{
    Router::new()
        .route(
            "/api/v1/question-packs",
            post(create_pack_handler::<B>).get(list_packs_handler::<B>),
        )
        .route(
            "/api/v1/question-packs/:pack_id",
            get(pack_handler::<B>).delete(delete_pack_handler::<B>),
        )
        .route(
            "/api/v1/question-packs/:pack_id/questions",
            post(add_question_handler::<B>).get(pack_questions_handler::<B>),
        )
        .route(
            "/api/v1/questions/:question_id",
            delete(delete_question_handler::<B>),
        )
        .route(
            "/api/v1/applications/:application_id/questions",
            get(candidate_questions_handler::<B>),
        )
        .route(
            "/api/v1/applications/:application_id/answers",
            post(submit_answers_handler::<B>).get(answer_sheet_handler::<B>),
        )
        .route(
            "/api/v1/answers/:answer_id/grade",
            post(grade_answer_handler::<B>),
        )
        .with_state(service)
}

pub(crate) async fn create_pack_handler<B>(
    State(service): State<Arc<AssessmentService<B>>>,
    JsonBody(request): JsonBody<PackRequest>,
) -> Result<Response, AssessmentError>
where
    B: QuestionBank + 'static,
{
    let pack = run_blocking(move || service.create_pack(&request)).await?;
    Ok((StatusCode::CREATED, Json(pack)).into_response())
}

pub(crate) async fn list_packs_handler<B>(
    State(service): State<Arc<AssessmentService<B>>>,
) -> Result<Response, AssessmentError>
where
    B: QuestionBank + 'static,
{
    let packs = run_blocking(move || service.list_packs()).await?;
    Ok(Json(packs).into_response())
}

pub(crate) async fn pack_handler<B>(
    State(service): State<Arc<AssessmentService<B>>>,
    Path(pack_id): Path<i64>,
) -> Result<Response, AssessmentError>
where
    B: QuestionBank + 'static,
{
    let pack = run_blocking(move || service.pack(QuestionPackId(pack_id))).await?;
    Ok(Json(pack).into_response())
}

pub(crate) async fn delete_pack_handler<B>(
    State(service): State<Arc<AssessmentService<B>>>,
    Path(pack_id): Path<i64>,
) -> Result<Response, AssessmentError>
where
    B: QuestionBank + 'static,
{
    run_blocking(move || service.delete_pack(QuestionPackId(pack_id))).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn pack_questions_handler<B>(
    State(service): State<Arc<AssessmentService<B>>>,
    Path(pack_id): Path<i64>,
) -> Result<Response, AssessmentError>
where
    B: QuestionBank + 'static,
{
    let detail = run_blocking(move || service.pack(QuestionPackId(pack_id))).await?;
    Ok(Json(detail.questions).into_response())
}

pub(crate) async fn add_question_handler<B>(
    State(service): State<Arc<AssessmentService<B>>>,
    Path(pack_id): Path<i64>,
    JsonBody(request): JsonBody<QuestionRequest>,
) -> Result<Response, AssessmentError>
where
    B: QuestionBank + 'static,
{
    let question =
        run_blocking(move || service.add_question(QuestionPackId(pack_id), &request)).await?;
    Ok((StatusCode::CREATED, Json(question)).into_response())
}

pub(crate) async fn delete_question_handler<B>(
    State(service): State<Arc<AssessmentService<B>>>,
    Path(question_id): Path<i64>,
) -> Result<Response, AssessmentError>
where
    B: QuestionBank + 'static,
{
    run_blocking(move || service.delete_question(QuestionId(question_id))).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn candidate_questions_handler<B>(
    State(service): State<Arc<AssessmentService<B>>>,
    Path(application_id): Path<i64>,
    ActingUser(user): ActingUser,
) -> Result<Response, AssessmentError>
where
    B: QuestionBank + 'static,
{
    let test = run_blocking(move || {
        service.questions_for_application(ApplicationId(application_id), user)
    })
    .await?;
    Ok(Json(test).into_response())
}

pub(crate) async fn submit_answers_handler<B>(
    State(service): State<Arc<AssessmentService<B>>>,
    Path(application_id): Path<i64>,
    ActingUser(user): ActingUser,
    JsonBody(request): JsonBody<SubmitAnswersRequest>,
) -> Result<Response, AssessmentError>
where
    B: QuestionBank + 'static,
{
    let answers = run_blocking(move || {
        service.submit_answers(ApplicationId(application_id), user, &request)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(answers)).into_response())
}

pub(crate) async fn answer_sheet_handler<B>(
    State(service): State<Arc<AssessmentService<B>>>,
    Path(application_id): Path<i64>,
) -> Result<Response, AssessmentError>
where
    B: QuestionBank + 'static,
{
    let sheet = run_blocking(move || service.answer_sheet(ApplicationId(application_id))).await?;
    Ok(Json(sheet).into_response())
}

pub(crate) async fn grade_answer_handler<B>(
    State(service): State<Arc<AssessmentService<B>>>,
    Path(answer_id): Path<i64>,
    ActingUser(reviewer): ActingUser,
    JsonBody(request): JsonBody<GradeRequest>,
) -> Result<Response, AssessmentError>
where
    B: QuestionBank + 'static,
{
    let answer =
        run_blocking(move || service.grade_answer(AnswerId(answer_id), &request, reviewer)).await?;
    Ok(Json(answer).into_response())
}

impl IntoResponse for AssessmentError {
    fn into_response(self) -> Response {
        let status = match &self {
            AssessmentError::Validation(errors) => return errors.clone().into_response(),
            AssessmentError::NotFound(_)
            | AssessmentError::Repository(RepositoryError::NotFound(_)) => StatusCode::NOT_FOUND,
            AssessmentError::Forbidden => StatusCode::FORBIDDEN,
            AssessmentError::NotInPsychotest { .. }
            | AssessmentError::AlreadyAnswered(_)
            | AssessmentError::PackInUse(_)
            | AssessmentError::Repository(RepositoryError::Conflict(_))
            | AssessmentError::Repository(RepositoryError::StaleStatus { .. }) => {
                StatusCode::CONFLICT
            }
            AssessmentError::Repository(RepositoryError::Unavailable(_))
            | AssessmentError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "assessment request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
