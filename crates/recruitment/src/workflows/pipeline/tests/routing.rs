use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::ids::{ApplicationId, UserId};
use crate::storage::FileStorage;
use crate::workflows::pipeline::router::{detail_handler, statuses_handler};
use crate::workflows::pipeline::{ApplicationStatus, RecruitmentPipeline, Stage, StageActionRequest};
use crate::workflows::test_support::{
    empty_request, json_request, multipart_request, read_json_body,
};
use crate::workflows::ACTING_USER_HEADER;

fn applied(fixture: &Fixture) -> ApplicationId {
    fixture
        .service
        .apply(CANDIDATE, OPEN_PERIOD)
        .expect("apply succeeds")
        .id
}

fn advance_to(fixture: &Fixture, id: ApplicationId, target: ApplicationStatus) {
    if target == ApplicationStatus::AdminSelection {
        return;
    }
    let admin = StageActionRequest {
        status: Some("passed".to_string()),
        score: Some(70.0),
        ..StageActionRequest::default()
    };
    fixture
        .service
        .act(id, Stage::Administration, &admin, REVIEWER)
        .expect("administration passes");
    if target == ApplicationStatus::Psychotest {
        return;
    }
    let psychotest = StageActionRequest {
        status: Some("passed".to_string()),
        zoom_url: Some("https://zoom.us/j/1".to_string()),
        scheduled_at: Some(future_slot()),
        ..StageActionRequest::default()
    };
    fixture
        .service
        .act(id, Stage::Psychotest, &psychotest, REVIEWER)
        .expect("psychotest passes");
}

fn stage_uri(id: ApplicationId, stage: &str) -> String {
    format!("/api/v1/applications/{id}/stages/{stage}")
}

fn field_errors<'a>(payload: &'a Value, field: &str) -> &'a Vec<Value> {
    payload["errors"][field]
        .as_array()
        .unwrap_or_else(|| panic!("no errors reported for {field}: {payload}"))
}

#[tokio::test]
async fn statuses_handler_lists_catalog_in_order() {
    let response = statuses_handler().await;
    assert_eq!(response.status(), StatusCode::OK);

    let payload = read_json_body(response).await;
    let codes: Vec<_> = payload
        .as_array()
        .expect("array")
        .iter()
        .map(|status| status["code"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(
        codes,
        ["admin_selection", "psychotest", "interview", "accepted", "rejected"]
    );
    assert_eq!(payload[4]["id"], json!(5));
    assert_eq!(payload[4]["stage"], json!(4));
}

#[tokio::test]
async fn detail_handler_returns_not_found_for_unknown_application() {
    let fixture = build_service();
    let response = detail_handler::<MemoryRepository, MemoryNotifier>(
        State(fixture.service.clone()),
        Path(9999),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn detail_handler_reports_repository_outage_as_internal_error() {
    let (_dir, storage) = storage();
    let shared: Arc<dyn FileStorage> = storage;
    let service = Arc::new(RecruitmentPipeline::new(
        Arc::new(UnavailableRepository),
        Arc::new(MemoryNotifier::default()),
        shared,
    ));
    let response = detail_handler::<UnavailableRepository, MemoryNotifier>(State(service), Path(1))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn apply_route_creates_application_with_history() {
    let fixture = build_service();
    let response = fixture
        .router()
        .oneshot(json_request(
            "POST",
            "/api/v1/applications",
            Some(CANDIDATE.0),
            &json!({ "vacancy_period_id": OPEN_PERIOD.0 }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::CREATED);

    let payload = read_json_body(response).await;
    assert_eq!(payload["application"]["status"], json!("admin_selection"));
    assert_eq!(payload["status"]["name"], json!("Administrative Selection"));
    assert_eq!(payload["history"].as_array().map(Vec::len), Some(1));
    assert_eq!(payload["history"][0]["is_active"], json!(true));
}

#[tokio::test]
async fn apply_route_requires_acting_user() {
    let fixture = build_service();
    let response = fixture
        .router()
        .oneshot(json_request(
            "POST",
            "/api/v1/applications",
            None,
            &json!({ "vacancy_period_id": OPEN_PERIOD.0 }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn apply_route_conflicts_on_second_application() {
    let fixture = build_service();
    applied(&fixture);
    let response = fixture
        .router()
        .oneshot(json_request(
            "POST",
            "/api/v1/applications",
            Some(CANDIDATE.0),
            &json!({ "vacancy_period_id": OPEN_PERIOD.0 }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn passing_interview_without_score_is_unprocessable() {
    let fixture = build_service();
    let id = applied(&fixture);
    advance_to(&fixture, id, ApplicationStatus::Interview);

    let response = fixture
        .router()
        .oneshot(json_request(
            "POST",
            &stage_uri(id, "interview"),
            Some(REVIEWER.0),
            &json!({ "status": "passed", "notes": "great fit" }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let payload = read_json_body(response).await;
    assert!(payload["message"].is_string());
    assert_eq!(field_errors(&payload, "score").len(), 1);
    assert_eq!(
        fixture
            .service
            .get(id)
            .expect("application")
            .status,
        ApplicationStatus::Interview
    );
}

#[tokio::test]
async fn interview_score_may_arrive_as_form_text() {
    let fixture = build_service();
    let id = applied(&fixture);
    advance_to(&fixture, id, ApplicationStatus::Interview);

    let response = fixture
        .router()
        .oneshot(json_request(
            "POST",
            &stage_uri(id, "interview"),
            Some(REVIEWER.0),
            &json!({ "status": "passed", "score": "85" }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);

    let payload = read_json_body(response).await;
    assert_eq!(payload["application"]["status"], json!("accepted"));
    assert_eq!(payload["history"][2]["score"], json!(85.0));
}

#[tokio::test]
async fn malformed_stage_payloads_are_reported_per_field() {
    let fixture = build_service();
    let id = applied(&fixture);
    advance_to(&fixture, id, ApplicationStatus::Interview);

    for (body, field) in [
        (json!({ "status": "passed", "score": "high" }), "score"),
        (json!({ "status": 5, "score": 80 }), "status"),
    ] {
        let response = fixture
            .router()
            .oneshot(json_request(
                "POST",
                &stage_uri(id, "interview"),
                Some(REVIEWER.0),
                &body,
            ))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let payload = read_json_body(response).await;
        assert!(payload["message"].is_string());
        assert_eq!(field_errors(&payload, field).len(), 1);
    }

    let broken = Request::builder()
        .method("POST")
        .uri(stage_uri(id, "interview"))
        .header(header::CONTENT_TYPE, "application/json")
        .header(ACTING_USER_HEADER, REVIEWER.0.to_string())
        .body(Body::from("{\"status\": "))
        .expect("request builds");
    let response = fixture.router().oneshot(broken).await.expect("router responds");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(field_errors(&payload, "body").len(), 1);

    assert_eq!(
        fixture.service.get(id).expect("application").status,
        ApplicationStatus::Interview
    );
}

#[tokio::test]
async fn stage_action_on_unknown_application_is_not_found() {
    let fixture = build_service();
    let response = fixture
        .router()
        .oneshot(json_request(
            "POST",
            "/api/v1/applications/9999/stages/interview",
            Some(REVIEWER.0),
            &json!({ "status": "passed" }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rejecting_without_notes_is_unprocessable() {
    let fixture = build_service();
    let id = applied(&fixture);

    let response = fixture
        .router()
        .oneshot(json_request(
            "POST",
            &stage_uri(id, "administration"),
            Some(REVIEWER.0),
            &json!({ "status": "rejected", "notes": "   " }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let payload = read_json_body(response).await;
    assert_eq!(field_errors(&payload, "notes").len(), 1);
}

#[tokio::test]
async fn passing_psychotest_without_schedule_reports_both_fields() {
    let fixture = build_service();
    let id = applied(&fixture);
    advance_to(&fixture, id, ApplicationStatus::Psychotest);

    let response = fixture
        .router()
        .oneshot(json_request(
            "POST",
            &stage_uri(id, "assessment"),
            Some(REVIEWER.0),
            &json!({ "status": "passed", "score": 40 }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let payload = read_json_body(response).await;
    assert!(!field_errors(&payload, "zoom_url").is_empty());
    assert!(!field_errors(&payload, "scheduled_at").is_empty());
}

#[tokio::test]
async fn acting_on_another_stage_conflicts() {
    let fixture = build_service();
    let id = applied(&fixture);

    let response = fixture
        .router()
        .oneshot(json_request(
            "POST",
            &stage_uri(id, "interview"),
            Some(REVIEWER.0),
            &json!({ "status": "passed", "score": 88 }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let detail = fixture.service.detail(id).expect("detail");
    assert_eq!(detail.history.len(), 1);
    assert_eq!(detail.application.status, ApplicationStatus::AdminSelection);
}

#[tokio::test]
async fn unknown_stage_segment_is_not_found() {
    let fixture = build_service();
    let id = applied(&fixture);

    let response = fixture
        .router()
        .oneshot(json_request(
            "POST",
            &stage_uri(id, "onboarding"),
            Some(REVIEWER.0),
            &json!({ "status": "passed", "score": 50 }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stage_route_advances_application() {
    let fixture = build_service();
    let id = applied(&fixture);

    let response = fixture
        .router()
        .oneshot(json_request(
            "POST",
            &stage_uri(id, "administration"),
            Some(REVIEWER.0),
            &json!({ "status": "passed", "score": 77.5, "notes": "complete documents" }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);

    let payload = read_json_body(response).await;
    assert_eq!(payload["application"]["status"], json!("psychotest"));
    assert_eq!(payload["history"][0]["score"], json!(77.5));
    assert_eq!(payload["history"][0]["reviewed_by"], json!(REVIEWER.0));
    assert_eq!(payload["history"][1]["is_active"], json!(true));
}

#[tokio::test]
async fn period_listing_filters_by_status() {
    let fixture = build_service();
    let id = applied(&fixture);
    fixture
        .service
        .apply(UserId(8), OPEN_PERIOD)
        .expect("second candidate applies");
    advance_to(&fixture, id, ApplicationStatus::Psychotest);

    let uri = format!("/api/v1/periods/{}/applications?status=psychotest", OPEN_PERIOD.0);
    let response = fixture
        .router()
        .oneshot(empty_request("GET", &uri, None))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.as_array().map(Vec::len), Some(1));
    assert_eq!(payload[0]["id"], json!(id.0));

    let uri = format!("/api/v1/periods/{}/applications?status=hired", OPEN_PERIOD.0);
    let response = fixture
        .router()
        .oneshot(empty_request("GET", &uri, None))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn documents_route_stores_uploads() {
    let fixture = build_service();
    let id = applied(&fixture);

    let response = fixture
        .router()
        .oneshot(multipart_request(
            "POST",
            &format!("/api/v1/applications/{id}/documents"),
            Some(CANDIDATE.0),
            &[
                ("resume", Some("resume.pdf"), &b"%PDF-1.4"[..]),
                ("cover_letter", Some("letter.doc"), &b"letter"[..]),
            ],
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);

    let payload = read_json_body(response).await;
    let resume_path = payload["application"]["resume_path"]
        .as_str()
        .expect("resume path");
    assert!(resume_path.starts_with("applications/"));
    assert!(resume_path.ends_with(".pdf"));
    assert!(fixture.storage.exists(resume_path));
    assert_eq!(
        payload["resume_url"],
        json!(format!("/storage/{resume_path}"))
    );
}

#[tokio::test]
async fn documents_route_forbids_other_candidates() {
    let fixture = build_service();
    let id = applied(&fixture);

    let response = fixture
        .router()
        .oneshot(multipart_request(
            "POST",
            &format!("/api/v1/applications/{id}/documents"),
            Some(CANDIDATE.0 + 1),
            &[("resume", Some("resume.pdf"), &b"%PDF-1.4"[..])],
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
