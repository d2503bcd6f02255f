use axum::http::{header, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::workflows::test_support::{
    empty_request, json_request, read_json_body, read_text_body,
};

#[tokio::test]
async fn profile_round_trip_over_http() {
    let fixture = build_service();
    let uri = format!("/api/v1/candidates/{CANDIDATE}/profile");

    let response = fixture
        .router()
        .oneshot(empty_request("GET", &uri, None))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = fixture
        .router()
        .oneshot(json_request(
            "PUT",
            &uri,
            None,
            &json!({ "full_name": "Rina Lubis", "email": "rina@example.test" }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);

    let response = fixture
        .router()
        .oneshot(empty_request("GET", &uri, None))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["profile"]["full_name"], "Rina Lubis");
    assert!(body["cv_url"].is_null());
}

#[tokio::test]
async fn profile_without_email_is_unprocessable() {
    let fixture = build_service();

    let response = fixture
        .router()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/candidates/{CANDIDATE}/profile"),
            None,
            &json!({ "full_name": "Rina Lubis" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert!(body["errors"]["email"].is_array());
}

#[tokio::test]
async fn experience_create_and_delete() {
    let fixture = build_service();

    let response = fixture
        .router()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/candidates/{CANDIDATE}/experiences"),
            None,
            &json!({
                "company_name": "Gojek",
                "position": "Backend Engineer",
                "started_on": "2021-02-01"
            }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::CREATED);
    let experience = read_json_body(response).await;
    let id = experience["id"].as_i64().expect("experience id");

    let uri = format!("/api/v1/candidates/{CANDIDATE}/experiences/{id}");
    let response = fixture
        .router()
        .oneshot(empty_request("DELETE", &uri, None))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = fixture
        .router()
        .oneshot(empty_request("DELETE", &uri, None))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cv_generate_then_download() {
    let fixture = build_service().with_profile();
    let uri = format!("/api/v1/candidates/{CANDIDATE}/cv");

    let response = fixture
        .router()
        .oneshot(empty_request("POST", &uri, None))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    let path = body["profile"]["cv_path"].as_str().expect("cv path");
    assert_eq!(body["cv_url"], format!("/storage/{path}"));

    let response = fixture
        .router()
        .oneshot(empty_request("GET", &uri, None))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/html; charset=utf-8"
    );
    let html = read_text_body(response).await;
    assert!(html.contains("Rina Lubis"));
}
