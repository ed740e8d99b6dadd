// Event ingestion against a real database

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{create_project, TestApp};
use serde_json::{json, Value};
use trial_rescue::models::ProjectUser;

async fn load_user(app: &TestApp, project_id: uuid::Uuid, external_id: &str) -> ProjectUser {
    let mut conn = app.state.diesel_pool.get().await.unwrap();
    ProjectUser::load_for_project(&mut conn, project_id)
        .await
        .unwrap()
        .into_iter()
        .find(|u| u.external_user_id == external_id)
        .expect("user should exist")
}

#[tokio::test]
async fn test_unknown_api_key_is_rejected() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };

    let response = app
        .post("/api/events")
        .header("authorization", "Bearer tr_doesnotexist")
        .json(&json!({ "event_type": "user_activity", "external_user_id": "u1" }))
        .send()
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await;
    assert_eq!(body["error"], "Invalid API key");
}

#[tokio::test]
async fn test_signup_then_activity_then_upgrade() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let project = create_project(&app).await;
    let bearer = format!("Bearer {}", project.api_key);

    let signed_up_at = Utc::now() - Duration::days(3);
    let response = app
        .post("/api/events")
        .header("authorization", &bearer)
        .json(&json!({
            "event_type": "user_signed_up",
            "external_user_id": "cust_42",
            "email": "Trial.User@example.com",
            "occurred_at": signed_up_at.to_rfc3339(),
        }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await;
    assert_eq!(body["ok"], true);

    let user = load_user(&app, project.project_id, "cust_42").await;
    assert_eq!(user.email.as_deref(), Some("Trial.User@example.com"));
    let started = user.trial_started_at.expect("trial start recorded");
    assert!((started - signed_up_at).num_seconds().abs() <= 1);
    assert_eq!(user.last_activity_at, user.trial_started_at);

    // A second signup does not move the trial start
    app.post("/api/events")
        .header("authorization", &bearer)
        .json(&json!({
            "event_type": "user_signed_up",
            "external_user_id": "cust_42",
            "email": "trial.user@example.com",
        }))
        .send()
        .await;
    let user = load_user(&app, project.project_id, "cust_42").await;
    assert_eq!(user.trial_started_at, Some(started));

    // Activity via the fallback header, numeric id accepted
    let response = app
        .post("/api/events")
        .header("x-trialrescue-api-key", &project.api_key)
        .json(&json!({ "event_type": "user_activity", "external_user_id": 42 }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let numeric = load_user(&app, project.project_id, "42").await;
    assert!(numeric.last_activity_at.is_some());
    assert!(numeric.trial_started_at.is_none());

    let response = app
        .post("/api/events")
        .header("authorization", &bearer)
        .json(&json!({ "event_type": "user_upgraded", "external_user_id": "cust_42" }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let user = load_user(&app, project.project_id, "cust_42").await;
    assert!(user.upgraded_at.is_some());

    // The dashboard sees the most recent event
    let response = app
        .internal(
            "GET",
            &format!("/api/internal/project/last-event?projectId={}", project.project_id),
        )
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await;
    assert!(body["last_event_at"].is_string());
}

#[tokio::test]
async fn test_invalid_events_are_rejected_without_writes() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let project = create_project(&app).await;
    let bearer = format!("Bearer {}", project.api_key);

    let cases = [
        (json!({ "external_user_id": "u1" }), "Missing event_type"),
        (
            json!({ "event_type": "user_deleted", "external_user_id": "u1" }),
            "Unknown event_type: user_deleted",
        ),
        (json!({ "event_type": "user_activity" }), "Missing external_user_id"),
        (
            json!({ "event_type": "user_signed_up", "external_user_id": "u1" }),
            "Missing email for user_signed_up",
        ),
        (
            json!({ "event_type": "user_activity", "external_user_id": "u1", "email": "nope" }),
            "Invalid email",
        ),
        (
            json!({ "event_type": "user_activity", "external_user_id": "x".repeat(300) }),
            "Invalid external_user_id",
        ),
    ];

    for (payload, expected) in cases {
        let response = app
            .post("/api/events")
            .header("authorization", &bearer)
            .json(&payload)
            .send()
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", payload);
        let body: Value = response.json().await;
        assert_eq!(body["error"], expected);
    }

    let mut conn = app.state.diesel_pool.get().await.unwrap();
    let users = ProjectUser::load_for_project(&mut conn, project.project_id)
        .await
        .unwrap();
    assert!(users.is_empty());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let project = create_project(&app).await;

    let response = app
        .post("/api/events")
        .header("authorization", &format!("Bearer {}", project.api_key))
        .raw(b"{ not json")
        .send()
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await;
    assert_eq!(body["error"], "Invalid JSON body");
}

#[tokio::test]
async fn test_late_and_future_events_keep_activity_sane() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let project = create_project(&app).await;
    let bearer = format!("Bearer {}", project.api_key);

    let recent = Utc::now() - Duration::hours(1);
    for occurred_at in [recent, Utc::now() - Duration::days(10)] {
        let response = app
            .post("/api/events")
            .header("authorization", &bearer)
            .json(&json!({
                "event_type": "user_activity",
                "external_user_id": "late_user",
                "occurred_at": occurred_at.to_rfc3339(),
            }))
            .send()
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    // The delayed event does not push activity back ten days
    let user = load_user(&app, project.project_id, "late_user").await;
    let last = user.last_activity_at.expect("activity recorded");
    assert!((last - recent).num_seconds().abs() <= 1);

    let before = Utc::now();
    let response = app
        .post("/api/events")
        .header("authorization", &bearer)
        .json(&json!({
            "event_type": "user_activity",
            "external_user_id": "late_user",
            "occurred_at": (Utc::now() + Duration::days(30)).to_rfc3339(),
        }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Future timestamps are clamped to the time of receipt
    let user = load_user(&app, project.project_id, "late_user").await;
    let last = user.last_activity_at.expect("activity recorded");
    assert!(last >= before - Duration::seconds(1));
    assert!(last <= Utc::now());
}
