mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::http::{HeaderValue, StatusCode};
use chrono::Duration;
use serde_json::{json, Value};
use uuid::Uuid;

use common::{sso_token, trigger_secret, FailingPublisher, TestApp, SSO_SECRET, TRIGGER_HEADER};
use epic_ai::models::*;

fn auto_post(platforms: &[Platform]) -> UpdateAutopilotSettingsInput {
    UpdateAutopilotSettingsInput {
        on_lead_converted: Some(true),
        approval_mode: Some(ApprovalMode::AutoPost),
        default_platforms: Some(platforms.iter().copied().collect::<BTreeSet<_>>()),
        ..Default::default()
    }
}

fn lead_converted(org: Uuid) -> Value {
    json!({
        "organizationId": org,
        "triggerType": "LEAD_CONVERTED",
        "data": {"industry": "dental"}
    })
}

async fn fire(app: &TestApp, body: &Value) -> axum_test::TestResponse {
    app.server
        .post("/social/trigger")
        .add_header(TRIGGER_HEADER, trigger_secret())
        .json(body)
        .await
}

#[tokio::test]
async fn test_disabled_autopilot_creates_nothing() {
    let (app, publisher) = TestApp::with_recording(&[Platform::Twitter]);
    let org = Uuid::new_v4();

    let response = fire(&app, &lead_converted(org)).await;
    response.assert_status_ok();
    response.assert_json(&json!({"success": false, "reason": "Autopilot not enabled"}));

    assert!(app.db.list_suggestions(org, None).unwrap().is_empty());
    assert_eq!(publisher.post_count(), 0);
}

#[tokio::test]
async fn test_disabled_trigger_creates_nothing() {
    let (app, _) = TestApp::with_recording(&[Platform::Twitter]);
    let org = Uuid::new_v4();
    app.enable_autopilot(org, UpdateAutopilotSettingsInput::default());

    let response = fire(&app, &lead_converted(org)).await;
    response.assert_json(&json!({"success": false, "reason": "Trigger not enabled"}));
    assert!(app.db.list_suggestions(org, None).unwrap().is_empty());
}

#[tokio::test]
async fn test_manual_trigger_is_always_enabled() {
    let (app, _) = TestApp::with_recording(&[]);
    let org = Uuid::new_v4();
    app.enable_autopilot(org, UpdateAutopilotSettingsInput::default());

    let response = fire(
        &app,
        &json!({"organizationId": org, "triggerType": "MANUAL", "data": {"prompt": "Open house Saturday"}}),
    )
    .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["autoPosted"], false);

    let suggestions = app.db.list_suggestions(org, None).unwrap();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].status, SuggestionStatus::Pending);
    assert_eq!(suggestions[0].content, "Open house Saturday");
}

#[tokio::test]
async fn test_auto_post_publishes_and_logs() {
    let (app, publisher) = TestApp::with_recording(&[Platform::Twitter, Platform::Facebook]);
    let org = Uuid::new_v4();
    app.enable_autopilot(org, auto_post(&[Platform::Twitter]));

    let response = fire(&app, &lead_converted(org)).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["autoPosted"], true);
    assert!(body.get("reason").is_none());

    let id: Uuid = serde_json::from_value(body["suggestionId"].clone()).unwrap();
    let suggestion = app.db.get_suggestion(org, id).unwrap().unwrap();
    assert_eq!(suggestion.status, SuggestionStatus::Posted);
    assert_eq!(suggestion.post_id.as_deref(), Some("post-1"));
    assert_eq!(suggestion.post_platforms, vec![Platform::Twitter]);
    assert!(suggestion.content.contains("dental"));

    let log = app.db.list_post_log(org).unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].suggestion_id, id);

    let posts = publisher.posts.lock().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].integration_ids, vec!["integration-0".to_string()]);
}

#[tokio::test]
async fn test_publishing_failure_is_swallowed() {
    let app = TestApp::new(Arc::new(FailingPublisher));
    let org = Uuid::new_v4();
    app.enable_autopilot(org, auto_post(&[Platform::Twitter]));

    let response = fire(&app, &lead_converted(org)).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["autoPosted"], true);

    let suggestions = app.db.list_suggestions(org, None).unwrap();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].status, SuggestionStatus::Approved);
    assert!(suggestions[0].post_id.is_none());
    assert!(app.db.list_post_log(org).unwrap().is_empty());
}

#[tokio::test]
async fn test_auto_post_without_platforms_leaves_suggestion_approved() {
    let (app, publisher) = TestApp::with_recording(&[Platform::Twitter]);
    let org = Uuid::new_v4();
    app.enable_autopilot(org, auto_post(&[]));

    let body: Value = fire(&app, &lead_converted(org)).await.json();
    assert_eq!(body["autoPosted"], true);
    assert_eq!(
        app.db.list_suggestions(org, None).unwrap()[0].status,
        SuggestionStatus::Approved
    );
    assert_eq!(publisher.post_count(), 0);
}

#[tokio::test]
async fn test_rate_limited_auto_post_waits_for_approval() {
    let (app, publisher) = TestApp::with_recording(&[Platform::Linkedin]);
    let org = Uuid::new_v4();
    app.enable_autopilot(
        org,
        UpdateAutopilotSettingsInput {
            max_posts_per_day: Some(1),
            ..auto_post(&[Platform::Linkedin])
        },
    );

    let first: Value = fire(&app, &lead_converted(org)).await.json();
    assert_eq!(first["autoPosted"], true);

    let response = fire(&app, &lead_converted(org)).await;
    response.assert_status_ok();
    let second: Value = response.json();
    assert_eq!(second["success"], true);
    assert_eq!(second["autoPosted"], false);
    assert_eq!(second["reason"], "Rate limited");

    let pending = app
        .db
        .list_suggestions(org, Some(SuggestionStatus::Pending))
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(publisher.post_count(), 1);
}

#[tokio::test]
async fn test_trigger_secret_is_checked_before_the_body() {
    let (app, _) = TestApp::with_recording(&[]);

    let response = app
        .server
        .post("/social/trigger")
        .add_header(TRIGGER_HEADER, HeaderValue::from_static("wrong"))
        .text("{not json")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["reason"], "unauthenticated");

    app.server
        .post("/social/trigger")
        .text("{not json")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_trigger_has_no_side_effects() {
    let (app, _) = TestApp::with_recording(&[Platform::Twitter]);
    let org = Uuid::new_v4();
    app.enable_autopilot(org, auto_post(&[Platform::Twitter]));

    let response = fire(&app, &json!({"organizationId": org, "triggerType": "BIRTHDAY"})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["reason"], "validation_error");

    let response = fire(&app, &json!({"triggerType": "MANUAL"})).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    assert!(app.db.list_suggestions(org, None).unwrap().is_empty());
}

#[tokio::test]
async fn test_approve_publishes_pending_suggestion() {
    let (app, publisher) = TestApp::with_recording(&[Platform::Twitter]);
    let org = Uuid::new_v4();
    let (_, token) = app.login("reviewer@example.com", Some(org));
    app.enable_autopilot(
        org,
        UpdateAutopilotSettingsInput {
            on_lead_converted: Some(true),
            default_platforms: Some(BTreeSet::from([Platform::Twitter])),
            ..Default::default()
        },
    );

    let body: Value = fire(&app, &lead_converted(org)).await.json();
    assert_eq!(body["autoPosted"], false);
    let id = body["suggestionId"].as_str().unwrap().to_string();

    let listed: Value = app
        .server
        .get("/social/suggestions")
        .add_query_param("status", "pending")
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let response = app
        .server
        .post(&format!("/social/suggestions/{}/approve", id))
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let approved: Value = response.json();
    assert_eq!(approved["status"], "POSTED");
    assert_eq!(approved["postPlatforms"], json!(["twitter"]));
    assert_eq!(publisher.post_count(), 1);

    let again = app
        .server
        .post(&format!("/social/suggestions/{}/approve", id))
        .authorization_bearer(&token)
        .await;
    again.assert_status(StatusCode::CONFLICT);
    assert_eq!(again.json::<Value>()["reason"], "invalid_state");
    assert_eq!(publisher.post_count(), 1);
}

#[tokio::test]
async fn test_approve_surfaces_publishing_failure() {
    let app = TestApp::new(Arc::new(FailingPublisher));
    let org = Uuid::new_v4();
    let (_, token) = app.login("reviewer@example.com", Some(org));
    app.enable_autopilot(
        org,
        UpdateAutopilotSettingsInput {
            default_platforms: Some(BTreeSet::from([Platform::Instagram])),
            ..Default::default()
        },
    );

    let body: Value = fire(&app, &json!({"organizationId": org, "triggerType": "MANUAL"})).await.json();
    let id = body["suggestionId"].as_str().unwrap().to_string();

    let response = app
        .server
        .post(&format!("/social/suggestions/{}/approve", id))
        .authorization_bearer(&token)
        .await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    assert_eq!(response.json::<Value>()["reason"], "downstream_failure");

    let pending = app.db.list_suggestions(org, Some(SuggestionStatus::Pending)).unwrap();
    assert_eq!(pending.len(), 1);
}

#[tokio::test]
async fn test_dismiss_is_terminal() {
    let (app, _) = TestApp::with_recording(&[]);
    let org = Uuid::new_v4();
    let (_, token) = app.login("reviewer@example.com", Some(org));
    app.enable_autopilot(org, UpdateAutopilotSettingsInput::default());

    let body: Value = fire(&app, &json!({"organizationId": org, "triggerType": "MANUAL"})).await.json();
    let id = body["suggestionId"].as_str().unwrap().to_string();

    let response = app
        .server
        .post(&format!("/social/suggestions/{}/dismiss", id))
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let dismissed: Value = response.json();
    assert_eq!(dismissed["status"], "DISMISSED");
    assert!(dismissed["dismissedAt"].is_string());

    app.server
        .post(&format!("/social/suggestions/{}/dismiss", id))
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::CONFLICT);
    app.server
        .post(&format!("/social/suggestions/{}/approve", id))
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_suggestions_are_scoped_to_the_caller_organization() {
    let (app, _) = TestApp::with_recording(&[]);
    let org = Uuid::new_v4();
    let (_, outsider) = app.login("outsider@example.com", Some(Uuid::new_v4()));
    let (_, no_org) = app.login("loner@example.com", None);
    app.enable_autopilot(org, UpdateAutopilotSettingsInput::default());

    let body: Value = fire(&app, &json!({"organizationId": org, "triggerType": "MANUAL"})).await.json();
    let id = body["suggestionId"].as_str().unwrap().to_string();

    app.server
        .post(&format!("/social/suggestions/{}/dismiss", id))
        .authorization_bearer(&outsider)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let response = app.server.get("/social/suggestions").authorization_bearer(&no_org).await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["reason"], "not_found");
}

#[tokio::test]
async fn test_settings_round_trip_through_the_api() {
    let (app, _) = TestApp::with_recording(&[]);
    let org = Uuid::new_v4();
    let (_, token) = app.login("admin@example.com", Some(org));

    let defaults: Value = app
        .server
        .get("/social/autopilot")
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(defaults["enabled"], false);
    assert_eq!(defaults["approvalMode"], "REQUIRES_APPROVAL");
    assert_eq!(defaults["maxPostsPerDay"], 3);

    let response = app
        .server
        .put("/social/autopilot")
        .authorization_bearer(&token)
        .json(&json!({
            "enabled": true,
            "onFiveStarCall": true,
            "approvalMode": "AUTO_POST",
            "defaultPlatforms": ["linkedin"]
        }))
        .await;
    response.assert_status_ok();
    let saved: Value = response.json();
    assert_eq!(saved["enabled"], true);
    assert_eq!(saved["onFiveStarCall"], true);
    assert_eq!(saved["onLeadConverted"], false);
    assert_eq!(saved["defaultPlatforms"], json!(["linkedin"]));

    app.server
        .put("/social/autopilot")
        .authorization_bearer(&token)
        .json(&json!({"maxPostsPerDay": 0}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_auto_login_provisions_once_per_email() {
    let (app, _) = TestApp::with_recording(&[]);
    let org = Uuid::new_v4();
    let token = sso_token(SSO_SECRET, "New.Owner@Example.com", Some(org), Duration::minutes(5));

    let response = app
        .server
        .post("/auth/auto-login")
        .json(&json!({"token": token}))
        .await;
    response.assert_status_ok();
    let first: Value = response.json();
    assert_eq!(first["created"], true);
    assert_eq!(first["user"]["email"], "new.owner@example.com");
    assert_eq!(first["user"]["organizationId"], json!(org));

    let second: Value = app
        .server
        .post("/auth/auto-login")
        .json(&json!({"token": token}))
        .await
        .json();
    assert_eq!(second["created"], false);
    assert_eq!(second["user"]["id"], first["user"]["id"]);

    let session = first["token"].as_str().unwrap();
    app.server
        .get("/social/suggestions")
        .authorization_bearer(session)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_auto_login_rejects_bad_tokens() {
    let (app, _) = TestApp::with_recording(&[]);

    let expired = sso_token(SSO_SECRET, "late@example.com", None, Duration::minutes(-10));
    app.server
        .post("/auth/auto-login")
        .json(&json!({"token": expired}))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let forged = sso_token(
        "some-other-secret-0123456789abcdefghijkl",
        "forged@example.com",
        None,
        Duration::minutes(5),
    );
    app.server
        .post("/auth/auto-login")
        .json(&json!({"token": forged}))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    assert!(app.db.find_user_by_email("forged@example.com").unwrap().is_none());
}
