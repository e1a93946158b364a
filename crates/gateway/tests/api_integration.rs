//! REST API integration tests
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Duration;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use vizora_clock::ManualClock;
use vizora_gateway::{AppState, GatewayConfig, create_router};

const SECRET: &str = "api-integration-secret-0123456789abcdef";

fn setup() -> (Router, Arc<AppState<ManualClock>>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::starting_now());
    let mut config = GatewayConfig::default();
    config.credentials.secret = Some(SECRET.to_string());
    config.server.public_url = "https://app.example.com/".to_string();

    let state = Arc::new(AppState::from_config(config, Arc::clone(&clock)).unwrap());
    (create_router(Arc::clone(&state)), state, clock)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post(uri: &str, org: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(org) = org {
        builder = builder.header("X-Organization-Id", org);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, org: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(org) = org {
        builder = builder.header("X-Organization-Id", org);
    }
    builder.body(Body::empty()).unwrap()
}

async fn request_code(app: &Router, device: &str) -> String {
    let (status, body) = send(
        app,
        post(
            "/devices/pairing/request",
            None,
            json!({"deviceIdentifier": device, "metadata": {"hostname": "lobby-tv"}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["code"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_full_pairing_handshake() {
    let (app, state, _clock) = setup();

    let (status, body) = send(
        &app,
        post(
            "/devices/pairing/request",
            None,
            json!({"deviceIdentifier": "android-1", "nickname": "Lobby TV"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let code = body["code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 6);
    assert_eq!(body["expiresInSeconds"], 600);
    assert_eq!(
        body["pairingUrl"],
        format!("https://app.example.com/dashboard/devices/pair?code={}", code)
    );

    let (status, body) = send(&app, get(&format!("/devices/pairing/status/{}", code), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
    assert!(body.get("deviceToken").is_none());

    let (status, body) = send(
        &app,
        post(
            "/devices/pairing/complete",
            Some("org-1"),
            json!({"code": code.to_lowercase()}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let token = body["deviceToken"].as_str().unwrap().to_string();
    let display_id = body["display"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["display"]["nickname"], "Lobby TV");
    assert_eq!(body["display"]["organizationId"], "org-1");

    let (status, body) = send(&app, get(&format!("/devices/pairing/status/{}", code), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "paired");
    assert_eq!(body["deviceToken"], token);
    assert_eq!(body["displayId"], display_id);

    // The issued credential authenticates the device
    let device = state.authenticator().execute(Some(&token)).await.unwrap();
    assert_eq!(device.display_id.to_string(), display_id);
    assert_eq!(device.device_identifier, "android-1");

    // Paired devices cannot ask for another code
    let (status, body) = send(
        &app,
        post(
            "/devices/pairing/request",
            None,
            json!({"deviceIdentifier": "android-1"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ALREADY_PAIRED");
}

#[tokio::test]
async fn test_request_validation() {
    let (app, _state, _clock) = setup();

    let (status, body) = send(
        &app,
        post(
            "/devices/pairing/request",
            None,
            json!({"deviceIdentifier": "   "}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_unknown_and_malformed_codes_not_found() {
    let (app, _state, _clock) = setup();

    let (status, body) = send(&app, get("/devices/pairing/status/ZZZZZZ", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PAIRING_NOT_FOUND");

    let (status, _) = send(&app, get("/devices/pairing/status/00", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        post(
            "/devices/pairing/complete",
            Some("org-1"),
            json!({"code": "ZZZZZZ"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PAIRING_NOT_FOUND");
}

#[tokio::test]
async fn test_expired_code() {
    let (app, _state, clock) = setup();
    let code = request_code(&app, "android-2").await;

    clock.advance(Duration::minutes(11));

    let (status, body) = send(&app, get(&format!("/devices/pairing/status/{}", code), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "expired");

    let (status, body) = send(
        &app,
        post("/devices/pairing/complete", Some("org-1"), json!({"code": code})),
    )
    .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["code"], "PAIRING_EXPIRED");
}

#[tokio::test]
async fn test_complete_requires_organization() {
    let (app, _state, _clock) = setup();
    let code = request_code(&app, "android-3").await;

    let (status, _) = send(
        &app,
        post("/devices/pairing/complete", None, json!({"code": code})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The session is untouched
    let (_, body) = send(&app, get(&format!("/devices/pairing/status/{}", code), None)).await;
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn test_second_claim_conflicts() {
    let (app, _state, _clock) = setup();
    let code = request_code(&app, "android-4").await;

    let (status, _) = send(
        &app,
        post("/devices/pairing/complete", Some("org-1"), json!({"code": code})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        post("/devices/pairing/complete", Some("org-2"), json!({"code": code})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_CLAIMED");
}

#[tokio::test]
async fn test_concurrent_claims_single_winner() {
    let (app, state, _clock) = setup();
    let code = request_code(&app, "android-5").await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let app = app.clone();
        let code = code.clone();
        handles.push(tokio::spawn(async move {
            let org = format!("org-{}", i);
            send(
                &app,
                post(
                    "/devices/pairing/complete",
                    Some(&org),
                    json!({"code": code}),
                ),
            )
            .await
        }));
    }

    let mut winners = 0;
    let mut tokens = Vec::new();
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        match status {
            StatusCode::OK => {
                winners += 1;
                tokens.push(body["deviceToken"].as_str().unwrap().to_string());
            }
            StatusCode::CONFLICT => assert_eq!(body["code"], "ALREADY_CLAIMED"),
            other => panic!("unexpected status {}", other),
        }
    }
    assert_eq!(winners, 1);

    // The session hands out the winner's token
    let (_, body) = send(&app, get(&format!("/devices/pairing/status/{}", code), None)).await;
    assert_eq!(body["deviceToken"], tokens[0]);
    assert!(state.authenticator().execute(Some(&tokens[0])).await.is_ok());
}

#[tokio::test]
async fn test_active_pairings_lists_pending_only() {
    let (app, _state, _clock) = setup();
    let pending = request_code(&app, "android-6").await;
    let claimed = request_code(&app, "android-7").await;
    send(
        &app,
        post(
            "/devices/pairing/complete",
            Some("org-1"),
            json!({"code": claimed}),
        ),
    )
    .await;

    let (status, _) = send(&app, get("/devices/pairing/active", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, get("/devices/pairing/active", Some("org-1"))).await;
    assert_eq!(status, StatusCode::OK);
    let codes: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec![pending.as_str()]);
}

#[tokio::test]
async fn test_push_to_offline_display_is_undeliverable() {
    let (app, _state, _clock) = setup();
    let display_id = uuid::Uuid::new_v4();

    let (status, body) = send(
        &app,
        post(
            &format!("/displays/{}/push-content", display_id),
            Some("org-1"),
            json!({"contentId": "content-42", "duration": 30}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["delivery"], "undeliverable");

    let (status, _) = send(
        &app,
        get(&format!("/displays/{}/connection", display_id), Some("org-1")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        post(
            "/displays/not-a-uuid/command",
            Some("org-1"),
            json!({"command": "reload"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health() {
    let (app, _state, _clock) = setup();
    let (status, body) = send(&app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["connectedDevices"], 0);
}
