//! HTTP API handlers over an in-memory store.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::json;
use tower::ServiceExt;

use alarm_sync::api;
use alarm_sync::api_client::types::{
    AddAlarmResponse, AlarmState, DismissResponse, ErrorResponse, ServiceState, ToggleResponse,
};
use alarm_sync::repository::AlarmRepository;
use alarm_sync::ring::RingController;
use alarm_sync::service::AlarmService;
use alarm_sync::store::{MemoryStore, Operation};
use alarm_sync::types::{AlarmFields, AlarmTime, Period};

struct Harness {
    app: Router,
    store: Arc<MemoryStore>,
    repository: AlarmRepository,
    ring: Arc<RingController>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let repository = AlarmRepository::new(store.clone());
    let ring = Arc::new(RingController::new());
    let service = AlarmService::new(repository.clone(), ring.clone());

    Harness {
        app: api::router(service),
        store,
        repository,
        ring,
    }
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, Vec<u8>) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

fn parse<T: DeserializeOwned>(bytes: &[u8]) -> T {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let h = harness();

    let (status, body) = send(&h.app, Method::GET, "/api/v0/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn initial_state_is_connecting_and_empty() {
    let h = harness();

    let (status, body) = send(&h.app, Method::GET, "/api/v0/state", None).await;
    let state: ServiceState = parse(&body);

    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.status, "connecting");
    assert!(state.alarms.is_empty());
    assert!(state.ringing_alarm.is_none());
    assert!(state.notice.is_none());
}

#[tokio::test]
async fn add_alarm_stores_it_and_posts_notice() {
    let h = harness();

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/v0/alarms",
        Some(json!({ "time": "7:05", "period": "pm" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let added: AddAlarmResponse = parse(&body);
    assert_eq!(h.store.len(), 1);

    let (_, body) = send(&h.app, Method::GET, "/api/v0/state", None).await;
    let state: ServiceState = parse(&body);
    assert_eq!(state.status, "connected");
    assert_eq!(state.alarms.len(), 1);
    let alarm = &state.alarms[0];
    assert_eq!(alarm.id, added.id);
    assert_eq!(alarm.time, "07:05");
    assert_eq!(alarm.period, "PM");
    assert!(alarm.enabled);
    let notice = state.notice.unwrap();
    assert_eq!(notice.kind, "success");
    assert_eq!(notice.message, "Alarm set for 07:05 PM");
}

#[tokio::test]
async fn add_alarm_rejects_bad_input() {
    let h = harness();

    for (time, period) in [("13:00", "AM"), ("7:60", "AM"), ("seven", "AM"), ("7:00", "XM")] {
        let (status, body) = send(
            &h.app,
            Method::POST,
            "/api/v0/alarms",
            Some(json!({ "time": time, "period": period })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{time} {period}");
        let error: ErrorResponse = parse(&body);
        assert!(!error.error.is_empty());
    }
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn add_alarm_store_failure_is_bad_gateway() {
    let h = harness();
    h.store.fail_next(Operation::Create);

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/v0/alarms",
        Some(json!({ "time": "06:30", "period": "AM" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let error: ErrorResponse = parse(&body);
    assert!(error.error.contains("503"), "{}", error.error);

    let (_, body) = send(&h.app, Method::GET, "/api/v0/state", None).await;
    let state: ServiceState = parse(&body);
    assert_eq!(state.notice.unwrap().kind, "error");
}

#[tokio::test]
async fn toggle_flips_enabled() {
    let h = harness();
    h.store.insert(
        "a",
        AlarmFields::new_enabled(AlarmTime::new(8, 0).unwrap(), Period::Am),
    );
    h.repository.refresh().await.unwrap();

    let (status, body) = send(&h.app, Method::PATCH, "/api/v0/alarms/a/toggle", None).await;
    assert_eq!(status, StatusCode::OK);
    let toggled: ToggleResponse = parse(&body);
    assert_eq!(toggled.id, "a");
    assert!(!toggled.enabled);
    assert!(!h.store.get(&"a".into()).unwrap().enabled);

    let (_, body) = send(&h.app, Method::GET, "/api/v0/alarms", None).await;
    let alarms: Vec<AlarmState> = parse(&body);
    assert!(!alarms[0].enabled);
}

#[tokio::test]
async fn toggle_unknown_alarm_is_not_found() {
    let h = harness();
    h.repository.refresh().await.unwrap();

    let (status, _) = send(&h.app, Method::PATCH, "/api/v0/alarms/missing/toggle", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_alarm() {
    let h = harness();
    h.store.insert(
        "a",
        AlarmFields::new_enabled(AlarmTime::new(8, 0).unwrap(), Period::Am),
    );
    h.repository.refresh().await.unwrap();

    let (status, _) = send(&h.app, Method::DELETE, "/api/v0/alarms/a", None).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(h.store.is_empty());
    assert!(h.repository.alarms().is_empty());
}

#[tokio::test]
async fn dismiss_returns_ringing_alarm() {
    let h = harness();
    h.store.insert(
        "a",
        AlarmFields::new_enabled(AlarmTime::new(8, 0).unwrap(), Period::Am),
    );
    h.repository.refresh().await.unwrap();

    let (_, body) = send(&h.app, Method::POST, "/api/v0/ringing/dismiss", None).await;
    let idle: DismissResponse = parse(&body);
    assert!(idle.dismissed.is_none());

    let alarm = h.repository.alarms().get(&"a".into()).cloned().unwrap();
    h.ring.on_match(alarm);

    let (_, body) = send(&h.app, Method::GET, "/api/v0/state", None).await;
    let state: ServiceState = parse(&body);
    assert_eq!(state.ringing_alarm.unwrap().id, "a");

    let (status, body) = send(&h.app, Method::POST, "/api/v0/ringing/dismiss", None).await;
    assert_eq!(status, StatusCode::OK);
    let dismissed: DismissResponse = parse(&body);
    assert_eq!(dismissed.dismissed.unwrap().id, "a");
    assert!(!h.ring.is_ringing());
}

#[tokio::test]
async fn dismiss_notice_clears_it() {
    let h = harness();
    h.store.fail_next(Operation::Delete);
    let (status, _) = send(&h.app, Method::DELETE, "/api/v0/alarms/a", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (status, _) = send(&h.app, Method::DELETE, "/api/v0/notice", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&h.app, Method::GET, "/api/v0/state", None).await;
    let state: ServiceState = parse(&body);
    assert!(state.notice.is_none());
}

#[tokio::test]
async fn serves_openapi_document() {
    let h = harness();

    let (status, body) = send(&h.app, Method::GET, "/api/openapi.json", None).await;
    let doc: serde_json::Value = parse(&body);

    assert_eq!(status, StatusCode::OK);
    let paths = doc["paths"].as_object().unwrap();
    assert!(paths.contains_key("/api/v0/alarms"));
    assert!(paths.contains_key("/api/v0/alarms/{id}/toggle"));
    assert!(paths.contains_key("/api/v0/ringing/dismiss"));
}
