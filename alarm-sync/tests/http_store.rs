//! `HttpStore` against an in-process Firebase-style store.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
};
use parking_lot::Mutex;
use serde_json::{Value, json};

use alarm_sync::config::StoreConfig;
use alarm_sync::error::{NetworkError, StoreError};
use alarm_sync::repository::{AlarmRepository, ConnectionStatus};
use alarm_sync::store::{AlarmStore, HttpStore};
use alarm_sync::types::{AlarmFields, AlarmPatch, AlarmTime, Period};

#[derive(Clone, Default)]
struct FakeStore {
    records: Arc<Mutex<BTreeMap<String, Value>>>,
    next_id: Arc<AtomicU64>,
    failing: Arc<AtomicBool>,
}

fn record_id(file: &str) -> Option<String> {
    file.strip_suffix(".json").map(str::to_string)
}

impl FakeStore {
    fn unavailable(&self) -> Option<Response> {
        self.failing
            .load(Ordering::SeqCst)
            .then(|| (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response())
    }
}

async fn list(State(store): State<FakeStore>) -> Response {
    if let Some(response) = store.unavailable() {
        return response;
    }
    let records = store.records.lock();
    if records.is_empty() {
        // Firebase answers `null` for a missing collection.
        return Json(Value::Null).into_response();
    }
    Json(json!(*records)).into_response()
}

async fn create(State(store): State<FakeStore>, Json(body): Json<Value>) -> Response {
    if let Some(response) = store.unavailable() {
        return response;
    }
    let id = format!("-N{:03}", store.next_id.fetch_add(1, Ordering::SeqCst));
    store.records.lock().insert(id.clone(), body);
    Json(json!({ "name": id })).into_response()
}

async fn update(
    State(store): State<FakeStore>,
    Path(file): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Some(response) = store.unavailable() {
        return response;
    }
    let Some(id) = record_id(&file) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let mut records = store.records.lock();
    let record = records.entry(id).or_insert_with(|| json!({}));
    if let (Some(record), Some(patch)) = (record.as_object_mut(), body.as_object()) {
        for (key, value) in patch {
            record.insert(key.clone(), value.clone());
        }
    }
    Json(body).into_response()
}

async fn delete(State(store): State<FakeStore>, Path(file): Path<String>) -> Response {
    if let Some(response) = store.unavailable() {
        return response;
    }
    if let Some(id) = record_id(&file) {
        store.records.lock().remove(&id);
    }
    Json(Value::Null).into_response()
}

async fn spawn_fake() -> (FakeStore, SocketAddr) {
    let fake = FakeStore::default();
    let app = Router::new()
        .route("/alarms.json", get(list).post(create))
        .route("/alarms/{file}", patch(update).delete(delete))
        .with_state(fake.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    (fake, addr)
}

fn http_store(addr: SocketAddr) -> HttpStore {
    HttpStore::new(&StoreConfig {
        base_url: format!("http://{addr}"),
        path_suffix: ".json".to_string(),
        ..StoreConfig::default()
    })
    .unwrap()
}

fn seven_am() -> AlarmFields {
    AlarmFields::new_enabled(AlarmTime::new(7, 0).unwrap(), Period::Am)
}

#[tokio::test]
async fn empty_store_lists_nothing() {
    let (_fake, addr) = spawn_fake().await;
    let store = http_store(addr);

    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn crud_round_trip() {
    let (fake, addr) = spawn_fake().await;
    let store = http_store(addr);

    let id = store.create(&seven_am()).await.unwrap();
    assert_eq!(id.as_str(), "-N000");

    let stored = fake.records.lock().get("-N000").cloned().unwrap();
    assert_eq!(stored["time"], "07:00");
    assert_eq!(stored["period"], "AM");
    assert_eq!(stored["enabled"], true);
    assert!(stored.get("id").is_none());

    let alarms = store.list().await.unwrap();
    assert_eq!(alarms.get(&id).unwrap().hour_minute(), (7, 0));

    store.update(&id, AlarmPatch { enabled: false }).await.unwrap();
    assert!(!store.list().await.unwrap().get(&id).unwrap().enabled);

    store.delete(&id).await.unwrap();
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn non_success_status_is_a_network_error() {
    let (fake, addr) = spawn_fake().await;
    let store = http_store(addr);
    fake.failing.store(true, Ordering::SeqCst);

    match store.list().await {
        Err(StoreError::Network(NetworkError::Status { status, body })) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected status error, got {other:?}"),
    }
    assert!(store.create(&seven_am()).await.is_err());
    assert!(
        store
            .update(&"-N000".into(), AlarmPatch { enabled: true })
            .await
            .is_err()
    );
    assert!(store.delete(&"-N000".into()).await.is_err());
}

#[tokio::test]
async fn unreachable_store_is_a_transport_error() {
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let store = http_store(addr);

    assert!(matches!(
        store.list().await,
        Err(StoreError::Network(NetworkError::Transport(_)))
    ));
}

#[tokio::test]
async fn record_missing_a_field_is_malformed() {
    let (fake, addr) = spawn_fake().await;
    fake.records
        .lock()
        .insert("-Nbad".to_string(), json!({ "time": "07:00", "enabled": true }));
    let store = http_store(addr);

    match store.list().await {
        Err(StoreError::MalformedRecord { id, .. }) => assert_eq!(id, "-Nbad"),
        other => panic!("expected MalformedRecord, got {other:?}"),
    }
}

#[tokio::test]
async fn repository_over_http() {
    let (fake, addr) = spawn_fake().await;
    let repository = AlarmRepository::new(Arc::new(http_store(addr)));

    repository.refresh().await.unwrap();
    assert_eq!(repository.status(), ConnectionStatus::Connected);

    let id = repository
        .add(AlarmTime::new(12, 30).unwrap(), Period::Pm)
        .await
        .unwrap();
    assert_eq!(repository.alarms().get(&id).unwrap().hour_minute(), (12, 30));

    assert!(!repository.toggle_enabled(&id).await.unwrap());
    assert!(!repository.alarms().get(&id).unwrap().enabled);

    fake.failing.store(true, Ordering::SeqCst);
    assert!(repository.toggle_enabled(&id).await.is_err());
    assert!(!repository.alarms().get(&id).unwrap().enabled);
    assert!(repository.refresh().await.is_err());
    assert_eq!(repository.status(), ConnectionStatus::Error);
    assert_eq!(repository.alarms().len(), 1);

    fake.failing.store(false, Ordering::SeqCst);
    repository.remove(&id).await.unwrap();
    assert!(repository.alarms().is_empty());
    assert_eq!(repository.status(), ConnectionStatus::Connected);
}
