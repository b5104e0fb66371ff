//! Shared harness for API integration tests.
//!
//! The router is built with [`build_app_router`], so tests exercise the same
//! middleware stack as production. The session store is an in-process
//! PostgREST stand-in; the webhook and Drive are in-memory fakes.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{Method, Request, Response, StatusCode};
use axum::routing::get as route_get;
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use spijker_api::config::ServerConfig;
use spijker_api::router::build_app_router;
use spijker_api::state::AppState;
use spijker_api::ws::WsManager;
use spijker_core::gallery::Gallery;
use spijker_core::image::ImageDescriptor;
use spijker_core::polling::PollPolicy;
use spijker_core::submission::GenerationRequest;
use spijker_db::{RestStore, StoreConfig};
use spijker_drive::DriveApiError;
use spijker_events::EventBus;
use spijker_pipeline::{FolderSource, GenerationManager, SharedGallery, Submitter};
use spijker_workflow::SubmitError;

pub const STORE_KEY: &str = "service-key";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        max_upload_mb: 5,
        workflow_webhook_url: "http://127.0.0.1:9/webhook".to_string(),
        workflow_timeout_secs: 600,
        session_list_limit: 10,
        poll: PollPolicy::default(),
        history_path: PathBuf::from("unused-history.json"),
    }
}

// ---------------------------------------------------------------------------
// Session store stand-in
// ---------------------------------------------------------------------------

/// Rows served by the stub store plus a counter of every request that
/// reached it.
#[derive(Clone, Default)]
pub struct StubStore {
    pub rows: Arc<Mutex<Vec<Value>>>,
    pub deletes: Arc<Mutex<Vec<String>>>,
    pub writes: Arc<AtomicUsize>,
    pub requests: Arc<AtomicUsize>,
}

impl StubStore {
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

async fn select(
    State(stub): State<StubStore>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    stub.requests.fetch_add(1, Ordering::SeqCst);
    let rows = stub.rows.lock().unwrap();
    let mut out: Vec<Value> = rows
        .iter()
        .filter(|row| match params.get("session_id") {
            Some(filter) => filter.strip_prefix("eq.") == row["session_id"].as_str(),
            None => true,
        })
        .cloned()
        .collect();
    if params.get("order").map(String::as_str) == Some("created_at.desc") {
        out.reverse();
    }
    if let Some(limit) = params.get("limit").and_then(|l| l.parse::<usize>().ok()) {
        out.truncate(limit);
    }
    Json(Value::Array(out))
}

async fn write(State(stub): State<StubStore>) -> StatusCode {
    stub.requests.fetch_add(1, Ordering::SeqCst);
    stub.writes.fetch_add(1, Ordering::SeqCst);
    StatusCode::NO_CONTENT
}

async fn remove(
    State(stub): State<StubStore>,
    Query(params): Query<HashMap<String, String>>,
) -> StatusCode {
    stub.requests.fetch_add(1, Ordering::SeqCst);
    stub.writes.fetch_add(1, Ordering::SeqCst);
    let filter = params.get("session_id").cloned().unwrap_or_default();
    stub.deletes.lock().unwrap().push(filter);
    StatusCode::NO_CONTENT
}

/// Start the stub store with `rows` (oldest first) and return a client
/// pointed at it.
pub async fn stub_store(rows: Vec<Value>) -> (RestStore, StubStore) {
    let stub = StubStore {
        rows: Arc::new(Mutex::new(rows)),
        ..StubStore::default()
    };
    let router = Router::new()
        .route(
            "/rest/v1/image_generations",
            route_get(select).post(write).patch(write).delete(remove),
        )
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let store = RestStore::new(&StoreConfig {
        url: format!("http://{addr}"),
        api_key: STORE_KEY.to_string(),
    })
    .unwrap();
    (store, stub)
}

/// A store client pointed at a port nothing listens on.
pub fn unreachable_store() -> RestStore {
    RestStore::new(&StoreConfig {
        url: "http://127.0.0.1:1".to_string(),
        api_key: STORE_KEY.to_string(),
    })
    .unwrap()
}

/// A stored session row as PostgREST would return it.
pub fn session_row(session_id: &str, name: &str, created_at: &str) -> Value {
    json!({
        "id": format!("row-{session_id}"),
        "session_id": session_id,
        "session_name": name,
        "folder_id": "F1",
        "folder_url": "https://drive.google.com/drive/folders/F1",
        "reference_image_url": null,
        "reference_image_key": null,
        "total_images": 8,
        "generated_count": 0,
        "status": "processing",
        "images": null,
        "error_message": null,
        "created_at": created_at,
        "updated_at": created_at,
        "completed_at": null,
    })
}

// ---------------------------------------------------------------------------
// Pipeline fakes
// ---------------------------------------------------------------------------

/// Webhook that answers after `delay`, or reports cancellation.
pub struct SlowSubmitter {
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl SlowSubmitter {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Submitter for SlowSubmitter {
    async fn submit(
        &self,
        _request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<String, SubmitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::select! {
            _ = cancel.cancelled() => Err(SubmitError::Cancelled),
            _ = tokio::time::sleep(self.delay) => {
                Ok("https://drive.google.com/drive/folders/F1".to_string())
            }
        }
    }
}

/// Folder that never contains anything.
pub struct EmptyFolder;

#[async_trait]
impl FolderSource for EmptyFolder {
    async fn list_images(
        &self,
        _folder_id: &str,
        _description: Option<&str>,
    ) -> Result<Vec<ImageDescriptor>, DriveApiError> {
        Ok(Vec::new())
    }
}

pub fn image(id: &str, folder: &str) -> ImageDescriptor {
    ImageDescriptor {
        id: id.to_string(),
        url: format!("https://img.example/{id}"),
        name: Some(format!("{id}.png")),
        drive_url: None,
        folder_id: Some(folder.to_string()),
        timestamp: 1_700_000_000_000,
        prompt: "blue variant".to_string(),
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// The router plus the shared pieces tests inspect.
pub struct TestApp {
    pub router: Router,
    pub gallery: Arc<SharedGallery>,
    pub event_bus: Arc<EventBus>,
    pub submitter: Arc<SlowSubmitter>,
}

/// Build the full application around `store`, a gallery holding `images`,
/// and a webhook that takes an hour to answer.
pub fn build_test_app(store: RestStore, images: Vec<ImageDescriptor>) -> TestApp {
    let config = test_config();
    let gallery = Arc::new(SharedGallery::in_memory(Gallery::new(images)));
    let event_bus = Arc::new(EventBus::default());
    let submitter = SlowSubmitter::new(Duration::from_secs(3600));

    let generations = Arc::new(GenerationManager::new(
        submitter.clone(),
        Arc::new(EmptyFolder),
        Arc::new(store.clone()),
        config.poll.clone(),
        Arc::clone(&gallery),
        Arc::clone(&event_bus),
    ));

    let state = AppState {
        store,
        config: Arc::new(config.clone()),
        generations,
        gallery: Arc::clone(&gallery),
        ws_manager: Arc::new(WsManager::new()),
        event_bus: Arc::clone(&event_bus),
    };

    TestApp {
        router: build_app_router(state, &config),
        gallery,
        event_bus,
        submitter,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, Body::empty(), None).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    send(
        app,
        Method::POST,
        uri,
        Body::from(body.to_string()),
        Some("application/json"),
    )
    .await
}

pub async fn delete(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Body::empty(), None).await
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Body,
    content_type: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A `multipart/form-data` body builder for upload tests.
pub struct MultipartBody {
    boundary: &'static str,
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "spijker-test-boundary",
            bytes: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(data);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    pub async fn post(mut self, app: &Router, uri: &str) -> Response<Body> {
        self.bytes
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        let content_type = format!("multipart/form-data; boundary={}", self.boundary);
        send(
            app,
            Method::POST,
            uri,
            Body::from(self.bytes),
            Some(&content_type),
        )
        .await
    }
}
