#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use reelforge_core::job::JobStatus;
use tokio::sync::Semaphore;
use tower::ServiceExt;

use reelforge_api::config::ServerConfig;
use reelforge_api::frames::{FrameDataStore, InMemoryFrameStore};
use reelforge_api::router::build_app_router;
use reelforge_api::runner::{RenderInvocation, RenderRunner, Renderer, RendererError};
use reelforge_api::state::AppState;
use reelforge_api::store::JobStore;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        frame_data_dir: None,
        renderer_command: None,
        public_base_url: "http://render.test".to_string(),
        job_retention_secs: 3600,
        retention_sweep_secs: 60,
    }
}

/// Renderer that records its invocations and blocks until released.
pub struct StubRenderer {
    outcome: Result<String, String>,
    gate: Semaphore,
    invocations: Mutex<Vec<RenderInvocation>>,
}

impl StubRenderer {
    pub fn succeeding(output_url: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(output_url.to_string()),
            gate: Semaphore::new(0),
            invocations: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(stderr: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(stderr.to_string()),
            gate: Semaphore::new(0),
            invocations: Mutex::new(Vec::new()),
        })
    }

    /// Let one pending render finish.
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn invocations(&self) -> Vec<RenderInvocation> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl Renderer for StubRenderer {
    async fn render(&self, invocation: &RenderInvocation) -> Result<String, RendererError> {
        self.invocations.lock().unwrap().push(invocation.clone());
        self.gate
            .acquire()
            .await
            .map_err(|_| RendererError::Cancelled)?
            .forget();
        self.outcome.clone().map_err(|stderr| RendererError::Failed {
            exit_code: Some(1),
            stderr,
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

/// Build the full application router with all middleware layers, backed
/// by an in-memory frame store.
pub fn build_test_app(renderer: Arc<StubRenderer>) -> TestApp {
    build_test_app_with_store(renderer, Arc::new(InMemoryFrameStore::new()))
}

pub fn build_test_app_with_store(
    renderer: Arc<StubRenderer>,
    frames: Arc<dyn FrameDataStore>,
) -> TestApp {
    let config = test_config();
    let jobs = Arc::new(JobStore::new());
    let runner = Arc::new(RenderRunner::new(
        Arc::clone(&jobs),
        Arc::clone(&frames),
        renderer,
        config.public_base_url.clone(),
    ));

    let state = AppState {
        config: Arc::new(config.clone()),
        jobs,
        frames,
        runner,
    };

    TestApp {
        router: build_app_router(state.clone(), &config),
        state,
    }
}

pub async fn get(app: &TestApp, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn post_json(app: &TestApp, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

/// A valid request with `slides` authored slides.
pub fn render_request(slides: usize) -> serde_json::Value {
    let slides: Vec<String> = (1..=slides).map(|i| format!("Slide {i}")).collect();
    serde_json::json!({
        "brand_name": "Acme",
        "slides": slides,
        "theme": "sky-blue",
        "script_title": "Quarterly update",
    })
}

/// Poll the status endpoint until the job reaches `expected`.
pub async fn wait_for_status(app: &TestApp, id: &str, expected: JobStatus) -> serde_json::Value {
    for _ in 0..200 {
        let job = body_json(get(app, &format!("/render/{id}/status")).await).await;
        if job["status"] == expected.as_str() {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {id} never reached {expected}");
}
