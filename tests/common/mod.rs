#![allow(dead_code)]

use academic_summarizer::config::ProxyConfig;
use academic_summarizer::{AppState, create_app};
use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use url::Url;

pub const PAPER_ID: &str = "3f6c2a0e-8d7b-4c1e-9a55-0b1d2e3f4a5b";

/// Serves `router` on an ephemeral local port.
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// An address nothing listens on.
pub async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn proxy_state(backend: SocketAddr, allowed_origins: &[&str]) -> AppState {
    let config = ProxyConfig {
        backend_url: Url::parse(&format!("http://{backend}")).unwrap(),
        allowed_origins: allowed_origins.iter().map(|o| o.to_string()).collect(),
        request_timeout_secs: 5,
        ..ProxyConfig::default()
    };
    AppState::new(config).unwrap()
}

pub async fn spawn_proxy(backend: SocketAddr) -> SocketAddr {
    spawn(create_app(proxy_state(backend, &["*"]))).await
}

#[derive(Default)]
pub struct BackendState {
    pub uploads: Vec<(String, usize)>,
    pub status_polls: usize,
}

/// In-memory stand-in for the summarizer backend's REST contract.
#[derive(Clone, Default)]
pub struct MockBackend {
    pub state: Arc<Mutex<BackendState>>,
}

impl MockBackend {
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/papers", get(list_papers))
            .route("/api/papers/upload", post(upload_paper))
            .route("/api/papers/:id/status", get(paper_status))
            .route("/api/papers/:id/summary", get(paper_summary))
            .route("/api/papers/:id/html", get(paper_html))
            .route("/api/papers/:id/download/:format", get(download))
            .with_state(self.clone())
    }
}

pub fn paper_json(filename: &str, status: &str, progress: u8) -> Value {
    json!({
        "id": PAPER_ID,
        "filename": filename,
        "original_title": "AI Agents for Economic Research",
        "author": "Anton Korinek",
        "upload_date": "2024-12-19T10:30:00.123456",
        "status": status,
        "processing_progress": progress,
    })
}

pub fn summary_json() -> Value {
    json!({
        "title": "How AI Agents Are Revolutionizing Economic Research",
        "introduction": "Imagine a research assistant that never sleeps.",
        "key_points": [
            {"heading": "What Are AI Agents?", "content": "Assistants that can act on their own."},
            {"heading": "Current Limitations", "content": "They still need human oversight."}
        ],
        "conclusion": "Powerful assistants rather than replacements.",
        "implications": ["Literature reviews in hours, not weeks"]
    })
}

pub const BLOG_HTML: &str =
    "<!DOCTYPE html><html><body><h1>How AI Agents Are Revolutionizing Economic Research</h1></body></html>";

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": format!("{what} not found") })),
    )
        .into_response()
}

async fn list_papers() -> Json<Value> {
    Json(json!([paper_json("agents.pdf", "completed", 100)]))
}

async fn upload_paper(State(backend): State<MockBackend>, mut multipart: Multipart) -> Response {
    while let Some(field) = multipart.next_field().await.unwrap() {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("unnamed").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.unwrap();

        if content_type.as_deref() != Some("application/pdf") || !data.starts_with(b"%PDF") {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "detail": "Only PDF files are allowed" })),
            )
                .into_response();
        }

        backend
            .state
            .lock()
            .unwrap()
            .uploads
            .push((filename.clone(), data.len()));
        return Json(paper_json(&filename, "uploaded", 0)).into_response();
    }

    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "detail": "file field missing" })),
    )
        .into_response()
}

async fn paper_status(State(backend): State<MockBackend>, Path(id): Path<String>) -> Response {
    if id != PAPER_ID {
        return not_found("Paper");
    }
    let polls = {
        let mut state = backend.state.lock().unwrap();
        state.status_polls += 1;
        state.status_polls
    };
    let (status, progress) = if polls < 2 {
        ("processing", 40)
    } else {
        ("completed", 100)
    };
    Json(json!({ "status": status, "progress": progress, "message": null })).into_response()
}

async fn paper_summary(Path(id): Path<String>) -> Response {
    if id != PAPER_ID {
        return not_found("Summary");
    }
    Json(summary_json()).into_response()
}

async fn paper_html(Path(id): Path<String>) -> Response {
    if id != PAPER_ID {
        return not_found("HTML blog");
    }
    Json(json!({ "html_content": BLOG_HTML })).into_response()
}

async fn download(Path((id, format)): Path<(String, String)>) -> Response {
    if id != PAPER_ID {
        return not_found("Paper");
    }
    match format.as_str() {
        "summary" => (
            [
                (header::CONTENT_TYPE, "application/json"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"summary.json\""),
            ],
            summary_json().to_string(),
        )
            .into_response(),
        "html" => (
            [
                (header::CONTENT_TYPE, "text/html"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"blog-post.html\""),
            ],
            BLOG_HTML,
        )
            .into_response(),
        "original" => (
            [
                (header::CONTENT_TYPE, "application/pdf"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"agents.pdf\""),
            ],
            &b"%PDF-1.4 mock"[..],
        )
            .into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Invalid format" })),
        )
            .into_response(),
    }
}
