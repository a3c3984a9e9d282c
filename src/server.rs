//! Reference backend server.
//!
//! An in-memory implementation of the remote wire contract, used for local
//! development and end-to-end exercises of the client stack. Speaks exactly
//! the envelopes in [`crate::wire`]: `GET`/`POST /tasks`, `PUT`/`DELETE
//! /tasks/{id}`, `GET /health`.
//!
//! Categorization here is pattern-based: the shared keyword sets pick a
//! category, and a small heuristic picks a priority.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::{Result, TaskError};
use crate::task::Category;
use crate::wire::{DeleteEnvelope, HealthPayload, TaskEnvelope, TaskRecord, TasksEnvelope};

const URGENT_WORDS: &[&str] = &["urgent", "asap", "immediately", "deadline", "critical"];

#[derive(Debug, Deserialize)]
struct CreateRequest {
    content: String,
}

#[derive(Debug, Deserialize)]
struct UpdateRequest {
    status: String,
}

#[derive(Default)]
struct Store {
    tasks: Vec<TaskRecord>,
    next_id: u64,
}

#[derive(Clone)]
struct AppState {
    store: Arc<Mutex<Store>>,
}

impl AppState {
    fn lock(&self) -> std::sync::MutexGuard<'_, Store> {
        match self.store.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// In-memory task backend bound to a local port.
pub struct TaskServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TaskServer {
    /// Bind and start serving. Pass port 0 to pick a free port.
    pub async fn start(addr: SocketAddr) -> Result<Self> {
        let state = AppState {
            store: Arc::new(Mutex::new(Store::default())),
        };

        let router = Router::new()
            .route("/tasks", get(list_tasks).post(create_task))
            .route("/tasks/{id}", put(update_task).delete(delete_task))
            .route("/health", get(health))
            .with_state(state);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| TaskError::Config(format!("bind {addr}: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| TaskError::Config(format!("local addr: {e}")))?;

        info!(%addr, "task backend listening");
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "task backend exited");
            }
        });

        Ok(Self { addr, handle })
    }

    /// The bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The bound port.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Base URL clients should target.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop serving.
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for TaskServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ── Handlers ───────────────────────────────────────────────────

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "success": false, "message": message })),
    )
        .into_response()
}

async fn list_tasks(State(state): State<AppState>) -> Json<TasksEnvelope> {
    let store = state.lock();
    Json(TasksEnvelope {
        success: true,
        tasks: store.tasks.clone(),
    })
}

async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<CreateRequest>,
) -> Response {
    let content = req.content.trim();
    if content.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "task content must not be empty");
    }

    let category = Category::infer(content);
    let priority = infer_priority(content);

    let mut store = state.lock();
    store.next_id += 1;
    let record = TaskRecord {
        id: store.next_id.to_string(),
        content: content.to_owned(),
        category: Some(category.as_str().to_owned()),
        priority: Some(priority.to_owned()),
        status: Some("pending".to_owned()),
        due_date: None,
        created_at: Some(Utc::now().to_rfc3339()),
        ai_reasoning: Some("Pattern-based categorization".to_owned()),
        ai_confidence: Some(0.85),
        ai_tags: Some(vec![category.as_str().to_lowercase()]),
    };
    store.tasks.push(record.clone());

    Json(TaskEnvelope {
        success: true,
        message: Some("Task created successfully".to_owned()),
        task: record,
    })
    .into_response()
}

async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRequest>,
) -> Response {
    if !matches!(req.status.as_str(), "pending" | "in-progress" | "completed") {
        return error_response(StatusCode::BAD_REQUEST, "unrecognized task status");
    }

    let mut store = state.lock();
    let Some(record) = store.tasks.iter_mut().find(|t| t.id == id) else {
        return error_response(StatusCode::NOT_FOUND, "task not found");
    };
    record.status = Some(req.status);

    Json(TaskEnvelope {
        success: true,
        message: Some("Task updated successfully".to_owned()),
        task: record.clone(),
    })
    .into_response()
}

async fn delete_task(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let mut store = state.lock();
    let before = store.tasks.len();
    store.tasks.retain(|t| t.id != id);
    if store.tasks.len() == before {
        return error_response(StatusCode::NOT_FOUND, "task not found");
    }

    Json(DeleteEnvelope {
        success: true,
        message: Some("Task deleted successfully".to_owned()),
    })
    .into_response()
}

async fn health() -> Json<HealthPayload> {
    Json(HealthPayload {
        status: "healthy".to_owned(),
        service: "TaskRelay Backend".to_owned(),
        version: Some(env!("CARGO_PKG_VERSION").to_owned()),
        features: Some(vec![
            "task_management".to_owned(),
            "pattern_categorization".to_owned(),
            "productivity_insights".to_owned(),
        ]),
    })
}

fn infer_priority(content: &str) -> &'static str {
    let lowered = content.to_lowercase();
    if URGENT_WORDS.iter().any(|w| lowered.contains(w)) {
        "high"
    } else if content.len() < 20 {
        "low"
    } else {
        "medium"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urgent_content_is_high_priority() {
        assert_eq!(infer_priority("URGENT: file the report"), "high");
        assert_eq!(infer_priority("meet deadline for the project plan"), "high");
    }

    #[test]
    fn short_content_is_low_priority() {
        assert_eq!(infer_priority("buy milk"), "low");
    }

    #[test]
    fn ordinary_content_is_medium_priority() {
        assert_eq!(
            infer_priority("prepare the quarterly planning document"),
            "medium"
        );
    }
}
