//! Remote task client.
//!
//! Speaks the wire contract (`/tasks`, `/health`) against a configurable
//! base endpoint, maps HTTP and transport outcomes into the shared
//! [`TaskError`] taxonomy, and runs every payload through the normalizer
//! before it crosses into the core data model.
//!
//! The client never retries internally; retry and fallback policy belong to
//! the arbitration layer. Task CRUD calls carry no client-side timeout;
//! only the availability detector's health probe enforces one.

use async_trait::async_trait;
use reqwest::Response;
use reqwest::header::CONTENT_TYPE;
use serde_json::json;
use tracing::debug;

use crate::backend::TaskBackend;
use crate::error::{Result, TaskError};
use crate::task::{HealthReport, ServiceInfo, Task, TaskPage};
use crate::wire::{self, DeleteEnvelope, HealthPayload, TaskEnvelope, TasksEnvelope};

/// HTTP client for the remote task backend.
pub struct RemoteClient {
    base_url: String,
    client: reqwest::Client,
}

impl RemoteClient {
    /// Create a client for the given base endpoint.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// The configured base endpoint.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Turn a non-success response into a classified error.
    async fn error_from(resp: Response, task_id: Option<&str>) -> TaskError {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        TaskError::from_status(status, &body, task_id)
    }

    /// Decode a successful response body, mapping decode failures to
    /// `Unknown` (fallback-eligible, like any other garbled exchange).
    async fn decode<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T> {
        resp.json::<T>()
            .await
            .map_err(|e| TaskError::Unknown(format!("invalid response payload: {e}")))
    }
}

/// Remote insight decision table over (completed, pending) counts.
///
/// More granular than the local table: it distinguishes the empty list and
/// ahead/behind/on-pace states explicitly.
pub(crate) fn remote_insight(completed: usize, pending: usize) -> String {
    if completed == 0 && pending == 0 {
        "No tasks yet. Add your first task to get started!".to_owned()
    } else if completed > 0 && pending == 0 {
        "Amazing! All tasks completed. Time for new challenges!".to_owned()
    } else if completed >= pending {
        "Great progress! You're staying on top of your tasks.".to_owned()
    } else if pending > completed * 2 {
        "Focus time! Consider tackling smaller tasks first for momentum.".to_owned()
    } else {
        "Good pace! Keep working through your task list.".to_owned()
    }
}

#[async_trait]
impl TaskBackend for RemoteClient {
    async fn create(&self, description: &str) -> Result<Task> {
        let resp = self
            .client
            .post(self.url("/tasks"))
            .json(&json!({ "content": description }))
            .send()
            .await
            .map_err(|e| TaskError::from_transport(&e))?;

        if !resp.status().is_success() {
            return Err(Self::error_from(resp, None).await);
        }

        let envelope: TaskEnvelope = Self::decode(resp).await?;
        let task = wire::normalize(envelope.task);
        debug!(task_id = %task.id, category = %task.category, "task created remotely");
        Ok(task)
    }

    async fn list(&self) -> Result<TaskPage> {
        let resp = self
            .client
            .get(self.url("/tasks"))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| TaskError::from_transport(&e))?;

        if !resp.status().is_success() {
            return Err(Self::error_from(resp, None).await);
        }

        let envelope: TasksEnvelope = Self::decode(resp).await?;
        let tasks: Vec<Task> = envelope.tasks.into_iter().map(wire::normalize).collect();
        debug!(total = tasks.len(), "tasks loaded from backend");
        Ok(TaskPage::from_tasks(tasks, remote_insight))
    }

    async fn complete(&self, task_id: &str) -> Result<Task> {
        let resp = self
            .client
            .put(self.url(&format!("/tasks/{task_id}")))
            .json(&json!({ "status": "completed" }))
            .send()
            .await
            .map_err(|e| TaskError::from_transport(&e))?;

        if !resp.status().is_success() {
            return Err(Self::error_from(resp, Some(task_id)).await);
        }

        let envelope: TaskEnvelope = Self::decode(resp).await?;
        Ok(wire::normalize(envelope.task))
    }

    async fn delete(&self, task_id: &str) -> Result<()> {
        let resp = self
            .client
            .delete(self.url(&format!("/tasks/{task_id}")))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| TaskError::from_transport(&e))?;

        if !resp.status().is_success() {
            return Err(Self::error_from(resp, Some(task_id)).await);
        }

        let _envelope: DeleteEnvelope = Self::decode(resp).await?;
        debug!(task_id, "task deleted remotely");
        Ok(())
    }

    async fn health(&self) -> Result<HealthReport> {
        let resp = self
            .client
            .get(self.url("/health"))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| TaskError::from_transport(&e))?;

        if !resp.status().is_success() {
            return Err(Self::error_from(resp, None).await);
        }

        let payload: HealthPayload = Self::decode(resp).await?;
        Ok(HealthReport {
            status: payload.status,
            service: payload.service,
            version: payload.version,
            features: payload.features.unwrap_or_default(),
        })
    }

    async fn service_info(&self) -> Result<ServiceInfo> {
        // Derived from the health endpoint; the backend has no dedicated
        // info route.
        let health = self.health().await?;
        Ok(ServiceInfo {
            name: format!("{} (remote backend)", health.service),
            description: "Task management backed by the remote task service".to_owned(),
            endpoints: vec![
                ("create".to_owned(), "POST /tasks".to_owned()),
                ("list".to_owned(), "GET /tasks".to_owned()),
                ("complete".to_owned(), "PUT /tasks/{id}".to_owned()),
                ("delete".to_owned(), "DELETE /tasks/{id}".to_owned()),
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insight_distinguishes_empty_list() {
        assert!(remote_insight(0, 0).contains("No tasks yet"));
    }

    #[test]
    fn insight_all_complete() {
        assert!(remote_insight(3, 0).contains("All tasks completed"));
    }

    #[test]
    fn insight_ahead_of_pace() {
        // 4 completed, 1 pending: completed >= pending and completed > 0.
        assert!(remote_insight(4, 1).contains("Great progress"));
    }

    #[test]
    fn insight_behind_pace() {
        assert!(remote_insight(1, 5).contains("Focus time"));
        assert!(remote_insight(0, 3).contains("Focus time"));
    }

    #[test]
    fn insight_on_pace() {
        assert!(remote_insight(2, 3).contains("Good pace"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = RemoteClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/tasks"), "http://localhost:8000/tasks");
    }
}
