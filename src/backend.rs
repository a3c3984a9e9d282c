//! Backend seam shared by the two task stores.
//!
//! [`TaskBackend`] is the uniform contract the arbitration layer routes
//! through: both the remote client and the local store satisfy it with the
//! same canonical result shapes, so callers never inspect response shapes to
//! work out which store answered.

use async_trait::async_trait;

use crate::error::Result;
use crate::task::{HealthReport, ServiceInfo, Task, TaskPage};

/// Uniform task-operations contract over a backing store.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// Create a task from a description. Fails on empty descriptions.
    async fn create(&self, description: &str) -> Result<Task>;

    /// List all tasks, partitioned with stats and an insight string.
    async fn list(&self) -> Result<TaskPage>;

    /// Mark the task with the given id completed.
    async fn complete(&self, task_id: &str) -> Result<Task>;

    /// Delete the task with the given id.
    async fn delete(&self, task_id: &str) -> Result<()>;

    /// Report store health.
    async fn health(&self) -> Result<HealthReport>;

    /// Describe the store for UI "about" surfaces.
    async fn service_info(&self) -> Result<ServiceInfo>;
}
