//! Local task store: a self-contained CRUD implementation over one
//! JSON-file slot.
//!
//! Fully functional standalone; this is what the arbitration layer falls
//! back to when the remote backend is unreachable. The persisted layout is a
//! single JSON array of canonical [`Task`] records with string ids.
//!
//! A corrupt or unreadable file is treated as an empty collection on load;
//! persistence problems never crash the caller. Each mutating operation runs
//! its whole load-mutate-persist cycle under one async mutex, so two
//! concurrent local operations cannot lose each other's writes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::backend::TaskBackend;
use crate::error::{Result, TaskError};
use crate::task::{Category, HealthReport, Priority, ServiceInfo, Task, TaskPage};

/// JSON-file-backed task store.
pub struct LocalStore {
    path: PathBuf,
    /// Serializes load-mutate-persist cycles.
    op_lock: Mutex<()>,
}

impl LocalStore {
    /// Create a store persisting to the given file path.
    ///
    /// The file and its parent directory are created lazily on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            op_lock: Mutex::new(()),
        }
    }

    /// Path of the persisted collection.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full collection. Missing or corrupt files load as empty.
    fn load(&self) -> Vec<Task> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "task file unreadable, treating as empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Task>>(&raw) {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "task file corrupt, treating as empty");
                Vec::new()
            }
        }
    }

    /// Persist the full collection atomically (write-then-rename).
    fn persist(&self, tasks: &[Task]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| TaskError::Storage(format!("create {}: {e}", parent.display())))?;
        }

        let payload = serde_json::to_string_pretty(tasks)
            .map_err(|e| TaskError::Storage(format!("serialize tasks: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, payload)
            .map_err(|e| TaskError::Storage(format!("write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| TaskError::Storage(format!("rename into {}: {e}", self.path.display())))?;
        Ok(())
    }
}

/// Local insight decision table over (completed, pending) counts.
pub(crate) fn local_insight(completed: usize, pending: usize) -> String {
    if pending == 0 && completed > 0 {
        "Perfect! All tasks completed. Time to set new goals!".to_owned()
    } else if completed >= pending && completed > 0 {
        "Excellent progress! You're completing tasks efficiently.".to_owned()
    } else if pending > completed * 2 {
        "Focus mode recommended. Consider tackling a few smaller tasks first.".to_owned()
    } else {
        "Good momentum! Keep working through your pending tasks.".to_owned()
    }
}

#[async_trait]
impl TaskBackend for LocalStore {
    async fn create(&self, description: &str) -> Result<Task> {
        let description = description.trim();
        if description.is_empty() {
            return Err(TaskError::Validation(
                "task description must not be empty".to_owned(),
            ));
        }

        let _guard = self.op_lock.lock().await;
        let mut tasks = self.load();

        let task = Task {
            id: Uuid::new_v4().to_string(),
            description: description.to_owned(),
            category: Category::infer(description),
            completed: false,
            priority: Some(Priority::Medium),
            due_date: None,
            created_at: Some(Utc::now()),
            ai_reasoning: None,
            ai_confidence: None,
            ai_tags: Vec::new(),
        };

        tasks.push(task.clone());
        self.persist(&tasks)?;
        debug!(task_id = %task.id, category = %task.category, "task created locally");
        Ok(task)
    }

    async fn list(&self) -> Result<TaskPage> {
        let _guard = self.op_lock.lock().await;
        Ok(TaskPage::from_tasks(self.load(), local_insight))
    }

    async fn complete(&self, task_id: &str) -> Result<Task> {
        let _guard = self.op_lock.lock().await;
        let mut tasks = self.load();

        let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) else {
            return Err(TaskError::NotFound {
                task_id: task_id.to_owned(),
            });
        };
        task.completed = true;
        let completed = task.clone();

        self.persist(&tasks)?;
        debug!(task_id, "task completed locally");
        Ok(completed)
    }

    async fn delete(&self, task_id: &str) -> Result<()> {
        let _guard = self.op_lock.lock().await;
        let mut tasks = self.load();

        let before = tasks.len();
        tasks.retain(|t| t.id != task_id);
        if tasks.len() == before {
            return Err(TaskError::NotFound {
                task_id: task_id.to_owned(),
            });
        }

        self.persist(&tasks)?;
        debug!(task_id, "task deleted locally");
        Ok(())
    }

    async fn health(&self) -> Result<HealthReport> {
        Ok(HealthReport {
            status: "healthy".to_owned(),
            service: "Task Manager (local store)".to_owned(),
            version: Some(env!("CARGO_PKG_VERSION").to_owned()),
            features: vec![
                "task_management".to_owned(),
                "keyword_categorization".to_owned(),
                "productivity_insights".to_owned(),
                "file_storage".to_owned(),
            ],
        })
    }

    async fn service_info(&self) -> Result<ServiceInfo> {
        Ok(ServiceInfo {
            name: "Task Manager (local store)".to_owned(),
            description: "Self-contained task management over a local JSON file, no backend required".to_owned(),
            endpoints: vec![
                ("create".to_owned(), "Create tasks with keyword categorization".to_owned()),
                ("list".to_owned(), "List tasks with productivity insights".to_owned()),
                ("complete".to_owned(), "Mark tasks as completed".to_owned()),
                ("delete".to_owned(), "Remove tasks".to_owned()),
            ],
        })
    }
}
