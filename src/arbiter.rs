//! Per-operation backend arbitration.
//!
//! [`TaskService`] is the facade the rest of the application talks to. Every
//! operation independently decides whether to attempt the remote backend or
//! go straight to the local store, then classifies any remote failure:
//! connectivity-shaped failures fall back to the local store, semantic
//! failures (not found, validation) surface verbatim without consulting it.
//!
//! Routing state is deliberately small: one flag for whether the last remote
//! attempt succeeded, one timestamp for the last remote failure. A cooldown
//! window keeps a flapping backend from being re-probed on every operation.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::backend::TaskBackend;
use crate::config::ServiceConfig;
use crate::detector::{BackendDetector, BackendStatus};
use crate::error::Result;
use crate::local::LocalStore;
use crate::remote::RemoteClient;
use crate::task::{HealthReport, ServiceInfo, Task, TaskPage};

/// Default wait after a remote failure before optimistic retries.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(10);

/// What routing remembers between operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingMemory {
    /// Whether the most recent remote attempt succeeded.
    pub last_remote_success: bool,
    /// When the most recent remote attempt failed.
    pub last_failure_at: Option<Instant>,
}

impl RoutingMemory {
    fn cooldown_elapsed(&self, cooldown: Duration) -> bool {
        self.last_failure_at.is_none_or(|at| at.elapsed() >= cooldown)
    }
}

/// Static routing knobs, fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct RoutingPolicy {
    /// Wait after a remote failure before optimistic retries.
    pub cooldown: Duration,
    /// Whether a backend endpoint was explicitly configured, as opposed to
    /// the built-in development default.
    pub remote_configured: bool,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            remote_configured: false,
        }
    }
}

/// Task-operations facade with per-operation remote/local arbitration.
pub struct TaskService<R: TaskBackend, L: TaskBackend> {
    remote: R,
    local: L,
    detector: BackendDetector,
    policy: RoutingPolicy,
    memory: Mutex<RoutingMemory>,
}

impl TaskService<RemoteClient, LocalStore> {
    /// Assemble the standard service from configuration: HTTP remote client,
    /// JSON-file local store, and a detector probing the same endpoint.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let (base_url, explicit) = config.backend_base_url();
        let policy = RoutingPolicy {
            cooldown: config.backend.cooldown(),
            remote_configured: explicit,
        };
        Self::new(
            RemoteClient::new(&base_url),
            LocalStore::new(config.storage_path()),
            BackendDetector::with_timeout(&base_url, config.backend.probe_timeout()),
            policy,
        )
    }
}

impl<R: TaskBackend, L: TaskBackend> TaskService<R, L> {
    /// Build a service from its parts.
    pub fn new(remote: R, local: L, detector: BackendDetector, policy: RoutingPolicy) -> Self {
        Self {
            remote,
            local,
            detector,
            policy,
            memory: Mutex::new(RoutingMemory::default()),
        }
    }

    // ── Lifecycle ──────────────────────────────────────────────

    /// Start background availability polling at the given interval.
    pub fn start(&self, poll_interval: Duration) {
        self.detector.start(poll_interval);
    }

    /// Stop background availability polling.
    pub fn stop(&self) {
        self.detector.stop();
    }

    // ── Status ─────────────────────────────────────────────────

    /// Last observed backend status, read from the detector's cache.
    pub fn backend_status(&self) -> BackendStatus {
        self.detector.status()
    }

    /// Force a fresh probe and return the updated status.
    pub async fn refresh_backend_status(&self) -> BackendStatus {
        self.detector.check_now().await
    }

    /// Snapshot of the routing memory.
    pub fn routing_memory(&self) -> RoutingMemory {
        *self.lock_memory()
    }

    // ── Operations ─────────────────────────────────────────────

    /// Create a task from a description.
    pub async fn create_task(&self, description: &str) -> Result<Task> {
        self.route(
            "create",
            self.remote.create(description),
            self.local.create(description),
        )
        .await
    }

    /// List all tasks, partitioned with stats and an insight.
    pub async fn get_tasks(&self) -> Result<TaskPage> {
        self.route("list", self.remote.list(), self.local.list()).await
    }

    /// Mark a task completed.
    pub async fn complete_task(&self, task_id: &str) -> Result<Task> {
        self.route(
            "complete",
            self.remote.complete(task_id),
            self.local.complete(task_id),
        )
        .await
    }

    /// Delete a task.
    pub async fn delete_task(&self, task_id: &str) -> Result<()> {
        self.route(
            "delete",
            self.remote.delete(task_id),
            self.local.delete(task_id),
        )
        .await
    }

    /// Health of whichever store currently serves operations.
    pub async fn health_check(&self) -> Result<HealthReport> {
        self.route("health", self.remote.health(), self.local.health())
            .await
    }

    /// Self-description of whichever store currently serves operations.
    pub async fn service_info(&self) -> Result<ServiceInfo> {
        self.route(
            "service_info",
            self.remote.service_info(),
            self.local.service_info(),
        )
        .await
    }

    // ── Routing core ───────────────────────────────────────────

    /// Decide, attempt, classify. The remote is attempted when any of:
    /// the detector currently reports it available; the last remote attempt
    /// succeeded and the cooldown has elapsed; or an endpoint was explicitly
    /// configured and the cooldown has elapsed. Otherwise the operation goes
    /// straight to the local store.
    async fn route<T>(
        &self,
        operation: &'static str,
        remote: impl Future<Output = Result<T>>,
        local: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        if self.should_attempt_remote() {
            match remote.await {
                Ok(value) => {
                    self.record_success();
                    debug!(operation, backend = "remote", "operation served");
                    return Ok(value);
                }
                Err(e) if e.is_fallback_eligible() => {
                    self.record_failure();
                    warn!(operation, error = %e, "remote operation failed, serving from local store");
                }
                Err(e) => {
                    // Semantic rejection: recorded as a failure like any
                    // other, but never masked by local data.
                    self.record_failure();
                    return Err(e);
                }
            }
        } else {
            debug!(operation, backend = "local", "routing directly to local store");
        }
        local.await
    }

    fn should_attempt_remote(&self) -> bool {
        if self.detector.status().available {
            return true;
        }
        let memory = self.lock_memory();
        if !memory.cooldown_elapsed(self.policy.cooldown) {
            return false;
        }
        memory.last_remote_success || self.policy.remote_configured
    }

    fn record_success(&self) {
        let mut memory = self.lock_memory();
        memory.last_remote_success = true;
        memory.last_failure_at = None;
    }

    fn record_failure(&self) {
        let mut memory = self.lock_memory();
        memory.last_remote_success = false;
        memory.last_failure_at = Some(Instant::now());
    }

    fn lock_memory(&self) -> std::sync::MutexGuard<'_, RoutingMemory> {
        match self.memory.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted backend: counts calls and answers every operation the same
    /// way, either a canned success or a freshly built error.
    struct StubBackend {
        calls: AtomicUsize,
        error: Option<fn() -> TaskError>,
    }

    impl StubBackend {
        fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                error: None,
            }
        }

        fn failing(error: fn() -> TaskError) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                error: Some(error),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn answer<T>(&self, value: T) -> Result<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.error {
                Some(make) => Err(make()),
                None => Ok(value),
            }
        }

        fn task(id: &str) -> Task {
            Task {
                id: id.into(),
                description: "stub".into(),
                category: crate::task::Category::General,
                completed: false,
                priority: None,
                due_date: None,
                created_at: None,
                ai_reasoning: None,
                ai_confidence: None,
                ai_tags: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl TaskBackend for StubBackend {
        async fn create(&self, _description: &str) -> Result<Task> {
            self.answer(Self::task("created"))
        }

        async fn list(&self) -> Result<TaskPage> {
            self.answer(TaskPage::from_tasks(Vec::new(), |_, _| "stub".into()))
        }

        async fn complete(&self, task_id: &str) -> Result<Task> {
            self.answer(Self::task(task_id))
        }

        async fn delete(&self, _task_id: &str) -> Result<()> {
            self.answer(())
        }

        async fn health(&self) -> Result<HealthReport> {
            self.answer(HealthReport {
                status: "healthy".into(),
                service: "stub".into(),
                version: None,
                features: Vec::new(),
            })
        }

        async fn service_info(&self) -> Result<ServiceInfo> {
            self.answer(ServiceInfo {
                name: "stub".into(),
                description: "stub".into(),
                endpoints: Vec::new(),
            })
        }
    }

    fn service(
        remote: StubBackend,
        local: StubBackend,
        policy: RoutingPolicy,
    ) -> TaskService<StubBackend, StubBackend> {
        // Nothing listens on this endpoint, and no probe is started, so the
        // detector stays at its pessimistic default.
        TaskService::new(remote, local, BackendDetector::new("http://127.0.0.1:1"), policy)
    }

    fn eager_policy() -> RoutingPolicy {
        RoutingPolicy {
            cooldown: Duration::ZERO,
            remote_configured: true,
        }
    }

    #[tokio::test]
    async fn unconfigured_unavailable_backend_routes_straight_to_local() {
        let svc = service(StubBackend::ok(), StubBackend::ok(), RoutingPolicy::default());
        svc.create_task("x").await.expect("local create");

        assert_eq!(svc.remote.calls(), 0);
        assert_eq!(svc.local.calls(), 1);
    }

    #[tokio::test]
    async fn configured_backend_is_attempted_first() {
        let svc = service(StubBackend::ok(), StubBackend::ok(), eager_policy());
        svc.get_tasks().await.expect("remote list");

        assert_eq!(svc.remote.calls(), 1);
        assert_eq!(svc.local.calls(), 0);
        assert!(svc.routing_memory().last_remote_success);
    }

    #[tokio::test]
    async fn connectivity_failure_falls_back_to_local() {
        let svc = service(
            StubBackend::failing(|| TaskError::Connectivity("refused".into())),
            StubBackend::ok(),
            eager_policy(),
        );
        let task = svc.create_task("x").await.expect("local fallback");

        assert_eq!(task.id, "created");
        assert_eq!(svc.remote.calls(), 1);
        assert_eq!(svc.local.calls(), 1);
        let memory = svc.routing_memory();
        assert!(!memory.last_remote_success);
        assert!(memory.last_failure_at.is_some());
    }

    #[tokio::test]
    async fn unknown_failure_falls_back_to_local() {
        let svc = service(
            StubBackend::failing(|| TaskError::Unknown("garbled".into())),
            StubBackend::ok(),
            eager_policy(),
        );
        svc.get_tasks().await.expect("local fallback");
        assert_eq!(svc.local.calls(), 1);
    }

    #[tokio::test]
    async fn not_found_surfaces_without_consulting_local() {
        let svc = service(
            StubBackend::failing(|| TaskError::NotFound {
                task_id: "7".into(),
            }),
            StubBackend::ok(),
            eager_policy(),
        );
        let err = svc.complete_task("7").await.expect_err("not found");

        assert!(matches!(err, TaskError::NotFound { .. }));
        assert_eq!(svc.remote.calls(), 1);
        assert_eq!(svc.local.calls(), 0);
    }

    #[tokio::test]
    async fn validation_surfaces_without_consulting_local() {
        let svc = service(
            StubBackend::failing(|| TaskError::Validation("empty".into())),
            StubBackend::ok(),
            eager_policy(),
        );
        let err = svc.create_task("").await.expect_err("validation");

        assert!(matches!(err, TaskError::Validation(_)));
        assert_eq!(svc.local.calls(), 0);
    }

    #[tokio::test]
    async fn cooldown_suppresses_retries_after_failure() {
        let policy = RoutingPolicy {
            cooldown: Duration::from_secs(60),
            remote_configured: true,
        };
        let svc = service(
            StubBackend::failing(|| TaskError::Connectivity("refused".into())),
            StubBackend::ok(),
            policy,
        );

        svc.get_tasks().await.expect("first falls back");
        svc.get_tasks().await.expect("second is local-only");
        svc.get_tasks().await.expect("third is local-only");

        assert_eq!(svc.remote.calls(), 1);
        assert_eq!(svc.local.calls(), 3);
    }

    #[tokio::test]
    async fn elapsed_cooldown_allows_retry() {
        let policy = RoutingPolicy {
            cooldown: Duration::from_millis(20),
            remote_configured: true,
        };
        let svc = service(
            StubBackend::failing(|| TaskError::Connectivity("refused".into())),
            StubBackend::ok(),
            policy,
        );

        svc.get_tasks().await.expect("first falls back");
        tokio::time::sleep(Duration::from_millis(40)).await;
        svc.get_tasks().await.expect("retry falls back again");

        assert_eq!(svc.remote.calls(), 2);
    }

    #[tokio::test]
    async fn empty_remote_list_is_authoritative() {
        // A structurally valid empty response must not trigger fallback.
        let svc = service(StubBackend::ok(), StubBackend::ok(), eager_policy());
        let page = svc.get_tasks().await.expect("remote list");

        assert!(page.pending.is_empty());
        assert!(page.completed.is_empty());
        assert_eq!(svc.local.calls(), 0);
    }

    #[tokio::test]
    async fn semantic_error_records_a_failure() {
        // Every failed remote attempt lands in routing memory, whether or
        // not it was fallback-eligible.
        let svc = service(
            StubBackend::failing(|| TaskError::NotFound {
                task_id: "x".into(),
            }),
            StubBackend::ok(),
            RoutingPolicy {
                cooldown: Duration::from_secs(60),
                remote_configured: true,
            },
        );

        svc.delete_task("x").await.expect_err("not found");

        let memory = svc.routing_memory();
        assert!(!memory.last_remote_success);
        assert!(memory.last_failure_at.is_some());
        assert_eq!(svc.local.calls(), 0);

        // Within the cooldown the next operation goes straight to local.
        svc.delete_task("x").await.expect("local delete");
        assert_eq!(svc.remote.calls(), 1);
        assert_eq!(svc.local.calls(), 1);
    }
}
