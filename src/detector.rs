//! Backend availability detector.
//!
//! Probes the remote backend's health endpoint on a fixed interval and
//! caches the last observation for cheap synchronous reads. The cache starts
//! out pessimistic (unavailable) so callers fail safe before the first probe
//! lands.
//!
//! Polling is an explicit lifecycle: [`BackendDetector::start`] spawns the
//! loop, [`BackendDetector::stop`] cancels it. Dropping the detector without
//! calling `stop` leaks the poll task for the life of the runtime, so owners
//! hold onto it and shut it down deliberately.

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::wire::HealthPayload;

/// Default interval between health probes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Per-probe client timeout. Deliberately short so a hung backend is
/// classified quickly instead of stalling callers.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Which store the service should prefer right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendMode {
    #[serde(rename = "remote")]
    Remote,
    #[serde(rename = "local-fallback")]
    LocalFallback,
}

/// Last observed backend state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendStatus {
    /// Whether the last probe succeeded.
    pub available: bool,
    /// Preferred routing mode derived from `available`.
    pub mode: BackendMode,
    /// Probed base endpoint.
    pub url: Option<String>,
    /// Version the backend reported, when available.
    pub version: Option<String>,
    /// Features the backend advertised, when available.
    pub features: Vec<String>,
    /// When the last probe completed. `None` before the first probe.
    pub last_checked: Option<DateTime<Utc>>,
}

impl Default for BackendStatus {
    fn default() -> Self {
        Self {
            available: false,
            mode: BackendMode::LocalFallback,
            url: None,
            version: None,
            features: Vec::new(),
            last_checked: None,
        }
    }
}

/// Health-probe poller with a read-most status cache.
#[derive(Clone)]
pub struct BackendDetector {
    base_url: String,
    client: reqwest::Client,
    status: Arc<RwLock<BackendStatus>>,
    poller: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl BackendDetector {
    /// Create a detector for the given base endpoint with the default probe
    /// timeout. No probe runs until [`check_now`](Self::check_now) or
    /// [`start`](Self::start) is called.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, PROBE_TIMEOUT)
    }

    /// Create a detector with a custom probe timeout.
    ///
    /// Panics if the probe client cannot be constructed; a client without
    /// the timeout would let probes hang indefinitely.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("probe client construction");
        Self {
            base_url,
            client,
            status: Arc::new(RwLock::new(BackendStatus::default())),
            poller: Arc::new(Mutex::new(None)),
        }
    }

    /// The probed base endpoint.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Snapshot of the last observed status. Never blocks on the network.
    pub fn status(&self) -> BackendStatus {
        self.status
            .read()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Run one probe immediately, update the cache, and return the fresh
    /// status.
    pub async fn check_now(&self) -> BackendStatus {
        let observed = self.probe().await;
        if let Ok(mut slot) = self.status.write() {
            *slot = observed.clone();
        }
        observed
    }

    /// Begin background polling at the given interval.
    ///
    /// Idempotent: a second call while a poller is running is a no-op.
    pub fn start(&self, poll_interval: Duration) {
        let mut slot = match self.poller.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }

        info!(url = %self.base_url, interval_secs = poll_interval.as_secs(), "starting backend availability polling");
        let detector = self.clone();
        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            loop {
                ticker.tick().await;
                detector.check_now().await;
            }
        }));
    }

    /// Stop background polling. Idempotent; the cached status is retained.
    pub fn stop(&self) {
        let mut slot = match self.poller.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = slot.take() {
            handle.abort();
            info!("stopped backend availability polling");
        }
    }

    /// Whether the background poller is currently running.
    pub fn is_polling(&self) -> bool {
        self.poller
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    async fn probe(&self) -> BackendStatus {
        let url = format!("{}/health", self.base_url);
        let outcome = async {
            let resp = self.client.get(&url).send().await?;
            resp.error_for_status()?.json::<HealthPayload>().await
        }
        .await;

        let previous = self.status();
        let now = Some(Utc::now());
        match outcome {
            Ok(payload) => {
                if !previous.available {
                    info!(url = %self.base_url, service = %payload.service, "backend became available");
                }
                BackendStatus {
                    available: true,
                    mode: BackendMode::Remote,
                    url: Some(self.base_url.clone()),
                    version: payload.version,
                    features: payload.features.unwrap_or_default(),
                    last_checked: now,
                }
            }
            Err(e) => {
                if previous.available {
                    warn!(url = %self.base_url, error = %e, "backend became unavailable");
                } else {
                    debug!(url = %self.base_url, error = %e, "backend still unavailable");
                }
                BackendStatus {
                    available: false,
                    mode: BackendMode::LocalFallback,
                    url: Some(self.base_url.clone()),
                    version: None,
                    features: Vec::new(),
                    last_checked: now,
                }
            }
        }
    }
}
