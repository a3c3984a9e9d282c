//! TaskRelay: task management with transparent backend arbitration.
//!
//! A personal task manager built around one engineering idea: the
//! application talks to a single facade, [`TaskService`], and never learns
//! whether an operation was served by the remote HTTP backend or the local
//! JSON-file store. Per operation, the service consults a cached
//! availability signal, attempts the remote when the signal or recent
//! history justifies it, and classifies failures: connectivity-shaped ones
//! fall back to local, semantic ones surface as-is.
//!
//! # Layout
//!
//! - [`task`]: canonical task model and derived shapes
//! - [`wire`]: remote wire contract and the normalizer
//! - [`backend`]: the [`TaskBackend`] seam both stores implement
//! - [`remote`] / [`local`]: the two stores
//! - [`detector`]: health-probe availability polling
//! - [`arbiter`]: per-operation routing, the facade
//! - [`config`]: layered TOML + env configuration
//! - [`server`]: reference in-memory backend for development
//!
//! # Quick start
//!
//! ```no_run
//! use taskrelay::{ServiceConfig, TaskService};
//!
//! # async fn run() -> taskrelay::Result<()> {
//! let config = ServiceConfig::load();
//! let service = TaskService::from_config(&config);
//! service.start(config.backend.poll_interval());
//!
//! let task = service.create_task("Buy groceries").await?;
//! println!("{} -> {}", task.description, task.category);
//!
//! service.stop();
//! # Ok(())
//! # }
//! ```

pub mod arbiter;
pub mod backend;
pub mod config;
pub mod detector;
pub mod error;
pub mod local;
pub mod remote;
pub mod server;
pub mod task;
pub mod wire;

pub use arbiter::{DEFAULT_COOLDOWN, RoutingMemory, RoutingPolicy, TaskService};
pub use backend::TaskBackend;
pub use config::ServiceConfig;
pub use detector::{BackendDetector, BackendMode, BackendStatus, DEFAULT_POLL_INTERVAL};
pub use error::{Result, TaskError};
pub use local::LocalStore;
pub use remote::RemoteClient;
pub use server::TaskServer;
pub use task::{Category, HealthReport, Priority, ServiceInfo, Task, TaskPage, TaskStats};
