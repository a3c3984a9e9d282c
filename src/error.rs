//! Error types for the task-routing core.
//!
//! Every failure crossing the public facade is a [`TaskError`]. The variants
//! split along the line the arbitration layer cares about: *semantic*
//! failures ([`NotFound`](TaskError::NotFound),
//! [`Validation`](TaskError::Validation)) are surfaced to the caller as-is,
//! while *transient* failures ([`Connectivity`](TaskError::Connectivity),
//! [`Unknown`](TaskError::Unknown)) permit falling back to the local store.

use reqwest::StatusCode;

/// Top-level error type for task operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TaskError {
    /// The operation referenced a task id that does not exist.
    #[error("task not found: {task_id}")]
    NotFound {
        /// The id the caller asked for.
        task_id: String,
    },

    /// The request was malformed or rejected by the backend (HTTP 400).
    #[error("request rejected: {0}")]
    Validation(String),

    /// The remote backend is unreachable, timed out, or failed server-side.
    #[error("backend unreachable: {0}")]
    Connectivity(String),

    /// Local persistence error. Recovered internally by the local store;
    /// callers only see this if persistence fails on a write path.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Uncategorized failure.
    #[error("unexpected error: {0}")]
    Unknown(String),
}

impl TaskError {
    /// Returns `true` when a failed remote attempt may be retried against
    /// the local store.
    ///
    /// Transient/connectivity failures are fallback-eligible; semantic
    /// rejections are not: a remote "not found" must not silently succeed
    /// against an unrelated local record.
    pub fn is_fallback_eligible(&self) -> bool {
        matches!(self, Self::Connectivity(_) | Self::Unknown(_))
    }

    /// Classify a non-success HTTP response into a `TaskError`.
    ///
    /// `task_id` is threaded through so 404s name the task the caller asked
    /// for.
    pub(crate) fn from_status(status: StatusCode, body: &str, task_id: Option<&str>) -> Self {
        let detail = if body.trim().is_empty() {
            status.to_string()
        } else {
            format!("{status}: {}", body.chars().take(200).collect::<String>())
        };

        if status == StatusCode::NOT_FOUND {
            Self::NotFound {
                task_id: task_id.unwrap_or("<unknown>").to_owned(),
            }
        } else if status == StatusCode::BAD_REQUEST {
            Self::Validation(detail)
        } else if status.is_server_error() {
            Self::Connectivity(detail)
        } else {
            Self::Unknown(detail)
        }
    }

    /// Classify a reqwest transport error.
    ///
    /// Timeouts and connection failures are connectivity problems; anything
    /// else (TLS, decode, redirect loops) lands in `Unknown`, still
    /// fallback-eligible, matching the "generic fetch failure" policy.
    pub(crate) fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Connectivity(format!("request timed out: {err}"))
        } else if err.is_connect() {
            Self::Connectivity(format!("connection failed: {err}"))
        } else {
            Self::Unknown(format!("transport error: {err}"))
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, TaskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_carries_task_id() {
        let err = TaskError::from_status(StatusCode::NOT_FOUND, "", Some("t-42"));
        match err {
            TaskError::NotFound { task_id } => assert_eq!(task_id, "t-42"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn bad_request_maps_to_validation() {
        let err = TaskError::from_status(StatusCode::BAD_REQUEST, "empty content", None);
        assert!(matches!(err, TaskError::Validation(_)));
        assert!(!err.is_fallback_eligible());
    }

    #[test]
    fn server_errors_map_to_connectivity() {
        for code in [500u16, 502, 503] {
            let status = StatusCode::from_u16(code).expect("valid status");
            let err = TaskError::from_status(status, "", None);
            assert!(matches!(err, TaskError::Connectivity(_)), "HTTP {code}");
            assert!(err.is_fallback_eligible(), "HTTP {code}");
        }
    }

    #[test]
    fn other_statuses_map_to_unknown() {
        let err = TaskError::from_status(StatusCode::IM_A_TEAPOT, "", None);
        assert!(matches!(err, TaskError::Unknown(_)));
        assert!(err.is_fallback_eligible());
    }

    #[test]
    fn semantic_errors_are_not_fallback_eligible() {
        let not_found = TaskError::NotFound {
            task_id: "x".into(),
        };
        assert!(!not_found.is_fallback_eligible());
        assert!(!TaskError::Validation("bad".into()).is_fallback_eligible());
        assert!(TaskError::Connectivity("down".into()).is_fallback_eligible());
        assert!(TaskError::Unknown("?".into()).is_fallback_eligible());
    }

    #[test]
    fn display_includes_detail() {
        let err = TaskError::Connectivity("connection refused".into());
        assert!(err.to_string().contains("connection refused"));
    }
}
