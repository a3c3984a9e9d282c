//! Canonical task model shared by the local store and the remote client.
//!
//! Whatever shape a backing store speaks on its own wire, tasks cross into
//! the rest of the crate only as [`Task`] values, and list operations only as
//! [`TaskPage`] values. Both stores return the same shapes, so callers never
//! branch on where a response came from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Category ───────────────────────────────────────────────────

/// Task category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Work,
    Personal,
    Health,
    Learning,
    General,
}

/// Fixed keyword sets for category inference, tested in this order; the
/// first matching set wins.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Work,
        &["meeting", "report", "project", "work", "email"],
    ),
    (
        Category::Personal,
        &["buy", "grocery", "shopping", "clean", "home"],
    ),
    (
        Category::Health,
        &["run", "exercise", "gym", "walk", "health"],
    ),
    (
        Category::Learning,
        &["read", "study", "learn", "course", "book"],
    ),
];

impl Category {
    /// Parse a free-form wire value case-insensitively.
    ///
    /// Returns `None` for absent or unrecognized values; callers default to
    /// [`Category::General`].
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "work" => Some(Self::Work),
            "personal" => Some(Self::Personal),
            "health" => Some(Self::Health),
            "learning" => Some(Self::Learning),
            "general" => Some(Self::General),
            _ => None,
        }
    }

    /// Infer a category from a task description by keyword match.
    pub fn infer(description: &str) -> Self {
        let lowered = description.to_lowercase();
        for (category, keywords) in CATEGORY_KEYWORDS {
            if keywords.iter().any(|kw| lowered.contains(kw)) {
                return *category;
            }
        }
        Self::General
    }

    /// Canonical display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::Personal => "Personal",
            Self::Health => "Health",
            Self::Learning => "Learning",
            Self::General => "General",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Priority ───────────────────────────────────────────────────

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Parse a free-form wire value case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    /// Canonical display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Task ───────────────────────────────────────────────────────

/// The canonical task entity.
///
/// Ids are opaque strings assigned by whichever store created the task and
/// never reused. Tasks from the two stores are never merged; the stores do
/// not share data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque unique identifier.
    pub id: String,
    /// Free-text description. Non-empty at creation.
    pub description: String,
    /// Category, inferred when not supplied.
    pub category: Category,
    /// Completion flag. False at creation, monotonic false→true.
    pub completed: bool,
    /// Optional priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Optional due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// AI categorization reasoning (remote-sourced tasks only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_reasoning: Option<String>,
    /// AI categorization confidence in `0.0..=1.0` (remote-sourced only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_confidence: Option<f64>,
    /// AI-suggested tags (remote-sourced only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ai_tags: Vec<String>,
}

// ── Derived shapes ─────────────────────────────────────────────

/// Aggregate stats, recomputed on every list operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total_pending: usize,
    pub total_completed: usize,
    /// `completed / total`, `0.0` when there are no tasks.
    pub completion_rate: f64,
}

impl TaskStats {
    /// Compute stats from pending/completed counts.
    pub fn compute(pending: usize, completed: usize) -> Self {
        let total = pending + completed;
        let completion_rate = if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64
        };
        Self {
            total_pending: pending,
            total_completed: completed,
            completion_rate,
        }
    }
}

/// Result of a list operation: the single tagged shape returned by both
/// backing stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPage {
    pub pending: Vec<Task>,
    pub completed: Vec<Task>,
    pub stats: TaskStats,
    /// Human-readable productivity insight derived from the counts.
    pub insight: String,
}

impl TaskPage {
    /// Partition a full collection into a page, computing stats.
    ///
    /// The insight string differs per store, so it is supplied by the caller.
    pub fn from_tasks(tasks: Vec<Task>, insight_for: impl Fn(usize, usize) -> String) -> Self {
        let (completed, pending): (Vec<Task>, Vec<Task>) =
            tasks.into_iter().partition(|t| t.completed);
        let stats = TaskStats::compute(pending.len(), completed.len());
        let insight = insight_for(completed.len(), pending.len());
        Self {
            pending,
            completed,
            stats,
            insight,
        }
    }
}

/// Health report from either store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// `"healthy"` / `"unhealthy"` / backend-reported status.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Reported version, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Advertised feature names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

/// Service self-description, for UI "about" surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub description: String,
    /// Operation name → short description.
    pub endpoints: Vec<(String, String)>,
}
