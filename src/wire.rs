//! Wire representation of the remote task contract, and the normalizer that
//! converts backend records into the canonical [`Task`] shape.
//!
//! The remote backend speaks free-form casing for category/priority, a
//! three-state status enum, and ids that may arrive as numbers or strings.
//! [`normalize`] canonicalizes all of that in one place; it is pure, never
//! fails, and drops malformed optional fields instead of inventing
//! placeholder values.

use crate::task::{Category, Priority, Task};
use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

// ── Records ────────────────────────────────────────────────────

/// A task as the remote backend represents it on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Backend id; numbers are canonicalized to strings on deserialize.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Task description ("content" on the wire).
    pub content: String,
    /// Free-form category string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Free-form priority string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// `pending` | `in-progress` | `completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_tags: Option<Vec<String>>,
}

/// Envelope for single-task responses (`POST /tasks`, `PUT /tasks/{id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub task: TaskRecord,
}

/// Envelope for list responses (`GET /tasks`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksEnvelope {
    pub success: bool,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
}

/// Envelope for delete responses (`DELETE /tasks/{id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Health payload (`GET /health`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthPayload {
    pub status: String,
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
}

// ── Normalizer ─────────────────────────────────────────────────

/// Convert a backend record into the canonical task shape.
///
/// - category/priority: case-insensitive lookup; unrecognized or absent
///   category defaults to `General`, unrecognized priority is dropped
/// - `completed` is true exactly when `status == "completed"`
/// - timestamps: parsed as RFC 3339; malformed values are dropped
/// - `ai_confidence`: kept only when inside `0.0..=1.0`
pub fn normalize(record: TaskRecord) -> Task {
    let category = record
        .category
        .as_deref()
        .and_then(Category::parse)
        .unwrap_or(Category::General);
    let priority = record.priority.as_deref().and_then(Priority::parse);
    let completed = record.status.as_deref() == Some("completed");
    let ai_confidence = record
        .ai_confidence
        .filter(|c| (0.0..=1.0).contains(c) && c.is_finite());

    Task {
        id: record.id,
        description: record.content,
        category,
        completed,
        priority,
        due_date: parse_timestamp(record.due_date.as_deref()),
        created_at: parse_timestamp(record.created_at.as_deref()),
        ai_reasoning: record.ai_reasoning,
        ai_confidence,
        ai_tags: record.ai_tags.unwrap_or_default(),
    }
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Accept either a JSON string or number as an id, canonicalizing to string.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Str(String),
        Int(i64),
        Float(f64),
    }

    match IdRepr::deserialize(deserializer)? {
        IdRepr::Str(s) => Ok(s),
        IdRepr::Int(n) => Ok(n.to_string()),
        IdRepr::Float(f) => {
            // JSON backends occasionally hand back integral floats.
            if f.fract() == 0.0 && f.is_finite() {
                Ok(format!("{}", f as i64))
            } else {
                Err(de::Error::custom("task id must be a string or integer"))
            }
        }
    }
}
