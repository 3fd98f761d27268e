//! Tasks, as the backend's REST API and push channel carry them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A task owned by a team, optionally assigned to a user.
///
/// `due_at` is optional: a task without a due date (and without an optimizer
/// assignment) has no place on the timeline and is skipped by the merge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    #[serde(default)]
    pub team_id: Option<u64>,
    #[serde(default)]
    pub assignee_id: Option<u64>,
    pub title: String,
    pub duration_min: i64,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    /// 1 (most urgent) to 5
    pub priority: u8,
    #[serde(default)]
    pub splittable: bool,
    #[serde(default)]
    pub tags: Option<String>,
}

/// Partial update of a task. Absent fields are left untouched by the server.
///
/// A drag gesture on a due-derived item only rewrites `due_at` (the interval
/// end); a resize only rewrites `duration_min`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<i64>,
}

/// Payload for creating a task. The backend assigns the id and broadcasts the
/// created entity over the push channel.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub team_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<u64>,
    pub title: String,
    pub duration_min: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    pub priority: u8,
    pub splittable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}
