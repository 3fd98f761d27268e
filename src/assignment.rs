//! Optimizer-produced assignments (concrete placements of task work)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One fragment of scheduled work for a task.
///
/// A splittable task may be scheduled as several fragments; the merge
/// coalesces every fragment sharing a `task_id` into a single display item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: u64,
    #[serde(default)]
    pub schedule_id: Option<u64>,
    pub task_id: u64,
    #[serde(default)]
    pub task_title: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub slot_index: Option<u32>,
}

impl Assignment {
    /// Best available display label for this fragment
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .or_else(|| self.task_title.as_deref())
            .unwrap_or("(unnamed)")
    }
}

/// Partial update of an assignment. Absent fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
}
