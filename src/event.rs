//! Calendar events, as the backend's REST API and push channel carry them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::recurrence::RecurrenceRule;

/// A calendar event. Unlike tasks, events carry their own start and end.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: u64,
    #[serde(default)]
    pub team_id: Option<u64>,
    #[serde(default)]
    pub owner_id: Option<u64>,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Comma-separated attendee user ids, as the backend stores them
    #[serde(default)]
    pub attendees: Option<String>,
    /// Whether the optimizer must not move this event
    #[serde(default)]
    pub fixed: bool,
    #[serde(default)]
    pub recurrence_type: Option<RecurrenceRule>,
    #[serde(default)]
    pub recurrence_end_date: Option<DateTime<Utc>>,
}

impl Event {
    pub fn is_recurring(&self) -> bool {
        self.recurrence_type.is_some()
    }
}

/// Partial update of an event. Absent fields are left untouched by the server.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
}

/// Payload for creating an event. The backend assigns the id and broadcasts
/// the created entity over the push channel.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub team_id: u64,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendees: Option<String>,
    pub fixed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_type: Option<RecurrenceRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_end_date: Option<DateTime<Utc>>,
}
