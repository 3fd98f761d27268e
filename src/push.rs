//! Push-channel topics, message payloads and subscription handles
//!
//! The backend broadcasts full-entity snapshots with no ordering token; the
//! payloads here mirror its wire shapes. Parsing is lenient: a malformed
//! frame is logged and discarded, never an error that escapes upward.

use std::fmt::{Display, Formatter};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

use crate::event::Event;
use crate::task::Task;

/// What happened to the entity carried by a change message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Created,
    Updated,
    Deleted,
}

/// A task was created, updated or deleted.
/// `task` is `None` for deletions; `task_id` is always usable.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskChanged {
    pub action: Action,
    #[serde(default)]
    pub task: Option<Task>,
    #[serde(default)]
    pub task_id: Option<u64>,
    #[serde(default)]
    pub team_id: Option<u64>,
}

impl TaskChanged {
    pub fn task_id(&self) -> Option<u64> {
        self.task_id.or_else(|| self.task.as_ref().map(|t| t.id))
    }
}

/// An event was created, updated or deleted.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventChanged {
    #[serde(default)]
    pub team_id: Option<u64>,
    pub action: Action,
    #[serde(default)]
    pub event: Option<Event>,
    #[serde(default)]
    pub event_id: Option<u64>,
}

impl EventChanged {
    pub fn event_id(&self) -> Option<u64> {
        self.event_id.or_else(|| self.event.as_ref().map(|e| e.id))
    }
}

/// The backend detected overlapping entries. Informational: rendered as a
/// notice, never reconciled into the display collection.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictAlert {
    #[serde(default)]
    pub team_id: Option<u64>,
    pub source_type: String,
    #[serde(default)]
    pub source_id: Option<u64>,
    #[serde(default)]
    pub source: Option<Event>,
    #[serde(default)]
    pub conflicts: Vec<Event>,
    pub message: String,
}

/// A collaboration notification addressed to one user
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserNotification {
    #[serde(default)]
    pub category: Option<String>,
    pub title: String,
    pub content: String,
}

/// A decoded topic path
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topic {
    TeamTasks(u64),
    TeamEvents(u64),
    TeamConflicts(u64),
    User(u64),
}

pub fn team_task_topic(team_id: u64) -> String {
    format!("/topic/tasks/{}", team_id)
}

pub fn team_event_topic(team_id: u64) -> String {
    format!("/topic/calendar/{}", team_id)
}

pub fn team_conflict_topic(team_id: u64) -> String {
    format!("/topic/conflicts/{}", team_id)
}

pub fn user_topic(user_id: u64) -> String {
    format!("/topic/notifications/user/{}", user_id)
}

/// Decode a topic path. Unknown topics yield `None` and are skipped by the
/// session rather than treated as errors.
pub fn parse_topic(topic: &str) -> Option<Topic> {
    if let Some(rest) = topic.strip_prefix("/topic/tasks/") {
        return rest.parse().ok().map(Topic::TeamTasks);
    }
    if let Some(rest) = topic.strip_prefix("/topic/calendar/") {
        return rest.parse().ok().map(Topic::TeamEvents);
    }
    if let Some(rest) = topic.strip_prefix("/topic/conflicts/") {
        return rest.parse().ok().map(Topic::TeamConflicts);
    }
    if let Some(rest) = topic.strip_prefix("/topic/notifications/user/") {
        return rest.parse().ok().map(Topic::User);
    }
    None
}

/// Parse a frame body, logging and discarding malformed payloads
pub fn parse_frame<T: DeserializeOwned>(body: &str) -> Option<T> {
    match serde_json::from_str(body) {
        Ok(message) => Some(message),
        Err(err) => {
            log::warn!("Discarding unparseable push payload ({}): {:.120}", err, body);
            None
        }
    }
}

/// Handle for one active push subscription.
///
/// The session keeps every handle it obtained from [`crate::traits::PushChannel::subscribe`]
/// and hands each of them back on teardown, so that no subscription outlives
/// the view it was feeding.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Subscription {
    id: Uuid,
    topic: String,
}

impl Subscription {
    /// Mint a handle for a topic. Called by `PushChannel` implementations.
    pub fn new<S: ToString>(topic: S) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: topic.to_string(),
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl Display for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{} ({})", self.topic, self.id)
    }
}
