//! Unified display items (the entities actually shown on the timeline)

use std::error::Error;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::color::ItemColor;

/// The kind half of an item identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// A task rendered from its due date
    Task,
    /// A calendar event (or one occurrence of a recurring one)
    Event,
    /// An optimizer-produced placement of a task
    ScheduledTask,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Task => "task",
            ItemKind::Event => "event",
            ItemKind::ScheduledTask => "scheduled-task",
        }
    }
}

/// Identity of a display item.
///
/// The backend hands out plain numeric ids per entity kind, so the display
/// collection keys items by the (kind, backend id) pair. Occurrences of a
/// recurring event additionally carry their occurrence ordinal, so that one
/// definition can expand to several items without identity collisions.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId {
    kind: ItemKind,
    id: u64,
    occurrence: Option<u32>,
}

impl ItemId {
    pub fn task(id: u64) -> Self {
        Self { kind: ItemKind::Task, id, occurrence: None }
    }

    pub fn event(id: u64) -> Self {
        Self { kind: ItemKind::Event, id, occurrence: None }
    }

    pub fn scheduled_task(task_id: u64) -> Self {
        Self { kind: ItemKind::ScheduledTask, id: task_id, occurrence: None }
    }

    /// Identity of one occurrence of a recurring event
    pub fn event_occurrence(event_id: u64, ordinal: u32) -> Self {
        Self { kind: ItemKind::Event, id: event_id, occurrence: Some(ordinal) }
    }

    pub fn kind(&self) -> ItemKind { self.kind }
    /// The backend id this identity refers to (a task id, event id, ...)
    pub fn backend_id(&self) -> u64 { self.id }
    pub fn occurrence(&self) -> Option<u32> { self.occurrence }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self.occurrence {
            None => write!(f, "{}-{}", self.kind.as_str(), self.id),
            Some(ord) => write!(f, "{}-{}#{}", self.kind.as_str(), self.id, ord),
        }
    }
}

/// A half-open `[start, end)` time span.
///
/// Construction enforces `start < end`; every other part of the crate can
/// rely on intervals being non-empty.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, Box<dyn Error>> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(format!("Invalid interval: {} is not before {}", start, end).into())
        }
    }

    /// Derive an interval backward from its end, e.g. working back from a due date
    pub fn ending_at(end: DateTime<Utc>, duration_min: i64) -> Result<Self, Box<dyn Error>> {
        Self::new(end - Duration::minutes(duration_min), end)
    }

    pub fn start(&self) -> DateTime<Utc> { self.start }
    pub fn end(&self) -> DateTime<Utc> { self.end }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// Same duration, moved so it begins at `new_start`
    pub fn shifted_to(&self, new_start: DateTime<Utc>) -> Self {
        Self { start: new_start, end: new_start + self.duration() }
    }

    pub fn intersects(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Which backend entity an item was derived from. This decides which endpoint
/// an edit to the item must target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    Task,
    Event,
    Assignment,
}

impl Display for SourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            SourceKind::Task => write!(f, "task"),
            SourceKind::Event => write!(f, "event"),
            SourceKind::Assignment => write!(f, "assignment"),
        }
    }
}

/// One entry of the display collection.
///
/// Items are derived from tasks, events and assignments by the merge rules in
/// [`crate::merge`]; the only writers of a displayed item afterwards are the
/// optimistic mutation path and the push reconciler in [`crate::view`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalendarItem {
    id: ItemId,
    title: String,
    interval: Interval,
    team_id: Option<u64>,
    /// 1 (most prominent) to 5; tasks only
    priority: Option<u8>,
    /// Whether drag/resize gestures are accepted
    mutable: bool,
    source: SourceKind,
    /// Backing assignment of a single-part scheduled item
    assignment_id: Option<u64>,
    color: ItemColor,
}

impl CalendarItem {
    pub fn new(id: ItemId,
               title: String,
               interval: Interval,
               team_id: Option<u64>,
               priority: Option<u8>,
               mutable: bool,
               source: SourceKind,
            ) -> Self
    {
        let color = ItemColor::for_item(source, team_id, priority);
        Self { id, title, interval, team_id, priority, mutable, source, assignment_id: None, color }
    }

    pub fn id(&self) -> &ItemId          { &self.id      }
    pub fn title(&self) -> &str          { &self.title   }
    pub fn interval(&self) -> Interval   { self.interval }
    pub fn team_id(&self) -> Option<u64> { self.team_id  }
    pub fn priority(&self) -> Option<u8> { self.priority }
    pub fn mutable(&self) -> bool        { self.mutable  }
    pub fn source(&self) -> SourceKind   { self.source   }
    pub fn color(&self) -> &ItemColor    { &self.color   }

    /// The assignment behind a single-part scheduled item, if any.
    /// Edits to such an item must target this assignment id.
    pub fn assignment_id(&self) -> Option<u64> {
        self.assignment_id
    }

    pub(crate) fn with_assignment_id(mut self, assignment_id: u64) -> Self {
        self.assignment_id = Some(assignment_id);
        self
    }

    pub(crate) fn set_interval(&mut self, interval: Interval) {
        self.interval = interval;
    }
}
