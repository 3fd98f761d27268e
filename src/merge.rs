//! Combines entity batches from several sources into one display collection
//!
//! The merge is additive and tolerant: batches arrive in any order, the same
//! entity may be reachable through several provenance paths (a task through
//! the per-team query and the direct-assignee query), and any batch may have
//! failed. The output is a map keyed by [`ItemId`], which is what guarantees
//! that nothing ever renders twice.

use std::collections::HashMap;
use std::error::Error;

use crate::assignment::Assignment;
use crate::event::Event;
use crate::item::{CalendarItem, Interval, ItemId, SourceKind};
use crate::recurrence;
use crate::task::Task;

/// One fetched result set, by entity kind. The provenance path (per-team or
/// per-user) does not matter to the merge, only the payloads do.
#[derive(Clone, Debug)]
pub enum Batch {
    Tasks(Vec<Task>),
    Events(Vec<Event>),
    Assignments(Vec<Assignment>),
}

/// Accumulates batches, then derives the display collection.
///
/// Raw entities are collected first and only turned into [`CalendarItem`]s in
/// [`Merger::merge`], because the shape of a task's item depends on whether
/// assignments for it showed up in *any* batch.
#[derive(Debug)]
pub struct Merger {
    window: Interval,
    tasks: HashMap<u64, Task>,
    events: HashMap<u64, Event>,
    assignments_by_task: HashMap<u64, Vec<Assignment>>,
}

impl Merger {
    pub fn new(window: Interval) -> Self {
        Self {
            window,
            tasks: HashMap::new(),
            events: HashMap::new(),
            assignments_by_task: HashMap::new(),
        }
    }

    pub fn window(&self) -> Interval {
        self.window
    }

    /// Fold one fetch result in. A failed fetch is logged and contributes
    /// nothing; it must never block the other sources.
    pub fn add(&mut self, fetched: Result<Batch, Box<dyn Error>>) {
        match fetched {
            Err(err) => {
                log::warn!("A source failed to fetch, treating it as empty: {}", err);
            }
            Ok(Batch::Tasks(tasks)) => {
                for task in tasks {
                    // last write wins on id collisions between provenance paths
                    self.tasks.insert(task.id, task);
                }
            }
            Ok(Batch::Events(events)) => {
                for event in events {
                    self.events.insert(event.id, event);
                }
            }
            Ok(Batch::Assignments(assignments)) => {
                for assignment in assignments {
                    self.assignments_by_task
                        .entry(assignment.task_id)
                        .or_insert_with(Vec::new)
                        .push(assignment);
                }
            }
        }
    }

    /// Derive the display collection from everything added so far.
    pub fn merge(&self) -> HashMap<ItemId, CalendarItem> {
        let mut items = HashMap::new();

        for task in self.tasks.values() {
            match self.assignments_by_task.get(&task.id) {
                Some(fragments) => {
                    // coalescing wins over the due-derived rendition
                    if let Some(item) = scheduled_item(task.id, &task.title, task.team_id,
                                                      Some(task.priority), fragments) {
                        items.insert(item.id().clone(), item);
                    }
                }
                None => {
                    if let Some(item) = task_item(task) {
                        items.insert(item.id().clone(), item);
                    }
                }
            }
        }

        // assignments whose task was not fetched still deserve a spot
        for (task_id, fragments) in &self.assignments_by_task {
            if self.tasks.contains_key(task_id) {
                continue;
            }
            let title = fragments
                .first()
                .map(|f| f.label().to_string())
                .unwrap_or_default();
            if let Some(item) = scheduled_item(*task_id, &title, None, None, fragments) {
                items.insert(item.id().clone(), item);
            }
        }

        for event in self.events.values() {
            for item in event_items(event, &self.window) {
                items.insert(item.id().clone(), item);
            }
        }

        items
    }
}

/// Derive the due-backed item for a task without assignments.
///
/// The due timestamp is the interval *end*: the item represents working
/// backward from the deadline. Tasks without a due date (or with a broken
/// duration) yield nothing.
pub fn task_item(task: &Task) -> Option<CalendarItem> {
    let due = task.due_at?;
    match Interval::ending_at(due, task.duration_min.max(1)) {
        Ok(interval) => Some(CalendarItem::new(
            ItemId::task(task.id),
            task.title.clone(),
            interval,
            task.team_id,
            Some(task.priority),
            true,
            SourceKind::Task,
        )),
        Err(err) => {
            log::warn!("Skipping task {} with an underivable interval: {}", task.id, err);
            None
        }
    }
}

/// Coalesce the assignment fragments of one task into a single item spanning
/// the earliest start to the latest end. Multi-part aggregates are read-only
/// and announce their part count in the title.
pub fn scheduled_item(task_id: u64,
                      title: &str,
                      team_id: Option<u64>,
                      priority: Option<u8>,
                      fragments: &[Assignment],
                    ) -> Option<CalendarItem>
{
    let start = fragments.iter().map(|f| f.starts_at).min()?;
    let end = fragments.iter().map(|f| f.ends_at).max()?;
    let interval = match Interval::new(start, end) {
        Ok(interval) => interval,
        Err(err) => {
            log::warn!("Skipping degenerate assignment span for task {}: {}", task_id, err);
            return None;
        }
    };

    let multi_part = fragments.len() > 1;
    let display_title = if multi_part {
        format!("{} ({} parts)", title, fragments.len())
    } else {
        title.to_string()
    };

    let item = CalendarItem::new(
        ItemId::scheduled_task(task_id),
        display_title,
        interval,
        team_id,
        priority,
        !multi_part,
        SourceKind::Assignment,
    );
    if multi_part {
        Some(item)
    } else {
        // single fragment: edits target this assignment
        fragments.first().map(|f| item.with_assignment_id(f.id))
    }
}

/// Derive the display items for one event: a single item for a plain event,
/// one item per occurrence inside the window for a recurring one.
pub fn event_items(event: &Event, window: &Interval) -> Vec<CalendarItem> {
    match event.recurrence_type {
        None => {
            let interval = match Interval::new(event.starts_at, event.ends_at) {
                Ok(interval) => interval,
                Err(err) => {
                    log::warn!("Skipping event {} with an invalid interval: {}", event.id, err);
                    return Vec::new();
                }
            };
            vec![CalendarItem::new(
                ItemId::event(event.id),
                event.title.clone(),
                interval,
                event.team_id,
                None,
                true,
                SourceKind::Event,
            )]
        }
        Some(rule) => {
            recurrence::expand(event.starts_at, event.ends_at, rule, event.recurrence_end_date, window)
                .into_iter()
                .map(|occurrence| {
                    CalendarItem::new(
                        ItemId::event_occurrence(event.id, occurrence.ordinal),
                        event.title.clone(),
                        occurrence.interval,
                        event.team_id,
                        None,
                        // an occurrence is a projection of the series, not an
                        // editable entity of its own
                        false,
                        SourceKind::Event,
                    )
                })
                .collect()
        }
    }
}
