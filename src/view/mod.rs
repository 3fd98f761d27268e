//! The display collection, and the only two writers it has
//!
//! An [`AgendaView`] owns the merged calendar items the UI renders. After the
//! initial merge, exactly two paths may mutate it: the optimistic edit path
//! ([`AgendaView::begin_edit`] / [`AgendaView::roll_back`]) and the push
//! reconciler ([`AgendaView::apply_task_change`] /
//! [`AgendaView::apply_event_change`]). Both paths funnel through the pending
//! set so that, for any one identity, writes follow the lifecycle
//! absent → confirmed → optimistic-pending → confirmed-or-rolled-back and a
//! push snapshot can never clobber a not-yet-confirmed local edit.

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::assignment::AssignmentPatch;
use crate::event::EventPatch;
use crate::item::{CalendarItem, Interval, ItemId, ItemKind, SourceKind};
use crate::merge;
use crate::push::{Action, EventChanged, TaskChanged};
use crate::task::TaskPatch;

pub mod pending;
use pending::PendingEdits;

/// The two direct-manipulation gestures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditKind {
    /// Both bounds change, duration is preserved
    Move,
    /// Only the end changes; the result must keep a positive duration
    ResizeEnd,
}

/// Why an edit was refused before any network traffic happened.
#[derive(Clone, Debug, PartialEq)]
pub enum EditError {
    UnknownItem(ItemId),
    ReadOnlyItem(ItemId),
    /// A resize would have produced a non-positive duration
    EmptyInterval,
}

impl Display for EditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            EditError::UnknownItem(id) => write!(f, "No displayed item has identity {}", id),
            EditError::ReadOnlyItem(id) => write!(f, "Item {} does not accept edits", id),
            EditError::EmptyInterval => write!(f, "The edit would leave the item without any duration"),
        }
    }
}

impl Error for EditError {}

/// The backend request an accepted optimistic edit must issue.
///
/// The mapping depends on the item's source: a due-derived task only ever
/// changes its due timestamp (on move) or its duration (on resize), while
/// events and assignments carry explicit bounds.
#[derive(Clone, Debug, PartialEq)]
pub enum EditRequest {
    Task { id: u64, patch: TaskPatch },
    Event { id: u64, patch: EventPatch },
    Assignment { id: u64, patch: AssignmentPatch },
}

/// The merged, display-ready collection of calendar items.
#[derive(Debug, Default)]
pub struct AgendaView {
    items: HashMap<ItemId, CalendarItem>,
    pending: PendingEdits,
    window: Option<Interval>,
}

impl AgendaView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &HashMap<ItemId, CalendarItem> {
        &self.items
    }

    pub fn get(&self, id: &ItemId) -> Option<&CalendarItem> {
        self.items.get(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_pending(&self, id: &ItemId) -> bool {
        self.pending.is_pending(id)
    }

    pub fn pending_mut(&mut self) -> &mut PendingEdits {
        &mut self.pending
    }

    /// The window the current collection was merged for
    pub fn window(&self) -> Option<Interval> {
        self.window
    }

    /// Replace the collection with a freshly merged one.
    ///
    /// Identities with an unresolved optimistic edit keep their optimistic
    /// interval: a refresh that raced a not-yet-confirmed edit must not snap
    /// the item back to a stale server state.
    pub fn reset(&mut self, mut items: HashMap<ItemId, CalendarItem>, window: Interval) {
        for (id, _edit) in self.pending.iter() {
            if let (Some(current), Some(incoming)) = (self.items.get(id), items.get_mut(id)) {
                incoming.set_interval(current.interval());
            }
        }
        self.items = items;
        self.window = Some(window);
    }

    /// Apply a user gesture optimistically.
    ///
    /// On success the collection already shows the new interval, the identity
    /// is marked pending, and the caller must issue the returned backend
    /// request, reporting a rejection back via [`AgendaView::roll_back`].
    /// On error nothing was mutated and nothing must be sent.
    pub fn begin_edit(&mut self, id: &ItemId, kind: EditKind, new_interval: Interval)
        -> Result<EditRequest, EditError>
    {
        let item = self.items.get(id).ok_or_else(|| EditError::UnknownItem(id.clone()))?;
        if item.mutable() == false {
            return Err(EditError::ReadOnlyItem(id.clone()));
        }

        let current = item.interval();
        let target = match kind {
            EditKind::Move => current.shifted_to(new_interval.start()),
            EditKind::ResizeEnd => Interval::new(current.start(), new_interval.end())
                .map_err(|_| EditError::EmptyInterval)?,
        };

        let request = match item.source() {
            SourceKind::Task => match kind {
                // the due timestamp is the interval end under backward derivation
                EditKind::Move => EditRequest::Task {
                    id: id.backend_id(),
                    patch: TaskPatch { due_at: Some(target.end()), ..TaskPatch::default() },
                },
                EditKind::ResizeEnd => EditRequest::Task {
                    id: id.backend_id(),
                    patch: TaskPatch { duration_min: Some(target.duration_minutes()), ..TaskPatch::default() },
                },
            },
            SourceKind::Event => match kind {
                EditKind::Move => EditRequest::Event {
                    id: id.backend_id(),
                    patch: EventPatch { starts_at: Some(target.start()), ends_at: Some(target.end()) },
                },
                EditKind::ResizeEnd => EditRequest::Event {
                    id: id.backend_id(),
                    patch: EventPatch { ends_at: Some(target.end()), ..EventPatch::default() },
                },
            },
            SourceKind::Assignment => {
                let assignment_id = item.assignment_id().ok_or_else(|| EditError::ReadOnlyItem(id.clone()))?;
                match kind {
                    EditKind::Move => EditRequest::Assignment {
                        id: assignment_id,
                        patch: AssignmentPatch { starts_at: Some(target.start()), ends_at: Some(target.end()) },
                    },
                    EditKind::ResizeEnd => EditRequest::Assignment {
                        id: assignment_id,
                        patch: AssignmentPatch { ends_at: Some(target.end()), ..AssignmentPatch::default() },
                    },
                }
            }
        };

        let snapshot = item.clone();
        self.pending.mark(id, &snapshot);
        if let Some(item) = self.items.get_mut(id) {
            item.set_interval(target);
        }
        log::debug!("Applied optimistic {:?} on {}, now awaiting confirmation", kind, id);
        Ok(request)
    }

    /// The backend rejected an edit: restore the pre-edit snapshot and clear
    /// the pending mark. Returns the restored item, or `None` if the identity
    /// was not pending (e.g. already rolled back).
    pub fn roll_back(&mut self, id: &ItemId) -> Option<CalendarItem> {
        let edit = self.pending.clear(id)?;
        let snapshot = edit.snapshot().clone();
        self.items.insert(id.clone(), snapshot.clone());
        log::debug!("Rolled {} back to its last confirmed state", id);
        Some(snapshot)
    }

    /// Reconcile an inbound task-changed message.
    pub fn apply_task_change(&mut self, change: &TaskChanged) {
        let task_id = match change.task_id() {
            Some(id) => id,
            None => {
                log::warn!("Ignoring a task change without any task id");
                return;
            }
        };
        let id = ItemId::task(task_id);

        // our own edit coming back: the optimistic state already matches
        if self.pending.clear(&id).is_some() {
            log::debug!("Suppressed the echo of our own edit on {}", id);
            return;
        }

        let actionable = match (&change.action, &change.task) {
            (Action::Deleted, _) | (_, None) => None,
            (_, Some(task)) => merge::task_item(task),
        };

        match actionable {
            None => {
                // deleted, or no longer carrying an actionable schedule
                self.items.remove(&id);
                if change.action == Action::Deleted {
                    // a deleted task also invalidates its assignment aggregate
                    self.items.remove(&ItemId::scheduled_task(task_id));
                }
            }
            Some(item) => {
                if self.items.contains_key(&ItemId::scheduled_task(task_id)) {
                    // the optimizer's placement stays authoritative; the
                    // aggregate is refreshed by the next full merge
                    log::debug!("Task {} has an assignment aggregate on display, keeping it", task_id);
                    return;
                }
                self.items.insert(id, item);
            }
        }
    }

    /// Reconcile an inbound event-changed message.
    pub fn apply_event_change(&mut self, change: &EventChanged) {
        let event_id = match change.event_id() {
            Some(id) => id,
            None => {
                log::warn!("Ignoring an event change without any event id");
                return;
            }
        };
        let id = ItemId::event(event_id);

        if self.pending.clear(&id).is_some() {
            log::debug!("Suppressed the echo of our own edit on {}", id);
            return;
        }

        // drop the previous rendition (including every expanded occurrence)
        self.items
            .retain(|item_id, _| !(item_id.kind() == ItemKind::Event && item_id.backend_id() == event_id));

        let event = match (&change.action, &change.event) {
            (Action::Deleted, _) | (_, None) => return,
            (_, Some(event)) => event,
        };

        let window = match self.window {
            Some(window) => window,
            None => {
                log::debug!("No active window yet, ignoring event {} until the first merge", event_id);
                return;
            }
        };
        for item in merge::event_items(event, &window) {
            self.items.insert(item.id().clone(), item);
        }
    }
}
