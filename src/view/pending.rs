//! Bookkeeping for in-flight optimistic edits
//!
//! The backend broadcasts full snapshots with no version token, so the only
//! way to tell "the push channel is echoing my own edit back" from "someone
//! else changed this item" is to remember which identities this client has
//! edited and not yet seen confirmed.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::item::{CalendarItem, ItemId};

/// One optimistic edit awaiting its push confirmation or a rollback.
#[derive(Clone, Debug)]
pub struct PendingEdit {
    snapshot: CalendarItem,
    submitted_at: DateTime<Utc>,
}

impl PendingEdit {
    /// The last server-confirmed state of the item, restored on rollback
    pub fn snapshot(&self) -> &CalendarItem {
        &self.snapshot
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}

/// The set of identities this client has edited but not yet seen confirmed.
///
/// Entries are removed exactly once: by the push reconciler when the echo
/// arrives, or by the mutation path when the backend rejects the edit. There
/// is no eviction in the nominal path; see [`PendingEdits::clear_stale`] for
/// the opt-in hardening against echoes that never arrive.
#[derive(Debug, Default)]
pub struct PendingEdits {
    edits: HashMap<ItemId, PendingEdit>,
}

impl PendingEdits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an identity pending.
    ///
    /// Marking an already-pending identity supersedes the previous edit: the
    /// submission time is refreshed but the original snapshot is kept, so a
    /// rollback always restores the last server-confirmed state rather than
    /// an intermediate optimistic one.
    pub fn mark(&mut self, id: &ItemId, snapshot: &CalendarItem) {
        let submitted_at = Utc::now();
        self.edits
            .entry(id.clone())
            .and_modify(|edit| edit.submitted_at = submitted_at)
            .or_insert_with(|| PendingEdit {
                snapshot: snapshot.clone(),
                submitted_at,
            });
    }

    pub fn is_pending(&self, id: &ItemId) -> bool {
        self.edits.contains_key(id)
    }

    /// Remove a mark, returning the edit it tracked
    pub fn clear(&mut self, id: &ItemId) -> Option<PendingEdit> {
        self.edits.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, &PendingEdit)> {
        self.edits.iter()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Force-clear every mark older than `max_age`, returning the cleared
    /// identities.
    ///
    /// Not called by the nominal flow. A mark whose confirmation was lost by
    /// the push channel would otherwise suppress one future legitimate update
    /// to that identity forever; sweeping trades that for a small flicker
    /// risk. Callers decide whether and how often to sweep.
    pub fn clear_stale(&mut self, max_age: Duration) -> Vec<ItemId> {
        let cutoff = Utc::now() - max_age;
        let stale: Vec<ItemId> = self
            .edits
            .iter()
            .filter(|(_, edit)| edit.submitted_at < cutoff)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &stale {
            log::warn!("Force-clearing pending mark on {} (no confirmation arrived)", id);
            self.edits.remove(id);
        }
        stale
    }
}
