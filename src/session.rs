//! An explicitly constructed, explicitly torn-down calendar session
//!
//! A [`Session`] is created when the calendar view mounts and closed when it
//! unmounts. It owns the backend client, the push subscriptions and the
//! display collection; nothing in this crate lives in module globals.

use std::error::Error;

use bitflags::bitflags;
use chrono::{DateTime, Utc};

use crate::event::NewEvent;
use crate::item::{Interval, ItemId, ItemKind, SourceKind};
use crate::merge::{Batch, Merger};
use crate::notice::{Notice, NoticeSender};
use crate::push::{self, ConflictAlert, EventChanged, Subscription, TaskChanged, Topic, UserNotification};
use crate::task::NewTask;
use crate::traits::{EditSink, EntitySource, PushChannel};
use crate::view::{AgendaView, EditKind, EditRequest};

bitflags! {
    /// Which entity kinds a refresh fetches
    pub struct EntityKinds: u8 {
        const TASKS = 1;
        const EVENTS = 2;
        const ASSIGNMENTS = 4;
    }
}

impl Default for EntityKinds {
    fn default() -> Self {
        EntityKinds::all()
    }
}

/// How an accepted gesture ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    /// The backend accepted the edit; the optimistic state stands until the
    /// push channel confirms it
    Applied,
    /// The backend rejected the edit; the item was restored to its snapshot
    /// and a notice was emitted
    RolledBack,
}

/// One user's live calendar over one backend.
///
/// `B` is the REST boundary, `P` the push channel. Both are trait objects in
/// spirit: production uses [`crate::client::RestClient`] and a transport
/// adapter, tests plug in in-memory fakes.
pub struct Session<B, P>
where
    B: EntitySource + EditSink,
    P: PushChannel,
{
    backend: B,
    push: P,
    user_id: u64,
    team_ids: Vec<u64>,
    view: AgendaView,
    subscriptions: Vec<Subscription>,
    notices: Option<NoticeSender>,
}

impl<B, P> Session<B, P>
where
    B: EntitySource + EditSink,
    P: PushChannel,
{
    pub fn new(backend: B, push: P, user_id: u64, team_ids: Vec<u64>) -> Self {
        Self {
            backend,
            push,
            user_id,
            team_ids,
            view: AgendaView::new(),
            subscriptions: Vec::new(),
            notices: None,
        }
    }

    /// Route notices (rejected edits, conflicts, ...) to this sender
    pub fn set_notice_channel(&mut self, sender: NoticeSender) {
        self.notices = Some(sender);
    }

    pub fn view(&self) -> &AgendaView {
        &self.view
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Subscribe to every team topic plus the per-user channel.
    pub async fn connect(&mut self) -> Result<(), Box<dyn Error>> {
        for team_id in self.team_ids.clone() {
            for topic in &[
                push::team_task_topic(team_id),
                push::team_event_topic(team_id),
                push::team_conflict_topic(team_id),
            ] {
                let subscription = self.push.subscribe(topic).await?;
                self.subscriptions.push(subscription);
            }
        }
        let subscription = self.push.subscribe(&push::user_topic(self.user_id)).await?;
        self.subscriptions.push(subscription);
        log::info!("Subscribed to {} push topics", self.subscriptions.len());
        Ok(())
    }

    /// Fetch the requested entity kinds from every source and rebuild the
    /// display collection for `window`.
    ///
    /// A failing source is logged and contributes nothing; the others still
    /// render. Identities with an unresolved optimistic edit keep their
    /// optimistic interval across the rebuild.
    pub async fn refresh(&mut self, window: Interval, kinds: EntityKinds) {
        let mut merger = Merger::new(window);

        if kinds.contains(EntityKinds::TASKS) {
            merger.add(self.backend.assigned_tasks(self.user_id).await.map(Batch::Tasks));
            for team_id in &self.team_ids {
                merger.add(self.backend.team_tasks(*team_id).await.map(Batch::Tasks));
            }
        }
        if kinds.contains(EntityKinds::EVENTS) {
            merger.add(self.backend.user_events(self.user_id).await.map(Batch::Events));
            for team_id in &self.team_ids {
                merger.add(self.backend.team_events(*team_id).await.map(Batch::Events));
            }
        }
        if kinds.contains(EntityKinds::ASSIGNMENTS) {
            for team_id in &self.team_ids {
                merger.add(self.backend.team_assignments(*team_id, window).await.map(Batch::Assignments));
            }
        }

        self.view.reset(merger.merge(), window);
        log::debug!("Refreshed the agenda: {} items on display", self.view.len());
    }

    /// Move an item so it starts at `new_start`, keeping its duration.
    ///
    /// The display updates synchronously; the backend request happens after.
    /// A backend rejection rolls the item back and emits a notice instead of
    /// returning an error.
    pub async fn move_item(&mut self, id: &ItemId, new_start: DateTime<Utc>) -> Result<EditOutcome, Box<dyn Error>> {
        let current = self.view.get(id).ok_or_else(|| format!("No displayed item has identity {}", id))?;
        let kind = current.source();
        let target = current.interval().shifted_to(new_start);
        let request = self.view.begin_edit(id, EditKind::Move, target)?;
        Ok(self.dispatch(id, kind, request).await)
    }

    /// Resize an item so it ends at `new_end`, keeping its start.
    pub async fn resize_item(&mut self, id: &ItemId, new_end: DateTime<Utc>) -> Result<EditOutcome, Box<dyn Error>> {
        let current = self.view.get(id).ok_or_else(|| format!("No displayed item has identity {}", id))?;
        let kind = current.source();
        let target = Interval::new(current.interval().start(), new_end)
            .map_err(|_| crate::view::EditError::EmptyInterval)?;
        let request = self.view.begin_edit(id, EditKind::ResizeEnd, target)?;
        Ok(self.dispatch(id, kind, request).await)
    }

    async fn dispatch(&mut self, id: &ItemId, kind: SourceKind, request: EditRequest) -> EditOutcome {
        let result = match request {
            EditRequest::Task { id, patch } => self.backend.patch_task(id, patch).await,
            EditRequest::Event { id, patch } => self.backend.patch_event(id, patch).await,
            EditRequest::Assignment { id, patch } => self.backend.patch_assignment(id, patch).await,
        };
        match result {
            Ok(()) => EditOutcome::Applied,
            Err(err) => {
                log::warn!("The backend rejected the edit on {}: {}", id, err);
                self.view.roll_back(id);
                self.notify(Notice::EditRejected { kind, message: err.to_string() });
                EditOutcome::RolledBack
            }
        }
    }

    /// Create a task. Not optimistic: the created entity reaches the display
    /// through the push channel like any other foreign change.
    pub async fn create_task(&self, task: NewTask) -> Result<crate::Task, Box<dyn Error>> {
        self.backend.create_task(task).await
    }

    /// Create an event. See [`Session::create_task`].
    pub async fn create_event(&self, event: NewEvent) -> Result<crate::Event, Box<dyn Error>> {
        self.backend.create_event(event).await
    }

    /// Delete a displayed item at its backend. Scheduled aggregates cannot be
    /// deleted from the calendar; the deletion lands on display when the
    /// matching push message arrives.
    pub async fn delete_item(&self, id: &ItemId) -> Result<(), Box<dyn Error>> {
        match id.kind() {
            ItemKind::Task => self.backend.delete_task(id.backend_id()).await,
            ItemKind::Event => self.backend.delete_event(id.backend_id()).await,
            ItemKind::ScheduledTask => {
                Err(format!("{} is produced by the optimizer and cannot be deleted here", id).into())
            }
        }
    }

    /// Entry point for inbound push frames.
    ///
    /// Unknown topics and malformed payloads are logged and discarded; a
    /// frame can never corrupt the display collection.
    pub fn handle_frame(&mut self, topic: &str, body: &str) {
        match push::parse_topic(topic) {
            None => log::debug!("Ignoring a frame for unhandled topic {}", topic),
            Some(Topic::TeamTasks(_)) => {
                if let Some(message) = push::parse_frame::<TaskChanged>(body) {
                    self.view.apply_task_change(&message);
                }
            }
            Some(Topic::TeamEvents(_)) => {
                if let Some(message) = push::parse_frame::<EventChanged>(body) {
                    self.view.apply_event_change(&message);
                }
            }
            Some(Topic::TeamConflicts(_)) => {
                if let Some(message) = push::parse_frame::<ConflictAlert>(body) {
                    self.notify(Notice::ScheduleConflict {
                        message: message.message,
                        conflicting: message.conflicts.len(),
                    });
                }
            }
            Some(Topic::User(_)) => {
                if let Some(message) = push::parse_frame::<UserNotification>(body) {
                    self.notify(Notice::UserMessage {
                        title: message.title,
                        content: message.content,
                    });
                }
            }
        }
    }

    fn notify(&self, notice: Notice) {
        if let Some(sender) = &self.notices {
            // a closed receiver only means nobody renders toasts anymore
            let _ = sender.send(notice);
        }
    }

    /// Tear the session down: unsubscribe every push topic, then drop the
    /// channel and the client. In-flight fetches are simply ignored.
    pub async fn close(mut self) {
        for subscription in self.subscriptions.drain(..) {
            if let Err(err) = self.push.unsubscribe(&subscription).await {
                log::warn!("Unable to unsubscribe from {}: {}", subscription, err);
            }
        }
        log::info!("Session closed");
    }
}
