use std::error::Error;

use async_trait::async_trait;

use crate::assignment::{Assignment, AssignmentPatch};
use crate::event::{Event, EventPatch, NewEvent};
use crate::item::Interval;
use crate::push::Subscription;
use crate::task::{NewTask, Task, TaskPatch};

/// Read access to the scheduling entities of the REST boundary.
///
/// Every method maps to one fetch; implementations hold no state beyond the
/// lifetime of a single call. A failing fetch is reported as an error and
/// handled by the caller (the merge treats it as an empty source).
#[async_trait]
pub trait EntitySource {
    /// Tasks owned by a team
    async fn team_tasks(&self, team_id: u64) -> Result<Vec<Task>, Box<dyn Error>>;
    /// Tasks directly assigned to a user, across teams
    async fn assigned_tasks(&self, assignee_id: u64) -> Result<Vec<Task>, Box<dyn Error>>;
    /// Events owned by a team
    async fn team_events(&self, team_id: u64) -> Result<Vec<Event>, Box<dyn Error>>;
    /// Events owned by a user, across teams
    async fn user_events(&self, owner_id: u64) -> Result<Vec<Event>, Box<dyn Error>>;
    /// Optimizer assignments of a team intersecting the given window
    async fn team_assignments(&self, team_id: u64, window: Interval) -> Result<Vec<Assignment>, Box<dyn Error>>;
}

/// Write access to the scheduling entities.
///
/// Patches are partial: only the fields an edit actually changes are sent.
/// A rejection carries the server's human-readable message in the error.
#[async_trait]
pub trait EditSink {
    async fn patch_task(&self, id: u64, patch: TaskPatch) -> Result<(), Box<dyn Error>>;
    async fn patch_event(&self, id: u64, patch: EventPatch) -> Result<(), Box<dyn Error>>;
    async fn patch_assignment(&self, id: u64, patch: AssignmentPatch) -> Result<(), Box<dyn Error>>;

    async fn create_task(&self, task: NewTask) -> Result<Task, Box<dyn Error>>;
    async fn create_event(&self, event: NewEvent) -> Result<Event, Box<dyn Error>>;
    async fn delete_task(&self, id: u64) -> Result<(), Box<dyn Error>>;
    async fn delete_event(&self, id: u64) -> Result<(), Box<dyn Error>>;
}

/// The live push channel.
///
/// `subscribe` returns a handle; dropping the handle does nothing by itself,
/// the session is responsible for explicitly unsubscribing every handle it
/// holds when it is torn down.
#[async_trait]
pub trait PushChannel {
    async fn subscribe(&mut self, topic: &str) -> Result<Subscription, Box<dyn Error>>;
    async fn unsubscribe(&mut self, subscription: &Subscription) -> Result<(), Box<dyn Error>>;
}
