//! Shared helpers for the integration tests: an in-memory backend with
//! counted failure injection, a recording push channel, and entity builders.
#![allow(dead_code)]

use std::error::Error;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use team_agenda::push::Subscription;
use team_agenda::traits::{EditSink, EntitySource, PushChannel};
use team_agenda::{Assignment, AssignmentPatch, Event, EventPatch, Interval, NewEvent, NewTask, Task, TaskPatch};

/// So that an operation fails _n_ times after _m_ initial successes, set
/// `(m, n)` for the suited parameter.
#[derive(Default, Clone, Debug)]
pub struct MockBehaviour {
    pub team_tasks_behaviour: (u32, u32),
    pub assigned_tasks_behaviour: (u32, u32),
    pub team_events_behaviour: (u32, u32),
    pub user_events_behaviour: (u32, u32),
    pub assignments_behaviour: (u32, u32),
    pub patch_task_behaviour: (u32, u32),
    pub patch_event_behaviour: (u32, u32),
    pub patch_assignment_behaviour: (u32, u32),
}

impl MockBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every mutation fails at once, for `n_fails` times
    pub fn reject_mutations(n_fails: u32) -> Self {
        Self {
            patch_task_behaviour: (0, n_fails),
            patch_event_behaviour: (0, n_fails),
            patch_assignment_behaviour: (0, n_fails),
            ..Self::default()
        }
    }
}

/// Return Ok(()) in case the value is `(1+, _)` or `(_, 0)`, or return Err and decrement otherwise
fn decrement(value: &mut (u32, u32), descr: &str) -> Result<(), Box<dyn Error>> {
    let remaining_successes = value.0;
    let remaining_failures = value.1;

    if remaining_successes > 0 {
        value.0 -= 1;
        Ok(())
    } else if remaining_failures > 0 {
        value.1 -= 1;
        Err(format!("Mocked behaviour requires this {} to fail this time", descr).into())
    } else {
        Ok(())
    }
}

#[derive(Default)]
struct MockData {
    tasks: Vec<Task>,
    events: Vec<Event>,
    assignments: Vec<Assignment>,
}

/// An in-memory stand-in for the scheduling backend.
///
/// Shared handles (`Arc`) let a test keep inspecting the backend after the
/// session took ownership of a clone.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockData>>,
    pub behaviour: Arc<Mutex<MockBehaviour>>,
    /// Human-readable record of every mutation that reached the backend
    pub mutation_log: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behaviour(behaviour: MockBehaviour) -> Self {
        let backend = Self::new();
        *backend.behaviour.lock().unwrap() = behaviour;
        backend
    }

    pub fn add_task(&self, task: Task) {
        self.state.lock().unwrap().tasks.push(task);
    }

    pub fn add_event(&self, event: Event) {
        self.state.lock().unwrap().events.push(event);
    }

    pub fn add_assignment(&self, assignment: Assignment) {
        self.state.lock().unwrap().assignments.push(assignment);
    }

    pub fn mutation_count(&self) -> usize {
        self.mutation_log.lock().unwrap().len()
    }

    /// Rewrite a stored task in place, e.g. to simulate a stale replica
    pub fn update_task<F: FnOnce(&mut Task)>(&self, id: u64, apply: F) {
        let mut state = self.state.lock().unwrap();
        if let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) {
            apply(task);
        }
    }

    fn can(&self, pick: impl FnOnce(&mut MockBehaviour) -> &mut (u32, u32), descr: &str) -> Result<(), Box<dyn Error>> {
        let mut behaviour = self.behaviour.lock().unwrap();
        decrement(pick(&mut behaviour), descr)
    }
}

#[async_trait]
impl EntitySource for MockBackend {
    async fn team_tasks(&self, team_id: u64) -> Result<Vec<Task>, Box<dyn Error>> {
        self.can(|b| &mut b.team_tasks_behaviour, "team_tasks")?;
        Ok(self.state.lock().unwrap().tasks.iter()
            .filter(|t| t.team_id == Some(team_id))
            .cloned()
            .collect())
    }

    async fn assigned_tasks(&self, assignee_id: u64) -> Result<Vec<Task>, Box<dyn Error>> {
        self.can(|b| &mut b.assigned_tasks_behaviour, "assigned_tasks")?;
        Ok(self.state.lock().unwrap().tasks.iter()
            .filter(|t| t.assignee_id == Some(assignee_id))
            .cloned()
            .collect())
    }

    async fn team_events(&self, team_id: u64) -> Result<Vec<Event>, Box<dyn Error>> {
        self.can(|b| &mut b.team_events_behaviour, "team_events")?;
        Ok(self.state.lock().unwrap().events.iter()
            .filter(|e| e.team_id == Some(team_id))
            .cloned()
            .collect())
    }

    async fn user_events(&self, owner_id: u64) -> Result<Vec<Event>, Box<dyn Error>> {
        self.can(|b| &mut b.user_events_behaviour, "user_events")?;
        Ok(self.state.lock().unwrap().events.iter()
            .filter(|e| e.owner_id == Some(owner_id))
            .cloned()
            .collect())
    }

    async fn team_assignments(&self, _team_id: u64, window: Interval) -> Result<Vec<Assignment>, Box<dyn Error>> {
        self.can(|b| &mut b.assignments_behaviour, "team_assignments")?;
        Ok(self.state.lock().unwrap().assignments.iter()
            .filter(|a| a.starts_at < window.end() && window.start() < a.ends_at)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EditSink for MockBackend {
    async fn patch_task(&self, id: u64, patch: TaskPatch) -> Result<(), Box<dyn Error>> {
        self.can(|b| &mut b.patch_task_behaviour, "patch_task")?;
        let mut state = self.state.lock().unwrap();
        let task = state.tasks.iter_mut().find(|t| t.id == id)
            .ok_or_else(|| format!("No task {}", id))?;
        if let Some(due_at) = patch.due_at {
            task.due_at = Some(due_at);
        }
        if let Some(duration_min) = patch.duration_min {
            task.duration_min = duration_min;
        }
        self.mutation_log.lock().unwrap().push(format!("patch task {}", id));
        Ok(())
    }

    async fn patch_event(&self, id: u64, patch: EventPatch) -> Result<(), Box<dyn Error>> {
        self.can(|b| &mut b.patch_event_behaviour, "patch_event")?;
        let mut state = self.state.lock().unwrap();
        let event = state.events.iter_mut().find(|e| e.id == id)
            .ok_or_else(|| format!("No event {}", id))?;
        if let Some(starts_at) = patch.starts_at {
            event.starts_at = starts_at;
        }
        if let Some(ends_at) = patch.ends_at {
            event.ends_at = ends_at;
        }
        self.mutation_log.lock().unwrap().push(format!("patch event {}", id));
        Ok(())
    }

    async fn patch_assignment(&self, id: u64, patch: AssignmentPatch) -> Result<(), Box<dyn Error>> {
        self.can(|b| &mut b.patch_assignment_behaviour, "patch_assignment")?;
        let mut state = self.state.lock().unwrap();
        let assignment = state.assignments.iter_mut().find(|a| a.id == id)
            .ok_or_else(|| format!("No assignment {}", id))?;
        if let Some(starts_at) = patch.starts_at {
            assignment.starts_at = starts_at;
        }
        if let Some(ends_at) = patch.ends_at {
            assignment.ends_at = ends_at;
        }
        self.mutation_log.lock().unwrap().push(format!("patch assignment {}", id));
        Ok(())
    }

    async fn create_task(&self, task: NewTask) -> Result<Task, Box<dyn Error>> {
        let mut state = self.state.lock().unwrap();
        let id = state.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let created = Task {
            id,
            team_id: Some(task.team_id),
            assignee_id: task.assignee_id,
            title: task.title,
            duration_min: task.duration_min,
            due_at: task.due_at,
            priority: task.priority,
            splittable: task.splittable,
            tags: task.tags,
        };
        state.tasks.push(created.clone());
        self.mutation_log.lock().unwrap().push(format!("create task {}", id));
        Ok(created)
    }

    async fn create_event(&self, event: NewEvent) -> Result<Event, Box<dyn Error>> {
        let mut state = self.state.lock().unwrap();
        let id = state.events.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        let created = Event {
            id,
            team_id: Some(event.team_id),
            owner_id: None,
            title: event.title,
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            location: event.location,
            notes: event.notes,
            attendees: event.attendees,
            fixed: event.fixed,
            recurrence_type: event.recurrence_type,
            recurrence_end_date: event.recurrence_end_date,
        };
        state.events.push(created.clone());
        self.mutation_log.lock().unwrap().push(format!("create event {}", id));
        Ok(created)
    }

    async fn delete_task(&self, id: u64) -> Result<(), Box<dyn Error>> {
        self.state.lock().unwrap().tasks.retain(|t| t.id != id);
        self.mutation_log.lock().unwrap().push(format!("delete task {}", id));
        Ok(())
    }

    async fn delete_event(&self, id: u64) -> Result<(), Box<dyn Error>> {
        self.state.lock().unwrap().events.retain(|e| e.id != id);
        self.mutation_log.lock().unwrap().push(format!("delete event {}", id));
        Ok(())
    }
}

/// A push channel that only records which subscriptions are active.
/// Frames are injected directly via `Session::handle_frame` in tests.
#[derive(Clone, Default)]
pub struct MockPush {
    pub active: Arc<Mutex<Vec<Subscription>>>,
}

impl MockPush {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_topics(&self) -> Vec<String> {
        self.active.lock().unwrap().iter().map(|s| s.topic().to_string()).collect()
    }
}

#[async_trait]
impl PushChannel for MockPush {
    async fn subscribe(&mut self, topic: &str) -> Result<Subscription, Box<dyn Error>> {
        let subscription = Subscription::new(topic);
        self.active.lock().unwrap().push(subscription.clone());
        Ok(subscription)
    }

    async fn unsubscribe(&mut self, subscription: &Subscription) -> Result<(), Box<dyn Error>> {
        let mut active = self.active.lock().unwrap();
        let before = active.len();
        active.retain(|s| s.id() != subscription.id());
        if active.len() == before {
            return Err(format!("No active subscription {}", subscription).into());
        }
        Ok(())
    }
}

// Entity builders. Everything happens on 2030-01-07, a Monday.

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 7, hour, minute, 0).unwrap()
}

pub fn day_window() -> Interval {
    Interval::new(at(0, 0), at(23, 59)).unwrap()
}

pub fn week_window() -> Interval {
    Interval::new(at(0, 0), Utc.with_ymd_and_hms(2030, 1, 14, 0, 0, 0).unwrap()).unwrap()
}

pub fn task(id: u64, team_id: u64, title: &str, due_at: Option<DateTime<Utc>>, duration_min: i64, priority: u8) -> Task {
    Task {
        id,
        team_id: Some(team_id),
        assignee_id: None,
        title: title.to_string(),
        duration_min,
        due_at,
        priority,
        splittable: false,
        tags: None,
    }
}

pub fn event(id: u64, team_id: u64, title: &str, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Event {
    Event {
        id,
        team_id: Some(team_id),
        owner_id: None,
        title: title.to_string(),
        starts_at,
        ends_at,
        location: None,
        notes: None,
        attendees: None,
        fixed: false,
        recurrence_type: None,
        recurrence_end_date: None,
    }
}

pub fn assignment(id: u64, task_id: u64, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Assignment {
    Assignment {
        id,
        schedule_id: Some(1),
        task_id,
        task_title: None,
        title: None,
        starts_at,
        ends_at,
        slot_index: None,
    }
}

// Push frame bodies, as the backend would serialize them.

pub fn task_updated_body(task: &Task) -> String {
    serde_json::json!({
        "action": "UPDATED",
        "task": task,
        "taskId": task.id,
        "teamId": task.team_id,
    })
    .to_string()
}

pub fn task_deleted_body(task_id: u64, team_id: u64) -> String {
    serde_json::json!({
        "action": "DELETED",
        "task": null,
        "taskId": task_id,
        "teamId": team_id,
    })
    .to_string()
}

pub fn event_updated_body(event: &Event) -> String {
    serde_json::json!({
        "teamId": event.team_id,
        "action": "UPDATED",
        "event": event,
        "eventId": event.id,
    })
    .to_string()
}

pub fn event_deleted_body(event_id: u64, team_id: u64) -> String {
    serde_json::json!({
        "teamId": team_id,
        "action": "DELETED",
        "event": null,
        "eventId": event_id,
    })
    .to_string()
}

pub fn conflict_body(team_id: u64, message: &str, conflicts: &[Event]) -> String {
    serde_json::json!({
        "teamId": team_id,
        "sourceType": "CALENDAR_EVENT",
        "sourceId": null,
        "source": null,
        "conflicts": conflicts,
        "message": message,
    })
    .to_string()
}
