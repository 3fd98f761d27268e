//! This crate is the client-side core of a team scheduling calendar.
//!
//! It merges scheduling entities (tasks, events, and optimizer-produced
//! assignments) fetched over REST with a live push channel into one
//! deduplicated, display-ready collection, and keeps that collection
//! consistent while the user directly manipulates it.
//!
//! The moving parts:
//! * the [`merge`] module combines any number of fetched batches into the
//!   display collection: it deduplicates identities, derives task intervals
//!   backward from their due dates, coalesces assignment fragments, and
//!   expands recurring events inside the visible window;
//! * an [`AgendaView`](view::AgendaView) owns that collection and applies
//!   user edits optimistically: the display mutates synchronously, the
//!   backend request follows, and a rejection rolls the item back to its
//!   last confirmed state;
//! * the same view reconciles inbound push messages, suppressing the echo of
//!   this client's own edits so a confirmation never re-renders what the
//!   user already sees;
//! * a [`Session`] ties it all together with an explicit lifecycle: it owns
//!   the REST client, the push subscriptions and the view, and tears all of
//!   them down when the calendar unmounts.

pub mod traits;

mod item;
pub use item::{CalendarItem, Interval, ItemId, ItemKind, SourceKind};
mod task;
pub use task::{NewTask, Task, TaskPatch};
mod event;
pub use event::{Event, EventPatch, NewEvent};
mod assignment;
pub use assignment::{Assignment, AssignmentPatch};

pub mod color;
pub mod config;
pub mod merge;
pub mod notice;
pub mod push;
pub mod recurrence;
pub mod view;
pub use view::AgendaView;

pub mod client;
pub mod session;
pub use session::Session;
