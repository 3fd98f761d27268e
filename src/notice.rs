//! Transient user-facing notices
//!
//! Failures in this crate are never fatal: a rejected edit or a backend
//! conflict surfaces as a [`Notice`] on a watch channel the UI can render as
//! a toast, while the display collection stays consistent.

use std::fmt::{Display, Error, Formatter};

use crate::item::SourceKind;

/// Something the user should see, without interrupting them
#[derive(Clone, Debug)]
pub enum Notice {
    /// Nothing to report yet
    Quiet,
    /// An optimistic edit was rejected by the backend and has been rolled back
    EditRejected { kind: SourceKind, message: String },
    /// The backend detected conflicting entries
    ScheduleConflict { message: String, conflicting: usize },
    /// A collaboration notification addressed to this user
    UserMessage { title: String, content: String },
}

impl Display for Notice {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            Notice::Quiet => write!(f, "No notice"),
            Notice::EditRejected { kind, message } => {
                write!(f, "Could not save the {} change: {}", kind, message)
            }
            Notice::ScheduleConflict { message, conflicting } => {
                write!(f, "Schedule conflict ({} entries): {}", conflicting, message)
            }
            Notice::UserMessage { title, content } => write!(f, "{}: {}", title, content),
        }
    }
}

impl Default for Notice {
    fn default() -> Self {
        Self::Quiet
    }
}

/// See [`notice_channel`]
pub type NoticeSender = tokio::sync::watch::Sender<Notice>;
/// See [`notice_channel`]
pub type NoticeReceiver = tokio::sync::watch::Receiver<Notice>;

/// Create a notice channel. Hand the sender to the session and keep the
/// receiver wherever toasts are rendered.
pub fn notice_channel() -> (NoticeSender, NoticeReceiver) {
    tokio::sync::watch::channel(Notice::default())
}
