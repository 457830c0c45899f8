use std::fmt::Display;

use crate::storage::entities::WorkEntry;

/// Short messages the tray shows to the user, the balloons of a desktop tray icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Started { interval_minutes: u64 },
    Saved(WorkEntry),
    Snoozed { minutes: u64 },
    Paused,
    Resumed,
    /// Non-fatal. A failed save leaves the entry in the open dialog.
    StorageFailed(String),
    Summary(String),
}

impl Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::Started { interval_minutes } => write!(
                f,
                "Work logger is running. Reminders every {interval_minutes} minutes."
            ),
            Notice::Saved(entry) => write!(
                f,
                "Entry logged: {}-{} {}",
                entry.start_time, entry.end_time, entry.description
            ),
            Notice::Snoozed { minutes } => write!(f, "Snoozed for {minutes} minutes."),
            Notice::Paused => write!(f, "Reminders paused. Press p to resume."),
            Notice::Resumed => write!(f, "Reminders resumed."),
            Notice::StorageFailed(reason) => write!(f, "Storage error: {reason}"),
            Notice::Summary(text) => write!(f, "{text}"),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait Notifier {
    fn notify(&mut self, notice: Notice);
}

/// The event loop drains the receiving side before every redraw.
impl Notifier for tokio::sync::mpsc::UnboundedSender<Notice> {
    fn notify(&mut self, notice: Notice) {
        if self.send(notice).is_err() {
            tracing::warn!("Nobody is listening for notifications anymore");
        }
    }
}
