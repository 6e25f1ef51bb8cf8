//! Port for annotations attached to the next user message.

/// Supplies `<system-reminder>` texts for the next user message.
///
/// Implementations hand each reminder out once.
pub trait ReminderSource: Send + Sync {
    fn take_reminders(&self) -> Vec<String>;
}

/// Source that never has anything to say.
pub struct NoReminders;

impl ReminderSource for NoReminders {
    fn take_reminders(&self) -> Vec<String> {
        Vec::new()
    }
}
