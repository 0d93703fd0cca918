use std::time::Duration;

/// How long the presentation layer keeps a notification on screen.
pub const AUTO_HIDE_AFTER: Duration = Duration::from_secs(6);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Severity {
    #[default]
    Success,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notification {
    pub visible: bool,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Timeout,
    ClickAway,
    Explicit,
}

/// One slot; a new notification replaces whatever is showing.
#[derive(Debug, Default)]
pub struct NotificationQueue {
    slot: Notification,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&mut self, message: impl Into<String>, severity: Severity) {
        self.slot = Notification {
            visible: true,
            message: message.into(),
            severity,
        };
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.notify(message, Severity::Success);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.notify(message, Severity::Error);
    }

    pub fn dismiss(&mut self) {
        self.slot.visible = false;
    }

    /// Returns whether the notification was dismissed. Clicks outside it are ignored.
    pub fn close(&mut self, reason: CloseReason) -> bool {
        if reason == CloseReason::ClickAway {
            return false;
        }
        self.dismiss();
        true
    }

    pub fn current(&self) -> &Notification {
        &self.slot
    }

    pub fn visible(&self) -> Option<&Notification> {
        self.slot.visible.then_some(&self.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_hidden() {
        let queue = NotificationQueue::new();
        assert!(queue.visible().is_none());
        assert!(!queue.current().visible);
    }

    #[test]
    fn new_notification_replaces_current() {
        let mut queue = NotificationQueue::new();
        queue.success("Action created successfully");
        queue.error("Error deleting action");

        let shown = queue.visible().expect("visible");
        assert_eq!(shown.message, "Error deleting action");
        assert_eq!(shown.severity, Severity::Error);
    }

    #[test]
    fn dismiss_only_hides() {
        let mut queue = NotificationQueue::new();
        queue.success("Action deleted successfully");
        queue.dismiss();

        assert!(queue.visible().is_none());
        assert_eq!(queue.current().message, "Action deleted successfully");
        assert_eq!(queue.current().severity, Severity::Success);
    }

    #[test]
    fn click_away_does_not_close() {
        let mut queue = NotificationQueue::new();
        queue.error("Error saving action");

        assert!(!queue.close(CloseReason::ClickAway));
        assert!(queue.visible().is_some());
        assert!(queue.close(CloseReason::Timeout));
        assert!(queue.visible().is_none());
    }

    #[test]
    fn notify_after_dismiss_shows_again() {
        let mut queue = NotificationQueue::new();
        queue.success("first");
        queue.close(CloseReason::Explicit);
        queue.success("second");
        assert_eq!(queue.visible().map(|n| n.message.as_str()), Some("second"));
    }
}
