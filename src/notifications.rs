//! System notifications for timer events.

use log::warn;
use notify_rust::Notification;
use std::thread;

pub const FOCUS_DONE_TITLE: &str = "Focus Complete! 🍅";
pub const FOCUS_DONE_BODY: &str = "Nice work. Time to take a break.";
pub const BREAK_DONE_TITLE: &str = "Break Over! ☕";
pub const BREAK_DONE_BODY: &str = "Ready to focus again?";

/// Outbound notification request. Fire-and-forget: callers never learn
/// whether delivery succeeded.
pub trait Notifier: Send {
    fn request_notification(&self, title: &str, body: &str);
}

/// Shows notifications through the desktop notification service.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    /// Runs in a background thread to avoid blocking.
    fn request_notification(&self, title: &str, body: &str) {
        let title = title.to_string();
        let body = body.to_string();
        thread::spawn(move || {
            if let Err(e) = Notification::new()
                .summary(&title)
                .body(&body)
                .sound_name("default")
                .show()
            {
                warn!("Failed to show notification: {}", e);
            }
        });
    }
}

/// Records requests instead of showing them (for testing).
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    pub sent: std::sync::Arc<std::sync::Mutex<Vec<(String, String)>>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn titles(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(title, _)| title.clone())
            .collect()
    }
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn request_notification(&self, title: &str, body: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
    }
}

#[cfg(test)]
mod tests {
    // Note: Desktop notification tests interact with the system and may hang
    // waiting for user interaction. They are ignored by default.
    // Run with `cargo test -- --ignored` to execute them.

    use super::*;

    #[test]
    fn test_recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::default();
        notifier.request_notification(FOCUS_DONE_TITLE, FOCUS_DONE_BODY);
        notifier.request_notification(BREAK_DONE_TITLE, BREAK_DONE_BODY);
        assert_eq!(notifier.titles(), vec![FOCUS_DONE_TITLE, BREAK_DONE_TITLE]);
    }

    #[test]
    #[ignore = "Requires system notification interaction"]
    fn test_desktop_focus_notification() {
        DesktopNotifier.request_notification(FOCUS_DONE_TITLE, FOCUS_DONE_BODY);
    }

    #[test]
    #[ignore = "Requires system notification interaction"]
    fn test_desktop_break_notification() {
        DesktopNotifier.request_notification(BREAK_DONE_TITLE, BREAK_DONE_BODY);
    }
}
