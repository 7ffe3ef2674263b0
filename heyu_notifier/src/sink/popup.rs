//! popup sink: forwards notifications to the host desktop-notification
//! service, collapsing repeats of the same `id` into the existing popup.
//!
//! The real D-Bus binding is out of scope (spec.md §1); `LoggingPopupSink`
//! is the process-local stand-in, mirroring the original's own
//! `fake_pynotify` test double.

use std::collections::HashMap;

use chrono::Local;

use super::Notification;

pub trait PopupSink {
    fn show(&mut self, notification: &Notification);
}

/// Logs each notification instead of rendering a real popup, tracking
/// `id -> last shown` so a repeated id is reported as an update rather than
/// a fresh popup.
#[derive(Default)]
pub struct LoggingPopupSink {
    last_shown: HashMap<String, Notification>,
}

impl LoggingPopupSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PopupSink for LoggingPopupSink {
    fn show(&mut self, notification: &Notification) {
        let now = Local::now().format("%H:%M:%S");
        if self.last_shown.contains_key(&notification.id) {
            tracing::info!(
                "[{now}] popup update id={} {}: {}",
                notification.id,
                notification.summary,
                notification.body
            );
        } else {
            tracing::info!(
                "[{now}] popup id={} {}: {}",
                notification.id,
                notification.summary,
                notification.body
            );
        }
        self.last_shown.insert(notification.id.clone(), notification.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(id: &str) -> Notification {
        Notification {
            id: id.to_string(),
            application: "chat".to_string(),
            summary: "hi".to_string(),
            body: "there".to_string(),
            category: None,
            urgency: heyu_proto::Urgency::Normal,
        }
    }

    #[test]
    fn repeated_id_collapses_into_tracked_entry() {
        let mut sink = LoggingPopupSink::new();
        sink.show(&notification("abc"));
        sink.show(&notification("abc"));
        assert_eq!(sink.last_shown.len(), 1);
    }

    #[test]
    fn distinct_ids_each_get_an_entry() {
        let mut sink = LoggingPopupSink::new();
        sink.show(&notification("a"));
        sink.show(&notification("b"));
        assert_eq!(sink.last_shown.len(), 2);
    }
}
