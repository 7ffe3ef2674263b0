//! Events delivered to a sink driver through the notifier's pending queue.
//!
//! Grounded on `heyu.notifier.NotifierApplication`'s `CONNECTED` /
//! `DISCONNECTED` / `ERROR` synthetic categories, which travel through the
//! same queue as real notifications so a driver can de-duplicate the
//! notifier's own status updates against one popup slot (`app_id`).

use std::collections::VecDeque;
use std::sync::Arc;

use heyu_proto::Message;
use parking_lot::Mutex;
use tokio::sync::Notify;

pub const CONNECTED_CATEGORY: &str = "network.connected";
pub const DISCONNECTED_CATEGORY: &str = "network.disconnected";
pub const ERROR_CATEGORY: &str = "network.error";

#[derive(Debug, Clone)]
pub enum NotifierEvent {
    /// A real, decoded `notify` frame from the hub.
    Notification(Message),
    /// Synthetic: the subscribe handshake completed.
    Connected,
    /// Synthetic: the connection ended, gracefully or not.
    Disconnected,
    /// Synthetic: a protocol-level error occurred.
    Error(String),
    /// Sentinel: stop consuming. Emitted by `stop`/`shutdown`.
    Shutdown,
}

impl NotifierEvent {
    /// Renders a synthetic event as a `notify` Message carrying the
    /// notifier's own stable `app_id`, mirroring
    /// `NotifierApplication.notify()`'s synthetic-message construction.
    pub fn into_notify(self, app_id: &str) -> Option<Message> {
        match self {
            NotifierEvent::Notification(msg) => Some(msg),
            NotifierEvent::Connected => Some(
                Message::notify("heyu-notifier", "connected", "")
                    .with_category(CONNECTED_CATEGORY)
                    .with_id(app_id),
            ),
            NotifierEvent::Disconnected => Some(
                Message::notify("heyu-notifier", "disconnected", "")
                    .with_category(DISCONNECTED_CATEGORY)
                    .with_id(app_id),
            ),
            NotifierEvent::Error(reason) => Some(
                Message::notify("heyu-notifier", "error", reason)
                    .with_category(ERROR_CATEGORY)
                    .with_id(app_id),
            ),
            NotifierEvent::Shutdown => None,
        }
    }
}

struct QueueState {
    events: Mutex<VecDeque<NotifierEvent>>,
    notify: Notify,
}

/// The notifier's pending queue: an mpsc-like FIFO with one extra
/// capability plain channels lack, `clear()`, which an abrupt shutdown
/// (SIGUSR1) needs to discard unconsumed notifications instead of letting
/// the sink loop drain them first (spec.md §4.4).
#[derive(Clone)]
pub struct EventQueue {
    state: Arc<QueueState>,
}

impl EventQueue {
    pub fn new() -> Self {
        EventQueue {
            state: Arc::new(QueueState {
                events: Mutex::new(VecDeque::new()),
                notify: Notify::new(),
            }),
        }
    }

    pub fn push(&self, event: NotifierEvent) {
        self.state.events.lock().push_back(event);
        self.state.notify.notify_one();
    }

    /// Discards every unconsumed event. Used only on abrupt shutdown; a
    /// graceful stop lets the queue drain normally.
    pub fn clear(&self) {
        self.state.events.lock().clear();
    }

    pub async fn recv(&self) -> NotifierEvent {
        loop {
            if let Some(event) = self.state.events.lock().pop_front() {
                return event;
            }
            self.state.notify.notified().await;
        }
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
