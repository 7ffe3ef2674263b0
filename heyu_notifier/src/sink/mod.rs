//! Sink drivers: consumers of the notifier's event queue.
//!
//! Each driver is a simple loop over `NotifierEvent`s, rendering the
//! `Notification` shape. Grounded on `heyu.notifier`'s driver functions
//! (decorated CLI subcommands in the original, here small structs
//! implementing a shared trait).

pub mod file;
pub mod popup;
pub mod script;
pub mod stdout;

use heyu_proto::{Message, MessageBody, Urgency};

/// A flattened view of a `notify` message, convenient for every driver's
/// rendering logic.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: String,
    pub application: String,
    pub summary: String,
    pub body: String,
    pub category: Option<String>,
    pub urgency: Urgency,
}

impl Notification {
    pub fn from_message(msg: &Message) -> Option<Notification> {
        let MessageBody::Notify {
            app_name,
            summary,
            body,
            urgency,
            category,
            id,
        } = msg.body()
        else {
            return None;
        };

        Some(Notification {
            id: id.clone().unwrap_or_default(),
            application: app_name.clone(),
            summary: summary.clone(),
            body: body.clone(),
            category: category.clone(),
            urgency: *urgency,
        })
    }
}
