//! stdout sink: prints each notification in a fixed multi-field layout,
//! blank-line separated; prints a running count when the stream ends.

use super::Notification;

#[derive(Default)]
pub struct StdoutSink {
    count: u64,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, notification: &Notification) {
        println!("id: {}", notification.id);
        println!("application: {}", notification.application);
        println!("summary: {}", notification.summary);
        println!("body: {}", notification.body);
        println!("category: {}", notification.category.as_deref().unwrap_or(""));
        println!("urgency: {}", notification.urgency);
        println!();
        self.count += 1;
    }

    pub fn finish(&self) {
        println!("{} notification(s) received", self.count);
    }
}
