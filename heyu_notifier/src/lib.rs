//! Long-lived HeyU subscriber: reconnects with backoff and routes incoming
//! notifications into a sink driver.

pub mod backoff;
pub mod client;
pub mod error;
pub mod events;
pub mod sink;

pub use backoff::Backoff;
pub use client::{Control, NotifierClient};
pub use error::{NotifierError, Result};
pub use events::{EventQueue, NotifierEvent};
