//! Central broker for the HeyU notification fabric.

pub mod connection;
pub mod error;
pub mod hostname;
pub mod registry;
pub mod server;

pub use error::{HubError, Result};
pub use server::HubServer;
