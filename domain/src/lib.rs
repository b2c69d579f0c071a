//! Business rules for the dashboard's realtime notifications.
//!
//! The web layer calls into this crate; this crate decides what a valid
//! notification is and announces accepted rows through the `events` crate.

pub use events::Id;

pub mod error;
pub mod notification;
