//! Client side of the dashboard's realtime notifications.
//!
//! A [`NotificationBridge`] turns the signed-in user's notification inserts into
//! transient alerts. It depends on four seams, each a trait so the bridge runs the
//! same against a browser-like toast surface, a terminal, or a test double:
//!
//! - [`SessionProvider`](session::SessionProvider) resolves the current user
//! - [`RealtimeFeed`](feed::RealtimeFeed) opens a filtered insert subscription
//! - [`AlertSurface`](alert::AlertSurface) displays alerts
//! - [`PermissionCapability`](permission::PermissionCapability) reports the
//!   platform notification permission, which the bridge only reads
//!
//! # Lifecycle
//!
//! 1. [`NotificationBridge::mount`] spawns the setup task and returns a
//!    [`BridgeHandle`] right away
//! 2. The session resolves. Without one, nothing is subscribed
//! 3. Exactly one subscription to `notifications` inserts filtered on
//!    `user_id = <session user>` is opened and every event becomes an alert
//! 4. [`BridgeHandle::unmount`] cancels the task and closes the subscription.
//!    No alert is shown once it returns
//!
//! # Modules
//!
//! - `bridge`: the mount/unmount state machine
//! - `feed`: subscription types plus the in-memory and SSE feeds
//! - `alert`, `notification`, `permission`, `session`: the seam types

pub mod alert;
pub mod bridge;
pub mod error;
pub mod feed;
pub mod notification;
pub mod permission;
pub mod session;

pub use bridge::{BridgeHandle, BridgeState, NotificationBridge};
pub use error::Error;
pub use notification::NotificationEvent;
pub use session::Session;
