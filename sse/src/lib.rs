//! Server-Sent Events (SSE) infrastructure for the realtime notifications feed.
//!
//! The dashboard subscribes to row insertions on the `notifications` table. Each
//! subscriber names a `user_id` filter when it connects; the backend only ever
//! routes a row to connections registered under the row's owner.
//!
//! # Architecture
//!
//! - **Filter-indexed registry**: O(1) lookups for both connection management and
//!   user-scoped routing via separate DashMap indices.
//! - **Ephemeral messages**: if a user has no open connection the insertion is
//!   simply not delivered. Nothing is queued for later.
//! - **Type-safe events**: change events are a serde-tagged enum so the wire format
//!   is fixed in one place.
//!
//! # Message Flow
//!
//! 1. Client opens `GET /realtime/v1/notifications?filter=user_id=eq.<id>`
//! 2. The web layer registers the connection under `<id>`
//! 3. A notification row is inserted and a `DomainEvent::NotificationInserted`
//!    is published
//! 4. [`domain_event_handler::SseDomainEventHandler`] turns it into an `INSERT`
//!    message scoped to the row's owner
//! 5. [`Manager`] serializes the message and hands it to every matching connection
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry with dual-index architecture and type-safe ConnectionId
//! - `manager`: High-level message routing (delegates to ConnectionRegistry)
//! - `message`: Change events and delivery scope
//! - `domain_event_handler`: Bridges `events` to the manager

pub mod connection;
pub mod domain_event_handler;
pub mod manager;
pub mod message;

pub use manager::Manager;
