//! Event system infrastructure for the MEI dashboard backend.
//!
//! Domain logic emits [`DomainEvent`]s through an [`EventPublisher`]; infrastructure
//! concerns such as the realtime feed register an [`EventHandler`] and react to them.
//!
//! This crate has no dependencies on other internal crates. Row data is carried as
//! serialized JSON values so handlers never need the domain types.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Identifier type shared by every row in the system.
pub type Id = Uuid;

/// Business-level changes, emitted after the change has been accepted.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A row was inserted into the `notifications` table.
    NotificationInserted {
        /// Table the row was inserted into, as subscribers name it in their feed filter.
        table: String,
        /// The complete inserted row (id, user_id, title, body, created_at).
        record: Value,
        /// Owner of the row. Realtime subscribers filtered on `user_id` receive it.
        user_id: Id,
    },
}

/// Trait for handling domain events.
/// Implementations perform side effects like pushing realtime updates or logging.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher in your application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    /// Publish an event to all registered handlers, one after another.
    pub async fn publish(&self, event: DomainEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
