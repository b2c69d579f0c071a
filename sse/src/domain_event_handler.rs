use crate::message::{Event as SseEvent, Message as SseMessage, MessageScope};
use crate::Manager;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;
use std::sync::Arc;

/// Converts domain events into realtime change messages.
///
/// The domain layer decides who owns a row; this handler only routes the
/// resulting `INSERT` message to the connections filtered on that owner.
pub struct SseDomainEventHandler {
    sse_manager: Arc<Manager>,
}

impl SseDomainEventHandler {
    pub fn new(sse_manager: Arc<Manager>) -> Self {
        Self { sse_manager }
    }
}

#[async_trait]
impl EventHandler for SseDomainEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        match event {
            DomainEvent::NotificationInserted {
                table,
                record,
                user_id,
            } => {
                debug!("Handling NotificationInserted event on {table} for user {user_id}");

                let delivered = self.sse_manager.send_message(SseMessage {
                    event: SseEvent::Insert {
                        table: table.clone(),
                        record: record.clone(),
                    },
                    scope: MessageScope::User {
                        user_id: user_id.to_string(),
                    },
                });

                debug!("Sent INSERT on {table} to {delivered} connection(s)");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use events::{EventPublisher, Id};
    use serde_json::json;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn published_insert_reaches_owner_connection_only() {
        let manager = Arc::new(Manager::new());
        let owner = Id::new_v4();
        let other = Id::new_v4();
        let (owner_tx, mut owner_rx) = mpsc::unbounded_channel();
        let (other_tx, mut other_rx) = mpsc::unbounded_channel();
        manager.register_connection(owner.to_string(), owner_tx);
        manager.register_connection(other.to_string(), other_tx);

        let publisher =
            EventPublisher::new().with_handler(Arc::new(SseDomainEventHandler::new(manager)));
        publisher
            .publish(DomainEvent::NotificationInserted {
                table: "notifications".to_string(),
                record: json!({ "title": "Invoice due", "body": "Client X" }),
                user_id: owner,
            })
            .await;

        assert!(owner_rx.try_recv().is_ok());
        assert!(other_rx.try_recv().is_err());
    }
}
