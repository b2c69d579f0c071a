use crate::error::Error;
use crate::Id;
use chrono::{DateTime, Utc};
use events::{DomainEvent, EventPublisher};
use log::*;
use serde::{Deserialize, Serialize};

/// Name of the table realtime subscribers filter on.
pub const TABLE: &str = "notifications";

/// Request to notify a user.
#[derive(Debug, Clone, Deserialize)]
pub struct NewNotification {
    pub user_id: Id,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// An inserted notification row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Id,
    pub user_id: Id,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Inserts a notification and announces it to realtime subscribers of its owner.
///
/// A blank title is rejected. The body may be empty.
pub async fn create(
    event_publisher: &EventPublisher,
    new_notification: NewNotification,
) -> Result<Notification, Error> {
    if new_notification.title.trim().is_empty() {
        warn!(
            "Rejecting notification for user {} with a blank title",
            new_notification.user_id
        );
        return Err(Error::invalid(None));
    }

    let notification = Notification {
        id: Id::new_v4(),
        user_id: new_notification.user_id,
        title: new_notification.title,
        body: new_notification.body,
        created_at: Utc::now(),
    };

    debug!("New notification inserted: {notification:?}");

    let record = serde_json::to_value(&notification)?;
    event_publisher
        .publish(DomainEvent::NotificationInserted {
            table: TABLE.to_string(),
            record,
            user_id: notification.user_id,
        })
        .await;

    Ok(notification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, EntityErrorKind, InternalErrorKind};
    use async_trait::async_trait;
    use events::EventHandler;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct CapturingHandler {
        events: Mutex<Vec<DomainEvent>>,
    }

    #[async_trait]
    impl EventHandler for CapturingHandler {
        async fn handle(&self, event: &DomainEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    #[tokio::test]
    async fn create_publishes_inserted_row_for_owner() {
        let handler = Arc::new(CapturingHandler::default());
        let publisher = EventPublisher::new().with_handler(handler.clone());
        let user_id = Id::new_v4();

        let notification = create(
            &publisher,
            NewNotification {
                user_id,
                title: "Invoice due".to_string(),
                body: "Client X".to_string(),
            },
        )
        .await
        .unwrap();

        let events = handler.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        let DomainEvent::NotificationInserted {
            table,
            record,
            user_id: owner,
        } = &events[0];
        assert_eq!(table, TABLE);
        assert_eq!(*owner, user_id);
        assert_eq!(record["title"], "Invoice due");
        assert_eq!(record["body"], "Client X");
        assert_eq!(record["id"], notification.id.to_string());
        assert_eq!(record["user_id"], user_id.to_string());
    }

    #[tokio::test]
    async fn create_rejects_blank_title_without_publishing() {
        let handler = Arc::new(CapturingHandler::default());
        let publisher = EventPublisher::new().with_handler(handler.clone());

        let result = create(
            &publisher,
            NewNotification {
                user_id: Id::new_v4(),
                title: "   ".to_string(),
                body: String::new(),
            },
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Invalid))
        );
        assert!(handler.events.lock().unwrap().is_empty());
    }

    #[test]
    fn new_notification_body_defaults_to_empty() {
        let parsed: NewNotification = serde_json::from_value(serde_json::json!({
            "user_id": Id::new_v4(),
            "title": "Stock low"
        }))
        .unwrap();

        assert_eq!(parsed.body, "");
    }
}
