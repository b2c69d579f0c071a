//! Realtime feed seam: what a subscription asks for and how events flow back.
//!
//! A feed implementation calls [`Subscription::open`] and keeps the returned
//! [`SubscriptionSink`]; the caller gets the [`Subscription`]. Closing or dropping
//! the subscription is visible to the sink through [`SubscriptionSink::closed`].

use crate::error::Error;
use crate::notification::NotificationEvent;
use async_trait::async_trait;
use futures_util::Stream;
use serde_json::Value;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

pub mod memory;
pub mod sse;

pub use memory::MemoryFeed;
pub use self::sse::SseFeed;

/// Row change a subscription listens for. Only inserts are consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Insert => "INSERT",
        }
    }
}

/// Server-side equality filter, `column = value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    column: String,
    value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether a row satisfies the filter. Scalars other than strings are
    /// compared by their JSON text.
    pub fn matches(&self, record: &Value) -> bool {
        match record.get(&self.column) {
            Some(Value::String(text)) => *text == self.value,
            Some(Value::Null) | None => false,
            Some(Value::Array(_)) | Some(Value::Object(_)) => false,
            Some(other) => other.to_string() == self.value,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}=eq.{}", self.column, self.value)
    }
}

/// What a subscriber wants from the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSpec {
    pub table: String,
    pub change: ChangeKind,
    pub filter: Filter,
}

impl FeedSpec {
    pub fn inserts(table: impl Into<String>, filter: Filter) -> Self {
        Self {
            table: table.into(),
            change: ChangeKind::Insert,
            filter,
        }
    }
}

/// A realtime publish/subscribe backend.
#[async_trait]
pub trait RealtimeFeed: Send + Sync {
    async fn subscribe(&self, spec: FeedSpec) -> Result<Subscription, Error>;
}

/// Live, explicitly closable handle on one filtered stream of events.
///
/// Events arrive in feed order. After [`close`](Subscription::close) nothing more
/// is yielded, including events that were already buffered.
#[derive(Debug)]
pub struct Subscription {
    spec: FeedSpec,
    events: UnboundedReceiver<NotificationEvent>,
    token: CancellationToken,
}

/// Feed-side end of a [`Subscription`].
#[derive(Debug, Clone)]
pub struct SubscriptionSink {
    sender: UnboundedSender<NotificationEvent>,
    token: CancellationToken,
}

impl Subscription {
    pub fn open(spec: FeedSpec) -> (SubscriptionSink, Subscription) {
        let (sender, events) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        (
            SubscriptionSink {
                sender,
                token: token.clone(),
            },
            Subscription {
                spec,
                events,
                token,
            },
        )
    }

    pub fn spec(&self) -> &FeedSpec {
        &self.spec
    }

    /// Next event, or `None` once the subscription is closed or the feed ended it.
    pub async fn recv(&mut self) -> Option<NotificationEvent> {
        if self.token.is_cancelled() {
            return None;
        }
        self.events.recv().await
    }

    pub fn close(&mut self) {
        self.token.cancel();
        self.events.close();
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Stream for Subscription {
    type Item = NotificationEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.token.is_cancelled() {
            return Poll::Ready(None);
        }
        self.events.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl SubscriptionSink {
    /// Hands an event to the subscriber. Returns `false` once it has gone away.
    pub fn deliver(&self, event: NotificationEvent) -> bool {
        !self.token.is_cancelled() && self.sender.send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled() || self.sender.is_closed()
    }

    /// Resolves when the subscriber closes or drops the subscription.
    pub async fn closed(&self) {
        self.token.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use serde_json::json;

    fn spec() -> FeedSpec {
        FeedSpec::inserts("notifications", Filter::eq("user_id", "u1"))
    }

    #[test]
    fn filter_renders_as_equality_predicate() {
        assert_eq!(Filter::eq("user_id", "u1").to_string(), "user_id=eq.u1");
    }

    #[test]
    fn filter_matches_string_and_scalar_columns() {
        let filter = Filter::eq("user_id", "42");

        assert!(filter.matches(&json!({ "user_id": "42" })));
        assert!(filter.matches(&json!({ "user_id": 42 })));
        assert!(!filter.matches(&json!({ "user_id": "43" })));
        assert!(!filter.matches(&json!({ "user_id": null })));
        assert!(!filter.matches(&json!({ "title": "no owner" })));
    }

    #[tokio::test]
    async fn events_flow_in_order_until_closed() {
        let (sink, mut subscription) = Subscription::open(spec());

        assert!(sink.deliver(NotificationEvent::new("T1", "B1")));
        assert!(sink.deliver(NotificationEvent::new("T2", "B2")));

        assert_eq!(subscription.recv().await.unwrap().title_text(), "T1");
        assert_eq!(subscription.next().await.unwrap().title_text(), "T2");

        subscription.close();

        assert!(subscription.is_closed());
        assert!(sink.is_closed());
        assert!(!sink.deliver(NotificationEvent::new("T3", "B3")));
        assert_eq!(subscription.recv().await, None);
    }

    #[tokio::test]
    async fn close_discards_buffered_events() {
        let (sink, mut subscription) = Subscription::open(spec());
        sink.deliver(NotificationEvent::new("late", ""));

        subscription.close();

        assert_eq!(subscription.next().await, None);
    }

    #[tokio::test]
    async fn dropping_subscription_wakes_the_sink() {
        let (sink, subscription) = Subscription::open(spec());

        drop(subscription);

        tokio::time::timeout(std::time::Duration::from_secs(1), sink.closed())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn subscription_ends_when_feed_drops_sink() {
        let (sink, mut subscription) = Subscription::open(spec());

        drop(sink);

        assert_eq!(subscription.recv().await, None);
        assert_eq!(subscription.spec(), &spec());
    }
}
