use super::{FeedSpec, RealtimeFeed, Subscription, SubscriptionSink};
use crate::error::Error;
use crate::notification::NotificationEvent;
use async_trait::async_trait;
use dashmap::DashMap;
use log::*;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// In-process realtime feed.
///
/// Rows handed to [`insert`](MemoryFeed::insert) are delivered synchronously to
/// every open subscription whose table and filter match, so the delivery order
/// is the insertion order.
#[derive(Clone, Default)]
pub struct MemoryFeed {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    subscriptions: DashMap<u64, (FeedSpec, SubscriptionSink)>,
    next_id: AtomicU64,
    opened: AtomicUsize,
}

impl MemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row into `table` and returns how many subscriptions received it.
    pub fn insert(&self, table: &str, record: Value) -> usize {
        self.prune();

        let mut delivered = 0;
        for entry in self.inner.subscriptions.iter() {
            let (spec, sink) = entry.value();
            if spec.table == table
                && spec.filter.matches(&record)
                && sink.deliver(NotificationEvent::from_record(&record))
            {
                delivered += 1;
            }
        }

        trace!("Insert on {table} delivered to {delivered} subscription(s)");
        delivered
    }

    /// Subscriptions that are still open.
    pub fn active_subscriptions(&self) -> usize {
        self.inner
            .subscriptions
            .iter()
            .filter(|entry| !entry.value().1.is_closed())
            .count()
    }

    /// Specs of the subscriptions that are still open.
    pub fn active_specs(&self) -> Vec<FeedSpec> {
        self.inner
            .subscriptions
            .iter()
            .filter(|entry| !entry.value().1.is_closed())
            .map(|entry| entry.value().0.clone())
            .collect()
    }

    /// Subscriptions ever opened on this feed, closed ones included.
    pub fn opened_subscriptions(&self) -> usize {
        self.inner.opened.load(Ordering::SeqCst)
    }

    fn prune(&self) {
        self.inner
            .subscriptions
            .retain(|_, (_, sink)| !sink.is_closed());
    }
}

#[async_trait]
impl RealtimeFeed for MemoryFeed {
    async fn subscribe(&self, spec: FeedSpec) -> Result<Subscription, Error> {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let (sink, subscription) = Subscription::open(spec.clone());

        debug!(
            "Opened in-memory subscription {id} to {} {} where {}",
            spec.table,
            spec.change.as_str(),
            spec.filter
        );

        self.inner.subscriptions.insert(id, (spec, sink));
        self.inner.opened.fetch_add(1, Ordering::SeqCst);

        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::Filter;
    use serde_json::json;

    fn spec_for(user_id: &str) -> FeedSpec {
        FeedSpec::inserts("notifications", Filter::eq("user_id", user_id))
    }

    #[tokio::test]
    async fn insert_reaches_only_matching_subscriptions() {
        let feed = MemoryFeed::new();
        let mut u1 = feed.subscribe(spec_for("u1")).await.unwrap();
        let _u2 = feed.subscribe(spec_for("u2")).await.unwrap();

        let delivered = feed.insert(
            "notifications",
            json!({ "user_id": "u1", "title": "Invoice due", "body": "Client X" }),
        );

        assert_eq!(delivered, 1);
        assert_eq!(
            u1.recv().await,
            Some(NotificationEvent::new("Invoice due", "Client X"))
        );
    }

    #[tokio::test]
    async fn insert_on_other_table_is_ignored() {
        let feed = MemoryFeed::new();
        let _sub = feed.subscribe(spec_for("u1")).await.unwrap();

        assert_eq!(feed.insert("invoices", json!({ "user_id": "u1" })), 0);
    }

    #[tokio::test]
    async fn closed_subscriptions_are_pruned() {
        let feed = MemoryFeed::new();
        let mut sub = feed.subscribe(spec_for("u1")).await.unwrap();
        assert_eq!(feed.active_subscriptions(), 1);
        assert_eq!(feed.active_specs(), vec![spec_for("u1")]);

        sub.close();

        assert_eq!(feed.active_subscriptions(), 0);
        assert_eq!(feed.insert("notifications", json!({ "user_id": "u1" })), 0);
        assert_eq!(feed.opened_subscriptions(), 1);
    }
}
