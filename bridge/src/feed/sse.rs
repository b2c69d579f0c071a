use super::{FeedSpec, RealtimeFeed, Subscription, SubscriptionSink};
use crate::error::{Error, SubscribeErrorKind};
use crate::notification::NotificationEvent;
use async_trait::async_trait;
use eventsource_client::{self as es, Client};
use futures_util::stream::{Stream, StreamExt};
use log::*;
use serde::Deserialize;
use serde_json::Value;
use std::ops::ControlFlow;

/// Body of a realtime change event, `{"type": "INSERT", "data": {...}}`.
#[derive(Debug, Deserialize)]
struct ChangeMessage {
    data: ChangeData,
}

#[derive(Debug, Deserialize)]
struct ChangeData {
    table: String,
    record: Value,
}

/// Realtime feed served by the dashboard backend over Server-Sent Events.
///
/// The transport is not reconnected: if the stream fails or the server closes
/// it, the subscription simply ends.
#[derive(Debug, Clone)]
pub struct SseFeed {
    base_url: String,
}

impl SseFeed {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn subscription_url(&self, spec: &FeedSpec) -> String {
        format!(
            "{}/realtime/v1/{}?filter={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&spec.table),
            urlencoding::encode(&spec.filter.to_string())
        )
    }
}

#[async_trait]
impl RealtimeFeed for SseFeed {
    /// Resolves once the server has answered with the first frame of the
    /// stream. A refused connection or an error status is returned as
    /// `Unavailable`.
    async fn subscribe(&self, spec: FeedSpec) -> Result<Subscription, Error> {
        let url = self.subscription_url(&spec);

        let client = es::ClientBuilder::for_url(&url)
            .map_err(|e| {
                Error::subscribe(SubscribeErrorKind::InvalidEndpoint(format!("{url}: {e}")))
            })?
            .reconnect(es::ReconnectOptions::reconnect(false).build())
            .build();

        debug!("Opening realtime stream {url}");

        let mut stream = client.stream();
        let first = match stream.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => {
                return Err(Error::subscribe(SubscribeErrorKind::Unavailable)
                    .with_source(format!("{url}: {e:?}")));
            }
            None => {
                return Err(Error::subscribe(SubscribeErrorKind::Unavailable)
                    .with_source(format!("{url}: stream closed before it opened")));
            }
        };

        let (sink, subscription) = Subscription::open(spec);
        let pump = Pump {
            change: subscription.spec().change.as_str(),
            table: subscription.spec().table.clone(),
            label: subscription.spec().filter.to_string(),
            sink,
        };

        tokio::spawn(pump.run(first, stream));

        Ok(subscription)
    }
}

/// Forwards change events from an open stream to a subscription.
struct Pump {
    change: &'static str,
    table: String,
    label: String,
    sink: SubscriptionSink,
}

impl Pump {
    async fn run<S>(self, first: es::SSE, mut stream: S)
    where
        S: Stream<Item = Result<es::SSE, es::Error>> + Unpin,
    {
        if self.forward(first).is_break() {
            return;
        }

        loop {
            let next = tokio::select! {
                _ = self.sink.closed() => {
                    debug!("Realtime subscription closed for {}", self.label);
                    break;
                }
                next = stream.next() => next,
            };

            match next {
                Some(Ok(frame)) => {
                    if self.forward(frame).is_break() {
                        break;
                    }
                }
                Some(Err(e)) => {
                    warn!("Realtime stream failed for {}: {:?}", self.label, e);
                    break;
                }
                None => {
                    debug!("Realtime stream ended for {}", self.label);
                    break;
                }
            }
        }
    }

    fn forward(&self, frame: es::SSE) -> ControlFlow<()> {
        match frame {
            es::SSE::Event(event) if event.event_type == self.change => {
                match serde_json::from_str::<ChangeMessage>(&event.data) {
                    Ok(message) if message.data.table == self.table => {
                        let notification = NotificationEvent::from_record(&message.data.record);
                        if !self.sink.deliver(notification) {
                            debug!("Realtime receiver dropped for {}", self.label);
                            return ControlFlow::Break(());
                        }
                    }
                    Ok(message) => {
                        trace!("Ignoring change on table {}", message.data.table);
                    }
                    Err(e) => {
                        warn!("Unreadable realtime event for {}: {}", self.label, e);
                    }
                }
            }
            es::SSE::Event(event) => {
                trace!("Ignoring realtime event type {}", event.event_type);
            }
            es::SSE::Comment(_) => {
                // Ignore comments (handshake and keep-alive)
            }
        }
        ControlFlow::Continue(())
    }
}
