use crate::params::realtime::SubscribeParams;
use async_stream::stream;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use log::*;
use service::AppState;
use sse::connection::ConnectionId;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;

/// First frame of every realtime stream. It is sent once the connection is
/// registered, so a client that has read it will not miss later inserts.
pub(crate) const SUBSCRIBED_COMMENT: &str = "subscribed";

/// Unregisters the connection when the response stream is dropped, which is
/// what happens when the client goes away.
struct ConnectionGuard {
    manager: Arc<sse::Manager>,
    connection_id: ConnectionId,
    user_id: String,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        debug!(
            "Realtime subscription closed for user {}, cleaning up",
            self.user_id
        );
        self.manager.unregister_connection(&self.connection_id);
    }
}

/// Opens a long-lived realtime subscription to notification inserts for the
/// user named in the `filter` query parameter.
pub(crate) async fn notifications_feed(
    Query(params): Query<SubscribeParams>,
    State(app_state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    let user_id = params.user_id().map_err(|reason| {
        debug!("Rejecting realtime subscription: {reason}");
        (StatusCode::BAD_REQUEST, reason)
    })?;

    debug!("Establishing realtime subscription for user {user_id}");

    let (tx, mut rx) = mpsc::unbounded_channel();

    let connection_id = app_state
        .sse_manager
        .register_connection(user_id.clone(), tx);

    let guard = ConnectionGuard {
        manager: app_state.sse_manager.clone(),
        connection_id,
        user_id,
    };

    let stream = stream! {
        let _guard = guard;
        yield Ok::<_, Infallible>(Event::default().comment(SUBSCRIBED_COMMENT));
        while let Some(event) = rx.recv().await {
            yield event;
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
