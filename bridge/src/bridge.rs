use crate::alert::{Alert, AlertSurface};
use crate::error::Error;
use crate::feed::{FeedSpec, Filter, RealtimeFeed, Subscription};
use crate::permission::{PermissionCapability, PermissionState};
use crate::session::SessionProvider;
use log::*;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Table the bridge subscribes to unless told otherwise.
pub const NOTIFICATIONS_TABLE: &str = "notifications";

/// Column the subscription is filtered on.
pub const USER_ID_COLUMN: &str = "user_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Inactive,
    Subscribed,
}

/// Renders the current user's notification inserts as transient alerts.
///
/// The bridge itself is a reusable description; every [`mount`](Self::mount)
/// creates an independent instance with its own single subscription.
#[derive(Clone)]
pub struct NotificationBridge {
    feed: Arc<dyn RealtimeFeed>,
    surface: Arc<dyn AlertSurface>,
    permission: Option<Arc<dyn PermissionCapability>>,
    table: String,
}

impl NotificationBridge {
    pub fn new(feed: Arc<dyn RealtimeFeed>, surface: Arc<dyn AlertSurface>) -> Self {
        Self {
            feed,
            surface,
            permission: None,
            table: NOTIFICATIONS_TABLE.to_string(),
        }
    }

    pub fn with_permission(mut self, permission: Arc<dyn PermissionCapability>) -> Self {
        self.permission = Some(permission);
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Starts a bridge instance for the session `sessions` resolves to.
    ///
    /// Returns immediately; setup continues in a spawned task. Must be called from
    /// within a tokio runtime.
    pub fn mount<S>(&self, sessions: S) -> BridgeHandle
    where
        S: SessionProvider + 'static,
    {
        self.check_permission();

        let token = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(BridgeState::Inactive);
        let (settled_tx, settled_rx) = watch::channel(false);

        let instance = Instance {
            feed: self.feed.clone(),
            surface: self.surface.clone(),
            table: self.table.clone(),
            token: token.clone(),
            state: state_tx,
            settled: Settled(settled_tx),
        };
        let task = tokio::spawn(instance.run(sessions));

        BridgeHandle {
            state: state_rx,
            settled: settled_rx,
            task,
            _unmount_on_drop: token.drop_guard(),
        }
    }

    fn check_permission(&self) {
        if let Some(permission) = &self.permission {
            match permission.state() {
                PermissionState::Undetermined => {
                    // Requesting belongs to the settings screen
                    debug!("Notification permission undetermined, not requesting it here");
                }
                state => trace!("Notification permission is {state:?}"),
            }
        }
    }
}

/// One mounted bridge. Dropping the handle unmounts without waiting.
pub struct BridgeHandle {
    state: watch::Receiver<BridgeState>,
    settled: watch::Receiver<bool>,
    task: JoinHandle<Result<(), Error>>,
    _unmount_on_drop: DropGuard,
}

impl BridgeHandle {
    pub fn state(&self) -> BridgeState {
        *self.state.borrow()
    }

    /// Waits until setup has finished, either subscribed or given up, and
    /// returns the resulting state.
    pub async fn settled(&mut self) -> BridgeState {
        // An Err means the task is gone, which also settles it
        let _ = self.settled.wait_for(|settled| *settled).await;
        self.state()
    }

    /// Releases the subscription and waits for the instance to stop.
    ///
    /// No alert is shown after this returns. A failure to open the subscription
    /// is reported here.
    pub async fn unmount(self) -> Result<(), Error> {
        let BridgeHandle {
            task,
            _unmount_on_drop,
            ..
        } = self;
        drop(_unmount_on_drop);
        task.await?
    }
}

/// Marks setup as finished when dropped, whatever path the task took.
struct Settled(watch::Sender<bool>);

impl Settled {
    fn mark(&self) {
        self.0.send_replace(true);
    }
}

impl Drop for Settled {
    fn drop(&mut self) {
        self.mark();
    }
}

struct Instance {
    feed: Arc<dyn RealtimeFeed>,
    surface: Arc<dyn AlertSurface>,
    table: String,
    token: CancellationToken,
    state: watch::Sender<BridgeState>,
    settled: Settled,
}

impl Instance {
    async fn run<S: SessionProvider>(self, sessions: S) -> Result<(), Error> {
        let resolved = tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                debug!("Unmounted before the session resolved");
                return Ok(());
            }
            resolved = sessions.current_session() => resolved,
        };

        let session = match resolved {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!("No active session, notifications not subscribed");
                return Ok(());
            }
            Err(e) => {
                debug!("{e}, notifications not subscribed");
                return Ok(());
            }
        };

        let spec = FeedSpec::inserts(
            self.table.clone(),
            Filter::eq(USER_ID_COLUMN, session.user_id()),
        );

        let mut subscription = tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                debug!("Unmounted before subscribing for user {}", session.user_id());
                return Ok(());
            }
            subscribed = self.feed.subscribe(spec) => match subscribed {
                Ok(subscription) => subscription,
                Err(e) => {
                    error!("Failed to subscribe to {} for user {}: {e}", self.table, session.user_id());
                    return Err(e);
                }
            },
        };

        // The subscribe call may have completed in the same poll as the unmount
        if self.token.is_cancelled() {
            subscription.close();
            return Ok(());
        }

        self.state.send_replace(BridgeState::Subscribed);
        self.settled.mark();
        info!(
            "Subscribed to {} inserts where {}",
            subscription.spec().table,
            subscription.spec().filter
        );

        self.deliver(&mut subscription).await;

        subscription.close();
        self.state.send_replace(BridgeState::Inactive);
        info!("Notification subscription released");
        Ok(())
    }

    async fn deliver(&self, subscription: &mut Subscription) {
        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                event = subscription.recv() => match event {
                    Some(event) => {
                        trace!("Showing alert for notification {:?}", event.title);
                        self.surface.show(Alert::for_event(&event));
                    }
                    None => {
                        warn!("Notification feed ended the subscription");
                        break;
                    }
                },
            }
        }
    }
}
