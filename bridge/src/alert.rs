use crate::notification::NotificationEvent;
use log::*;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

pub const VIEW_ACTION_LABEL: &str = "View";

/// How long a surface should keep an alert on screen before dismissing it.
pub const DEFAULT_ALERT_DURATION: Duration = Duration::from_secs(4);

/// The single affordance attached to a notification alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertAction {
    label: String,
}

impl AlertAction {
    pub fn view() -> Self {
        Self {
            label: VIEW_ACTION_LABEL.to_string(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Only records the click. Notifications have no detail page to open yet.
    pub fn on_click(&self, alert_title: &str) {
        info!("{} clicked on notification {alert_title:?}", self.label);
    }
}

/// A transient message for an [`AlertSurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub description: String,
    pub action: AlertAction,
    pub duration: Duration,
}

impl Alert {
    pub fn for_event(event: &NotificationEvent) -> Self {
        Self {
            title: event.title_text().to_string(),
            description: event.body_text().to_string(),
            action: AlertAction::view(),
            duration: DEFAULT_ALERT_DURATION,
        }
    }

    pub fn click_action(&self) {
        self.action.on_click(&self.title);
    }
}

/// Anything that can display transient alerts.
pub trait AlertSurface: Send + Sync {
    fn show(&self, alert: Alert);
}

/// Surface that keeps every alert it was shown, in order.
#[derive(Debug, Default)]
pub struct AlertHistory {
    alerts: Mutex<Vec<Alert>>,
    shown: Notify,
}

impl AlertHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts
            .lock()
            .map(|alerts| alerts.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.alerts.lock().map(|alerts| alerts.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Waits until at least `count` alerts were shown. Returns `false` on timeout.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let shown = self.shown.notified();
            if self.len() >= count {
                return true;
            }
            if tokio::time::timeout_at(deadline, shown).await.is_err() {
                return self.len() >= count;
            }
        }
    }
}

impl AlertSurface for AlertHistory {
    fn show(&self, alert: Alert) {
        if let Ok(mut alerts) = self.alerts.lock() {
            alerts.push(alert);
        }
        self.shown.notify_waiters();
    }
}
