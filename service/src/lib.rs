use config::Config;
use events::EventPublisher;
use log::info;
use sse::domain_event_handler::SseDomainEventHandler;
use std::sync::Arc;

pub mod config;
pub mod logging;

// Service-level state containing only infrastructure concerns
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sse_manager: Arc<sse::Manager>,
    pub event_publisher: Arc<EventPublisher>,
}

impl AppState {
    /// Builds the state with a fresh realtime manager wired to the event publisher,
    /// so every published domain event is routed to realtime subscribers.
    pub fn new(app_config: Config) -> Self {
        let sse_manager = Arc::new(sse::Manager::new());
        let event_publisher = EventPublisher::new()
            .with_handler(Arc::new(SseDomainEventHandler::new(sse_manager.clone())));

        info!(
            "Realtime feed ready with {} event handler(s)",
            event_publisher.handler_count()
        );

        Self {
            config: app_config,
            sse_manager,
            event_publisher: Arc::new(event_publisher),
        }
    }
}
