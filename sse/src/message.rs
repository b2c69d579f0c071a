use serde::Serialize;
use serde_json::Value;

/// Trait for getting the SSE event type name
pub trait EventType {
    fn event_type(&self) -> &'static str;
}

/// Row-level change pushed to realtime subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    #[serde(rename = "INSERT")]
    Insert { table: String, record: Value },
}

impl EventType for Event {
    fn event_type(&self) -> &'static str {
        match self {
            Event::Insert { .. } => "INSERT",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub event: Event,
    pub scope: MessageScope,
}

#[derive(Debug, Clone)]
pub enum MessageScope {
    /// Send to all connections filtered on this user
    User { user_id: String },
}
