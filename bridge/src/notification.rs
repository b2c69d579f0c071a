use serde_json::Value;

/// One inserted notification row, as the client sees it.
///
/// Only `title` and `body` are read. Rows are not validated: a missing field is
/// `None` and a non-string field keeps its JSON text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationEvent {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl NotificationEvent {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: Some(body.into()),
        }
    }

    pub fn from_record(record: &Value) -> Self {
        Self {
            title: text_field(record, "title"),
            body: text_field(record, "body"),
        }
    }

    pub fn title_text(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }
}

fn text_field(record: &Value, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
