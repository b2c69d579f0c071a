use domain::Id;
use serde::Deserialize;

/// Column realtime subscribers are allowed to filter on.
const FILTER_COLUMN: &str = "user_id";
const EQ_OPERATOR: &str = "eq";

/// Query string of a realtime subscription, e.g. `?filter=user_id=eq.<uuid>`.
#[derive(Debug, Deserialize)]
pub(crate) struct SubscribeParams {
    pub(crate) filter: Option<String>,
}

impl SubscribeParams {
    /// Returns the user the subscription is scoped to, normalized to the
    /// hyphenated lowercase form rows are routed with.
    pub(crate) fn user_id(&self) -> Result<String, String> {
        let filter = self
            .filter
            .as_deref()
            .ok_or_else(|| "missing filter, expected user_id=eq.<id>".to_string())?;

        let (column, predicate) = filter
            .split_once('=')
            .ok_or_else(|| format!("malformed filter: {filter}"))?;
        if column != FILTER_COLUMN {
            return Err(format!("unsupported filter column: {column}"));
        }

        let (operator, value) = predicate
            .split_once('.')
            .ok_or_else(|| format!("malformed filter: {filter}"))?;
        if operator != EQ_OPERATOR {
            return Err(format!("unsupported filter operator: {operator}"));
        }

        Id::parse_str(value)
            .map(|id| id.to_string())
            .map_err(|e| format!("invalid user_id {value}: {e}"))
    }
}
