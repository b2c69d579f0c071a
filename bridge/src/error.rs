//! Error types for the `bridge` crate.
//!
//! Follows the same pattern as `domain::error`: a root `Error` struct holding an
//! error kind and the optional underlying error.

use std::error::Error as StdError;
use std::fmt;

#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in the bridge.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// The current session could not be resolved.
    Session(String),
    Subscribe(SubscribeErrorKind),
    /// The mount task panicked or was aborted.
    Task,
}

/// Errors from opening a realtime subscription.
#[derive(Debug, PartialEq)]
pub enum SubscribeErrorKind {
    InvalidEndpoint(String),
    Unavailable,
    Other(String),
}

impl Error {
    pub fn session(reason: impl Into<String>) -> Self {
        Error {
            source: None,
            error_kind: ErrorKind::Session(reason.into()),
        }
    }

    pub fn subscribe(kind: SubscribeErrorKind) -> Self {
        Error {
            source: None,
            error_kind: ErrorKind::Subscribe(kind),
        }
    }

    pub fn with_source(mut self, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::Session(reason) => write!(f, "Session could not be resolved: {reason}"),
            ErrorKind::Subscribe(kind) => match &self.source {
                Some(source) => write!(f, "Subscription failed: {kind:?}: {source}"),
                None => write!(f, "Subscription failed: {kind:?}"),
            },
            ErrorKind::Task => write!(f, "Bridge task failed"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Task,
        }
    }
}
