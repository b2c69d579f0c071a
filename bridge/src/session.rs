use crate::error::Error;
use async_trait::async_trait;

/// The authenticated user a bridge is mounted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// Resolves the current session when a bridge mounts.
///
/// `Ok(None)` means nobody is signed in. The bridge treats an `Err` the same way.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_session(&self) -> Result<Option<Session>, Error>;
}

#[async_trait]
impl SessionProvider for Session {
    async fn current_session(&self) -> Result<Option<Session>, Error> {
        Ok(Some(self.clone()))
    }
}

#[async_trait]
impl SessionProvider for Option<Session> {
    async fn current_session(&self) -> Result<Option<Session>, Error> {
        Ok(self.clone())
    }
}
