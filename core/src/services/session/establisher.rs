//! Session establishment port

use async_trait::async_trait;

use crate::domain::value_objects::{SessionGrant, SessionRequest};
use crate::errors::SessionError;

/// Opens a session once a challenge has been consumed
#[async_trait]
pub trait SessionEstablisher: Send + Sync {
    async fn establish_session(&self, request: SessionRequest) -> Result<SessionGrant, SessionError>;
}
