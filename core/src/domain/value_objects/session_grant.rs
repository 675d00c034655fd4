//! Session value objects exchanged with the session component.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::OtpPurpose;

/// What a session may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionScope {
    /// Regular signed-in session
    Full,
    /// Only allowed to set a new password
    PasswordReset,
}

impl SessionScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionScope::Full => "full",
            SessionScope::PasswordReset => "password_reset",
        }
    }
}

/// Request to open a session for an identity that just proved control of its
/// email address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub identifier: String,
    pub purpose: OtpPurpose,
    pub scope: SessionScope,
    pub email_verified: bool,
    /// Id of the consumed challenge
    pub challenge_id: Uuid,
}

/// Session returned after a successful verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionGrant {
    /// Bearer token
    pub token: String,
    pub session_id: Uuid,
    pub identifier: String,
    pub scope: SessionScope,
    pub email_verified: bool,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionGrant {
    /// Lifetime in seconds from issuance
    pub fn expires_in(&self) -> i64 {
        (self.expires_at - self.issued_at).num_seconds()
    }
}
