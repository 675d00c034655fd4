use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use mg_core::{IssuedChallenge, SessionGrant, SessionScope};
use mg_shared::email::is_valid_email;

/// Body of `POST /email-otp/send-verification-otp`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendOtpRequest {
    #[validate(custom = "validate_email_address")]
    pub email: String,
    /// `sign-in`, `email-verification` or `forget-password`
    #[serde(rename = "type")]
    pub otp_type: String,
}

/// Body of `POST /sign-in/email-otp` and `POST /email-otp/verify-email`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OtpSubmission {
    #[validate(custom = "validate_email_address")]
    pub email: String,
    #[validate(length(min = 1, max = 32, message = "Code is required"))]
    pub otp: String,
}

/// Body of `POST /email-otp/check-verification-otp`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CheckOtpRequest {
    #[validate(custom = "validate_email_address")]
    pub email: String,
    #[serde(rename = "type")]
    pub otp_type: String,
    #[validate(length(min = 1, max = 32, message = "Code is required"))]
    pub otp: String,
}

/// Same rule the core applies before issuing or verifying
fn validate_email_address(email: &str) -> Result<(), ValidationError> {
    if is_valid_email(email) {
        return Ok(());
    }
    let mut error = ValidationError::new("email");
    error.message = Some("Invalid email address".into());
    Err(error)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendOtpResponse {
    pub sent: bool,
    pub expires_at: DateTime<Utc>,
    /// Seconds the code stays valid
    pub expires_in: i64,
}

impl From<&IssuedChallenge> for SendOtpResponse {
    fn from(issued: &IssuedChallenge) -> Self {
        Self {
            sent: true,
            expires_at: issued.record.expires_at,
            expires_in: (issued.record.expires_at - issued.record.issued_at).num_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub email: String,
    pub email_verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub scope: SessionScope,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Session returned by every successful verification and by `get-session`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub expires_in: i64,
    pub session: SessionInfo,
    pub user: SessionUser,
}

impl From<SessionGrant> for SessionResponse {
    fn from(grant: SessionGrant) -> Self {
        let expires_in = grant.expires_in();
        Self {
            token: grant.token,
            expires_in,
            session: SessionInfo {
                id: grant.session_id,
                scope: grant.scope,
                issued_at: grant.issued_at,
                expires_at: grant.expires_at,
            },
            user: SessionUser {
                email: grant.identifier,
                email_verified: grant.email_verified,
            },
        }
    }
}
