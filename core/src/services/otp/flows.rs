//! Challenge flows: per-purpose email copy and session shape

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::entities::{OtpPurpose, OtpRecord};
use crate::domain::value_objects::{SessionRequest, SessionScope};
use crate::services::email::EmailTemplate;

/// Strategy for one kind of challenge
pub trait ChallengeFlow: Send + Sync {
    fn purpose(&self) -> OtpPurpose;

    /// Email carrying the plaintext code
    fn email(&self, code: &str, expires_in_minutes: i64) -> EmailTemplate {
        EmailTemplate::OtpCode {
            code: code.to_string(),
            purpose: self.purpose(),
            expires_in_minutes,
        }
    }

    /// Session to open once `record` has been consumed
    fn session_request(&self, record: &OtpRecord) -> SessionRequest;
}

/// Passwordless sign-in
#[derive(Debug, Default)]
pub struct SignInFlow;

impl ChallengeFlow for SignInFlow {
    fn purpose(&self) -> OtpPurpose {
        OtpPurpose::SignIn
    }

    fn session_request(&self, record: &OtpRecord) -> SessionRequest {
        // Receiving the code proves control of the address
        SessionRequest {
            identifier: record.identifier.clone(),
            purpose: record.purpose,
            scope: SessionScope::Full,
            email_verified: true,
            challenge_id: record.id,
        }
    }
}

/// Confirms an address for an existing account
#[derive(Debug, Default)]
pub struct EmailVerificationFlow;

impl ChallengeFlow for EmailVerificationFlow {
    fn purpose(&self) -> OtpPurpose {
        OtpPurpose::EmailVerification
    }

    fn session_request(&self, record: &OtpRecord) -> SessionRequest {
        SessionRequest {
            identifier: record.identifier.clone(),
            purpose: record.purpose,
            scope: SessionScope::Full,
            email_verified: true,
            challenge_id: record.id,
        }
    }
}

/// Grants a short-lived session that may only set a new password
#[derive(Debug, Default)]
pub struct PasswordResetFlow;

impl ChallengeFlow for PasswordResetFlow {
    fn purpose(&self) -> OtpPurpose {
        OtpPurpose::ForgetPassword
    }

    fn session_request(&self, record: &OtpRecord) -> SessionRequest {
        SessionRequest {
            identifier: record.identifier.clone(),
            purpose: record.purpose,
            scope: SessionScope::PasswordReset,
            email_verified: false,
            challenge_id: record.id,
        }
    }
}

/// Registry of the flows enabled at startup
#[derive(Clone, Default)]
pub struct ChallengeFlows {
    flows: HashMap<OtpPurpose, Arc<dyn ChallengeFlow>>,
}

impl ChallengeFlows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sign-in, email verification and password reset
    pub fn standard() -> Self {
        Self::new()
            .with(Arc::new(SignInFlow))
            .with(Arc::new(EmailVerificationFlow))
            .with(Arc::new(PasswordResetFlow))
    }

    /// Register `flow`, replacing any flow for the same purpose
    pub fn with(mut self, flow: Arc<dyn ChallengeFlow>) -> Self {
        self.register(flow);
        self
    }

    pub fn register(&mut self, flow: Arc<dyn ChallengeFlow>) {
        self.flows.insert(flow.purpose(), flow);
    }

    pub fn get(&self, purpose: OtpPurpose) -> Option<&Arc<dyn ChallengeFlow>> {
        self.flows.get(&purpose)
    }

    pub fn is_registered(&self, purpose: OtpPurpose) -> bool {
        self.flows.contains_key(&purpose)
    }

    pub fn purposes(&self) -> Vec<OtpPurpose> {
        OtpPurpose::ALL
            .into_iter()
            .filter(|p| self.is_registered(*p))
            .collect()
    }
}
