//! # MailGate Core
//!
//! Domain layer for passwordless email authentication: challenge records,
//! the store interface, one-time code issuance and verification, challenge
//! flows, email templates and session issuance.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::entities::{ChallengeKey, OtpPurpose, OtpRecord, RecordVersion, StoredCode};
pub use domain::value_objects::{SessionGrant, SessionRequest, SessionScope};
pub use errors::{
    DeliveryError, DomainError, DomainResult, SessionError, StorageError, VerificationError,
};
pub use repositories::{InMemoryOtpStore, OtpStore};
pub use services::{
    ChallengeFlow, ChallengeFlows, CodeProtector, DeliveryChannel, EmailTemplate,
    IssuedChallenge, JwtSessionIssuer, Mailer, OtpConfig, OtpService, OtpSweeper,
    SessionClaims, SessionEstablisher, StorageMode,
};
