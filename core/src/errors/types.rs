//! Error types for one-time code verification, delivery, storage and sessions
//!
//! Messages here are for logs. The presentation layer maps each variant to
//! its own client-facing code and wording.

use thiserror::Error;

/// Why a submitted code was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("No active challenge")]
    NoActiveChallenge,

    #[error("Challenge expired")]
    Expired,

    #[error("Attempts exhausted")]
    AttemptsExhausted,

    #[error("Code mismatch ({attempts_remaining} attempts remaining)")]
    CodeMismatch { attempts_remaining: u32 },
}

/// Failure to hand a message to the email provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Provider rejected message (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Delivery misconfigured: {message}")]
    Configuration { message: String },
}

/// Failure of the challenge store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The record changed between read and conditional write
    #[error("Concurrent modification")]
    Conflict,

    #[error("Storage unavailable: {message}")]
    Unavailable { message: String },

    #[error("Corrupted record: {message}")]
    Corrupted { message: String },
}

impl StorageError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        StorageError::Unavailable {
            message: message.into(),
        }
    }

    pub fn corrupted(message: impl Into<String>) -> Self {
        StorageError::Corrupted {
            message: message.into(),
        }
    }

    /// Conflicts are retried locally; everything else surfaces
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Conflict)
    }
}

/// Session issuance and lookup errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session expired")]
    Expired,

    #[error("Invalid session token")]
    InvalidToken,

    #[error("Session issuance failed: {message}")]
    Issuance { message: String },
}
