//! Unit tests for domain error types

use crate::errors::{DeliveryError, DomainError, StorageError, VerificationError};

#[test]
fn test_verification_error_messages() {
    let error = VerificationError::CodeMismatch {
        attempts_remaining: 2,
    };
    assert_eq!(error.to_string(), "Code mismatch (2 attempts remaining)");
    assert_eq!(VerificationError::Expired.to_string(), "Challenge expired");
}

#[test]
fn test_domain_error_bridges() {
    let error: DomainError = VerificationError::AttemptsExhausted.into();
    assert!(matches!(
        error,
        DomainError::Verification(VerificationError::AttemptsExhausted)
    ));

    let error: DomainError = DeliveryError::Transport {
        message: "timeout".to_string(),
    }
    .into();
    assert!(matches!(error, DomainError::Delivery(_)));
    assert!(error.to_string().contains("timeout"));

    let error: DomainError = StorageError::unavailable("connection refused").into();
    assert!(matches!(error, DomainError::Storage(StorageError::Unavailable { .. })));
}

#[test]
fn test_delivery_and_storage_are_distinct() {
    let delivery: DomainError = DeliveryError::Rejected {
        status: 422,
        message: "invalid from".to_string(),
    }
    .into();
    let storage: DomainError = StorageError::corrupted("bad json").into();

    assert!(!matches!(delivery, DomainError::Storage(_)));
    assert!(!matches!(storage, DomainError::Delivery(_)));
}

#[test]
fn test_only_conflict_is_transient() {
    assert!(StorageError::Conflict.is_transient());
    assert!(!StorageError::unavailable("down").is_transient());
    assert!(!StorageError::corrupted("bad").is_transient());
}
