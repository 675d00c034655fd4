//! Challenge store trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{ChallengeKey, OtpRecord, RecordVersion};
use crate::errors::StorageError;

/// Persistence for one-time code challenges, keyed by `(identifier, purpose)`
///
/// Implementations must make `replace`, `decrement_attempts` and `remove`
/// atomic. The two conditional operations compare the stored record against
/// the caller's [`RecordVersion`] and fail with [`StorageError::Conflict`]
/// when it changed or disappeared. No read-then-write updates.
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Read the record under `key`, if any. Expired records are returned as-is.
    async fn get(&self, key: &ChallengeKey) -> Result<Option<OtpRecord>, StorageError>;

    /// Write `record` under its key, replacing any previous record in one step
    async fn replace(&self, record: &OtpRecord) -> Result<(), StorageError>;

    /// Decrement `attempts_remaining` by one if the stored record still has
    /// `version`. Returns the new count.
    async fn decrement_attempts(
        &self,
        key: &ChallengeKey,
        version: &RecordVersion,
    ) -> Result<u32, StorageError>;

    /// Delete the record if it still has `version`
    async fn remove(&self, key: &ChallengeKey, version: &RecordVersion) -> Result<(), StorageError>;

    /// Delete every record expired at `now`. Returns how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StorageError>;

    /// Check that the backend is reachable
    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
