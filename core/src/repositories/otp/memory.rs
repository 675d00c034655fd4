//! Process-local challenge store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::{ChallengeKey, OtpRecord, RecordVersion};
use crate::errors::StorageError;

use super::r#trait::OtpStore;

/// In-memory store for single-instance deployments and tests.
///
/// Every conditional operation runs under the write lock, so the version check
/// and the update are one step.
#[derive(Clone, Default)]
pub struct InMemoryOtpStore {
    records: Arc<RwLock<HashMap<ChallengeKey, OtpRecord>>>,
}

impl InMemoryOtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, expired ones included
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl OtpStore for InMemoryOtpStore {
    async fn get(&self, key: &ChallengeKey) -> Result<Option<OtpRecord>, StorageError> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn replace(&self, record: &OtpRecord) -> Result<(), StorageError> {
        self.records
            .write()
            .await
            .insert(record.key(), record.clone());
        Ok(())
    }

    async fn decrement_attempts(
        &self,
        key: &ChallengeKey,
        version: &RecordVersion,
    ) -> Result<u32, StorageError> {
        let mut records = self.records.write().await;
        match records.get_mut(key) {
            Some(record) if record.matches_version(version) && record.attempts_remaining > 0 => {
                record.attempts_remaining -= 1;
                Ok(record.attempts_remaining)
            }
            _ => Err(StorageError::Conflict),
        }
    }

    async fn remove(&self, key: &ChallengeKey, version: &RecordVersion) -> Result<(), StorageError> {
        let mut records = self.records.write().await;
        let current = records
            .get(key)
            .is_some_and(|record| record.matches_version(version));
        if !current {
            return Err(StorageError::Conflict);
        }
        records.remove(key);
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StorageError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| !record.is_expired_at(now));
        Ok(before - records.len())
    }
}
