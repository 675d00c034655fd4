//! Redis-backed challenge store
//!
//! Each challenge is a hash under `{prefix}:otp:{purpose}:{identifier}`:
//!
//! | field           | value                                   |
//! |-----------------|-----------------------------------------|
//! | `id`            | record id, part of the version          |
//! | `attempts`      | remaining attempts, part of the version |
//! | `expires_at_ms` | expiry as unix milliseconds             |
//! | `record`        | the full record as JSON                 |
//!
//! `attempts` is authoritative over the copy inside `record`. All conditional
//! updates run as Lua scripts so the version check and the write are atomic.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use redis::Script;
use std::collections::HashMap;
use tracing::{debug, warn};

use mg_core::domain::entities::{ChallengeKey, OtpRecord, RecordVersion};
use mg_core::errors::StorageError;
use mg_core::repositories::OtpStore;

use super::RedisClient;
use crate::InfrastructureError;

/// How long a record is kept after it expires, so late submissions still see
/// `Expired` rather than no challenge at all
pub const DEFAULT_EXPIRED_RETENTION_SECONDS: i64 = 600;

static REPLACE_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
        redis.call('DEL', KEYS[1])
        redis.call('HSET', KEYS[1], 'id', ARGV[1], 'attempts', ARGV[2], 'expires_at_ms', ARGV[3], 'record', ARGV[4])
        redis.call('PEXPIRE', KEYS[1], ARGV[5])
        return 1
        ",
    )
});

static DECREMENT_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
        local current = redis.call('HMGET', KEYS[1], 'id', 'attempts')
        if not current[1] or current[1] ~= ARGV[1] then
            return -1
        end
        local attempts = tonumber(current[2])
        if attempts == nil or attempts ~= tonumber(ARGV[2]) or attempts <= 0 then
            return -1
        end
        return redis.call('HINCRBY', KEYS[1], 'attempts', -1)
        ",
    )
});

static REMOVE_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
        local current = redis.call('HMGET', KEYS[1], 'id', 'attempts')
        if not current[1] or current[1] ~= ARGV[1] or tonumber(current[2]) ~= tonumber(ARGV[2]) then
            return 0
        end
        return redis.call('DEL', KEYS[1])
        ",
    )
});

static PURGE_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
        local expires = redis.call('HGET', KEYS[1], 'expires_at_ms')
        if expires and tonumber(expires) <= tonumber(ARGV[1]) then
            return redis.call('DEL', KEYS[1])
        end
        return 0
        ",
    )
});

/// Challenge store on Redis
pub struct RedisOtpStore {
    client: RedisClient,
    expired_retention: Duration,
}

impl RedisOtpStore {
    pub fn new(client: RedisClient) -> Self {
        Self {
            client,
            expired_retention: Duration::seconds(DEFAULT_EXPIRED_RETENTION_SECONDS),
        }
    }

    pub fn with_expired_retention(mut self, retention: Duration) -> Self {
        self.expired_retention = retention;
        self
    }

    fn redis_key(&self, key: &ChallengeKey) -> String {
        self.client.make_key(&key.storage_key())
    }

    /// Milliseconds the hash should live, never less than one
    fn retention_ms(&self, record: &OtpRecord, now: DateTime<Utc>) -> i64 {
        ((record.expires_at - now) + self.expired_retention)
            .num_milliseconds()
            .max(1)
    }
}

/// Rebuild a record from its hash fields
pub(crate) fn record_from_fields(fields: &HashMap<String, String>) -> Result<Option<OtpRecord>, StorageError> {
    if fields.is_empty() {
        return Ok(None);
    }

    let raw = fields
        .get("record")
        .ok_or_else(|| StorageError::corrupted("challenge hash has no record field"))?;
    let mut record: OtpRecord = serde_json::from_str(raw)
        .map_err(|e| StorageError::corrupted(format!("invalid challenge record: {}", e)))?;

    let attempts = fields
        .get("attempts")
        .and_then(|a| a.parse::<u32>().ok())
        .ok_or_else(|| StorageError::corrupted("challenge hash has no valid attempts field"))?;
    record.attempts_remaining = attempts;

    if fields.get("id").map(String::as_str) != Some(record.id.to_string().as_str()) {
        return Err(StorageError::corrupted("challenge hash id does not match record"));
    }

    Ok(Some(record))
}

fn version_args(version: &RecordVersion) -> Vec<String> {
    vec![version.id.to_string(), version.attempts_remaining.to_string()]
}

fn unavailable(error: InfrastructureError) -> StorageError {
    StorageError::unavailable(error.to_string())
}

#[async_trait]
impl OtpStore for RedisOtpStore {
    async fn get(&self, key: &ChallengeKey) -> Result<Option<OtpRecord>, StorageError> {
        let fields = self
            .client
            .hash_get_all(&self.redis_key(key))
            .await
            .map_err(unavailable)?;
        record_from_fields(&fields)
    }

    async fn replace(&self, record: &OtpRecord) -> Result<(), StorageError> {
        let json = serde_json::to_string(record)
            .map_err(|e| StorageError::corrupted(format!("failed to encode record: {}", e)))?;
        let args = vec![
            record.id.to_string(),
            record.attempts_remaining.to_string(),
            record.expires_at.timestamp_millis().to_string(),
            json,
            self.retention_ms(record, Utc::now()).to_string(),
        ];

        self.client
            .eval_script::<i64>(&REPLACE_SCRIPT, &[self.redis_key(&record.key())], &args)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn decrement_attempts(
        &self,
        key: &ChallengeKey,
        version: &RecordVersion,
    ) -> Result<u32, StorageError> {
        let remaining = self
            .client
            .eval_script::<i64>(&DECREMENT_SCRIPT, &[self.redis_key(key)], &version_args(version))
            .await
            .map_err(unavailable)?;

        u32::try_from(remaining).map_err(|_| StorageError::Conflict)
    }

    async fn remove(&self, key: &ChallengeKey, version: &RecordVersion) -> Result<(), StorageError> {
        let deleted = self
            .client
            .eval_script::<i64>(&REMOVE_SCRIPT, &[self.redis_key(key)], &version_args(version))
            .await
            .map_err(unavailable)?;

        if deleted == 0 {
            return Err(StorageError::Conflict);
        }
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StorageError> {
        let pattern = self.client.make_key("otp:*");
        let keys = self.client.scan_keys(&pattern).await.map_err(unavailable)?;
        let now_ms = vec![now.timestamp_millis().to_string()];

        let mut purged = 0;
        for key in keys {
            match self
                .client
                .eval_script::<i64>(&PURGE_SCRIPT, &[key.clone()], &now_ms)
                .await
            {
                Ok(deleted) => purged += deleted.max(0) as usize,
                // Keys of another type under the prefix are skipped
                Err(e) => warn!(key = %key, error = %e, "Skipping key during purge"),
            }
        }

        debug!(purged = purged, "Purged expired challenges from Redis");
        Ok(purged)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        match self.client.health_check().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(StorageError::unavailable("unexpected PING response")),
            Err(e) => Err(unavailable(e)),
        }
    }
}
