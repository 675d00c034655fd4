//! Tests for the Redis challenge store

use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use mg_core::domain::entities::{ChallengeKey, OtpPurpose, OtpRecord, StoredCode};
use mg_core::errors::StorageError;
use mg_core::repositories::OtpStore;
use mg_shared::config::CacheConfig;

use crate::cache::otp_store::record_from_fields;
use crate::cache::{RedisClient, RedisOtpStore};

fn record(email: &str) -> OtpRecord {
    OtpRecord::new(
        &ChallengeKey::new(email, OtpPurpose::SignIn),
        StoredCode::Plain {
            code: "123456".to_string(),
        },
        Utc::now(),
        Duration::minutes(5),
        3,
    )
}

fn fields_for(record: &OtpRecord, attempts: u32) -> HashMap<String, String> {
    HashMap::from([
        ("id".to_string(), record.id.to_string()),
        ("attempts".to_string(), attempts.to_string()),
        (
            "expires_at_ms".to_string(),
            record.expires_at.timestamp_millis().to_string(),
        ),
        ("record".to_string(), serde_json::to_string(record).unwrap()),
    ])
}

#[test]
fn test_missing_hash_is_none() {
    assert_eq!(record_from_fields(&HashMap::new()).unwrap(), None);
}

#[test]
fn test_attempts_field_is_authoritative() {
    let original = record("a@example.com");
    let restored = record_from_fields(&fields_for(&original, 1)).unwrap().unwrap();

    assert_eq!(restored.id, original.id);
    assert_eq!(restored.attempts_remaining, 1);
    assert_eq!(restored.code, original.code);
}

#[test]
fn test_malformed_hash_is_corrupted() {
    let original = record("a@example.com");

    let mut fields = fields_for(&original, 3);
    fields.insert("record".to_string(), "{not json".to_string());
    assert!(matches!(
        record_from_fields(&fields),
        Err(StorageError::Corrupted { .. })
    ));

    let mut fields = fields_for(&original, 3);
    fields.remove("attempts");
    assert!(matches!(
        record_from_fields(&fields),
        Err(StorageError::Corrupted { .. })
    ));

    let mut fields = fields_for(&original, 3);
    fields.insert("id".to_string(), uuid::Uuid::new_v4().to_string());
    assert!(matches!(
        record_from_fields(&fields),
        Err(StorageError::Corrupted { .. })
    ));
}

async fn live_store() -> RedisOtpStore {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
    let client = RedisClient::new(CacheConfig::new(url).with_prefix("mailgate-test"))
        .await
        .unwrap();
    RedisOtpStore::new(client)
}

#[tokio::test]
#[ignore] // Requires actual Redis server
async fn test_conditional_operations() {
    let store = live_store().await;
    let record = record("redis-conditional@example.com");
    let key = record.key();

    store.replace(&record).await.unwrap();
    assert_eq!(store.get(&key).await.unwrap(), Some(record.clone()));

    let version = record.version();
    assert_eq!(store.decrement_attempts(&key, &version).await.unwrap(), 2);
    // Same version again is stale
    assert_eq!(
        store.decrement_attempts(&key, &version).await,
        Err(StorageError::Conflict)
    );
    assert_eq!(store.remove(&key, &version).await, Err(StorageError::Conflict));

    let current = store.get(&key).await.unwrap().unwrap();
    assert_eq!(current.attempts_remaining, 2);
    store.remove(&key, &current.version()).await.unwrap();
    assert_eq!(store.get(&key).await.unwrap(), None);
}

#[tokio::test]
#[ignore] // Requires actual Redis server
async fn test_replace_resets_version() {
    let store = live_store().await;
    let first = record("redis-replace@example.com");
    store.replace(&first).await.unwrap();

    let second = record("redis-replace@example.com");
    store.replace(&second).await.unwrap();

    assert_eq!(
        store.decrement_attempts(&first.key(), &first.version()).await,
        Err(StorageError::Conflict)
    );
    assert_eq!(store.get(&first.key()).await.unwrap().unwrap().id, second.id);
    store.remove(&second.key(), &second.version()).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires actual Redis server
async fn test_purge_expired() {
    let store = live_store().await;
    let record = record("redis-purge@example.com");
    store.replace(&record).await.unwrap();

    assert_eq!(store.purge_expired(Utc::now()).await.unwrap(), 0);
    let purged = store
        .purge_expired(record.expires_at + Duration::seconds(1))
        .await
        .unwrap();
    assert!(purged >= 1);
    assert_eq!(store.get(&record.key()).await.unwrap(), None);
}

#[tokio::test]
#[ignore] // Requires actual Redis server
async fn test_concurrent_decrements_apply_once_per_version() {
    let store = Arc::new(live_store().await);
    let record = record("redis-race@example.com");
    store.replace(&record).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..5 {
        let store = store.clone();
        let key = record.key();
        let version = record.version();
        handles.push(tokio::spawn(async move {
            store.decrement_attempts(&key, &version).await
        }));
    }

    let mut applied = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            applied += 1;
        }
    }
    assert_eq!(applied, 1);

    let current = store.get(&record.key()).await.unwrap().unwrap();
    store.remove(&record.key(), &current.version()).await.unwrap();
}
