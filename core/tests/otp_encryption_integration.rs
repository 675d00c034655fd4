//! Encrypted code storage across key rotation

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use mg_core::services::otp::{
    AesGcmCodeCipher, EncryptionKey, FixedCodeGenerator, KeyManager, KeyRotationConfig,
};
use mg_core::services::session::SessionEstablisher;
use mg_core::{
    CodeProtector, DeliveryChannel, DeliveryError, DomainError, InMemoryOtpStore, OtpConfig,
    OtpPurpose, OtpService, OtpStore, SessionError, SessionGrant, SessionRequest, StorageError,
    StorageMode, StoredCode,
};

struct NullChannel;

#[async_trait]
impl DeliveryChannel for NullChannel {
    async fn send(&self, _destination: &str, _subject: &str, _html: &str) -> Result<String, DeliveryError> {
        Ok("msg".to_string())
    }

    fn provider_name(&self) -> &'static str {
        "null"
    }
}

#[derive(Default)]
struct CountingSessions {
    opened: Mutex<u32>,
}

#[async_trait]
impl SessionEstablisher for CountingSessions {
    async fn establish_session(&self, request: SessionRequest) -> Result<SessionGrant, SessionError> {
        *self.opened.lock().unwrap() += 1;
        let now = chrono::Utc::now();
        Ok(SessionGrant {
            token: request.challenge_id.to_string(),
            session_id: uuid::Uuid::new_v4(),
            identifier: request.identifier,
            scope: request.scope,
            email_verified: request.email_verified,
            issued_at: now,
            expires_at: now + chrono::Duration::hours(1),
        })
    }
}

fn encrypted_service(store: Arc<InMemoryOtpStore>, keys: Arc<KeyManager>) -> OtpService {
    let config = OtpConfig::new(6, chrono::Duration::minutes(5), 3, StorageMode::Encrypted).unwrap();
    OtpService::new(
        store,
        Arc::new(NullChannel),
        Arc::new(CountingSessions::default()),
        CodeProtector::encrypted(Arc::new(AesGcmCodeCipher::new(keys))),
        config,
    )
    .with_generator(Arc::new(FixedCodeGenerator::new("424242")))
}

#[tokio::test]
async fn test_record_survives_key_rotation() {
    let store = Arc::new(InMemoryOtpStore::new());
    let keys = Arc::new(KeyManager::generate(KeyRotationConfig::default()).unwrap());
    let service = encrypted_service(store.clone(), keys.clone());

    let issued = service.issue("user@example.com", OtpPurpose::SignIn).await.unwrap();
    let original_key = match &issued.record.code {
        StoredCode::Encrypted { key_id, .. } => key_id.clone(),
        other => panic!("expected encrypted code, got {:?}", other),
    };

    let new_id = keys
        .rotate_key(EncryptionKey::new(KeyManager::generate_key()).unwrap())
        .unwrap();
    assert_ne!(new_id, original_key);
    assert_eq!(keys.key_ids().unwrap(), vec![new_id, original_key]);

    assert!(service
        .verify("user@example.com", OtpPurpose::SignIn, "424242")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_record_unreadable_after_key_dropped() {
    let store = Arc::new(InMemoryOtpStore::new());
    let first = Arc::new(KeyManager::generate(KeyRotationConfig::default()).unwrap());
    encrypted_service(store.clone(), first)
        .issue("user@example.com", OtpPurpose::SignIn)
        .await
        .unwrap();

    // A process restarted with an unrelated key cannot read the stored code
    let second = Arc::new(KeyManager::generate(KeyRotationConfig::default()).unwrap());
    let err = encrypted_service(store.clone(), second)
        .verify("user@example.com", OtpPurpose::SignIn, "424242")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Storage(StorageError::Corrupted { .. })
    ));
}

#[tokio::test]
async fn test_same_key_material_across_restarts() {
    let store = Arc::new(InMemoryOtpStore::new());
    let material = KeyManager::generate_key();

    let before = Arc::new(
        KeyManager::with_key(EncryptionKey::new(material.clone()).unwrap(), Vec::new(), KeyRotationConfig::default())
            .unwrap(),
    );
    encrypted_service(store.clone(), before)
        .issue("user@example.com", OtpPurpose::SignIn)
        .await
        .unwrap();

    let after = Arc::new(
        KeyManager::with_key(EncryptionKey::new(material).unwrap(), Vec::new(), KeyRotationConfig::default())
            .unwrap(),
    );
    let service = encrypted_service(store.clone(), after);
    assert!(service
        .verify("user@example.com", OtpPurpose::SignIn, "424242")
        .await
        .is_ok());
    assert!(store
        .get(&mg_core::ChallengeKey::new("user@example.com", OtpPurpose::SignIn))
        .await
        .unwrap()
        .is_none());
}
