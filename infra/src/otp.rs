//! Challenge store and code protector selection

use std::sync::Arc;

use mg_core::errors::StorageError;
use mg_core::repositories::{InMemoryOtpStore, OtpStore};
use mg_core::services::otp::{
    AesGcmCodeCipher, CodeProtector, KeyManager, KeyRotationConfig, OtpConfig, StorageMode,
};
use mg_shared::config::{AppConfig, OtpSettings, OtpStoreKind};

use crate::cache::{RedisClient, RedisOtpStore};
use crate::InfrastructureError;

/// Connect the store selected by `config.otp.store`
pub async fn create_otp_store(config: &AppConfig) -> Result<Arc<dyn OtpStore>, InfrastructureError> {
    match config.otp.store {
        OtpStoreKind::Memory => {
            tracing::warn!("Using in-memory challenge store; challenges are lost on restart");
            Ok(Arc::new(InMemoryOtpStore::new()))
        }
        OtpStoreKind::Redis => {
            let client = RedisClient::new(config.cache.clone()).await?;
            Ok(Arc::new(RedisOtpStore::new(client)))
        }
        #[cfg(feature = "mysql")]
        OtpStoreKind::Mysql => {
            use crate::database::{DatabasePool, MySqlOtpStore};

            let pool = DatabasePool::new(config.database.clone()).await?;
            let store = MySqlOtpStore::new(pool.get_pool().clone());
            store.ensure_schema().await.map_err(storage_config_error)?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "mysql"))]
        OtpStoreKind::Mysql => Err(InfrastructureError::Config(
            "MySQL challenge store requires the `mysql` feature".to_string(),
        )),
    }
}

fn lacks_pepper(settings: &OtpSettings) -> bool {
    settings
        .hash_pepper
        .as_deref()
        .map_or(true, |pepper| pepper.trim().is_empty())
}

fn storage_config_error(error: StorageError) -> InfrastructureError {
    InfrastructureError::Config(format!("Challenge store setup failed: {}", error))
}

/// Build the protector for the configured storage mode.
///
/// The pepper is kept in every mode so hashed records written before a mode
/// change still verify. Encrypted mode needs `OTP_ENCRYPTION_KEY` unless the
/// store is in-memory, where a throwaway key is generated.
pub fn create_code_protector(
    settings: &OtpSettings,
    config: &OtpConfig,
) -> Result<CodeProtector, InfrastructureError> {
    let protector = match config.storage_mode() {
        StorageMode::Plain => {
            tracing::warn!("One-time codes are stored in plain text");
            CodeProtector::plain()
        }
        StorageMode::Hashed => {
            if lacks_pepper(settings) {
                tracing::warn!(
                    storage_mode = "hashed",
                    "OTP_HASH_PEPPER not set; hashed codes can be brute-forced offline from a leaked store"
                );
            }
            CodeProtector::hashed(settings.hash_pepper.clone())
        }
        StorageMode::Encrypted => {
            let rotation = KeyRotationConfig::default();
            let keys = match &settings.encryption_key {
                Some(active) => {
                    KeyManager::from_base64(active, &settings.previous_encryption_keys, rotation)?
                }
                None if settings.store == OtpStoreKind::Memory => {
                    tracing::warn!("OTP_ENCRYPTION_KEY not set; using a generated key for this process");
                    KeyManager::generate(rotation)?
                }
                None => {
                    return Err(InfrastructureError::Config(
                        "OTP_ENCRYPTION_KEY is required for encrypted storage with a persistent store"
                            .to_string(),
                    ))
                }
            };
            CodeProtector::encrypted(Arc::new(AesGcmCodeCipher::new(Arc::new(keys))))
        }
    };

    Ok(protector.with_pepper(settings.hash_pepper.clone()))
}
