//! Turning generated codes into their stored representation and back

use constant_time_eq::constant_time_eq;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{ChallengeKey, StoredCode};
use crate::errors::{DomainError, DomainResult, StorageError};

use super::config::StorageMode;
use super::encryption::AesGcmCodeCipher;

/// Protects codes at rest according to the configured [`StorageMode`].
///
/// Verification follows the representation of the stored record rather than
/// the current mode, so records written before a mode change still verify.
#[derive(Clone)]
pub struct CodeProtector {
    mode: StorageMode,
    pepper: Option<Arc<str>>,
    cipher: Option<Arc<AesGcmCodeCipher>>,
}

impl CodeProtector {
    pub fn plain() -> Self {
        Self {
            mode: StorageMode::Plain,
            pepper: None,
            cipher: None,
        }
    }

    pub fn hashed(pepper: Option<String>) -> Self {
        Self {
            mode: StorageMode::Hashed,
            pepper: pepper.map(Arc::from),
            cipher: None,
        }
    }

    pub fn encrypted(cipher: Arc<AesGcmCodeCipher>) -> Self {
        Self {
            mode: StorageMode::Encrypted,
            pepper: None,
            cipher: Some(cipher),
        }
    }

    /// Keep a pepper around for verifying hashed records after switching modes
    pub fn with_pepper(mut self, pepper: Option<String>) -> Self {
        self.pepper = pepper.map(Arc::from);
        self
    }

    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    /// Produce the stored form of `code` for the record `record_id` under `key`
    pub fn protect(&self, code: &str, key: &ChallengeKey, record_id: Uuid) -> DomainResult<StoredCode> {
        match self.mode {
            StorageMode::Plain => Ok(StoredCode::Plain {
                code: code.to_string(),
            }),
            StorageMode::Hashed => Ok(StoredCode::Hashed {
                digest: self.digest(code, key),
            }),
            StorageMode::Encrypted => {
                let cipher = self.cipher.as_ref().ok_or_else(|| {
                    DomainError::internal("Encrypted storage mode without an encryption key")
                })?;
                cipher.encrypt(code, &associated_data(key, record_id))
            }
        }
    }

    /// Compare `candidate` against `stored` in constant time
    pub fn matches(
        &self,
        stored: &StoredCode,
        candidate: &str,
        key: &ChallengeKey,
        record_id: Uuid,
    ) -> Result<bool, StorageError> {
        match stored {
            StoredCode::Plain { code } => Ok(constant_time_compare(code, candidate)),
            StoredCode::Hashed { digest } => {
                Ok(constant_time_compare(digest, &self.digest(candidate, key)))
            }
            StoredCode::Encrypted {
                ciphertext,
                nonce,
                key_id,
            } => {
                let cipher = self.cipher.as_ref().ok_or_else(|| {
                    StorageError::corrupted("Encrypted record but no encryption key configured")
                })?;
                let code = cipher.decrypt(ciphertext, nonce, key_id, &associated_data(key, record_id))?;
                Ok(constant_time_compare(&code, candidate))
            }
        }
    }

    fn digest(&self, code: &str, key: &ChallengeKey) -> String {
        let mut hasher = Sha256::new();
        if let Some(pepper) = &self.pepper {
            hasher.update(pepper.as_bytes());
        }
        hasher.update(b"\0");
        hasher.update(key.purpose.as_str().as_bytes());
        hasher.update(b"\0");
        hasher.update(key.identifier.as_bytes());
        hasher.update(b"\0");
        hasher.update(code.as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn associated_data(key: &ChallengeKey, record_id: Uuid) -> Vec<u8> {
    format!("{}:{}:{}", key.purpose, key.identifier, record_id).into_bytes()
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    constant_time_eq(a.as_bytes(), b.as_bytes())
}
