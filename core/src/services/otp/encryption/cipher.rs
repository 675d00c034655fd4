//! AES-256-GCM encryption of stored codes

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;

use crate::domain::entities::StoredCode;
use crate::errors::{DomainError, DomainResult, StorageError};

use super::key_manager::KeyManager;

const NONCE_LENGTH: usize = 12;

/// Encrypts codes with the active key and decrypts with any retained key.
///
/// The associated data binds a ciphertext to its challenge, so a ciphertext
/// copied into another record fails authentication.
pub struct AesGcmCodeCipher {
    key_manager: Arc<KeyManager>,
}

impl AesGcmCodeCipher {
    pub fn new(key_manager: Arc<KeyManager>) -> Self {
        Self { key_manager }
    }

    pub fn key_manager(&self) -> &Arc<KeyManager> {
        &self.key_manager
    }

    pub fn encrypt(&self, code: &str, associated_data: &[u8]) -> DomainResult<StoredCode> {
        let key = self.key_manager.active_key()?;

        let mut nonce = [0u8; NONCE_LENGTH];
        OsRng.fill_bytes(&mut nonce);

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.key));
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: code.as_bytes(),
                    aad: associated_data,
                },
            )
            .map_err(|e| DomainError::internal(format!("Encryption failed: {}", e)))?;

        Ok(StoredCode::Encrypted {
            ciphertext: BASE64.encode(ciphertext),
            nonce: BASE64.encode(nonce),
            key_id: key.id,
        })
    }

    pub fn decrypt(
        &self,
        ciphertext: &str,
        nonce: &str,
        key_id: &str,
        associated_data: &[u8],
    ) -> Result<String, StorageError> {
        let key = self
            .key_manager
            .find_key(key_id)
            .map_err(|e| StorageError::unavailable(e.to_string()))?
            .ok_or_else(|| StorageError::corrupted(format!("Unknown encryption key: {}", key_id)))?;

        let ciphertext = BASE64
            .decode(ciphertext)
            .map_err(|e| StorageError::corrupted(format!("Failed to decode ciphertext: {}", e)))?;
        let nonce = BASE64
            .decode(nonce)
            .map_err(|e| StorageError::corrupted(format!("Failed to decode nonce: {}", e)))?;
        if nonce.len() != NONCE_LENGTH {
            return Err(StorageError::corrupted("Invalid nonce size for AES-GCM"));
        }

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.key));
        let plaintext = cipher
            .decrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: &ciphertext,
                    aad: associated_data,
                },
            )
            .map_err(|_| StorageError::corrupted("Decryption failed"))?;

        String::from_utf8(plaintext)
            .map_err(|e| StorageError::corrupted(format!("Decrypted code is not UTF-8: {}", e)))
    }
}
