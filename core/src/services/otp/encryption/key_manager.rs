//! Key management for encrypted code storage

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::sync::RwLock;

use crate::errors::{DomainError, DomainResult};

pub const KEY_LENGTH: usize = 32;

/// Key rotation configuration
#[derive(Debug, Clone)]
pub struct KeyRotationConfig {
    /// Maximum number of retired keys kept for decryption
    pub max_old_keys: usize,
}

impl Default for KeyRotationConfig {
    fn default() -> Self {
        Self { max_old_keys: 3 }
    }
}

/// Encryption key with metadata
#[derive(Clone)]
pub struct EncryptionKey {
    pub key: Vec<u8>,
    /// Derived from the key material, so it is stable across restarts
    pub id: String,
    pub loaded_at: DateTime<Utc>,
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("id", &self.id)
            .field("loaded_at", &self.loaded_at)
            .finish_non_exhaustive()
    }
}

impl EncryptionKey {
    pub fn new(key: Vec<u8>) -> DomainResult<Self> {
        if key.len() != KEY_LENGTH {
            return Err(DomainError::validation(
                "Encryption key must be 32 bytes (256 bits)",
            ));
        }
        let id = key_id(&key);
        Ok(Self {
            key,
            id,
            loaded_at: Utc::now(),
        })
    }

    /// Decode a base64 encoded key
    pub fn from_base64(encoded: &str) -> DomainResult<Self> {
        let key = BASE64
            .decode(encoded.trim())
            .map_err(|e| DomainError::validation(format!("Invalid base64 encryption key: {}", e)))?;
        Self::new(key)
    }
}

struct KeyRing {
    active: EncryptionKey,
    retired: VecDeque<EncryptionKey>,
}

/// Holds the active key plus a bounded set of retired keys.
/// New records are encrypted with the active key; any held key may decrypt.
pub struct KeyManager {
    ring: RwLock<KeyRing>,
    config: KeyRotationConfig,
}

impl KeyManager {
    /// Create a key manager with a freshly generated key
    pub fn generate(config: KeyRotationConfig) -> DomainResult<Self> {
        Self::with_key(EncryptionKey::new(Self::generate_key())?, Vec::new(), config)
    }

    /// Create a key manager from an active key and previously used keys,
    /// newest first
    pub fn with_key(
        active: EncryptionKey,
        previous: Vec<EncryptionKey>,
        config: KeyRotationConfig,
    ) -> DomainResult<Self> {
        let retired: VecDeque<EncryptionKey> = previous
            .into_iter()
            .filter(|k| k.id != active.id)
            .take(config.max_old_keys)
            .collect();

        Ok(Self {
            ring: RwLock::new(KeyRing { active, retired }),
            config,
        })
    }

    /// Create from base64 encoded keys as found in configuration
    pub fn from_base64(
        active: &str,
        previous: &[String],
        config: KeyRotationConfig,
    ) -> DomainResult<Self> {
        let active = EncryptionKey::from_base64(active)?;
        let previous = previous
            .iter()
            .map(|k| EncryptionKey::from_base64(k))
            .collect::<DomainResult<Vec<_>>>()?;
        Self::with_key(active, previous, config)
    }

    /// Generate a new 256-bit key
    pub fn generate_key() -> Vec<u8> {
        let mut key = vec![0u8; KEY_LENGTH];
        OsRng.fill_bytes(&mut key);
        key
    }

    /// Get the active encryption key
    pub fn active_key(&self) -> DomainResult<EncryptionKey> {
        self.ring
            .read()
            .map(|ring| ring.active.clone())
            .map_err(|e| DomainError::internal(format!("Failed to read active key: {}", e)))
    }

    /// Find a key by id among the active and retired keys
    pub fn find_key(&self, key_id: &str) -> DomainResult<Option<EncryptionKey>> {
        let ring = self
            .ring
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to read keys: {}", e)))?;

        if ring.active.id == key_id {
            return Ok(Some(ring.active.clone()));
        }
        Ok(ring.retired.iter().find(|k| k.id == key_id).cloned())
    }

    /// Make `new_key` active and retire the current one. Returns the new key id.
    pub fn rotate_key(&self, new_key: EncryptionKey) -> DomainResult<String> {
        let mut ring = self
            .ring
            .write()
            .map_err(|e| DomainError::internal(format!("Failed to write keys: {}", e)))?;

        if ring.active.id == new_key.id {
            return Ok(new_key.id);
        }

        let new_id = new_key.id.clone();
        let old = std::mem::replace(&mut ring.active, new_key);
        ring.retired.retain(|k| k.id != new_id);
        ring.retired.push_front(old);
        ring.retired.truncate(self.config.max_old_keys);

        tracing::info!(key_id = %new_id, event = "otp_key_rotated", "Rotated code encryption key");
        Ok(new_id)
    }

    /// All key ids, active first
    pub fn key_ids(&self) -> DomainResult<Vec<String>> {
        let ring = self
            .ring
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to read keys: {}", e)))?;
        Ok(std::iter::once(ring.active.id.clone())
            .chain(ring.retired.iter().map(|k| k.id.clone()))
            .collect())
    }
}

fn key_id(key: &[u8]) -> String {
    hex::encode(&Sha256::digest(key)[..8])
}
