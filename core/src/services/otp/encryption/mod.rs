//! Encryption of stored codes with key rotation

pub mod cipher;
pub mod key_manager;

pub use cipher::AesGcmCodeCipher;
pub use key_manager::{EncryptionKey, KeyManager, KeyRotationConfig};
