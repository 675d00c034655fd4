//! One-time code configuration
//!
//! Raw settings as read from the environment. The core crate turns these into
//! a validated `OtpConfig` before building the service.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Which store backs challenge records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpStoreKind {
    /// Process-local map; single instance only
    #[default]
    Memory,
    /// Redis with scripted conditional updates
    Redis,
    /// MySQL table with conditional UPDATE statements
    Mysql,
}

impl std::str::FromStr for OtpStoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" => Ok(OtpStoreKind::Memory),
            "redis" => Ok(OtpStoreKind::Redis),
            "mysql" => Ok(OtpStoreKind::Mysql),
            _ => Err(format!("Invalid OTP store: {}", s)),
        }
    }
}

/// One-time code settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OtpSettings {
    /// Number of digits in a generated code
    pub code_length: usize,

    /// Seconds a code stays valid after issuance
    pub ttl_seconds: i64,

    /// Failed submissions allowed before the code is invalidated
    pub max_attempts: u32,

    /// Storage representation: "plain", "hashed" or "encrypted"
    pub storage_mode: String,

    /// Base64 encoded 32-byte AES key, required for "encrypted"
    #[serde(default, skip_serializing)]
    pub encryption_key: Option<String>,

    /// Base64 encoded keys retained after rotation so older records still decrypt
    #[serde(default, skip_serializing)]
    pub previous_encryption_keys: Vec<String>,

    /// Secret mixed into hashed codes
    #[serde(default, skip_serializing)]
    pub hash_pepper: Option<String>,

    /// Interval between expired-record sweeps; 0 disables the sweeper
    pub sweep_interval_seconds: u64,

    /// How many times a verification retries after losing a concurrent update
    pub max_conflict_retries: u32,

    /// Backing store
    pub store: OtpStoreKind,
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self {
            code_length: 6,
            ttl_seconds: 300,
            max_attempts: 3,
            storage_mode: String::from("hashed"),
            encryption_key: None,
            previous_encryption_keys: Vec::new(),
            hash_pepper: None,
            sweep_interval_seconds: 60,
            max_conflict_retries: 5,
            store: OtpStoreKind::default(),
        }
    }
}

impl OtpSettings {
    /// Create from environment variables.
    ///
    /// Unset variables fall back to defaults. A variable that is set but does
    /// not parse is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let secret = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            code_length: parse_var(&lookup, "OTP_CODE_LENGTH")?.unwrap_or(defaults.code_length),
            ttl_seconds: parse_var(&lookup, "OTP_TTL_SECONDS")?.unwrap_or(defaults.ttl_seconds),
            max_attempts: parse_var(&lookup, "OTP_MAX_ATTEMPTS")?.unwrap_or(defaults.max_attempts),
            storage_mode: lookup("OTP_STORAGE_MODE").unwrap_or(defaults.storage_mode),
            encryption_key: secret("OTP_ENCRYPTION_KEY"),
            previous_encryption_keys: lookup("OTP_PREVIOUS_ENCRYPTION_KEYS")
                .map(|v| {
                    v.split(',')
                        .map(|k| k.trim().to_string())
                        .filter(|k| !k.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            hash_pepper: secret("OTP_HASH_PEPPER"),
            sweep_interval_seconds: parse_var(&lookup, "OTP_SWEEP_INTERVAL_SECONDS")?
                .unwrap_or(defaults.sweep_interval_seconds),
            max_conflict_retries: parse_var(&lookup, "OTP_MAX_CONFLICT_RETRIES")?
                .unwrap_or(defaults.max_conflict_retries),
            store: parse_var(&lookup, "OTP_STORE")?.unwrap_or(defaults.store),
        })
    }
}

/// `Ok(None)` when the variable is unset or blank
fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
        _ => Ok(None),
    }
}
