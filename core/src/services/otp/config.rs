//! Configuration for the one-time code service

use chrono::Duration;
use mg_shared::config::OtpSettings;

use crate::errors::{DomainError, DomainResult};

pub const DEFAULT_CODE_LENGTH: usize = 6;
pub const DEFAULT_TTL_SECONDS: i64 = 300;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 5;

const MIN_CODE_LENGTH: usize = 4;
const MAX_CODE_LENGTH: usize = 12;
/// Codes never outlive a day
pub const MAX_TTL_SECONDS: i64 = 24 * 60 * 60;

/// Representation of codes at rest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    Plain,
    #[default]
    Hashed,
    Encrypted,
}

impl std::str::FromStr for StorageMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "plain" => Ok(StorageMode::Plain),
            "hashed" => Ok(StorageMode::Hashed),
            "encrypted" => Ok(StorageMode::Encrypted),
            other => Err(DomainError::validation(format!(
                "Unknown storage mode: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for StorageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageMode::Plain => write!(f, "plain"),
            StorageMode::Hashed => write!(f, "hashed"),
            StorageMode::Encrypted => write!(f, "encrypted"),
        }
    }
}

/// Validated knobs for issuance and verification
#[derive(Debug, Clone)]
pub struct OtpConfig {
    code_length: usize,
    ttl: Duration,
    max_attempts: u32,
    storage_mode: StorageMode,
    max_conflict_retries: u32,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            ttl: Duration::seconds(DEFAULT_TTL_SECONDS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            storage_mode: StorageMode::default(),
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}

impl OtpConfig {
    /// Build a configuration, rejecting values that would make codes unusable
    pub fn new(
        code_length: usize,
        ttl: Duration,
        max_attempts: u32,
        storage_mode: StorageMode,
    ) -> DomainResult<Self> {
        if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&code_length) {
            return Err(DomainError::validation(format!(
                "Code length must be between {} and {}",
                MIN_CODE_LENGTH, MAX_CODE_LENGTH
            )));
        }
        if ttl <= Duration::zero() || ttl > Duration::seconds(MAX_TTL_SECONDS) {
            return Err(ttl_out_of_range());
        }
        if max_attempts == 0 {
            return Err(DomainError::validation("Max attempts must be at least 1"));
        }

        Ok(Self {
            code_length,
            ttl,
            max_attempts,
            storage_mode,
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        })
    }

    /// Build from raw environment settings
    pub fn from_settings(settings: &OtpSettings) -> DomainResult<Self> {
        let storage_mode = settings.storage_mode.parse()?;
        // Range check before building the Duration, which panics past its limits
        if !(1..=MAX_TTL_SECONDS).contains(&settings.ttl_seconds) {
            return Err(ttl_out_of_range());
        }
        Ok(Self::new(
            settings.code_length,
            Duration::seconds(settings.ttl_seconds),
            settings.max_attempts,
            storage_mode,
        )?
        .with_max_conflict_retries(settings.max_conflict_retries))
    }

    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    pub fn code_length(&self) -> usize {
        self.code_length
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn storage_mode(&self) -> StorageMode {
        self.storage_mode
    }

    pub fn max_conflict_retries(&self) -> u32 {
        self.max_conflict_retries
    }
}

fn ttl_out_of_range() -> DomainError {
    DomainError::validation(format!(
        "Code TTL must be between 1 and {} seconds",
        MAX_TTL_SECONDS
    ))
}
