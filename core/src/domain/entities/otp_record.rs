//! One-time code challenge record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a one-time code is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OtpPurpose {
    #[serde(rename = "sign-in")]
    SignIn,
    #[serde(rename = "email-verification")]
    EmailVerification,
    #[serde(rename = "forget-password")]
    ForgetPassword,
}

impl OtpPurpose {
    pub const ALL: [OtpPurpose; 3] = [
        OtpPurpose::SignIn,
        OtpPurpose::EmailVerification,
        OtpPurpose::ForgetPassword,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::SignIn => "sign-in",
            OtpPurpose::EmailVerification => "email-verification",
            OtpPurpose::ForgetPassword => "forget-password",
        }
    }
}

impl std::fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OtpPurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sign-in" => Ok(OtpPurpose::SignIn),
            "email-verification" => Ok(OtpPurpose::EmailVerification),
            "forget-password" => Ok(OtpPurpose::ForgetPassword),
            _ => Err(format!("Unknown OTP purpose: {}", s)),
        }
    }
}

/// Identity of a challenge slot. At most one record lives under a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChallengeKey {
    /// Normalized email address
    pub identifier: String,
    pub purpose: OtpPurpose,
}

impl ChallengeKey {
    pub fn new(identifier: impl Into<String>, purpose: OtpPurpose) -> Self {
        Self {
            identifier: identifier.into(),
            purpose,
        }
    }

    /// Stable string form used as the storage key
    pub fn storage_key(&self) -> String {
        format!("otp:{}:{}", self.purpose.as_str(), self.identifier)
    }
}

impl std::fmt::Display for ChallengeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.purpose, self.identifier)
    }
}

/// How the code is held at rest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum StoredCode {
    Plain {
        code: String,
    },
    /// Hex SHA-256 digest of the peppered code
    Hashed {
        digest: String,
    },
    /// AES-256-GCM ciphertext, base64 encoded
    Encrypted {
        ciphertext: String,
        nonce: String,
        key_id: String,
    },
}

impl StoredCode {
    pub fn mode_name(&self) -> &'static str {
        match self {
            StoredCode::Plain { .. } => "plain",
            StoredCode::Hashed { .. } => "hashed",
            StoredCode::Encrypted { .. } => "encrypted",
        }
    }
}

/// Version of a record as read. Conditional store operations only apply when
/// the stored record still carries this exact version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordVersion {
    pub id: Uuid,
    pub attempts_remaining: u32,
}

/// A persisted one-time code challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpRecord {
    /// Unique per issuance
    pub id: Uuid,

    /// Normalized email address
    pub identifier: String,

    pub purpose: OtpPurpose,

    pub code: StoredCode,

    pub issued_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,

    /// Failed submissions still allowed; zero makes the record inert
    pub attempts_remaining: u32,
}

impl OtpRecord {
    /// Create a fresh record issued at `issued_at`
    pub fn new(
        key: &ChallengeKey,
        code: StoredCode,
        issued_at: DateTime<Utc>,
        ttl: Duration,
        max_attempts: u32,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), key, code, issued_at, ttl, max_attempts)
    }

    /// Create a record with a pre-allocated id
    pub fn with_id(
        id: Uuid,
        key: &ChallengeKey,
        code: StoredCode,
        issued_at: DateTime<Utc>,
        ttl: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            id,
            identifier: key.identifier.clone(),
            purpose: key.purpose,
            code,
            issued_at,
            expires_at: issued_at + ttl,
            attempts_remaining: max_attempts,
        }
    }

    pub fn key(&self) -> ChallengeKey {
        ChallengeKey::new(self.identifier.clone(), self.purpose)
    }

    pub fn version(&self) -> RecordVersion {
        RecordVersion {
            id: self.id,
            attempts_remaining: self.attempts_remaining,
        }
    }

    pub fn matches_version(&self, version: &RecordVersion) -> bool {
        self.id == version.id && self.attempts_remaining == version.attempts_remaining
    }

    /// Expiry is inclusive: a record is expired at `expires_at` itself
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts_remaining == 0
    }

    /// Whether the record can still verify a code at `now`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired_at(now) && !self.is_exhausted()
    }

    /// Seconds left until expiry, never negative
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}
