//! Session issuance configuration

use serde::{Deserialize, Serialize};

const DEFAULT_SECRET: &str = "your-secret-key-change-in-production";

/// Configuration for the session tokens granted after a successful verification
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// HMAC secret used to sign session tokens
    pub secret: String,

    /// Session lifetime in seconds
    pub ttl_seconds: i64,

    /// Lifetime in seconds of the narrower grant issued by the password reset flow
    #[serde(default = "default_reset_ttl")]
    pub reset_ttl_seconds: i64,

    /// Token issuer claim
    pub issuer: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::from(DEFAULT_SECRET),
            ttl_seconds: 7 * 24 * 3600,
            reset_ttl_seconds: default_reset_ttl(),
            issuer: String::from("mailgate"),
        }
    }
}

impl SessionConfig {
    /// Create a new session configuration with secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            secret: std::env::var("SESSION_SECRET").unwrap_or(defaults.secret),
            ttl_seconds: std::env::var("SESSION_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.ttl_seconds),
            reset_ttl_seconds: std::env::var("SESSION_RESET_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.reset_ttl_seconds),
            issuer: std::env::var("SESSION_ISSUER").unwrap_or(defaults.issuer),
        }
    }

    /// Check if using default secret (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        self.secret == DEFAULT_SECRET
    }
}

fn default_reset_ttl() -> i64 {
    15 * 60
}
