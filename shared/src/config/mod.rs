//! Configuration module with business-specific sub-modules
//!
//! - `auth` - Session token configuration
//! - `cache` - Redis configuration
//! - `database` - Database connection and pool configuration
//! - `email` - Outbound email provider configuration
//! - `environment` - Environment detection and logging configuration
//! - `otp` - One-time code issuance and storage settings
//! - `server` - HTTP server and CORS configuration

pub mod auth;
pub mod cache;
pub mod database;
pub mod email;
pub mod environment;
pub mod otp;
pub mod server;

use serde::{Deserialize, Serialize};

pub use auth::SessionConfig;
pub use cache::CacheConfig;
pub use database::DatabaseConfig;
pub use email::{EmailConfig, EmailProvider};
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use otp::{OtpSettings, OtpStoreKind};
pub use server::{CorsConfig, ServerConfig};

/// Configuration loading errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but its value does not parse
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Server configuration
    pub server: ServerConfig,

    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,

    /// One-time code configuration
    pub otp: OtpSettings,

    /// Session configuration
    pub session: SessionConfig,

    /// Email configuration
    pub email: EmailConfig,

    /// Redis configuration, used when the OTP store is Redis
    pub cache: CacheConfig,

    /// Database configuration, used when the OTP store is MySQL
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            server: ServerConfig::default(),
            cors: CorsConfig::default(),
            otp: OtpSettings::default(),
            session: SessionConfig::default(),
            email: EmailConfig::default(),
            cache: CacheConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::for_environment(env),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = Environment::from_env();
        Ok(Self {
            environment,
            server: ServerConfig::from_env(),
            cors: CorsConfig::from_env(),
            otp: OtpSettings::from_env()?,
            session: SessionConfig::from_env(),
            email: EmailConfig::from_env(),
            cache: CacheConfig::from_env(),
            database: DatabaseConfig::from_env(),
            logging: LoggingConfig::from_env(environment),
        })
    }
}
