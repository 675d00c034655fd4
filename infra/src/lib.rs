//! # Infrastructure Layer
//!
//! Concrete adapters for the MailGate core:
//! - **Cache**: Redis client and the Redis challenge store
//! - **Database**: MySQL pool and the MySQL challenge store
//! - **Email**: Resend and log delivery channels
//! - **OTP wiring**: store and code protector selection from configuration
//!
//! ## Features
//!
//! - `mysql`: Enable the MySQL challenge store (default)
//! - `redis-cache`: Enable Redis async support (default)

use std::sync::Arc;

use mg_core::errors::DomainError;
use mg_core::repositories::OtpStore;
use mg_core::services::email::DeliveryChannel;
use mg_core::services::otp::{CodeProtector, OtpConfig};
use mg_shared::config::{AppConfig, ConfigError};

/// Cache module - Redis client and challenge store
pub mod cache;

/// Database module - MySQL pool and challenge store
#[cfg(feature = "mysql")]
pub mod database;

/// Email module - Delivery channels
pub mod email;

/// OTP module - Store and protector selection
pub mod otp;

/// Adapters the API layer needs to build the one-time code service
#[derive(Clone)]
pub struct InfrastructureServices {
    pub otp_store: Arc<dyn OtpStore>,
    pub delivery: Arc<dyn DeliveryChannel>,
    pub protector: CodeProtector,
    pub otp_config: OtpConfig,
}

/// Connect the configured challenge store and build the delivery channel and
/// code protector
pub async fn initialize(config: &AppConfig) -> Result<InfrastructureServices, InfrastructureError> {
    tracing::info!("Initializing infrastructure services...");

    let otp_config = OtpConfig::from_settings(&config.otp)?;
    let otp_store = otp::create_otp_store(config).await?;
    let protector = otp::create_code_protector(&config.otp, &otp_config)?;
    let delivery = email::create_email_channel(&config.email)?;

    tracing::info!(
        store = ?config.otp.store,
        storage_mode = %otp_config.storage_mode(),
        email_provider = delivery.provider_name(),
        "Infrastructure services initialized successfully"
    );

    Ok(InfrastructureServices {
        otp_store,
        delivery,
        protector,
        otp_config,
    })
}

/// Load application configuration from the environment and an optional `.env`
pub fn load_config() -> Result<AppConfig, InfrastructureError> {
    dotenvy::dotenv().ok();
    Ok(AppConfig::from_env()?)
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// HTTP request error for external services
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Environment value that failed to parse
    #[error("Configuration error: {0}")]
    Settings(#[from] ConfigError),

    /// Domain validation or internal error raised while wiring services
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}
