//! Shared utilities and common types for MailGate server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types
//! - Error types and response structures
//! - Email helpers (validation, normalization, masking)

pub mod config;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, CacheConfig, ConfigError, CorsConfig, DatabaseConfig, EmailConfig, EmailProvider, Environment,
    LogFormat, LoggingConfig, OtpSettings, OtpStoreKind, ServerConfig, SessionConfig,
};
pub use errors::{error_codes, ErrorResponse};
pub use types::{ApiResponse, HealthResponse, HealthStatus, ServiceHealth};
pub use utils::email;
