//! Outbound email configuration

use serde::{Deserialize, Serialize};

/// Email provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailProvider {
    /// Resend HTTP API
    Resend,
    /// Log the message instead of sending it
    #[default]
    Log,
}

impl std::str::FromStr for EmailProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "resend" => Ok(EmailProvider::Resend),
            "log" | "mock" | "console" => Ok(EmailProvider::Log),
            _ => Err(format!("Invalid email provider: {}", s)),
        }
    }
}

/// Email delivery configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    pub provider: EmailProvider,

    /// Provider API key
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Sender, e.g. `MailGate <noreply@example.com>`
    pub from_address: String,

    /// Provider API base URL
    pub api_base_url: String,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            provider: EmailProvider::default(),
            api_key: None,
            from_address: String::from("MailGate <onboarding@resend.dev>"),
            api_base_url: String::from("https://api.resend.com"),
            request_timeout_secs: 10,
        }
    }
}

impl EmailConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            provider: std::env::var("EMAIL_PROVIDER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.provider),
            api_key: std::env::var("RESEND_API_KEY").ok().filter(|k| !k.is_empty()),
            from_address: std::env::var("EMAIL_FROM").unwrap_or(defaults.from_address),
            api_base_url: std::env::var("EMAIL_API_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            request_timeout_secs: std::env::var("EMAIL_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
        }
    }
}
