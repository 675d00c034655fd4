//! Resend email delivery
//!
//! Sends through `POST {api_base_url}/emails` with a bearer API key. Rate
//! limiting and server errors are retried with exponential backoff; other
//! rejections are returned immediately.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use mg_core::errors::DeliveryError;
use mg_core::services::email::DeliveryChannel;
use mg_shared::config::EmailConfig;
use mg_shared::email::mask_email;

use crate::InfrastructureError;

/// Resend client configuration
#[derive(Debug, Clone)]
pub struct ResendConfig {
    pub api_key: String,
    /// Sender, e.g. `MailGate <noreply@example.com>`
    pub from_address: String,
    pub api_base_url: String,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub request_timeout_secs: u64,
}

impl ResendConfig {
    /// Build from the email section of the app configuration
    pub fn from_email_config(config: &EmailConfig) -> Result<Self, InfrastructureError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| InfrastructureError::Config("RESEND_API_KEY not set".to_string()))?;

        Ok(Self {
            api_key,
            from_address: config.from_address.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            max_retries: 3,
            retry_delay_ms: 500,
            request_timeout_secs: config.request_timeout_secs,
        })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SendEmailRequest<'a> {
    pub from: &'a str,
    pub to: [&'a str; 1],
    pub subject: &'a str,
    pub html: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SendEmailResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResendErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Turn an error response body into a readable message
pub(crate) fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ResendErrorBody>(body) {
        Ok(ResendErrorBody {
            message: Some(message),
            name,
        }) => match name {
            Some(name) => format!("{}: {}", name, message),
            None => message,
        },
        _ if body.trim().is_empty() => format!("HTTP {}", status),
        _ => body.chars().take(200).collect(),
    }
}

pub(crate) fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Resend delivery channel
pub struct ResendDeliveryChannel {
    client: reqwest::Client,
    config: ResendConfig,
}

impl ResendDeliveryChannel {
    pub fn new(config: ResendConfig) -> Result<Self, InfrastructureError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        info!(
            sender = %config.from_address,
            provider = "resend",
            "Resend email channel initialized"
        );
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/emails", self.config.api_base_url)
    }

    async fn send_once(&self, request: &SendEmailRequest<'_>) -> Result<String, DeliveryError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| DeliveryError::Transport {
            message: format!("Failed to read response body: {}", e),
        })?;

        if !(200..300).contains(&status) {
            return Err(DeliveryError::Rejected {
                status,
                message: error_message(status, &body),
            });
        }

        serde_json::from_str::<SendEmailResponse>(&body)
            .map(|parsed| parsed.id)
            .map_err(|e| DeliveryError::Transport {
                message: format!("Unexpected response from Resend: {}", e),
            })
    }
}

#[async_trait]
impl DeliveryChannel for ResendDeliveryChannel {
    async fn send(&self, destination: &str, subject: &str, html: &str) -> Result<String, DeliveryError> {
        let request = SendEmailRequest {
            from: &self.config.from_address,
            to: [destination],
            subject,
            html,
        };

        let mut attempts = 0;
        let mut delay = Duration::from_millis(self.config.retry_delay_ms);

        loop {
            attempts += 1;
            debug!(
                email = %mask_email(destination),
                attempt = attempts,
                max_attempts = self.config.max_retries,
                event = "email_send_attempt",
                "Sending email"
            );

            match self.send_once(&request).await {
                Ok(id) => {
                    info!(
                        email = %mask_email(destination),
                        message_id = %id,
                        attempt = attempts,
                        event = "email_sent",
                        "Email sent"
                    );
                    return Ok(id);
                }
                Err(e) => {
                    let retryable = match &e {
                        DeliveryError::Rejected { status, .. } => is_retryable_status(*status),
                        DeliveryError::Transport { .. } => true,
                        DeliveryError::Configuration { .. } => false,
                    };

                    if !retryable || attempts >= self.config.max_retries {
                        error!(
                            email = %mask_email(destination),
                            attempt = attempts,
                            max_attempts = self.config.max_retries,
                            error = %e,
                            event = "email_send_failed",
                            "Failed to send email"
                        );
                        return Err(e);
                    }

                    warn!(
                        email = %mask_email(destination),
                        attempt = attempts,
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        event = "email_send_retry",
                        "Email send failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "resend"
    }
}
