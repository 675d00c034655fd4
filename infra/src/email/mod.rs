//! Email delivery channels
//!
//! - **Resend**: production delivery over the Resend HTTP API
//! - **Log**: writes messages to the log for local development

pub mod log_channel;
pub mod resend;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use mg_core::services::email::DeliveryChannel;
use mg_shared::config::{EmailConfig, EmailProvider};

use crate::InfrastructureError;

pub use log_channel::LogDeliveryChannel;
pub use resend::{ResendConfig, ResendDeliveryChannel};

/// Create the delivery channel selected by `config.provider`
pub fn create_email_channel(config: &EmailConfig) -> Result<Arc<dyn DeliveryChannel>, InfrastructureError> {
    match config.provider {
        EmailProvider::Resend => {
            let resend_config = ResendConfig::from_email_config(config)?;
            Ok(Arc::new(ResendDeliveryChannel::new(resend_config)?))
        }
        EmailProvider::Log => Ok(Arc::new(LogDeliveryChannel::new())),
    }
}
