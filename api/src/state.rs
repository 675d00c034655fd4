//! Application context shared by all handlers

use std::sync::Arc;

use mg_core::services::otp::{OtpSweeper, SweeperConfig};
use mg_core::{JwtSessionIssuer, OtpService, OtpStore};
use mg_infra::InfrastructureError;
use mg_shared::AppConfig;

/// Services handed to every request through `web::Data`.
///
/// Built once at startup; nothing here is global.
#[derive(Clone)]
pub struct AppContext {
    pub otp_service: Arc<OtpService>,
    pub sessions: Arc<JwtSessionIssuer>,
}

impl AppContext {
    pub fn new(otp_service: Arc<OtpService>, sessions: Arc<JwtSessionIssuer>) -> Self {
        Self {
            otp_service,
            sessions,
        }
    }

    /// Wire storage, delivery and sessions from configuration
    pub async fn from_config(config: &AppConfig) -> Result<Self, InfrastructureError> {
        let infra = mg_infra::initialize(config).await?;
        let sessions = Arc::new(JwtSessionIssuer::new(&config.session));

        let otp_service = OtpService::new(
            infra.otp_store,
            infra.delivery,
            sessions.clone(),
            infra.protector,
            infra.otp_config,
        );

        Ok(Self::new(Arc::new(otp_service), sessions))
    }

    pub fn store(&self) -> &Arc<dyn OtpStore> {
        self.otp_service.store()
    }

    /// Sweeper over the same store the service writes to
    pub fn sweeper(&self, interval_seconds: u64) -> OtpSweeper {
        OtpSweeper::new(
            self.store().clone(),
            SweeperConfig::from_interval(interval_seconds),
        )
    }
}
