use actix_web::{web, HttpResponse};
use std::collections::HashMap;

use mg_shared::{HealthResponse, HealthStatus, ServiceHealth};

use crate::state::AppContext;

/// Health check endpoint handler
///
/// Pings the challenge store; 503 when it is unreachable.
pub async fn health_check(context: web::Data<AppContext>) -> HttpResponse {
    let store = match context.store().ping().await {
        Ok(()) => ServiceHealth::healthy(),
        Err(e) => {
            tracing::warn!(error = %e, "Challenge store health check failed");
            ServiceHealth::unhealthy(e.to_string())
        }
    };

    let mut services = HashMap::new();
    services.insert("otp_store".to_string(), store);

    let response = HealthResponse::from_services(services, env!("CARGO_PKG_VERSION"));
    match response.status {
        HealthStatus::Healthy => HttpResponse::Ok().json(response),
        _ => HttpResponse::ServiceUnavailable().json(response),
    }
}
