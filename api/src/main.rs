use actix_web::{web, HttpServer};
use anyhow::Context;

use mg_api::telemetry::init_tracing;
use mg_api::{create_app, AppContext};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = mg_infra::load_config().context("failed to load configuration")?;
    init_tracing(&config.logging)?;

    tracing::info!(
        environment = ?config.environment,
        store = ?config.otp.store,
        storage_mode = %config.otp.storage_mode,
        email_provider = ?config.email.provider,
        "Starting MailGate API server"
    );

    if config.session.is_using_default_secret() {
        if config.environment.is_production() {
            anyhow::bail!("SESSION_SECRET must be set in production");
        }
        tracing::warn!("Using the default session secret; set SESSION_SECRET");
    }

    let context = AppContext::from_config(&config)
        .await
        .context("failed to initialize infrastructure")?;

    let sweeper = std::sync::Arc::new(context.sweeper(config.otp.sweep_interval_seconds));
    let sweep_task = sweeper.start_background_task();

    let bind_address = config.server.bind_address();
    tracing::info!(address = %bind_address, workers = config.server.workers, "Binding HTTP server");

    let data = web::Data::new(context);
    let app_config = config.clone();

    let mut server = HttpServer::new(move || create_app(data.clone(), &app_config));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("failed to bind {}", bind_address))?
        .run()
        .await
        .context("HTTP server error")?;

    if let Some(task) = sweep_task {
        task.abort();
    }

    tracing::info!("MailGate API server stopped");
    Ok(())
}
