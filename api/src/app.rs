//! Application factory
//!
//! Builds the actix-web `App` from an `AppContext` and the loaded
//! configuration. Used by the binary and by the route tests.

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App, Error,
};
use tracing_actix_web::TracingLogger;

use mg_shared::AppConfig;

use crate::handlers::{json_error_handler, not_found};
use crate::middleware::create_cors;
use crate::routes::auth::{
    check_verification_otp, get_session, send_verification_otp, sign_in_email_otp, verify_email,
};
use crate::routes::health_check;
use crate::state::AppContext;

/// Create and configure the application with all dependencies
pub fn create_app(
    context: web::Data<AppContext>,
    config: &AppConfig,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let json_config = web::JsonConfig::default()
        .limit(config.server.max_payload_size)
        .error_handler(json_error_handler);

    App::new()
        .app_data(context)
        .app_data(json_config)
        // Last wrap runs first: requests are traced before CORS checks
        .wrap(create_cors(&config.cors))
        .wrap(TracingLogger::default())
        .configure(configure_routes)
        .default_service(web::route().to(not_found))
}

/// Register `/health` and the `/api/v1/auth` routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check)).service(
        web::scope("/api/v1").service(
            web::scope("/auth")
                .route(
                    "/email-otp/send-verification-otp",
                    web::post().to(send_verification_otp),
                )
                .route(
                    "/email-otp/check-verification-otp",
                    web::post().to(check_verification_otp),
                )
                .route("/email-otp/verify-email", web::post().to(verify_email))
                .route("/sign-in/email-otp", web::post().to(sign_in_email_otp))
                .route("/get-session", web::get().to(get_session)),
        ),
    );
}
