//! CORS configuration for the browser client.
//!
//! The web client is served from a different origin than the API and sends
//! credentials cross-domain, so only configured trusted origins are allowed.

use actix_cors::Cors;
use actix_web::http::{header, Method};

use mg_shared::CorsConfig;

/// Creates a CORS middleware instance allowing only `trusted_origins`.
pub fn create_cors(config: &CorsConfig) -> Cors {
    let trusted = config.clone();

    let mut cors = Cors::default()
        .allowed_origin_fn(move |origin, _req_head| {
            origin
                .to_str()
                .map(|o| trusted.is_trusted(o))
                .unwrap_or(false)
        })
        .allowed_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-requested-with"),
        ])
        .expose_headers(vec![header::HeaderName::from_static("x-request-id")])
        .max_age(config.max_age);

    if config.allow_credentials {
        cors = cors.supports_credentials();
    }

    tracing::info!(
        origins = ?config.trusted_origins,
        credentials = config.allow_credentials,
        "Configured CORS"
    );

    cors
}
