pub mod auth;
pub mod cors;

pub use auth::AuthenticatedSession;
pub use cors::create_cors;
