//! HTTP front door for MailGate
//!
//! Exposes the email one-time-code endpoints on top of `mg_core::OtpService`
//! and resolves bearer session tokens.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use app::create_app;
pub use state::AppContext;
