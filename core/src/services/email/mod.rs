//! Email delivery port, templates and mailer

pub mod delivery;
pub mod mailer;
pub mod templates;

pub use delivery::DeliveryChannel;
pub use mailer::Mailer;
pub use templates::{EmailTemplate, RenderedEmail};
