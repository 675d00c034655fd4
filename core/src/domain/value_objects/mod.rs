//! Value objects representing immutable domain concepts.

pub mod session_grant;

pub use session_grant::{SessionGrant, SessionRequest, SessionScope};
