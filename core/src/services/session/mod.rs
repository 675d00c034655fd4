//! Session establishment after a successful verification

pub mod establisher;
pub mod jwt;

pub use establisher::SessionEstablisher;
pub use jwt::{JwtSessionIssuer, SessionClaims};
