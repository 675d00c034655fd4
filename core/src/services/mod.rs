//! Business services containing domain logic and use cases.

pub mod email;
pub mod otp;
pub mod session;

pub use email::{DeliveryChannel, EmailTemplate, Mailer};
pub use otp::{
    ChallengeFlow, ChallengeFlows, CodeProtector, IssuedChallenge, OtpConfig, OtpService,
    OtpSweeper, StorageMode,
};
pub use session::{JwtSessionIssuer, SessionClaims, SessionEstablisher};
