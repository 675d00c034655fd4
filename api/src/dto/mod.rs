pub mod auth;

pub use auth::{
    CheckOtpRequest, OtpSubmission, SendOtpRequest, SendOtpResponse, SessionInfo,
    SessionResponse, SessionUser,
};
