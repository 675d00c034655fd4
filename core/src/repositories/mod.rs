//! Repository interfaces and the in-process store.

pub mod otp;

pub use otp::{InMemoryOtpStore, OtpStore};
