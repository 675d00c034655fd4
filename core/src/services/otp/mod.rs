//! One-time code service for passwordless email authentication
//!
//! This module provides the complete challenge workflow:
//! - CSPRNG code generation and protection at rest (plain, hashed, encrypted)
//! - Issuance with atomic replacement of the previous challenge
//! - Verification with expiry, attempt limiting and single use
//! - Per-purpose challenge flows
//! - Background sweeping of expired challenges

pub mod clock;
pub mod config;
pub mod encryption;
pub mod flows;
pub mod generator;
pub mod protector;
pub mod service;
pub mod sweeper;


pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{OtpConfig, StorageMode};
pub use encryption::{AesGcmCodeCipher, EncryptionKey, KeyManager, KeyRotationConfig};
pub use flows::{ChallengeFlow, ChallengeFlows, EmailVerificationFlow, PasswordResetFlow, SignInFlow};
pub use generator::{CodeGenerator, FixedCodeGenerator, OsRngCodeGenerator};
pub use protector::CodeProtector;
pub use service::{IssuedChallenge, OtpService};
pub use sweeper::{OtpSweeper, SweepResult, SweeperConfig};
