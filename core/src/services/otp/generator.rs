//! Code generation

use rand::{rngs::OsRng, Rng};

/// Source of numeric one-time codes
pub trait CodeGenerator: Send + Sync {
    /// Produce a code of exactly `length` ASCII digits
    fn generate(&self, length: usize) -> String;
}

/// Draws every digit uniformly from the OS CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRngCodeGenerator;

impl CodeGenerator for OsRngCodeGenerator {
    fn generate(&self, length: usize) -> String {
        let mut rng = OsRng;
        (0..length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }
}

/// Always returns the same code, padded or truncated to the requested length.
/// For tests and local development.
#[derive(Debug, Clone)]
pub struct FixedCodeGenerator {
    code: String,
}

impl FixedCodeGenerator {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl CodeGenerator for FixedCodeGenerator {
    fn generate(&self, length: usize) -> String {
        let mut code: String = self.code.chars().take(length).collect();
        while code.len() < length {
            code.push('0');
        }
        code
    }
}
