//! Email address utilities

use once_cell::sync::Lazy;
use regex::Regex;

// Pragmatic subset of RFC 5322: one @, no whitespace, dotted domain with a 2+ letter TLD
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*\.[A-Za-z]{2,}$").unwrap()
});

/// Maximum length of an address per RFC 5321
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Normalize an email address: trim surrounding whitespace and lower-case it
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Check if an email address is syntactically valid
pub fn is_valid_email(email: &str) -> bool {
    let normalized = normalize_email(email);
    if normalized.is_empty() || normalized.len() > MAX_EMAIL_LENGTH {
        return false;
    }
    match normalized.split_once('@') {
        Some((local, _)) if local.len() > 64 || local.starts_with('.') || local.ends_with('.') => {
            false
        }
        Some(_) => !normalized.contains("..") && EMAIL_REGEX.is_match(&normalized),
        None => false,
    }
}

/// Mask an email address for logs (e.g., a***e@example.com)
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let chars: Vec<char> = local.chars().collect();
            let masked_local = match chars.len() {
                0 => String::from("***"),
                1 | 2 => format!("{}***", chars[0]),
                n => format!("{}***{}", chars[0], chars[n - 1]),
            };
            format!("{}@{}", masked_local, domain)
        }
        None => String::from("***"),
    }
}
