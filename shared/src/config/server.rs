//! Server configuration module

use serde::{Deserialize, Serialize};

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Worker threads (0 = number of CPU cores)
    #[serde(default)]
    pub workers: usize,

    /// Maximum JSON payload size in bytes
    #[serde(default = "default_max_payload_size")]
    pub max_payload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 8080,
            workers: 0,
            max_payload_size: default_max_payload_size(),
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("SERVER_HOST").unwrap_or(defaults.host),
            port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            workers: std::env::var("SERVER_WORKERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.workers),
            max_payload_size: defaults.max_payload_size,
        }
    }

    /// Get the bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// CORS configuration
///
/// The SPA lives on a different origin than the API, so browsers send
/// credentials cross-domain. Only `trusted_origins` may do so.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
    /// Origins allowed to call the API with credentials
    #[serde(default)]
    pub trusted_origins: Vec<String>,

    /// Allow credentials (cookies, authorization headers)
    #[serde(default = "default_allow_credentials")]
    pub allow_credentials: bool,

    /// Max age for preflight cache in seconds
    #[serde(default = "default_max_age")]
    pub max_age: usize,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            trusted_origins: vec![String::from("http://localhost:5173")],
            allow_credentials: default_allow_credentials(),
            max_age: default_max_age(),
        }
    }
}

impl CorsConfig {
    /// Create from environment variables
    ///
    /// `TRUSTED_ORIGINS` is a comma-separated list; `SITE_URL` is always trusted
    /// when set.
    pub fn from_env() -> Self {
        let mut trusted_origins: Vec<String> = std::env::var("TRUSTED_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_default();

        if let Ok(site_url) = std::env::var("SITE_URL") {
            let site_url = site_url.trim().trim_end_matches('/').to_string();
            if !site_url.is_empty() && !trusted_origins.contains(&site_url) {
                trusted_origins.push(site_url);
            }
        }

        if trusted_origins.is_empty() {
            return Self::default();
        }

        Self {
            trusted_origins,
            max_age: std::env::var("CORS_MAX_AGE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_max_age),
            ..Default::default()
        }
    }

    /// Check whether an origin is trusted
    pub fn is_trusted(&self, origin: &str) -> bool {
        let origin = origin.trim_end_matches('/');
        self.trusted_origins.iter().any(|o| o == origin)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

fn default_max_payload_size() -> usize {
    64 * 1024
}

fn default_allow_credentials() -> bool {
    true
}

fn default_max_age() -> usize {
    3600
}
