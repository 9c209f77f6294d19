//! Client configuration
//!
//! ## Default Configuration
//!
//! | Setting | Default Value | Description |
//! |---------|--------------|-------------|
//! | `base_url` | `https://cloud.langfuse.com` | Langfuse endpoint, used verbatim |
//! | `retry_count` | 3 | Retries after the first attempt |
//! | `retry_delay` | 3 seconds | Fixed wait between attempts |
//! | `request_timeout` | 10 seconds | Per-attempt timeout of the HTTP client |
//! | `retry_jitter` | Disabled | Up to 25% extra random delay per retry |

use reqwest::header::HeaderValue;
use std::time::Duration;

use crate::error::{Error, Result};

/// Production Langfuse endpoint
pub const DEFAULT_BASE_URL: &str = "https://cloud.langfuse.com";

/// Default number of retries after the initial attempt
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// Default delay between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Default timeout for a single attempt
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Immutable configuration owned by [`LangfuseWeb`](crate::LangfuseWeb)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Public key, sent both as `X-Langfuse-Public-Key` and as bearer token
    pub public_key: String,
    /// Base URL, prefixed to every request path without normalization
    pub base_url: String,
    /// Accepted for compatibility with batching clients; scores are sent immediately
    pub flush_at: Option<usize>,
    /// Number of retries after the first attempt
    pub retry_count: u32,
    /// Fixed delay between attempts
    pub retry_delay: Duration,
    /// Timeout applied to each attempt by the HTTP client
    pub request_timeout: Duration,
    /// Add up to 25% random extra delay to each retry
    pub retry_jitter: bool,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the public key
    pub fn new(public_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            flush_at: None,
            retry_count: DEFAULT_RETRY_COUNT,
            retry_delay: DEFAULT_RETRY_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry_jitter: false,
        }
    }

    /// Check that the configuration can produce valid requests
    pub fn validate(&self) -> Result<()> {
        if self.public_key.trim().is_empty() {
            return Err(Error::Configuration("public key must not be empty".to_string()));
        }

        HeaderValue::from_str(&self.public_key).map_err(|_| {
            Error::Configuration("public key contains characters not allowed in headers".to_string())
        })?;

        if self.base_url.is_empty() {
            return Err(Error::Configuration("base URL must not be empty".to_string()));
        }

        Ok(())
    }
}
