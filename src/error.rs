//! Error types for the Langfuse web client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The event could not be turned into a request body
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Langfuse answered with a non-success status code
    #[error("HTTP error while fetching Langfuse: {status} and {body}")]
    Http {
        status: u16,
        /// Response body as text, empty when it could not be read
        body: String,
    },

    /// Connection-level failure (DNS, connect, reset, timeout)
    #[error("Network error while fetching Langfuse: {0}")]
    Network(String),

    /// The in-flight attempt was cancelled through its signal
    #[error("Request to Langfuse was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http { .. } => true,
            Error::Network(_) => true,
            Error::Cancelled => true,
            Error::Serialization(_) => false,
            Error::Configuration(_) => false,
        }
    }

    /// HTTP status code, when the failure came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // reqwest errors carry the request URL; the message alone is enough here
        Error::Network(err.without_url().to_string())
    }
}

impl From<reqwest_middleware::Error> for Error {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) => e.into(),
            reqwest_middleware::Error::Middleware(e) => Error::Network(e.to_string()),
        }
    }
}
