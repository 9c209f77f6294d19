//! Wire request construction
//!
//! Every submission becomes exactly one [`WireRequest`]: a `POST` to
//! `base_url + path` carrying the JSON body and the authentication and SDK
//! identity headers. The request is never modified afterwards, so all
//! retries of it send the same bytes.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::transport::AttemptSignal;

/// SDK name reported in `X-Langfuse-Sdk-Name`
pub const SDK_NAME: &str = env!("CARGO_PKG_NAME");

/// SDK version reported in `X-Langfuse-Sdk-Version`
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// SDK variant reported in `X-Langfuse-Sdk-Variant`
pub const SDK_VARIANT: &str = "langfuse-frontend";

/// Path of the score creation endpoint
pub const SCORES_PATH: &str = "/api/public/scores";

const PUBLIC_KEY_HEADER: &str = "x-langfuse-public-key";
const SDK_NAME_HEADER: &str = "x-langfuse-sdk-name";
const SDK_VERSION_HEADER: &str = "x-langfuse-sdk-version";
const SDK_VARIANT_HEADER: &str = "x-langfuse-sdk-variant";

/// A fully formed HTTP request, ready to be dispatched
#[derive(Debug)]
pub struct WireRequest {
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: String,
    /// Cancels whichever attempt of this request is in flight
    pub signal: AttemptSignal,
}

impl WireRequest {
    /// Use `signal` to cancel attempts of this request
    pub fn with_signal(mut self, signal: AttemptSignal) -> Self {
        self.signal = signal;
        self
    }
}

impl Clone for WireRequest {
    /// The copy gets a fresh [`AttemptSignal`], so cancelling one request
    /// never aborts the other.
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            method: self.method.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            signal: AttemptSignal::new(),
        }
    }
}

/// Build the request for posting `event` to `path`
///
/// Serialization happens here, so a body that cannot be encoded fails
/// before any network call.
pub fn build<T: Serialize + ?Sized>(
    config: &ClientConfig,
    path: &str,
    event: &T,
) -> Result<WireRequest> {
    let body = serde_json::to_string(event)?;

    Ok(WireRequest {
        url: format!("{}{}", config.base_url, path),
        method: Method::POST,
        headers: headers(&config.public_key)?,
        body,
        signal: AttemptSignal::new(),
    })
}

fn headers(public_key: &str) -> Result<HeaderMap> {
    let invalid_key =
        |_| Error::Configuration("public key contains characters not allowed in headers".to_string());

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        HeaderName::from_static(PUBLIC_KEY_HEADER),
        HeaderValue::from_str(public_key).map_err(invalid_key)?,
    );
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", public_key)).map_err(invalid_key)?,
    );
    headers.insert(HeaderName::from_static(SDK_NAME_HEADER), HeaderValue::from_static(SDK_NAME));
    headers.insert(HeaderName::from_static(SDK_VERSION_HEADER), HeaderValue::from_static(SDK_VERSION));
    headers.insert(HeaderName::from_static(SDK_VARIANT_HEADER), HeaderValue::from_static(SDK_VARIANT));
    Ok(headers)
}
