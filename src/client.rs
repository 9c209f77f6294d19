//! Main client for submitting scores to Langfuse

use bon::bon;
use std::time::Duration;
use tracing::debug;

use crate::config::{ClientConfig, DEFAULT_BASE_URL};
use crate::error::{Error, Result};
use crate::ids::generate_id;
use crate::request::{self, SCORES_PATH, SDK_NAME, SDK_VARIANT, SDK_VERSION};
use crate::scores::CreateScore;
use crate::transport::{AttemptSignal, Dispatcher, Fetch};

/// Client for the browser-facing part of the Langfuse API
///
/// Only needs a public key and only exposes [`score`](LangfuseWeb::score);
/// traces and observations are ingested with secret-key clients.
#[derive(Debug, Clone)]
pub struct LangfuseWeb<F = reqwest::Client> {
    config: ClientConfig,
    dispatcher: Dispatcher<F>,
}

#[bon]
impl LangfuseWeb {
    /// Create a new client with the given public key
    #[builder]
    pub fn new(
        #[builder(into)] public_key: String,
        #[builder(into, default = String::from(DEFAULT_BASE_URL))] base_url: String,
        flush_at: Option<usize>,
        retry_count: Option<u32>,
        retry_delay: Option<Duration>,
        request_timeout: Option<Duration>,
        #[builder(default)] retry_jitter: bool,
        #[builder(into)] user_agent: Option<String>,
    ) -> Result<Self> {
        let defaults = ClientConfig::new(public_key);
        let config = ClientConfig {
            base_url,
            flush_at,
            retry_count: retry_count.unwrap_or(defaults.retry_count),
            retry_delay: retry_delay.unwrap_or(defaults.retry_delay),
            request_timeout: request_timeout.unwrap_or(defaults.request_timeout),
            retry_jitter,
            ..defaults
        };
        config.validate()?;

        let user_agent = user_agent.unwrap_or_else(|| format!("{}/{} (Rust)", SDK_NAME, SDK_VERSION));
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::from_config(config, http))
    }

    /// Create a new Langfuse client from environment variables
    ///
    /// Reads from:
    /// - `LANGFUSE_PUBLIC_KEY`: Required public key
    /// - `LANGFUSE_BASE_URL`: Optional base URL (defaults to <https://cloud.langfuse.com>)
    pub fn from_env() -> Result<Self> {
        use std::env;

        let public_key = env::var("LANGFUSE_PUBLIC_KEY").map_err(|_| {
            Error::Configuration("LANGFUSE_PUBLIC_KEY environment variable not set".to_string())
        })?;

        let base_url =
            env::var("LANGFUSE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Self::builder()
            .public_key(public_key)
            .base_url(base_url)
            .build()
    }
}

impl<F: Fetch> LangfuseWeb<F> {
    /// Names of the submission operations this client supports
    pub const SUPPORTED_OPERATIONS: &'static [&'static str] = &["score"];

    /// Create a client from an explicit configuration and HTTP collaborator
    pub fn from_config(config: ClientConfig, fetcher: F) -> Self {
        let dispatcher = Dispatcher::from_config(fetcher, &config);
        Self { config, dispatcher }
    }

    /// Swap the HTTP collaborator, e.g. for a `reqwest_middleware` client
    pub fn with_fetcher<G: Fetch>(self, fetcher: G) -> LangfuseWeb<G> {
        LangfuseWeb::from_config(self.config, fetcher)
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn public_key(&self) -> &str {
        &self.config.public_key
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// SDK variant sent in `X-Langfuse-Sdk-Variant`
    pub fn library_id(&self) -> &'static str {
        SDK_VARIANT
    }

    /// SDK version sent in `X-Langfuse-Sdk-Version`
    pub fn library_version(&self) -> &'static str {
        SDK_VERSION
    }

    /// Submit a score
    ///
    /// A missing `id` is generated; a supplied one is sent as is. Resolves
    /// once Langfuse accepts the score, or with the last error after all
    /// retries failed.
    pub async fn score(&self, score: CreateScore) -> Result<()> {
        self.score_with_signal(score, AttemptSignal::new()).await
    }

    /// Submit a score whose attempts can be cancelled through `signal`
    ///
    /// Keep a clone of `signal` and call
    /// [`cancel_in_flight`](AttemptSignal::cancel_in_flight) to abort the
    /// running attempt; it counts as failed and is retried like any other.
    /// Each submission should get its own signal.
    pub async fn score_with_signal(&self, score: CreateScore, signal: AttemptSignal) -> Result<()> {
        let score = CreateScore {
            id: Some(score.id.unwrap_or_else(generate_id)),
            ..score
        };

        let request = request::build(&self.config, SCORES_PATH, &score)?.with_signal(signal);
        debug!(trace_id = %score.trace_id, name = %score.name, "Submitting score");

        self.dispatcher.send(&request).await.map(|_| ())
    }
}
