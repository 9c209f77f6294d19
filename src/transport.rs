//! Retrying HTTP dispatch
//!
//! [`Dispatcher::send`] runs one request through a small state machine:
//! attempt, classify, and either finish or wait `retry_delay` and attempt
//! again. A request that keeps failing is tried `retry_count + 1` times in
//! total before the last error is returned.
//!
//! The HTTP call itself goes through the [`Fetch`] trait, implemented for
//! `reqwest::Client` and `reqwest_middleware::ClientWithMiddleware`.

use rand::Rng;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::request::WireRequest;

/// Status and raw body of an HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub text: String,
}

impl FetchResponse {
    pub fn new(status: u16, text: impl Into<String>) -> Self {
        Self {
            status,
            text: text.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body parsed as JSON; an empty body is `null`, non-JSON text becomes a string
    pub fn json(&self) -> Value {
        if self.text.trim().is_empty() {
            return Value::Null;
        }
        serde_json::from_str(&self.text).unwrap_or_else(|_| Value::String(self.text.clone()))
    }

    async fn read(response: reqwest::Response) -> Result<Self> {
        let status = response.status().as_u16();
        let text = response.text().await?;
        Ok(Self { status, text })
    }
}

/// Something that can perform a single HTTP exchange
///
/// Implementations report any received response as `Ok`, whatever its
/// status; classification is left to the [`Dispatcher`]. Connection-level
/// failures are reported as [`Error::Network`].
pub trait Fetch: Send + Sync {
    fn fetch(&self, request: &WireRequest) -> impl Future<Output = Result<FetchResponse>> + Send;
}

impl Fetch for reqwest::Client {
    async fn fetch(&self, request: &WireRequest) -> Result<FetchResponse> {
        let response = self
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone())
            .body(request.body.clone())
            .send()
            .await?;
        FetchResponse::read(response).await
    }
}

impl Fetch for reqwest_middleware::ClientWithMiddleware {
    async fn fetch(&self, request: &WireRequest) -> Result<FetchResponse> {
        let response = self
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone())
            .body(request.body.clone())
            .send()
            .await?;
        FetchResponse::read(response).await
    }
}

impl<T: Fetch> Fetch for Arc<T> {
    fn fetch(&self, request: &WireRequest) -> impl Future<Output = Result<FetchResponse>> + Send {
        (**self).fetch(request)
    }
}

/// Cancellation handle for the in-flight attempt of a request
///
/// Each attempt gets a fresh token, so cancelling only aborts the attempt
/// currently running. The aborted attempt counts as failed and the retry
/// loop carries on; drop the future returned by [`Dispatcher::send`] to
/// stop the whole sequence.
///
/// Clones share the handle. Cloning a [`WireRequest`] does not: the copy
/// gets its own signal.
#[derive(Debug, Clone)]
pub struct AttemptSignal {
    current: Arc<watch::Sender<CancellationToken>>,
}

impl AttemptSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(CancellationToken::new());
        Self {
            current: Arc::new(tx),
        }
    }

    /// Abort the attempt in flight, if any
    pub fn cancel_in_flight(&self) {
        self.current.borrow().cancel();
    }

    /// Install the token for a new attempt
    fn arm(&self) -> CancellationToken {
        let token = CancellationToken::new();
        self.current.send_replace(token.clone());
        token
    }
}

impl Default for AttemptSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Sends requests, retrying failed attempts with a fixed delay
#[derive(Debug, Clone)]
pub struct Dispatcher<F> {
    fetcher: F,
    retry_count: u32,
    retry_delay: Duration,
    retry_jitter: bool,
}

impl<F: Fetch> Dispatcher<F> {
    pub fn new(fetcher: F, retry_count: u32, retry_delay: Duration) -> Self {
        Self {
            fetcher,
            retry_count,
            retry_delay,
            retry_jitter: false,
        }
    }

    /// Dispatcher using the retry settings of `config`
    pub fn from_config(fetcher: F, config: &ClientConfig) -> Self {
        Self {
            fetcher,
            retry_count: config.retry_count,
            retry_delay: config.retry_delay,
            retry_jitter: config.retry_jitter,
        }
    }

    /// Send `request` until it succeeds or the retry budget is spent
    pub async fn send(&self, request: &WireRequest) -> Result<FetchResponse> {
        let mut attempt: u32 = 0;

        loop {
            let token = request.signal.arm();
            debug!(url = %request.url, attempt, "Sending request to Langfuse");

            let outcome = tokio::select! {
                _ = token.cancelled() => Err(Error::Cancelled),
                result = self.fetcher.fetch(request) => result,
            };

            let err = match outcome {
                Ok(response) if response.is_success() => {
                    debug!(url = %request.url, status = response.status, attempt, "Langfuse accepted request");
                    return Ok(response);
                }
                Ok(response) => Error::Http {
                    status: response.status,
                    body: response.text,
                },
                Err(e) => e,
            };

            if !err.is_retryable() || attempt >= self.retry_count {
                error!(
                    url = %request.url,
                    attempts = attempt.saturating_add(1),
                    error = %err,
                    "Request to Langfuse failed"
                );
                return Err(err);
            }

            let delay = self.delay();
            warn!(
                url = %request.url,
                attempt,
                retry_count = self.retry_count,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Attempt failed (retrying)"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    fn delay(&self) -> Duration {
        if !self.retry_jitter {
            return self.retry_delay;
        }
        // 25% jitter
        let jitter_range = u64::try_from(self.retry_delay.as_millis()).unwrap_or(u64::MAX) / 4;
        let jitter = rand::rng().random_range(0..=jitter_range);
        self.retry_delay.saturating_add(Duration::from_millis(jitter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{self, SCORES_PATH};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Replays scripted outcomes and records every request it sees
    struct ScriptedFetch {
        script: Mutex<VecDeque<Result<FetchResponse>>>,
        seen: Mutex<Vec<WireRequest>>,
    }

    impl ScriptedFetch {
        fn new(script: Vec<Result<FetchResponse>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    impl Fetch for ScriptedFetch {
        async fn fetch(&self, request: &WireRequest) -> Result<FetchResponse> {
            self.seen.lock().unwrap().push(request.clone());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(FetchResponse::new(200, "{}")))
        }
    }

    fn score_request() -> WireRequest {
        let config = ClientConfig::new("pk");
        request::build(&config, SCORES_PATH, &json!({"id": "score-1", "name": "test"})).unwrap()
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let fetch = Arc::new(ScriptedFetch::new(vec![Ok(FetchResponse::new(
            200,
            r#"{"id":"score-1"}"#,
        ))]));
        let dispatcher = Dispatcher::new(fetch.clone(), 3, Duration::from_millis(1));

        let response = dispatcher.send(&score_request()).await.unwrap();

        assert_eq!(fetch.calls(), 1);
        assert_eq!(response.json(), json!({"id": "score-1"}));
    }

    #[tokio::test]
    async fn test_terminal_failure_after_retry_budget() {
        let fetch = Arc::new(ScriptedFetch::new(
            (0..10).map(|_| Ok(FetchResponse::new(404, "not found"))).collect(),
        ));
        let dispatcher = Dispatcher::new(fetch.clone(), 2, Duration::from_millis(2));

        let err = dispatcher.send(&score_request()).await.unwrap_err();

        assert_eq!(fetch.calls(), 3);
        assert_eq!(err.status(), Some(404));
        assert!(err
            .to_string()
            .contains("HTTP error while fetching Langfuse: 404"));
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let fetch = Arc::new(ScriptedFetch::new(vec![Ok(FetchResponse::new(500, ""))]));
        let dispatcher = Dispatcher::new(fetch.clone(), 0, Duration::from_millis(1));

        assert!(dispatcher.send(&score_request()).await.is_err());
        assert_eq!(fetch.calls(), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let fetch = Arc::new(ScriptedFetch::new(vec![
            Ok(FetchResponse::new(503, "unavailable")),
            Err(Error::Network("connection reset".to_string())),
            Ok(FetchResponse::new(201, "")),
        ]));
        let dispatcher = Dispatcher::new(fetch.clone(), 3, Duration::from_millis(1));

        let response = dispatcher.send(&score_request()).await.unwrap();

        assert_eq!(fetch.calls(), 3);
        assert_eq!(response.status, 201);
        assert_eq!(response.json(), Value::Null);
    }

    #[tokio::test]
    async fn test_attempts_send_identical_requests() {
        let fetch = Arc::new(ScriptedFetch::new(vec![
            Ok(FetchResponse::new(500, "")),
            Ok(FetchResponse::new(500, "")),
        ]));
        let dispatcher = Dispatcher::new(fetch.clone(), 2, Duration::from_millis(1));
        let request = score_request();

        dispatcher.send(&request).await.unwrap();

        let seen = fetch.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        for sent in seen.iter() {
            assert_eq!(sent.url, request.url);
            assert_eq!(sent.body, request.body);
            assert_eq!(sent.headers, request.headers);
        }
    }

    #[tokio::test]
    async fn test_network_errors_surface_after_budget() {
        let fetch = Arc::new(ScriptedFetch::new(
            (0..3)
                .map(|_| Err(Error::Network("dns error".to_string())))
                .collect(),
        ));
        let dispatcher = Dispatcher::new(fetch.clone(), 1, Duration::from_millis(1));

        let err = dispatcher.send(&score_request()).await.unwrap_err();

        assert_eq!(fetch.calls(), 2);
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn test_non_retryable_error_stops_immediately() {
        let fetch = Arc::new(ScriptedFetch::new(vec![Err(Error::Configuration(
            "bad header".to_string(),
        ))]));
        let dispatcher = Dispatcher::new(fetch.clone(), 5, Duration::from_millis(1));

        let err = dispatcher.send(&score_request()).await.unwrap_err();

        assert_eq!(fetch.calls(), 1);
        assert!(matches!(err, Error::Configuration(_)));
    }

    /// Hangs on the first call until cancelled, succeeds afterwards
    struct HangOnceFetch {
        calls: Mutex<usize>,
        started: Notify,
    }

    impl Fetch for HangOnceFetch {
        async fn fetch(&self, _request: &WireRequest) -> Result<FetchResponse> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                *calls += 1;
                *calls
            };
            self.started.notify_one();
            if call == 1 {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            Ok(FetchResponse::new(200, "{}"))
        }
    }

    #[tokio::test]
    async fn test_cancelling_attempt_retries_instead_of_aborting() {
        let fetch = Arc::new(HangOnceFetch {
            calls: Mutex::new(0),
            started: Notify::new(),
        });
        let dispatcher = Dispatcher::new(fetch.clone(), 2, Duration::from_millis(1));
        let request = score_request();
        let signal = request.signal.clone();

        let (result, _) = tokio::join!(dispatcher.send(&request), async {
            fetch.started.notified().await;
            signal.cancel_in_flight();
        });

        assert!(result.is_ok());
        assert_eq!(*fetch.calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_attempts_exhaust_budget() {
        let fetch = Arc::new(HangOnceFetch {
            calls: Mutex::new(0),
            started: Notify::new(),
        });
        let dispatcher = Dispatcher::new(fetch.clone(), 0, Duration::from_millis(1));
        let request = score_request();
        let signal = request.signal.clone();

        let (result, _) = tokio::join!(dispatcher.send(&request), async {
            fetch.started.notified().await;
            signal.cancel_in_flight();
        });

        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_retry_delay_between_attempts() {
        let fetch = Arc::new(ScriptedFetch::new(
            (0..3).map(|_| Ok(FetchResponse::new(500, ""))).collect(),
        ));
        let dispatcher = Dispatcher::new(fetch.clone(), 2, Duration::from_secs(5));
        let start = tokio::time::Instant::now();

        let err = dispatcher.send(&score_request()).await.unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert_eq!(fetch.calls(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_retry_waits_once() {
        let fetch = Arc::new(ScriptedFetch::new(vec![Ok(FetchResponse::new(502, ""))]));
        let dispatcher = Dispatcher::new(fetch.clone(), 3, Duration::from_secs(3));
        let start = tokio::time::Instant::now();

        dispatcher.send(&score_request()).await.unwrap();

        assert_eq!(fetch.calls(), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    /// Answers every call after a fixed latency
    struct SlowFetch {
        latency: Duration,
    }

    impl Fetch for SlowFetch {
        async fn fetch(&self, _request: &WireRequest) -> Result<FetchResponse> {
            tokio::time::sleep(self.latency).await;
            Ok(FetchResponse::new(200, "{}"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cloned_request_is_cancelled_independently() {
        let dispatcher = Dispatcher::new(
            SlowFetch {
                latency: Duration::from_millis(300),
            },
            0,
            Duration::from_millis(1),
        );
        let original = score_request();
        let copy = original.clone();
        assert_eq!(copy.url, original.url);
        assert_eq!(copy.headers, original.headers);
        assert_eq!(copy.body, original.body);

        let (cancelled, untouched, _) = tokio::join!(
            dispatcher.send(&original),
            dispatcher.send(&copy),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                original.signal.cancel_in_flight();
            }
        );

        assert!(matches!(cancelled, Err(Error::Cancelled)));
        assert!(untouched.is_ok());
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let mut dispatcher = Dispatcher::new(
            Arc::new(ScriptedFetch::new(vec![])),
            1,
            Duration::from_millis(100),
        );
        assert_eq!(dispatcher.delay(), Duration::from_millis(100));

        dispatcher.retry_jitter = true;
        for _ in 0..50 {
            let delay = dispatcher.delay();
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(125));
        }
    }

    #[test]
    fn test_jittered_delay_saturates_instead_of_overflowing() {
        let mut dispatcher = Dispatcher::new(Arc::new(ScriptedFetch::new(vec![])), 1, Duration::MAX);
        dispatcher.retry_jitter = true;

        assert_eq!(dispatcher.delay(), Duration::MAX);
    }
}
