//! Lightweight Rust client for submitting scores to Langfuse
//!
//! Built for public-key-only contexts: every score becomes a single
//! `POST /api/public/scores` request, sent with a fixed-delay retry loop.
//! Failures surface as an [`Error`] once the retry budget is spent.
//!
//! ```no_run
//! use langfuse_web::{CreateScore, LangfuseWeb};
//!
//! # async fn example() -> langfuse_web::Result<()> {
//! let langfuse = LangfuseWeb::builder().public_key("pk-lf-...").build()?;
//!
//! langfuse
//!     .score(
//!         CreateScore::builder()
//!             .trace_id("trace-1")
//!             .name("user-feedback")
//!             .value(1)
//!             .build(),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod ids;
pub mod request;
pub mod scores;
pub mod transport;

pub use client::LangfuseWeb;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use ids::{generate_id, IdGenerator};
pub use request::WireRequest;
pub use scores::{CreateScore, ScoreDataType, ScoreValue};
pub use transport::{AttemptSignal, Dispatcher, Fetch, FetchResponse};
