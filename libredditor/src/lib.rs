//! Redditor - resilient Reddit fetching with best-effort enrichment
//!
//! This library authenticates against Reddit, fetches the newest posts of a
//! subreddit with retry and backoff for transient failures, and optionally
//! expands each title through a generative text service.

pub mod classify;
pub mod config;
pub mod credentials;
pub mod enrichment;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod pipeline;
pub mod platforms;
pub mod retry;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use classify::{classify, ErrorKind};
pub use config::Config;
pub use credentials::Credentials;
pub use error::{ConfigError, PlatformError, RedditorError, Result, RetryFailure, SessionError};
pub use pipeline::Pipeline;
pub use retry::RetryPolicy;
pub use session::{Session, SessionManager};
pub use types::{FetchRequest, Post, Submission};
