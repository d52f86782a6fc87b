//! Platform abstraction and implementations
//!
//! A [`Platform`] knows how to exchange account credentials for a bearer
//! token, confirm the identity behind that token, check that a channel exists
//! and stream its newest items. Adapters report raw [`PlatformError`]s; the
//! session and fetch layers classify them and decide whether to retry.
//!
//! # Examples
//!
//! ```no_run
//! use futures::StreamExt;
//! use libredditor::config::RedditConfig;
//! use libredditor::credentials::Credentials;
//! use libredditor::platforms::{reddit::RedditPlatform, Platform};
//!
//! # async fn example() -> libredditor::error::Result<()> {
//! let credentials = Credentials::from_env()?;
//! let platform = RedditPlatform::new(&RedditConfig::default(), credentials.user_agent())?;
//!
//! let token = platform.connect(&credentials).await?;
//! println!("Logged in as {}", platform.identity(&token).await?);
//!
//! platform.resolve_channel(&token, "rust").await?;
//! let mut items = platform.new_items(&token, "rust", 5);
//! while let Some(item) = items.next().await {
//!     println!("{}", item?.title);
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;

use async_trait::async_trait;
use futures::stream::BoxStream;
use secrecy::{ExposeSecret, SecretString};

use crate::credentials::Credentials;
use crate::error::PlatformError;
use crate::types::Submission;

pub mod reddit;

// Mock platform is available for all builds (not just tests) to support integration tests
pub mod mock;

pub type PlatformResult<T> = std::result::Result<T, PlatformError>;

/// Bearer token obtained from the credential exchange
pub struct AccessToken(SecretString);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Unified interface to a content platform
#[async_trait]
pub trait Platform: Send + Sync {
    /// Lowercase identifier for the platform (e.g. "reddit")
    fn name(&self) -> &str;

    /// Exchange account credentials for a bearer token
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::OAuth` when the platform rejects the
    /// credentials, or a transport/status error otherwise.
    async fn connect(&self, credentials: &Credentials) -> PlatformResult<AccessToken>;

    /// Confirm the account behind `token` and return its name
    async fn identity(&self, token: &AccessToken) -> PlatformResult<String>;

    /// Check that `channel` exists and is readable
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Redirect` or `PlatformError::NotFound` for a
    /// channel that does not exist, `PlatformError::Forbidden` for one the
    /// account may not read.
    async fn resolve_channel(&self, token: &AccessToken, channel: &str) -> PlatformResult<()>;

    /// Stream the newest items of `channel`, most recent first
    ///
    /// `limit` is a hint for page sizing; the stream may yield more items than
    /// asked for and callers stop reading once they have enough. A failure
    /// ends the stream.
    fn new_items<'a>(
        &'a self,
        token: &'a AccessToken,
        channel: &'a str,
        limit: u32,
    ) -> BoxStream<'a, PlatformResult<Submission>>;
}
