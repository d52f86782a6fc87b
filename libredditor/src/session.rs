//! Session establishment
//!
//! A [`Session`] can only be obtained from [`SessionManager::authenticate`],
//! and only after the platform has confirmed the identity behind the token.
//! Holding a `Session` therefore means the credentials were accepted.

use std::fmt;
use std::sync::Arc;

use tracing::{error, info};

use crate::credentials::Credentials;
use crate::error::{PlatformError, SessionError};
use crate::platforms::{AccessToken, Platform};
use crate::retry::RetryPolicy;

/// An authenticated handle on a platform
pub struct Session {
    platform: Arc<dyn Platform>,
    token: AccessToken,
    username: String,
}

impl Session {
    fn authenticated(platform: Arc<dyn Platform>, token: AccessToken, username: String) -> Self {
        Self {
            platform,
            token,
            username,
        }
    }

    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    /// Account name confirmed by the platform
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("platform", &self.platform.name())
            .field("username", &self.username)
            .field("token", &self.token)
            .finish()
    }
}

pub struct SessionManager {
    platform: Arc<dyn Platform>,
    policy: RetryPolicy,
}

impl SessionManager {
    pub fn new(platform: Arc<dyn Platform>, policy: RetryPolicy) -> Self {
        Self { platform, policy }
    }

    /// Exchange credentials for a token and confirm the identity behind it
    ///
    /// Each attempt performs both steps from scratch. Transient failures are
    /// retried according to the policy; any other kind fails immediately.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] with the classified kind of the last
    /// failure and the number of attempts made.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Session, SessionError> {
        let platform = self.platform.as_ref();

        let outcome = self
            .policy
            .run("authentication", |_attempt| async move {
                let token = platform.connect(credentials).await?;
                let username = platform.identity(&token).await?;
                Ok::<_, PlatformError>((token, username))
            })
            .await;

        match outcome {
            Ok((token, username)) => {
                info!(
                    "Authenticated with {} as {}",
                    self.platform.name(),
                    username
                );
                Ok(Session::authenticated(
                    Arc::clone(&self.platform),
                    token,
                    username,
                ))
            }
            Err(failure) => {
                error!(
                    "Authentication with {} failed ({}) after {} attempt(s): {}",
                    self.platform.name(),
                    failure.kind,
                    failure.attempts,
                    failure.source
                );
                Err(SessionError(failure))
            }
        }
    }
}
