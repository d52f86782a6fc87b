//! Reddit account credentials
//!
//! Credentials are read once from the environment and never change afterwards.
//! The client secret and account password are held as [`SecretString`] so
//! they are zeroed on drop and never appear in `Debug` output or logs.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::error::{ConfigError, Result};

pub const ENV_CLIENT_ID: &str = "REDDIT_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "REDDIT_CLIENT_SECRET";
pub const ENV_USER_AGENT: &str = "REDDIT_USER_AGENT";
pub const ENV_USERNAME: &str = "REDDIT_USERNAME";
pub const ENV_PASSWORD: &str = "REDDIT_PASSWORD";

pub struct Credentials {
    client_id: String,
    client_secret: SecretString,
    user_agent: String,
    username: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        user_agent: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
            user_agent: user_agent.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Load credentials from the `REDDIT_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load credentials through an arbitrary key lookup
    ///
    /// Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| -> std::result::Result<String, ConfigError> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingField(key.to_string()))
        };

        Ok(Self::new(
            require(ENV_CLIENT_ID)?,
            require(ENV_CLIENT_SECRET)?,
            require(ENV_USER_AGENT)?,
            require(ENV_USERNAME)?,
            require(ENV_PASSWORD)?,
        ))
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        self.client_secret.expose_secret()
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("user_agent", &self.user_agent)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (client {})", self.username, self.client_id)
    }
}
