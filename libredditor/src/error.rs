//! Error types for Redditor

use thiserror::Error;

use crate::classify::ErrorKind;

pub type Result<T> = std::result::Result<T, RedditorError>;

#[derive(Error, Debug)]
pub enum RedditorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl RedditorError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            RedditorError::InvalidInput(_) => 3,
            RedditorError::Platform(PlatformError::OAuth(_)) => 2,
            RedditorError::Session(e) if e.kind() == ErrorKind::InvalidCredentials => 2,
            RedditorError::Platform(_) => 1,
            RedditorError::Session(_) => 1,
            RedditorError::Config(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    Invalid(String),
}

/// Raw failure reported by a platform or transport adapter.
///
/// Adapters produce these; [`crate::classify::classify`] maps each one to
/// exactly one [`ErrorKind`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("OAuth failure: {0}")]
    OAuth(String),

    #[error("Redirected: {0}")]
    Redirect(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response (HTTP {status}): {message}")]
    Response { status: u16, message: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("{0}")]
    Other(String),
}

/// Terminal outcome of a retried operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} after {attempts} attempt(s): {source}")]
pub struct RetryFailure {
    /// Classification of the last failure
    pub kind: ErrorKind,
    /// Number of attempts actually made
    pub attempts: u32,
    /// The last raw failure
    pub source: PlatformError,
}

/// A session could not be established
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Authentication failed: {0}")]
pub struct SessionError(#[from] pub RetryFailure);

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        self.0.kind
    }

    pub fn attempts(&self) -> u32 {
        self.0.attempts
    }
}

/// Compact, length-limited rendering of an upstream response body for error messages
pub(crate) fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
