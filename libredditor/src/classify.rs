//! Error classification
//!
//! Maps raw platform failures onto the small, closed set of kinds the retry
//! logic reasons about. Classification is total: every [`PlatformError`]
//! variant has exactly one kind, and anything unrecognised lands in
//! [`ErrorKind::Unknown`].

use serde::Serialize;

use crate::error::PlatformError;

/// Recovery-relevant category of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network, server-side or rate-limit failure; worth retrying
    Transient,
    /// The platform rejected the supplied credentials
    InvalidCredentials,
    /// The account may not access the requested resource
    PermissionDenied,
    /// The requested channel does not exist
    NotFound,
    /// Unrecognised failure; never assumed safe to repeat
    Unknown,
}

impl ErrorKind {
    /// Only transient failures are retried
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Transient)
    }

    pub fn is_fatal(self) -> bool {
        !self.is_retryable()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Transient => "transient",
            ErrorKind::InvalidCredentials => "invalid credentials",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::NotFound => "not found",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a raw platform failure
///
/// # Mapping
///
/// - OAuth / credential rejection → `InvalidCredentials`
/// - Redirect (channel name resolves to search) and HTTP 404 → `NotFound`
/// - HTTP 403 → `PermissionDenied`
/// - HTTP 429, 5xx, other unexpected statuses and transport failures → `Transient`
/// - Malformed payloads and anything else → `Unknown`
pub fn classify(error: &PlatformError) -> ErrorKind {
    match error {
        PlatformError::OAuth(_) => ErrorKind::InvalidCredentials,
        PlatformError::Redirect(_) | PlatformError::NotFound(_) => ErrorKind::NotFound,
        PlatformError::Forbidden(_) => ErrorKind::PermissionDenied,
        PlatformError::TooManyRequests(_)
        | PlatformError::Server { .. }
        | PlatformError::Response { .. }
        | PlatformError::Request(_) => ErrorKind::Transient,
        PlatformError::Decode(_) | PlatformError::Other(_) => ErrorKind::Unknown,
    }
}
