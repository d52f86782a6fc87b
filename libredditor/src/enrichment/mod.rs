//! Best-effort enrichment of post titles
//!
//! An [`Enricher`] turns a title into a short generated paragraph. Failures
//! never propagate: they are logged where they happen and reported as `None`,
//! so one bad title cannot affect the rest of a batch.

use async_trait::async_trait;
use thiserror::Error;

pub mod cohere;

// Mock enricher is available for all builds (not just tests) to support integration tests
pub mod mock;

pub use cohere::CohereEnricher;
pub use mock::MockEnricher;

pub const ENV_COHERE_API_KEY: &str = "COHERE_API_KEY";

/// Reasons an enrichment attempt produced nothing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentError {
    #[error("title is empty")]
    EmptyTitle,

    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed reply: {0}")]
    Decode(String),

    #[error("reply contained no text")]
    EmptyReply,
}

#[async_trait]
pub trait Enricher: Send + Sync {
    fn name(&self) -> &str;

    /// Generate text for `title`, or `None` if nothing could be produced
    async fn enrich(&self, title: &str) -> Option<String>;
}

/// Enricher used when no generative service is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEnricher;

#[async_trait]
impl Enricher for NoopEnricher {
    fn name(&self) -> &str {
        "noop"
    }

    async fn enrich(&self, _title: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_enricher_yields_nothing() {
        let enricher = NoopEnricher;
        assert_eq!(enricher.enrich("Anything at all").await, None);
        assert_eq!(enricher.name(), "noop");
    }

    #[test]
    fn test_enrichment_error_display() {
        let error = EnrichmentError::Status {
            status: 401,
            message: "invalid api token".to_string(),
        };
        assert_eq!(error.to_string(), "HTTP 401: invalid api token");
        assert_eq!(EnrichmentError::EmptyTitle.to_string(), "title is empty");
    }
}
