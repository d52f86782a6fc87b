//! Mock enricher for testing

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::warn;

use crate::enrichment::Enricher;

/// Deterministic enricher that fails for selected titles
#[derive(Debug, Default)]
pub struct MockEnricher {
    failing_titles: HashSet<String>,
    calls: AtomicUsize,
}

impl MockEnricher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make enrichment of `title` fail
    pub fn failing_on(mut self, title: impl Into<String>) -> Self {
        self.failing_titles.insert(title.into());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Text produced for a successfully enriched title
    pub fn expected_text(title: &str) -> String {
        format!("More about: {}", title)
    }
}

#[async_trait]
impl Enricher for MockEnricher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn enrich(&self, title: &str) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if title.trim().is_empty() || self.failing_titles.contains(title) {
            warn!("Mock enrichment failed for {:?}", title);
            return None;
        }

        Some(Self::expected_text(title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_enricher_fails_selected_titles() {
        let enricher = MockEnricher::new().failing_on("bad");

        assert_eq!(
            enricher.enrich("good").await,
            Some("More about: good".to_string())
        );
        assert_eq!(enricher.enrich("bad").await, None);
        assert_eq!(enricher.enrich("  ").await, None);
        assert_eq!(enricher.call_count(), 3);
    }
}
