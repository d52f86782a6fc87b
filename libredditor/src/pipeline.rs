//! Session, fetch and enrichment stages wired together
//!
//! Only authentication can fail a run. Fetching degrades to an empty list,
//! and enrichment degrades per post.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Config;
use crate::credentials::Credentials;
use crate::enrichment::{CohereEnricher, Enricher, NoopEnricher};
use crate::error::{Result, SessionError};
use crate::fetcher::ContentFetcher;
use crate::platforms::reddit::RedditPlatform;
use crate::platforms::Platform;
use crate::retry::RetryPolicy;
use crate::session::{Session, SessionManager};
use crate::types::{FetchRequest, Post};

pub struct Pipeline {
    sessions: SessionManager,
    fetcher: ContentFetcher,
    enricher: Arc<dyn Enricher>,
}

impl Pipeline {
    pub fn new(platform: Arc<dyn Platform>, enricher: Arc<dyn Enricher>, policy: RetryPolicy) -> Self {
        Self {
            sessions: SessionManager::new(platform, policy),
            fetcher: ContentFetcher::new(policy),
            enricher,
        }
    }

    /// Build the production pipeline: Reddit plus Cohere when a key is available
    ///
    /// Enrichment falls back to [`NoopEnricher`] when it is disabled in the
    /// config or `COHERE_API_KEY` is unset.
    pub fn from_config(config: &Config, credentials: &Credentials) -> Result<Self> {
        let policy = config.retry.policy()?;
        let platform = RedditPlatform::new(&config.reddit, credentials.user_agent())?;

        let enricher: Arc<dyn Enricher> = if config.enrichment.enabled {
            match CohereEnricher::from_env(&config.enrichment)? {
                Some(cohere) => Arc::new(cohere),
                None => {
                    info!("COHERE_API_KEY not set, enrichment disabled");
                    Arc::new(NoopEnricher)
                }
            }
        } else {
            Arc::new(NoopEnricher)
        };

        Ok(Self::new(Arc::new(platform), enricher, policy))
    }

    pub fn enricher_name(&self) -> &str {
        self.enricher.name()
    }

    /// Authenticate once, then fetch and enrich
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if no session could be established. Every
    /// other failure is absorbed.
    pub async fn run(
        &self,
        credentials: &Credentials,
        request: &FetchRequest,
    ) -> std::result::Result<Vec<Post>, SessionError> {
        let session = self.sessions.authenticate(credentials).await?;
        Ok(self.run_with_session(&session, request).await)
    }

    /// Fetch and enrich with an existing session
    pub async fn run_with_session(&self, session: &Session, request: &FetchRequest) -> Vec<Post> {
        let mut posts = self.fetcher.fetch(session, request).await;
        self.enrich_all(&mut posts).await;
        posts
    }

    async fn enrich_all(&self, posts: &mut [Post]) {
        if posts.is_empty() {
            return;
        }

        let mut enriched = 0;
        for post in posts.iter_mut() {
            if let Some(text) = self.enricher.enrich(post.title()).await {
                if post.set_enrichment(text) {
                    enriched += 1;
                }
            }
        }

        debug!(
            "Enriched {}/{} post(s) with {}",
            enriched,
            posts.len(),
            self.enricher.name()
        );
    }
}
