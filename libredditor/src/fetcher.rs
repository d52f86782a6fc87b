//! Content fetching
//!
//! Fetching never fails outward. A channel that cannot be read, or a fetch
//! that keeps failing, yields an empty list and an `error!` log line.

use futures::StreamExt;
use tracing::{error, info};

use crate::error::PlatformError;
use crate::retry::RetryPolicy;
use crate::session::Session;
use crate::types::{FetchRequest, Post};

pub struct ContentFetcher {
    policy: RetryPolicy,
}

impl ContentFetcher {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Fetch up to `request.limit()` of the newest posts of a channel
    ///
    /// Each attempt resolves the channel and then reads the item stream from
    /// the start. A failure part-way through discards everything gathered by
    /// that attempt. Posts keep the platform's order and carry no enrichment.
    pub async fn fetch(&self, session: &Session, request: &FetchRequest) -> Vec<Post> {
        let platform = session.platform();
        let token = session.token();
        let channel = request.channel();
        let limit = request.limit();

        info!("Fetching {} newest post(s) from r/{}", limit, channel);

        let outcome = self
            .policy
            .run("fetch", |_attempt| async move {
                platform.resolve_channel(token, channel).await?;

                let mut items = platform.new_items(token, channel, limit).take(limit as usize);
                let mut posts = Vec::with_capacity(limit as usize);
                while let Some(item) = items.next().await {
                    posts.push(Post::from(item?));
                }
                Ok::<_, PlatformError>(posts)
            })
            .await;

        match outcome {
            Ok(posts) => {
                info!("Fetched {} post(s) from r/{}", posts.len(), channel);
                posts
            }
            Err(failure) => {
                error!(
                    "Failed to fetch posts from r/{} ({}) after {} attempt(s): {}",
                    channel, failure.kind, failure.attempts, failure.source
                );
                Vec::new()
            }
        }
    }
}
