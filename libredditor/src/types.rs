//! Core types for Redditor

use serde::{Deserialize, Serialize};

use crate::error::{RedditorError, Result};

/// Author sentinel used by Reddit for removed accounts
pub const DELETED_AUTHOR: &str = "[deleted]";

pub const DEFAULT_LIMIT: u32 = 5;
pub const MAX_LIMIT: u32 = 100;

/// A validated request for the newest items of one channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    channel: String,
    limit: u32,
}

impl FetchRequest {
    /// Validate and build a request
    ///
    /// The channel may be given as `name`, `r/name` or `/r/name`. Multireddits
    /// joined with `+` are accepted.
    ///
    /// # Errors
    ///
    /// Returns `RedditorError::InvalidInput` for an empty or malformed channel
    /// name, or a limit outside `1..=100`.
    pub fn new(channel: &str, limit: u32) -> Result<Self> {
        if limit == 0 || limit > MAX_LIMIT {
            return Err(RedditorError::InvalidInput(format!(
                "limit must be between 1 and {}, got {}",
                MAX_LIMIT, limit
            )));
        }

        let trimmed = channel.trim();
        let name = trimmed
            .strip_prefix("/r/")
            .or_else(|| trimmed.strip_prefix("r/"))
            .unwrap_or(trimmed)
            .trim_end_matches('/');

        if name.is_empty() {
            return Err(RedditorError::InvalidInput(
                "subreddit name cannot be empty".to_string(),
            ));
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '+')
        {
            return Err(RedditorError::InvalidInput(format!(
                "invalid subreddit name: {}",
                name
            )));
        }

        Ok(Self {
            channel: name.to_string(),
            limit,
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

/// One item as delivered by a platform, before conversion into a [`Post`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Submission {
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    title: String,
    author: String,
    score: i64,
    enrichment: Option<String>,
}

impl Post {
    pub fn new(title: impl Into<String>, author: impl Into<String>, score: i64) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            score,
            enrichment: None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Author name, or `[deleted]` for removed accounts
    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn enrichment(&self) -> Option<&str> {
        self.enrichment.as_deref()
    }

    /// Attach generated text to the post
    ///
    /// Returns `false` and leaves the post untouched if it was already enriched.
    pub fn set_enrichment(&mut self, text: String) -> bool {
        if self.enrichment.is_some() {
            return false;
        }
        self.enrichment = Some(text);
        true
    }
}

impl From<Submission> for Post {
    fn from(submission: Submission) -> Self {
        let author = submission
            .author
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| DELETED_AUTHOR.to_string());

        Post::new(submission.title, author, submission.score)
    }
}
