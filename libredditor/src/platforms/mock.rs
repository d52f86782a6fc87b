//! Mock platform implementation for testing
//!
//! A scripted in-memory platform. Each operation consumes the next queued
//! failure, if any, and otherwise succeeds. Call counters let tests check
//! how many attempts the retry logic actually made.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::time::sleep;

use crate::credentials::Credentials;
use crate::error::PlatformError;
use crate::platforms::{AccessToken, Platform, PlatformResult};
use crate::types::Submission;

/// Configuration for mock platform behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Platform name (e.g., "mock-reddit")
    pub name: String,

    /// Account name returned by a successful identity call
    pub username: String,

    /// Items yielded by `new_items`, newest first
    pub items: Vec<Submission>,

    /// Failures returned by successive `connect` calls
    pub connect_failures: VecDeque<PlatformError>,

    /// Failures returned by successive `identity` calls
    pub identity_failures: VecDeque<PlatformError>,

    /// Failures returned by successive `resolve_channel` calls
    pub resolve_failures: VecDeque<PlatformError>,

    /// Failures injected into successive item streams, after the given number of items
    pub stream_failures: VecDeque<(usize, PlatformError)>,

    /// Delay before completing each operation (simulates network latency)
    pub delay: Duration,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            username: "mock_user".to_string(),
            items: Vec::new(),
            connect_failures: VecDeque::new(),
            identity_failures: VecDeque::new(),
            resolve_failures: VecDeque::new(),
            stream_failures: VecDeque::new(),
            delay: Duration::from_millis(0),
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    connect: usize,
    identity: usize,
    resolve: usize,
    stream: usize,
}

/// Mock platform for testing
pub struct MockPlatform {
    name: String,
    config: Mutex<MockConfig>,
    counters: Mutex<Counters>,
}

impl MockPlatform {
    /// Create a new mock platform with the given configuration
    pub fn new(config: MockConfig) -> Self {
        Self {
            name: config.name.clone(),
            config: Mutex::new(config),
            counters: Mutex::new(Counters::default()),
        }
    }

    /// Create a mock platform that always succeeds and serves `items`
    pub fn with_items(items: Vec<Submission>) -> Self {
        Self::new(MockConfig {
            items,
            ..Default::default()
        })
    }

    /// Create a mock platform serving `count` generated items
    pub fn with_generated_items(count: usize) -> Self {
        let items = (0..count)
            .map(|i| Submission {
                title: format!("Post {}", i + 1),
                author: Some(format!("author{}", i + 1)),
                score: (count - i) as i64,
            })
            .collect();
        Self::with_items(items)
    }

    /// Queue a failure for the next `connect` call
    pub fn fail_connect(self, error: PlatformError) -> Self {
        self.lock_config().connect_failures.push_back(error);
        self
    }

    /// Queue a failure for the next `identity` call
    pub fn fail_identity(self, error: PlatformError) -> Self {
        self.lock_config().identity_failures.push_back(error);
        self
    }

    /// Queue a failure for the next `resolve_channel` call
    pub fn fail_resolve(self, error: PlatformError) -> Self {
        self.lock_config().resolve_failures.push_back(error);
        self
    }

    /// Make the next item stream fail after yielding `after` items
    pub fn fail_stream_after(self, after: usize, error: PlatformError) -> Self {
        self.lock_config().stream_failures.push_back((after, error));
        self
    }

    /// Get the number of times connect was called
    pub fn connect_call_count(&self) -> usize {
        self.lock_counters().connect
    }

    /// Get the number of times identity was called
    pub fn identity_call_count(&self) -> usize {
        self.lock_counters().identity
    }

    /// Get the number of times resolve_channel was called
    pub fn resolve_call_count(&self) -> usize {
        self.lock_counters().resolve
    }

    /// Get the number of item streams opened
    pub fn stream_call_count(&self) -> usize {
        self.lock_counters().stream
    }

    fn lock_config(&self) -> std::sync::MutexGuard<'_, MockConfig> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_counters(&self) -> std::sync::MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn simulate_latency(&self) {
        let delay = self.lock_config().delay;
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }
}

#[async_trait]
impl Platform for MockPlatform {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self, _credentials: &Credentials) -> PlatformResult<AccessToken> {
        self.lock_counters().connect += 1;
        self.simulate_latency().await;

        let failure = self.lock_config().connect_failures.pop_front();
        match failure {
            Some(error) => Err(error),
            None => Ok(AccessToken::new("mock-token")),
        }
    }

    async fn identity(&self, _token: &AccessToken) -> PlatformResult<String> {
        self.lock_counters().identity += 1;
        self.simulate_latency().await;

        let mut config = self.lock_config();
        let failure = config.identity_failures.pop_front();
        let username = config.username.clone();
        drop(config);

        match failure {
            Some(error) => Err(error),
            None => Ok(username),
        }
    }

    async fn resolve_channel(&self, _token: &AccessToken, _channel: &str) -> PlatformResult<()> {
        self.lock_counters().resolve += 1;
        self.simulate_latency().await;

        let failure = self.lock_config().resolve_failures.pop_front();
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn new_items<'a>(
        &'a self,
        _token: &'a AccessToken,
        _channel: &'a str,
        _limit: u32,
    ) -> BoxStream<'a, PlatformResult<Submission>> {
        self.lock_counters().stream += 1;

        let mut config = self.lock_config();
        let mut items: Vec<PlatformResult<Submission>> =
            config.items.iter().cloned().map(Ok).collect();

        if let Some((after, error)) = config.stream_failures.pop_front() {
            items.truncate(after);
            items.push(Err(error));
        }

        stream::iter(items).boxed()
    }
}
