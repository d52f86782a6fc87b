//! Integration tests for the session/fetch/enrich pipeline
//!
//! Runs entirely against the in-memory mock platform and enricher, with the
//! tokio clock paused so backoff delays are measured exactly.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use libredditor::enrichment::{MockEnricher, NoopEnricher};
use libredditor::platforms::mock::MockPlatform;
use libredditor::{
    Credentials, ErrorKind, FetchRequest, Pipeline, PlatformError, RetryPolicy, SessionManager,
};
use tokio::time::Instant;
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

const BASE: Duration = Duration::from_secs(2);
const SLACK: Duration = Duration::from_millis(100);

fn credentials() -> Credentials {
    Credentials::new("client", "secret", "redditor-tests/0.1", "tester", "hunter2")
}

fn transient() -> PlatformError {
    PlatformError::Server {
        status: 503,
        message: "service unavailable".to_string(),
    }
}

/// Records the level and message of every event emitted on the test thread
#[derive(Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<(Level, String)>>>);

impl LogCapture {
    fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let guard =
            tracing::subscriber::set_default(tracing_subscriber::registry().with(capture.clone()));
        (capture, guard)
    }

    fn messages(&self, level: Level) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    fn count(&self, level: Level) -> usize {
        self.messages(level).len()
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        struct Message(String);
        impl Visit for Message {
            fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
                if field.name() == "message" {
                    self.0 = format!("{value:?}");
                }
            }
        }

        let mut message = Message(String::new());
        event.record(&mut message);
        self.0
            .lock()
            .unwrap()
            .push((*event.metadata().level(), message.0));
    }
}

fn pipeline(platform: Arc<MockPlatform>, enricher: Arc<MockEnricher>) -> Pipeline {
    Pipeline::new(platform, enricher, RetryPolicy::default())
}

#[tokio::test(start_paused = true)]
async fn test_invalid_credentials_fail_first_attempt_without_delay() {
    let platform = Arc::new(
        MockPlatform::with_generated_items(5)
            .fail_identity(PlatformError::OAuth("invalid_grant".to_string())),
    );
    let enricher = Arc::new(MockEnricher::new());
    let start = Instant::now();

    let error = pipeline(platform.clone(), enricher.clone())
        .run(&credentials(), &FetchRequest::new("rust", 5).unwrap())
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::InvalidCredentials);
    assert_eq!(error.attempts(), 1);
    assert!(start.elapsed() < SLACK);
    assert_eq!(platform.resolve_call_count(), 0);
    assert_eq!(enricher.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_authenticate_recovers_after_two_transient_failures() {
    let platform = Arc::new(
        MockPlatform::with_generated_items(0)
            .fail_connect(transient())
            .fail_identity(PlatformError::Request("connection reset".to_string())),
    );
    let manager = SessionManager::new(platform.clone(), RetryPolicy::default());
    let start = Instant::now();

    let session = manager.authenticate(&credentials()).await.unwrap();

    assert_eq!(session.username(), "mock_user");
    // connect fails on 1, identity fails on 2, both succeed on 3
    assert_eq!(platform.connect_call_count(), 3);
    assert_eq!(platform.identity_call_count(), 2);

    let elapsed = start.elapsed();
    assert!(elapsed >= BASE * 3, "{elapsed:?}");
    assert!(elapsed < BASE * 3 + SLACK, "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_fetch_recovers_after_two_transient_failures() {
    let platform = Arc::new(
        MockPlatform::with_generated_items(5)
            .fail_resolve(PlatformError::TooManyRequests("ratelimit".to_string()))
            .fail_stream_after(2, transient()),
    );
    let pipeline = pipeline(platform.clone(), Arc::new(MockEnricher::new()));
    let session = SessionManager::new(platform.clone(), RetryPolicy::default())
        .authenticate(&credentials())
        .await
        .unwrap();
    let (logs, _guard) = LogCapture::install();
    let start = Instant::now();

    let posts = pipeline
        .run_with_session(&session, &FetchRequest::new("rust", 5).unwrap())
        .await;

    assert_eq!(posts.len(), 5);
    assert_eq!(platform.resolve_call_count(), 3);
    assert_eq!(platform.stream_call_count(), 2);

    let warnings = logs.messages(Level::WARN);
    assert_eq!(warnings.len(), 2, "{warnings:?}");
    assert!(warnings.iter().all(|w| w.contains("during fetch")));
    assert_eq!(logs.count(Level::ERROR), 0);

    let elapsed = start.elapsed();
    assert!(elapsed >= BASE * 3, "{elapsed:?}");
    assert!(elapsed < BASE * 3 + SLACK, "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_authentication_exhaustion_fails() {
    let platform = Arc::new(
        MockPlatform::with_generated_items(5)
            .fail_connect(transient())
            .fail_connect(transient())
            .fail_connect(transient()),
    );

    let error = pipeline(platform.clone(), Arc::new(MockEnricher::new()))
        .run(&credentials(), &FetchRequest::new("rust", 5).unwrap())
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Transient);
    assert_eq!(error.attempts(), 3);
    assert_eq!(platform.connect_call_count(), 3);
    assert_eq!(platform.identity_call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_exhaustion_returns_empty() {
    let platform = Arc::new(
        MockPlatform::with_generated_items(5)
            .fail_stream_after(4, transient())
            .fail_stream_after(1, transient())
            .fail_stream_after(0, transient()),
    );
    let enricher = Arc::new(MockEnricher::new());

    let posts = pipeline(platform.clone(), enricher.clone())
        .run(&credentials(), &FetchRequest::new("rust", 5).unwrap())
        .await
        .unwrap();

    assert!(posts.is_empty());
    assert_eq!(platform.stream_call_count(), 3);
    assert_eq!(enricher.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_never_fails_for_any_error() {
    let failures = [
        PlatformError::OAuth("token revoked".to_string()),
        PlatformError::Redirect("/subreddits/search".to_string()),
        PlatformError::Forbidden("private".to_string()),
        PlatformError::NotFound("banned".to_string()),
        PlatformError::TooManyRequests("slow down".to_string()),
        transient(),
        PlatformError::Response {
            status: 418,
            message: "teapot".to_string(),
        },
        PlatformError::Request("dns".to_string()),
        PlatformError::Decode("expected value".to_string()),
        PlatformError::Other("???".to_string()),
    ];

    for failure in failures {
        let mut platform = MockPlatform::with_generated_items(3);
        for _ in 0..3 {
            platform = platform.fail_resolve(failure.clone());
        }
        let platform = Arc::new(platform);

        let posts = pipeline(platform, Arc::new(MockEnricher::new()))
            .run(&credentials(), &FetchRequest::new("rust", 3).unwrap())
            .await
            .unwrap();

        assert!(posts.is_empty(), "{failure}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_missing_channel_is_empty_immediately() {
    for failure in [
        PlatformError::Redirect("/subreddits/search".to_string()),
        PlatformError::NotFound("no such subreddit".to_string()),
    ] {
        let platform = Arc::new(MockPlatform::with_generated_items(5).fail_resolve(failure));
        let (logs, _guard) = LogCapture::install();
        let start = Instant::now();

        let posts = pipeline(platform.clone(), Arc::new(MockEnricher::new()))
            .run(&credentials(), &FetchRequest::new("nosuchsub", 5).unwrap())
            .await
            .unwrap();

        assert!(posts.is_empty());
        assert_eq!(platform.resolve_call_count(), 1);
        assert!(start.elapsed() < SLACK);

        // Not found is never retried: no warnings, one error for the fetch
        assert_eq!(logs.count(Level::WARN), 0);
        assert_eq!(logs.count(Level::ERROR), 1);
        assert_eq!(
            logs.messages(Level::INFO)
                .iter()
                .filter(|m| m.starts_with("Authenticated with"))
                .count(),
            1
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_enrichment_failure_is_isolated() {
    let platform = Arc::new(MockPlatform::with_generated_items(5));
    let enricher = Arc::new(MockEnricher::new().failing_on("Post 3"));

    let posts = pipeline(platform, enricher.clone())
        .run(&credentials(), &FetchRequest::new("rust", 5).unwrap())
        .await
        .unwrap();

    assert_eq!(posts.len(), 5);
    assert_eq!(enricher.call_count(), 5);

    let missing: Vec<_> = posts
        .iter()
        .filter(|p| p.enrichment().is_none())
        .map(|p| p.title())
        .collect();
    assert_eq!(missing, ["Post 3"]);
}

#[tokio::test(start_paused = true)]
async fn test_full_success_keeps_native_order() {
    let platform = Arc::new(MockPlatform::with_generated_items(5));

    let posts = pipeline(platform, Arc::new(MockEnricher::new()))
        .run(&credentials(), &FetchRequest::new("rust", 5).unwrap())
        .await
        .unwrap();

    let titles: Vec<_> = posts.iter().map(|p| p.title()).collect();
    assert_eq!(titles, ["Post 1", "Post 2", "Post 3", "Post 4", "Post 5"]);

    for post in &posts {
        assert_eq!(
            post.enrichment(),
            Some(MockEnricher::expected_text(post.title()).as_str())
        );
    }
    assert_eq!(posts[0].author(), "author1");
    assert_eq!(posts[0].score(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_noop_enricher_leaves_posts_bare() {
    let platform = Arc::new(MockPlatform::with_generated_items(2));
    let pipeline = Pipeline::new(platform, Arc::new(NoopEnricher), RetryPolicy::default());

    let posts = pipeline
        .run(&credentials(), &FetchRequest::new("rust", 2).unwrap())
        .await
        .unwrap();

    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| p.enrichment().is_none()));
    assert_eq!(pipeline.enricher_name(), "noop");
}

#[tokio::test(start_paused = true)]
async fn test_backoff_multiplier_scales_delays() {
    let platform = Arc::new(
        MockPlatform::with_generated_items(0)
            .fail_connect(transient())
            .fail_connect(transient()),
    );
    let policy = RetryPolicy::new(3, Duration::from_secs(1), 3).unwrap();
    let start = Instant::now();

    SessionManager::new(platform, policy)
        .authenticate(&credentials())
        .await
        .unwrap();

    // 1s × 1 × 3 + 1s × 2 × 3
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(9), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(9) + SLACK, "{elapsed:?}");
}
