//! redd-serve - web front end for the Redditor pipeline
//!
//! `GET /` shows the form, `POST /fetch_posts` runs one pipeline per request
//! with a fresh session and renders the result.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use libredditor::config::ServerConfig;
use libredditor::types::DEFAULT_LIMIT;
use libredditor::{Credentials, FetchRequest, Pipeline, RedditorError, SessionError};
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub mod render;

/// Listener and static file settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub bind_address: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

impl ServerSettings {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            bind_address: config.bind_address.clone(),
            port: config.port,
            static_dir: PathBuf::from(shellexpand::tilde(&config.static_dir).to_string()),
        }
    }

    /// Get the full bind address (ip:port)
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub credentials: Arc<Credentials>,
}

impl AppState {
    pub fn new(pipeline: Pipeline, credentials: Credentials) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            credentials: Arc::new(credentials),
        }
    }
}

/// Errors surfaced to the browser
#[derive(Debug)]
pub enum WebError {
    /// The submitted form could not be turned into a fetch request
    InvalidInput(String),
    /// No Reddit session could be established
    Session(SessionError),
}

impl std::fmt::Display for WebError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WebError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            WebError::Session(e) => write!(
                f,
                "Could not sign in to Reddit ({} after {} attempt(s))",
                e.kind(),
                e.attempts()
            ),
        }
    }
}

impl std::error::Error for WebError {}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            WebError::Session(_) => StatusCode::BAD_GATEWAY,
        };

        (status, Html(render::error_page(status, &self.to_string()))).into_response()
    }
}

/// Form fields posted by the index page
#[derive(Debug, Default, Deserialize)]
pub struct FetchForm {
    pub subreddit: Option<String>,
    pub n: Option<String>,
}

impl FetchForm {
    pub fn into_request(self) -> Result<FetchRequest, WebError> {
        let subreddit = self
            .subreddit
            .ok_or_else(|| WebError::InvalidInput("subreddit is required".to_string()))?;

        let limit = match self.n.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_LIMIT,
            Some(n) => n
                .parse::<u32>()
                .map_err(|_| WebError::InvalidInput(format!("n must be a number, got '{}'", n)))?,
        };

        FetchRequest::new(&subreddit, limit).map_err(|e| match e {
            RedditorError::InvalidInput(msg) => WebError::InvalidInput(msg),
            other => WebError::InvalidInput(other.to_string()),
        })
    }
}

/// Create the router with all routes
pub fn app(state: AppState, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/fetch_posts", post(fetch_posts_handler))
        .route("/fetch_posts/", post(fetch_posts_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// GET /
pub async fn index_handler() -> Html<String> {
    Html(render::index(None, None))
}

/// POST /fetch_posts
pub async fn fetch_posts_handler(
    State(state): State<AppState>,
    Form(form): Form<FetchForm>,
) -> Result<Html<String>, WebError> {
    let request = form.into_request().inspect_err(|e| warn!("Rejected form: {}", e))?;

    info!(
        "Fetching {} post(s) from r/{}",
        request.limit(),
        request.channel()
    );

    let posts = state
        .pipeline
        .run(&state.credentials, &request)
        .await
        .map_err(WebError::Session)?;

    Ok(Html(render::index(Some(&request), Some(posts.as_slice()))))
}
