//! Reddit platform implementation
//!
//! Talks to the Reddit OAuth API with a script-app password grant. Redirects
//! are never followed: Reddit answers a request for a subreddit that does not
//! exist with a redirect to its search page, and that redirect is reported as
//! [`PlatformError::Redirect`].

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::{redirect, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::RedditConfig;
use crate::credentials::Credentials;
use crate::error::{body_preview, PlatformError, RedditorError, Result};
use crate::platforms::{AccessToken, Platform, PlatformResult};
use crate::types::{Submission, MAX_LIMIT};

pub struct RedditPlatform {
    client: Client,
    api_base: String,
    auth_base: String,
}

impl RedditPlatform {
    /// Create a new Reddit platform instance
    ///
    /// Every request carries `user_agent`; Reddit throttles or blocks clients
    /// that send a generic one.
    pub fn new(config: &RedditConfig, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(config.timeout))
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| {
                RedditorError::Platform(PlatformError::Other(format!(
                    "Failed to build HTTP client: {}",
                    e
                )))
            })?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            auth_base: config.auth_base.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &AccessToken,
        path: &str,
        query: &[(&str, &str)],
    ) -> PlatformResult<T> {
        let url = format!("{}{}", self.api_base, path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token.expose())
            .query(&[("raw_json", "1")])
            .query(query)
            .send()
            .await
            .map_err(map_transport_error)?;

        let body = read_body(response, path).await?;
        decode(&body, path)
    }

    async fn fetch_page(
        &self,
        token: &AccessToken,
        channel: &str,
        after: Option<&str>,
        page_size: u32,
    ) -> PlatformResult<ListingData> {
        let path = format!("/r/{}/new", channel);
        let limit = page_size.to_string();

        let mut query = vec![("limit", limit.as_str())];
        if let Some(after) = after {
            query.push(("after", after));
        }

        let listing: Listing = self.get_json(token, &path, &query).await?;
        Ok(listing.data)
    }
}

#[async_trait]
impl Platform for RedditPlatform {
    fn name(&self) -> &str {
        "reddit"
    }

    async fn connect(&self, credentials: &Credentials) -> PlatformResult<AccessToken> {
        let url = format!("{}/api/v1/access_token", self.auth_base);

        let response = self
            .client
            .post(&url)
            .basic_auth(credentials.client_id(), Some(credentials.client_secret()))
            .form(&[
                ("grant_type", "password"),
                ("username", credentials.username()),
                ("password", credentials.password()),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let body = read_body(response, "token exchange").await?;
        let reply: TokenReply = decode(&body, "token exchange")?;

        // Reddit reports a rejected password grant as HTTP 200 with an error field
        if let Some(error) = reply.error {
            return Err(PlatformError::OAuth(error));
        }

        reply
            .access_token
            .filter(|t| !t.is_empty())
            .map(AccessToken::new)
            .ok_or_else(|| PlatformError::Decode("token exchange: missing access_token".to_string()))
    }

    async fn identity(&self, token: &AccessToken) -> PlatformResult<String> {
        let me: Identity = self.get_json(token, "/api/v1/me", &[]).await?;
        Ok(me.name)
    }

    async fn resolve_channel(&self, token: &AccessToken, channel: &str) -> PlatformResult<()> {
        let path = format!("/r/{}/about", channel);
        let about: Thing = self.get_json(token, &path, &[]).await?;

        // Unknown names may come back as a search listing instead of a redirect
        if about.kind == "Listing" {
            return Err(PlatformError::Redirect(format!(
                "/r/{} resolved to a search listing",
                channel
            )));
        }

        Ok(())
    }

    fn new_items<'a>(
        &'a self,
        token: &'a AccessToken,
        channel: &'a str,
        limit: u32,
    ) -> BoxStream<'a, PlatformResult<Submission>> {
        let start = Some(Cursor {
            after: None,
            remaining: limit.max(1),
        });

        stream::unfold(start, move |cursor| async move {
            let Some(cursor) = cursor else {
                return None;
            };
            let page_size = cursor.remaining.min(MAX_LIMIT);

            match self
                .fetch_page(token, channel, cursor.after.as_deref(), page_size)
                .await
            {
                Ok(page) => {
                    let fetched = page.children.len() as u32;
                    let next = match page.after {
                        Some(after) if fetched > 0 && fetched < cursor.remaining => Some(Cursor {
                            after: Some(after),
                            remaining: cursor.remaining - fetched,
                        }),
                        _ => None,
                    };
                    let items: Vec<PlatformResult<Submission>> =
                        page.children.into_iter().map(|child| Ok(child.data)).collect();
                    Some((items, next))
                }
                Err(e) => Some((vec![Err(e)], None)),
            }
        })
        .flat_map(stream::iter)
        .boxed()
    }
}

struct Cursor {
    after: Option<String>,
    remaining: u32,
}

#[derive(Debug, Deserialize)]
struct TokenReply {
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Identity {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Thing {
    kind: String,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    after: Option<String>,
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Submission,
}

async fn read_body(response: reqwest::Response, context: &str) -> PlatformResult<Vec<u8>> {
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await.map_err(map_transport_error)?;

    if !status.is_success() {
        return Err(map_status_error(status, &headers, &body, context));
    }

    Ok(body.to_vec())
}

fn decode<T: DeserializeOwned>(body: &[u8], context: &str) -> PlatformResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| PlatformError::Decode(format!("{}: {}", context, e)))
}

/// Map a reqwest failure to a platform error
///
/// Only failures on the wire are `Request`. A request that could not be built
/// (a malformed base URL, say) is a local problem and maps to `Other`.
fn map_transport_error(error: reqwest::Error) -> PlatformError {
    if error.is_builder() {
        PlatformError::Other(format!("invalid request: {}", error))
    } else if error.is_timeout() {
        PlatformError::Request(format!("timed out: {}", error))
    } else {
        PlatformError::Request(error.to_string())
    }
}

/// Map a non-success HTTP status to a platform error
fn map_status_error(
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
    context: &str,
) -> PlatformError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        context.to_string()
    } else {
        format!("{}: {}", context, preview)
    };

    match status {
        _ if status.is_redirection() => {
            let location = headers
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown location");
            PlatformError::Redirect(format!("{} -> {}", context, location))
        }
        StatusCode::UNAUTHORIZED => PlatformError::OAuth(message),
        StatusCode::FORBIDDEN => PlatformError::Forbidden(message),
        StatusCode::NOT_FOUND => PlatformError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => PlatformError::TooManyRequests(message),
        _ if status.is_server_error() => PlatformError::Server {
            status: status.as_u16(),
            message,
        },
        _ => PlatformError::Response {
            status: status.as_u16(),
            message,
        },
    }
}
