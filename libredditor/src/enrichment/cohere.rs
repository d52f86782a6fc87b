//! Cohere chat API enricher

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EnrichmentConfig;
use crate::enrichment::{Enricher, EnrichmentError, ENV_COHERE_API_KEY};
use crate::error::{body_preview, ConfigError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.cohere.com";
pub const DEFAULT_MODEL: &str = "command-a-03-2025";
pub const DEFAULT_MAX_TOKENS: u32 = 64;
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

/// Prompt sent for a single title
pub fn prompt_for(title: &str) -> String {
    format!(
        "Expound on this Reddit post title in one short paragraph:\n{}",
        title
    )
}

pub struct CohereEnricher {
    client: Client,
    endpoint: String,
    api_key: SecretString,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl CohereEnricher {
    pub fn new(config: &EnrichmentConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| ConfigError::Invalid(format!("enrichment HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/v2/chat", config.base_url.trim_end_matches('/')),
            api_key: SecretString::from(api_key.into()),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Build an enricher from `COHERE_API_KEY`
    ///
    /// Returns `Ok(None)` when the key is unset or empty.
    pub fn from_env(config: &EnrichmentConfig) -> Result<Option<Self>> {
        match std::env::var(ENV_COHERE_API_KEY) {
            Ok(key) if !key.trim().is_empty() => Ok(Some(Self::new(config, key.trim())?)),
            _ => Ok(None),
        }
    }

    async fn request(&self, title: &str) -> std::result::Result<String, EnrichmentError> {
        if title.trim().is_empty() {
            return Err(EnrichmentError::EmptyTitle);
        }

        let prompt = prompt_for(title);
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: &prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        debug!("POST {} ({} chars)", self.endpoint, title.len());

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| EnrichmentError::Request(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| EnrichmentError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(EnrichmentError::Status {
                status: status.as_u16(),
                message: body_preview(&bytes),
            });
        }

        let reply: ChatReply =
            serde_json::from_slice(&bytes).map_err(|e| EnrichmentError::Decode(e.to_string()))?;

        reply
            .message
            .content
            .into_iter()
            .next()
            .map(|part| part.text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(EnrichmentError::EmptyReply)
    }
}

#[async_trait]
impl Enricher for CohereEnricher {
    fn name(&self) -> &str {
        "cohere"
    }

    async fn enrich(&self, title: &str) -> Option<String> {
        match self.request(title).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Enrichment failed for {:?}: {}", title, e);
                None
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: String,
}
