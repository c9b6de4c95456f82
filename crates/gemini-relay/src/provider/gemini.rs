//! Gemini REST client
//!
//! Streams `streamGenerateContent?alt=sse` and decodes each SSE event's data
//! as one response chunk. The API key is read from the configured
//! environment variable on every call.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ProviderConfig;
use crate::conversation::Conversation;
use crate::error::{RelayError, Result};

use super::types::{
    CountTokensRequest, CountTokensResponse, GenerateContentRequest, GenerateContentResponse,
};
use super::{ChunkStream, ContentGenerator};

const API_KEY_HEADER: &str = "x-goog-api-key";
const API_VERSION: &str = "v1beta";

/// Gemini provider over HTTP
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: Url,
    model: String,
    api_key_env: String,
}

impl GeminiClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.api_base_url).map_err(|e| {
            RelayError::Config(format!(
                "Invalid provider base URL '{}': {e}",
                config.api_base_url
            ))
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RelayError::Config(format!("Failed to create HTTP client: {e}")))?;

        info!(
            "GeminiClient initialized with model: {}, api_base_url: {}",
            config.model, base_url
        );

        Ok(Self {
            client,
            base_url,
            model: config.model.clone(),
            api_key_env: config.api_key_env.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn api_key(&self) -> Result<String> {
        env::var(&self.api_key_env).map_err(|_| {
            RelayError::Config(format!("API key env var '{}' not set", self.api_key_env))
        })
    }

    /// `{base}/v1beta/models/{model}:{method}`
    pub fn endpoint(&self, method: &str) -> Result<Url> {
        let path = format!("{API_VERSION}/models/{}:{method}", self.model);
        self.base_url
            .join(&path)
            .map_err(|e| RelayError::Config(format!("Invalid endpoint path '{path}': {e}")))
    }

    async fn post<T: serde::Serialize + ?Sized>(
        &self,
        url: Url,
        body: &T,
    ) -> Result<reqwest::Response> {
        let api_key = self.api_key()?;
        debug!("Calling provider at: {}", url);

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(
                status = %status,
                body_length = body.len(),
                "Provider returned error status"
            );
            return Err(RelayError::Upstream { status, body });
        }

        Ok(response)
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn stream_generate(&self, request: &GenerateContentRequest) -> Result<ChunkStream> {
        let mut url = self.endpoint("streamGenerateContent")?;
        url.query_pairs_mut().append_pair("alt", "sse");

        let response = self.post(url, request).await?;

        let chunks = response.bytes_stream().eventsource().map(|event| match event {
            Ok(event) => serde_json::from_str::<GenerateContentResponse>(&event.data)
                .map_err(|e| RelayError::Stream(format!("Failed to decode chunk: {e}"))),
            Err(e) => Err(RelayError::Stream(format!("SSE stream error: {e}"))),
        });

        Ok(chunks.boxed())
    }

    async fn count_tokens(&self, contents: &Conversation) -> Result<u32> {
        let url = self.endpoint("countTokens")?;
        let response = self.post(url, &CountTokensRequest { contents }).await?;

        let counted: CountTokensResponse = response
            .json()
            .await
            .map_err(|e| RelayError::Serialization(format!("Invalid countTokens response: {e}")))?;

        Ok(counted.total_tokens)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
