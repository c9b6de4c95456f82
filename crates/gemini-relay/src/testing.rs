//! Test utilities for gemini-relay - a scripted provider
//!
//! [`ScriptedGenerator`] replays a fixed list of chunks (and optional
//! failures) without touching the network, and records every request it
//! receives so tests can assert on the normalized conversation.

use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use reqwest::StatusCode;

use crate::conversation::Conversation;
use crate::error::{RelayError, Result};
use crate::provider::{ChunkStream, ContentGenerator, GenerateContentRequest, GenerateContentResponse};

#[derive(Debug, Clone)]
enum Step {
    Chunk(GenerateContentResponse),
    Fail(String),
}

/// Mock provider that streams a scripted sequence of chunks
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    steps: Vec<Step>,
    rejection: Option<(StatusCode, String)>,
    token_count: Option<u32>,
    requests: Mutex<Vec<GenerateContentRequest>>,
    counted: Mutex<Vec<Conversation>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk carrying one text part
    pub fn text(self, text: &str) -> Self {
        self.chunk(GenerateContentResponse::from_text(text))
    }

    /// Append an arbitrary chunk
    pub fn chunk(mut self, chunk: GenerateContentResponse) -> Self {
        self.steps.push(Step::Chunk(chunk));
        self
    }

    /// Append a chunk with an empty candidate list
    pub fn empty_chunk(self) -> Self {
        self.chunk(GenerateContentResponse {
            candidates: Some(Vec::new()),
            prompt_feedback: None,
        })
    }

    /// Append a mid-stream failure
    pub fn fail(mut self, message: &str) -> Self {
        self.steps.push(Step::Fail(message.to_string()));
        self
    }

    /// Reject the request before any chunk is produced
    pub fn reject(mut self, status: StatusCode, body: &str) -> Self {
        self.rejection = Some((status, body.to_string()));
        self
    }

    /// Answer `count_tokens` with this value; fails when unset
    pub fn with_token_count(mut self, count: u32) -> Self {
        self.token_count = Some(count);
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<GenerateContentRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Conversations passed to `count_tokens` so far
    pub fn counted(&self) -> Vec<Conversation> {
        self.counted
            .lock()
            .map(|c| c.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// The conversation of the most recent request
    pub fn last_contents(&self) -> Option<Conversation> {
        self.requests().pop().map(|r| r.contents)
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn stream_generate(&self, request: &GenerateContentRequest) -> Result<ChunkStream> {
        match self.requests.lock() {
            Ok(mut requests) => requests.push(request.clone()),
            Err(poisoned) => poisoned.into_inner().push(request.clone()),
        }

        if let Some((status, body)) = &self.rejection {
            return Err(RelayError::Upstream {
                status: *status,
                body: body.clone(),
            });
        }

        let items: Vec<Result<GenerateContentResponse>> = self
            .steps
            .iter()
            .map(|step| match step {
                Step::Chunk(chunk) => Ok(chunk.clone()),
                Step::Fail(message) => Err(RelayError::Stream(message.clone())),
            })
            .collect();

        Ok(stream::iter(items).boxed())
    }

    async fn count_tokens(&self, contents: &Conversation) -> Result<u32> {
        match self.counted.lock() {
            Ok(mut counted) => counted.push(contents.clone()),
            Err(poisoned) => poisoned.into_inner().push(contents.clone()),
        }

        self.token_count
            .ok_or_else(|| RelayError::Network("token counting not scripted".to_string()))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Turn;
    use crate::provider::GenerationConfig;
    use serde_json::Number;

    fn request() -> GenerateContentRequest {
        GenerateContentRequest {
            contents: Conversation::new(vec![Turn::user("x")]),
            safety_settings: Vec::new(),
            generation_config: GenerationConfig {
                temperature: Number::from(0),
                max_output_tokens: Number::from(1),
                top_p: Number::from(1),
                top_k: Number::from(1),
            },
        }
    }

    #[tokio::test]
    async fn scripted_generator_replays_steps() {
        let generator = ScriptedGenerator::new().text("a").fail("boom");
        let items: Vec<_> = generator
            .stream_generate(&request())
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().first_text(), Some("a"));
        assert!(items[1].is_err());
        assert_eq!(generator.requests().len(), 1);
    }

    #[tokio::test]
    async fn scripted_generator_rejects() {
        let generator = ScriptedGenerator::new().reject(StatusCode::BAD_REQUEST, "nope");
        assert!(matches!(
            generator.stream_generate(&request()).await,
            Err(RelayError::Upstream { .. })
        ));
        assert_eq!(generator.last_contents(), Some(request().contents));
    }
}
