//! Generative-language provider client
//!
//! The handler only talks to [`ContentGenerator`]; [`GeminiClient`] is the
//! production implementation over the Gemini REST API.

mod gemini;
pub mod types;

pub use gemini::GeminiClient;
pub use types::{
    Candidate, CandidateContent, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, PromptFeedback, ResponsePart,
};

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::conversation::Conversation;
use crate::error::Result;

/// Stream of provider response chunks
pub type ChunkStream = BoxStream<'static, Result<GenerateContentResponse>>;

/// Trait for providers that stream generated content
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Start a streaming generation.
    ///
    /// Resolves once the provider has accepted the request; the returned
    /// stream yields chunks as they arrive and an error if the stream breaks.
    async fn stream_generate(&self, request: &GenerateContentRequest) -> Result<ChunkStream>;

    /// Count the prompt tokens of a conversation
    async fn count_tokens(&self, contents: &Conversation) -> Result<u32>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
