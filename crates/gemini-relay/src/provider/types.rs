//! Gemini REST wire types
//!
//! Response types are deliberately lenient: every level of a streamed chunk
//! may be missing, and a missing field is never a decode error.

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::conversation::Conversation;
use crate::request::GeneralSettings;
use crate::safety::SafetySetting;

/// Body of a `streamGenerateContent` call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Conversation,
    pub safety_settings: Vec<SafetySetting>,
    pub generation_config: GenerationConfig,
}

/// Sampling parameters, forwarded exactly as the caller wrote them
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: Number,
    pub max_output_tokens: Number,
    pub top_p: Number,
    pub top_k: Number,
}

impl From<GeneralSettings> for GenerationConfig {
    fn from(settings: GeneralSettings) -> Self {
        Self {
            temperature: settings.temperature,
            max_output_tokens: settings.max_length,
            top_p: settings.top_p,
            top_k: settings.top_k,
        }
    }
}

/// One streamed response chunk
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, if any
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .as_deref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .as_deref()?
            .first()?
            .text
            .as_deref()
    }

    /// Owned variant of [`first_text`](Self::first_text)
    pub fn into_first_text(self) -> Option<String> {
        self.candidates?
            .into_iter()
            .next()?
            .content?
            .parts?
            .into_iter()
            .next()?
            .text
    }

    /// Block reason reported for the prompt, if the provider refused it
    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback.as_ref()?.block_reason.as_deref()
    }

    /// Build a chunk carrying a single text part
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            candidates: Some(vec![Candidate {
                content: Some(CandidateContent {
                    role: Some("model".to_string()),
                    parts: Some(vec![ResponsePart {
                        text: Some(text.into()),
                    }]),
                }),
                finish_reason: None,
            }]),
            prompt_feedback: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Body of a `countTokens` call
#[derive(Debug, Clone, Serialize)]
pub struct CountTokensRequest<'a> {
    pub contents: &'a Conversation,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountTokensResponse {
    #[serde(default)]
    pub total_tokens: u32,
}
