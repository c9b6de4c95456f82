//! Chat request model and validation

mod sanitize;

pub use sanitize::sanitize_content;

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Number;

use crate::conversation::Message;
use crate::error::{RelayError, Result};

/// Body of a chat request
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub general_settings: GeneralSettings,
    /// Category → threshold names; the default policy applies when absent
    #[serde(default)]
    pub safety_settings: Option<BTreeMap<String, String>>,
}

/// Generation tuning values. Each must be present and a JSON number; the
/// values themselves are passed through to the provider unchanged.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSettings {
    pub temperature: Number,
    pub max_length: Number,
    pub top_p: Number,
    pub top_k: Number,
}

impl ChatRequest {
    /// Parse and validate a request body
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let request: ChatRequest = serde_json::from_slice(body)
            .map_err(|e| RelayError::Validation(format!("Invalid request body: {e}")))?;
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<()> {
        if self.messages.is_empty() {
            return Err(RelayError::Validation(
                "messages must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Sanitize every message's content in place
    pub fn sanitize(&mut self) {
        for message in &mut self.messages {
            message.content = sanitize_content(&message.content);
        }
    }
}
