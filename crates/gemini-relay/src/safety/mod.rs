//! Safety policy mapping
//!
//! Callers send a loose `category → threshold` map of strings. It is mapped
//! onto the provider's enums here. Unlike unrecognized message roles, which
//! the normalizer drops silently, an unrecognized category or threshold name
//! fails the request with a validation error.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};

/// Harm categories understood by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
}

impl HarmCategory {
    pub const ALL: [HarmCategory; 4] = [
        HarmCategory::Harassment,
        HarmCategory::HateSpeech,
        HarmCategory::SexuallyExplicit,
        HarmCategory::DangerousContent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HarmCategory::Harassment => "HARM_CATEGORY_HARASSMENT",
            HarmCategory::HateSpeech => "HARM_CATEGORY_HATE_SPEECH",
            HarmCategory::SexuallyExplicit => "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            HarmCategory::DangerousContent => "HARM_CATEGORY_DANGEROUS_CONTENT",
        }
    }
}

impl fmt::Display for HarmCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HarmCategory {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(category) = Self::ALL.into_iter().find(|c| c.as_str() == s) {
            return Ok(category);
        }

        match s.to_ascii_lowercase().as_str() {
            "harassment" => Ok(HarmCategory::Harassment),
            "hate_speech" | "hatespeech" => Ok(HarmCategory::HateSpeech),
            "sexually_explicit" | "sexuallyexplicit" => Ok(HarmCategory::SexuallyExplicit),
            "dangerous_content" | "dangerouscontent" => Ok(HarmCategory::DangerousContent),
            _ => Err(RelayError::Validation(format!(
                "Unknown safety category '{s}'"
            ))),
        }
    }
}

/// Block thresholds understood by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HarmBlockThreshold {
    #[serde(rename = "HARM_BLOCK_THRESHOLD_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "BLOCK_LOW_AND_ABOVE")]
    BlockLowAndAbove,
    #[serde(rename = "BLOCK_MEDIUM_AND_ABOVE")]
    BlockMediumAndAbove,
    #[serde(rename = "BLOCK_ONLY_HIGH")]
    BlockOnlyHigh,
    #[serde(rename = "BLOCK_NONE")]
    BlockNone,
}

impl HarmBlockThreshold {
    pub const ALL: [HarmBlockThreshold; 5] = [
        HarmBlockThreshold::Unspecified,
        HarmBlockThreshold::BlockLowAndAbove,
        HarmBlockThreshold::BlockMediumAndAbove,
        HarmBlockThreshold::BlockOnlyHigh,
        HarmBlockThreshold::BlockNone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HarmBlockThreshold::Unspecified => "HARM_BLOCK_THRESHOLD_UNSPECIFIED",
            HarmBlockThreshold::BlockLowAndAbove => "BLOCK_LOW_AND_ABOVE",
            HarmBlockThreshold::BlockMediumAndAbove => "BLOCK_MEDIUM_AND_ABOVE",
            HarmBlockThreshold::BlockOnlyHigh => "BLOCK_ONLY_HIGH",
            HarmBlockThreshold::BlockNone => "BLOCK_NONE",
        }
    }
}

impl fmt::Display for HarmBlockThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HarmBlockThreshold {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(threshold) = Self::ALL.into_iter().find(|t| t.as_str() == s) {
            return Ok(threshold);
        }

        match s.to_ascii_lowercase().as_str() {
            "unspecified" => Ok(HarmBlockThreshold::Unspecified),
            "low" => Ok(HarmBlockThreshold::BlockLowAndAbove),
            "medium" => Ok(HarmBlockThreshold::BlockMediumAndAbove),
            "high" => Ok(HarmBlockThreshold::BlockOnlyHigh),
            "none" => Ok(HarmBlockThreshold::BlockNone),
            _ => Err(RelayError::Validation(format!(
                "Unknown safety threshold '{s}'"
            ))),
        }
    }
}

/// One provider safety setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

/// Default policy: every category blocked at medium probability and above
pub fn default_safety_settings() -> Vec<SafetySetting> {
    HarmCategory::ALL
        .into_iter()
        .map(|category| SafetySetting {
            category,
            threshold: HarmBlockThreshold::BlockMediumAndAbove,
        })
        .collect()
}

/// Map a caller-supplied policy onto provider settings, in key order.
///
/// Fails on the first unknown category or threshold name.
pub fn map_safety_settings(policy: &BTreeMap<String, String>) -> Result<Vec<SafetySetting>> {
    policy
        .iter()
        .map(|(category, threshold)| {
            Ok(SafetySetting {
                category: category.parse()?,
                threshold: threshold.parse()?,
            })
        })
        .collect()
}

/// Resolve the effective policy for a request: the mapped caller policy if
/// one was supplied, otherwise the default.
pub fn resolve_safety_settings(
    policy: Option<&BTreeMap<String, String>>,
) -> Result<Vec<SafetySetting>> {
    match policy {
        Some(policy) => map_safety_settings(policy),
        None => Ok(default_safety_settings()),
    }
}
