//! TOML configuration: listen address and route, provider endpoint and
//! credential variable, persona preamble

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{RelayError, Result};

/// Main configuration structure for gemini-relay
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Generative-language provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Persona preamble configuration
    #[serde(default)]
    pub persona: PersonaConfig,
}

impl Config {
    /// Read and parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::info!("Loading config from: {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            RelayError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content)
            .map_err(|e| RelayError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load the explicit config file if given, otherwise the first existing
    /// default location, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        for candidate in default_config_paths() {
            if candidate.exists() {
                return Self::from_file(&candidate);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }
}

/// Config file locations searched when no path is given, in order
pub fn default_config_paths() -> Vec<PathBuf> {
    [
        dirs::home_dir().map(|h| h.join(".gemini-relay").join("config.toml")),
        dirs::config_dir().map(|c| c.join("gemini-relay").join("config.toml")),
        Some(PathBuf::from("config.toml")),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "127.0.0.1:8787")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Path of the chat endpoint
    #[serde(default = "default_route")]
    pub route: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            route: default_route(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:8787".to_string()
}

fn default_route() -> String {
    "/api/gemini-pro".to_string()
}

/// Provider API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the Generative Language API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Count prompt tokens before each generation and log the result
    #[serde(default = "default_count_tokens")]
    pub count_tokens: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            count_tokens: default_count_tokens(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    "gemini-pro".to_string()
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_count_tokens() -> bool {
    true
}

/// Persona preamble injected into the first user content of every conversation
#[derive(Debug, Clone, Deserialize)]
pub struct PersonaConfig {
    /// Inject the preamble at all
    #[serde(default = "default_persona_enabled")]
    pub enabled: bool,
    /// Text prepended to the first user content
    #[serde(default = "default_preamble")]
    pub preamble: String,
}

impl PersonaConfig {
    /// The preamble to inject, or `None` when disabled or empty
    pub fn active_preamble(&self) -> Option<&str> {
        if self.enabled && !self.preamble.is_empty() {
            Some(&self.preamble)
        } else {
            None
        }
    }
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            enabled: default_persona_enabled(),
            preamble: default_preamble(),
        }
    }
}

fn default_persona_enabled() -> bool {
    true
}

fn default_preamble() -> String {
    "Pretend you are a medical imaging researcher. Your core research is in \
     HTJ2K compression of DICOM images and LLM generated radiology reports. \
     Previously you worked as a data engineer and have a wide range of skills. \
     Introduce yourself. And then respond to : "
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.listen_addr, "127.0.0.1:8787");
        assert_eq!(config.server.route, "/api/gemini-pro");
        assert_eq!(
            config.provider.api_base_url,
            "https://generativelanguage.googleapis.com"
        );
        assert_eq!(config.provider.model, "gemini-pro");
        assert_eq!(config.provider.api_key_env, "GOOGLE_API_KEY");
        assert_eq!(config.provider.timeout_secs, 300);
        assert!(config.provider.count_tokens);
        assert!(config.persona.enabled);
        assert!(config.persona.preamble.ends_with("respond to : "));
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
[server]
listen_addr = "0.0.0.0:8080"
route = "/chat"

[provider]
api_base_url = "http://localhost:9000"
model = "gemini-1.5-flash"
api_key_env = "GEMINI_KEY"
timeout_secs = 60
count_tokens = false

[persona]
enabled = true
preamble = "You are a pirate. "
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to parse TOML");

        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.server.route, "/chat");
        assert_eq!(config.provider.api_base_url, "http://localhost:9000");
        assert_eq!(config.provider.model, "gemini-1.5-flash");
        assert_eq!(config.provider.api_key_env, "GEMINI_KEY");
        assert_eq!(config.provider.timeout_secs, 60);
        assert!(!config.provider.count_tokens);
        assert_eq!(config.persona.preamble, "You are a pirate. ");
    }

    #[test]
    fn test_toml_partial_deserialization() {
        let toml_str = r#"
[provider]
model = "gemini-1.5-pro"
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to parse partial TOML");

        assert_eq!(config.server.listen_addr, "127.0.0.1:8787");
        assert_eq!(config.provider.model, "gemini-1.5-pro");
        assert_eq!(config.provider.api_key_env, "GOOGLE_API_KEY");
        assert!(config.persona.enabled);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nroute = \"/v1/chat\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.server.route, "/v1/chat");
        assert_eq!(config.provider.model, "gemini-pro");
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }

    #[test]
    fn test_from_file_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_default_config_paths_end_with_cwd() {
        let paths = default_config_paths();
        assert_eq!(paths.last(), Some(&PathBuf::from("config.toml")));
    }

    #[test]
    fn test_active_preamble() {
        let mut persona = PersonaConfig::default();
        assert!(persona.active_preamble().is_some());

        persona.enabled = false;
        assert_eq!(persona.active_preamble(), None);

        persona.enabled = true;
        persona.preamble = String::new();
        assert_eq!(persona.active_preamble(), None);
    }
}
