// SPDX-License-Identifier: MIT

//! Operator configuration
//!
//! Built-in defaults, then an optional YAML file, then environment variables.
//! API keys are only ever read from the environment.

use super::error::BrandmailError;
use crate::adk::model::GenerationConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_LLM_MODEL: &str = "llama3-8b-8192";
pub const DEFAULT_VIRUSTOTAL_BASE_URL: &str = "https://www.virustotal.com/api/v3";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub llm: LlmSettings,
    pub reputation: ReputationSettings,
    pub extractor: ExtractorSettings,
    pub server: ServerSettings,
}

/// Language model service settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub max_retries: u32,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: None,
            max_retries: 2,
            api_key: None,
        }
    }
}

/// URL reputation service settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ReputationSettings {
    pub base_url: String,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for ReputationSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_VIRUSTOTAL_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractorSettings {
    pub user_agent: String,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            user_agent: concat!("brandmail/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl Settings {
    /// Load settings from an optional YAML file and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, BrandmailError> {
        let mut settings = match path {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                Self::parse_yaml(&fs::read_to_string(path)?)?
            }
            None => Self::default(),
        };

        settings.apply_env(|key| env::var(key).ok().filter(|v| !v.is_empty()));
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a YAML string
    pub fn parse_yaml(content: &str) -> Result<Self, BrandmailError> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Overlay environment values
    ///
    /// Takes a lookup function so callers can supply something other than
    /// the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GROQ_API_KEY").or_else(|| lookup("LLM_API_KEY")) {
            self.llm.api_key = Some(key);
        }
        if let Some(base_url) = lookup("LLM_BASE_URL") {
            self.llm.base_url = base_url;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(key) = lookup("VIRUSTOTAL_API_KEY") {
            self.reputation.api_key = Some(key);
        }
        if let Some(base_url) = lookup("VIRUSTOTAL_BASE_URL") {
            self.reputation.base_url = base_url;
        }
        if let Some(host) = lookup("BRANDMAIL_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("BRANDMAIL_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => log::warn!("Ignoring invalid BRANDMAIL_PORT: {}", port),
            }
        }
    }

    /// Check values that would otherwise only fail at request time
    pub fn validate(&self) -> Result<(), BrandmailError> {
        url::Url::parse(&self.llm.base_url).map_err(|e| {
            BrandmailError::config(format!("invalid llm.base_url '{}': {}", self.llm.base_url, e))
        })?;
        url::Url::parse(&self.reputation.base_url).map_err(|e| {
            BrandmailError::config(format!(
                "invalid reputation.base_url '{}': {}",
                self.reputation.base_url, e
            ))
        })?;
        if self.server.port == 0 {
            return Err(BrandmailError::config("server.port must be non-zero"));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(BrandmailError::config(format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }
        Ok(())
    }

    /// Generation parameters shared by every chain
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: Some(self.llm.temperature),
            max_output_tokens: self.llm.max_tokens,
            top_p: None,
        }
    }
}
