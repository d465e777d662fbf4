// SPDX-License-Identifier: MIT

//! Typed errors for the language-model kit
//!
//! Everything that can go wrong between building a prompt and getting a
//! usable answer back from a model surfaces as a [`ModelError`].

use thiserror::Error;

/// Model/LLM-specific errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// API key not configured
    #[error("API key not configured for provider: {0}")]
    ApiKeyMissing(String),

    /// Transport failure talking to the provider
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Non-success status returned by the provider
    #[error("API error from {provider} ({status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    /// Response did not carry any usable text
    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),

    /// Structured output could not be parsed
    #[error("Failed to parse model output: {0}")]
    Parse(String),

    /// Prompt template rendered without a declared variable
    #[error("Missing prompt variable: {0}")]
    MissingVariable(String),
}

impl ModelError {
    /// Create an API error
    pub fn api(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Whether a retry of the same call could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
