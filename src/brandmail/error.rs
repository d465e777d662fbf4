// SPDX-License-Identifier: MIT

//! Typed error handling for brandmail
//!
//! One enum per failure domain, wrapped by [`WorkflowError`] for anything a
//! workflow run can hit and by [`BrandmailError`] at the application edge.

use crate::adk::error::ModelError;
use thiserror::Error;

/// Top-level error type for brandmail
#[derive(Debug, Error)]
pub enum BrandmailError {
    /// Configuration errors (missing env vars, invalid config)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A workflow run failed
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl BrandmailError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Failure of any node in the email workflow
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("reputation check failed: {0}")]
    Reputation(#[from] ReputationError),

    #[error("content extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("model invocation failed: {0}")]
    Model(#[from] ModelError),
}

/// URL reputation service errors
#[derive(Debug, Error)]
pub enum ReputationError {
    /// Service unreachable or body unreadable
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Non-success status from the service
    #[error("reputation service returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Response did not have the expected shape
    #[error("unexpected reputation response: {0}")]
    Malformed(String),

    /// Service URL could not be built
    #[error("invalid reputation service url: {0}")]
    Url(#[from] url::ParseError),
}

/// Page fetch/parse errors
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Page unreachable or body unreadable
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Non-success status for the page
    #[error("page returned HTTP {0}")]
    Status(u16),

    /// Page is not an HTML document
    #[error("page is not HTML (content-type: {0})")]
    NotHtml(String),

    /// No article text could be extracted
    #[error("page has no parseable article body")]
    EmptyBody,

    /// Internal selector failed to compile
    #[error("selector error: {0}")]
    Selector(String),
}
