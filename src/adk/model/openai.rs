// SPDX-License-Identifier: MIT

//! OpenAI-compatible Model - chat completions API implementation
//!
//! Works against any endpoint speaking the OpenAI chat completions dialect.
//! The default deployment points it at Groq.

use super::{Content, GenerationConfig, Model, Part};
use crate::adk::error::ModelError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Pause before each retry of a transient failure
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// OpenAI-compatible chat model implementation
pub struct OpenAIModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
    max_retries: u32,
}

impl OpenAIModel {
    /// Create a new OpenAIModel against the default OpenAI endpoint
    pub fn new(model_name: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model_name: model_name.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: 0,
        }
    }

    /// Point the client at another OpenAI-compatible endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Number of extra attempts after a transient failure
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Provider label used in errors and logs
    fn provider(&self) -> &'static str {
        if self.base_url.contains("groq.com") {
            "Groq"
        } else {
            "OpenAI"
        }
    }

    /// Convert internal Content to OpenAI message format
    fn content_to_openai_message(content: &Content) -> serde_json::Value {
        let role = match content.role.as_str() {
            "system" => "system",
            "user" => "user",
            "model" => "assistant",
            other => other,
        };

        json!({
            "role": role,
            "content": content.text()
        })
    }

    /// Build the request body for a chat completion
    fn build_body(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = history
            .iter()
            .map(Self::content_to_openai_message)
            .collect();

        let mut body = json!({
            "model": self.model_name,
            "messages": messages
        });

        if let Some(cfg) = config {
            if let Some(temp) = cfg.temperature {
                body["temperature"] = json!(temp);
            }
            if let Some(max_tokens) = cfg.max_output_tokens {
                body["max_tokens"] = json!(max_tokens);
            }
            if let Some(top_p) = cfg.top_p {
                body["top_p"] = json!(top_p);
            }
        }

        body
    }

    /// Parse OpenAI response into Content
    fn parse_openai_response(response: &serde_json::Value) -> Result<Content, ModelError> {
        let choice = response["choices"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| ModelError::InvalidResponse("No choices in response".to_string()))?;

        let message = &choice["message"];
        let mut parts = Vec::new();

        // Some reasoning models return their chain of thought separately
        if let Some(reasoning) = message["reasoning"].as_str() {
            if !reasoning.is_empty() {
                parts.push(Part::Thinking(reasoning.to_string()));
            }
        }

        if let Some(content) = message["content"].as_str() {
            if !content.is_empty() {
                parts.push(Part::Text(content.to_string()));
            }
        }

        if !parts.iter().any(|p| matches!(p, Part::Text(_))) {
            return Err(ModelError::InvalidResponse(
                "Response message has no text content".to_string(),
            ));
        }

        Ok(Content {
            role: "model".to_string(),
            parts,
        })
    }

    async fn send_once(&self, body: &serde_json::Value) -> Result<Content, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await?;
            return Err(ModelError::api(self.provider(), status.as_u16(), text));
        }

        let resp_json: serde_json::Value = resp.json().await?;
        log::debug!("{} response: {}", self.provider(), resp_json);

        Self::parse_openai_response(&resp_json)
    }
}

#[async_trait]
impl Model for OpenAIModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<Content, ModelError> {
        if self.api_key.is_empty() {
            return Err(ModelError::ApiKeyMissing(self.provider().to_string()));
        }

        let body = self.build_body(history, config);

        log::debug!(
            "{} request body: {}",
            self.provider(),
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let mut attempt = 0;
        loop {
            match self.send_once(&body).await {
                Ok(content) => return Ok(content),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    log::warn!(
                        "{} call failed ({}), retry {}/{}",
                        self.provider(),
                        e,
                        attempt,
                        self.max_retries
                    );
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn test_content_to_openai_user_message() {
        let msg = OpenAIModel::content_to_openai_message(&Content::user("Hello"));
        assert_eq!(msg["role"], "user");
        assert_eq!(msg["content"], "Hello");
    }

    #[test]
    fn test_content_to_openai_system_message() {
        let msg = OpenAIModel::content_to_openai_message(&Content::system("You are helpful"));
        assert_eq!(msg["role"], "system");
        assert_eq!(msg["content"], "You are helpful");
    }

    #[test]
    fn test_content_to_openai_assistant_message() {
        let content = Content {
            role: "model".to_string(),
            parts: vec![Part::Text("I can help".to_string())],
        };

        let msg = OpenAIModel::content_to_openai_message(&content);
        assert_eq!(msg["role"], "assistant");
        assert_eq!(msg["content"], "I can help");
    }

    #[test]
    fn test_build_body_applies_config() {
        let model = OpenAIModel::new("llama3-8b-8192", "key");
        let config = GenerationConfig {
            temperature: Some(0.0),
            max_output_tokens: Some(256),
            top_p: None,
        };

        let body = model.build_body(&[Content::user("hi")], Some(&config));
        assert_eq!(body["model"], "llama3-8b-8192");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["max_tokens"], 256);
        assert!(body.get("top_p").is_none());
        assert_eq!(body["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_build_body_without_config() {
        let model = OpenAIModel::new("gpt-4o-mini", "key");
        let body = model.build_body(&[Content::user("hi")], None);
        assert!(body.get("temperature").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_provider_from_base_url() {
        let groq = OpenAIModel::new("m", "k").with_base_url("https://api.groq.com/openai/v1/");
        assert_eq!(groq.provider(), "Groq");
        assert_eq!(groq.base_url, "https://api.groq.com/openai/v1");

        let openai = OpenAIModel::new("m", "k");
        assert_eq!(openai.provider(), "OpenAI");
    }

    #[test]
    fn test_parse_openai_text_response() {
        let response = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "Hello, how can I help?"
                }
            }]
        });

        let content = OpenAIModel::parse_openai_response(&response).unwrap();
        assert_eq!(content.role, "model");
        assert_eq!(content.parts.len(), 1);
        assert_eq!(content.text(), "Hello, how can I help?");
    }

    #[test]
    fn test_parse_openai_reasoning_response() {
        let response = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "reasoning": "The user wants a greeting.",
                    "content": "Hi!"
                }
            }]
        });

        let content = OpenAIModel::parse_openai_response(&response).unwrap();
        assert_eq!(content.parts.len(), 2);
        assert!(matches!(&content.parts[0], Part::Thinking(_)));
        assert_eq!(content.text(), "Hi!");
    }

    #[test]
    fn test_parse_openai_response_without_choices() {
        let err = OpenAIModel::parse_openai_response(&json!({"choices": []})).unwrap_err();
        assert!(matches!(err, ModelError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_openai_response_with_null_content() {
        let response = json!({
            "choices": [{ "message": { "role": "assistant", "content": null } }]
        });
        let err = OpenAIModel::parse_openai_response(&response).unwrap_err();
        assert!(matches!(err, ModelError::InvalidResponse(_)));
    }

    /// Serve `/chat/completions` from a local listener, answering with the
    /// given statuses in order and counting requests
    async fn spawn_completions(statuses: Vec<u16>) -> (String, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let app = Router::new().route(
            "/chat/completions",
            post(move || {
                let counter = counter.clone();
                let statuses = statuses.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    let code = statuses.get(n).copied().unwrap_or(200);
                    let status = StatusCode::from_u16(code).unwrap();
                    let body = json!({
                        "choices": [{ "message": { "role": "assistant", "content": "ok" } }]
                    });
                    (status, axum::Json(body))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), calls)
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let (base_url, calls) = spawn_completions(vec![503, 200]).await;
        let model = OpenAIModel::new("m", "k")
            .with_base_url(base_url)
            .with_max_retries(1);

        let started = Instant::now();
        let content = model
            .generate_content(&[Content::user("hi")], None)
            .await
            .unwrap();

        assert_eq!(content.text(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= RETRY_DELAY);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let (base_url, calls) = spawn_completions(vec![429, 429, 429]).await;
        let model = OpenAIModel::new("m", "k")
            .with_base_url(base_url)
            .with_max_retries(1);

        let err = model
            .generate_content(&[Content::user("hi")], None)
            .await
            .unwrap_err();

        assert!(matches!(err, ModelError::Api { status: 429, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let (base_url, calls) = spawn_completions(vec![401]).await;
        let model = OpenAIModel::new("m", "k")
            .with_base_url(base_url)
            .with_max_retries(2);

        let err = model
            .generate_content(&[Content::user("hi")], None)
            .await
            .unwrap_err();

        assert!(matches!(err, ModelError::Api { status: 401, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_request() {
        let model = OpenAIModel::new("m", "").with_base_url("http://127.0.0.1:9");
        let err = model
            .generate_content(&[Content::user("hi")], None)
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::ApiKeyMissing(_)));
    }
}
