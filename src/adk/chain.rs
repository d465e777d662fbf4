// SPDX-License-Identifier: MIT

//! Prompt chains - template, model and output parser in one call
//!
//! A chain renders a [`PromptTemplate`] with caller variables, sends it to a
//! [`Model`] behind a fixed system instruction and hands back either the raw
//! text or a parsed JSON value.

use crate::adk::error::ModelError;
use crate::adk::model::{Content, GenerationConfig, Model};
use serde_json::Value;
use std::sync::Arc;

/// A prompt with `{name}` placeholders for its declared input variables
///
/// Braces that do not wrap a declared variable are left untouched, so JSON
/// examples can appear in a template without escaping.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    input_variables: Vec<String>,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>, input_variables: &[&str]) -> Self {
        Self {
            template: template.into(),
            input_variables: input_variables.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Render the template in a single pass
    ///
    /// Substituted values are never re-scanned for placeholders.
    pub fn format(&self, vars: &[(&str, &str)]) -> Result<String, ModelError> {
        let lookup = |name: &str| vars.iter().find(|(k, _)| *k == name).map(|(_, v)| *v);

        for name in &self.input_variables {
            if lookup(name.as_str()).is_none() {
                return Err(ModelError::MissingVariable(name.clone()));
            }
        }

        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let declared = after
                .find('}')
                .map(|end| (end, &after[..end]))
                .filter(|(_, name)| self.input_variables.iter().any(|v| v == name));

            match declared {
                Some((end, name)) => {
                    out.push_str(lookup(name).unwrap_or_default());
                    rest = &after[end + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);

        Ok(out)
    }
}

/// System instruction + user template bound to a model
pub struct LlmChain {
    name: String,
    instruction: String,
    prompt: PromptTemplate,
    model: Arc<dyn Model>,
    config: GenerationConfig,
}

impl LlmChain {
    pub fn new(
        name: impl Into<String>,
        instruction: impl Into<String>,
        prompt: PromptTemplate,
        model: Arc<dyn Model>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            name: name.into(),
            instruction: instruction.into(),
            prompt,
            model,
            config,
        }
    }

    /// Run the chain and return the model text verbatim
    pub async fn invoke(&self, vars: &[(&str, &str)]) -> Result<String, ModelError> {
        let history = vec![
            Content::system(self.instruction.clone()),
            Content::user(self.prompt.format(vars)?),
        ];

        let response = self
            .model
            .generate_content(&history, Some(&self.config))
            .await?;
        let text = response.text();

        log::info!(
            "Chain {} returned text (length: {}, preview: '{}')",
            self.name,
            text.len(),
            preview(&text, 100)
        );

        Ok(text)
    }

    /// Run the chain and parse the answer as a JSON value
    pub async fn invoke_json(&self, vars: &[(&str, &str)]) -> Result<Value, ModelError> {
        let text = self.invoke(vars).await?;
        parse_json_output(&text)
    }
}

/// Parse a JSON value out of free-form model output
///
/// Accepts bare JSON, JSON wrapped in a Markdown code fence, or the first
/// complete `{...}` object embedded in surrounding prose. Text after that
/// object is ignored, braces included.
pub fn parse_json_output(text: &str) -> Result<Value, ModelError> {
    let trimmed = text.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    if let Some(fenced) = strip_code_fence(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(fenced) {
            return Ok(value);
        }
    }

    if let Some(value) = first_embedded_object(trimmed) {
        return Ok(value);
    }

    Err(ModelError::parse(format!(
        "no JSON object in model output: '{}'",
        preview(trimmed, 80)
    )))
}

/// Stream-parse from each `{` in turn and keep the first value that is an
/// object; the deserializer stops at the end of that value.
fn first_embedded_object(text: &str) -> Option<Value> {
    text.match_indices('{').find_map(|(start, _)| {
        serde_json::Deserializer::from_str(&text[start..])
            .into_iter::<Value>()
            .next()
            .and_then(Result::ok)
            .filter(Value::is_object)
    })
}

fn strip_code_fence(text: &str) -> Option<&str> {
    let body = text.strip_prefix("```")?;
    let body = body.strip_suffix("```")?;
    // Drop an info string such as `json`
    let body = match body.find('\n') {
        Some(nl) if !body[..nl].trim_start().starts_with('{') => &body[nl + 1..],
        _ => body,
    };
    Some(body.trim())
}

/// Char-boundary safe prefix for log lines
fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Echoes the rendered user prompt back, recording the history it saw
    struct EchoModel {
        seen: Mutex<Vec<Content>>,
    }

    #[async_trait]
    impl Model for EchoModel {
        async fn generate_content(
            &self,
            history: &[Content],
            _config: Option<&GenerationConfig>,
        ) -> Result<Content, ModelError> {
            *self.seen.lock().unwrap() = history.to_vec();
            let user = history.last().map(|c| c.text()).unwrap_or_default();
            Ok(Content {
                role: "model".to_string(),
                parts: vec![crate::adk::model::Part::Text(user)],
            })
        }
    }

    #[test]
    fn test_format_substitutes_declared_variables() {
        let prompt = PromptTemplate::new("Brand {brand}, product {product}.", &["brand", "product"]);
        let out = prompt
            .format(&[("brand", "Acme"), ("product", "Rocket")])
            .unwrap();
        assert_eq!(out, "Brand Acme, product Rocket.");
    }

    #[test]
    fn test_format_leaves_unknown_braces() {
        let prompt = PromptTemplate::new(r#"Return {"keywords": []} for {title}"#, &["title"]);
        let out = prompt.format(&[("title", "Shoes")]).unwrap();
        assert_eq!(out, r#"Return {"keywords": []} for Shoes"#);
    }

    #[test]
    fn test_format_does_not_rescan_values() {
        let prompt = PromptTemplate::new("{a} and {b}", &["a", "b"]);
        let out = prompt.format(&[("a", "{b}"), ("b", "x")]).unwrap();
        assert_eq!(out, "{b} and x");
    }

    #[test]
    fn test_format_missing_variable() {
        let prompt = PromptTemplate::new("{a} and {b}", &["a", "b"]);
        let err = prompt.format(&[("a", "1")]).unwrap_err();
        assert!(matches!(err, ModelError::MissingVariable(ref v) if v == "b"));
    }

    #[test]
    fn test_parse_json_bare() {
        let value = parse_json_output(r#"{"keywords": ["a", "b"]}"#).unwrap();
        assert_eq!(value, json!({"keywords": ["a", "b"]}));
    }

    #[test]
    fn test_parse_json_fenced() {
        let text = "```json\n{\"keywords\": [\"eco\"]}\n```";
        assert_eq!(parse_json_output(text).unwrap(), json!({"keywords": ["eco"]}));
    }

    #[test]
    fn test_parse_json_embedded_in_prose() {
        let text = "Sure! Here you go: {\"keywords\": [\"fast\"]} Hope that helps.";
        assert_eq!(parse_json_output(text).unwrap(), json!({"keywords": ["fast"]}));
    }

    #[test]
    fn test_parse_json_ignores_braces_after_object() {
        let text = "{\"keywords\": [\"eco\"]}\nNote: use {brand} in the subject.";
        assert_eq!(parse_json_output(text).unwrap(), json!({"keywords": ["eco"]}));
    }

    #[test]
    fn test_parse_json_skips_braces_before_object() {
        let text = "Fill in {brand} later. {\"keywords\": [\"eco\", \"fast\"]} {done}";
        assert_eq!(
            parse_json_output(text).unwrap(),
            json!({"keywords": ["eco", "fast"]})
        );
    }

    #[test]
    fn test_parse_json_rejects_plain_text() {
        let err = parse_json_output("fast, cheap, reliable").unwrap_err();
        assert!(matches!(err, ModelError::Parse(_)));
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        assert_eq!(preview("héllo", 2), "hé");
        assert_eq!(preview("hi", 10), "hi");
    }

    #[tokio::test]
    async fn test_chain_sends_instruction_and_prompt() {
        let model = Arc::new(EchoModel {
            seen: Mutex::new(Vec::new()),
        });
        let chain = LlmChain::new(
            "echo",
            "You are terse.",
            PromptTemplate::new("Say {word}", &["word"]),
            model.clone(),
            GenerationConfig::default(),
        );

        let out = chain.invoke(&[("word", "hello")]).await.unwrap();
        assert_eq!(out, "Say hello");

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].role, "system");
        assert_eq!(seen[0].text(), "You are terse.");
        assert_eq!(seen[1].role, "user");
    }

    #[tokio::test]
    async fn test_chain_invoke_json() {
        let model = Arc::new(EchoModel {
            seen: Mutex::new(Vec::new()),
        });
        let chain = LlmChain::new(
            "json-echo",
            "",
            PromptTemplate::new("{payload}", &["payload"]),
            model,
            GenerationConfig::default(),
        );

        let value = chain
            .invoke_json(&[("payload", r#"{"ok": true}"#)])
            .await
            .unwrap();
        assert_eq!(value, json!({"ok": true}));
    }
}
