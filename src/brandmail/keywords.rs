// SPDX-License-Identifier: MIT

//! Keyword inference from page content

use super::prompts;
use crate::adk::chain::LlmChain;
use crate::adk::error::ModelError;
use crate::adk::model::{GenerationConfig, Model};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub const MAX_KEYWORDS: usize = 3;

/// Infers up to [`MAX_KEYWORDS`] descriptive keywords for a page
#[async_trait]
pub trait KeywordInferrer: Send + Sync {
    async fn infer(&self, title: &str, body: &str) -> Result<Vec<String>, ModelError>;
}

pub struct LlmKeywordInferrer {
    chain: LlmChain,
}

impl LlmKeywordInferrer {
    pub fn new(model: Arc<dyn Model>, config: GenerationConfig) -> Self {
        Self {
            chain: LlmChain::new(
                "keyword_extractor",
                prompts::KEYWORD_INSTRUCTION,
                prompts::keyword_prompt(),
                model,
                config,
            ),
        }
    }
}

#[async_trait]
impl KeywordInferrer for LlmKeywordInferrer {
    async fn infer(&self, title: &str, body: &str) -> Result<Vec<String>, ModelError> {
        let value = self
            .chain
            .invoke_json(&[("website_title", title), ("website_content", body)])
            .await?;
        parse_keywords(&value)
    }
}

/// Read the `keywords` list out of a structured answer, keeping the first three
pub fn parse_keywords(value: &Value) -> Result<Vec<String>, ModelError> {
    let list = value
        .get("keywords")
        .ok_or_else(|| ModelError::parse("missing 'keywords' key"))?
        .as_array()
        .ok_or_else(|| ModelError::parse("'keywords' is not a list"))?;

    let mut keywords = Vec::with_capacity(list.len().min(MAX_KEYWORDS));
    for item in list {
        let keyword = item
            .as_str()
            .ok_or_else(|| ModelError::parse(format!("keyword is not a string: {}", item)))?;
        let keyword = keyword.trim();
        if !keyword.is_empty() {
            keywords.push(keyword.to_string());
        }
    }

    if keywords.len() > MAX_KEYWORDS {
        log::warn!(
            "Model returned {} keywords, keeping the first {}",
            keywords.len(),
            MAX_KEYWORDS
        );
        keywords.truncate(MAX_KEYWORDS);
    }

    Ok(keywords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_keywords() {
        let kw = parse_keywords(&json!({"keywords": ["eco", "outdoor", "durable"]})).unwrap();
        assert_eq!(kw, vec!["eco", "outdoor", "durable"]);
    }

    #[test]
    fn test_parse_keywords_truncates_to_three() {
        let kw = parse_keywords(&json!({"keywords": ["a", "b", "c", "d", "e"]})).unwrap();
        assert_eq!(kw, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_keywords_drops_blank_entries() {
        let kw = parse_keywords(&json!({"keywords": [" eco ", "", "fast"]})).unwrap();
        assert_eq!(kw, vec!["eco", "fast"]);
    }

    #[test]
    fn test_parse_keywords_missing_key() {
        let err = parse_keywords(&json!({"tags": ["a"]})).unwrap_err();
        assert!(matches!(err, ModelError::Parse(_)));
    }

    #[test]
    fn test_parse_keywords_not_a_list() {
        assert!(parse_keywords(&json!({"keywords": "a, b"})).is_err());
        assert!(parse_keywords(&json!({"keywords": [1, 2]})).is_err());
    }
}
