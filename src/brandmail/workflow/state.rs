// SPDX-License-Identifier: MIT

//! Per-request workflow state

use crate::brandmail::extractor::Article;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The record threaded through every node of one workflow run
///
/// Callers supply the first four fields; the rest start empty and are filled
/// in depending on the path taken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WorkflowState {
    pub brand_name: String,
    pub product_name: String,
    pub product_description: String,
    /// Original input, or empty once the reputation check flags it
    #[serde(default)]
    pub brand_url: String,
    #[serde(default)]
    pub article_title: String,
    #[serde(default)]
    pub article_text: String,
    #[serde(default)]
    pub email: String,
    /// Nodes visited so far
    #[serde(default)]
    pub num_steps: u32,
}

impl WorkflowState {
    pub fn new(
        brand_name: impl Into<String>,
        product_name: impl Into<String>,
        product_description: impl Into<String>,
        brand_url: impl Into<String>,
    ) -> Self {
        Self {
            brand_name: brand_name.into(),
            product_name: product_name.into(),
            product_description: product_description.into(),
            brand_url: brand_url.into(),
            ..Default::default()
        }
    }

    /// Store title and text together
    pub fn record_article(&mut self, article: Article) {
        self.article_title = article.title;
        self.article_text = article.text;
    }

    /// Prefix the description with space-joined keywords
    pub fn prepend_keywords(&mut self, keywords: &[String]) {
        if keywords.is_empty() {
            return;
        }
        self.product_description = format!("{} {}", keywords.join(" "), self.product_description);
    }
}
