// SPDX-License-Identifier: MIT

//! Marketing email generation

use super::prompts;
use crate::adk::chain::LlmChain;
use crate::adk::error::ModelError;
use crate::adk::model::{GenerationConfig, Model};
use async_trait::async_trait;
use std::sync::Arc;

/// Writes an email body; the model's text is returned verbatim
#[async_trait]
pub trait EmailComposer: Send + Sync {
    async fn compose(
        &self,
        brand_name: &str,
        product_name: &str,
        product_description: &str,
    ) -> Result<String, ModelError>;
}

pub struct LlmEmailComposer {
    chain: LlmChain,
}

impl LlmEmailComposer {
    pub fn new(model: Arc<dyn Model>, config: GenerationConfig) -> Self {
        Self {
            chain: LlmChain::new(
                "email_creator",
                prompts::EMAIL_INSTRUCTION,
                prompts::email_prompt(),
                model,
                config,
            ),
        }
    }
}

#[async_trait]
impl EmailComposer for LlmEmailComposer {
    async fn compose(
        &self,
        brand_name: &str,
        product_name: &str,
        product_description: &str,
    ) -> Result<String, ModelError> {
        self.chain
            .invoke(&[
                ("brand_name", brand_name),
                ("product_name", product_name),
                ("product_description", product_description),
            ])
            .await
    }
}
