// SPDX-License-Identifier: MIT

//! Wires configured service clients into an [`EmailWorkflow`]

use super::executor::EmailWorkflow;
use crate::adk::model::openai::OpenAIModel;
use crate::adk::model::Model;
use crate::brandmail::composer::LlmEmailComposer;
use crate::brandmail::config::Settings;
use crate::brandmail::error::BrandmailError;
use crate::brandmail::extractor::HtmlExtractor;
use crate::brandmail::keywords::LlmKeywordInferrer;
use crate::brandmail::reputation::VirusTotalClient;
use std::sync::Arc;

pub struct Builder {
    settings: Settings,
}

impl Builder {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Build the model client both chains share
    pub fn build_model(&self) -> Result<Arc<dyn Model>, BrandmailError> {
        let llm = &self.settings.llm;
        let api_key = llm
            .api_key
            .clone()
            .ok_or_else(|| BrandmailError::config("GROQ_API_KEY must be set"))?;

        log::info!("Using model {} at {}", llm.model, llm.base_url);
        Ok(Arc::new(
            OpenAIModel::new(llm.model.clone(), api_key)
                .with_base_url(llm.base_url.clone())
                .with_max_retries(llm.max_retries),
        ))
    }

    /// Build the workflow with live service clients
    pub fn build(&self) -> Result<EmailWorkflow, BrandmailError> {
        let vt_key = self
            .settings
            .reputation
            .api_key
            .clone()
            .ok_or_else(|| BrandmailError::config("VIRUSTOTAL_API_KEY must be set"))?;

        let model = self.build_model()?;
        let config = self.settings.generation_config();

        let reputation = VirusTotalClient::new(vt_key, &self.settings.reputation.base_url)
            .map_err(|e| BrandmailError::config(e.to_string()))?;
        let extractor = HtmlExtractor::new(&self.settings.extractor.user_agent)
            .map_err(|e| BrandmailError::config(e.to_string()))?;

        Ok(EmailWorkflow::new(
            Arc::new(reputation),
            Arc::new(extractor),
            Arc::new(LlmKeywordInferrer::new(model.clone(), config.clone())),
            Arc::new(LlmEmailComposer::new(model, config)),
        ))
    }
}
