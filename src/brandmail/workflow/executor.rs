// SPDX-License-Identifier: MIT

//! Email workflow executor
//!
//! A three-node state machine:
//!
//! ```text
//! Entry ──(url len > 3)──> KeywordExtraction ──> EmailCreation ──> Done
//!   └──────(otherwise)─────────────────────────────────┘
//! ```
//!
//! The state is owned by the run and handed to each node by exclusive
//! reference. Each node bumps `num_steps` by one (saturating), so a run
//! ends at 2 on the direct path and 3 through keyword extraction.

use super::state::WorkflowState;
use crate::brandmail::composer::EmailComposer;
use crate::brandmail::error::WorkflowError;
use crate::brandmail::extractor::ContentExtractor;
use crate::brandmail::keywords::KeywordInferrer;
use crate::brandmail::reputation::ReputationChecker;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// URLs no longer than this skip keyword extraction
pub const MIN_URL_LEN: usize = 3;

/// Workflow nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Entry,
    KeywordExtraction,
    EmailCreation,
}

impl Node {
    pub fn name(&self) -> &'static str {
        match self {
            Node::Entry => "entry_node",
            Node::KeywordExtraction => "keyword_extractor_node",
            Node::EmailCreation => "email_creator_node",
        }
    }
}

/// Where a node hands control next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Next(Node),
    Done,
}

/// Progress events emitted by [`EmailWorkflow::run_stream`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkflowEvent {
    NodeCompleted { node: Node, state: WorkflowState },
    Completed { state: WorkflowState },
    Error { message: String },
}

/// Pick the node after Entry
///
/// Length is counted in characters; this is a presence check, not URL
/// validation.
pub fn route(state: &WorkflowState) -> Node {
    if state.brand_url.chars().count() > MIN_URL_LEN {
        Node::KeywordExtraction
    } else {
        Node::EmailCreation
    }
}

/// Orchestrates the reputation check, keyword enrichment and email creation
///
/// Collaborators are built once and shared read-only across runs.
#[derive(Clone)]
pub struct EmailWorkflow {
    reputation: Arc<dyn ReputationChecker>,
    extractor: Arc<dyn ContentExtractor>,
    keywords: Arc<dyn KeywordInferrer>,
    composer: Arc<dyn EmailComposer>,
}

impl EmailWorkflow {
    pub fn new(
        reputation: Arc<dyn ReputationChecker>,
        extractor: Arc<dyn ContentExtractor>,
        keywords: Arc<dyn KeywordInferrer>,
        composer: Arc<dyn EmailComposer>,
    ) -> Self {
        Self {
            reputation,
            extractor,
            keywords,
            composer,
        }
    }

    /// Run the workflow to completion
    pub async fn run(&self, input: WorkflowState) -> Result<WorkflowState, WorkflowError> {
        self.execute(input, None).await
    }

    /// Run the workflow, sending an event after every node
    pub async fn run_stream(
        &self,
        input: WorkflowState,
        tx: mpsc::Sender<WorkflowEvent>,
    ) -> Result<WorkflowState, WorkflowError> {
        match self.execute(input, Some(&tx)).await {
            Ok(state) => {
                let _ = tx
                    .send(WorkflowEvent::Completed {
                        state: state.clone(),
                    })
                    .await;
                Ok(state)
            }
            Err(e) => {
                let _ = tx
                    .send(WorkflowEvent::Error {
                        message: e.to_string(),
                    })
                    .await;
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        mut state: WorkflowState,
        tx: Option<&mpsc::Sender<WorkflowEvent>>,
    ) -> Result<WorkflowState, WorkflowError> {
        let run_id = Uuid::new_v4();
        log::info!(
            "[{}] Starting email workflow for {} / {}",
            run_id,
            state.brand_name,
            state.product_name
        );

        let mut node = Node::Entry;
        loop {
            log::info!("[{}] Executing node: {}", run_id, node.name());
            let transition = self.dispatch(node, &mut state).await.map_err(|e| {
                log::error!("[{}] Node {} failed: {}", run_id, node.name(), e);
                e
            })?;

            if let Some(tx) = tx {
                let _ = tx
                    .send(WorkflowEvent::NodeCompleted {
                        node,
                        state: state.clone(),
                    })
                    .await;
            }

            match transition {
                Transition::Next(next) => {
                    log::debug!("[{}] {} -> {}", run_id, node.name(), next.name());
                    node = next;
                }
                Transition::Done => break,
            }
        }

        log::info!(
            "[{}] Workflow finished after {} steps",
            run_id,
            state.num_steps
        );
        Ok(state)
    }

    async fn dispatch(
        &self,
        node: Node,
        state: &mut WorkflowState,
    ) -> Result<Transition, WorkflowError> {
        match node {
            Node::Entry => self.entry(state).await,
            Node::KeywordExtraction => self.extract_keywords(state).await,
            Node::EmailCreation => self.create_email(state).await,
        }
    }

    async fn entry(&self, state: &mut WorkflowState) -> Result<Transition, WorkflowError> {
        if state.brand_url.is_empty() {
            log::debug!("No brand URL given, skipping reputation check");
        } else {
            let risk = self.reputation.check(&state.brand_url).await?;
            if risk > 0 {
                log::warn!(
                    "Brand URL {} flagged by {} engines, dropping it",
                    state.brand_url,
                    risk
                );
                state.brand_url.clear();
            }
        }

        state.num_steps = state.num_steps.saturating_add(1);
        Ok(Transition::Next(route(state)))
    }

    async fn extract_keywords(
        &self,
        state: &mut WorkflowState,
    ) -> Result<Transition, WorkflowError> {
        let article = self.extractor.extract(&state.brand_url).await?;
        let keywords = self.keywords.infer(&article.title, &article.text).await?;
        log::info!("Inferred keywords: {:?}", keywords);

        state.record_article(article);
        state.prepend_keywords(&keywords);
        state.num_steps = state.num_steps.saturating_add(1);
        Ok(Transition::Next(Node::EmailCreation))
    }

    async fn create_email(&self, state: &mut WorkflowState) -> Result<Transition, WorkflowError> {
        state.email = self
            .composer
            .compose(
                &state.brand_name,
                &state.product_name,
                &state.product_description,
            )
            .await?;
        state.num_steps = state.num_steps.saturating_add(1);
        Ok(Transition::Done)
    }
}
