// SPDX-License-Identifier: MIT

//! Email generation workflow
//!
//! This module provides:
//! - `WorkflowState` - the per-request record threaded through the nodes
//! - `EmailWorkflow` - the state machine that runs them
//! - `Builder` - constructs a workflow from `Settings`

pub mod builder;
mod executor;
mod state;

pub use executor::{route, EmailWorkflow, Node, Transition, WorkflowEvent, MIN_URL_LEN};
pub use state::WorkflowState;
