// SPDX-License-Identifier: MIT

//! Marketing email generation with optional brand-site enrichment

pub mod composer;
pub mod config;
pub mod error;
pub mod extractor;
pub mod keywords;
pub mod prompts;
pub mod reputation;
pub mod server;
pub mod workflow;
