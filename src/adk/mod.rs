// SPDX-License-Identifier: MIT

//! Language-model kit: model clients, prompt chains and their errors

pub mod chain;
pub mod error;
pub mod model;
