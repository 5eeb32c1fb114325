//! # samd-launch
//!
//! Application layer of the SaMD launch assessor: text-generation
//! providers, the pipeline runner, configuration, the CLI and the HTTP API.
//! Records, prompts and report formats live in `samd-launch-core`.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod pipeline;
