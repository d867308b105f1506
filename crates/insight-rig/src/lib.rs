#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod error;
pub mod parse;
pub mod prompt;
pub mod provider;
mod service;

pub use config::{RigConfig, RigConfigBuilder};
pub use error::{Error, Result};
#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockProvider;
pub use provider::{CompletionProvider, CompletionRequest, GroqProvider};
pub use service::CompletionService;

/// Tracing target for the main library.
pub const TRACING_TARGET: &str = "insight_rig";

/// Tracing target for provider calls.
pub const TRACING_TARGET_PROVIDER: &str = "insight_rig::provider";
