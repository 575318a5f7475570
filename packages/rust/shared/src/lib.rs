//! Shared types, error model, and configuration for the IndexNow submitter.
//!
//! This crate is the foundation depended on by all other workspace crates.
//! It provides:
//! - [`IndexNowError`] — the unified error type
//! - Domain types ([`Provider`], [`IndexNowRequest`], [`SubmissionOutcome`])
//! - Configuration ([`AppConfig`], [`ClientConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ClientConfig, DEFAULT_USER_AGENT, HttpConfig, SubmissionConfig, config_dir,
    config_file_path, load_config, load_config_from,
};
pub use error::{IndexNowError, Result};
pub use types::{
    DispatchPolicy, IndexNowRequest, PROVIDERS, Provider, SubmissionOutcome, SubmissionReport,
    find_provider, select_providers, site_host,
};
