//! Key verification, provider submission, and the end-to-end run.
//!
//! This crate ties sitemap discovery to the IndexNow protocol: prove site
//! ownership, collect the URL list, then notify every provider.

pub mod dispatch;
pub mod key;
pub mod pipeline;

pub use dispatch::{dispatch_all, submit};
pub use key::{key_file_url, validate_key_format, verify_key};
pub use pipeline::{ProgressReporter, RunConfig, RunSummary, SilentProgress, run};
