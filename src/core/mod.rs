//! Core building blocks shared by every shiprail command
//!
//! - **config**: workspace settings (shiprail.toml) and component configuration
//! - **context**: per-invocation context built once in main
//! - **error**: error taxonomy with help messages and exit codes
//! - **exec**: the external command seam with uniform timeouts
//! - **vcs**: source control and release host abstractions

pub mod config;
pub mod context;
pub mod error;
pub mod exec;
pub mod vcs;
