//! CLI commands for shiprail
//!
//! ## Releasing
//! - **release**: run the pipeline for one or more components
//! - **verify**: re-check registry visibility of a released version
//!
//! ## Inspection & maintenance
//! - **sync**: rewrite or check version strings
//! - **changelog**: preview release notes
//! - **config**: show a component's resolved configuration
//! - **history**: list recorded release attempts
//!
//! All commands accept `&ReleaseContext` so the repository and settings are
//! resolved once.

pub mod changelog;
pub mod config;
pub mod history;
pub mod release;
pub mod sync;
pub mod verify;

pub use changelog::run_changelog;
pub use config::run_config;
pub use history::run_history;
pub use release::{ReleaseArgs, run_release};
pub use sync::run_sync;
pub use verify::run_verify;
