//! Pre-flight checks: the go/no-go gate before any release mutation
//!
//! # Built-in Checks
//!
//! - **clean-tree**: no uncommitted changes (the release manifest is ignored)
//! - **release-branch**: HEAD is on a configured release branch
//! - **tests** / **build**: the component's commands exit 0
//! - **credentials**: tokens for every registry this run touches
//!
//! The battery never short-circuits; `PreflightReport::passed` is false if
//! any single check failed.

mod commands;
mod credentials;
mod runner;
mod trait_def;
mod working_tree;

pub use runner::{PreflightReport, run_checks};
pub use trait_def::{CheckContext, CheckResult};
