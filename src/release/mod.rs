//! Release pipeline
//!
//! # Invariants
//!
//! 1. **Nothing is published before pre-flight passes**
//!    - Every check runs; the report lists all failures at once
//!    - Version files are verified after sync, before any publisher runs
//!
//! 2. **Every externally visible write is undoable or reported**
//!    - Tags, pushed tags, remote releases and registry uploads go on the undo ledger
//!    - A failed publish or tag step replays the ledger newest first
//!    - Undo failures become manual-cleanup instructions, never silent
//!
//! 3. **Every attempt past pre-flight is recorded**
//!    - `.shiprail/releases.json` gets one append-only entry per attempt
//!
//! # Layout
//!
//! - `orchestrator`: drives the step list, owns `ReleaseState`
//! - `version`, `tags`, `changelog`: pure-ish helpers over files and history
//! - `git_ops`: dry-run aware facade over source control and the release host
//! - `rollback`, `lock`, `manifest`: safety rails
//! - `remote`: remote mode (dispatch CI, poll with backoff)
//! - `report`: human and JSON rendering

pub mod changelog;
pub mod git_ops;
pub mod lock;
pub mod manifest;
pub mod orchestrator;
pub mod remote;
pub mod report;
pub mod rollback;
pub mod state;
pub mod tags;
pub mod version;

pub use orchestrator::{HostProvider, Orchestrator, StepObserver};
pub use report::{BatchReport, ReleaseReport};
pub use state::{Mode, ReleaseOptions};
