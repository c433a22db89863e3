//! Check trait abstraction for pre-flight validation
//!
//! Every go/no-go condition implements [`Check`]. A check that cannot decide
//! returns a pass with a "Skipped" message rather than being filtered out,
//! so the report always shows the full battery.

use crate::core::config::{ArtifactKind, ComponentConfig, Environment, WorkspaceSettings};
use crate::core::error::RailResult;
use crate::core::exec::CommandRunner;
use crate::core::vcs::SourceControl;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Severity level for check results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  /// Informational message (not an issue)
  Info,
  /// Error (blocking, must be fixed)
  Error,
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Severity::Info => write!(f, "INFO"),
      Severity::Error => write!(f, "ERROR"),
    }
  }
}

/// Result of running a check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
  /// Name of the check that ran
  pub check_name: String,
  /// Whether the check passed
  pub passed: bool,
  pub severity: Severity,
  /// Human-readable message
  pub message: String,
  /// Optional suggested fix
  #[serde(skip_serializing_if = "Option::is_none")]
  pub suggestion: Option<String>,
  /// Captured command output, for command checks
  #[serde(skip_serializing_if = "Option::is_none")]
  pub output: Option<String>,
}

impl CheckResult {
  /// Create a passing check result
  pub fn pass(check_name: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      check_name: check_name.into(),
      passed: true,
      severity: Severity::Info,
      message: message.into(),
      suggestion: None,
      output: None,
    }
  }

  /// Create a failing check result with error severity
  pub fn error(check_name: impl Into<String>, message: impl Into<String>, suggestion: Option<impl Into<String>>) -> Self {
    Self {
      check_name: check_name.into(),
      passed: false,
      severity: Severity::Error,
      message: message.into(),
      suggestion: suggestion.map(|s| s.into()),
      output: None,
    }
  }

  /// Attach captured output
  pub fn with_output(mut self, output: impl Into<String>) -> Self {
    let output = output.into();
    if !output.trim().is_empty() {
      self.output = Some(output);
    }
    self
  }
}

/// Everything a pre-flight check may look at
pub struct CheckContext<'a> {
  pub root: &'a Path,
  pub config: &'a ComponentConfig,
  pub settings: &'a WorkspaceSettings,
  pub env: &'a Environment,
  pub scm: &'a dyn SourceControl,
  pub runner: &'a dyn CommandRunner,
  pub dry_run: bool,
  pub skip_tests: bool,
  pub skip_build: bool,
  /// Artifact kinds this run will publish
  pub kinds: &'a [ArtifactKind],
}

/// Pre-flight check
///
/// Checks never abort the battery: an `Err` from `run` is converted into a
/// failed result by the runner.
pub trait Check: Send + Sync {
  /// Unique name for this check (kebab-case)
  fn name(&self) -> &str;

  /// Human-readable description of what this check validates
  fn description(&self) -> &str;

  fn run(&self, ctx: &CheckContext<'_>) -> RailResult<CheckResult>;
}
