//! Check runner for executing the pre-flight battery

use super::trait_def::{Check, CheckContext, CheckResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of the full pre-flight battery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreflightReport {
  /// True only if every check passed
  pub passed: bool,
  pub checks: Vec<CheckResult>,
}

impl PreflightReport {
  pub fn from_results(checks: Vec<CheckResult>) -> Self {
    Self {
      passed: checks.iter().all(|c| c.passed),
      checks,
    }
  }

  /// Names of the checks that failed, in run order
  pub fn failed(&self) -> Vec<String> {
    self
      .checks
      .iter()
      .filter(|c| !c.passed)
      .map(|c| c.check_name.clone())
      .collect()
  }

  /// One line per check, for step output
  pub fn summary(&self) -> String {
    self
      .checks
      .iter()
      .map(|c| format!("{} {}: {}", if c.passed { "✅" } else { "❌" }, c.check_name, c.message))
      .collect::<Vec<_>>()
      .join("\n")
  }
}

/// Runs checks in registration order, never short-circuiting
pub struct CheckRunner {
  checks: Vec<Arc<dyn Check>>,
}

impl CheckRunner {
  pub fn new() -> Self {
    Self { checks: Vec::new() }
  }

  pub fn add_check(&mut self, check: Arc<dyn Check>) {
    self.checks.push(check);
  }

  pub fn run_all(&self, ctx: &CheckContext<'_>) -> PreflightReport {
    let mut results = Vec::with_capacity(self.checks.len());

    for check in &self.checks {
      tracing::debug!(check = check.name(), what = check.description(), "running check");
      match check.run(ctx) {
        Ok(result) => results.push(result),
        Err(err) => {
          // A check that cannot run counts as failed
          results.push(CheckResult::error(
            check.name(),
            format!("Check failed to run: {}", err),
            err.help_message(),
          ));
        }
      }
    }

    PreflightReport::from_results(results)
  }

  pub fn checks(&self) -> &[Arc<dyn Check>] {
    &self.checks
  }
}

impl Default for CheckRunner {
  fn default() -> Self {
    Self::new()
  }
}

/// Runner with every pre-flight check, in report order
pub fn create_preflight_runner() -> CheckRunner {
  let mut runner = CheckRunner::new();

  runner.add_check(Arc::new(super::working_tree::CleanTreeCheck));
  runner.add_check(Arc::new(super::working_tree::ReleaseBranchCheck));
  runner.add_check(Arc::new(super::commands::TestCommandCheck));
  runner.add_check(Arc::new(super::commands::BuildCommandCheck));
  runner.add_check(Arc::new(super::credentials::CredentialsCheck));

  runner
}

/// Run the full pre-flight battery for one component
pub fn run_checks(ctx: &CheckContext<'_>) -> PreflightReport {
  create_preflight_runner().run_all(ctx)
}
