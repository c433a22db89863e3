//! Repository state checks: clean working tree, release branch

use super::trait_def::{Check, CheckContext, CheckResult};
use crate::core::error::RailResult;

/// Uncommitted changes would be swept into the release commit
pub struct CleanTreeCheck;

impl Check for CleanTreeCheck {
  fn name(&self) -> &str {
    "clean-tree"
  }

  fn description(&self) -> &str {
    "Working tree has no uncommitted changes"
  }

  fn run(&self, ctx: &CheckContext<'_>) -> RailResult<CheckResult> {
    let manifest = &ctx.settings.workspace.manifest;
    let dirty: Vec<_> = ctx
      .scm
      .dirty_paths()?
      .into_iter()
      .filter(|p| p != manifest)
      .collect();

    if dirty.is_empty() {
      return Ok(CheckResult::pass(self.name(), "Working tree is clean"));
    }

    let mut listed: Vec<String> = dirty.iter().take(10).map(|p| format!("  {}", p.display())).collect();
    if dirty.len() > 10 {
      listed.push(format!("  ... and {} more", dirty.len() - 10));
    }

    Ok(CheckResult::error(
      self.name(),
      format!("{} uncommitted change(s):\n{}", dirty.len(), listed.join("\n")),
      Some("Commit or stash your changes before releasing"),
    ))
  }
}

/// Releases are cut only from configured branches
pub struct ReleaseBranchCheck;

impl Check for ReleaseBranchCheck {
  fn name(&self) -> &str {
    "release-branch"
  }

  fn description(&self) -> &str {
    "Current branch is a release branch"
  }

  fn run(&self, ctx: &CheckContext<'_>) -> RailResult<CheckResult> {
    let branch = ctx.scm.current_branch()?;
    let allowed = &ctx.settings.workspace.release_branches;

    if allowed.iter().any(|b| b == &branch) {
      Ok(CheckResult::pass(self.name(), format!("On release branch '{}'", branch)))
    } else {
      Ok(CheckResult::error(
        self.name(),
        format!("On '{}', releases are cut from: {}", branch, allowed.join(", ")),
        Some("Switch branches, or add this branch to [workspace].release_branches in shiprail.toml"),
      ))
    }
  }
}
