//! Release host backed by the `gh` CLI
//!
//! Unlike git, gh runs with the caller's environment: it authenticates
//! through GH_TOKEN / GITHUB_TOKEN.

use super::ReleaseHost;
use crate::core::error::{GitError, RailError, RailResult};
use crate::core::exec::{CommandOutput, CommandRunner, CommandSpec};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// State of one remote workflow run as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkflowRun {
  #[serde(rename = "databaseId", default)]
  pub id: u64,
  #[serde(default)]
  pub status: String,
  #[serde(default)]
  pub conclusion: String,
  #[serde(default)]
  pub url: String,
}

#[derive(Deserialize)]
struct ReleaseView {
  #[serde(default)]
  assets: Vec<ReleaseAsset>,
}

#[derive(Deserialize)]
struct ReleaseAsset {
  name: String,
}

impl WorkflowRun {
  pub fn is_complete(&self) -> bool {
    self.status == "completed"
  }

  pub fn succeeded(&self) -> bool {
    self.is_complete() && self.conclusion == "success"
  }
}

pub struct GhHost {
  runner: Arc<dyn CommandRunner>,
  cwd: PathBuf,
  /// `owner/name`; when None gh infers the repository from the work tree
  repo: Option<String>,
  timeout: Duration,
}

impl GhHost {
  pub fn new(runner: Arc<dyn CommandRunner>, cwd: PathBuf, repo: Option<String>, timeout: Duration) -> Self {
    Self {
      runner,
      cwd,
      repo,
      timeout,
    }
  }

  fn gh_cmd(&self, args: &[&str]) -> CommandSpec {
    let mut spec = CommandSpec::new("gh", self.timeout)
      .args(args.iter().copied())
      .current_dir(&self.cwd)
      .env("GH_PROMPT_DISABLED", "1")
      .env("NO_COLOR", "1");
    if let Some(repo) = &self.repo {
      spec = spec.args(["--repo", repo.as_str()]);
    }
    spec
  }

  fn run_checked(&self, operation: &str, args: &[&str]) -> RailResult<CommandOutput> {
    let output = self.runner.run(&self.gh_cmd(args))?;
    if !output.success() {
      return Err(RailError::Git(GitError::HostFailed {
        operation: operation.to_string(),
        stderr: output.combined(),
      }));
    }
    Ok(output)
  }

  /// Dispatch a workflow run with string inputs
  pub fn trigger_workflow(&self, workflow: &str, git_ref: &str, inputs: &[(String, String)]) -> RailResult<()> {
    let fields: Vec<String> = inputs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    let mut args = vec!["workflow", "run", workflow, "--ref", git_ref];
    for field in &fields {
      args.extend(["-f", field.as_str()]);
    }
    self.run_checked("workflow run", &args)?;
    Ok(())
  }

  /// Most recent run of `workflow` on `branch`
  pub fn latest_run(&self, workflow: &str, branch: &str) -> RailResult<Option<WorkflowRun>> {
    let output = self.run_checked(
      "run list",
      &[
        "run",
        "list",
        "--workflow",
        workflow,
        "--branch",
        branch,
        "--limit",
        "1",
        "--json",
        "databaseId,status,conclusion,url",
      ],
    )?;
    let runs: Vec<WorkflowRun> = serde_json::from_str(output.stdout.trim())?;
    Ok(runs.into_iter().next())
  }

  pub fn run_status(&self, run_id: u64) -> RailResult<WorkflowRun> {
    let id = run_id.to_string();
    let output = self.run_checked(
      "run view",
      &["run", "view", &id, "--json", "databaseId,status,conclusion,url"],
    )?;
    Ok(serde_json::from_str(output.stdout.trim())?)
  }
}

impl ReleaseHost for GhHost {
  fn create_release(&self, tag: &str, title: &str, notes: &str) -> RailResult<String> {
    let output = self.run_checked(
      "release create",
      &["release", "create", tag, "--verify-tag", "--title", title, "--notes", notes],
    )?;
    Ok(output.stdout.trim().to_string())
  }

  fn upload_assets(&self, tag: &str, files: &[PathBuf]) -> RailResult<()> {
    let files: Vec<String> = files.iter().map(|f| f.to_string_lossy().into_owned()).collect();
    let mut args = vec!["release", "upload", tag, "--clobber"];
    args.extend(files.iter().map(String::as_str));
    self.run_checked("release upload", &args)?;
    Ok(())
  }

  fn edit_notes(&self, tag: &str, notes: &str) -> RailResult<()> {
    self.run_checked("release edit", &["release", "edit", tag, "--notes", notes])?;
    Ok(())
  }

  fn delete_release(&self, tag: &str) -> RailResult<()> {
    self.run_checked("release delete", &["release", "delete", tag, "--yes"])?;
    Ok(())
  }

  fn release_exists(&self, tag: &str) -> RailResult<bool> {
    let output = self.runner.run(&self.gh_cmd(&["release", "view", tag, "--json", "url"]))?;
    Ok(output.success())
  }

  fn release_assets(&self, tag: &str) -> RailResult<Vec<String>> {
    let output = self.run_checked("release view", &["release", "view", tag, "--json", "assets"])?;
    let view: ReleaseView = serde_json::from_str(output.stdout.trim())?;
    Ok(view.assets.into_iter().map(|asset| asset.name).collect())
  }
}
