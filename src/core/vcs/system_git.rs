//! System git backend
//!
//! Every call goes through the [`CommandRunner`] with:
//! - an isolated environment (only PATH and HOME survive)
//! - safe `-c` overrides so user config can't change output formats
//! - the workspace's git timeout

use crate::core::error::{GitError, RailError, RailResult};
use crate::core::exec::{CommandOutput, CommandRunner, CommandSpec};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Git backend using the system `git` binary
#[derive(Clone)]
pub struct SystemGit {
  runner: Arc<dyn CommandRunner>,

  /// Working tree root
  pub(crate) work_tree: PathBuf,

  timeout: Duration,
}

impl SystemGit {
  pub fn new(runner: Arc<dyn CommandRunner>, work_tree: PathBuf, timeout: Duration) -> Self {
    Self {
      runner,
      work_tree,
      timeout,
    }
  }

  /// Open the repository containing `path`
  pub fn open(runner: Arc<dyn CommandRunner>, path: &Path, timeout: Duration) -> RailResult<Self> {
    let probe = Self::new(runner, path.to_path_buf(), timeout);
    let output = probe.run(&["rev-parse", "--show-toplevel"])?;

    if !output.success() {
      if output.stderr.contains("not a git repository") {
        return Err(RailError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(RailError::message(format!(
        "Failed to open git repository: {}",
        output.stderr.trim()
      )));
    }

    Ok(Self {
      work_tree: PathBuf::from(output.stdout.trim()),
      ..probe
    })
  }

  /// Create a safe git command with isolated environment
  pub(crate) fn git_cmd(&self, args: &[&str]) -> CommandSpec {
    CommandSpec::new("git", self.timeout)
      .arg("-C")
      .arg(self.work_tree.to_string_lossy())
      .args(["-c", "advice.detachedHead=false"])
      .args(["-c", "core.quotePath=false"])
      .args(["-c", "color.ui=false"])
      .args(args.iter().copied())
      .isolated()
  }

  /// Run git, returning output whatever the exit status
  pub(crate) fn run(&self, args: &[&str]) -> RailResult<CommandOutput> {
    self.runner.run(&self.git_cmd(args))
  }

  /// Run git, failing with `CommandFailed` on a non-zero exit
  pub(crate) fn run_checked(&self, args: &[&str]) -> RailResult<String> {
    let output = self.run(args)?;
    if !output.success() {
      return Err(RailError::Git(GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: output.stderr.trim().to_string(),
      }));
    }
    Ok(output.stdout)
  }
}
