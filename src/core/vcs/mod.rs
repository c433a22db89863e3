//! Source control and release host abstractions
//!
//! Both are traits so the release pipeline can run against fakes in tests.
//! The real implementations shell out to `git` and `gh` through the
//! [`CommandRunner`](crate::core::exec::CommandRunner).

pub mod github;
pub mod system_git;
mod system_git_ops;

#[cfg(test)]
pub mod fake;

pub use github::GhHost;
pub use system_git::SystemGit;

use crate::core::error::RailResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Information about a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
  pub hash: String,
  pub author: String,
  /// Author date, ISO 8601
  pub timestamp: String,
  pub subject: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub body: String,
  /// Pull request number referenced in the subject
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pr: Option<u64>,
}

impl CommitInfo {
  pub fn short_hash(&self) -> &str {
    &self.hash[..self.hash.len().min(7)]
  }
}

/// Extract the first `#123` reference from a commit subject
pub fn parse_pr_number(subject: &str) -> Option<u64> {
  let bytes = subject.as_bytes();
  for (i, b) in bytes.iter().enumerate() {
    if *b != b'#' {
      continue;
    }
    let digits: String = subject[i + 1..].chars().take_while(|c| c.is_ascii_digit()).collect();
    if let Ok(n) = digits.parse() {
      return Some(n);
    }
  }
  None
}

/// Local repository operations the release pipeline needs
pub trait SourceControl: Send + Sync {
  /// Working tree root
  fn work_tree(&self) -> &Path;

  fn current_branch(&self) -> RailResult<String>;

  fn head_commit(&self) -> RailResult<String>;

  /// Paths with uncommitted changes, relative to the work tree
  fn dirty_paths(&self) -> RailResult<Vec<PathBuf>>;

  /// Commits in `from..to` (all of `to`'s history if `from` is None), newest first
  fn commits_between(&self, from: Option<&str>, to: &str, path: Option<&Path>) -> RailResult<Vec<CommitInfo>>;

  /// Tags matching a glob pattern
  fn list_tags(&self, pattern: &str) -> RailResult<Vec<String>>;

  fn tag_exists(&self, tag: &str) -> RailResult<bool>;

  fn remote_url(&self, remote: &str) -> RailResult<Option<String>>;

  /// Stage `paths` and commit; fails with `NothingToCommit` if nothing changed
  fn commit_paths(&self, paths: &[PathBuf], message: &str) -> RailResult<String>;

  /// Create an annotated tag at HEAD; fails with `TagExists`
  fn create_tag(&self, tag: &str, message: &str) -> RailResult<()>;

  fn delete_local_tag(&self, tag: &str) -> RailResult<()>;

  /// Push a refspec; fails with `PushRejected`
  fn push(&self, remote: &str, refspec: &str) -> RailResult<()>;

  fn delete_remote_tag(&self, remote: &str, tag: &str) -> RailResult<()>;
}

/// Remote release operations (the host's "releases" feature)
pub trait ReleaseHost: Send + Sync {
  /// Create a release for an existing tag; returns its URL
  fn create_release(&self, tag: &str, title: &str, notes: &str) -> RailResult<String>;

  fn upload_assets(&self, tag: &str, files: &[PathBuf]) -> RailResult<()>;

  fn edit_notes(&self, tag: &str, notes: &str) -> RailResult<()>;

  fn delete_release(&self, tag: &str) -> RailResult<()>;

  fn release_exists(&self, tag: &str) -> RailResult<bool>;

  /// File names of the assets attached to a release
  fn release_assets(&self, tag: &str) -> RailResult<Vec<String>>;
}
