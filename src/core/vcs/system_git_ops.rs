//! SourceControl implementation for SystemGit (history, tags, commits, pushes)

use super::system_git::SystemGit;
use super::{CommitInfo, SourceControl, parse_pr_number};
use crate::core::error::{GitError, RailError, RailResult};
use crate::utils;
use std::path::{Path, PathBuf};

/// Field and record separators for `git log --format`
const FIELD_SEP: char = '\u{1f}';
const RECORD_SEP: char = '\u{1e}';

impl SourceControl for SystemGit {
  fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  fn current_branch(&self) -> RailResult<String> {
    let output = self.run(&["rev-parse", "--abbrev-ref", "HEAD"])?;
    if !output.success() {
      return Ok("HEAD".to_string()); // Detached HEAD or unborn branch
    }
    Ok(output.stdout.trim().to_string())
  }

  fn head_commit(&self) -> RailResult<String> {
    Ok(self.run_checked(&["rev-parse", "HEAD"])?.trim().to_string())
  }

  fn dirty_paths(&self) -> RailResult<Vec<PathBuf>> {
    let stdout = self.run_checked(&["status", "--porcelain", "--untracked-files=all"])?;
    Ok(parse_porcelain(&stdout))
  }

  fn commits_between(&self, from: Option<&str>, to: &str, path: Option<&Path>) -> RailResult<Vec<CommitInfo>> {
    let format = format!("--format=%H{f}%an{f}%aI{f}%s{f}%b{r}", f = "%x1f", r = "%x1e");
    let range = match from {
      Some(from) => format!("{}..{}", from, to),
      None => to.to_string(),
    };
    let path_arg = path.map(utils::path_to_git_format);

    let mut args = vec!["log", "--no-merges", format.as_str(), range.as_str()];
    if let Some(path) = path_arg.as_deref() {
      args.extend(["--", path]);
    }

    let stdout = self.run_checked(&args)?;
    Ok(parse_log(&stdout))
  }

  fn list_tags(&self, pattern: &str) -> RailResult<Vec<String>> {
    let stdout = self.run_checked(&["tag", "--list", pattern])?;
    Ok(
      stdout
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect(),
    )
  }

  fn tag_exists(&self, tag: &str) -> RailResult<bool> {
    let reference = format!("refs/tags/{}", tag);
    Ok(self.run(&["rev-parse", "-q", "--verify", &reference])?.success())
  }

  fn remote_url(&self, remote: &str) -> RailResult<Option<String>> {
    let output = self.run(&["remote", "get-url", remote])?;
    if !output.success() {
      return Ok(None);
    }
    let url = output.stdout.trim();
    Ok((!url.is_empty()).then(|| url.to_string()))
  }

  fn commit_paths(&self, paths: &[PathBuf], message: &str) -> RailResult<String> {
    let path_strings: Vec<String> = paths.iter().map(|p| utils::path_to_git_format(p)).collect();
    let mut add = vec!["add", "--"];
    add.extend(path_strings.iter().map(String::as_str));
    self.run_checked(&add)?;

    // Exit 0 means the index matches HEAD
    if self.run(&["diff", "--cached", "--quiet"])?.success() {
      return Err(RailError::Git(GitError::NothingToCommit));
    }

    self.run_checked(&["commit", "-m", message])?;
    self.head_commit()
  }

  fn create_tag(&self, tag: &str, message: &str) -> RailResult<()> {
    if self.tag_exists(tag)? {
      return Err(RailError::Git(GitError::TagExists { tag: tag.to_string() }));
    }
    let output = self.run(&["tag", "-a", tag, "-m", message])?;
    if !output.success() {
      if output.stderr.contains("already exists") {
        return Err(RailError::Git(GitError::TagExists { tag: tag.to_string() }));
      }
      return Err(RailError::Git(GitError::CommandFailed {
        command: format!("git tag -a {}", tag),
        stderr: output.stderr.trim().to_string(),
      }));
    }
    Ok(())
  }

  fn delete_local_tag(&self, tag: &str) -> RailResult<()> {
    self.run_checked(&["tag", "-d", tag])?;
    Ok(())
  }

  fn push(&self, remote: &str, refspec: &str) -> RailResult<()> {
    let output = self.run(&["push", remote, refspec])?;
    if !output.success() {
      return Err(RailError::Git(GitError::PushRejected {
        remote: remote.to_string(),
        refspec: refspec.to_string(),
        reason: output.stderr.trim().to_string(),
      }));
    }
    tracing::info!(remote, refspec, "pushed");
    Ok(())
  }

  fn delete_remote_tag(&self, remote: &str, tag: &str) -> RailResult<()> {
    let refspec = format!(":refs/tags/{}", tag);
    self.run_checked(&["push", remote, &refspec])?;
    Ok(())
  }
}

/// Parse `git status --porcelain` into paths (rename targets for renames)
fn parse_porcelain(stdout: &str) -> Vec<PathBuf> {
  stdout
    .lines()
    .filter(|line| line.len() > 3)
    .map(|line| {
      let path = &line[3..];
      let path = path.rsplit(" -> ").next().unwrap_or(path);
      PathBuf::from(path.trim_matches('"'))
    })
    .collect()
}

/// Parse the record-separated `git log` format used by `commits_between`
fn parse_log(stdout: &str) -> Vec<CommitInfo> {
  stdout
    .split(RECORD_SEP)
    .filter_map(|record| {
      let record = record.trim_start_matches('\n');
      if record.trim().is_empty() {
        return None;
      }
      let mut fields = record.splitn(5, FIELD_SEP);
      let hash = fields.next()?.trim().to_string();
      let author = fields.next()?.to_string();
      let timestamp = fields.next()?.to_string();
      let subject = fields.next()?.to_string();
      let body = fields.next().unwrap_or("").trim().to_string();
      let pr = parse_pr_number(&subject);
      Some(CommitInfo {
        hash,
        author,
        timestamp,
        subject,
        body,
        pr,
      })
    })
    .collect()
}
