//! Commit, tag, push and remote-release operations for one release attempt
//!
//! Every mutating call checks `dry_run` itself and only logs what it would
//! do, so the orchestrator never needs a second code path.

use crate::core::error::RailResult;
use crate::core::vcs::{ReleaseHost, SourceControl};
use std::path::PathBuf;

pub use crate::release::tags::format_tag;

pub struct GitOperations<'a> {
  scm: &'a dyn SourceControl,
  host: &'a dyn ReleaseHost,
  remote: &'a str,
  dry_run: bool,
}

impl<'a> GitOperations<'a> {
  pub fn new(scm: &'a dyn SourceControl, host: &'a dyn ReleaseHost, remote: &'a str, dry_run: bool) -> Self {
    Self {
      scm,
      host,
      remote,
      dry_run,
    }
  }

  pub fn remote(&self) -> &str {
    self.remote
  }

  /// Commit `paths`; returns the new commit hash (None in a dry run)
  ///
  /// Fails with `NothingToCommit` when the paths carry no change.
  pub fn commit_changes(&self, paths: &[PathBuf], message: &str) -> RailResult<Option<String>> {
    if self.dry_run {
      tracing::info!(files = paths.len(), message, "dry run: would commit");
      return Ok(None);
    }
    let hash = self.scm.commit_paths(paths, message)?;
    tracing::info!(commit = %hash, "release commit created");
    Ok(Some(hash))
  }

  /// Create an annotated tag at HEAD; returns whether a tag was created
  pub fn create_tag(&self, tag: &str, message: &str) -> RailResult<bool> {
    if self.dry_run {
      tracing::info!(tag, "dry run: would create tag");
      return Ok(false);
    }
    self.scm.create_tag(tag, message)?;
    tracing::info!(tag, "tag created");
    Ok(true)
  }

  /// Push a refspec to the configured remote; returns whether anything was pushed
  pub fn push_to_remote(&self, refspec: &str) -> RailResult<bool> {
    if self.dry_run {
      tracing::info!(remote = self.remote, refspec, "dry run: would push");
      return Ok(false);
    }
    self.scm.push(self.remote, refspec)?;
    Ok(true)
  }

  pub fn push_tag(&self, tag: &str) -> RailResult<bool> {
    self.push_to_remote(&format!("refs/tags/{}", tag))
  }

  /// Create the remote release; returns its URL (None in a dry run)
  pub fn create_release(&self, tag: &str, title: &str, notes: &str) -> RailResult<Option<String>> {
    if self.dry_run {
      tracing::info!(tag, title, "dry run: would create remote release");
      return Ok(None);
    }
    let url = self.host.create_release(tag, title, notes)?;
    tracing::info!(tag, url = %url, "remote release created");
    Ok(Some(url))
  }

  pub fn attach_assets(&self, tag: &str, files: &[PathBuf]) -> RailResult<()> {
    if files.is_empty() {
      return Ok(());
    }
    if self.dry_run {
      tracing::info!(tag, count = files.len(), "dry run: would attach assets");
      return Ok(());
    }
    self.host.upload_assets(tag, files)?;
    tracing::info!(tag, count = files.len(), "assets attached");
    Ok(())
  }

  pub fn edit_release_notes(&self, tag: &str, notes: &str) -> RailResult<()> {
    if self.dry_run {
      tracing::info!(tag, "dry run: would update release notes");
      return Ok(());
    }
    self.host.edit_notes(tag, notes)
  }

  pub fn delete_local_tag(&self, tag: &str) -> RailResult<()> {
    if self.dry_run {
      tracing::info!(tag, "dry run: would delete local tag");
      return Ok(());
    }
    self.scm.delete_local_tag(tag)
  }

  pub fn delete_remote_tag(&self, tag: &str) -> RailResult<()> {
    if self.dry_run {
      tracing::info!(tag, remote = self.remote, "dry run: would delete remote tag");
      return Ok(());
    }
    self.scm.delete_remote_tag(self.remote, tag)
  }

  pub fn delete_release(&self, tag: &str) -> RailResult<()> {
    if self.dry_run {
      tracing::info!(tag, "dry run: would delete remote release");
      return Ok(());
    }
    self.host.delete_release(tag)
  }
}
