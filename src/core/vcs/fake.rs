//! In-memory source control and release host for pipeline tests

use super::{CommitInfo, ReleaseHost, SourceControl};
use crate::core::error::{GitError, RailError, RailResult};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Default)]
struct RepoState {
  branch: String,
  dirty: Vec<PathBuf>,
  history: Vec<CommitInfo>,
  local_tags: BTreeSet<String>,
  remote_tags: BTreeSet<String>,
  commits_made: Vec<String>,
  pushes: Vec<String>,
  reject_push: Option<String>,
  remote_url: Option<String>,
}

/// Records every mutation so tests can assert on side effects
pub struct FakeSourceControl {
  root: PathBuf,
  state: Mutex<RepoState>,
}

impl FakeSourceControl {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self {
      root: root.into(),
      state: Mutex::new(RepoState {
        branch: "main".to_string(),
        remote_url: Some("git@github.com:acme/tools.git".to_string()),
        ..Default::default()
      }),
    }
  }

  pub fn set_branch(&self, branch: &str) {
    self.state.lock().unwrap().branch = branch.to_string();
  }

  pub fn set_dirty(&self, paths: &[&str]) {
    self.state.lock().unwrap().dirty = paths.iter().map(PathBuf::from).collect();
  }

  pub fn add_commit(&self, hash: &str, subject: &str) {
    self.state.lock().unwrap().history.insert(
      0,
      CommitInfo {
        hash: hash.to_string(),
        author: "Test".to_string(),
        timestamp: "2024-01-01T00:00:00+00:00".to_string(),
        subject: subject.to_string(),
        body: String::new(),
        pr: super::parse_pr_number(subject),
      },
    );
  }

  pub fn add_tag(&self, tag: &str) {
    let mut state = self.state.lock().unwrap();
    state.local_tags.insert(tag.to_string());
    state.remote_tags.insert(tag.to_string());
  }

  pub fn reject_pushes(&self, reason: &str) {
    self.state.lock().unwrap().reject_push = Some(reason.to_string());
  }

  pub fn local_tags(&self) -> Vec<String> {
    self.state.lock().unwrap().local_tags.iter().cloned().collect()
  }

  pub fn remote_tags(&self) -> Vec<String> {
    self.state.lock().unwrap().remote_tags.iter().cloned().collect()
  }

  pub fn commits_made(&self) -> Vec<String> {
    self.state.lock().unwrap().commits_made.clone()
  }

  pub fn pushes(&self) -> Vec<String> {
    self.state.lock().unwrap().pushes.clone()
  }
}

fn glob_matches(pattern: &str, tag: &str) -> bool {
  match pattern.split_once('*') {
    Some((prefix, suffix)) => tag.starts_with(prefix) && tag.ends_with(suffix),
    None => pattern == tag,
  }
}

impl SourceControl for FakeSourceControl {
  fn work_tree(&self) -> &Path {
    &self.root
  }

  fn current_branch(&self) -> RailResult<String> {
    Ok(self.state.lock().unwrap().branch.clone())
  }

  fn head_commit(&self) -> RailResult<String> {
    let state = self.state.lock().unwrap();
    Ok(
      state
        .history
        .first()
        .map(|c| c.hash.clone())
        .unwrap_or_else(|| "0000000".to_string()),
    )
  }

  fn dirty_paths(&self) -> RailResult<Vec<PathBuf>> {
    Ok(self.state.lock().unwrap().dirty.clone())
  }

  fn commits_between(&self, _from: Option<&str>, _to: &str, _path: Option<&Path>) -> RailResult<Vec<CommitInfo>> {
    Ok(self.state.lock().unwrap().history.clone())
  }

  fn list_tags(&self, pattern: &str) -> RailResult<Vec<String>> {
    let state = self.state.lock().unwrap();
    Ok(
      state
        .local_tags
        .iter()
        .filter(|t| glob_matches(pattern, t))
        .cloned()
        .collect(),
    )
  }

  fn tag_exists(&self, tag: &str) -> RailResult<bool> {
    Ok(self.state.lock().unwrap().local_tags.contains(tag))
  }

  fn remote_url(&self, _remote: &str) -> RailResult<Option<String>> {
    Ok(self.state.lock().unwrap().remote_url.clone())
  }

  fn commit_paths(&self, paths: &[PathBuf], message: &str) -> RailResult<String> {
    if paths.is_empty() {
      return Err(RailError::Git(GitError::NothingToCommit));
    }
    let mut state = self.state.lock().unwrap();
    let hash = format!("c0ffee{:02}", state.commits_made.len());
    state.commits_made.push(message.to_string());
    state.dirty.retain(|d| !paths.contains(d));
    state.history.insert(
      0,
      CommitInfo {
        hash: hash.clone(),
        author: "shiprail".to_string(),
        timestamp: "2024-01-01T00:00:00+00:00".to_string(),
        subject: message.to_string(),
        body: String::new(),
        pr: None,
      },
    );
    Ok(hash)
  }

  fn create_tag(&self, tag: &str, _message: &str) -> RailResult<()> {
    let mut state = self.state.lock().unwrap();
    if !state.local_tags.insert(tag.to_string()) {
      return Err(RailError::Git(GitError::TagExists { tag: tag.to_string() }));
    }
    Ok(())
  }

  fn delete_local_tag(&self, tag: &str) -> RailResult<()> {
    self.state.lock().unwrap().local_tags.remove(tag);
    Ok(())
  }

  fn push(&self, remote: &str, refspec: &str) -> RailResult<()> {
    let mut state = self.state.lock().unwrap();
    if let Some(reason) = &state.reject_push {
      return Err(RailError::Git(GitError::PushRejected {
        remote: remote.to_string(),
        refspec: refspec.to_string(),
        reason: reason.clone(),
      }));
    }
    if let Some(tag) = refspec.strip_prefix("refs/tags/") {
      state.remote_tags.insert(tag.to_string());
    }
    state.pushes.push(refspec.to_string());
    Ok(())
  }

  fn delete_remote_tag(&self, _remote: &str, tag: &str) -> RailResult<()> {
    self.state.lock().unwrap().remote_tags.remove(tag);
    Ok(())
  }
}

#[derive(Default)]
struct HostState {
  releases: BTreeMap<String, String>,
  assets: BTreeMap<String, Vec<PathBuf>>,
  fail_create: bool,
  fail_delete: bool,
}

/// Release host keeping releases in memory
#[derive(Default)]
pub struct FakeHost {
  state: Mutex<HostState>,
}

impl FakeHost {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn fail_create(&self) {
    self.state.lock().unwrap().fail_create = true;
  }

  pub fn fail_delete(&self) {
    self.state.lock().unwrap().fail_delete = true;
  }

  pub fn releases(&self) -> Vec<String> {
    self.state.lock().unwrap().releases.keys().cloned().collect()
  }

  pub fn notes(&self, tag: &str) -> Option<String> {
    self.state.lock().unwrap().releases.get(tag).cloned()
  }

  pub fn assets(&self, tag: &str) -> Vec<PathBuf> {
    self.state.lock().unwrap().assets.get(tag).cloned().unwrap_or_default()
  }
}

fn host_error(operation: &str, stderr: &str) -> RailError {
  RailError::Git(GitError::HostFailed {
    operation: operation.to_string(),
    stderr: stderr.to_string(),
  })
}

impl ReleaseHost for FakeHost {
  fn create_release(&self, tag: &str, _title: &str, notes: &str) -> RailResult<String> {
    let mut state = self.state.lock().unwrap();
    if state.fail_create {
      return Err(host_error("release create", "HTTP 422"));
    }
    state.releases.insert(tag.to_string(), notes.to_string());
    Ok(format!("https://github.com/acme/tools/releases/tag/{}", tag))
  }

  fn upload_assets(&self, tag: &str, files: &[PathBuf]) -> RailResult<()> {
    let mut state = self.state.lock().unwrap();
    if !state.releases.contains_key(tag) {
      return Err(host_error("release upload", "release not found"));
    }
    state.assets.entry(tag.to_string()).or_default().extend(files.iter().cloned());
    Ok(())
  }

  fn edit_notes(&self, tag: &str, notes: &str) -> RailResult<()> {
    let mut state = self.state.lock().unwrap();
    match state.releases.get_mut(tag) {
      Some(existing) => {
        *existing = notes.to_string();
        Ok(())
      }
      None => Err(host_error("release edit", "release not found")),
    }
  }

  fn delete_release(&self, tag: &str) -> RailResult<()> {
    let mut state = self.state.lock().unwrap();
    if state.fail_delete {
      return Err(host_error("release delete", "HTTP 500"));
    }
    state.releases.remove(tag);
    state.assets.remove(tag);
    Ok(())
  }

  fn release_exists(&self, tag: &str) -> RailResult<bool> {
    Ok(self.state.lock().unwrap().releases.contains_key(tag))
  }

  fn release_assets(&self, tag: &str) -> RailResult<Vec<String>> {
    let state = self.state.lock().unwrap();
    if !state.releases.contains_key(tag) {
      return Err(host_error("release view", "release not found"));
    }
    Ok(
      state
        .assets
        .get(tag)
        .into_iter()
        .flatten()
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect(),
    )
  }
}
