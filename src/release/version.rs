//! Version bumping and multi-file version synchronization
//!
//! The component manifest (`package.json` or `Cargo.toml`) is the source of
//! truth for the current version. Sync rules then stamp the new version into
//! every other file that carries it, and verification re-reads those files
//! independently before anything is published.

use crate::core::config::{ManifestKind, VersionSyncRule};
use crate::core::error::{RailError, RailResult, ResultExt};
use regex::NoExpand;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Semver component to increment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpKind {
  Patch,
  Minor,
  Major,
}

impl BumpKind {
  /// Apply bump to a semver version (pre-release and build metadata dropped)
  pub fn apply(&self, version: &Version) -> Version {
    match self {
      BumpKind::Major => Version::new(version.major + 1, 0, 0),
      BumpKind::Minor => Version::new(version.major, version.minor + 1, 0),
      BumpKind::Patch => Version::new(version.major, version.minor, version.patch + 1),
    }
  }
}

impl fmt::Display for BumpKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      BumpKind::Patch => "patch",
      BumpKind::Minor => "minor",
      BumpKind::Major => "major",
    };
    write!(f, "{}", s)
  }
}

impl FromStr for BumpKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "patch" => Ok(BumpKind::Patch),
      "minor" => Ok(BumpKind::Minor),
      "major" => Ok(BumpKind::Major),
      other => Err(format!("unknown bump kind '{}' (expected patch, minor or major)", other)),
    }
  }
}

/// Where the next version comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum VersionTarget {
  Bump(BumpKind),
  Exact(Version),
}

impl VersionTarget {
  pub fn resolve(&self, current: &Version) -> Version {
    match self {
      VersionTarget::Bump(kind) => kind.apply(current),
      VersionTarget::Exact(version) => version.clone(),
    }
  }
}

impl fmt::Display for VersionTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VersionTarget::Bump(kind) => write!(f, "{}", kind),
      VersionTarget::Exact(version) => write!(f, "{}", version),
    }
  }
}

fn manifest_kind(manifest: &Path) -> RailResult<ManifestKind> {
  ManifestKind::from_path(manifest).ok_or_else(|| {
    RailError::with_help(
      format!("Unsupported manifest: {}", manifest.display()),
      "Set manifestFile to a package.json or Cargo.toml",
    )
  })
}

/// Read the current version from a manifest
pub fn read_version(manifest: &Path) -> RailResult<Version> {
  let content = fs::read_to_string(manifest).with_context(|| format!("Failed to read {}", manifest.display()))?;

  let raw = match manifest_kind(manifest)? {
    ManifestKind::Npm => {
      let value: serde_json::Value = serde_json::from_str(&content)?;
      value
        .get("version")
        .and_then(|v| v.as_str())
        .map(String::from)
    }
    ManifestKind::Cargo => {
      let doc: toml_edit::DocumentMut = content.parse()?;
      doc
        .get("package")
        .and_then(|p| p.get("version"))
        .and_then(|v| v.as_str())
        .map(String::from)
    }
  };

  let raw = raw.ok_or_else(|| {
    RailError::with_help(
      format!("No version field in {}", manifest.display()),
      "Workspace-inherited versions are not supported; set an explicit version",
    )
  })?;

  Version::parse(raw.trim()).with_context(|| format!("Invalid version '{}' in {}", raw, manifest.display()))
}

/// Compute the next version without writing (dry-run path)
pub fn next_version(manifest: &Path, target: &VersionTarget) -> RailResult<(Version, Version)> {
  let current = read_version(manifest)?;
  let next = target.resolve(&current);
  Ok((current, next))
}

/// Bump the manifest version in place and return the new version
pub fn bump_version(manifest: &Path, kind: BumpKind) -> RailResult<Version> {
  let current = read_version(manifest)?;
  let next = kind.apply(&current);
  set_version(manifest, &next)?;
  Ok(next)
}

/// Write an explicit version into the manifest
pub fn set_version(manifest: &Path, version: &Version) -> RailResult<()> {
  // Round-trip through the parser so nothing unparseable reaches disk
  let version = Version::parse(&version.to_string())?;
  let content = fs::read_to_string(manifest).with_context(|| format!("Failed to read {}", manifest.display()))?;

  let updated = match manifest_kind(manifest)? {
    ManifestKind::Npm => {
      let mut value: serde_json::Value = serde_json::from_str(&content)?;
      let object = value
        .as_object_mut()
        .ok_or_else(|| RailError::message(format!("{} is not a JSON object", manifest.display())))?;
      object.insert("version".to_string(), serde_json::Value::String(version.to_string()));
      let mut out = serde_json::to_string_pretty(&value)?;
      if content.ends_with('\n') {
        out.push('\n');
      }
      out
    }
    ManifestKind::Cargo => {
      let mut doc: toml_edit::DocumentMut = content.parse()?;
      let package = doc
        .get_mut("package")
        .and_then(|p| p.as_table_mut())
        .ok_or_else(|| RailError::message(format!("No [package] section in {}", manifest.display())))?;
      package["version"] = toml_edit::value(version.to_string());
      doc.to_string()
    }
  };

  fs::write(manifest, updated).with_context(|| format!("Failed to write {}", manifest.display()))?;
  tracing::debug!(manifest = %manifest.display(), %version, "manifest version set");
  Ok(())
}

/// Per-rule sync failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncError {
  pub file: PathBuf,
  pub message: String,
}

/// Outcome of applying (or planning) every sync rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
  /// Files whose content changed (or would change), deduplicated, in rule order
  pub files_updated: Vec<PathBuf>,
  /// Optional files that do not exist
  pub skipped: Vec<PathBuf>,
  pub errors: Vec<SyncError>,
}

impl SyncReport {
  pub fn is_ok(&self) -> bool {
    self.errors.is_empty()
  }

  fn record_update(&mut self, file: &Path) {
    if !self.files_updated.iter().any(|f| f == file) {
      self.files_updated.push(file.to_path_buf());
    }
  }

  fn record_error(&mut self, file: &Path, message: impl Into<String>) {
    self.errors.push(SyncError {
      file: file.to_path_buf(),
      message: message.into(),
    });
  }
}

/// Rewrite one file's content for a rule; returns the new content
fn rewrite(content: &str, rule: &VersionSyncRule, version: &str) -> RailResult<String> {
  let regex = rule.regex()?;
  let expected = rule.expected(version);
  let limit = if rule.first_only { 1 } else { 0 };
  Ok(regex.replacen(content, limit, NoExpand(&expected)).into_owned())
}

fn sync_impl(root: &Path, rules: &[VersionSyncRule], version: &str, write: bool) -> SyncReport {
  let mut report = SyncReport::default();

  for rule in rules {
    let path = root.join(&rule.file);

    if !path.exists() {
      if rule.required {
        report.record_error(&rule.file, "required file does not exist");
      } else {
        tracing::info!(file = %rule.file.display(), "optional sync target missing, skipped");
        report.skipped.push(rule.file.clone());
      }
      continue;
    }

    let content = match fs::read_to_string(&path) {
      Ok(content) => content,
      Err(e) => {
        report.record_error(&rule.file, format!("read failed: {}", e));
        continue;
      }
    };

    let updated = match rewrite(&content, rule, version) {
      Ok(updated) => updated,
      Err(e) => {
        report.record_error(&rule.file, e.to_string());
        continue;
      }
    };

    // Unchanged is a no-op when the file already carries the version
    if updated == content {
      let matched = rule.regex().is_ok_and(|re| re.is_match(&content));
      if !matched && !content.contains(&rule.expected(version)) {
        report.record_error(&rule.file, format!("pattern `{}` matched nothing", rule.pattern));
      }
      continue;
    }

    if write && let Err(e) = fs::write(&path, &updated) {
      report.record_error(&rule.file, format!("write failed: {}", e));
      continue;
    }

    report.record_update(&rule.file);
  }

  report
}

/// Apply every rule in place
///
/// Failures are recorded per rule; processing always continues.
pub fn sync_versions(root: &Path, rules: &[VersionSyncRule], version: &str) -> SyncReport {
  let report = sync_impl(root, rules, version, true);
  tracing::info!(
    updated = report.files_updated.len(),
    errors = report.errors.len(),
    "version sync applied"
  );
  report
}

/// Report what `sync_versions` would change without touching any file
pub fn plan_sync(root: &Path, rules: &[VersionSyncRule], version: &str) -> SyncReport {
  sync_impl(root, rules, version, false)
}

/// First rule whose file does not carry the expected text
pub fn first_version_problem(root: &Path, rules: &[VersionSyncRule], version: &str) -> Option<String> {
  for rule in rules {
    let path = root.join(&rule.file);
    if !path.exists() {
      if rule.required {
        return Some(format!("{}: file does not exist", rule.file.display()));
      }
      continue;
    }

    let expected = rule.expected(version);
    match fs::read_to_string(&path) {
      Ok(content) if content.contains(&expected) => {}
      Ok(_) => return Some(format!("{}: `{}` not found", rule.file.display(), expected)),
      Err(e) => return Some(format!("{}: {}", rule.file.display(), e)),
    }
  }
  None
}

/// Re-read every rule's file and confirm it carries the version
pub fn verify_versions(root: &Path, rules: &[VersionSyncRule], version: &str) -> bool {
  first_version_problem(root, rules, version).is_none()
}
