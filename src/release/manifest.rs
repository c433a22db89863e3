//! Append-only release manifest
//!
//! Every finished release attempt (success, unverified, failed or rolled
//! back) becomes one entry. Entries are never rewritten; `save` refuses to
//! clobber entries another process appended since the manifest was loaded.

use crate::core::error::{RailError, RailResult, ResultExt};
use crate::release::state::{Mode, ReleaseArtifacts, ReleaseState, ReleaseStatus, StepError, VerificationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseManifest {
  pub format_version: u32,
  #[serde(default)]
  pub releases: Vec<SubmoduleRelease>,
}

impl Default for ReleaseManifest {
  fn default() -> Self {
    Self {
      format_version: FORMAT_VERSION,
      releases: Vec::new(),
    }
  }
}

/// One release attempt of one component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmoduleRelease {
  pub component: String,
  pub version: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tag: Option<String>,
  pub timestamp: DateTime<Utc>,
  pub mode: Mode,
  pub status: ReleaseStatus,
  #[serde(default)]
  pub artifacts: ReleaseArtifacts,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub verification: Option<VerificationResult>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub changelog: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub commit: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<StepError>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub manual_cleanup: Vec<String>,
}

impl SubmoduleRelease {
  /// Snapshot a finished attempt
  pub fn from_state(state: &ReleaseState) -> Self {
    Self {
      component: state.config.name.clone(),
      version: state.version.as_ref().map(ToString::to_string).unwrap_or_default(),
      tag: state.artifacts.tag.clone(),
      timestamp: state.started_at,
      mode: state.options.mode,
      status: state.final_status(),
      artifacts: state.artifacts.clone(),
      verification: state.verification.clone(),
      changelog: state.changelog.clone(),
      commit: state.commit.clone(),
      error: state.first_error().cloned(),
      manual_cleanup: state
        .rollback
        .as_ref()
        .map(|r| r.manual_cleanup.clone())
        .unwrap_or_default(),
    }
  }

  fn same_attempt(&self, other: &SubmoduleRelease) -> bool {
    self.component == other.component && self.version == other.version && self.timestamp == other.timestamp
  }
}

/// Loads, appends to and saves the release manifest
pub struct ManifestWriter {
  path: PathBuf,
  manifest: ReleaseManifest,
}

impl ManifestWriter {
  /// Read the manifest, or start an empty one if the file is absent
  pub fn load_manifest(path: &Path) -> RailResult<Self> {
    Ok(Self {
      path: path.to_path_buf(),
      manifest: read_manifest(path)?,
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn releases(&self) -> &[SubmoduleRelease] {
    &self.manifest.releases
  }

  /// Entries for one component, oldest first
  pub fn history(&self, component: &str) -> Vec<&SubmoduleRelease> {
    self
      .manifest
      .releases
      .iter()
      .filter(|r| r.component == component)
      .collect()
  }

  /// Append an entry; an identical (component, version, timestamp) is refused
  pub fn add_release(&mut self, record: SubmoduleRelease) -> RailResult<()> {
    if self.manifest.releases.iter().any(|r| r.same_attempt(&record)) {
      return Err(RailError::message(format!(
        "Release manifest already has {} {} at {}",
        record.component,
        record.version,
        record.timestamp.to_rfc3339()
      )));
    }
    self.manifest.releases.push(record);
    Ok(())
  }

  /// Write back via a temporary file and rename
  ///
  /// Fails if the on-disk entries are no longer a prefix of ours, which
  /// means another process wrote to the manifest since it was loaded.
  pub fn save(&self) -> RailResult<()> {
    let on_disk = read_manifest(&self.path)?;
    let ours = &self.manifest.releases;
    let is_prefix = on_disk.releases.len() <= ours.len() && on_disk.releases[..] == ours[..on_disk.releases.len()];
    if !is_prefix {
      return Err(RailError::with_help(
        format!("{} was modified by another process", self.path.display()),
        "Re-run the command; the manifest is append-only and was not overwritten",
      ));
    }

    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut content = serde_json::to_string_pretty(&self.manifest)?;
    content.push('\n');
    let tmp = self.path.with_extension("json.tmp");
    fs::write(&tmp, content).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, &self.path).with_context(|| format!("Failed to replace {}", self.path.display()))?;
    tracing::debug!(path = %self.path.display(), entries = ours.len(), "release manifest saved");
    Ok(())
  }
}

fn read_manifest(path: &Path) -> RailResult<ReleaseManifest> {
  if !path.exists() {
    return Ok(ReleaseManifest::default());
  }
  let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
  let manifest: ReleaseManifest =
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
  if manifest.format_version > FORMAT_VERSION {
    return Err(RailError::with_help(
      format!(
        "{} uses manifest format {} (this build understands {})",
        path.display(),
        manifest.format_version,
        FORMAT_VERSION
      ),
      "Upgrade shiprail",
    ));
  }
  Ok(manifest)
}
