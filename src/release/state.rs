//! Release attempt state: options, per-step results, artifacts and the undo ledger
//!
//! Only the orchestrator mutates a [`ReleaseState`]; everything else reads
//! the finished snapshot through the report or the manifest entry.

use crate::checks::PreflightReport;
use crate::core::config::{ArtifactKind, ComponentConfig, TagTiming};
use crate::core::error::{ErrorKind, RailError};
use crate::publish::{BinaryArtifact, PublishOutcome, VerifyOutcome};
use crate::release::version::VersionTarget;
use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Where the pipeline runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
  #[default]
  Local,
  /// Hand off to a CI workflow and watch it
  Remote,
}

impl fmt::Display for Mode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Mode::Local => write!(f, "local"),
      Mode::Remote => write!(f, "remote"),
    }
  }
}

/// What the caller asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOptions {
  pub components: Vec<String>,
  pub target: VersionTarget,
  pub dry_run: bool,
  pub skip_tests: bool,
  pub skip_build: bool,
  pub skip_verify: bool,
  /// Restrict to these kinds; empty means every configured kind
  pub only: Vec<ArtifactKind>,
  pub mode: Mode,
  /// Overrides `timeouts.workflow_secs` for remote mode
  pub remote_timeout: Option<Duration>,
}

impl Default for ReleaseOptions {
  fn default() -> Self {
    Self {
      components: Vec::new(),
      target: VersionTarget::Bump(crate::release::version::BumpKind::Patch),
      dry_run: false,
      skip_tests: false,
      skip_build: false,
      skip_verify: false,
      only: Vec::new(),
      mode: Mode::Local,
      remote_timeout: None,
    }
  }
}

impl ReleaseOptions {
  /// Kinds this run will publish: configured, then narrowed by `only`
  pub fn effective_kinds(&self, config: &ComponentConfig) -> Vec<ArtifactKind> {
    config
      .artifact_kinds()
      .into_iter()
      .filter(|kind| self.only.is_empty() || self.only.contains(kind))
      .collect()
  }
}

/// One stage of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStep {
  Preflight,
  VersionBump,
  VersionSync,
  Build,
  Publish(ArtifactKind),
  GitTagAndRelease,
  Verify,
  Changelog,
  ManifestWrite,
  RemoteTrigger,
  RemoteMonitor,
}

impl PipelineStep {
  pub fn name(&self) -> String {
    match self {
      PipelineStep::Preflight => "preflight".to_string(),
      PipelineStep::VersionBump => "versionBump".to_string(),
      PipelineStep::VersionSync => "versionSync".to_string(),
      PipelineStep::Build => "build".to_string(),
      PipelineStep::Publish(kind) => format!("publish:{}", kind),
      PipelineStep::GitTagAndRelease => "gitTagAndRelease".to_string(),
      PipelineStep::Verify => "verify".to_string(),
      PipelineStep::Changelog => "changelog".to_string(),
      PipelineStep::ManifestWrite => "manifestWrite".to_string(),
      PipelineStep::RemoteTrigger => "remoteTrigger".to_string(),
      PipelineStep::RemoteMonitor => "remoteMonitor".to_string(),
    }
  }

  fn publish_steps() -> impl Iterator<Item = PipelineStep> {
    ArtifactKind::ALL.into_iter().map(PipelineStep::Publish)
  }

  /// Local pipeline; `before-publish` moves tagging ahead of the publish steps
  pub fn local_pipeline(timing: TagTiming) -> Vec<PipelineStep> {
    let mut steps = vec![
      PipelineStep::Preflight,
      PipelineStep::VersionBump,
      PipelineStep::VersionSync,
      PipelineStep::Build,
    ];
    match timing {
      TagTiming::AfterPublish => {
        steps.extend(Self::publish_steps());
        steps.push(PipelineStep::GitTagAndRelease);
      }
      TagTiming::BeforePublish => {
        steps.push(PipelineStep::GitTagAndRelease);
        steps.extend(Self::publish_steps());
      }
    }
    steps.extend([PipelineStep::Verify, PipelineStep::Changelog, PipelineStep::ManifestWrite]);
    steps
  }

  pub fn remote_pipeline() -> Vec<PipelineStep> {
    vec![
      PipelineStep::Preflight,
      PipelineStep::RemoteTrigger,
      PipelineStep::RemoteMonitor,
    ]
  }
}

impl fmt::Display for PipelineStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
  Pending,
  Running,
  Success,
  Failed,
  Skipped,
}

impl StepStatus {
  pub fn icon(&self) -> &'static str {
    match self {
      StepStatus::Pending => "·",
      StepStatus::Running => "…",
      StepStatus::Success => "✅",
      StepStatus::Failed => "❌",
      StepStatus::Skipped => "⏭️",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepError {
  pub kind: ErrorKind,
  pub message: String,
}

impl From<&RailError> for StepError {
  fn from(error: &RailError) -> Self {
    Self {
      kind: error.kind(),
      message: error.to_string(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
  pub step: String,
  pub status: StepStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub started_at: Option<DateTime<Utc>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub finished_at: Option<DateTime<Utc>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<StepError>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub output: Option<String>,
}

impl StepResult {
  pub fn pending(step: PipelineStep) -> Self {
    Self {
      step: step.name(),
      status: StepStatus::Pending,
      started_at: None,
      finished_at: None,
      error: None,
      output: None,
    }
  }
}

/// Bookkeeping for one artifact kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
  pub published: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub checksum: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseArtifacts {
  #[serde(default)]
  pub kinds: BTreeMap<ArtifactKind, ArtifactRecord>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub binaries: Vec<BinaryArtifact>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tag: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub release_url: Option<String>,
}

impl ReleaseArtifacts {
  pub fn record(&mut self, kind: ArtifactKind, outcome: &PublishOutcome) {
    self.kinds.insert(
      kind,
      ArtifactRecord {
        published: outcome.published,
        url: outcome.url.clone(),
        checksum: outcome.checksum.clone(),
      },
    );
    if kind == ArtifactKind::Binaries {
      self.binaries = outcome.binaries.clone();
    }
  }

  pub fn is_published(&self, kind: ArtifactKind) -> bool {
    self.kinds.get(&kind).is_some_and(|r| r.published)
  }

  pub fn mark_published(&mut self, kind: ArtifactKind, url: Option<String>) {
    let record = self.kinds.entry(kind).or_default();
    record.published = true;
    if url.is_some() {
      record.url = url;
    }
  }

  pub fn published_kinds(&self) -> Vec<ArtifactKind> {
    self
      .kinds
      .iter()
      .filter(|(_, r)| r.published)
      .map(|(k, _)| *k)
      .collect()
  }
}

/// An externally visible write, recorded so rollback can reverse it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum UndoAction {
  DeleteLocalTag { tag: String },
  DeleteRemoteTag { remote: String, tag: String },
  DeleteRelease { tag: String },
  Unpublish { kind: ArtifactKind },
}

impl fmt::Display for UndoAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      UndoAction::DeleteLocalTag { tag } => write!(f, "delete local tag {}", tag),
      UndoAction::DeleteRemoteTag { remote, tag } => write!(f, "delete tag {} on {}", tag, remote),
      UndoAction::DeleteRelease { tag } => write!(f, "delete remote release {}", tag),
      UndoAction::Unpublish { kind } => write!(f, "unpublish {}", kind),
    }
  }
}

/// What rollback did and what it left for a human
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackReport {
  pub performed: Vec<String>,
  pub manual_cleanup: Vec<String>,
}

impl RollbackReport {
  pub fn is_complete(&self) -> bool {
    self.manual_cleanup.is_empty()
  }
}

/// Verification outcome stored with the release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum VerificationResult {
  Skipped { reason: String },
  Checked { checks: Vec<VerifyOutcome> },
}

impl VerificationResult {
  pub fn all_ok(&self) -> bool {
    match self {
      VerificationResult::Skipped { .. } => true,
      VerificationResult::Checked { checks } => checks.iter().all(|c| c.ok),
    }
  }

  pub fn failures(&self) -> Vec<&VerifyOutcome> {
    match self {
      VerificationResult::Skipped { .. } => Vec::new(),
      VerificationResult::Checked { checks } => checks.iter().filter(|c| !c.ok).collect(),
    }
  }
}

/// Final status of one attempt as recorded in the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReleaseStatus {
  Released,
  /// Published, but at least one artifact could not be confirmed
  Unverified,
  Failed,
  /// Failed, and every externally visible write was undone
  RolledBack,
}

impl fmt::Display for ReleaseStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      ReleaseStatus::Released => "released",
      ReleaseStatus::Unverified => "unverified",
      ReleaseStatus::Failed => "failed",
      ReleaseStatus::RolledBack => "rolledBack",
    };
    write!(f, "{}", s)
  }
}

/// Mutable state of one release attempt
#[derive(Debug, Clone)]
pub struct ReleaseState {
  pub options: ReleaseOptions,
  pub config: ComponentConfig,
  pub started_at: DateTime<Utc>,
  pub steps: Vec<StepResult>,
  pub preflight: Option<PreflightReport>,
  pub current_version: Option<Version>,
  pub version: Option<Version>,
  pub artifacts: ReleaseArtifacts,
  /// Externally visible writes in the order they happened
  pub ledger: Vec<UndoAction>,
  pub rollback: Option<RollbackReport>,
  pub verification: Option<VerificationResult>,
  pub changelog: Option<String>,
  /// Release commit made by this attempt (not undone by rollback)
  pub commit: Option<String>,
  pub synced_files: Vec<String>,
}

impl ReleaseState {
  /// Every planned step starts out pending
  pub fn new(options: ReleaseOptions, config: ComponentConfig, steps: &[PipelineStep]) -> Self {
    Self {
      options,
      config,
      started_at: Utc::now(),
      steps: steps.iter().map(|s| StepResult::pending(*s)).collect(),
      preflight: None,
      current_version: None,
      version: None,
      artifacts: ReleaseArtifacts::default(),
      ledger: Vec::new(),
      rollback: None,
      verification: None,
      changelog: None,
      commit: None,
      synced_files: Vec::new(),
    }
  }

  fn result_mut(&mut self, step: PipelineStep) -> Option<&mut StepResult> {
    let name = step.name();
    self.steps.iter_mut().find(|r| r.step == name)
  }

  pub fn result(&self, step: PipelineStep) -> Option<&StepResult> {
    let name = step.name();
    self.steps.iter().find(|r| r.step == name)
  }

  pub fn status(&self, step: PipelineStep) -> Option<StepStatus> {
    self.result(step).map(|r| r.status)
  }

  pub fn start(&mut self, step: PipelineStep) {
    if let Some(result) = self.result_mut(step) {
      result.status = StepStatus::Running;
      result.started_at = Some(Utc::now());
    }
  }

  pub fn succeed(&mut self, step: PipelineStep, output: Option<String>) {
    if let Some(result) = self.result_mut(step) {
      result.status = StepStatus::Success;
      result.finished_at = Some(Utc::now());
      result.output = output.filter(|o| !o.trim().is_empty());
    }
  }

  pub fn fail(&mut self, step: PipelineStep, error: &RailError) {
    if let Some(result) = self.result_mut(step) {
      result.status = StepStatus::Failed;
      result.finished_at = Some(Utc::now());
      result.error = Some(StepError::from(error));
    }
  }

  pub fn skip(&mut self, step: PipelineStep, reason: impl Into<String>) {
    if let Some(result) = self.result_mut(step) {
      result.status = StepStatus::Skipped;
      result.output = Some(reason.into());
    }
  }

  /// The first failure, which is the proximate cause of the outcome
  pub fn first_error(&self) -> Option<&StepError> {
    self.steps.iter().find_map(|r| r.error.as_ref())
  }

  pub fn failed(&self) -> bool {
    self.steps.iter().any(|r| r.status == StepStatus::Failed)
  }

  pub fn final_status(&self) -> ReleaseStatus {
    if self.failed() {
      match &self.rollback {
        Some(report) if report.is_complete() => ReleaseStatus::RolledBack,
        _ => ReleaseStatus::Failed,
      }
    } else if self.verification.as_ref().is_some_and(|v| !v.all_ok()) {
      ReleaseStatus::Unverified
    } else {
      ReleaseStatus::Released
    }
  }

  pub fn tag(&self) -> Option<&str> {
    self.artifacts.tag.as_deref()
  }
}
