//! Release orchestrator
//!
//! Drives one component through the pipeline and owns its [`ReleaseState`]:
//!
//! ```text
//! preflight → versionBump → versionSync → build
//!   → publish:{package, container, extension, binaries} → gitTagAndRelease
//!   → verify → changelog → manifestWrite
//! ```
//!
//! Every collaborator error is caught here, stored in the step result, and
//! handed back through the report only after rollback and the manifest entry
//! are done.

use crate::checks::{self, CheckContext};
use crate::core::config::{ArtifactKind, ComponentConfig, ConfigLoader, Environment, WorkspaceSettings};
use crate::core::context::ReleaseContext;
use crate::core::error::{GitError, RailError, RailResult, ReleaseError};
use crate::core::exec::CommandRunner;
use crate::core::vcs::github::WorkflowRun;
use crate::core::vcs::{ReleaseHost, SourceControl};
use crate::publish::{self, PublishContext, PublisherFactory, VerifyOutcome};
use crate::release::changelog::{self, RepoLinks};
use crate::release::git_ops::{GitOperations, format_tag};
use crate::release::lock::ReleaseLock;
use crate::release::manifest::{ManifestWriter, SubmoduleRelease};
use crate::release::remote::{self, CancellationToken, PollSettings, WorkflowClient};
use crate::release::report::{BatchReport, ReleaseReport};
use crate::release::rollback;
use crate::release::state::{
  Mode, PipelineStep, ReleaseOptions, ReleaseState, RollbackReport, StepResult, StepStatus, UndoAction,
  VerificationResult,
};
use crate::release::tags;
use crate::release::version::{self, VersionTarget};
use crate::utils;
use rayon::prelude::*;
use semver::Version;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Receives every step transition (progress bars, logs)
pub trait StepObserver: Send + Sync {
  fn step_changed(&self, component: &str, result: &StepResult);
}

/// Release host and CI client for a component
pub trait HostProvider: Send + Sync {
  fn release_host(&self, config: &ComponentConfig) -> Arc<dyn ReleaseHost>;

  fn workflow_client(&self, config: &ComponentConfig) -> Arc<dyn WorkflowClient>;
}

impl HostProvider for ReleaseContext {
  fn release_host(&self, config: &ComponentConfig) -> Arc<dyn ReleaseHost> {
    Arc::new(self.host(config))
  }

  fn workflow_client(&self, config: &ComponentConfig) -> Arc<dyn WorkflowClient> {
    Arc::new(self.host(config))
  }
}

/// One read-only verification probe
enum Probe {
  Artifact(ArtifactKind),
  Release(String),
  /// Tag plus the asset file names the release must list
  Assets(String, Vec<String>),
}

pub struct Orchestrator<'a> {
  root: &'a Path,
  settings: &'a WorkspaceSettings,
  env: &'a Environment,
  scm: &'a dyn SourceControl,
  runner: &'a dyn CommandRunner,
  publishers: &'a dyn PublisherFactory,
  hosts: &'a dyn HostProvider,
  staging_dir: PathBuf,
  lock_dir: Option<PathBuf>,
  cancel: CancellationToken,
  observer: Option<&'a dyn StepObserver>,
}

impl<'a> Orchestrator<'a> {
  pub fn new(
    root: &'a Path,
    settings: &'a WorkspaceSettings,
    env: &'a Environment,
    scm: &'a dyn SourceControl,
    runner: &'a dyn CommandRunner,
    publishers: &'a dyn PublisherFactory,
    hosts: &'a dyn HostProvider,
  ) -> Self {
    Self {
      root,
      settings,
      env,
      scm,
      runner,
      publishers,
      hosts,
      staging_dir: std::env::temp_dir().join("shiprail-stage"),
      lock_dir: None,
      cancel: CancellationToken::new(),
      observer: None,
    }
  }

  pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.staging_dir = dir.into();
    self
  }

  /// Lock files go here instead of the system temp directory
  #[cfg(test)]
  pub fn with_lock_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.lock_dir = Some(dir.into());
    self
  }

  #[cfg(test)]
  pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
    self.cancel = cancel;
    self
  }

  pub fn with_observer(mut self, observer: &'a dyn StepObserver) -> Self {
    self.observer = Some(observer);
    self
  }

  // ==========================================================================
  // Entry points
  // ==========================================================================

  /// Release every component in order, stopping at the first failure
  pub fn run_batch(&self, options: &ReleaseOptions) -> BatchReport {
    let mut reports = Vec::new();
    let mut failed_component = None;
    let mut not_started = Vec::new();

    for (index, name) in options.components.iter().enumerate() {
      let report = self.run_named(name, options);
      let failed = !report.succeeded();
      reports.push(report);

      if failed {
        tracing::warn!(component = %name, "release failed, stopping batch");
        failed_component = Some(name.clone());
        not_started = options.components[index + 1..].to_vec();
        break;
      }
    }

    BatchReport {
      reports,
      failed_component,
      not_started,
    }
  }

  /// Load, lock and release one component by name
  fn run_named(&self, name: &str, options: &ReleaseOptions) -> ReleaseReport {
    let config = match ConfigLoader::new(self.root, self.settings, self.env).load(name) {
      Ok(config) => config,
      Err(e) => return ReleaseReport::aborted(name, options.mode, options.dry_run, e),
    };

    let _lock = if options.dry_run {
      None
    } else {
      let acquired = match &self.lock_dir {
        Some(dir) => ReleaseLock::acquire_in(dir, self.root, name),
        None => ReleaseLock::acquire(self.root, name),
      };
      match acquired {
        Ok(lock) => Some(lock),
        Err(e) => return ReleaseReport::aborted(name, options.mode, options.dry_run, e),
      }
    };

    self.run_component(config, options)
  }

  /// Run the whole pipeline for one loaded component
  pub fn run_component(&self, config: ComponentConfig, options: &ReleaseOptions) -> ReleaseReport {
    let steps = match options.mode {
      Mode::Local => PipelineStep::local_pipeline(self.settings.tagging.timing),
      Mode::Remote => PipelineStep::remote_pipeline(),
    };
    let kinds = options.effective_kinds(&config);
    let mut state = ReleaseState::new(options.clone(), config, &steps);
    for result in &state.steps {
      self.notify(&state.config.name, result);
    }

    tracing::info!(
      component = %state.config.name,
      mode = %options.mode,
      dry_run = options.dry_run,
      kinds = ?kinds,
      "release started"
    );

    let failure = match options.mode {
      Mode::Local => self.run_local(&mut state, &steps, &kinds),
      Mode::Remote => self.run_remote(&mut state, &steps, &kinds),
    };

    tracing::info!(
      component = %state.config.name,
      status = %state.final_status(),
      "release finished"
    );
    ReleaseReport::from_state(state, failure)
  }

  // ==========================================================================
  // Step plumbing
  // ==========================================================================

  fn notify(&self, component: &str, result: &StepResult) {
    if let Some(observer) = self.observer {
      observer.step_changed(component, result);
    }
  }

  fn notify_step(&self, state: &ReleaseState, step: PipelineStep) {
    if let Some(result) = state.result(step) {
      self.notify(&state.config.name, result);
    }
  }

  fn execute(
    &self,
    state: &mut ReleaseState,
    step: PipelineStep,
    f: impl FnOnce(&mut ReleaseState) -> RailResult<Option<String>>,
  ) -> RailResult<()> {
    state.start(step);
    self.notify_step(state, step);
    tracing::debug!(component = %state.config.name, %step, "step started");

    match f(state) {
      Ok(output) => {
        state.succeed(step, output);
        self.notify_step(state, step);
        tracing::info!(component = %state.config.name, %step, "step succeeded");
        Ok(())
      }
      Err(e) => {
        state.fail(step, &e);
        self.notify_step(state, step);
        tracing::warn!(component = %state.config.name, %step, error = %e, "step failed");
        Err(e)
      }
    }
  }

  fn skip(&self, state: &mut ReleaseState, step: PipelineStep, reason: &str) {
    state.skip(step, reason);
    self.notify_step(state, step);
    tracing::debug!(component = %state.config.name, %step, reason, "step skipped");
  }

  /// Skip every still-pending step except `keep`
  fn skip_pending(&self, state: &mut ReleaseState, steps: &[PipelineStep], keep: Option<PipelineStep>, reason: &str) {
    for step in steps {
      if Some(*step) != keep && state.status(*step) == Some(StepStatus::Pending) {
        self.skip(state, *step, reason);
      }
    }
  }

  fn publish_ctx<'s>(&'s self, config: &'s ComponentConfig, version: &'s Version, dry_run: bool) -> PublishContext<'s> {
    PublishContext {
      root: self.root,
      config,
      version,
      dry_run,
      runner: self.runner,
      timeouts: &self.settings.timeouts,
      staging_dir: &self.staging_dir,
    }
  }

  // ==========================================================================
  // Local pipeline
  // ==========================================================================

  fn run_local(&self, state: &mut ReleaseState, steps: &[PipelineStep], kinds: &[ArtifactKind]) -> Option<RailError> {
    let host = self.hosts.release_host(&state.config);
    let git = GitOperations::new(
      self.scm,
      host.as_ref(),
      &self.settings.workspace.git_remote,
      state.options.dry_run,
    );

    let originals = if state.options.dry_run {
      Vec::new()
    } else {
      self.snapshot_version_files(&state.config)
    };

    let mut failure = None;
    for &step in steps {
      if step == PipelineStep::ManifestWrite {
        continue;
      }

      let result = match step {
        PipelineStep::Preflight => self.execute(state, step, |s| self.preflight(s, kinds, false)),
        PipelineStep::VersionBump => self.execute(state, step, |s| self.version_bump(s)),
        PipelineStep::VersionSync => self.execute(state, step, |s| self.version_sync(s)),
        PipelineStep::Build if state.options.skip_build => {
          self.skip(state, step, "--skip-build");
          Ok(())
        }
        PipelineStep::Build => self.execute(state, step, |s| self.build(s, kinds)),
        PipelineStep::Publish(kind) if !kinds.contains(&kind) => {
          let reason = if state.config.has(kind) {
            "excluded by --only"
          } else {
            "not configured"
          };
          self.skip(state, step, reason);
          Ok(())
        }
        PipelineStep::Publish(kind) => self.execute(state, step, |s| self.publish(s, kind, &git)),
        PipelineStep::GitTagAndRelease => self.execute(state, step, |s| self.tag_and_release(s, &git)),
        PipelineStep::Verify if state.options.skip_verify => {
          state.verification = Some(VerificationResult::Skipped {
            reason: "--skip-verify".to_string(),
          });
          self.skip(state, step, "--skip-verify");
          Ok(())
        }
        PipelineStep::Verify if state.options.dry_run => {
          state.verification = Some(VerificationResult::Skipped {
            reason: "dry run".to_string(),
          });
          self.skip(state, step, "dry run");
          Ok(())
        }
        PipelineStep::Verify => self.execute(state, step, |s| self.verify(s, host.as_ref())),
        PipelineStep::Changelog => self.execute(state, step, |s| self.changelog(s, &git)),
        PipelineStep::ManifestWrite | PipelineStep::RemoteTrigger | PipelineStep::RemoteMonitor => Ok(()),
      };

      if let Err(e) = result {
        let rolls_back = matches!(step, PipelineStep::Publish(_) | PipelineStep::GitTagAndRelease);
        if rolls_back && !state.ledger.is_empty() && !state.options.dry_run {
          self.roll_back(state, &git);
        }
        if !state.options.dry_run {
          self.restore_version_files(state, &originals);
        }
        self.skip_pending(state, steps, Some(PipelineStep::ManifestWrite), &format!("{} failed", step));
        failure = Some(e);
        break;
      }
    }

    // The manifest records every attempt that got past pre-flight
    let preflight_passed = state.status(PipelineStep::Preflight) == Some(StepStatus::Success);
    if state.options.dry_run {
      self.skip(state, PipelineStep::ManifestWrite, "dry run");
    } else if !preflight_passed {
      self.skip(state, PipelineStep::ManifestWrite, "pre-flight failed");
    } else if let Err(e) = self.execute(state, PipelineStep::ManifestWrite, |s| self.write_manifest(s)) {
      failure.get_or_insert(e);
    }

    failure
  }

  fn roll_back(&self, state: &mut ReleaseState, git: &GitOperations<'_>) {
    tracing::warn!(
      component = %state.config.name,
      actions = state.ledger.len(),
      "rolling back externally visible changes"
    );
    let config = state.config.clone();
    let Some(version) = state.version.clone() else {
      return;
    };
    let ctx = self.publish_ctx(&config, &version, false);
    let report = rollback::rollback(&state.ledger, git, self.publishers, &ctx);

    // Undone artifacts are no longer published
    for action in &state.ledger {
      if let UndoAction::Unpublish { kind } = action
        && report.performed.contains(&action.to_string())
        && let Some(record) = state.artifacts.kinds.get_mut(kind)
      {
        record.published = false;
      }
    }
    // Binaries live on the release and go with it
    if report.performed.iter().any(|p| p.starts_with("delete remote release")) {
      if let Some(record) = state.artifacts.kinds.get_mut(&ArtifactKind::Binaries) {
        record.published = false;
      }
      state.artifacts.release_url = None;
    }
    state.rollback = Some(report);
  }

  /// Contents of every file the bump and sync may rewrite
  fn snapshot_version_files(&self, config: &ComponentConfig) -> Vec<(PathBuf, String)> {
    let mut files = vec![self.root.join(config.manifest_rel_path())];
    for rule in &config.version_sync {
      let path = self.root.join(&rule.file);
      if !files.contains(&path) {
        files.push(path);
      }
    }
    files
      .into_iter()
      .filter_map(|path| fs::read_to_string(&path).ok().map(|content| (path, content)))
      .collect()
  }

  /// Put the version files back after a failure that left no release commit,
  /// so the clean-tree check passes on retry
  ///
  /// Files stay rewritten when a published artifact could not be rolled back;
  /// the checkout command then goes to the manual cleanup list.
  fn restore_version_files(&self, state: &mut ReleaseState, originals: &[(PathBuf, String)]) {
    if state.commit.is_some() {
      return;
    }
    let changed: Vec<&(PathBuf, String)> = originals
      .iter()
      .filter(|(path, content)| fs::read_to_string(path).is_ok_and(|now| now != *content))
      .collect();
    if changed.is_empty() {
      return;
    }

    let display = |path: &Path| utils::path_to_git_format(path.strip_prefix(self.root).unwrap_or(path));
    let artifacts_remain = state.rollback.as_ref().is_some_and(|r| !r.is_complete());
    let mut leftover = Vec::new();
    for (path, content) in changed {
      if artifacts_remain {
        leftover.push(display(path.as_path()));
        continue;
      }
      match fs::write(path, content) {
        Ok(()) => {
          tracing::info!(component = %state.config.name, file = %path.display(), "restored version file");
          if let Some(report) = state.rollback.as_mut() {
            report.performed.push(format!("restore {}", display(path.as_path())));
          }
        }
        Err(e) => {
          tracing::warn!(file = %path.display(), error = %e, "failed to restore version file");
          leftover.push(display(path.as_path()));
        }
      }
    }

    if !leftover.is_empty() {
      state
        .rollback
        .get_or_insert_with(RollbackReport::default)
        .manual_cleanup
        .push(format!("restore version files: git checkout -- {}", leftover.join(" ")));
    }
  }

  fn preflight(&self, state: &mut ReleaseState, kinds: &[ArtifactKind], remote: bool) -> RailResult<Option<String>> {
    let ctx = CheckContext {
      root: self.root,
      config: &state.config,
      settings: self.settings,
      env: self.env,
      scm: self.scm,
      runner: self.runner,
      dry_run: state.options.dry_run,
      skip_tests: remote || state.options.skip_tests,
      skip_build: remote || state.options.skip_build,
      kinds,
    };
    let report = checks::run_checks(&ctx);
    let summary = report.summary();
    let passed = report.passed;
    let failed = report.failed();
    state.preflight = Some(report);

    if passed {
      Ok(Some(summary))
    } else {
      Err(ReleaseError::Preflight { failed }.into())
    }
  }

  fn version_bump(&self, state: &mut ReleaseState) -> RailResult<Option<String>> {
    let manifest = self.root.join(state.config.manifest_rel_path());
    let target = state.options.target.clone();
    let (current, next) = version::next_version(&manifest, &target)?;

    if next <= current {
      return Err(RailError::with_help(
        format!("Target version {} is not greater than the current {}", next, current),
        "Pass a higher --version or use --bump",
      ));
    }

    if !state.options.dry_run {
      match &target {
        VersionTarget::Bump(kind) => {
          version::bump_version(&manifest, *kind)?;
        }
        VersionTarget::Exact(exact) => version::set_version(&manifest, exact)?,
      }
    }

    let output = format!("{} → {}", current, next);
    state.current_version = Some(current);
    state.version = Some(next);
    Ok(Some(output))
  }

  fn require_version(state: &ReleaseState) -> RailResult<Version> {
    state
      .version
      .clone()
      .ok_or_else(|| RailError::message("No release version resolved"))
  }

  fn version_sync(&self, state: &mut ReleaseState) -> RailResult<Option<String>> {
    let version = Self::require_version(state)?.to_string();
    let rules = state.config.version_sync.clone();

    let report = if state.options.dry_run {
      version::plan_sync(self.root, &rules, &version)
    } else {
      version::sync_versions(self.root, &rules, &version)
    };

    if !report.is_ok() {
      return Err(
        ReleaseError::VersionMismatch {
          version,
          problems: report
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.file.display(), e.message))
            .collect(),
        }
        .into(),
      );
    }

    // Independent re-read; publishing never starts on a mismatch
    if !state.options.dry_run
      && let Some(problem) = version::first_version_problem(self.root, &rules, &version)
    {
      return Err(
        ReleaseError::VersionMismatch {
          version,
          problems: vec![problem],
        }
        .into(),
      );
    }

    let mut files = vec![state.config.manifest_rel_path()];
    for file in &report.files_updated {
      if !files.contains(file) {
        files.push(file.clone());
      }
    }
    state.synced_files = files.iter().map(|f| utils::path_to_git_format(f)).collect();

    let verb = if state.options.dry_run { "would update" } else { "updated" };
    let listed: Vec<String> = report.files_updated.iter().map(|f| f.display().to_string()).collect();
    Ok(Some(if listed.is_empty() {
      format!("{} no files beyond the manifest", verb)
    } else {
      format!("{} {}", verb, listed.join(", "))
    }))
  }

  fn build(&self, state: &mut ReleaseState, kinds: &[ArtifactKind]) -> RailResult<Option<String>> {
    if kinds.is_empty() {
      return Ok(Some("nothing to build".to_string()));
    }
    let version = Self::require_version(state)?;
    let ctx = self.publish_ctx(&state.config, &version, state.options.dry_run);

    let mut outputs = Vec::new();
    for kind in kinds {
      let output = self.publishers.publisher(*kind).build(&ctx)?;
      if !output.trim().is_empty() {
        outputs.push(output.trim_end().to_string());
      }
    }
    Ok(Some(outputs.join("\n")))
  }

  fn publish(&self, state: &mut ReleaseState, kind: ArtifactKind, git: &GitOperations<'_>) -> RailResult<Option<String>> {
    let version = Self::require_version(state)?;
    let config = state.config.clone();
    let dry_run = state.options.dry_run;
    let ctx = self.publish_ctx(&config, &version, dry_run);

    let outcome = self.publishers.publisher(kind).publish(&ctx)?;
    state.artifacts.record(kind, &outcome);
    if outcome.published {
      state.ledger.push(UndoAction::Unpublish { kind });
    }

    // Tag-first timing: the release already exists, attach right away
    if kind == ArtifactKind::Binaries
      && !dry_run
      && state.artifacts.release_url.is_some()
      && let Some(tag) = state.artifacts.tag.clone()
    {
      git.attach_assets(&tag, &publish::release_assets(&outcome.binaries))?;
      state.artifacts.mark_published(ArtifactKind::Binaries, state.artifacts.release_url.clone());
    }

    Ok(Some(outcome.output))
  }

  fn tag_and_release(&self, state: &mut ReleaseState, git: &GitOperations<'_>) -> RailResult<Option<String>> {
    let version = Self::require_version(state)?;
    let name = state.config.name.clone();
    let mut log = Vec::new();

    let files: Vec<PathBuf> = state.synced_files.iter().map(PathBuf::from).collect();
    let message = format!("chore(release): {} v{}", name, version);
    match git.commit_changes(&files, &message) {
      Ok(Some(hash)) => {
        log.push(format!("committed {}", &hash[..hash.len().min(7)]));
        state.commit = Some(hash);
        git.push_to_remote("HEAD")?;
      }
      Ok(None) => log.push("would commit version files".to_string()),
      Err(RailError::Git(GitError::NothingToCommit)) => {
        tracing::info!(component = %name, "version files already committed");
        log.push("nothing to commit".to_string());
      }
      Err(e) => return Err(e),
    }

    let tag = format_tag(self.settings.tagging.format, &name, &version);
    state.artifacts.tag = Some(tag.clone());

    if git.create_tag(&tag, &format!("{} {}", state.config.display_name(), version))? {
      state.ledger.push(UndoAction::DeleteLocalTag { tag: tag.clone() });
    }
    if git.push_tag(&tag)? {
      state.ledger.push(UndoAction::DeleteRemoteTag {
        remote: git.remote().to_string(),
        tag: tag.clone(),
      });
    }
    log.push(format!("tag {}", tag));

    let title = format!("{} {}", state.config.display_name(), version);
    let notes = changelog::release_notes(
      state.config.release_notes_template.as_deref(),
      state.config.display_name(),
      &version.to_string(),
      &tag,
      "",
    );
    if let Some(url) = git.create_release(&tag, &title, &notes)? {
      state.ledger.push(UndoAction::DeleteRelease { tag: tag.clone() });
      log.push(format!("release {}", url));
      state.artifacts.release_url = Some(url);
    }

    // Publish-first timing: binaries were staged earlier, attach them now
    if !state.artifacts.binaries.is_empty() && !state.artifacts.is_published(ArtifactKind::Binaries) {
      git.attach_assets(&tag, &publish::release_assets(&state.artifacts.binaries))?;
      let count = state.artifacts.binaries.len();
      if state.options.dry_run {
        log.push(format!("would attach {} binaries", count));
      } else {
        state.artifacts.mark_published(ArtifactKind::Binaries, state.artifacts.release_url.clone());
        log.push(format!("attached {} binaries", count));
      }
    }

    Ok(Some(log.join("; ")))
  }

  fn verify(&self, state: &mut ReleaseState, host: &dyn ReleaseHost) -> RailResult<Option<String>> {
    let version = Self::require_version(state)?;
    let ctx = self.publish_ctx(&state.config, &version, false);
    let publishers = self.publishers;

    let mut probes: Vec<Probe> = state.artifacts.published_kinds().into_iter().map(Probe::Artifact).collect();
    if state.artifacts.release_url.is_some()
      && let Some(tag) = &state.artifacts.tag
    {
      probes.push(Probe::Release(tag.clone()));
      if state.artifacts.is_published(ArtifactKind::Binaries) {
        let names = publish::release_assets(&state.artifacts.binaries)
          .iter()
          .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
          .collect();
        probes.push(Probe::Assets(tag.clone(), names));
      }
    }

    let checks: Vec<VerifyOutcome> = probes
      .par_iter()
      .map(|probe| match probe {
        Probe::Artifact(kind) => publishers
          .publisher(*kind)
          .verify(&ctx)
          .unwrap_or_else(|e| VerifyOutcome::failed(kind.to_string(), e.to_string())),
        Probe::Release(tag) => match host.release_exists(tag) {
          Ok(true) => VerifyOutcome::ok(format!("release {}", tag), "exists"),
          Ok(false) => VerifyOutcome::failed(format!("release {}", tag), "not found on the host"),
          Err(e) => VerifyOutcome::failed(format!("release {}", tag), e.to_string()),
        },
        Probe::Assets(tag, names) => publish::verify_release_assets(host, tag, names),
      })
      .collect();

    let failed = checks.iter().filter(|c| !c.ok).count();
    for check in checks.iter().filter(|c| !c.ok) {
      tracing::warn!(target_name = %check.target, detail = %check.detail, "verification failed");
    }
    let output = if failed == 0 {
      format!("{} check(s) passed", checks.len())
    } else {
      format!(
        "{} of {} check(s) failed; artifacts stay published, re-check with `shiprail verify`",
        failed,
        checks.len()
      )
    };
    state.verification = Some(VerificationResult::Checked { checks });
    Ok(Some(output))
  }

  fn changelog(&self, state: &mut ReleaseState, git: &GitOperations<'_>) -> RailResult<Option<String>> {
    let version = Self::require_version(state)?;
    let config = &state.config;
    let format = self.settings.tagging.format;

    let tags = self.scm.list_tags(&tags::tag_glob(format, &config.name))?;
    let previous = tags::previous_tag(&tags, format, &config.name, &version);
    let tag = format_tag(format, &config.name, &version);
    let to_ref = match (&state.artifacts.tag, state.options.dry_run) {
      (Some(created), false) => created.clone(),
      _ => "HEAD".to_string(),
    };
    let path_filter =
      (!config.path.as_os_str().is_empty() && config.path != Path::new(".")).then_some(config.path.as_path());

    let log = changelog::generate(self.scm, previous.as_deref(), &to_ref, path_filter)?;

    let base = match &config.repository {
      Some(repository) => Some(repository.web_url()),
      None => self
        .scm
        .remote_url(&self.settings.workspace.git_remote)?
        .and_then(|url| utils::repo_web_url(&url)),
    };
    let markdown = changelog::format(&log, &RepoLinks::new(base));

    if state.artifacts.release_url.is_some() {
      let notes = changelog::release_notes(
        config.release_notes_template.as_deref(),
        config.display_name(),
        &version.to_string(),
        &tag,
        &markdown,
      );
      git.edit_release_notes(&tag, &notes)?;
    }

    let output = format!(
      "{} commit(s) since {}",
      log.len(),
      previous.as_deref().unwrap_or("the first commit")
    );
    state.changelog = Some(markdown);
    Ok(Some(output))
  }

  fn write_manifest(&self, state: &mut ReleaseState) -> RailResult<Option<String>> {
    let path = self.root.join(&self.settings.workspace.manifest);
    let mut writer = ManifestWriter::load_manifest(&path)?;
    let record = SubmoduleRelease::from_state(state);
    let status = record.status;
    writer.add_release(record)?;
    writer.save()?;
    Ok(Some(format!("recorded as {}", status)))
  }

  // ==========================================================================
  // Remote pipeline
  // ==========================================================================

  fn run_remote(&self, state: &mut ReleaseState, steps: &[PipelineStep], kinds: &[ArtifactKind]) -> Option<RailError> {
    let client = self.hosts.workflow_client(&state.config);
    let timeouts = &self.settings.timeouts;
    let poll = PollSettings {
      timeout: state
        .options
        .remote_timeout
        .unwrap_or(Duration::from_secs(timeouts.workflow_secs)),
      initial_interval: Duration::from_secs(timeouts.poll_interval_secs),
      max_interval: Duration::from_secs(timeouts.max_poll_interval_secs.max(timeouts.poll_interval_secs)),
    };

    let mut run_id = None;
    for &step in steps {
      let result = match step {
        PipelineStep::Preflight => self.execute(state, step, |s| self.preflight(s, kinds, true)),
        PipelineStep::RemoteTrigger => self.execute(state, step, |s| {
          let run = self.trigger_remote(s, client.as_ref(), &poll)?;
          run_id = Some(run.id);
          Ok(Some(run.url))
        }),
        PipelineStep::RemoteMonitor => self.execute(state, step, |_| {
          let id = run_id.ok_or_else(|| RailError::message("No workflow run to monitor"))?;
          let run = remote::monitor(client.as_ref(), id, &poll, &self.cancel)?;
          Ok(Some(format!("{} ({})", run.url, run.conclusion)))
        }),
        _ => Ok(()),
      };

      if let Err(e) = result {
        self.skip_pending(state, steps, None, &format!("{} failed", step));
        return Some(e);
      }
    }
    None
  }

  fn trigger_remote(
    &self,
    state: &mut ReleaseState,
    client: &dyn WorkflowClient,
    poll: &PollSettings,
  ) -> RailResult<WorkflowRun> {
    // Shown in the report only; the workflow does the real bump
    let manifest = self.root.join(state.config.manifest_rel_path());
    if let Ok((current, next)) = version::next_version(&manifest, &state.options.target) {
      state.current_version = Some(current);
      state.version = Some(next);
    }

    let branch = self.scm.current_branch()?;
    let inputs = vec![
      ("component".to_string(), state.config.name.clone()),
      ("version_bump".to_string(), state.options.target.to_string()),
      ("dry_run".to_string(), state.options.dry_run.to_string()),
    ];
    remote::trigger(
      client,
      &self.settings.remote.workflow,
      &branch,
      &inputs,
      poll,
      &self.cancel,
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::config::{TagTiming, VersionSyncRule};
  use crate::core::error::ErrorKind;
  use crate::core::exec::fake::FakeRunner;
  use crate::core::vcs::fake::{FakeHost, FakeSourceControl};
  use crate::publish::SystemPublishers;
  use crate::publish::fake::FakePublishers;
  use crate::release::remote::fake::{FakeWorkflow, run};
  use crate::release::state::{ReleaseStatus, StepStatus};
  use std::fs;
  use std::sync::Mutex;
  use tempfile::TempDir;

  struct FakeHosts {
    host: Arc<FakeHost>,
    workflow: Arc<FakeWorkflow>,
  }

  impl HostProvider for FakeHosts {
    fn release_host(&self, _config: &ComponentConfig) -> Arc<dyn ReleaseHost> {
      self.host.clone()
    }

    fn workflow_client(&self, _config: &ComponentConfig) -> Arc<dyn WorkflowClient> {
      self.workflow.clone()
    }
  }

  #[derive(Default)]
  struct Recorder(Mutex<Vec<(String, StepStatus)>>);

  impl StepObserver for Recorder {
    fn step_changed(&self, _component: &str, result: &StepResult) {
      self.0.lock().unwrap().push((result.step.clone(), result.status));
    }
  }

  /// Repository with `packages/screenshot` at 1.2.3 and two extra version files
  struct Fixture {
    dir: TempDir,
    staging: TempDir,
    locks: TempDir,
    settings: WorkspaceSettings,
    env: Environment,
    scm: FakeSourceControl,
    runner: FakeRunner,
    publishers: FakePublishers,
    hosts: FakeHosts,
  }

  impl Fixture {
    fn new() -> Self {
      let dir = TempDir::new().unwrap();
      let pkg = dir.path().join("packages/screenshot");
      fs::create_dir_all(pkg.join("src")).unwrap();
      fs::write(
        pkg.join("package.json"),
        "{\n  \"name\": \"@acme/screenshot\",\n  \"version\": \"1.2.3\"\n}\n",
      )
      .unwrap();
      fs::write(pkg.join("src/version.ts"), "export const VERSION = \"1.2.3\";\n").unwrap();
      fs::write(pkg.join("README.md"), "Install screenshot@1.2.3 today.\n").unwrap();

      let config = serde_json::json!({
        "name": "screenshot",
        "path": "packages/screenshot",
        "packageName": "@acme/screenshot",
        "hasPackage": true,
        "buildCommand": "npm run build",
        "testCommand": "npm test",
        "versionSync": [
          {
            "file": "packages/screenshot/src/version.ts",
            "pattern": "VERSION = \"[^\"]*\"",
            "replacement": "VERSION = \"{version}\""
          },
          {
            "file": "packages/screenshot/README.md",
            "pattern": "screenshot@[0-9.]+",
            "replacement": "screenshot@{version}"
          }
        ]
      });
      let components = dir.path().join(".shiprail/components");
      fs::create_dir_all(&components).unwrap();
      fs::write(
        components.join("screenshot.json"),
        serde_json::to_string_pretty(&config).unwrap(),
      )
      .unwrap();

      let scm = FakeSourceControl::new(dir.path());
      scm.add_commit("aaaaaaa1111", "feat: capture region (#12)");
      scm.add_commit("bbbbbbb2222", "fix: crash on empty selection");

      Self {
        scm,
        dir,
        staging: TempDir::new().unwrap(),
        locks: TempDir::new().unwrap(),
        settings: WorkspaceSettings::default(),
        env: Environment::from_pairs([("NPM_TOKEN", "npm_x"), ("GITHUB_TOKEN", "ghp_x")]),
        runner: FakeRunner::new(),
        publishers: FakePublishers::new(),
        hosts: FakeHosts {
          host: Arc::new(FakeHost::new()),
          workflow: Arc::new(FakeWorkflow::new(vec![run(99, "completed", "success")])),
        },
      }
    }

    fn root(&self) -> &Path {
      self.dir.path()
    }

    fn orchestrator(&self) -> Orchestrator<'_> {
      Orchestrator::new(
        self.root(),
        &self.settings,
        &self.env,
        &self.scm,
        &self.runner,
        &self.publishers,
        &self.hosts,
      )
      .with_staging_dir(self.staging.path())
      .with_lock_dir(self.locks.path())
    }

    /// Same wiring with the real publishers driving `self.runner`
    fn system_orchestrator(&self) -> Orchestrator<'_> {
      Orchestrator::new(
        self.root(),
        &self.settings,
        &self.env,
        &self.scm,
        &self.runner,
        &SystemPublishers,
        &self.hosts,
      )
      .with_staging_dir(self.staging.path())
      .with_lock_dir(self.locks.path())
    }

    /// Merge extra fields into the component config
    fn configure(&self, extra: serde_json::Value) {
      let path = self.root().join(".shiprail/components/screenshot.json");
      let mut config: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
      for (key, value) in extra.as_object().unwrap() {
        config[key] = value.clone();
      }
      fs::write(&path, config.to_string()).unwrap();
    }

    /// One linux binary, built by `make dist` into `dist/`
    fn add_binaries(&self) {
      self.configure(serde_json::json!({
        "hasBinaries": true,
        "platforms": ["linux-x64"],
        "binaryBuildCommand": "make dist PLATFORM={platform}",
        "binaryOutput": "dist/{name}-{platform}.bin"
      }));
      let dist = self.root().join("packages/screenshot/dist");
      fs::create_dir_all(&dist).unwrap();
      fs::write(dist.join("screenshot-linux-x64.bin"), b"\x7fELF").unwrap();
    }

    fn read(&self, rel: &str) -> String {
      fs::read_to_string(self.root().join(rel)).unwrap()
    }
  }

  fn options(dry_run: bool) -> ReleaseOptions {
    ReleaseOptions {
      components: vec!["screenshot".to_string()],
      dry_run,
      ..Default::default()
    }
  }

  fn status(report: &ReleaseReport, step: &str) -> StepStatus {
    report
      .steps
      .iter()
      .find(|s| s.step == step)
      .map(|s| s.status)
      .unwrap()
  }

  #[test]
  fn test_successful_release() {
    let fx = Fixture::new();
    let recorder = Recorder::default();
    let batch = fx.orchestrator().with_observer(&recorder).run_batch(&options(false));
    let report = &batch.reports[0];

    assert!(report.succeeded(), "{}", report.render_text());
    assert_eq!(report.status, ReleaseStatus::Released);
    assert_eq!(report.version.as_deref(), Some("1.2.4"));
    assert!(fx.read("packages/screenshot/package.json").contains("\"version\": \"1.2.4\""));
    assert!(fx.read("packages/screenshot/src/version.ts").contains("\"1.2.4\""));

    assert_eq!(fx.scm.local_tags(), vec!["screenshot-v1.2.4".to_string()]);
    assert_eq!(fx.scm.remote_tags(), vec!["screenshot-v1.2.4".to_string()]);
    assert_eq!(fx.scm.commits_made(), vec!["chore(release): screenshot v1.2.4".to_string()]);
    assert_eq!(fx.publishers.calls(), vec!["build package", "publish package", "verify package"]);

    let notes = fx.hosts.host.notes("screenshot-v1.2.4").unwrap();
    assert!(notes.contains("### Features"));
    assert!(notes.contains("capture region"));
    assert!(notes.contains("https://github.com/acme/tools/pull/12"));

    for kind in ["container", "extension", "binaries"] {
      assert_eq!(status(report, &format!("publish:{}", kind)), StepStatus::Skipped);
    }
    assert!(!report.artifacts.is_published(ArtifactKind::Container));

    let manifest = ManifestWriter::load_manifest(&fx.root().join(".shiprail/releases.json")).unwrap();
    assert_eq!(manifest.releases().len(), 1);
    assert_eq!(manifest.releases()[0].status, ReleaseStatus::Released);
    assert!(manifest.releases()[0].verification.as_ref().unwrap().all_ok());

    let seen = recorder.0.lock().unwrap();
    assert!(seen.contains(&("verify".to_string(), StepStatus::Running)));
    assert!(seen.contains(&("manifestWrite".to_string(), StepStatus::Success)));
  }

  #[test]
  fn test_publish_failure_rolls_back_tag_and_release() {
    let mut fx = Fixture::new();
    fx.settings.tagging.timing = TagTiming::BeforePublish;
    fx.publishers.fail_publish(ArtifactKind::Package);

    let batch = fx.orchestrator().run_batch(&options(false));
    let report = &batch.reports[0];

    assert_eq!(status(report, "versionSync"), StepStatus::Success);
    let sync_output = report.steps.iter().find(|s| s.step == "versionSync").unwrap();
    assert!(sync_output.output.as_deref().unwrap().contains("version.ts"));
    assert!(sync_output.output.as_deref().unwrap().contains("README.md"));
    assert_eq!(status(report, "gitTagAndRelease"), StepStatus::Success);
    assert_eq!(status(report, "publish:package"), StepStatus::Failed);
    assert_eq!(status(report, "verify"), StepStatus::Skipped);
    assert_eq!(status(report, "manifestWrite"), StepStatus::Success);

    // Tag and release were created, then undone
    assert!(fx.scm.local_tags().is_empty());
    assert!(fx.scm.remote_tags().is_empty());
    assert!(fx.hosts.host.releases().is_empty());

    let rollback = report.rollback.as_ref().unwrap();
    assert!(rollback.is_complete());
    assert_eq!(rollback.performed[0], "delete remote release screenshot-v1.2.4");
    assert_eq!(report.status, ReleaseStatus::RolledBack);
    assert_eq!(report.error.as_ref().unwrap().kind, ErrorKind::Publish);

    let manifest = ManifestWriter::load_manifest(&fx.root().join(".shiprail/releases.json")).unwrap();
    assert_eq!(manifest.releases()[0].status, ReleaseStatus::RolledBack);

    let err = batch.into_result().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Publish);
  }

  #[test]
  fn test_failed_unpublish_becomes_manual_cleanup() {
    let mut fx = Fixture::new();
    fx.settings.tagging.timing = TagTiming::BeforePublish;
    fx.hosts.host.fail_delete();
    fx.publishers.fail_publish(ArtifactKind::Package);

    let batch = fx.orchestrator().run_batch(&options(false));
    let report = &batch.reports[0];
    let rollback = report.rollback.as_ref().unwrap();

    assert_eq!(rollback.manual_cleanup.len(), 1);
    assert!(rollback.manual_cleanup[0].contains("gh release delete screenshot-v1.2.4"));
    assert_eq!(report.status, ReleaseStatus::Failed);
    assert_eq!(batch.into_result().unwrap_err().kind(), ErrorKind::Rollback);
  }

  #[test]
  fn test_failed_preflight_skips_everything() {
    let fx = Fixture::new();
    fx.scm.set_dirty(&["packages/screenshot/src/index.ts"]);
    fx.scm.set_branch("feature/x");

    let batch = fx.orchestrator().run_batch(&options(false));
    let report = &batch.reports[0];

    assert_eq!(status(report, "preflight"), StepStatus::Failed);
    for step in report.steps.iter().skip(1) {
      assert_eq!(step.status, StepStatus::Skipped, "{}", step.step);
    }
    let preflight = report.preflight.as_ref().unwrap();
    assert_eq!(preflight.failed(), vec!["clean-tree", "release-branch"]);
    assert!(fx.publishers.calls().is_empty());
    assert!(fx.scm.local_tags().is_empty());
    assert!(fx.read("packages/screenshot/package.json").contains("1.2.3"));
    assert!(!fx.root().join(".shiprail/releases.json").exists());
    assert_eq!(batch.into_result().unwrap_err().kind(), ErrorKind::Preflight);
  }

  #[test]
  fn test_dry_run_never_publishes_or_writes() {
    let fx = Fixture::new();
    let batch = fx.orchestrator().run_batch(&ReleaseOptions {
      components: vec!["screenshot".to_string()],
      dry_run: true,
      ..Default::default()
    });
    let report = &batch.reports[0];

    assert!(report.succeeded(), "{}", report.render_text());
    assert!(report.dry_run);
    assert_eq!(report.version.as_deref(), Some("1.2.4"));
    assert!(fx.read("packages/screenshot/package.json").contains("\"1.2.3\""));
    assert!(fx.read("packages/screenshot/src/version.ts").contains("\"1.2.3\""));
    assert!(report.artifacts.kinds.values().all(|r| !r.published));
    assert!(fx.scm.local_tags().is_empty());
    assert!(fx.scm.commits_made().is_empty());
    assert!(fx.hosts.host.releases().is_empty());
    assert_eq!(fx.publishers.calls(), vec!["build package", "simulate package"]);
    assert_eq!(status(report, "manifestWrite"), StepStatus::Skipped);
    assert!(!fx.root().join(".shiprail/releases.json").exists());
    assert!(report.changelog.as_deref().unwrap().contains("capture region"));
  }

  #[test]
  fn test_dry_run_builds_locally_and_stages_binaries() {
    let mut fx = Fixture::new();
    fx.env = Environment::from_pairs([
      ("NPM_TOKEN", "npm_x"),
      ("GITHUB_TOKEN", "ghp_x"),
      ("CONTAINER_REGISTRY_TOKEN", "cr_x"),
    ]);
    fx.configure(serde_json::json!({
      "hasContainer": true,
      "containerImage": "ghcr.io/acme/screenshot"
    }));
    fx.add_binaries();

    let batch = fx.system_orchestrator().run_batch(&options(true));
    let report = &batch.reports[0];
    assert!(report.succeeded(), "{}", report.render_text());

    let calls = fx.runner.calls();
    assert!(calls.contains(&"docker build --tag ghcr.io/acme/screenshot:1.2.4 .".to_string()));
    assert!(calls.iter().any(|c| c.contains("make dist PLATFORM=linux-x64")));
    assert!(calls.contains(&"npm publish --access public --dry-run".to_string()));
    assert!(!calls.iter().any(|c| c.starts_with("docker push")));
    assert!(!calls.contains(&"npm publish --access public".to_string()));

    // Staged and checksummed, but nothing left the machine
    assert_eq!(report.artifacts.binaries.len(), 1);
    let staged = &report.artifacts.binaries[0];
    assert!(staged.path.is_file());
    assert_eq!(staged.checksum.len(), 64);
    assert!(fx.staging.path().join("screenshot-1.2.4/SHA256SUMS").is_file());
    assert!(report.artifacts.kinds.values().all(|r| !r.published));
    assert!(fx.hosts.host.releases().is_empty());
    assert!(fx.hosts.host.assets("screenshot-v1.2.4").is_empty());
    assert!(fx.read("packages/screenshot/package.json").contains("\"1.2.3\""));

    let tag_step = report.steps.iter().find(|s| s.step == "gitTagAndRelease").unwrap();
    assert!(tag_step.output.as_deref().unwrap().contains("would attach 1 binaries"));
  }

  #[test]
  fn test_binary_assets_checked_on_release() {
    let fx = Fixture::new();
    fx.add_binaries();
    fx.runner.respond("npm view", 0, "1.2.4\n");

    let batch = fx.system_orchestrator().run_batch(&options(false));
    let report = &batch.reports[0];
    assert!(report.succeeded(), "{}", report.render_text());
    assert_eq!(report.status, ReleaseStatus::Released);
    assert!(report.artifacts.is_published(ArtifactKind::Binaries));

    let Some(VerificationResult::Checked { checks }) = &report.verification else {
      panic!("verification did not run");
    };
    let assets = checks.iter().find(|c| c.target == "assets screenshot-v1.2.4").unwrap();
    assert!(assets.ok, "{}", assets.detail);
    assert_eq!(fx.hosts.host.assets("screenshot-v1.2.4").len(), 2);
  }

  #[test]
  fn test_build_failure_restores_version_files() {
    let mut fx = Fixture::new();
    fx.publishers.fail_build(ArtifactKind::Package);

    let batch = fx.orchestrator().run_batch(&options(false));
    let report = &batch.reports[0];

    assert_eq!(status(report, "versionSync"), StepStatus::Success);
    assert_eq!(status(report, "build"), StepStatus::Failed);
    assert_eq!(report.status, ReleaseStatus::Failed);
    assert!(fx.read("packages/screenshot/package.json").contains("\"version\": \"1.2.3\""));
    assert!(fx.read("packages/screenshot/src/version.ts").contains("\"1.2.3\""));
    assert!(fx.read("packages/screenshot/README.md").contains("screenshot@1.2.3"));
    assert!(fx.scm.commits_made().is_empty());
    assert!(report.rollback.is_none());

    // Nothing was left behind, so the same release can run again
    fx.publishers = FakePublishers::new();
    let retry = fx.orchestrator().run_batch(&options(false));
    assert!(retry.reports[0].succeeded(), "{}", retry.reports[0].render_text());
    assert_eq!(retry.reports[0].version.as_deref(), Some("1.2.4"));
  }

  #[test]
  fn test_publish_failure_without_rollback_keeps_checkout_hint() {
    let fx = Fixture::new();
    fx.add_binaries();
    fx.publishers.fail_unpublish(ArtifactKind::Package);
    fx.publishers.fail_publish(ArtifactKind::Binaries);

    let batch = fx.orchestrator().run_batch(&options(false));
    let report = &batch.reports[0];
    let rollback = report.rollback.as_ref().unwrap();

    assert!(!rollback.is_complete());
    assert!(
      rollback
        .manual_cleanup
        .iter()
        .any(|m| m.contains("git checkout -- packages/screenshot/package.json"))
    );
    assert!(fx.read("packages/screenshot/package.json").contains("1.2.4"));
  }

  #[test]
  fn test_version_mismatch_blocks_publishing() {
    let fx = Fixture::new();
    let path = fx.root().join(".shiprail/components/screenshot.json");
    let mut config: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    config["versionSync"]
      .as_array_mut()
      .unwrap()
      .push(serde_json::to_value(VersionSyncRule::new("packages/screenshot/CHANGES.md", "v[0-9.]+", "v{version}")).unwrap());
    fs::write(&path, config.to_string()).unwrap();

    let batch = fx.orchestrator().run_batch(&options(false));
    let report = &batch.reports[0];

    assert_eq!(status(report, "versionSync"), StepStatus::Failed);
    assert_eq!(status(report, "publish:package"), StepStatus::Skipped);
    assert!(fx.publishers.calls().is_empty());
    assert!(report.rollback.is_none());
    assert!(report.error.as_ref().unwrap().message.contains("CHANGES.md"));
    assert!(fx.read("packages/screenshot/package.json").contains("\"version\": \"1.2.3\""));
  }

  #[test]
  fn test_unverified_release_is_not_rolled_back() {
    let fx = Fixture::new();
    fx.publishers.fail_verify(ArtifactKind::Package);

    let batch = fx.orchestrator().run_batch(&options(false));
    let report = &batch.reports[0];

    assert!(report.succeeded());
    assert_eq!(report.status, ReleaseStatus::Unverified);
    assert_eq!(status(report, "verify"), StepStatus::Success);
    assert!(report.rollback.is_none());
    assert!(report.artifacts.is_published(ArtifactKind::Package));
  }

  #[test]
  fn test_only_filter_and_skip_verify() {
    let fx = Fixture::new();
    let batch = fx.orchestrator().run_batch(&ReleaseOptions {
      components: vec!["screenshot".to_string()],
      only: vec![ArtifactKind::Container],
      skip_verify: true,
      ..Default::default()
    });
    let report = &batch.reports[0];

    assert!(report.succeeded(), "{}", report.render_text());
    assert_eq!(status(report, "publish:package"), StepStatus::Skipped);
    assert_eq!(status(report, "verify"), StepStatus::Skipped);
    assert!(matches!(report.verification, Some(VerificationResult::Skipped { .. })));
    assert!(fx.publishers.calls().is_empty());
    // Tagging still happens
    assert_eq!(fx.scm.local_tags(), vec!["screenshot-v1.2.4".to_string()]);
  }

  #[test]
  fn test_batch_is_fail_fast() {
    let fx = Fixture::new();
    let batch = fx.orchestrator().run_batch(&ReleaseOptions {
      components: vec!["missing".to_string(), "screenshot".to_string()],
      dry_run: true,
      ..Default::default()
    });

    assert_eq!(batch.reports.len(), 1);
    assert_eq!(batch.failed_component.as_deref(), Some("missing"));
    assert_eq!(batch.not_started, vec!["screenshot".to_string()]);
    assert_eq!(batch.into_result().unwrap_err().kind(), ErrorKind::Config);
  }

  #[test]
  fn test_remote_mode_triggers_and_monitors() {
    let fx = Fixture::new();
    let batch = fx.orchestrator().run_batch(&ReleaseOptions {
      components: vec!["screenshot".to_string()],
      mode: Mode::Remote,
      ..Default::default()
    });
    let report = &batch.reports[0];

    assert!(report.succeeded(), "{}", report.render_text());
    let names: Vec<&str> = report.steps.iter().map(|s| s.step.as_str()).collect();
    assert_eq!(names, vec!["preflight", "remoteTrigger", "remoteMonitor"]);

    let triggered = fx.hosts.workflow.triggered.lock().unwrap();
    assert_eq!(triggered[0].0, "release.yml");
    assert!(triggered[0].2.contains(&("version_bump".to_string(), "patch".to_string())));
    // Tests and build run in CI, not here
    assert!(fx.runner.calls().is_empty());
    assert!(fx.read("packages/screenshot/package.json").contains("1.2.3"));
  }

  #[test]
  fn test_cancelled_remote_wait_fails_trigger() {
    let fx = Fixture::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let batch = fx.orchestrator().with_cancellation(cancel).run_batch(&ReleaseOptions {
      components: vec!["screenshot".to_string()],
      mode: Mode::Remote,
      ..Default::default()
    });
    let report = &batch.reports[0];

    assert!(!report.succeeded());
    assert_eq!(status(report, "remoteTrigger"), StepStatus::Failed);
    assert_eq!(status(report, "remoteMonitor"), StepStatus::Skipped);
    let error = report.steps[1].error.as_ref().unwrap();
    assert_eq!(error.kind, ErrorKind::Cancelled);
  }
}
