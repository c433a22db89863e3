//! Artifact publishers
//!
//! One [`Publisher`] per artifact kind. Each is a thin wrapper over a
//! registry CLI run through the [`CommandRunner`]; all of them share the
//! same contract:
//!
//! - `build` prepares the artifact (docker build, vsce package, ...)
//! - `publish` pushes it, or only logs what it would do in a dry run
//! - `verify` asks the registry whether `name@version` is visible
//! - `unpublish` is best-effort and used only by rollback

mod binaries;
mod container;
mod extension;
mod package;

#[cfg(test)]
pub mod fake;

pub use binaries::{BinariesPublisher, CHECKSUMS_FILE, asset_stem, release_assets, verify_release_assets};
pub use container::ContainerPublisher;
pub use extension::ExtensionPublisher;
pub use package::PackagePublisher;

use crate::core::config::{ArtifactKind, ComponentConfig, TimeoutSection};
use crate::core::error::{RailResult, ReleaseError};
use crate::core::exec::{CommandOutput, CommandRunner, CommandSpec};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A staged platform binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryArtifact {
  pub platform: String,
  pub path: PathBuf,
  /// Hex SHA-256 of the file
  pub checksum: String,
}

/// What a publish call achieved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishOutcome {
  /// Externally visible now (always false in a dry run)
  pub published: bool,
  pub url: Option<String>,
  pub checksum: Option<String>,
  pub binaries: Vec<BinaryArtifact>,
  pub output: String,
}

impl PublishOutcome {
  pub fn simulated(output: impl Into<String>) -> Self {
    Self {
      output: output.into(),
      ..Default::default()
    }
  }
}

/// Result of one verification probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOutcome {
  pub target: String,
  pub ok: bool,
  pub detail: String,
}

impl VerifyOutcome {
  pub fn ok(target: impl Into<String>, detail: impl Into<String>) -> Self {
    Self {
      target: target.into(),
      ok: true,
      detail: detail.into(),
    }
  }

  pub fn failed(target: impl Into<String>, detail: impl Into<String>) -> Self {
    Self {
      target: target.into(),
      ok: false,
      detail: detail.into(),
    }
  }
}

/// Everything a publisher needs for one component release
pub struct PublishContext<'a> {
  pub root: &'a Path,
  pub config: &'a ComponentConfig,
  pub version: &'a Version,
  pub dry_run: bool,
  pub runner: &'a dyn CommandRunner,
  pub timeouts: &'a TimeoutSection,
  /// Scratch directory for staged artifacts (outside the work tree)
  pub staging_dir: &'a Path,
}

impl PublishContext<'_> {
  pub fn component_dir(&self) -> PathBuf {
    self.config.component_dir(self.root)
  }

  /// A command run in the component directory with the command timeout
  pub fn command(&self, program: &str, args: &[&str]) -> CommandSpec {
    CommandSpec::new(program, self.timeouts.command())
      .args(args.iter().copied())
      .current_dir(self.component_dir())
  }

  pub fn probe(&self, program: &str, args: &[&str]) -> CommandSpec {
    CommandSpec::new(program, self.timeouts.verify())
      .args(args.iter().copied())
      .current_dir(self.component_dir())
  }

  /// Run a command that must succeed; failures become `PublishError`
  pub fn run_publish_step(&self, kind: ArtifactKind, spec: &CommandSpec) -> RailResult<CommandOutput> {
    let output = self.runner.run(spec)?;
    if !output.success() {
      return Err(
        ReleaseError::Publish {
          artifact: kind.to_string(),
          message: format!("`{}` failed: {}", spec.display(), output.combined()),
        }
        .into(),
      );
    }
    Ok(output)
  }

  /// Run a build command; failures become `BuildError`
  pub fn run_build_step(&self, target: &str, spec: &CommandSpec) -> RailResult<CommandOutput> {
    let output = self.runner.run(spec)?;
    if !output.success() {
      return Err(
        ReleaseError::Build {
          target: target.to_string(),
          output: output.combined(),
        }
        .into(),
      );
    }
    Ok(output)
  }
}

/// Publishes one artifact kind
pub trait Publisher: Send + Sync {
  fn kind(&self) -> ArtifactKind;

  /// Prepare the artifact; returns captured output
  fn build(&self, ctx: &PublishContext<'_>) -> RailResult<String>;

  fn publish(&self, ctx: &PublishContext<'_>) -> RailResult<PublishOutcome>;

  /// Confirm `version` is visible in the registry
  fn verify(&self, ctx: &PublishContext<'_>) -> RailResult<VerifyOutcome>;

  /// Best-effort removal used by rollback
  fn unpublish(&self, ctx: &PublishContext<'_>) -> RailResult<()>;
}

/// Hands out the publisher for each artifact kind
pub trait PublisherFactory: Send + Sync {
  fn publisher(&self, kind: ArtifactKind) -> Arc<dyn Publisher>;
}

/// Publishers backed by the real registry CLIs
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPublishers;

impl PublisherFactory for SystemPublishers {
  fn publisher(&self, kind: ArtifactKind) -> Arc<dyn Publisher> {
    match kind {
      ArtifactKind::Package => Arc::new(PackagePublisher),
      ArtifactKind::Container => Arc::new(ContainerPublisher),
      ArtifactKind::Extension => Arc::new(ExtensionPublisher),
      ArtifactKind::Binaries => Arc::new(BinariesPublisher),
    }
  }
}
