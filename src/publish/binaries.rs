//! Per-platform binaries, staged with SHA-256 checksums and attached to the
//! remote release once it exists
//!
//! Building and staging are local and run in dry runs too; only the upload
//! (done by the release step) is externally visible.

use super::{BinaryArtifact, PublishContext, PublishOutcome, Publisher, VerifyOutcome};
use crate::core::config::ArtifactKind;
use crate::core::error::{RailError, RailResult, ResultExt};
use crate::core::exec::CommandSpec;
use crate::core::vcs::ReleaseHost;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Checksum listing written next to the staged binaries
pub const CHECKSUMS_FILE: &str = "SHA256SUMS";

const DEFAULT_OUTPUT: &str = "dist/{name}-{platform}";

#[derive(Debug, Default, Clone, Copy)]
pub struct BinariesPublisher;

/// Hex SHA-256 of a file
pub fn sha256_file(path: &Path) -> RailResult<String> {
  let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
  Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Files to upload as release assets: every binary plus the checksum listing
pub fn release_assets(binaries: &[BinaryArtifact]) -> Vec<PathBuf> {
  let mut assets: Vec<PathBuf> = binaries.iter().map(|b| b.path.clone()).collect();
  if let Some(dir) = binaries.first().and_then(|b| b.path.parent()) {
    let sums = dir.join(CHECKSUMS_FILE);
    if sums.is_file() {
      assets.push(sums);
    }
  }
  assets
}

/// Asset name without the source extension: `screenshot-1.2.4-linux-x64`
pub fn asset_stem(name: &str, version: &semver::Version, platform: &str) -> String {
  format!("{}-{}-{}", name, version, platform)
}

/// Confirm the release on the host lists every expected asset
///
/// An entry matches a listed asset of the same name or the same name plus an
/// extension, so stems work when the extension is not known.
pub fn verify_release_assets(host: &dyn ReleaseHost, tag: &str, expected: &[String]) -> VerifyOutcome {
  let target = format!("assets {}", tag);
  let listed = match host.release_assets(tag) {
    Ok(listed) => listed,
    Err(e) => return VerifyOutcome::failed(target, e.to_string()),
  };

  let missing: Vec<&str> = expected
    .iter()
    .filter(|want| {
      !listed
        .iter()
        .any(|name| name == *want || name.strip_prefix(want.as_str()).is_some_and(|rest| rest.starts_with('.')))
    })
    .map(String::as_str)
    .collect();

  if missing.is_empty() {
    VerifyOutcome::ok(target, format!("{} asset(s) attached", expected.len()))
  } else {
    VerifyOutcome::failed(
      target,
      format!("missing on the release: {}; re-upload with `gh release upload {}`", missing.join(", "), tag),
    )
  }
}

impl BinariesPublisher {
  fn built_path(ctx: &PublishContext<'_>, platform: &str) -> PathBuf {
    let template = ctx.config.binary_output.as_deref().unwrap_or(DEFAULT_OUTPUT);
    let relative = template
      .replace("{name}", &ctx.config.name)
      .replace("{platform}", platform);
    ctx.component_dir().join(relative)
  }

  fn stage_dir(ctx: &PublishContext<'_>) -> PathBuf {
    ctx
      .staging_dir
      .join(format!("{}-{}", ctx.config.name, ctx.version))
  }

  /// `screenshot-1.2.4-linux-x64`, keeping the source extension (`.exe`, `.zip`)
  fn asset_name(ctx: &PublishContext<'_>, platform: &str, source: &Path) -> String {
    let mut name = asset_stem(&ctx.config.name, ctx.version, platform);
    if let Some(ext) = source.extension().and_then(|e| e.to_str()) {
      name.push('.');
      name.push_str(ext);
    }
    name
  }
}

impl Publisher for BinariesPublisher {
  fn kind(&self) -> ArtifactKind {
    ArtifactKind::Binaries
  }

  fn build(&self, ctx: &PublishContext<'_>) -> RailResult<String> {
    let mut log = String::new();
    for platform in &ctx.config.platforms {
      let Some(template) = ctx.config.binary_build_command.as_deref() else {
        // Produced by the component build; only the output has to exist
        continue;
      };
      let command = template.replace("{platform}", platform);
      let spec = CommandSpec::shell(&command, ctx.timeouts.command()).current_dir(ctx.component_dir());
      let output = ctx.run_build_step(&format!("binary {}", platform), &spec)?;
      let _ = writeln!(log, "{}", output.combined());
    }
    Ok(log)
  }

  /// Copy each binary into the staging directory and checksum it
  fn publish(&self, ctx: &PublishContext<'_>) -> RailResult<PublishOutcome> {
    let stage = Self::stage_dir(ctx);
    fs::create_dir_all(&stage).with_context(|| format!("Failed to create {}", stage.display()))?;

    let mut binaries = Vec::new();
    let mut sums = String::new();
    for platform in &ctx.config.platforms {
      let source = Self::built_path(ctx, platform);
      if !source.is_file() {
        return Err(RailError::with_help(
          format!("Binary for {} not found at {}", platform, source.display()),
          "Check binaryOutput and binaryBuildCommand in the component config",
        ));
      }

      let name = Self::asset_name(ctx, platform, &source);
      let staged = stage.join(&name);
      fs::copy(&source, &staged).with_context(|| format!("Failed to stage {}", source.display()))?;
      let checksum = sha256_file(&staged)?;
      let _ = writeln!(sums, "{}  {}", checksum, name);

      binaries.push(BinaryArtifact {
        platform: platform.clone(),
        path: staged,
        checksum,
      });
    }

    let sums_path = stage.join(CHECKSUMS_FILE);
    fs::write(&sums_path, &sums)?;
    tracing::info!(count = binaries.len(), dir = %stage.display(), dry_run = ctx.dry_run, "binaries staged");

    Ok(PublishOutcome {
      // Visible only after the release assets are uploaded
      published: false,
      url: None,
      checksum: Some(sha256_file(&sums_path)?),
      binaries,
      output: sums,
    })
  }

  /// Re-hash the staged files against the checksum listing; presence on the
  /// release is checked with [`verify_release_assets`]
  fn verify(&self, ctx: &PublishContext<'_>) -> RailResult<VerifyOutcome> {
    let stage = Self::stage_dir(ctx);
    let target = format!("binaries {}", ctx.version);
    let Ok(listing) = fs::read_to_string(stage.join(CHECKSUMS_FILE)) else {
      return Ok(VerifyOutcome::failed(target, "no staged checksum listing"));
    };

    let mut mismatched = Vec::new();
    for line in listing.lines().filter(|l| !l.trim().is_empty()) {
      let Some((expected, name)) = line.split_once("  ") else {
        continue;
      };
      match sha256_file(&stage.join(name)) {
        Ok(actual) if actual == expected => {}
        _ => mismatched.push(name.to_string()),
      }
    }

    if mismatched.is_empty() {
      Ok(VerifyOutcome::ok(target, "checksums match"))
    } else {
      Ok(VerifyOutcome::failed(
        target,
        format!("checksum mismatch: {}", mismatched.join(", ")),
      ))
    }
  }

  /// Assets disappear with the remote release
  fn unpublish(&self, _ctx: &PublishContext<'_>) -> RailResult<()> {
    Ok(())
  }
}
