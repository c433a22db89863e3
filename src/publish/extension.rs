//! Editor marketplace extensions via `vsce`
//!
//! The `.vsix` is packaged in dry runs too; only the upload is skipped.

use super::{PublishContext, PublishOutcome, Publisher, VerifyOutcome};
use crate::core::config::ArtifactKind;
use crate::core::error::{RailError, RailResult, ReleaseError};
use crate::utils;
use std::path::PathBuf;

#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionPublisher;

impl ExtensionPublisher {
  fn extension_id<'a>(ctx: &'a PublishContext<'_>) -> RailResult<&'a str> {
    ctx.config.extension_id.as_deref().ok_or_else(|| {
      RailError::with_help(
        format!("Component '{}' publishes an extension but has no id", ctx.config.name),
        "Set extensionId (publisher.name) in the component config",
      )
    })
  }

  fn vsix_path(ctx: &PublishContext<'_>) -> PathBuf {
    ctx
      .staging_dir
      .join(format!("{}-{}.vsix", ctx.config.name, ctx.version))
  }
}

/// Latest version reported by `vsce show --json`
fn shown_version(json: &str) -> Option<String> {
  let value: serde_json::Value = serde_json::from_str(json).ok()?;
  value
    .get("versions")?
    .as_array()?
    .first()?
    .get("version")?
    .as_str()
    .map(String::from)
}

impl Publisher for ExtensionPublisher {
  fn kind(&self) -> ArtifactKind {
    ArtifactKind::Extension
  }

  fn build(&self, ctx: &PublishContext<'_>) -> RailResult<String> {
    let vsix = utils::path_to_git_format(&Self::vsix_path(ctx));
    let spec = ctx.command("vsce", &["package", "--no-git-tag-version", "--out", &vsix]);
    std::fs::create_dir_all(ctx.staging_dir)?;
    Ok(ctx.run_build_step("extension", &spec)?.combined())
  }

  fn publish(&self, ctx: &PublishContext<'_>) -> RailResult<PublishOutcome> {
    let id = Self::extension_id(ctx)?;
    let vsix = utils::path_to_git_format(&Self::vsix_path(ctx));
    let spec = ctx.command("vsce", &["publish", "--packagePath", &vsix]);
    if ctx.dry_run {
      tracing::info!(command = %spec.display(), "dry run: would publish extension");
      return Ok(PublishOutcome::simulated(format!("would run `{}`", spec.display())));
    }

    let output = ctx.run_publish_step(self.kind(), &spec)?;
    tracing::info!(extension = id, version = %ctx.version, "extension published");
    Ok(PublishOutcome {
      published: true,
      url: Some(format!("https://marketplace.visualstudio.com/items?itemName={}", id)),
      checksum: None,
      binaries: Vec::new(),
      output: output.combined(),
    })
  }

  fn verify(&self, ctx: &PublishContext<'_>) -> RailResult<VerifyOutcome> {
    let id = Self::extension_id(ctx)?;
    let target = format!("extension {}@{}", id, ctx.version);
    let output = ctx.runner.run(&ctx.probe("vsce", &["show", id, "--json"]))?;
    let expected = ctx.version.to_string();

    match shown_version(&output.stdout) {
      Some(found) if output.success() && found == expected => Ok(VerifyOutcome::ok(target, "listed on marketplace")),
      Some(found) => Ok(VerifyOutcome::failed(
        target,
        format!("marketplace still lists {}; listings can lag a few minutes", found),
      )),
      None => Ok(VerifyOutcome::failed(
        target,
        format!("could not read marketplace listing; try `vsce show {}`", id),
      )),
    }
  }

  /// `vsce unpublish` removes every version, so this stays manual
  fn unpublish(&self, ctx: &PublishContext<'_>) -> RailResult<()> {
    let id = Self::extension_id(ctx)?;
    Err(
      ReleaseError::Publish {
        artifact: self.kind().to_string(),
        message: format!("remove {} {} from the marketplace manually", id, ctx.version),
      }
      .into(),
    )
  }
}
