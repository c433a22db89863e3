//! Container images via the docker CLI
//!
//! The image is built in dry runs too; only the push is skipped.

use super::{PublishContext, PublishOutcome, Publisher, VerifyOutcome};
use crate::core::config::ArtifactKind;
use crate::core::error::{RailError, RailResult, ReleaseError};

#[derive(Debug, Default, Clone, Copy)]
pub struct ContainerPublisher;

impl ContainerPublisher {
  /// `image:version`
  fn reference(ctx: &PublishContext<'_>) -> RailResult<String> {
    let image = ctx.config.container_image.as_deref().ok_or_else(|| {
      RailError::with_help(
        format!("Component '{}' publishes a container but has no image", ctx.config.name),
        "Set containerImage in the component config",
      )
    })?;
    Ok(format!("{}:{}", image, ctx.version))
  }
}

impl Publisher for ContainerPublisher {
  fn kind(&self) -> ArtifactKind {
    ArtifactKind::Container
  }

  fn build(&self, ctx: &PublishContext<'_>) -> RailResult<String> {
    let reference = Self::reference(ctx)?;
    let spec = ctx.command("docker", &["build", "--tag", &reference, "."]);
    Ok(ctx.run_build_step("container", &spec)?.combined())
  }

  fn publish(&self, ctx: &PublishContext<'_>) -> RailResult<PublishOutcome> {
    let reference = Self::reference(ctx)?;
    let spec = ctx.command("docker", &["push", &reference]);
    if ctx.dry_run {
      tracing::info!(command = %spec.display(), "dry run: would push image");
      return Ok(PublishOutcome::simulated(format!("would run `{}`", spec.display())));
    }

    let output = ctx.run_publish_step(self.kind(), &spec)?;
    // docker push ends with `<tag>: digest: sha256:... size: N`
    let checksum = output
      .stdout
      .split_whitespace()
      .find(|word| word.starts_with("sha256:"))
      .map(String::from);
    tracing::info!(image = %reference, digest = ?checksum, "image pushed");

    Ok(PublishOutcome {
      published: true,
      url: Some(reference),
      checksum,
      binaries: Vec::new(),
      output: output.combined(),
    })
  }

  fn verify(&self, ctx: &PublishContext<'_>) -> RailResult<VerifyOutcome> {
    let reference = Self::reference(ctx)?;
    let target = format!("container {}", reference);
    let output = ctx.runner.run(&ctx.probe("docker", &["manifest", "inspect", &reference]))?;
    if output.success() {
      Ok(VerifyOutcome::ok(target, "manifest resolvable"))
    } else {
      Ok(VerifyOutcome::failed(
        target,
        format!("registry has no manifest; try `docker manifest inspect {}`", reference),
      ))
    }
  }

  /// Registries expose no common delete; the tag must be removed by hand
  fn unpublish(&self, ctx: &PublishContext<'_>) -> RailResult<()> {
    let reference = Self::reference(ctx)?;
    Err(
      ReleaseError::Publish {
        artifact: self.kind().to_string(),
        message: format!("delete image tag {} from the registry manually", reference),
      }
      .into(),
    )
  }
}
