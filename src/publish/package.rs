//! Registry packages: npm for `package.json`, crates.io for `Cargo.toml`

use super::{PublishContext, PublishOutcome, Publisher, VerifyOutcome};
use crate::core::config::{ArtifactKind, ManifestKind};
use crate::core::error::{RailError, RailResult};

#[derive(Debug, Default, Clone, Copy)]
pub struct PackagePublisher;

impl PackagePublisher {
  fn manifest_kind(ctx: &PublishContext<'_>) -> RailResult<ManifestKind> {
    ctx.config.manifest_kind().ok_or_else(|| {
      RailError::with_help(
        format!(
          "Cannot tell which registry '{}' publishes to",
          ctx.config.manifest_rel_path().display()
        ),
        "Set manifestFile to a package.json or Cargo.toml",
      )
    })
  }

  fn registry_url(kind: ManifestKind, name: &str, version: &str) -> String {
    match kind {
      ManifestKind::Npm => format!("https://www.npmjs.com/package/{}/v/{}", name, version),
      ManifestKind::Cargo => format!("https://crates.io/crates/{}/{}", name, version),
    }
  }
}

impl Publisher for PackagePublisher {
  fn kind(&self) -> ArtifactKind {
    ArtifactKind::Package
  }

  /// Packaging happens inside `npm publish` and `cargo publish`
  fn build(&self, _ctx: &PublishContext<'_>) -> RailResult<String> {
    Ok(String::new())
  }

  /// In a dry run the registry tool packs and validates without uploading
  fn publish(&self, ctx: &PublishContext<'_>) -> RailResult<PublishOutcome> {
    let manifest = Self::manifest_kind(ctx)?;
    let (program, mut args) = match manifest {
      ManifestKind::Npm => ("npm", vec!["publish", "--access", "public"]),
      ManifestKind::Cargo => ("cargo", vec!["publish", "--no-verify"]),
    };
    if ctx.dry_run {
      args.push("--dry-run");
    }
    let spec = ctx.command(program, &args);

    if ctx.dry_run {
      let output = ctx.run_publish_step(self.kind(), &spec)?;
      tracing::info!(command = %spec.display(), "dry run: package packed, not uploaded");
      return Ok(PublishOutcome::simulated(output.combined()));
    }

    let output = ctx.run_publish_step(self.kind(), &spec)?;
    let name = ctx.config.package_name();
    let version = ctx.version.to_string();
    tracing::info!(package = name, %version, "package published");

    Ok(PublishOutcome {
      published: true,
      url: Some(Self::registry_url(manifest, name, &version)),
      checksum: None,
      binaries: Vec::new(),
      output: output.combined(),
    })
  }

  fn verify(&self, ctx: &PublishContext<'_>) -> RailResult<VerifyOutcome> {
    let name = ctx.config.package_name();
    let version = ctx.version.to_string();
    let target = format!("package {}@{}", name, version);

    match Self::manifest_kind(ctx)? {
      ManifestKind::Npm => {
        let spec_arg = format!("{}@{}", name, version);
        let output = ctx.runner.run(&ctx.probe("npm", &["view", &spec_arg, "version"]))?;
        if output.success() && output.stdout.trim() == version {
          Ok(VerifyOutcome::ok(target, "visible on npm"))
        } else {
          Ok(VerifyOutcome::failed(
            target,
            format!("npm does not list {}; check `npm view {}`", version, spec_arg),
          ))
        }
      }
      ManifestKind::Cargo => {
        // `cargo search` prints `name = "x.y.z"    # description`
        let output = ctx.runner.run(&ctx.probe("cargo", &["search", name, "--limit", "1"]))?;
        let expected = format!("{} = \"{}\"", name, version);
        if output.success() && output.stdout.lines().any(|l| l.starts_with(&expected)) {
          Ok(VerifyOutcome::ok(target, "visible on crates.io"))
        } else {
          Ok(VerifyOutcome::failed(
            target,
            format!("crates.io index does not show {} yet; it may still be propagating", version),
          ))
        }
      }
    }
  }

  fn unpublish(&self, ctx: &PublishContext<'_>) -> RailResult<()> {
    let name = ctx.config.package_name();
    let version = ctx.version.to_string();
    let spec = match Self::manifest_kind(ctx)? {
      ManifestKind::Npm => {
        let spec_arg = format!("{}@{}", name, version);
        ctx.command("npm", &["unpublish", &spec_arg, "--force"])
      }
      // crates.io never deletes; yanking is the closest undo
      ManifestKind::Cargo => ctx.command("cargo", &["yank", "--version", &version, name]),
    };
    ctx.run_publish_step(self.kind(), &spec)?;
    Ok(())
  }
}
