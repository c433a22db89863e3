//! `shiprail verify`: re-check that a released version is visible everywhere

use crate::commands::sync::parse_version;
use crate::core::config::ArtifactKind;
use crate::core::context::ReleaseContext;
use crate::core::error::{RailResult, ReleaseError};
use crate::core::vcs::ReleaseHost;
use crate::publish::{self, PublishContext, PublisherFactory, SystemPublishers, VerifyOutcome};
use crate::release::tags::format_tag;
use rayon::prelude::*;

pub fn run_verify(ctx: &ReleaseContext, component: &str, version_arg: &str) -> RailResult<()> {
  let version = parse_version(version_arg)?;
  let config = ctx.load_component(component)?;
  let host = ctx.host(&config);
  let tag = format_tag(ctx.settings.tagging.format, &config.name, &version);
  let staging = std::env::temp_dir().join("shiprail-stage");

  let publish_ctx = PublishContext {
    root: &ctx.root,
    config: &config,
    version: &version,
    dry_run: false,
    runner: ctx.runner.as_ref(),
    timeouts: &ctx.settings.timeouts,
    staging_dir: &staging,
  };

  // Binaries are release assets, listed from the release below
  let kinds: Vec<ArtifactKind> = config
    .artifact_kinds()
    .into_iter()
    .filter(|k| *k != ArtifactKind::Binaries)
    .collect();

  let mut checks: Vec<VerifyOutcome> = kinds
    .par_iter()
    .map(|kind| {
      SystemPublishers
        .publisher(*kind)
        .verify(&publish_ctx)
        .unwrap_or_else(|e| VerifyOutcome::failed(kind.to_string(), e.to_string()))
    })
    .collect();

  let release = match host.release_exists(&tag) {
    Ok(true) => VerifyOutcome::ok(format!("release {}", tag), "exists"),
    Ok(false) => VerifyOutcome::failed(format!("release {}", tag), "not found on the host"),
    Err(e) => VerifyOutcome::failed(format!("release {}", tag), e.to_string()),
  };
  let release_found = release.ok;
  checks.push(release);

  if config.has_binaries && release_found {
    let mut expected: Vec<String> = config
      .platforms
      .iter()
      .map(|platform| publish::asset_stem(&config.name, &version, platform))
      .collect();
    expected.push(publish::CHECKSUMS_FILE.to_string());
    checks.push(publish::verify_release_assets(&host, &tag, &expected));
  }

  println!("🔍 {} {}", config.display_name(), version);
  for check in &checks {
    let icon = if check.ok { "✅" } else { "❌" };
    println!("  {} {}: {}", icon, check.target, check.detail);
  }

  let failures: Vec<String> = checks
    .iter()
    .filter(|c| !c.ok)
    .map(|c| format!("{}: {}", c.target, c.detail))
    .collect();
  if failures.is_empty() {
    Ok(())
  } else {
    Err(ReleaseError::Verification { failures }.into())
  }
}
