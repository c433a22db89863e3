//! `shiprail sync`: rewrite (or check) version strings for a component

use crate::core::context::ReleaseContext;
use crate::core::error::{RailError, RailResult, ReleaseError};
use crate::release::version;
use semver::Version;

pub fn run_sync(ctx: &ReleaseContext, component: &str, version_arg: &str, check: bool) -> RailResult<()> {
  let version = parse_version(version_arg)?.to_string();
  let config = ctx.load_component(component)?;

  if config.version_sync.is_empty() {
    println!("⚠️  {} has no versionSync rules", component);
    return Ok(());
  }

  if check {
    return match version::first_version_problem(&ctx.root, &config.version_sync, &version) {
      None => {
        println!("✅ {} version files carry {}", component, version);
        Ok(())
      }
      Some(problem) => Err(
        ReleaseError::VersionMismatch {
          version,
          problems: vec![problem],
        }
        .into(),
      ),
    };
  }

  let report = version::sync_versions(&ctx.root, &config.version_sync, &version);

  for file in &report.files_updated {
    println!("  ✏️  {}", file.display());
  }
  for file in &report.skipped {
    println!("  ⏭️  {} (optional, missing)", file.display());
  }

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

  if !version::verify_versions(&ctx.root, &config.version_sync, &version) {
    return Err(
      ReleaseError::VersionMismatch {
        problems: version::first_version_problem(&ctx.root, &config.version_sync, &version)
          .into_iter()
          .collect(),
        version,
      }
      .into(),
    );
  }

  if report.files_updated.is_empty() {
    println!("✅ {} already at {}", component, version);
  } else {
    println!("✅ Updated {} file(s) to {}", report.files_updated.len(), version);
  }
  Ok(())
}

/// Accepts `1.2.4` and `v1.2.4`
pub fn parse_version(raw: &str) -> RailResult<Version> {
  Version::parse(raw.trim_start_matches('v')).map_err(|e| {
    RailError::with_help(
      format!("Invalid version '{}': {}", raw, e),
      "Use a semantic version such as 1.2.4",
    )
  })
}
