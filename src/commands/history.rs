//! `shiprail history`: list recorded release attempts

use crate::core::context::ReleaseContext;
use crate::core::error::RailResult;
use crate::release::manifest::{ManifestWriter, SubmoduleRelease};
use crate::release::state::ReleaseStatus;

fn status_icon(status: ReleaseStatus) -> &'static str {
  match status {
    ReleaseStatus::Released => "✅",
    ReleaseStatus::Unverified => "⚠️ ",
    ReleaseStatus::Failed => "❌",
    ReleaseStatus::RolledBack => "↩️ ",
  }
}

pub fn run_history(ctx: &ReleaseContext, component: Option<String>, json: bool) -> RailResult<()> {
  let writer = ManifestWriter::load_manifest(&ctx.manifest_path())?;
  let entries: Vec<&SubmoduleRelease> = match &component {
    Some(name) => writer.history(name),
    None => writer.releases().iter().collect(),
  };

  if json {
    println!("{}", serde_json::to_string_pretty(&entries)?);
    return Ok(());
  }

  if entries.is_empty() {
    match &component {
      Some(name) => println!("No releases recorded for {}", name),
      None => println!("No releases recorded in {}", writer.path().display()),
    }
    return Ok(());
  }

  for entry in entries {
    println!(
      "{} {:<16} {:<10} {}  {}",
      status_icon(entry.status),
      entry.component,
      entry.version,
      entry.timestamp.format("%Y-%m-%d %H:%M"),
      entry.status
    );
    for line in &entry.manual_cleanup {
      println!("     ❗ {}", line);
    }
  }
  Ok(())
}
