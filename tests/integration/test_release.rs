//! Integration tests for `shiprail release`

use crate::helpers::{TestWorkspace, run_shiprail, shiprail, stdout};
use anyhow::Result;

#[test]
fn test_dry_run_changes_nothing() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_component("screenshot", "1.2.3")?;
  ws.commit("feat: add screenshot component")?;

  let output = run_shiprail(&ws.path, &["release", "screenshot", "--dry-run", "--json"])?;
  let report: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  let release = &report["reports"][0];

  assert_eq!(release["component"], "screenshot");
  assert_eq!(release["previousVersion"], "1.2.3");
  assert_eq!(release["version"], "1.2.4");
  assert_eq!(release["dryRun"], true);
  assert_eq!(release["artifacts"]["kinds"]["package"]["published"], false);

  let steps: Vec<&str> = release["steps"]
    .as_array()
    .unwrap()
    .iter()
    .map(|s| s["step"].as_str().unwrap())
    .collect();
  assert_eq!(steps[0], "preflight");
  assert_eq!(*steps.last().unwrap(), "manifestWrite");

  assert!(ws.read_file("packages/screenshot/package.json")?.contains("\"1.2.3\""));
  assert!(ws.read_file("packages/screenshot/src/version.ts")?.contains("\"1.2.3\""));
  assert!(ws.tags()?.is_empty());
  assert!(!ws.file_exists(".shiprail/releases.json"));
  Ok(())
}

#[test]
fn test_exact_version_and_text_report() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_component("screenshot", "1.2.3")?;
  ws.commit("feat: add screenshot component")?;

  let output = run_shiprail(&ws.path, &["release", "screenshot", "--version", "2.0.0", "--dry-run"])?;
  let text = stdout(&output);

  assert!(text.contains("📦 screenshot 1.2.3 → 2.0.0 (dry run)"), "{}", text);
  assert!(text.contains("publish:container"));
  assert!(text.contains("Status: released"));
  Ok(())
}

#[test]
fn test_dirty_tree_fails_preflight() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_component("screenshot", "1.2.3")?;
  ws.commit("feat: add screenshot component")?;
  ws.write_file("packages/screenshot/src/index.ts", "export {};\n")?;

  let output = shiprail(&ws.path, &["release", "screenshot", "--dry-run"])?;
  assert_eq!(output.status.code(), Some(3));

  let text = stdout(&output);
  assert!(text.contains("clean-tree"), "{}", text);
  assert!(text.contains("Commit or stash"));
  assert!(ws.read_file("packages/screenshot/package.json")?.contains("\"1.2.3\""));
  Ok(())
}

#[test]
fn test_unknown_component_stops_batch() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_component("screenshot", "1.2.3")?;
  ws.commit("feat: add screenshot component")?;

  let output = shiprail(&ws.path, &["release", "nope", "screenshot", "--dry-run"])?;
  assert_eq!(output.status.code(), Some(1));

  let text = stdout(&output);
  assert!(text.contains("❌ nope failed"), "{}", text);
  assert!(text.contains("Not started: screenshot"));
  Ok(())
}
