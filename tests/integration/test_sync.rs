//! Integration tests for `shiprail sync`

use crate::helpers::{TestWorkspace, run_shiprail, shiprail, stdout};
use anyhow::Result;

#[test]
fn test_sync_then_check() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_component("screenshot", "1.2.3")?;
  ws.commit("feat: add screenshot component")?;

  let output = run_shiprail(&ws.path, &["sync", "screenshot", "2.0.0"])?;
  assert!(stdout(&output).contains("Updated 1 file(s) to 2.0.0"));
  assert!(ws.read_file("packages/screenshot/src/version.ts")?.contains("VERSION = \"2.0.0\""));

  run_shiprail(&ws.path, &["sync", "screenshot", "2.0.0", "--check"])?;
  Ok(())
}

#[test]
fn test_second_sync_changes_nothing() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_component("screenshot", "1.2.3")?;
  ws.commit("feat: add screenshot component")?;

  run_shiprail(&ws.path, &["sync", "screenshot", "v1.3.0"])?;
  let before = ws.read_file("packages/screenshot/src/version.ts")?;

  let output = run_shiprail(&ws.path, &["sync", "screenshot", "1.3.0"])?;
  assert!(stdout(&output).contains("already at 1.3.0"));
  assert_eq!(ws.read_file("packages/screenshot/src/version.ts")?, before);
  Ok(())
}

#[test]
fn test_check_reports_mismatch() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_component("screenshot", "1.2.3")?;
  ws.commit("feat: add screenshot component")?;

  let output = shiprail(&ws.path, &["sync", "screenshot", "9.9.9", "--check"])?;
  assert_eq!(output.status.code(), Some(3));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("version.ts"), "{}", stderr);
  Ok(())
}

#[test]
fn test_invalid_version_is_rejected() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_component("screenshot", "1.2.3")?;
  ws.commit("feat: add screenshot component")?;

  let output = shiprail(&ws.path, &["sync", "screenshot", "two"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid version 'two'"));
  Ok(())
}
