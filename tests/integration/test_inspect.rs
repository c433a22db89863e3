//! Integration tests for `shiprail config` and `shiprail history`

use crate::helpers::{TestWorkspace, run_shiprail, shiprail, stdout};
use anyhow::Result;

#[test]
fn test_config_json() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_component("screenshot", "1.2.3")?;
  ws.commit("feat: add screenshot component")?;

  let output = run_shiprail(&ws.path, &["config", "screenshot", "--json"])?;
  let config: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(config["name"], "screenshot");
  assert_eq!(config["hasPackage"], true);
  assert_eq!(config["manifestFile"], "package.json");
  assert_eq!(config["versionSync"].as_array().unwrap().len(), 1);
  Ok(())
}

#[test]
fn test_config_defaults_without_file() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file(
    "packages/ui/package.json",
    "{\n  \"name\": \"@acme/ui\",\n  \"version\": \"0.4.0\"\n}\n",
  )?;
  ws.commit("feat: add ui")?;

  let output = run_shiprail(&ws.path, &["config", "ui"])?;
  let text = stdout(&output);
  assert!(text.contains("defaults (no config file)"), "{}", text);
  assert!(text.contains("@acme/ui"));
  Ok(())
}

#[test]
fn test_config_env_override() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_component("screenshot", "1.2.3")?;
  ws.commit("feat: add screenshot component")?;

  let output = std::process::Command::new(env!("CARGO_BIN_EXE_shiprail"))
    .current_dir(&ws.path)
    .args(["config", "screenshot", "--json"])
    .env("SHIPRAIL_SCREENSHOT_BUILD_COMMAND", "make dist")
    .output()?;
  assert!(output.status.success());
  let config: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(config["buildCommand"], "make dist");
  Ok(())
}

#[test]
fn test_missing_component_is_user_error() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let output = shiprail(&ws.path, &["config", "ghost"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("ghost"));
  Ok(())
}

#[test]
fn test_history_lists_recorded_attempts() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_shiprail(&ws.path, &["history"])?;
  assert!(stdout(&output).contains("No releases recorded"));

  ws.write_file(
    ".shiprail/releases.json",
    r#"{
  "formatVersion": 1,
  "releases": [
    {
      "component": "screenshot",
      "version": "1.2.4",
      "tag": "screenshot-v1.2.4",
      "timestamp": "2024-05-01T10:00:00Z",
      "mode": "local",
      "status": "released",
      "artifacts": { "kinds": { "package": { "published": true } } }
    },
    {
      "component": "ui",
      "version": "0.5.0",
      "timestamp": "2024-05-02T10:00:00Z",
      "mode": "local",
      "status": "failed",
      "manualCleanup": ["git tag -d ui-v0.5.0"]
    }
  ]
}"#,
  )?;

  let output = run_shiprail(&ws.path, &["history"])?;
  let text = stdout(&output);
  assert!(text.contains("screenshot"), "{}", text);
  assert!(text.contains("2024-05-01 10:00"));
  assert!(text.contains("git tag -d ui-v0.5.0"));

  let output = run_shiprail(&ws.path, &["history", "ui", "--json"])?;
  let entries: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(entries.as_array().unwrap().len(), 1);
  assert_eq!(entries[0]["status"], "failed");
  Ok(())
}
