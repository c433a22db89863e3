//! Integration tests for `shiprail changelog`

use crate::helpers::{TestWorkspace, run_shiprail, stdout};
use anyhow::Result;

#[test]
fn test_changelog_since_latest_tag() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_component("screenshot", "1.2.3")?;
  ws.commit("feat: add screenshot component")?;
  ws.tag("screenshot-v1.2.3")?;

  ws.write_file("packages/screenshot/src/region.ts", "export const region = 1;\n")?;
  ws.commit("feat: capture a region (#12)")?;
  ws.write_file("packages/screenshot/src/region.ts", "export const region = 2;\n")?;
  ws.commit("fix: crash on empty selection")?;
  ws.write_file("docs/guide.md", "# Guide\n")?;
  ws.commit("docs: unrelated guide")?;

  let output = run_shiprail(&ws.path, &["changelog", "screenshot"])?;
  let text = stdout(&output);

  assert!(text.contains("### Features"), "{}", text);
  assert!(text.contains("capture a region"));
  assert!(text.contains("### Bug Fixes"));
  assert!(text.contains("crash on empty selection"));
  assert!(!text.contains("add screenshot component"));
  assert!(!text.contains("unrelated guide"));
  Ok(())
}

#[test]
fn test_changelog_with_explicit_range() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_component("screenshot", "1.2.3")?;
  let first = ws.commit("feat: add screenshot component")?;
  ws.write_file("packages/screenshot/src/region.ts", "export const region = 1;\n")?;
  ws.commit("feat!: drop legacy capture API")?;

  let output = run_shiprail(&ws.path, &["changelog", "screenshot", "--from", &first, "--to", "HEAD"])?;
  let text = stdout(&output);
  assert!(text.contains("Breaking Changes"), "{}", text);
  assert!(text.contains("drop legacy capture API"));
  assert!(!text.contains("add screenshot component"));
  Ok(())
}
