//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A git repository with shiprail components
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestWorkspace {
  /// Empty repository on `main` with one initial commit
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["config", "commit.gpgsign", "false"])?;
    git(&path, &["config", "tag.gpgsign", "false"])?;

    std::fs::write(path.join("README.md"), "# tools\n")?;
    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial commit"])?;

    Ok(Self { _root: root, path })
  }

  /// Add an npm component under `packages/<name>` with a config file
  ///
  /// Build and test commands are `true` so pre-flight passes offline. One
  /// versionSync rule keeps `src/version.ts` in step with package.json.
  pub fn add_component(&self, name: &str, version: &str) -> Result<PathBuf> {
    let dir = self.path.join("packages").join(name);
    std::fs::create_dir_all(dir.join("src"))?;

    std::fs::write(
      dir.join("package.json"),
      format!(
        "{{\n  \"name\": \"@acme/{}\",\n  \"version\": \"{}\"\n}}\n",
        name, version
      ),
    )?;
    std::fs::write(
      dir.join("src/version.ts"),
      format!("export const VERSION = \"{}\";\n", version),
    )?;

    let config = serde_json::json!({
      "name": name,
      "path": format!("packages/{}", name),
      "packageName": format!("@acme/{}", name),
      "hasPackage": true,
      "buildCommand": "true",
      "testCommand": "true",
      "versionSync": [
        {
          "file": format!("packages/{}/src/version.ts", name),
          "pattern": "VERSION = \"[^\"]*\"",
          "replacement": "VERSION = \"{version}\""
        }
      ]
    });
    let components = self.path.join(".shiprail/components");
    std::fs::create_dir_all(&components)?;
    std::fs::write(
      components.join(format!("{}.json", name)),
      serde_json::to_string_pretty(&config)?,
    )?;

    Ok(dir)
  }

  /// Commit current changes
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;

    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Write a file relative to the repository root
  pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
    let full = self.path.join(path);
    if let Some(parent) = full.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(full, content)?;
    Ok(())
  }

  pub fn tag(&self, name: &str) -> Result<()> {
    git(&self.path, &["tag", name])?;
    Ok(())
  }

  pub fn tags(&self) -> Result<Vec<String>> {
    let output = git(&self.path, &["tag", "--list"])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect(),
    )
  }

  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }

  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the shiprail binary; returns the output whatever the exit status
pub fn shiprail(cwd: &Path, args: &[&str]) -> Result<Output> {
  Command::new(env!("CARGO_BIN_EXE_shiprail"))
    .current_dir(cwd)
    .args(args)
    .env_remove("SHIPRAIL_LOG")
    .env_remove("RUST_LOG")
    .output()
    .context("Failed to run shiprail")
}

/// Run shiprail and require success
pub fn run_shiprail(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = shiprail(cwd, args)?;

  if !output.status.success() {
    anyhow::bail!(
      "shiprail command failed: shiprail {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      String::from_utf8_lossy(&output.stdout),
      String::from_utf8_lossy(&output.stderr)
    );
  }

  Ok(output)
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).into_owned()
}
