//! Publishing credentials, checked before anything is written

use super::trait_def::{Check, CheckContext, CheckResult};
use crate::core::config::{ArtifactKind, Environment};
use crate::core::error::RailResult;
use std::path::PathBuf;

/// Source-host tokens; either one will do
const HOST_TOKENS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];
const MARKETPLACE_TOKEN: &str = "VSCE_PAT";
const CONTAINER_TOKEN: &str = "CONTAINER_REGISTRY_TOKEN";

pub struct CredentialsCheck;

impl Check for CredentialsCheck {
  fn name(&self) -> &str {
    "credentials"
  }

  fn description(&self) -> &str {
    "Tokens for every registry this release touches are present"
  }

  fn run(&self, ctx: &CheckContext<'_>) -> RailResult<CheckResult> {
    if ctx.dry_run {
      return Ok(CheckResult::pass(self.name(), "Skipped (dry run publishes nothing)"));
    }

    let missing = missing_credentials(ctx);
    if missing.is_empty() {
      return Ok(CheckResult::pass(self.name(), "All required credentials present"));
    }

    Ok(CheckResult::error(
      self.name(),
      format!("Missing credentials: {}", missing.join(", ")),
      Some("Export the listed variables (CI secrets) and re-run"),
    ))
  }
}

/// Human-readable names of every missing credential
fn missing_credentials(ctx: &CheckContext<'_>) -> Vec<String> {
  let env = ctx.env;
  let mut missing = Vec::new();

  if ctx.config.has_package
    && let Some(kind) = ctx.config.manifest_kind()
    && !env.has(kind.token_var())
  {
    missing.push(kind.token_var().to_string());
  }

  if ctx.config.has_extension && !env.has(MARKETPLACE_TOKEN) {
    missing.push(MARKETPLACE_TOKEN.to_string());
  }

  if !HOST_TOKENS.iter().any(|k| env.has(k)) {
    missing.push(HOST_TOKENS.join(" or "));
  }

  if ctx.kinds.contains(&ArtifactKind::Container) && !has_container_auth(env) {
    missing.push(format!("{} or docker config.json", CONTAINER_TOKEN));
  }

  missing
}

fn has_container_auth(env: &Environment) -> bool {
  if env.has(CONTAINER_TOKEN) {
    return true;
  }

  let docker_dir = env
    .get("DOCKER_CONFIG")
    .filter(|s| !s.is_empty())
    .map(PathBuf::from)
    .or_else(|| {
      env
        .get("HOME")
        .or_else(|| env.get("USERPROFILE"))
        .map(|home| PathBuf::from(home).join(".docker"))
    });

  docker_dir.is_some_and(|dir| dir.join("config.json").is_file())
}
