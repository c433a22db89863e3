//! Component test and build commands
//!
//! Only the exit status decides; output is captured for the report.

use super::trait_def::{Check, CheckContext, CheckResult};
use crate::core::error::{RailResult, ReleaseError};
use crate::core::exec::CommandSpec;

fn run_component_command(
  name: &str,
  command: &str,
  ctx: &CheckContext<'_>,
  failure: ReleaseError,
) -> RailResult<CheckResult> {
  let spec = CommandSpec::shell(command, ctx.settings.timeouts.command()).current_dir(ctx.config.component_dir(ctx.root));
  let output = ctx.runner.run(&spec)?;

  if output.success() {
    Ok(
      CheckResult::pass(name, format!("`{}` passed in {:.1}s", command, output.duration.as_secs_f64()))
        .with_output(output.combined()),
    )
  } else {
    let status = output
      .status
      .map(|c| c.to_string())
      .unwrap_or_else(|| "signal".to_string());
    Ok(
      CheckResult::error(
        name,
        format!("{} (`{}` exited with {})", failure, command, status),
        Some("Run the command locally to reproduce"),
      )
      .with_output(output.combined()),
    )
  }
}

pub struct TestCommandCheck;

impl Check for TestCommandCheck {
  fn name(&self) -> &str {
    "tests"
  }

  fn description(&self) -> &str {
    "Component test command succeeds"
  }

  fn run(&self, ctx: &CheckContext<'_>) -> RailResult<CheckResult> {
    if ctx.skip_tests {
      return Ok(CheckResult::pass(self.name(), "Skipped (--skip-tests)"));
    }
    let failure = ReleaseError::Test { output: String::new() };
    run_component_command(self.name(), &ctx.config.test_command, ctx, failure)
  }
}

pub struct BuildCommandCheck;

impl Check for BuildCommandCheck {
  fn name(&self) -> &str {
    "build"
  }

  fn description(&self) -> &str {
    "Component build command succeeds"
  }

  fn run(&self, ctx: &CheckContext<'_>) -> RailResult<CheckResult> {
    if ctx.skip_build {
      return Ok(CheckResult::pass(self.name(), "Skipped (--skip-build)"));
    }
    let failure = ReleaseError::Build {
      target: ctx.config.name.clone(),
      output: String::new(),
    };
    run_component_command(self.name(), &ctx.config.build_command, ctx, failure)
  }
}
