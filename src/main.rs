mod checks;
mod commands;
mod core;
mod publish;
mod release;
mod ui;
mod utils;

use clap::{Parser, Subcommand};
use core::config::{ArtifactKind, Environment};
use core::error::{RailError, print_error};
use release::version::{BumpKind, VersionTarget};
use tracing_subscriber::EnvFilter;

/// Release independently versioned components from a monorepo
#[derive(Parser)]
#[command(name = "shiprail")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct Cli {
  /// Show debug logs on stderr
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  // ============================================================================
  // Releasing
  // ============================================================================
  /// Release one or more components (stops at the first failure)
  Release {
    /// Components to release, in order
    #[arg(required = true)]
    components: Vec<String>,
    /// Version bump: patch, minor or major
    #[arg(long, default_value = "patch", conflicts_with = "version")]
    bump: BumpKind,
    /// Exact version to release
    #[arg(long)]
    version: Option<String>,
    /// Run every step without writing, tagging or publishing
    #[arg(long)]
    dry_run: bool,
    /// Skip the test command in pre-flight
    #[arg(long)]
    skip_tests: bool,
    /// Skip the build command and artifact builds
    #[arg(long)]
    skip_build: bool,
    /// Skip post-publish registry verification
    #[arg(long)]
    skip_verify: bool,
    /// Only publish these artifact kinds (comma separated)
    #[arg(long, value_delimiter = ',')]
    only: Vec<ArtifactKind>,
    /// Trigger the release workflow in CI instead of releasing locally
    #[arg(long)]
    remote: bool,
    /// Seconds to wait for the remote workflow
    #[arg(long, requires = "remote")]
    timeout: Option<u64>,
    /// Output the report in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Check that a released version is visible in every registry
  Verify {
    component: String,
    version: String,
  },

  // ============================================================================
  // Inspection & maintenance
  // ============================================================================
  /// Rewrite version strings per the component's versionSync rules
  Sync {
    component: String,
    version: String,
    /// Only check; fail if any file does not carry the version
    #[arg(long)]
    check: bool,
  },

  /// Preview the changelog for the next release
  Changelog {
    component: String,
    /// Start ref (default: latest release tag)
    #[arg(long)]
    from: Option<String>,
    /// End ref (default: HEAD)
    #[arg(long)]
    to: Option<String>,
  },

  /// Show a component's resolved configuration
  Config {
    component: String,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },

  /// List recorded release attempts
  History {
    /// Only this component
    component: Option<String>,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// `SHIPRAIL_LOG`, then `RUST_LOG`, then `warn`; `-v` forces debug
fn init_tracing(verbose: bool) {
  let filter = if verbose {
    EnvFilter::new("shiprail=debug")
  } else {
    EnvFilter::try_from_env("SHIPRAIL_LOG")
      .or_else(|_| EnvFilter::try_from_default_env())
      .unwrap_or_else(|_| EnvFilter::new("warn"))
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let start = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => {
      eprintln!("Error: Failed to get current directory: {}", e);
      std::process::exit(2);
    }
  };

  let ctx = match core::context::ReleaseContext::build(&start, Environment::capture()) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let result = match cli.command {
    Commands::Release {
      components,
      bump,
      version,
      dry_run,
      skip_tests,
      skip_build,
      skip_verify,
      only,
      remote,
      timeout,
      json,
    } => {
      let target = match version.as_deref().map(commands::sync::parse_version).transpose() {
        Ok(Some(exact)) => VersionTarget::Exact(exact),
        Ok(None) => VersionTarget::Bump(bump),
        Err(e) => handle_error(e),
      };
      commands::run_release(
        &ctx,
        commands::ReleaseArgs {
          components,
          target,
          dry_run,
          skip_tests,
          skip_build,
          skip_verify,
          only,
          remote,
          timeout_secs: timeout,
          json,
        },
      )
    }
    Commands::Verify { component, version } => commands::run_verify(&ctx, &component, &version),
    Commands::Sync {
      component,
      version,
      check,
    } => commands::run_sync(&ctx, &component, &version, check),
    Commands::Changelog { component, from, to } => commands::run_changelog(&ctx, &component, from, to),
    Commands::Config { component, json } => commands::run_config(&ctx, &component, json),
    Commands::History { component, json } => commands::run_history(&ctx, component, json),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: RailError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
