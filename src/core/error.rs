//! Error types for shiprail with contextual messages and exit codes
//!
//! One unified error type categorizes every failure the release pipeline can
//! hit. Each category maps to an exit code and, where we can say something
//! useful, a help message that tells the user how to recover.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Exit codes for shiprail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing files)
  User = 1,
  /// System error (git, external commands, I/O)
  System = 2,
  /// Validation failure (preflight, version verification)
  Validation = 3,
  /// A release attempt failed (build, publish, rollback)
  Release = 4,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for shiprail
#[derive(Debug)]
pub enum RailError {
  /// Configuration errors
  Config(ConfigError),

  /// Git and release-host errors
  Git(GitError),

  /// External command errors (spawn, timeout)
  Command(CommandError),

  /// Release pipeline errors
  Release(ReleaseError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl RailError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    RailError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    RailError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      RailError::Message { message, context, help } => RailError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      RailError::Io(e) => RailError::Message {
        message: format!("I/O error: {}", e),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      RailError::Config(_) => ExitCode::User,
      RailError::Git(_) => ExitCode::System,
      RailError::Command(_) => ExitCode::System,
      RailError::Release(e) => match e {
        ReleaseError::Preflight { .. } | ReleaseError::VersionMismatch { .. } => ExitCode::Validation,
        _ => ExitCode::Release,
      },
      RailError::Io(_) => ExitCode::System,
      RailError::Message { .. } => ExitCode::User,
    }
  }

  /// Category of this error as recorded in step results and the manifest
  pub fn kind(&self) -> ErrorKind {
    match self {
      RailError::Config(_) => ErrorKind::Config,
      RailError::Git(_) => ErrorKind::Git,
      RailError::Command(CommandError::TimedOut { .. }) => ErrorKind::Timeout,
      RailError::Command(_) => ErrorKind::Command,
      RailError::Release(e) => e.kind(),
      RailError::Io(_) => ErrorKind::Io,
      RailError::Message { .. } => ErrorKind::Other,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      RailError::Config(e) => e.help_message(),
      RailError::Git(e) => e.help_message(),
      RailError::Command(e) => e.help_message(),
      RailError::Release(e) => e.help_message(),
      RailError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for RailError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RailError::Config(e) => write!(f, "{}", e),
      RailError::Git(e) => write!(f, "{}", e),
      RailError::Command(e) => write!(f, "{}", e),
      RailError::Release(e) => write!(f, "{}", e),
      RailError::Io(e) => write!(f, "I/O error: {}", e),
      RailError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for RailError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      RailError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for RailError {
  fn from(err: io::Error) -> Self {
    RailError::Io(err)
  }
}

impl From<String> for RailError {
  fn from(msg: String) -> Self {
    RailError::message(msg)
  }
}

impl From<&str> for RailError {
  fn from(msg: &str) -> Self {
    RailError::message(msg)
  }
}

impl From<ConfigError> for RailError {
  fn from(err: ConfigError) -> Self {
    RailError::Config(err)
  }
}

impl From<GitError> for RailError {
  fn from(err: GitError) -> Self {
    RailError::Git(err)
  }
}

impl From<CommandError> for RailError {
  fn from(err: CommandError) -> Self {
    RailError::Command(err)
  }
}

impl From<ReleaseError> for RailError {
  fn from(err: ReleaseError) -> Self {
    RailError::Release(err)
  }
}

impl From<toml_edit::TomlError> for RailError {
  fn from(err: toml_edit::TomlError) -> Self {
    RailError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for RailError {
  fn from(err: toml_edit::de::Error) -> Self {
    RailError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for RailError {
  fn from(err: serde_json::Error) -> Self {
    RailError::message(format!("JSON error: {}", err))
  }
}

impl From<semver::Error> for RailError {
  fn from(err: semver::Error) -> Self {
    RailError::message(format!("Invalid semantic version: {}", err))
  }
}

impl From<regex::Error> for RailError {
  fn from(err: regex::Error) -> Self {
    RailError::message(format!("Invalid pattern: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for RailError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    RailError::message(format!("UTF-8 conversion error: {}", err))
  }
}

/// Error category, serialized into step results and manifest records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
  Config,
  Preflight,
  Build,
  Test,
  Publish,
  Verification,
  Rollback,
  Git,
  Command,
  Timeout,
  Cancelled,
  Io,
  Other,
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ErrorKind::Config => "ConfigError",
      ErrorKind::Preflight => "PreflightError",
      ErrorKind::Build => "BuildError",
      ErrorKind::Test => "TestError",
      ErrorKind::Publish => "PublishError",
      ErrorKind::Verification => "VerificationError",
      ErrorKind::Rollback => "RollbackError",
      ErrorKind::Git => "GitError",
      ErrorKind::Command => "CommandError",
      ErrorKind::Timeout => "TimeoutError",
      ErrorKind::Cancelled => "Cancelled",
      ErrorKind::Io => "IoError",
      ErrorKind::Other => "Error",
    };
    write!(f, "{}", name)
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// No config file and no default applies
  NotFound { component: String, searched: Vec<PathBuf> },

  /// Config file exists but could not be parsed
  Parse { path: PathBuf, message: String },

  /// Every validation problem found in one pass
  Validation { component: String, problems: Vec<String> },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { component, .. } => Some(format!(
        "Create .shiprail/components/{}.json or add the component directory under the packages directory.",
        component
      )),
      ConfigError::Validation { .. } => Some("Fix every listed problem, then re-run.".to_string()),
      ConfigError::Parse { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { component, searched } => {
        write!(f, "No release configuration for component '{}'", component)?;
        for path in searched {
          write!(f, "\n  looked in: {}", path.display())?;
        }
        Ok(())
      }
      ConfigError::Parse { path, message } => {
        write!(f, "Failed to parse {}: {}", path.display(), message)
      }
      ConfigError::Validation { component, problems } => {
        write!(
          f,
          "Invalid configuration for '{}' ({} problem(s)):",
          component,
          problems.len()
        )?;
        for problem in problems {
          write!(f, "\n  - {}", problem)?;
        }
        Ok(())
      }
    }
  }
}

/// Git and release-host errors
///
/// The variants are distinct because rollback and retry decisions depend on
/// knowing exactly which primitive failed.
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// Nothing staged for the release commit
  NothingToCommit,

  /// Tag already exists locally or remotely
  TagExists { tag: String },

  /// Push rejected by the remote
  PushRejected {
    remote: String,
    refspec: String,
    reason: String,
  },

  /// Release host (gh) operation failed
  HostFailed { operation: String, stderr: String },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::PushRejected { reason, .. } => {
        if reason.contains("non-fast-forward") || reason.contains("fetch first") {
          Some("The remote has commits you don't have. Pull, then re-run the release.".to_string())
        } else if reason.contains("permission denied") || reason.contains("403") {
          Some("Check that GITHUB_TOKEN (or your SSH key) has push access to the repository.".to_string())
        } else {
          None
        }
      }
      GitError::TagExists { tag } => Some(format!(
        "Version already released? Inspect `git show {}` or bump to a new version.",
        tag
      )),
      GitError::RepoNotFound { path } => Some(format!(
        "Run shiprail from inside the monorepo or check the path: {}",
        path.display()
      )),
      GitError::HostFailed { .. } => Some("Check `gh auth status` and the repository coordinates.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
      GitError::NothingToCommit => write!(f, "No changes to commit"),
      GitError::TagExists { tag } => write!(f, "Tag already exists: {}", tag),
      GitError::PushRejected { remote, refspec, reason } => {
        write!(f, "Push of {} to {} rejected: {}", refspec, remote, reason)
      }
      GitError::HostFailed { operation, stderr } => {
        write!(f, "Release host operation '{}' failed: {}", operation, stderr)
      }
    }
  }
}

/// External command errors
#[derive(Debug)]
pub enum CommandError {
  /// Process could not be started
  Spawn { command: String, message: String },

  /// Process exceeded its timeout and was killed
  TimedOut { command: String, timeout: Duration },
}

impl CommandError {
  fn help_message(&self) -> Option<String> {
    match self {
      CommandError::Spawn { command, .. } => Some(format!(
        "Is `{}` installed and on PATH?",
        command.split_whitespace().next().unwrap_or(command)
      )),
      CommandError::TimedOut { .. } => Some("Raise the timeout in shiprail.toml under [timeouts].".to_string()),
    }
  }
}

impl fmt::Display for CommandError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CommandError::Spawn { command, message } => {
        write!(f, "Failed to run `{}`: {}", command, message)
      }
      CommandError::TimedOut { command, timeout } => {
        write!(f, "`{}` timed out after {}s", command, timeout.as_secs())
      }
    }
  }
}

/// Release pipeline errors
#[derive(Debug)]
pub enum ReleaseError {
  /// One or more pre-flight checks failed
  Preflight { failed: Vec<String> },

  /// Build command or artifact build failed
  Build { target: String, output: String },

  /// Test command failed
  Test { output: String },

  /// Version files do not carry the expected version
  VersionMismatch { version: String, problems: Vec<String> },

  /// Publishing an artifact failed
  Publish { artifact: String, message: String },

  /// Published artifacts could not be confirmed
  Verification { failures: Vec<String> },

  /// Undo actions that could not be completed automatically
  Rollback { manual_cleanup: Vec<String> },

  /// Remote workflow did not reach a terminal state in time
  Timeout { what: String, after: Duration },

  /// Monitoring was cancelled by the caller
  Cancelled { what: String },

  /// Remote workflow finished unsuccessfully
  Workflow { run: String, conclusion: String },

  /// Another invocation holds the component lock
  Locked { component: String, lock_path: PathBuf },
}

impl ReleaseError {
  /// Category used in step results
  pub fn kind(&self) -> ErrorKind {
    match self {
      ReleaseError::Preflight { .. } => ErrorKind::Preflight,
      ReleaseError::Build { .. } => ErrorKind::Build,
      ReleaseError::Test { .. } => ErrorKind::Test,
      ReleaseError::VersionMismatch { .. } => ErrorKind::Preflight,
      ReleaseError::Publish { .. } => ErrorKind::Publish,
      ReleaseError::Verification { .. } => ErrorKind::Verification,
      ReleaseError::Rollback { .. } => ErrorKind::Rollback,
      ReleaseError::Timeout { .. } => ErrorKind::Timeout,
      ReleaseError::Cancelled { .. } => ErrorKind::Cancelled,
      ReleaseError::Workflow { .. } => ErrorKind::Other,
      ReleaseError::Locked { .. } => ErrorKind::Other,
    }
  }

  fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::Preflight { .. } => Some("Fix the failed checks above; nothing has been changed yet.".to_string()),
      ReleaseError::VersionMismatch { .. } => {
        Some("Check the versionSync rules in the component configuration.".to_string())
      }
      ReleaseError::Verification { .. } => Some(
        "Artifacts stay published. Registries can lag; re-check with `shiprail verify <component> <version>`."
          .to_string(),
      ),
      ReleaseError::Rollback { .. } => Some("Complete the manual cleanup steps listed above.".to_string()),
      ReleaseError::Timeout { .. } => {
        Some("The remote workflow keeps running; follow it with `gh run watch`.".to_string())
      }
      ReleaseError::Locked { lock_path, .. } => Some(format!(
        "If no other release is running, remove the stale lock: {}",
        lock_path.display()
      )),
      _ => None,
    }
  }
}

impl fmt::Display for ReleaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseError::Preflight { failed } => {
        write!(f, "Pre-flight checks failed: {}", failed.join(", "))
      }
      ReleaseError::Build { target, output } => {
        write!(f, "Build failed for {}", target)?;
        if !output.is_empty() {
          write!(f, "\n{}", output)?;
        }
        Ok(())
      }
      ReleaseError::Test { output } => {
        write!(f, "Tests failed")?;
        if !output.is_empty() {
          write!(f, "\n{}", output)?;
        }
        Ok(())
      }
      ReleaseError::VersionMismatch { version, problems } => {
        write!(f, "Version files do not carry {}", version)?;
        for problem in problems {
          write!(f, "\n  - {}", problem)?;
        }
        Ok(())
      }
      ReleaseError::Publish { artifact, message } => {
        write!(f, "Publishing {} failed: {}", artifact, message)
      }
      ReleaseError::Verification { failures } => {
        write!(f, "Verification failed: {}", failures.join("; "))
      }
      ReleaseError::Rollback { manual_cleanup } => {
        write!(f, "Rollback incomplete, manual cleanup required:")?;
        for step in manual_cleanup {
          write!(f, "\n  - {}", step)?;
        }
        Ok(())
      }
      ReleaseError::Timeout { what, after } => {
        write!(f, "Timed out after {}s waiting for {}", after.as_secs(), what)
      }
      ReleaseError::Cancelled { what } => write!(f, "Cancelled while waiting for {}", what),
      ReleaseError::Workflow { run, conclusion } => {
        write!(f, "Remote workflow run {} finished with '{}'", run, conclusion)
      }
      ReleaseError::Locked { component, .. } => {
        write!(f, "Another release of '{}' is in progress", component)
      }
    }
  }
}

/// Result type alias for shiprail
pub type RailResult<T> = Result<T, RailError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> RailResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> RailResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<RailError>,
{
  fn context(self, ctx: impl Into<String>) -> RailResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> RailResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &RailError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
