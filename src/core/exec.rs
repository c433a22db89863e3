//! External command execution with a uniform timeout
//!
//! Every collaborator (git, gh, npm, cargo, docker, vsce, build/test
//! commands) goes through [`CommandRunner`], so tests can substitute a fake
//! and no process can block the pipeline forever.

use crate::core::error::{CommandError, RailResult};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// Bytes of output kept per stream
const MAX_OUTPUT_BYTES: usize = 256 * 1024;

/// Interval between child status polls
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Minimum wait for pipes to close after the child exits
const PIPE_GRACE: Duration = Duration::from_millis(250);

const READ_CHUNK: usize = 8 * 1024;

/// A fully described external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
  pub program: String,
  pub args: Vec<String>,
  pub cwd: Option<PathBuf>,
  pub env: Vec<(String, String)>,
  /// Start from an empty environment (PATH and HOME are kept)
  pub isolated_env: bool,
  pub timeout: Duration,
}

impl CommandSpec {
  pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
      env: Vec::new(),
      isolated_env: false,
      timeout,
    }
  }

  /// Run a command line through the platform shell
  pub fn shell(command_line: &str, timeout: Duration) -> Self {
    if cfg!(windows) {
      Self::new("cmd", timeout).args(["/C", command_line])
    } else {
      Self::new("sh", timeout).args(["-c", command_line])
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
    self.cwd = Some(dir.as_ref().to_path_buf());
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.push((key.into(), value.into()));
    self
  }

  pub fn isolated(mut self) -> Self {
    self.isolated_env = true;
    self
  }

  /// Command line as shown in logs and errors
  pub fn display(&self) -> String {
    if self.args.is_empty() {
      self.program.clone()
    } else {
      format!("{} {}", self.program, self.args.join(" "))
    }
  }
}

/// Captured result of an external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
  pub status: Option<i32>,
  pub stdout: String,
  pub stderr: String,
  pub duration: Duration,
}

impl CommandOutput {
  pub fn success(&self) -> bool {
    self.status == Some(0)
  }

  /// stdout and stderr joined, the way a terminal would show them
  pub fn combined(&self) -> String {
    match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
      (true, true) => String::new(),
      (false, true) => self.stdout.trim_end().to_string(),
      (true, false) => self.stderr.trim_end().to_string(),
      (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
    }
  }
}

/// The single seam for running external commands
pub trait CommandRunner: Send + Sync {
  /// Run to completion or until the spec's timeout elapses
  ///
  /// A non-zero exit status is not an error; callers inspect
  /// [`CommandOutput::success`]. Spawn failures and timeouts are errors.
  fn run(&self, spec: &CommandSpec) -> RailResult<CommandOutput>;
}

/// Runs commands as real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
  fn run(&self, spec: &CommandSpec) -> RailResult<CommandOutput> {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

    if let Some(cwd) = &spec.cwd {
      cmd.current_dir(cwd);
    }

    if spec.isolated_env {
      cmd.env_clear();
      for key in ["PATH", "HOME"] {
        if let Ok(value) = std::env::var(key) {
          cmd.env(key, value);
        }
      }
    }
    for (key, value) in &spec.env {
      cmd.env(key, value);
    }

    tracing::debug!(command = %spec.display(), timeout_secs = spec.timeout.as_secs(), "running");

    let start = Instant::now();
    let mut child = cmd.spawn().map_err(|e| CommandError::Spawn {
      command: spec.display(),
      message: e.to_string(),
    })?;

    // Drain pipes on their own threads so a chatty child can't fill the
    // pipe buffer and stall before we notice it exited.
    let stdout_reader = child.stdout.take().map(spawn_reader);
    let stderr_reader = child.stderr.take().map(spawn_reader);

    let status = loop {
      if let Some(status) = child.try_wait()? {
        break Some(status);
      }
      if start.elapsed() > spec.timeout {
        let _ = child.kill();
        let _ = child.wait();
        break None;
      }
      thread::sleep(POLL_INTERVAL);
    };

    // On timeout the readers are detached: grandchildren of a killed shell
    // may still hold the pipes open.
    let Some(status) = status else {
      tracing::warn!(command = %spec.display(), "timed out");
      return Err(
        CommandError::TimedOut {
          command: spec.display(),
          timeout: spec.timeout,
        }
        .into(),
      );
    };

    // A background process started by the command can inherit the pipes and
    // keep them open; stop collecting at the deadline.
    let deadline = (start + spec.timeout).max(Instant::now() + PIPE_GRACE);
    let (stdout, stdout_closed) = collect_output(stdout_reader, deadline);
    let (stderr, stderr_closed) = collect_output(stderr_reader, deadline);
    if !(stdout_closed && stderr_closed) {
      tracing::warn!(command = %spec.display(), "output pipes still open after exit, output may be incomplete");
    }

    Ok(CommandOutput {
      status: status.code(),
      stdout,
      stderr,
      duration: start.elapsed(),
    })
  }
}

/// Forward up to `MAX_OUTPUT_BYTES` in chunks, then keep draining so the
/// child never blocks on a full pipe
fn spawn_reader<R: Read + Send + 'static>(mut stream: R) -> Receiver<Vec<u8>> {
  let (tx, rx) = mpsc::channel();
  thread::spawn(move || {
    let mut chunk = [0u8; READ_CHUNK];
    let mut forwarded = 0;
    loop {
      let n = match stream.read(&mut chunk) {
        Ok(0) => break,
        Ok(n) => n,
        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
        Err(_) => break,
      };
      let keep = n.min(MAX_OUTPUT_BYTES - forwarded);
      if keep > 0 {
        forwarded += keep;
        if tx.send(chunk[..keep].to_vec()).is_err() {
          break;
        }
      }
    }
  });
  rx
}

/// Output received before the stream closed or `deadline` passed; the flag
/// is false when the deadline cut it short
fn collect_output(reader: Option<Receiver<Vec<u8>>>, deadline: Instant) -> (String, bool) {
  let Some(rx) = reader else {
    return (String::new(), true);
  };

  let mut bytes = Vec::new();
  let closed = loop {
    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
      Ok(chunk) => bytes.extend_from_slice(&chunk),
      Err(RecvTimeoutError::Disconnected) => break true,
      Err(RecvTimeoutError::Timeout) => break false,
    }
  };
  (String::from_utf8_lossy(&bytes).into_owned(), closed)
}


#[cfg(all(test, unix))]
mod tests {
  use super::*;

  #[test]
  fn test_captures_exit_status_and_output() {
    let spec = CommandSpec::shell("echo out; echo err 1>&2; exit 3", Duration::from_secs(10));
    let output = SystemRunner.run(&spec).unwrap();
    assert_eq!(output.status, Some(3));
    assert!(!output.success());
    assert_eq!(output.stdout.trim(), "out");
    assert_eq!(output.stderr.trim(), "err");
    assert_eq!(output.combined(), "out\nerr");
  }

  #[test]
  fn test_timeout_kills_child() {
    let spec = CommandSpec::shell("sleep 5", Duration::from_millis(200));
    let start = Instant::now();
    let err = SystemRunner.run(&spec).unwrap_err();
    assert!(start.elapsed() < Duration::from_secs(4));
    assert!(matches!(
      err,
      crate::core::error::RailError::Command(CommandError::TimedOut { .. })
    ));
  }

  #[test]
  fn test_background_process_holding_pipes_does_not_block() {
    let spec = CommandSpec::shell("sleep 6 & echo started", Duration::from_secs(1));
    let start = Instant::now();
    let output = SystemRunner.run(&spec).unwrap();
    assert!(start.elapsed() < Duration::from_secs(4), "took {:?}", start.elapsed());
    assert_eq!(output.status, Some(0));
    assert_eq!(output.stdout.trim(), "started");
  }

  #[test]
  fn test_output_is_capped_per_stream() {
    let spec = CommandSpec::shell("head -c 400000 /dev/zero | tr '\\0' a", Duration::from_secs(10));
    let output = SystemRunner.run(&spec).unwrap();
    assert!(output.success());
    assert_eq!(output.stdout.len(), MAX_OUTPUT_BYTES);
    assert!(output.stdout.bytes().all(|b| b == b'a'));
  }

  #[test]
  fn test_spawn_failure_is_error() {
    let spec = CommandSpec::new("definitely-not-a-real-binary-xyz", Duration::from_secs(1));
    let err = SystemRunner.run(&spec).unwrap_err();
    assert!(matches!(
      err,
      crate::core::error::RailError::Command(CommandError::Spawn { .. })
    ));
  }

  #[test]
  fn test_runs_in_working_directory() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "x").unwrap();
    let spec = CommandSpec::shell("ls", Duration::from_secs(5)).current_dir(dir.path());
    let output = SystemRunner.run(&spec).unwrap();
    assert!(output.stdout.contains("marker.txt"));
  }
}
