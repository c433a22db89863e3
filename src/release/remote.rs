//! Remote mode: dispatch the release workflow and watch it
//!
//! Monitoring is a plain bounded loop: poll, stop on a terminal state, stop
//! on cancellation, stop on timeout, sleep with doubling backoff. A timeout
//! only stops the local wait; the remote run keeps going.

use crate::core::error::{RailResult, ReleaseError};
use crate::core::vcs::GhHost;
use crate::core::vcs::github::WorkflowRun;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Slice used while sleeping so cancellation is noticed promptly
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// CI workflow operations
pub trait WorkflowClient: Send + Sync {
  fn trigger(&self, workflow: &str, git_ref: &str, inputs: &[(String, String)]) -> RailResult<()>;

  /// Most recent run of `workflow` on `branch`, if any
  fn latest_run(&self, workflow: &str, branch: &str) -> RailResult<Option<WorkflowRun>>;

  fn run_status(&self, run_id: u64) -> RailResult<WorkflowRun>;
}

impl WorkflowClient for GhHost {
  fn trigger(&self, workflow: &str, git_ref: &str, inputs: &[(String, String)]) -> RailResult<()> {
    self.trigger_workflow(workflow, git_ref, inputs)
  }

  fn latest_run(&self, workflow: &str, branch: &str) -> RailResult<Option<WorkflowRun>> {
    GhHost::latest_run(self, workflow, branch)
  }

  fn run_status(&self, run_id: u64) -> RailResult<WorkflowRun> {
    GhHost::run_status(self, run_id)
  }
}

/// Shared flag a caller sets to stop monitoring
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.0.store(true, Ordering::SeqCst);
  }

  pub fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::SeqCst)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
  pub timeout: Duration,
  pub initial_interval: Duration,
  pub max_interval: Duration,
}

impl PollSettings {
  fn next_interval(&self, current: Duration) -> Duration {
    (current * 2).min(self.max_interval)
  }
}

/// Sleep up to `duration`, returning early if cancelled
fn sleep_unless_cancelled(duration: Duration, cancel: &CancellationToken) {
  let deadline = Instant::now() + duration;
  while !cancel.is_cancelled() {
    let now = Instant::now();
    if now >= deadline {
      break;
    }
    std::thread::sleep(SLEEP_SLICE.min(deadline - now));
  }
}

/// Generic bounded poll: `probe` returns Some when done
fn poll_until<T>(
  what: &str,
  settings: &PollSettings,
  cancel: &CancellationToken,
  mut probe: impl FnMut() -> RailResult<Option<T>>,
) -> RailResult<T> {
  let started = Instant::now();
  let mut interval = settings.initial_interval;

  loop {
    if cancel.is_cancelled() {
      return Err(ReleaseError::Cancelled { what: what.to_string() }.into());
    }
    if let Some(done) = probe()? {
      return Ok(done);
    }

    let elapsed = started.elapsed();
    if elapsed >= settings.timeout {
      return Err(
        ReleaseError::Timeout {
          what: what.to_string(),
          after: settings.timeout,
        }
        .into(),
      );
    }

    sleep_unless_cancelled(interval.min(settings.timeout - elapsed), cancel);
    interval = settings.next_interval(interval);
  }
}

/// Dispatch the workflow and wait for its new run to show up
///
/// The run listed before dispatch is remembered so a stale run is never
/// mistaken for ours.
pub fn trigger(
  client: &dyn WorkflowClient,
  workflow: &str,
  branch: &str,
  inputs: &[(String, String)],
  settings: &PollSettings,
  cancel: &CancellationToken,
) -> RailResult<WorkflowRun> {
  let previous = client.latest_run(workflow, branch)?.map(|r| r.id);
  client.trigger(workflow, branch, inputs)?;
  tracing::info!(workflow, branch, "workflow dispatched");

  poll_until("the workflow run to start", settings, cancel, || {
    Ok(
      client
        .latest_run(workflow, branch)?
        .filter(|run| Some(run.id) != previous),
    )
  })
}

/// Watch a run until it completes; a non-success conclusion is an error
pub fn monitor(
  client: &dyn WorkflowClient,
  run_id: u64,
  settings: &PollSettings,
  cancel: &CancellationToken,
) -> RailResult<WorkflowRun> {
  let what = format!("workflow run {}", run_id);
  let run = poll_until(&what, settings, cancel, || {
    let run = client.run_status(run_id)?;
    tracing::debug!(run = run.id, status = %run.status, "workflow status");
    Ok(run.is_complete().then_some(run))
  })?;

  if run.succeeded() {
    tracing::info!(run = run.id, url = %run.url, "workflow succeeded");
    Ok(run)
  } else {
    Err(
      ReleaseError::Workflow {
        run: if run.url.is_empty() { run.id.to_string() } else { run.url.clone() },
        conclusion: run.conclusion.clone(),
      }
      .into(),
    )
  }
}


#[cfg(test)]
mod tests {
  use super::fake::{FakeWorkflow, run};
  use super::*;
  use crate::core::error::{ErrorKind, RailError};

  fn fast() -> PollSettings {
    PollSettings {
      timeout: Duration::from_secs(5),
      initial_interval: Duration::from_millis(1),
      max_interval: Duration::from_millis(4),
    }
  }

  #[test]
  fn test_backoff_doubles_and_caps() {
    let settings = PollSettings {
      timeout: Duration::from_secs(60),
      initial_interval: Duration::from_secs(10),
      max_interval: Duration::from_secs(30),
    };
    assert_eq!(settings.next_interval(Duration::from_secs(10)), Duration::from_secs(20));
    assert_eq!(settings.next_interval(Duration::from_secs(20)), Duration::from_secs(30));
    assert_eq!(settings.next_interval(Duration::from_secs(30)), Duration::from_secs(30));
  }

  #[test]
  fn test_trigger_ignores_stale_run() {
    let client = FakeWorkflow::new(vec![run(42, "queued", "")]);
    *client.previous.lock().unwrap() = Some(run(41, "completed", "success"));
    let inputs = vec![("component".to_string(), "screenshot".to_string())];

    let found = trigger(&client, "release.yml", "main", &inputs, &fast(), &CancellationToken::new()).unwrap();
    assert_eq!(found.id, 42);
    let triggered = client.triggered.lock().unwrap();
    assert_eq!(triggered[0].0, "release.yml");
    assert_eq!(triggered[0].2, inputs);
  }

  #[test]
  fn test_monitor_until_success() {
    let client = FakeWorkflow::new(vec![
      run(42, "queued", ""),
      run(42, "in_progress", ""),
      run(42, "completed", "success"),
    ]);
    let done = monitor(&client, 42, &fast(), &CancellationToken::new()).unwrap();
    assert!(done.succeeded());
    assert_eq!(*client.polls.lock().unwrap(), 3);
  }

  #[test]
  fn test_monitor_reports_failed_conclusion() {
    let client = FakeWorkflow::new(vec![run(7, "completed", "failure")]);
    let err = monitor(&client, 7, &fast(), &CancellationToken::new()).unwrap_err();
    assert!(matches!(
      err,
      RailError::Release(ReleaseError::Workflow { ref conclusion, .. }) if conclusion == "failure"
    ));
  }

  #[test]
  fn test_monitor_times_out() {
    let client = FakeWorkflow::new(vec![run(7, "in_progress", "")]);
    let settings = PollSettings {
      timeout: Duration::from_millis(20),
      initial_interval: Duration::from_millis(5),
      max_interval: Duration::from_millis(5),
    };
    let err = monitor(&client, 7, &settings, &CancellationToken::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
  }

  #[test]
  fn test_cancelled_before_first_poll() {
    let client = FakeWorkflow::new(vec![run(7, "in_progress", "")]);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = monitor(&client, 7, &fast(), &cancel).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(*client.polls.lock().unwrap(), 0);
  }
}
