//! Step progress bars for interactive release runs
//!
//! One `linya` bar per component, advanced each time a step reaches a
//! terminal status. Drawn on stderr so stdout stays clean for reports.

use crate::release::StepObserver;
use crate::release::state::{StepResult, StepStatus};
use linya::{Bar, Progress};
use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::sync::Mutex;

struct Bars {
  progress: Progress,
  bars: BTreeMap<String, Bar>,
}

/// Progress observer for the orchestrator
pub struct StepProgress {
  steps_per_component: usize,
  inner: Mutex<Bars>,
}

impl StepProgress {
  pub fn new(steps_per_component: usize) -> Self {
    Self {
      steps_per_component,
      inner: Mutex::new(Bars {
        progress: Progress::new(),
        bars: BTreeMap::new(),
      }),
    }
  }

  /// Only when stderr is a terminal and output is not machine-readable
  pub fn interactive(steps_per_component: usize, json: bool) -> Option<Self> {
    (!json && std::io::stderr().is_terminal()).then(|| Self::new(steps_per_component))
  }
}

impl StepObserver for StepProgress {
  fn step_changed(&self, component: &str, result: &StepResult) {
    let Ok(mut inner) = self.inner.lock() else {
      return;
    };
    let Bars { progress, bars } = &mut *inner;

    let bar = bars
      .entry(component.to_string())
      .or_insert_with(|| progress.bar(self.steps_per_component, format!("📦 {}", component)));

    if matches!(result.status, StepStatus::Success | StepStatus::Failed | StepStatus::Skipped) {
      progress.inc_and_draw(bar, 1);
    }
  }
}
