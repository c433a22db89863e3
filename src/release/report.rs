//! Step-by-step release reports (human and JSON)

use crate::checks::PreflightReport;
use crate::core::error::{RailError, RailResult, ReleaseError};
use crate::release::state::{
  Mode, ReleaseArtifacts, ReleaseState, ReleaseStatus, RollbackReport, StepError, StepResult, StepStatus,
  VerificationResult,
};
use serde::Serialize;
use std::fmt::Write as _;

/// Outcome of one component release attempt
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseReport {
  pub component: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub previous_version: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  pub dry_run: bool,
  pub mode: Mode,
  pub status: ReleaseStatus,
  pub steps: Vec<StepResult>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub preflight: Option<PreflightReport>,
  pub artifacts: ReleaseArtifacts,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub verification: Option<VerificationResult>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub rollback: Option<RollbackReport>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub changelog: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<StepError>,
  /// The proximate error, re-raised by `into_result`
  #[serde(skip)]
  failure: Option<RailError>,
}

impl ReleaseReport {
  pub fn from_state(state: ReleaseState, failure: Option<RailError>) -> Self {
    Self {
      component: state.config.name.clone(),
      previous_version: state.current_version.as_ref().map(ToString::to_string),
      version: state.version.as_ref().map(ToString::to_string),
      dry_run: state.options.dry_run,
      mode: state.options.mode,
      status: state.final_status(),
      error: state.first_error().cloned(),
      steps: state.steps,
      preflight: state.preflight,
      artifacts: state.artifacts,
      verification: state.verification,
      rollback: state.rollback,
      changelog: state.changelog,
      failure,
    }
  }

  /// Report for a component that failed before its pipeline started
  pub fn aborted(component: &str, mode: Mode, dry_run: bool, error: RailError) -> Self {
    Self {
      component: component.to_string(),
      previous_version: None,
      version: None,
      dry_run,
      mode,
      status: ReleaseStatus::Failed,
      steps: Vec::new(),
      preflight: None,
      artifacts: ReleaseArtifacts::default(),
      verification: None,
      rollback: None,
      changelog: None,
      error: Some(StepError::from(&error)),
      failure: Some(error),
    }
  }

  pub fn succeeded(&self) -> bool {
    self.failure.is_none()
  }

  /// Surface the failure once bookkeeping is done
  ///
  /// An incomplete rollback takes precedence, since its manual steps are
  /// what the user must act on.
  pub fn into_result(self) -> RailResult<()> {
    if let Some(rollback) = &self.rollback
      && !rollback.is_complete()
    {
      return Err(
        ReleaseError::Rollback {
          manual_cleanup: rollback.manual_cleanup.clone(),
        }
        .into(),
      );
    }
    match self.failure {
      Some(error) => Err(error),
      None => Ok(()),
    }
  }

  pub fn render_text(&self) -> String {
    let mut out = String::new();

    let _ = write!(out, "📦 {}", self.component);
    match (&self.previous_version, &self.version) {
      (Some(from), Some(to)) => {
        let _ = write!(out, " {} → {}", from, to);
      }
      (None, Some(to)) => {
        let _ = write!(out, " {}", to);
      }
      _ => {}
    }
    if self.dry_run {
      out.push_str(" (dry run)");
    }
    if self.mode == Mode::Remote {
      out.push_str(" [remote]");
    }
    out.push('\n');

    let width = self.steps.iter().map(|s| s.step.len()).max().unwrap_or(0);
    for step in &self.steps {
      let detail = match (&step.error, &step.output) {
        (Some(error), _) => first_line(&error.message).to_string(),
        (None, Some(output)) if step.status == StepStatus::Skipped => output.clone(),
        (None, Some(output)) => first_line(output).to_string(),
        _ => String::new(),
      };
      let _ = writeln!(
        out,
        "  {} {:width$}  {}",
        step.status.icon(),
        step.step,
        detail,
        width = width
      );
    }

    if let Some(preflight) = &self.preflight {
      for check in preflight.checks.iter().filter(|c| !c.passed) {
        let _ = writeln!(out, "     ❌ {}: {}", check.check_name, check.message);
        if let Some(suggestion) = &check.suggestion {
          let _ = writeln!(out, "        💡 {}", suggestion);
        }
      }
    }

    for (kind, record) in &self.artifacts.kinds {
      if let Some(url) = &record.url {
        let marker = if record.published { "🚀" } else { "  " };
        let _ = writeln!(out, "  {} {}: {}", marker, kind, url);
      }
    }
    if let Some(url) = &self.artifacts.release_url {
      let _ = writeln!(out, "  🔖 release: {}", url);
    }

    if let Some(VerificationResult::Checked { checks }) = &self.verification {
      for check in checks.iter().filter(|c| !c.ok) {
        let _ = writeln!(out, "  ⚠️  {}: {}", check.target, check.detail);
      }
    }

    if let Some(rollback) = &self.rollback {
      out.push_str("\n↩️  Rollback\n");
      for action in &rollback.performed {
        let _ = writeln!(out, "  ✅ {}", action);
      }
      for manual in &rollback.manual_cleanup {
        let _ = writeln!(out, "  ❗ {}", manual);
      }
    }

    let _ = writeln!(out, "\nStatus: {}", self.status);
    out
  }
}

fn first_line(text: &str) -> &str {
  text.lines().next().unwrap_or("").trim()
}

/// Outcome of a multi-component run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
  pub reports: Vec<ReleaseReport>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub failed_component: Option<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub not_started: Vec<String>,
}

impl BatchReport {
  pub fn render_text(&self) -> String {
    let mut out = String::new();
    for report in &self.reports {
      out.push_str(&report.render_text());
      out.push('\n');
    }
    if let Some(failed) = &self.failed_component {
      let _ = writeln!(out, "❌ {} failed", failed);
      if !self.not_started.is_empty() {
        let _ = writeln!(out, "⏸️  Not started: {}", self.not_started.join(", "));
      }
    } else if self.reports.len() > 1 {
      let _ = writeln!(out, "✅ {} components released", self.reports.len());
    }
    out
  }

  pub fn to_json(&self) -> RailResult<String> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  /// The failed component's error, if any
  pub fn into_result(self) -> RailResult<()> {
    for report in self.reports {
      report.into_result()?;
    }
    Ok(())
  }
}
