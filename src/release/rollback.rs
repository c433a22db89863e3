//! Reverse the externally visible writes of a failed attempt
//!
//! The undo ledger is replayed newest first. A failing undo never aborts the
//! replay; it becomes a manual-cleanup line with the command to run.

use crate::publish::{PublishContext, PublisherFactory};
use crate::release::git_ops::GitOperations;
use crate::release::state::{RollbackReport, UndoAction};

fn manual_instruction(action: &UndoAction, remote: &str) -> String {
  match action {
    UndoAction::DeleteLocalTag { tag } => format!("git tag -d {}", tag),
    UndoAction::DeleteRemoteTag { remote, tag } => format!("git push {} :refs/tags/{}", remote, tag),
    UndoAction::DeleteRelease { tag } => format!("gh release delete {} --yes (remote {})", tag, remote),
    UndoAction::Unpublish { kind } => format!("remove the published {} by hand", kind),
  }
}

pub fn rollback(
  ledger: &[UndoAction],
  git: &GitOperations<'_>,
  publishers: &dyn PublisherFactory,
  ctx: &PublishContext<'_>,
) -> RollbackReport {
  let mut report = RollbackReport::default();

  for action in ledger.iter().rev() {
    let result = match action {
      UndoAction::DeleteRelease { tag } => git.delete_release(tag),
      UndoAction::DeleteRemoteTag { tag, .. } => git.delete_remote_tag(tag),
      UndoAction::DeleteLocalTag { tag } => git.delete_local_tag(tag),
      UndoAction::Unpublish { kind } => publishers.publisher(*kind).unpublish(ctx),
    };

    match result {
      Ok(()) => {
        tracing::info!(action = %action, "rolled back");
        report.performed.push(action.to_string());
      }
      Err(e) => {
        tracing::warn!(action = %action, error = %e, "rollback step failed");
        report.manual_cleanup.push(format!(
          "{} failed ({}); run: {}",
          action,
          e,
          manual_instruction(action, git.remote())
        ));
      }
    }
  }

  report
}
