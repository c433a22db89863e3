//! Per-component advisory lock
//!
//! Two invocations releasing the same component of the same repository
//! would race on tags and the manifest. The lock file lives outside the work
//! tree so it never dirties it.

use crate::core::error::{RailResult, ReleaseError, ResultExt};
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Held for the duration of one component release; removed on drop
#[derive(Debug)]
pub struct ReleaseLock {
  path: PathBuf,
}

impl ReleaseLock {
  /// Lock in the system temp directory
  pub fn acquire(root: &Path, component: &str) -> RailResult<Self> {
    Self::acquire_in(&std::env::temp_dir().join("shiprail-locks"), root, component)
  }

  pub fn acquire_in(lock_dir: &Path, root: &Path, component: &str) -> RailResult<Self> {
    fs::create_dir_all(lock_dir).with_context(|| format!("Failed to create {}", lock_dir.display()))?;
    let path = lock_dir.join(lock_file_name(root, component));

    match OpenOptions::new().write(true).create_new(true).open(&path) {
      Ok(mut file) => {
        let _ = writeln!(
          file,
          "pid={}\nroot={}\nsince={}",
          std::process::id(),
          root.display(),
          chrono::Utc::now().to_rfc3339()
        );
        tracing::debug!(lock = %path.display(), component, "release lock acquired");
        Ok(Self { path })
      }
      Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(
        ReleaseError::Locked {
          component: component.to_string(),
          lock_path: path,
        }
        .into(),
      ),
      Err(e) => Err(e).with_context(|| format!("Failed to create lock {}", path.display())),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Drop for ReleaseLock {
  fn drop(&mut self) {
    if let Err(e) = fs::remove_file(&self.path) {
      tracing::warn!(lock = %self.path.display(), error = %e, "failed to remove release lock");
    }
  }
}

/// `<sha256(root) prefix>-<component>.lock`
fn lock_file_name(root: &Path, component: &str) -> String {
  let digest = format!("{:x}", Sha256::digest(root.to_string_lossy().as_bytes()));
  let component: String = component
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
    .collect();
  format!("{}-{}.lock", &digest[..16], component)
}
