//! Per-invocation context - build once, pass everywhere
//!
//! ```text
//! main.rs:
//!   ReleaseContext::build() -> &ReleaseContext
//!   |
//!   v
//! commands/release.rs, sync.rs, etc:
//!   fn run_*(ctx: &ReleaseContext, ...)
//! ```

use crate::core::config::{ComponentConfig, ConfigLoader, Environment, TimeoutSection, WorkspaceSettings};
use crate::core::error::RailResult;
use crate::core::exec::{CommandRunner, SystemRunner};
use crate::core::vcs::{GhHost, SourceControl, SystemGit};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared state for one shiprail invocation
#[derive(Clone)]
pub struct ReleaseContext {
  /// Repository root (absolute path)
  pub root: PathBuf,

  /// Workspace settings (shiprail.toml or defaults)
  pub settings: Arc<WorkspaceSettings>,

  /// Environment snapshot taken at startup
  pub env: Arc<Environment>,

  /// Runs every external command
  pub runner: Arc<dyn CommandRunner>,
}

impl ReleaseContext {
  /// Resolve the repository root from `start` and load settings
  pub fn build(start: &Path, env: Environment) -> RailResult<Self> {
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
    let probe = SystemGit::open(Arc::clone(&runner), start, TimeoutSection::default().git())?;
    let root = probe.work_tree().to_path_buf();
    let settings = WorkspaceSettings::load(&root)?;

    tracing::debug!(root = %root.display(), "workspace context ready");

    Ok(Self {
      root,
      settings: Arc::new(settings),
      env: Arc::new(env),
      runner,
    })
  }

  pub fn config_loader(&self) -> ConfigLoader<'_> {
    ConfigLoader::new(&self.root, &self.settings, &self.env)
  }

  /// Load and validate one component's configuration
  pub fn load_component(&self, name: &str) -> RailResult<ComponentConfig> {
    self.config_loader().load(name)
  }

  pub fn git(&self) -> SystemGit {
    SystemGit::new(Arc::clone(&self.runner), self.root.clone(), self.settings.timeouts.git())
  }

  /// Release host client, scoped to the component's repository when configured
  pub fn host(&self, config: &ComponentConfig) -> GhHost {
    GhHost::new(
      Arc::clone(&self.runner),
      self.root.clone(),
      config.repository.as_ref().map(|r| r.slug()),
      self.settings.timeouts.git(),
    )
  }

  pub fn manifest_path(&self) -> PathBuf {
    self.root.join(&self.settings.workspace.manifest)
  }
}
