//! `shiprail changelog`: preview the notes for the next release

use crate::core::context::ReleaseContext;
use crate::core::error::RailResult;
use crate::core::vcs::SourceControl;
use crate::release::changelog::{self, RepoLinks};
use crate::release::tags;
use crate::utils;
use std::path::Path;

/// Print the changelog between two refs
///
/// `from` defaults to the component's latest release tag (or the first
/// commit when there is none); `to` defaults to HEAD.
pub fn run_changelog(ctx: &ReleaseContext, component: &str, from: Option<String>, to: Option<String>) -> RailResult<()> {
  let config = ctx.load_component(component)?;
  let git = ctx.git();
  let format = ctx.settings.tagging.format;

  let from = match from {
    Some(from) => Some(from),
    None => {
      let existing = git.list_tags(&tags::tag_glob(format, &config.name))?;
      tags::latest_tag(&existing, format, &config.name)
    }
  };
  let to = to.unwrap_or_else(|| "HEAD".to_string());

  let path_filter =
    (!config.path.as_os_str().is_empty() && config.path != Path::new(".")).then_some(config.path.as_path());
  let log = changelog::generate(&git, from.as_deref(), &to, path_filter)?;

  let base = match &config.repository {
    Some(repository) => Some(repository.web_url()),
    None => git
      .remote_url(&ctx.settings.workspace.git_remote)?
      .and_then(|url| utils::repo_web_url(&url)),
  };

  eprintln!(
    "📝 {}: {} commit(s) from {} to {}",
    config.display_name(),
    log.len(),
    from.as_deref().unwrap_or("the first commit"),
    to
  );

  if log.is_empty() {
    println!("No changes.");
  } else {
    print!("{}", changelog::format(&log, &RepoLinks::new(base)));
  }
  Ok(())
}
