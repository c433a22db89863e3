//! Changelog generation from commit history
//!
//! Every commit lands in exactly one category, checked in priority order:
//! breaking, then feature, then fix, then other. Conventional-commit prefixes
//! are recognised but not required; plain subjects are classified by verb.

use crate::core::error::RailResult;
use crate::core::vcs::{CommitInfo, SourceControl};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static BANG_PREFIX: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[A-Za-z]+(\([^)]*\))?!:").expect("regex for bang prefix"));
static FEATURE_PREFIX: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)^(feat|feature)\b").expect("regex for feature prefix"));
static FEATURE_VERB: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\b(add|adds|added|adding|implement|implements|implemented|implementing)\b")
    .expect("regex for feature verbs")
});
static FIX_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^fix\b").expect("regex for fix prefix"));
static FIX_VERB: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\b(fix|fixes|fixed|fixing|resolve|resolves|resolved|resolving)\b").expect("regex for fix verbs")
});

/// Changelog section a commit belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
  Breaking,
  Feature,
  Fix,
  Other,
}

impl Category {
  /// Rendering order
  pub const ORDER: [Category; 4] = [Category::Breaking, Category::Feature, Category::Fix, Category::Other];

  pub fn heading(&self) -> &'static str {
    match self {
      Category::Breaking => "⚠️ Breaking Changes",
      Category::Feature => "Features",
      Category::Fix => "Bug Fixes",
      Category::Other => "Other Changes",
    }
  }
}

fn is_breaking_marker(text: &str) -> bool {
  text.contains("BREAKING CHANGE") || text.contains("BREAKING-CHANGE")
}

/// Classify one commit
pub fn classify(commit: &CommitInfo) -> Category {
  let subject = commit.subject.trim();

  if is_breaking_marker(subject) || is_breaking_marker(&commit.body) || BANG_PREFIX.is_match(subject) {
    Category::Breaking
  } else if FEATURE_PREFIX.is_match(subject) || FEATURE_VERB.is_match(subject) {
    Category::Feature
  } else if FIX_PREFIX.is_match(subject) || FIX_VERB.is_match(subject) {
    Category::Fix
  } else {
    Category::Other
  }
}

/// Commits grouped into four disjoint categories
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changelog {
  pub breaking: Vec<CommitInfo>,
  pub features: Vec<CommitInfo>,
  pub fixes: Vec<CommitInfo>,
  pub other: Vec<CommitInfo>,
}

impl Changelog {
  /// Partition commits, keeping input order within each category
  pub fn from_commits(commits: Vec<CommitInfo>) -> Self {
    let mut changelog = Self::default();
    for commit in commits {
      match classify(&commit) {
        Category::Breaking => changelog.breaking.push(commit),
        Category::Feature => changelog.features.push(commit),
        Category::Fix => changelog.fixes.push(commit),
        Category::Other => changelog.other.push(commit),
      }
    }
    changelog
  }

  pub fn section(&self, category: Category) -> &[CommitInfo] {
    match category {
      Category::Breaking => &self.breaking,
      Category::Feature => &self.features,
      Category::Fix => &self.fixes,
      Category::Other => &self.other,
    }
  }

  pub fn len(&self) -> usize {
    self.breaking.len() + self.features.len() + self.fixes.len() + self.other.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Collect and classify the commits strictly between two refs
///
/// With `from` absent, all history reachable from `to` is included. `path`
/// restricts the history to one component's directory.
pub fn generate(scm: &dyn SourceControl, from: Option<&str>, to: &str, path: Option<&Path>) -> RailResult<Changelog> {
  let commits = scm.commits_between(from, to, path)?;
  tracing::debug!(from = from.unwrap_or("<root>"), to, commits = commits.len(), "changelog range");
  Ok(Changelog::from_commits(commits))
}

/// Where commit and PR links point
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoLinks {
  /// `https://host/owner/repo`, when resolvable
  pub base: Option<String>,
}

impl RepoLinks {
  pub fn new(base: Option<String>) -> Self {
    Self {
      base: base.map(|b| b.trim_end_matches('/').to_string()),
    }
  }

  fn pr(&self, number: u64) -> String {
    match &self.base {
      Some(base) => format!("[#{}]({}/pull/{})", number, base, number),
      None => format!("#{}", number),
    }
  }

  fn commit(&self, commit: &CommitInfo) -> String {
    match &self.base {
      Some(base) => format!("[{}]({}/commit/{})", commit.short_hash(), base, commit.hash),
      None => format!("[{}]", commit.short_hash()),
    }
  }
}

/// Render as Markdown sections (breaking, features, fixes, other), skipping empty ones
pub fn format(changelog: &Changelog, links: &RepoLinks) -> String {
  let mut output = String::new();

  for category in Category::ORDER {
    let commits = changelog.section(category);
    if commits.is_empty() {
      continue;
    }

    output.push_str(&format!("### {}\n\n", category.heading()));
    for commit in commits {
      output.push_str(&format!("- {}", commit.subject.trim()));
      if let Some(pr) = commit.pr {
        output.push_str(&format!(" ({})", links.pr(pr)));
      }
      output.push_str(&format!(" ({})\n", links.commit(commit)));
    }
    output.push('\n');
  }

  output
}

/// Body of the remote release
///
/// Without a template the changelog is used as-is.
pub fn release_notes(template: Option<&str>, name: &str, version: &str, tag: &str, changelog: &str) -> String {
  let changelog = if changelog.trim().is_empty() {
    "No notable changes."
  } else {
    changelog.trim_end()
  };

  match template {
    Some(template) => template
      .replace("{name}", name)
      .replace("{version}", version)
      .replace("{tag}", tag)
      .replace("{changelog}", changelog),
    None => format!("## {} {}\n\n{}\n", name, version, changelog),
  }
}
