//! Canonical release tag names

use crate::core::config::TagFormat;
use semver::Version;

/// Tag for a component release: `{name}-v{version}` or `v{version}`
pub fn format_tag(format: TagFormat, name: &str, version: &Version) -> String {
  match format {
    TagFormat::PerComponent => format!("{}-v{}", name, version),
    TagFormat::Monorepo => format!("v{}", version),
  }
}

/// Glob matching every tag of a component
pub fn tag_glob(format: TagFormat, name: &str) -> String {
  match format {
    TagFormat::PerComponent => format!("{}-v*", name),
    TagFormat::Monorepo => "v*".to_string(),
  }
}

/// Version encoded in a tag, if the tag belongs to this component
pub fn parse_tag(format: TagFormat, name: &str, tag: &str) -> Option<Version> {
  let rest = match format {
    TagFormat::PerComponent => tag.strip_prefix(name)?.strip_prefix("-v")?,
    TagFormat::Monorepo => tag.strip_prefix('v')?,
  };
  Version::parse(rest).ok()
}

/// Highest tagged version strictly below `below`
///
/// Tags that don't parse are ignored, so `ui-v2` never shadows `ui-v1.4.0`.
pub fn previous_tag(tags: &[String], format: TagFormat, name: &str, below: &Version) -> Option<String> {
  tags
    .iter()
    .filter_map(|tag| parse_tag(format, name, tag).map(|v| (v, tag)))
    .filter(|(v, _)| v < below)
    .max_by(|(a, _), (b, _)| a.cmp(b))
    .map(|(_, tag)| tag.clone())
}

/// Highest tagged version of this component
pub fn latest_tag(tags: &[String], format: TagFormat, name: &str) -> Option<String> {
  tags
    .iter()
    .filter_map(|tag| parse_tag(format, name, tag).map(|v| (v, tag)))
    .max_by(|(a, _), (b, _)| a.cmp(b))
    .map(|(_, tag)| tag.clone())
}
