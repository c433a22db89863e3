//! Utility functions for remotes and paths

use std::path::Path;

/// Check if a remote is a local filesystem path (not a URL)
///
/// Returns true for absolute Unix and Windows paths, UNC paths and
/// `./` or `../` relative paths. Returns false for SSH and HTTPS URLs.
pub fn is_local_path(path: &str) -> bool {
  if path.starts_with("./") || path.starts_with("../") {
    return true;
  }

  // Windows drive letter (C:\ or C:/), checked before the URL heuristics
  if path.len() >= 3 {
    let bytes = path.as_bytes();
    if bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && (bytes[2] == b'\\' || bytes[2] == b'/') {
      return true;
    }
  }

  if path.starts_with("\\\\") {
    return true;
  }

  if path.starts_with('/') && !path.contains("://") && !path.contains('@') {
    return true;
  }

  if Path::new(path).is_absolute() {
    return true;
  }

  false
}

/// Browser URL of a repository given its git remote URL
///
/// - `git@host:owner/repo.git` becomes `https://host/owner/repo`
/// - `ssh://git@host:22/owner/repo.git` becomes `https://host/owner/repo`
/// - `https://user@host/owner/repo.git` becomes `https://host/owner/repo`
///
/// Local paths and anything unrecognised yield None.
pub fn repo_web_url(remote: &str) -> Option<String> {
  let remote = remote.trim();
  if remote.is_empty() || is_local_path(remote) || remote.starts_with("file://") {
    return None;
  }

  let (host, path) = if let Some(rest) = remote
    .strip_prefix("https://")
    .or_else(|| remote.strip_prefix("http://"))
    .or_else(|| remote.strip_prefix("ssh://"))
    .or_else(|| remote.strip_prefix("git://"))
  {
    let (authority, path) = rest.split_once('/')?;
    let host = authority.rsplit('@').next()?;
    let host = host.split(':').next()?;
    (host.to_string(), path.to_string())
  } else if let Some((user_host, path)) = remote.split_once(':') {
    // scp-like syntax: [user@]host:owner/repo
    let host = user_host.rsplit('@').next()?;
    (host.to_string(), path.to_string())
  } else {
    return None;
  };

  let path = path.trim_matches('/').trim_end_matches(".git");
  if host.is_empty() || path.is_empty() || !path.contains('/') {
    return None;
  }

  Some(format!("https://{}/{}", host, path))
}

/// Convert a path to Git format (always forward slashes)
pub fn path_to_git_format(path: &Path) -> String {
  #[cfg(target_os = "windows")]
  {
    path.to_string_lossy().replace('\\', "/")
  }
  #[cfg(not(target_os = "windows"))]
  {
    path.to_string_lossy().to_string()
  }
}
