//! Workspace settings and per-component release configuration
//!
//! Two layers:
//! - `shiprail.toml` (optional) holds workspace-wide settings: where component
//!   configs live, the manifest path, tagging, timeouts.
//! - `<components_dir>/<name>.json` describes one component's release shape.
//!   Components without a file get a default synthesized from their manifest.
//!
//! Environment overrides (`<PREFIX>_<COMPONENT>_<FIELD>`) are read from an
//! explicit [`Environment`] snapshot taken once in `main`.

use crate::core::error::{ConfigError, RailResult, ResultExt};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Snapshot of environment variables, captured once per invocation
#[derive(Debug, Clone, Default)]
pub struct Environment {
  vars: BTreeMap<String, String>,
}

impl Environment {
  /// Capture the process environment
  pub fn capture() -> Self {
    Self::from_pairs(std::env::vars())
  }

  pub fn from_pairs<I, K, V>(pairs: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    Self {
      vars: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
    }
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.vars.get(key).map(String::as_str)
  }

  /// Whether a variable is set to a non-blank value
  pub fn has(&self, key: &str) -> bool {
    self.get(key).is_some_and(|v| !v.trim().is_empty())
  }
}

// ============================================================================
// Workspace settings (shiprail.toml)
// ============================================================================

/// Workspace-wide settings
/// Searched in order: shiprail.toml, .shiprail.toml, .shiprail/config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceSettings {
  #[serde(default)]
  pub workspace: WorkspaceSection,
  #[serde(default)]
  pub tagging: TaggingSection,
  #[serde(default)]
  pub timeouts: TimeoutSection,
  #[serde(default)]
  pub remote: RemoteSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSection {
  /// Directory holding `<component>.json` files
  #[serde(default = "default_components_dir")]
  pub components_dir: PathBuf,

  /// Directory where components live by convention
  #[serde(default = "default_packages_dir")]
  pub packages_dir: PathBuf,

  /// Append-only release manifest
  #[serde(default = "default_manifest")]
  pub manifest: PathBuf,

  /// Prefix for `<PREFIX>_<COMPONENT>_<FIELD>` overrides
  #[serde(default = "default_env_prefix")]
  pub env_prefix: String,

  /// Remote that receives the release commit and tag
  #[serde(default = "default_git_remote")]
  pub git_remote: String,

  /// Branches a release may be cut from
  #[serde(default = "default_release_branches")]
  pub release_branches: Vec<String>,
}

fn default_components_dir() -> PathBuf {
  PathBuf::from(".shiprail/components")
}

fn default_packages_dir() -> PathBuf {
  PathBuf::from("packages")
}

fn default_manifest() -> PathBuf {
  PathBuf::from(".shiprail/releases.json")
}

fn default_env_prefix() -> String {
  "SHIPRAIL".to_string()
}

fn default_git_remote() -> String {
  "origin".to_string()
}

fn default_release_branches() -> Vec<String> {
  vec!["main".to_string(), "master".to_string()]
}

impl Default for WorkspaceSection {
  fn default() -> Self {
    Self {
      components_dir: default_components_dir(),
      packages_dir: default_packages_dir(),
      manifest: default_manifest(),
      env_prefix: default_env_prefix(),
      git_remote: default_git_remote(),
      release_branches: default_release_branches(),
    }
  }
}

/// How release tags are named
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagFormat {
  /// `{component}-v{version}`
  #[default]
  PerComponent,
  /// `v{version}` for repositories released as one unit
  Monorepo,
}

/// Where the tag-and-release step sits relative to publishing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagTiming {
  /// Publish artifacts first, then tag and create the remote release
  #[default]
  AfterPublish,
  /// Tag and create the remote release, then publish into it
  BeforePublish,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaggingSection {
  #[serde(default)]
  pub format: TagFormat,
  #[serde(default)]
  pub timing: TagTiming,
}

/// Timeouts in seconds; every external call is bounded by one of these
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutSection {
  /// Build, test and publish commands
  #[serde(default = "default_command_secs")]
  pub command_secs: u64,
  /// git and gh operations
  #[serde(default = "default_git_secs")]
  pub git_secs: u64,
  /// Each registry verification probe
  #[serde(default = "default_verify_secs")]
  pub verify_secs: u64,
  /// Waiting for a remote workflow run
  #[serde(default = "default_workflow_secs")]
  pub workflow_secs: u64,
  #[serde(default = "default_poll_interval_secs")]
  pub poll_interval_secs: u64,
  #[serde(default = "default_max_poll_interval_secs")]
  pub max_poll_interval_secs: u64,
}

fn default_command_secs() -> u64 {
  900
}

fn default_git_secs() -> u64 {
  120
}

fn default_verify_secs() -> u64 {
  60
}

fn default_workflow_secs() -> u64 {
  3600
}

fn default_poll_interval_secs() -> u64 {
  10
}

fn default_max_poll_interval_secs() -> u64 {
  60
}

impl Default for TimeoutSection {
  fn default() -> Self {
    Self {
      command_secs: default_command_secs(),
      git_secs: default_git_secs(),
      verify_secs: default_verify_secs(),
      workflow_secs: default_workflow_secs(),
      poll_interval_secs: default_poll_interval_secs(),
      max_poll_interval_secs: default_max_poll_interval_secs(),
    }
  }
}

impl TimeoutSection {
  pub fn command(&self) -> Duration {
    Duration::from_secs(self.command_secs)
  }

  pub fn git(&self) -> Duration {
    Duration::from_secs(self.git_secs)
  }

  pub fn verify(&self) -> Duration {
    Duration::from_secs(self.verify_secs)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSection {
  /// Workflow file triggered in remote mode
  #[serde(default = "default_workflow")]
  pub workflow: String,
}

fn default_workflow() -> String {
  "release.yml".to_string()
}

impl Default for RemoteSection {
  fn default() -> Self {
    Self {
      workflow: default_workflow(),
    }
  }
}

impl WorkspaceSettings {
  /// Find settings file in search order
  pub fn find_config_path(root: &Path) -> Option<PathBuf> {
    let candidates = [
      root.join("shiprail.toml"),
      root.join(".shiprail.toml"),
      root.join(".shiprail").join("config.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load settings; a missing file means all defaults
  pub fn load(root: &Path) -> RailResult<Self> {
    let Some(path) = Self::find_config_path(root) else {
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    toml_edit::de::from_str(&content).map_err(|e| {
      ConfigError::Parse {
        path: path.clone(),
        message: e.to_string(),
      }
      .into()
    })
  }
}

// ============================================================================
// Component configuration (<components_dir>/<name>.json)
// ============================================================================

/// Kinds of artifact a component can publish
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
  /// Package registry (npm or crates.io)
  Package,
  /// Container image registry
  Container,
  /// Editor marketplace extension
  Extension,
  /// Standalone binaries attached to the remote release
  Binaries,
}

impl ArtifactKind {
  pub const ALL: [ArtifactKind; 4] = [
    ArtifactKind::Package,
    ArtifactKind::Container,
    ArtifactKind::Extension,
    ArtifactKind::Binaries,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      ArtifactKind::Package => "package",
      ArtifactKind::Container => "container",
      ArtifactKind::Extension => "extension",
      ArtifactKind::Binaries => "binaries",
    }
  }
}

impl fmt::Display for ArtifactKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for ArtifactKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "package" | "pkg" => Ok(ArtifactKind::Package),
      "container" | "image" | "docker" => Ok(ArtifactKind::Container),
      "extension" | "marketplace" => Ok(ArtifactKind::Extension),
      "binaries" | "binary" | "bin" => Ok(ArtifactKind::Binaries),
      other => Err(format!("unknown artifact kind '{}'", other)),
    }
  }
}

/// Which package ecosystem a manifest belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestKind {
  /// `package.json`
  Npm,
  /// `Cargo.toml`
  Cargo,
}

impl ManifestKind {
  pub fn from_path(path: &Path) -> Option<Self> {
    match path.file_name()?.to_str()? {
      "package.json" => Some(ManifestKind::Npm),
      "Cargo.toml" => Some(ManifestKind::Cargo),
      _ => None,
    }
  }

  pub fn file_name(&self) -> &'static str {
    match self {
      ManifestKind::Npm => "package.json",
      ManifestKind::Cargo => "Cargo.toml",
    }
  }

  /// Credential the registry expects
  pub fn token_var(&self) -> &'static str {
    match self {
      ManifestKind::Npm => "NPM_TOKEN",
      ManifestKind::Cargo => "CARGO_REGISTRY_TOKEN",
    }
  }
}

/// Repository coordinates on the release host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryConfig {
  pub owner: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
}

impl RepositoryConfig {
  /// `owner/name`, as the gh CLI expects it
  pub fn slug(&self) -> String {
    format!("{}/{}", self.owner, self.name)
  }

  pub fn web_url(&self) -> String {
    self
      .url
      .as_deref()
      .map(|u| u.trim_end_matches(".git").trim_end_matches('/').to_string())
      .unwrap_or_else(|| format!("https://github.com/{}", self.slug()))
  }
}

/// One file that must carry the release version
///
/// `pattern` is a regular expression; every match is replaced by
/// `replacement` with `{version}` substituted. The replacement is literal:
/// `$` has no capture-group meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSyncRule {
  /// Path relative to the repository root
  #[serde(default)]
  pub file: PathBuf,
  #[serde(default)]
  pub pattern: String,
  #[serde(default)]
  pub replacement: String,
  /// Missing required files fail the sync; optional ones are skipped
  #[serde(default = "default_true")]
  pub required: bool,
  /// Replace only the first match (for manifests with nested version keys)
  #[serde(default)]
  pub first_only: bool,
}

fn default_true() -> bool {
  true
}

/// Placeholder substituted into sync replacements
pub const VERSION_PLACEHOLDER: &str = "{version}";

impl VersionSyncRule {
  pub fn new(file: impl Into<PathBuf>, pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
    Self {
      file: file.into(),
      pattern: pattern.into(),
      replacement: replacement.into(),
      required: true,
      first_only: false,
    }
  }

  /// Exact text this rule must leave in the file
  pub fn expected(&self, version: &str) -> String {
    self.replacement.replace(VERSION_PLACEHOLDER, version)
  }

  pub fn regex(&self) -> RailResult<Regex> {
    Regex::new(&self.pattern).with_context(|| format!("Invalid pattern for {}", self.file.display()))
  }

  /// Problems with this rule, prefixed for the validation report
  fn problems(&self, index: usize) -> Vec<String> {
    let label = if self.file.as_os_str().is_empty() {
      format!("versionSync[{}]", index)
    } else {
      format!("versionSync[{}] ({})", index, self.file.display())
    };

    let mut problems = Vec::new();
    if self.file.as_os_str().is_empty() {
      problems.push(format!("{}: file is empty", label));
    }
    if self.pattern.trim().is_empty() {
      problems.push(format!("{}: pattern is empty", label));
    } else if let Err(e) = Regex::new(&self.pattern) {
      problems.push(format!("{}: pattern does not compile: {}", label, e));
    }
    if self.replacement.trim().is_empty() {
      problems.push(format!("{}: replacement is empty", label));
    } else if !self.replacement.contains(VERSION_PLACEHOLDER) {
      problems.push(format!("{}: replacement has no {} placeholder", label, VERSION_PLACEHOLDER));
    }
    problems
  }
}

/// Release shape of one component
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentConfig {
  #[serde(default)]
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub display_name: Option<String>,
  /// Component directory relative to the repository root
  #[serde(default)]
  pub path: PathBuf,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub package_name: Option<String>,
  /// Manifest carrying the version, relative to `path`
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub manifest_file: Option<PathBuf>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub repository: Option<RepositoryConfig>,

  #[serde(default)]
  pub has_package: bool,
  #[serde(default)]
  pub has_container: bool,
  #[serde(default)]
  pub has_extension: bool,
  #[serde(default)]
  pub has_binaries: bool,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub container_image: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub extension_id: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub platforms: Vec<String>,
  /// Builds one platform binary; `{platform}` is substituted
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub binary_build_command: Option<String>,
  /// Where the built binary lands, relative to `path`; `{name}` and `{platform}` are substituted
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub binary_output: Option<String>,

  #[serde(default)]
  pub build_command: String,
  #[serde(default)]
  pub test_command: String,
  #[serde(default)]
  pub version_sync: Vec<VersionSyncRule>,
  /// Body of the remote release; `{name}`, `{version}`, `{tag}`, `{changelog}` are substituted
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub release_notes_template: Option<String>,
}

impl ComponentConfig {
  pub fn display_name(&self) -> &str {
    self.display_name.as_deref().unwrap_or(&self.name)
  }

  /// Registry name of the package (defaults to the component name)
  pub fn package_name(&self) -> &str {
    self.package_name.as_deref().unwrap_or(&self.name)
  }

  pub fn component_dir(&self, root: &Path) -> PathBuf {
    root.join(&self.path)
  }

  /// Manifest path relative to the repository root
  pub fn manifest_rel_path(&self) -> PathBuf {
    let file = self
      .manifest_file
      .clone()
      .unwrap_or_else(|| PathBuf::from(ManifestKind::Npm.file_name()));
    self.path.join(file)
  }

  pub fn manifest_kind(&self) -> Option<ManifestKind> {
    ManifestKind::from_path(&self.manifest_rel_path())
  }

  /// Whether this component publishes the given kind
  pub fn has(&self, kind: ArtifactKind) -> bool {
    match kind {
      ArtifactKind::Package => self.has_package,
      ArtifactKind::Container => self.has_container,
      ArtifactKind::Extension => self.has_extension,
      ArtifactKind::Binaries => self.has_binaries,
    }
  }

  pub fn artifact_kinds(&self) -> Vec<ArtifactKind> {
    ArtifactKind::ALL.into_iter().filter(|k| self.has(*k)).collect()
  }

  /// Check every field, collecting all problems instead of stopping at the first
  pub fn validate(&self) -> Result<(), ConfigError> {
    let mut problems = Vec::new();

    if self.name.trim().is_empty() {
      problems.push("name is empty".to_string());
    }
    if self.path.as_os_str().is_empty() {
      problems.push("path is empty".to_string());
    }
    if self.build_command.trim().is_empty() {
      problems.push("buildCommand is empty".to_string());
    }
    if self.test_command.trim().is_empty() {
      problems.push("testCommand is empty".to_string());
    }
    if self.has_package && self.manifest_kind().is_none() {
      problems.push(format!(
        "hasPackage is set but {} is not a package.json or Cargo.toml",
        self.manifest_rel_path().display()
      ));
    }
    if self.has_binaries && self.platforms.is_empty() {
      problems.push("hasBinaries is set but platforms is empty".to_string());
    }
    if self.has_container && self.container_image.as_deref().is_none_or(|s| s.trim().is_empty()) {
      problems.push("hasContainer is set but containerImage is missing".to_string());
    }
    if self.has_extension && self.extension_id.as_deref().is_none_or(|s| s.trim().is_empty()) {
      problems.push("hasExtension is set but extensionId is missing".to_string());
    }
    for (index, rule) in self.version_sync.iter().enumerate() {
      problems.extend(rule.problems(index));
    }

    if problems.is_empty() {
      Ok(())
    } else {
      Err(ConfigError::Validation {
        component: self.name.clone(),
        problems,
      })
    }
  }
}

/// Fields that can be overridden from the environment
const OVERRIDE_FIELDS: [&str; 7] = [
  "BUILD_COMMAND",
  "TEST_COMMAND",
  "PACKAGE_NAME",
  "CONTAINER_IMAGE",
  "EXTENSION_ID",
  "HAS_BINARIES",
  "PLATFORMS",
];

/// Environment key for a component field override
pub fn override_key(prefix: &str, component: &str, field: &str) -> String {
  let component: String = component
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
    .collect();
  format!("{}_{}_{}", prefix, component.trim_matches('_'), field)
}

/// Loads component configuration: file, default, overrides, validation
pub struct ConfigLoader<'a> {
  root: &'a Path,
  settings: &'a WorkspaceSettings,
  env: &'a Environment,
}

impl<'a> ConfigLoader<'a> {
  pub fn new(root: &'a Path, settings: &'a WorkspaceSettings, env: &'a Environment) -> Self {
    Self { root, settings, env }
  }

  /// Path of the explicit config file for a component
  pub fn config_path(&self, name: &str) -> PathBuf {
    self
      .root
      .join(&self.settings.workspace.components_dir)
      .join(format!("{}.json", name))
  }

  /// Load a component's configuration
  ///
  /// Fails with `NotFound` only if there is no file and no default applies.
  pub fn load(&self, name: &str) -> RailResult<ComponentConfig> {
    let path = self.config_path(name);

    let mut config = if path.exists() {
      self.read_file(&path, name)?
    } else {
      match self.default_for(name) {
        Some(config) => {
          tracing::debug!(component = name, "no config file, using defaults");
          config
        }
        None => {
          let mut searched = vec![path];
          searched.extend(self.candidate_dirs(name));
          return Err(
            ConfigError::NotFound {
              component: name.to_string(),
              searched,
            }
            .into(),
          );
        }
      }
    };

    let mut problems = self.apply_overrides(&mut config);

    if let Err(ConfigError::Validation { problems: found, .. }) = config.validate() {
      problems.extend(found);
    }
    if !config.path.as_os_str().is_empty() && !config.component_dir(self.root).is_dir() {
      problems.push(format!("path {} does not exist", config.path.display()));
    }

    if !problems.is_empty() {
      return Err(
        ConfigError::Validation {
          component: config.name.clone(),
          problems,
        }
        .into(),
      );
    }

    Ok(config)
  }

  fn read_file(&self, path: &Path, name: &str) -> RailResult<ComponentConfig> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut config: ComponentConfig = serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
      path: path.to_path_buf(),
      message: e.to_string(),
    })?;

    if config.name.trim().is_empty() {
      config.name = name.to_string();
    }
    if config.manifest_file.is_none() {
      config.manifest_file = detect_manifest(&self.root.join(&config.path)).map(|k| PathBuf::from(k.file_name()));
    }
    Ok(config)
  }

  fn candidate_dirs(&self, name: &str) -> Vec<PathBuf> {
    vec![self.settings.workspace.packages_dir.join(name), PathBuf::from(name)]
  }

  /// Synthesize a configuration from naming conventions
  ///
  /// Applies when `<packages_dir>/<name>` or `<name>` exists and carries a
  /// recognised manifest.
  pub fn default_for(&self, name: &str) -> Option<ComponentConfig> {
    let rel_path = self
      .candidate_dirs(name)
      .into_iter()
      .find(|dir| self.root.join(dir).is_dir())?;
    let kind = detect_manifest(&self.root.join(&rel_path))?;
    let manifest = rel_path.join(kind.file_name());

    let (build, test, rule) = match kind {
      ManifestKind::Npm => (
        "npm run build",
        "npm test",
        VersionSyncRule {
          first_only: true,
          ..VersionSyncRule::new(&manifest, r#""version"\s*:\s*"[^"]*""#, r#""version": "{version}""#)
        },
      ),
      ManifestKind::Cargo => (
        "cargo build --release",
        "cargo test",
        VersionSyncRule {
          first_only: true,
          ..VersionSyncRule::new(&manifest, r#"(?m)^version\s*=\s*"[^"]*""#, r#"version = "{version}""#)
        },
      ),
    };

    let package_name = read_package_name(&self.root.join(&manifest), kind).filter(|n| n != name);

    Some(ComponentConfig {
      name: name.to_string(),
      display_name: None,
      path: rel_path,
      package_name,
      manifest_file: Some(PathBuf::from(kind.file_name())),
      repository: None,
      has_package: true,
      has_container: false,
      has_extension: false,
      has_binaries: false,
      container_image: None,
      extension_id: None,
      platforms: Vec::new(),
      binary_build_command: None,
      binary_output: None,
      build_command: build.to_string(),
      test_command: test.to_string(),
      version_sync: vec![rule],
      release_notes_template: None,
    })
  }

  /// Apply `<PREFIX>_<COMPONENT>_<FIELD>` overrides; returns malformed values
  fn apply_overrides(&self, config: &mut ComponentConfig) -> Vec<String> {
    let prefix = &self.settings.workspace.env_prefix;
    let mut problems = Vec::new();

    for field in OVERRIDE_FIELDS {
      let key = override_key(prefix, &config.name, field);
      let Some(value) = self.env.get(&key) else {
        continue;
      };
      tracing::debug!(key = %key, "applying override");

      match field {
        "BUILD_COMMAND" => config.build_command = value.to_string(),
        "TEST_COMMAND" => config.test_command = value.to_string(),
        "PACKAGE_NAME" => config.package_name = Some(value.to_string()),
        "CONTAINER_IMAGE" => config.container_image = Some(value.to_string()),
        "EXTENSION_ID" => config.extension_id = Some(value.to_string()),
        "HAS_BINARIES" => match parse_bool(value) {
          Some(flag) => config.has_binaries = flag,
          None => problems.push(format!("{} must be true or false, got '{}'", key, value)),
        },
        "PLATFORMS" => {
          config.platforms = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        }
        _ => {}
      }
    }

    problems
  }
}

fn detect_manifest(dir: &Path) -> Option<ManifestKind> {
  [ManifestKind::Npm, ManifestKind::Cargo]
    .into_iter()
    .find(|kind| dir.join(kind.file_name()).is_file())
}

fn read_package_name(manifest: &Path, kind: ManifestKind) -> Option<String> {
  let content = fs::read_to_string(manifest).ok()?;
  match kind {
    ManifestKind::Npm => {
      let value: serde_json::Value = serde_json::from_str(&content).ok()?;
      value.get("name")?.as_str().map(String::from)
    }
    ManifestKind::Cargo => {
      let doc: toml_edit::DocumentMut = content.parse().ok()?;
      doc.get("package")?.get("name")?.as_str().map(String::from)
    }
  }
}

fn parse_bool(value: &str) -> Option<bool> {
  match value.trim().to_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Some(true),
    "0" | "false" | "no" | "off" => Some(false),
    _ => None,
  }
}
