//! `shiprail config`: show a component's resolved configuration

use crate::core::config::override_key;
use crate::core::context::ReleaseContext;
use crate::core::error::RailResult;

pub fn run_config(ctx: &ReleaseContext, component: &str, json: bool) -> RailResult<()> {
  let loader = ctx.config_loader();
  let config = loader.load(component)?;

  if json {
    println!("{}", serde_json::to_string_pretty(&config)?);
    return Ok(());
  }

  let path = loader.config_path(component);
  let source = if path.exists() {
    path.strip_prefix(&ctx.root).unwrap_or(&path).display().to_string()
  } else {
    "defaults (no config file)".to_string()
  };

  println!("📦 {}", config.display_name());
  println!("  source:    {}", source);
  println!("  path:      {}", config.path.display());
  println!("  manifest:  {}", config.manifest_rel_path().display());
  println!("  package:   {}", config.package_name());
  println!("  build:     {}", config.build_command);
  println!("  test:      {}", config.test_command);

  let kinds: Vec<String> = config.artifact_kinds().iter().map(ToString::to_string).collect();
  println!(
    "  artifacts: {}",
    if kinds.is_empty() { "none".to_string() } else { kinds.join(", ") }
  );
  if let Some(image) = &config.container_image {
    println!("  image:     {}", image);
  }
  if let Some(id) = &config.extension_id {
    println!("  extension: {}", id);
  }
  if !config.platforms.is_empty() {
    println!("  platforms: {}", config.platforms.join(", "));
  }

  if !config.version_sync.is_empty() {
    println!("  versionSync:");
    for rule in &config.version_sync {
      let flag = if rule.required { "" } else { " (optional)" };
      println!("    {}  `{}`{}", rule.file.display(), rule.pattern, flag);
    }
  }

  println!(
    "\n💡 Override fields with {}",
    override_key(&ctx.settings.workspace.env_prefix, &config.name, "<FIELD>")
  );
  Ok(())
}
