//! `shiprail release`: run the pipeline for one or more components

use crate::core::config::ArtifactKind;
use crate::core::context::ReleaseContext;
use crate::core::error::RailResult;
use crate::publish::SystemPublishers;
use crate::release::state::PipelineStep;
use crate::release::version::VersionTarget;
use crate::release::{Mode, Orchestrator, ReleaseOptions, StepObserver};
use crate::ui::progress::StepProgress;
use std::time::Duration;

/// Parsed `release` arguments
pub struct ReleaseArgs {
  pub components: Vec<String>,
  pub target: VersionTarget,
  pub dry_run: bool,
  pub skip_tests: bool,
  pub skip_build: bool,
  pub skip_verify: bool,
  pub only: Vec<ArtifactKind>,
  pub remote: bool,
  pub timeout_secs: Option<u64>,
  pub json: bool,
}

impl ReleaseArgs {
  fn options(&self) -> ReleaseOptions {
    ReleaseOptions {
      components: self.components.clone(),
      target: self.target.clone(),
      dry_run: self.dry_run,
      skip_tests: self.skip_tests,
      skip_build: self.skip_build,
      skip_verify: self.skip_verify,
      only: self.only.clone(),
      mode: if self.remote { Mode::Remote } else { Mode::Local },
      remote_timeout: self.timeout_secs.map(Duration::from_secs),
    }
  }
}

pub fn run_release(ctx: &ReleaseContext, args: ReleaseArgs) -> RailResult<()> {
  let options = args.options();
  let git = ctx.git();
  let publishers = SystemPublishers;

  let steps = match options.mode {
    Mode::Local => PipelineStep::local_pipeline(ctx.settings.tagging.timing).len(),
    Mode::Remote => PipelineStep::remote_pipeline().len(),
  };
  let progress = StepProgress::interactive(steps, args.json);

  if options.dry_run && !args.json {
    println!("🧪 Dry run: nothing will be written, tagged or published\n");
  }

  let mut orchestrator = Orchestrator::new(
    &ctx.root,
    &ctx.settings,
    &ctx.env,
    &git,
    ctx.runner.as_ref(),
    &publishers,
    ctx,
  )
  .with_staging_dir(std::env::temp_dir().join(format!("shiprail-stage-{}", std::process::id())));
  if let Some(progress) = &progress {
    orchestrator = orchestrator.with_observer(progress as &dyn StepObserver);
  }

  let batch = orchestrator.run_batch(&options);

  if args.json {
    println!("{}", batch.to_json()?);
  } else {
    println!("{}", batch.render_text().trim_end());
  }

  batch.into_result()
}
