//! Recording publishers for pipeline tests

use super::{PublishContext, PublishOutcome, Publisher, PublisherFactory, VerifyOutcome};
use crate::core::config::ArtifactKind;
use crate::core::error::{RailResult, ReleaseError};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Script {
  fail_build: BTreeSet<ArtifactKind>,
  fail_publish: BTreeSet<ArtifactKind>,
  fail_verify: BTreeSet<ArtifactKind>,
  fail_unpublish: BTreeSet<ArtifactKind>,
  calls: Vec<String>,
}

/// One shared script for every kind, so tests can assert call order across publishers
#[derive(Clone, Default)]
pub struct FakePublishers {
  script: Arc<Mutex<Script>>,
  publishers: Arc<Mutex<BTreeMap<ArtifactKind, Arc<FakePublisher>>>>,
}

impl FakePublishers {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn fail_build(&self, kind: ArtifactKind) {
    self.script.lock().unwrap().fail_build.insert(kind);
  }

  pub fn fail_publish(&self, kind: ArtifactKind) {
    self.script.lock().unwrap().fail_publish.insert(kind);
  }

  pub fn fail_verify(&self, kind: ArtifactKind) {
    self.script.lock().unwrap().fail_verify.insert(kind);
  }

  pub fn fail_unpublish(&self, kind: ArtifactKind) {
    self.script.lock().unwrap().fail_unpublish.insert(kind);
  }

  /// `"<op> <kind>"` entries, dry-run publishes recorded as `"simulate <kind>"`
  pub fn calls(&self) -> Vec<String> {
    self.script.lock().unwrap().calls.clone()
  }
}

impl PublisherFactory for FakePublishers {
  fn publisher(&self, kind: ArtifactKind) -> Arc<dyn Publisher> {
    let mut publishers = self.publishers.lock().unwrap();
    publishers
      .entry(kind)
      .or_insert_with(|| {
        Arc::new(FakePublisher {
          kind,
          script: Arc::clone(&self.script),
        })
      })
      .clone()
  }
}

pub struct FakePublisher {
  kind: ArtifactKind,
  script: Arc<Mutex<Script>>,
}

impl FakePublisher {
  fn record(&self, op: &str) {
    self.script.lock().unwrap().calls.push(format!("{} {}", op, self.kind));
  }

  fn fails(&self, pick: impl Fn(&Script) -> &BTreeSet<ArtifactKind>) -> bool {
    pick(&self.script.lock().unwrap()).contains(&self.kind)
  }
}

impl Publisher for FakePublisher {
  fn kind(&self) -> ArtifactKind {
    self.kind
  }

  fn build(&self, _ctx: &PublishContext<'_>) -> RailResult<String> {
    self.record("build");
    if self.fails(|s| &s.fail_build) {
      return Err(
        ReleaseError::Build {
          target: self.kind.to_string(),
          output: "scripted build failure".to_string(),
        }
        .into(),
      );
    }
    Ok(String::new())
  }

  fn publish(&self, ctx: &PublishContext<'_>) -> RailResult<PublishOutcome> {
    if ctx.dry_run {
      self.record("simulate");
      return Ok(PublishOutcome::simulated("simulated"));
    }
    self.record("publish");
    if self.fails(|s| &s.fail_publish) {
      return Err(
        ReleaseError::Publish {
          artifact: self.kind.to_string(),
          message: "registry rejected the upload".to_string(),
        }
        .into(),
      );
    }
    Ok(PublishOutcome {
      published: self.kind != ArtifactKind::Binaries,
      url: Some(format!("https://registry.test/{}/{}", ctx.config.name, ctx.version)),
      ..Default::default()
    })
  }

  fn verify(&self, ctx: &PublishContext<'_>) -> RailResult<VerifyOutcome> {
    self.record("verify");
    let target = format!("{} {}@{}", self.kind, ctx.config.name, ctx.version);
    if self.fails(|s| &s.fail_verify) {
      Ok(VerifyOutcome::failed(target, "not visible yet"))
    } else {
      Ok(VerifyOutcome::ok(target, "visible"))
    }
  }

  fn unpublish(&self, _ctx: &PublishContext<'_>) -> RailResult<()> {
    self.record("unpublish");
    if self.fails(|s| &s.fail_unpublish) {
      return Err(
        ReleaseError::Publish {
          artifact: self.kind.to_string(),
          message: "unpublish refused".to_string(),
        }
        .into(),
      );
    }
    Ok(())
  }
}
