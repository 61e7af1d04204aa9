//! Skin sequencer.
//!
//! Copies `assets/<name>-core.css`, then for every directory under
//! `assets/skins` writes a full variant (core plus skin rules, minified and
//! stamped) and a skin-only variant. Every copy runs as its own task.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::compress::CompressOptions;
use crate::consts::{ASSETS_DIR, SKINS_DIR};
use crate::descriptor::ModuleDescriptor;
use crate::queue::Queue;
use crate::stack::Stack;
use crate::stamp::CssStamp;

use super::{ArtifactKind, BuildContext, SequenceReport, log_report};

/// `<cwd>/assets/<name>-core.css`
pub fn core_source(name: &str, ctx: &BuildContext) -> PathBuf {
  ctx.source(ASSETS_DIR).join(format!("{}-core.css", name))
}

/// `<cwd>/assets/skins/<skin>/<name>-skin.css`
pub fn skin_source(name: &str, skin: &str, ctx: &BuildContext) -> PathBuf {
  skins_dir(ctx).join(skin).join(format!("{}-skin.css", name))
}

fn skins_dir(ctx: &BuildContext) -> PathBuf {
  ctx.source(ASSETS_DIR).join(SKINS_DIR)
}

/// Copy the core stylesheet unchanged.
pub fn core_queue(name: &str, ctx: &BuildContext) -> Queue {
  Queue::new(name)
    .read(vec![core_source(name, ctx)])
    .write(ctx.layout(name).core_css())
}

/// Core plus skin rules, minified, then stamped for the skin.
pub fn full_queue(name: &str, skin: &str, ctx: &BuildContext) -> Queue {
  Queue::new(name)
    .read(vec![core_source(name, ctx), skin_source(name, skin, ctx)])
    .concat()
    .compress(CompressOptions::css())
    .css_stamp(CssStamp::skin(skin, name))
    .write(ctx.layout(name).skin_css(skin))
}

/// The skin's own rules, unchanged.
pub fn skin_only_queue(name: &str, skin: &str, ctx: &BuildContext) -> Queue {
  Queue::new(name)
    .read(vec![skin_source(name, skin, ctx)])
    .write(ctx.layout(name).skin_only_css(skin))
}

/// Names of the skin directories under `dir`, sorted.
pub async fn list_skins(dir: &Path) -> io::Result<Vec<String>> {
  let mut entries = tokio::fs::read_dir(dir).await?;
  let mut skins = Vec::new();

  while let Some(entry) = entries.next_entry().await? {
    if entry.file_type().await?.is_dir() {
      skins.push(entry.file_name().to_string_lossy().into_owned());
    }
  }

  skins.sort();
  Ok(skins)
}

async fn run_queue(queue: Queue) -> SequenceReport {
  let mut report = SequenceReport::new(ArtifactKind::Skin);
  report.record(queue.run().await);
  report
}

pub async fn build(module: Arc<ModuleDescriptor>, ctx: Arc<BuildContext>) -> SequenceReport {
  let name = module.name.as_str();
  let mut report = SequenceReport::new(ArtifactKind::Skin);
  let mut stack = Stack::new();

  stack.add(run_queue(core_queue(name, &ctx)));

  let dir = skins_dir(&ctx);
  match list_skins(&dir).await {
    Ok(skins) => {
      debug!(module = %name, skins = ?skins, "found skins");
      for skin in &skins {
        stack.add(run_queue(full_queue(name, skin, &ctx)));
        stack.add(run_queue(skin_only_queue(name, skin, &ctx)));
      }
    }
    Err(e) => report.fail(format!("failed to list skins in {}: {}", dir.display(), e)),
  }

  let joined = stack.done().await;
  for part in joined.results {
    report.merge(part);
  }
  for panic in joined.panicked {
    report.fail(panic.message);
  }

  log_report(name, &report);
  report
}
