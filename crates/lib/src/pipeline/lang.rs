//! Localization sequencer: `lang/<name>.js` and `lang/<name>_<lang>.js`.
//!
//! One bundle per language, built concurrently. The unlocalized bundle is
//! always built, whether or not the declared list names it.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::compress::CompressOptions;
use crate::consts::LANG_DIR;
use crate::descriptor::ModuleDescriptor;
use crate::paths::lang_module_name;
use crate::queue::Queue;
use crate::stack::Stack;
use crate::stamp::{LANG_TEMPLATE, LangTokens, build_languages};

use super::{ArtifactKind, BuildContext, SequenceReport, log_report};

/// Source strings of one language: `<cwd>/lang/<name>[_<lang>].js`.
pub fn strings_path(name: &str, lang: &str, ctx: &BuildContext) -> PathBuf {
  ctx
    .cwd
    .join(LANG_DIR)
    .join(format!("{}.js", lang_module_name(name, lang)))
}

/// Queue for one language, given the contents of its strings file.
pub fn queue(name: &str, lang: &str, strings: String, ctx: &BuildContext) -> Queue {
  let lang_module = lang_module_name(name, lang);
  let tokens = LangTokens::new(name, lang, strings);

  let queue = tokens
    .replacers()
    .into_iter()
    .fold(Queue::new(&lang_module).source("langtemplate.txt", LANG_TEMPLATE), |queue, replacer| {
      queue.replace(vec![replacer])
    });

  queue
    .compress(CompressOptions::js())
    .write(ctx.layout(name).lang(&lang_module))
}

async fn build_one(name: String, lang: String, ctx: Arc<BuildContext>) -> SequenceReport {
  let mut report = SequenceReport::new(ArtifactKind::Lang);
  let path = strings_path(&name, &lang, &ctx);

  let strings = match tokio::fs::read_to_string(&path).await {
    Ok(strings) => strings,
    Err(e) => {
      report.fail(format!("failed to read strings {}: {}", path.display(), e));
      return report;
    }
  };

  report.record(queue(&name, &lang, strings, &ctx).run().await);
  if report.is_success() {
    info!(module = %name, lang = %lang, "shifted lang for {}", name);
  }
  report
}

pub async fn build(module: Arc<ModuleDescriptor>, ctx: Arc<BuildContext>) -> SequenceReport {
  let declared = module.config.languages().unwrap_or_default();
  let mut stack = Stack::new();

  for lang in build_languages(&declared) {
    stack.add(build_one(module.name.clone(), lang, ctx.clone()));
  }

  let joined = stack.done().await;
  let mut report = SequenceReport::new(ArtifactKind::Lang);
  for part in joined.results {
    report.merge(part);
  }
  for panic in joined.panicked {
    report.fail(panic.message);
  }

  log_report(&module.name, &report);
  report
}
