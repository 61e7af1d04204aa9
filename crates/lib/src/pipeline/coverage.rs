//! Coverage sequencer: `-coverage.js`.

use std::sync::Arc;

use crate::consts::JS_DIR;
use crate::descriptor::ModuleDescriptor;
use crate::queue::Queue;
use crate::stamp::JsStamp;
use crate::strip::RegexError;

use super::{ArtifactKind, BuildContext, SequenceReport, log_report, sources, strip_replacer};

pub fn queue(module: &ModuleDescriptor, ctx: &BuildContext) -> Result<Queue, RegexError> {
  let mut queue = Queue::new(&module.name)
    .read(sources(module.jsfiles.as_deref(), JS_DIR, ctx))
    .concat()
    .js_stamp(JsStamp::module(&module.name, ctx.strict, &module.config));

  if let Some(strip) = strip_replacer(&module.regex)? {
    queue = queue.replace(vec![strip]);
  }

  Ok(
    queue
      .coverage(&module.name)
      .write(ctx.layout(&module.name).coverage_js()),
  )
}

pub async fn build(module: Arc<ModuleDescriptor>, ctx: Arc<BuildContext>) -> SequenceReport {
  let mut report = SequenceReport::new(ArtifactKind::Coverage);

  match queue(&module, &ctx) {
    Ok(queue) => report.record(queue.run().await),
    Err(e) => report.fail(e.to_string()),
  }

  log_report(&module.name, &report);
  report
}
