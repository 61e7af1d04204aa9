//! Stylesheet sequencer: `.css` and `-min.css`.

use std::sync::Arc;

use crate::compress::CompressOptions;
use crate::consts::CSS_DIR;
use crate::descriptor::ModuleDescriptor;
use crate::queue::Queue;
use crate::stamp::CssStamp;

use super::{ArtifactKind, BuildContext, SequenceReport, log_report, sources};

pub fn queue(module: &ModuleDescriptor, ctx: &BuildContext) -> Queue {
  let layout = ctx.layout(&module.name);

  Queue::new(&module.name)
    .read(sources(module.cssfiles.as_deref(), CSS_DIR, ctx))
    .concat()
    .css_stamp(CssStamp::module(&module.name))
    .write(layout.css())
    .compress(CompressOptions::css())
    .write(layout.min_css())
}

pub async fn build(module: Arc<ModuleDescriptor>, ctx: Arc<BuildContext>) -> SequenceReport {
  let mut report = SequenceReport::new(ArtifactKind::Css);
  report.record(queue(&module, &ctx).run().await);
  log_report(&module.name, &report);
  report
}
