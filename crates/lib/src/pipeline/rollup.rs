//! Rollup sequencer.
//!
//! Concatenates the debug builds of the listed modules from the build
//! directory and appends an empty registration for the rollup itself.

use std::sync::Arc;

use tracing::debug;

use crate::compress::CompressOptions;
use crate::descriptor::RollupDescriptor;
use crate::paths::ArtifactLayout;
use crate::queue::Queue;
use crate::stamp::JsStamp;
use crate::strip::RegexError;

use super::{ArtifactKind, BuildContext, SequenceReport, log_report, strip_replacer};

/// The rollup queue, or `None` when the rollup lists no modules.
pub fn queue(rollup: &RollupDescriptor, ctx: &BuildContext) -> Result<Option<Queue>, RegexError> {
  if rollup.files.is_empty() {
    return Ok(None);
  }

  let layout = ctx.layout(&rollup.name);
  let inputs = rollup
    .files
    .iter()
    .map(|module| ArtifactLayout::new(&ctx.build_dir, module).debug_js())
    .collect();

  let mut queue = Queue::new(&rollup.name)
    .read(inputs)
    .concat()
    .js_stamp(JsStamp::rollup(&rollup.name, &rollup.config))
    .write(layout.debug_js());

  if let Some(strip) = strip_replacer(&rollup.regex)? {
    queue = queue.replace(vec![strip]);
  }

  Ok(Some(
    queue
      .lint(ctx.lint.clone())
      .write(layout.js())
      .compress(CompressOptions::js())
      .write(layout.min_js()),
  ))
}

pub async fn build(rollup: Arc<RollupDescriptor>, ctx: Arc<BuildContext>) -> SequenceReport {
  let mut report = SequenceReport::new(ArtifactKind::Rollup);

  match queue(&rollup, &ctx) {
    Ok(Some(queue)) => report.record(queue.run().await),
    Ok(None) => debug!(rollup = %rollup.name, "no files to roll up"),
    Err(e) => report.fail(e.to_string()),
  }

  log_report(&rollup.name, &report);
  report
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pipeline::BuildOptions;
  use crate::util::testutil::ModuleTree;
  use std::path::PathBuf;

  fn rollup(files: &[&str]) -> RollupDescriptor {
    RollupDescriptor {
      name: "all".to_string(),
      files: files.iter().map(|f| f.to_string()).collect(),
      ..Default::default()
    }
  }

  #[test]
  fn step_order_and_inputs() {
    let ctx = BuildContext::new("/src/all", "/build", BuildOptions::default());
    let queue = queue(&rollup(&["a", "b"]), &ctx).unwrap().unwrap();

    assert_eq!(
      queue.step_names(),
      vec!["read", "concat", "jsstamp", "write", "replace", "lint", "write", "compressor", "write"]
    );
    match &queue.steps()[0] {
      crate::queue::Step::Read(paths) => assert_eq!(
        paths,
        &vec![PathBuf::from("/build/a/a-debug.js"), PathBuf::from("/build/b/b-debug.js")]
      ),
      other => panic!("expected read, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn empty_rollup_is_a_no_op() {
    let tree = ModuleTree::new("all");
    let report = build(Arc::new(rollup(&[])), tree.context(BuildOptions::default())).await;

    assert!(report.is_success());
    assert!(report.written.is_empty());
    assert!(!tree.build_dir().join("all").exists());
  }

  #[tokio::test]
  async fn concatenates_debug_builds_and_strips_logging() {
    let tree = ModuleTree::new("all");
    tree.write_output("a/a-debug.js", "YUI.add('a', function (Y, NAME) {\nY.log('a');\n}, '@VERSION@', {});\n");
    tree.write_output("b/b-debug.js", "YUI.add('b', function (Y, NAME) {\n}, '@VERSION@', {});\n");

    let report = build(Arc::new(rollup(&["a", "b"])), tree.context(BuildOptions::default())).await;
    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(report.written.len(), 3);

    let debug = tree.read_output("all/all-debug.js");
    assert!(debug.contains("Y.log('a');"));
    assert!(debug.ends_with("YUI.add('all', function (Y, NAME) {}, '@VERSION@', {});\n"));
    assert!(!tree.read_output("all/all.js").contains("Y.log"));
  }

  #[tokio::test]
  async fn missing_module_build_is_recorded() {
    let tree = ModuleTree::new("all");
    let report = build(Arc::new(rollup(&["nope"])), tree.context(BuildOptions::default())).await;

    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].to_string().starts_with("rollup: read"));
  }
}
