//! Script sequencer: `-debug.js`, `.js` and `-min.js`.

use std::sync::Arc;

use crate::compress::CompressOptions;
use crate::consts::JS_DIR;
use crate::descriptor::ModuleDescriptor;
use crate::queue::Queue;
use crate::stamp::JsStamp;
use crate::strip::RegexError;

use super::{ArtifactKind, BuildContext, SequenceReport, log_report, sources, strip_replacer, user_replacers};

/// Build the script queue.
///
/// The debug artifact is written after lint and before logging calls are
/// stripped; the production and minified artifacts follow the strip.
pub fn queue(module: &ModuleDescriptor, ctx: &BuildContext) -> Result<Queue, RegexError> {
  let layout = ctx.layout(&module.name);

  let mut queue = Queue::new(&module.name)
    .read(sources(module.jsfiles.as_deref(), JS_DIR, ctx))
    .concat()
    .js_stamp(JsStamp::module(&module.name, ctx.strict, &module.config))
    .wrap(
      sources(module.prependfiles.as_deref(), JS_DIR, ctx),
      sources(module.appendfiles.as_deref(), JS_DIR, ctx),
    );

  let rules = user_replacers(module)?;
  if !rules.is_empty() {
    queue = queue.replace(rules);
  }

  queue = queue.lint(ctx.lint.clone()).write(layout.debug_js());

  if let Some(strip) = strip_replacer(&module.regex)? {
    queue = queue.replace(vec![strip]);
  }

  Ok(
    queue
      .write(layout.js())
      .compress(CompressOptions::js())
      .write(layout.min_js()),
  )
}

pub async fn build(module: Arc<ModuleDescriptor>, ctx: Arc<BuildContext>) -> SequenceReport {
  let mut report = SequenceReport::new(ArtifactKind::Js);

  match queue(&module, &ctx) {
    Ok(queue) => report.record(queue.run().await),
    Err(e) => report.fail(e.to_string()),
  }

  log_report(&module.name, &report);
  report
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::descriptor::LogPattern;
  use crate::pipeline::BuildOptions;
  use crate::util::testutil::ModuleTree;
  use indexmap::IndexMap;

  fn module(name: &str) -> ModuleDescriptor {
    ModuleDescriptor {
      name: name.to_string(),
      jsfiles: Some(vec![format!("{}.js", name)]),
      ..Default::default()
    }
  }

  #[test]
  fn step_order() {
    let ctx = BuildContext::new("/src/foo", "/build", BuildOptions::default());
    let queue = queue(&module("foo"), &ctx).unwrap();
    assert_eq!(
      queue.step_names(),
      vec![
        "read", "concat", "jsstamp", "wrap", "lint", "write", "replace", "write", "compressor", "write"
      ]
    );
  }

  #[test]
  fn user_rules_run_before_lint_and_strip_can_be_disabled() {
    let ctx = BuildContext::new("/src/foo", "/build", BuildOptions::default());
    let mut replace = IndexMap::new();
    replace.insert("@NAME@".to_string(), "foo".to_string());
    let module = ModuleDescriptor {
      replace: Some(replace),
      regex: LogPattern::Enabled(false),
      ..module("foo")
    };

    let queue = queue(&module, &ctx).unwrap();
    assert_eq!(
      queue.step_names(),
      vec![
        "read", "concat", "jsstamp", "wrap", "replace", "lint", "write", "write", "compressor", "write"
      ]
    );
  }

  #[test]
  fn invalid_strip_pattern_is_an_error() {
    let ctx = BuildContext::new("/src/foo", "/build", BuildOptions::default());
    let module = ModuleDescriptor {
      regex: LogPattern::Custom("[".to_string()),
      ..module("foo")
    };
    assert!(queue(&module, &ctx).is_err());
  }

  #[tokio::test]
  async fn writes_debug_production_and_min() {
    let tree = ModuleTree::new("foo");
    tree.write("js/foo.js", "var foo = 1;\nY.log('built', 'info', NAME);\nfoo++;\n");
    tree.write("js/pre.js", "/* license */\n");

    let module = ModuleDescriptor {
      prependfiles: Some(vec!["pre.js".to_string()]),
      ..module("foo")
    };
    let report = build(Arc::new(module), tree.context(BuildOptions::default())).await;

    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(report.written.len(), 3);

    let debug = tree.read_output("foo/foo-debug.js");
    assert!(debug.starts_with("/* license */\nYUI.add('foo', function (Y, NAME) {\n\n"));
    assert!(debug.contains("Y.log('built'"));

    let prod = tree.read_output("foo/foo.js");
    assert!(!prod.contains("Y.log"));
    assert!(prod.contains("var foo = 1;\nfoo++;\n"));

    let min = tree.read_output("foo/foo-min.js");
    assert!(!min.is_empty());
    assert!(min.len() < prod.len());
    assert!(min.contains("YUI.add("));
    assert_es5(&min);
  }

  fn assert_es5(min: &str) {
    assert!(!min.contains("=>"), "arrow function in {}", min);
    assert!(!min.contains('`'), "template literal in {}", min);
  }

  #[tokio::test]
  async fn braceless_branches_are_minified() {
    let tree = ModuleTree::new("foo");
    tree.write(
      "js/foo.js",
      "var ready = Y.one('#foo');\nif (ready)\n    ready.show();\nelse\n    Y.fire('missing');\n",
    );

    let report = build(Arc::new(module("foo")), tree.context(BuildOptions::default())).await;

    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(report.written.len(), 3);
    let min = tree.read_output("foo/foo-min.js");
    assert!(min.contains("show"));
    assert_es5(&min);
  }

  #[tokio::test]
  async fn implicit_globals_are_minified() {
    let tree = ModuleTree::new("foo");
    tree.write(
      "js/foo.js",
      "counter = 0;\nY.namespace('foo').bump = function () {\n    counter += 1;\n    return counter;\n};\n",
    );

    let report = build(Arc::new(module("foo")), tree.context(BuildOptions::default())).await;

    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(report.written.len(), 3);
    let min = tree.read_output("foo/foo-min.js");
    assert!(min.contains("counter"));
    assert_es5(&min);
  }

  #[tokio::test]
  async fn strict_mode_adds_directive() {
    let tree = ModuleTree::new("foo");
    tree.write("js/foo.js", "var foo = 1;\n");

    let options = BuildOptions {
      strict: true,
      ..Default::default()
    };
    let report = build(Arc::new(module("foo")), tree.context(options)).await;

    assert!(report.is_success());
    assert!(tree.read_output("foo/foo.js").contains("{\n\n\"use strict\";\n\nvar foo = 1;"));
  }

  #[tokio::test]
  async fn missing_source_is_a_recorded_failure() {
    let tree = ModuleTree::new("foo");
    let report = build(Arc::new(module("foo")), tree.context(BuildOptions::default())).await;

    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].to_string().starts_with("js: read"));
    assert!(report.written.is_empty());
  }

  #[tokio::test]
  async fn lint_findings_do_not_fail() {
    let tree = ModuleTree::new("foo");
    tree.write("js/foo.js", "if (a == b) { debugger; }\n");

    let report = build(Arc::new(module("foo")), tree.context(BuildOptions::default())).await;
    assert!(report.is_success());
    assert_eq!(report.lint.len(), 1);
    assert_eq!(report.lint[0].findings.len(), 2);
  }
}
