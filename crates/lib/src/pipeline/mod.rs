//! Module build pipelines.
//!
//! Each artifact kind has a sequencer that builds one or more [`Queue`]s and
//! runs them: scripts, stylesheets, coverage, localization bundles, skins and
//! rollups. [`build_module`] fans a module out to the sequencers it needs and
//! waits for all of them on one [`Stack`]; [`run_plan`] does the same for
//! every node of a build file, wave by wave.
//!
//! Sequencers never return errors. Failures are logged with the artifact
//! kind as prefix and recorded in the [`SequenceReport`], so one broken
//! artifact does not stop the others.
//!
//! [`Queue`]: crate::queue::Queue

pub mod coverage;
pub mod css;
pub mod exec;
pub mod js;
pub mod lang;
pub mod rollup;
pub mod skin;
mod types;

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::descriptor::{BuildFile, DescriptorError, LogPattern, ModuleDescriptor, RollupDescriptor};
use crate::paths::resolve;
use crate::plan::{BuildPlan, PlanNode};
use crate::queue::Replacer;
use crate::stack::Stack;
use crate::strip::{RegexError, compile_pattern, log_regex, script_replacement};

pub use types::{
  ArtifactKind, BuildContext, BuildOptions, BuildReport, CommandOutcome, Failure, SequenceReport,
};

/// Build every artifact a module declares.
///
/// Pre-build commands run to completion first. Then the script and coverage
/// sequencers run when `jsfiles` is declared, the stylesheet sequencer for
/// `cssfiles`, the skin sequencer for `config.skinnable == true` and the
/// localization sequencer when `config.lang` is present, all concurrently.
pub async fn build_module(module: Arc<ModuleDescriptor>, ctx: Arc<BuildContext>) -> BuildReport {
  let mut report = BuildReport::new(&module.name);
  info!(module = %module.name, lint = %ctx.lint.profile, "using {} lint setting", ctx.lint.profile);

  if let Some(commands) = module.exec.as_deref()
    && !commands.is_empty()
  {
    info!(module = %module.name, "found an exec, priming the build");
    report.commands = exec::run_commands(commands, &ctx).await;
  }

  let mut stack = Stack::new();
  if module.jsfiles.is_some() {
    stack.add(js::build(module.clone(), ctx.clone()));
    stack.add(coverage::build(module.clone(), ctx.clone()));
  }
  if module.cssfiles.is_some() {
    stack.add(css::build(module.clone(), ctx.clone()));
  }
  if module.config.skinnable() {
    stack.add(skin::build(module.clone(), ctx.clone()));
  }
  if module.config.languages().is_some() {
    stack.add(lang::build(module.clone(), ctx.clone()));
  }

  debug!(module = %module.name, sequencers = stack.pending(), "waiting for sequencers");
  let joined = stack.done().await;
  report.sequences = joined.results;
  report.panicked = joined.panicked.into_iter().map(|panic| panic.message).collect();

  if report.is_success() {
    info!(module = %module.name, artifacts = report.written().count(), "shifted {}", module.name);
  }
  report
}

/// Build a rollup from the debug builds of its modules.
pub async fn build_rollup(rollup: Arc<RollupDescriptor>, ctx: Arc<BuildContext>) -> BuildReport {
  let mut report = BuildReport::new(&rollup.name);
  report.sequences.push(rollup::build(rollup, ctx).await);
  report
}

/// Reports of a whole build file run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
  /// One report per module and rollup, wave by wave.
  pub reports: Vec<BuildReport>,
  /// Builds that panicked before reporting.
  pub panicked: Vec<String>,
}

impl RunReport {
  pub fn is_success(&self) -> bool {
    self.panicked.is_empty() && self.reports.iter().all(BuildReport::is_success)
  }

  pub fn written(&self) -> impl Iterator<Item = &PathBuf> {
    self.reports.iter().flat_map(BuildReport::written)
  }
}

/// Build every module and rollup of `file`, rollups after the modules they
/// aggregate.
pub async fn run_plan(file: &BuildFile, ctx: Arc<BuildContext>) -> Result<RunReport, DescriptorError> {
  let plan = BuildPlan::new(file)?;
  let mut run = RunReport::default();

  for (index, wave) in plan.waves()?.into_iter().enumerate() {
    debug!(wave = index, nodes = wave.len(), "starting wave");
    let mut stack = Stack::new();

    for node in wave {
      match node {
        PlanNode::Module(name) => {
          if let Some(module) = file.builds.get(&name) {
            stack.add(build_module(Arc::new(module.clone()), ctx.clone()));
          }
        }
        PlanNode::Rollup(name) => {
          if let Some(rollup) = file.rollups.get(&name) {
            stack.add(build_rollup(Arc::new(rollup.clone()), ctx.clone()));
          }
        }
      }
    }

    let joined = stack.done().await;
    run.reports.extend(joined.results);
    run.panicked.extend(joined.panicked.into_iter().map(|panic| panic.message));
  }

  Ok(run)
}

/// Resolve an optional file list; an absent list reads nothing.
pub(crate) fn sources(items: Option<&[String]>, dir: &str, ctx: &BuildContext) -> Vec<PathBuf> {
  resolve(items, dir, &ctx.cwd).unwrap_or_default()
}

/// User `replace` rules, compiled in declaration order. Replacements use
/// script syntax (`$1`, `$&`).
pub(crate) fn user_replacers(module: &ModuleDescriptor) -> Result<Vec<Replacer>, RegexError> {
  module
    .replace
    .iter()
    .flatten()
    .map(|(pattern, replacement)| {
      compile_pattern(pattern).map(|regex| {
        let replacement = script_replacement(replacement, &regex);
        Replacer::all(regex, replacement)
      })
    })
    .collect()
}

/// The logging-strip rule for a descriptor's `regex` setting, if enabled.
pub(crate) fn strip_replacer(setting: &LogPattern) -> Result<Option<Replacer>, RegexError> {
  Ok(log_regex(setting)?.map(Replacer::strip))
}

/// Log a finished sequencer's failures and lint findings.
pub(crate) fn log_report(module: &str, report: &SequenceReport) {
  for failure in &report.failures {
    error!(module = %module, kind = %failure.kind, "{}", failure);
  }

  for lint in report.lint.iter().filter(|l| !l.is_clean()) {
    warn!(
      module = %module,
      file = %lint.name,
      "{} contains {} lint errors",
      lint.name,
      lint.findings.len()
    );
    for (index, finding) in lint.findings.iter().enumerate() {
      warn!(
        "   #{}: {}\n       {} // line {}, pos {}",
        index + 1,
        finding.reason,
        finding.evidence,
        finding.line,
        finding.character
      );
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::lint::LintProfile;
  use crate::util::testutil::ModuleTree;
  use indexmap::IndexMap;

  #[test]
  fn user_replacers_keep_declared_order() {
    let mut replace = IndexMap::new();
    replace.insert("@A@".to_string(), "b".to_string());
    replace.insert("b".to_string(), "c".to_string());
    let module = ModuleDescriptor {
      replace: Some(replace),
      ..Default::default()
    };

    let rules = user_replacers(&module).unwrap();
    assert_eq!(rules.iter().map(Replacer::pattern).collect::<Vec<_>>(), vec!["@A@", "b"]);
    assert_eq!(rules.iter().fold("@A@".to_string(), |s, r| r.apply(&s)), "c");
  }

  #[test]
  fn user_replacers_read_group_references_like_scripts() {
    let mut replace = IndexMap::new();
    replace.insert(r"(@\w+@)".to_string(), "$1_suffix".to_string());
    replace.insert("suffix".to_string(), "[$&]".to_string());
    let module = ModuleDescriptor {
      replace: Some(replace),
      ..Default::default()
    };

    let rules = user_replacers(&module).unwrap();
    let out = rules
      .iter()
      .fold("var v = '@VERSION@';".to_string(), |s, r| r.apply(&s));
    assert_eq!(out, "var v = '@VERSION@_[suffix]';");
  }

  #[test]
  fn invalid_user_rule_is_an_error() {
    let mut replace = IndexMap::new();
    replace.insert("(".to_string(), "x".to_string());
    let module = ModuleDescriptor {
      replace: Some(replace),
      ..Default::default()
    };
    assert!(user_replacers(&module).is_err());
  }

  #[tokio::test]
  async fn module_without_sources_builds_nothing() {
    let tree = ModuleTree::new("empty");
    let module = Arc::new(ModuleDescriptor {
      name: "empty".to_string(),
      ..Default::default()
    });

    let report = build_module(module, tree.context(BuildOptions::default())).await;
    assert!(report.is_success());
    assert!(report.sequences.is_empty());
    assert!(!tree.build_dir().join("empty").exists());
  }

  #[tokio::test]
  async fn script_module_fans_out_to_js_and_coverage() {
    let tree = ModuleTree::new("foo");
    tree.write("js/foo.js", "var foo = 1;\n");
    let module = Arc::new(ModuleDescriptor {
      name: "foo".to_string(),
      jsfiles: Some(vec!["foo.js".to_string()]),
      ..Default::default()
    });

    let report = build_module(module, tree.context(BuildOptions::default())).await;
    assert!(report.is_success());
    let kinds: Vec<_> = report.sequences.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![ArtifactKind::Js, ArtifactKind::Coverage]);
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn exec_runs_before_sequencers() {
    let tree = ModuleTree::new("gen");
    let module = Arc::new(ModuleDescriptor {
      name: "gen".to_string(),
      jsfiles: Some(vec!["gen.js".to_string()]),
      exec: Some(vec!["mkdir -p js && echo 'var gen = 1;' > js/gen.js".to_string()]),
      ..Default::default()
    });

    let report = build_module(module, tree.context(BuildOptions::default())).await;
    assert_eq!(report.commands.len(), 1);
    assert!(report.is_success(), "{:?}", report);
    assert!(tree.build_dir().join("gen/gen-min.js").exists());
  }

  #[tokio::test]
  async fn failures_are_partial() {
    let tree = ModuleTree::new("half");
    tree.write("js/half.js", "var half = 1;\n");
    let module = Arc::new(ModuleDescriptor {
      name: "half".to_string(),
      jsfiles: Some(vec!["half.js".to_string()]),
      cssfiles: Some(vec!["missing.css".to_string()]),
      ..Default::default()
    });

    let report = build_module(module, tree.context(BuildOptions::default())).await;
    assert!(!report.is_success());
    assert!(report.sequence(ArtifactKind::Js).unwrap().is_success());

    let css = report.sequence(ArtifactKind::Css).unwrap();
    assert_eq!(css.failures.len(), 1);
    assert_eq!(css.failures[0].step, Some("read"));
  }

  #[tokio::test]
  async fn plan_builds_rollup_after_modules() {
    let tree = ModuleTree::new("pair");
    tree.write("js/a.js", "var a = 1;\n");
    tree.write("js/b.js", "var b = 2;\n");
    let file = BuildFile::parse(
      r#"{
        "builds": { "a": { "jsfiles": ["a.js"] }, "b": { "jsfiles": ["b.js"] } },
        "rollups": { "pair": { "files": ["a", "b"] } }
      }"#,
    )
    .unwrap();

    let options = BuildOptions {
      lint: LintProfile::Relaxed,
      strict: false,
    };
    let run = run_plan(&file, tree.context(options)).await.unwrap();
    assert!(run.is_success(), "{:?}", run);
    assert_eq!(
      run.reports.iter().map(|r| r.module.as_str()).collect::<Vec<_>>(),
      vec!["a", "b", "pair"]
    );

    let rolled = std::fs::read_to_string(tree.build_dir().join("pair/pair-debug.js")).unwrap();
    let a = rolled.find("var a = 1;").unwrap();
    let b = rolled.find("var b = 2;").unwrap();
    assert!(a < b);
    assert!(rolled.ends_with("YUI.add('pair', function (Y, NAME) {}, '@VERSION@', {});\n"));
  }
}
