//! Implementation of the `shifter list` command.

use anyhow::{Context, Result};
use clap::Args;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use shifter_lib::descriptor::BuildFile;
use shifter_lib::plan::{BuildPlan, PlanNode};

use super::SourceArgs;
use crate::output::{OutputFormat, print_info, print_json, symbols};

#[derive(Args, Debug)]
pub struct ListArgs {
  #[command(flatten)]
  pub source: SourceArgs,

  /// Output format
  #[arg(short = 'o', long, value_enum, default_value = "text")]
  pub output: OutputFormat,
}

#[derive(Debug, Serialize)]
struct ListEntry {
  name: String,
  kind: &'static str,
  wave: usize,
  /// Build file entries that must be built first.
  depends_on: Vec<String>,
  /// Source files, or the modules a rollup aggregates.
  files: Vec<String>,
}

pub fn cmd_list(args: ListArgs) -> Result<()> {
  let module_dir = args.source.module_dir()?;
  let (path, file) = args.source.load(&module_dir)?;
  let plan = BuildPlan::new(&file).with_context(|| format!("Invalid build order in {}", path.display()))?;
  let entries = entries(&file, &plan)?;

  if args.output.is_json() {
    return print_json(&entries);
  }

  if entries.is_empty() {
    print_info(&format!("Nothing to build in {}", path.display()));
    return Ok(());
  }

  let mut current = None;
  for entry in &entries {
    if current != Some(entry.wave) {
      current = Some(entry.wave);
      println!(
        "{}",
        format!("Wave {}", entry.wave + 1).if_supports_color(Stream::Stdout, |s| s.bold())
      );
    }

    println!("  {} {}", symbols::ARROW, describe(entry));
  }

  Ok(())
}

/// `name (kind) after deps: files`
fn describe(entry: &ListEntry) -> String {
  let mut line = format!("{} ({})", entry.name, entry.kind);
  if !entry.depends_on.is_empty() {
    line.push_str(&format!(" after {}", entry.depends_on.join(", ")));
  }
  if !entry.files.is_empty() {
    line.push_str(&format!(": {}", entry.files.join(", ")));
  }
  line
}

fn entries(file: &BuildFile, plan: &BuildPlan) -> Result<Vec<ListEntry>> {
  let waves = plan.waves().context("Failed to order builds")?;
  let mut entries = Vec::with_capacity(plan.len());

  for (wave, nodes) in waves.into_iter().enumerate() {
    for node in nodes {
      let (kind, files) = match &node {
        PlanNode::Module(name) => {
          let files = file
            .builds
            .get(name)
            .map(|module| {
              let js = module.jsfiles.iter().flatten();
              let css = module.cssfiles.iter().flatten();
              js.chain(css).cloned().collect()
            })
            .unwrap_or_default();
          ("module", files)
        }
        PlanNode::Rollup(name) => {
          let files = file.rollups.get(name).map(|r| r.files.clone()).unwrap_or_default();
          ("rollup", files)
        }
      };

      entries.push(ListEntry {
        name: node.name().to_string(),
        kind,
        wave,
        depends_on: plan.dependencies(node.name()).into_iter().map(str::to_string).collect(),
        files,
      });
    }
  }

  Ok(entries)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn entries_follow_build_order() {
    let file = BuildFile::parse(
      r#"{
        "name": "widgets",
        "builds": {
          "a": { "jsfiles": ["a.js"] },
          "b": { "jsfiles": ["b.js"], "cssfiles": ["b.css"] }
        },
        "rollups": {
          "ab": { "files": ["a", "b"] }
        }
      }"#,
    )
    .unwrap();
    let plan = BuildPlan::new(&file).unwrap();

    let entries = entries(&file, &plan).unwrap();
    let summary: Vec<_> = entries.iter().map(|e| (e.name.as_str(), e.kind, e.wave)).collect();
    assert_eq!(summary, vec![("a", "module", 0), ("b", "module", 0), ("ab", "rollup", 1)]);
    assert_eq!(entries[1].files, vec!["b.js", "b.css"]);
    assert_eq!(entries[2].depends_on, vec!["a", "b"]);
    assert_eq!(entries[2].files, vec!["a", "b"]);
  }

  #[test]
  fn text_line_names_files() {
    let module = ListEntry {
      name: "b".to_string(),
      kind: "module",
      wave: 0,
      depends_on: Vec::new(),
      files: vec!["b.js".to_string(), "b.css".to_string()],
    };
    assert_eq!(describe(&module), "b (module): b.js, b.css");

    let rollup = ListEntry {
      name: "ab".to_string(),
      kind: "rollup",
      wave: 1,
      depends_on: vec!["a".to_string(), "b".to_string()],
      files: vec!["a".to_string(), "b".to_string()],
    };
    assert_eq!(describe(&rollup), "ab (rollup) after a, b: a, b");

    let bare = ListEntry {
      files: Vec::new(),
      ..module
    };
    assert_eq!(describe(&bare), "b (module)");
  }

  #[test]
  fn empty_file_lists_nothing() {
    let file = BuildFile::parse(r#"{ "builds": {} }"#).unwrap();
    let plan = BuildPlan::new(&file).unwrap();
    assert!(entries(&file, &plan).unwrap().is_empty());
  }
}
