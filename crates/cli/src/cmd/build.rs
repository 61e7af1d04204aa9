//! Implementation of the `shifter build` command.
//!
//! Loads the build file from the module directory, builds every selected
//! module and rollup wave by wave, and prints a per-module summary. Recorded
//! failures make the command exit non-zero after the summary is printed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Args;
use tracing::info;

use shifter_lib::consts::DEFAULT_BUILD_DIR;
use shifter_lib::lint::LintProfile;
use shifter_lib::paths::normalize;
use shifter_lib::pipeline::{BuildContext, BuildOptions, RunReport, run_plan};

use super::SourceArgs;
use crate::output::{
  OutputFormat, display_path, format_duration, print_error, print_info, print_json, print_stat, print_success, print_warning,
};

#[derive(Args, Debug)]
pub struct BuildArgs {
  #[command(flatten)]
  pub source: SourceArgs,

  /// Output root, relative to the module directory (default: ../../build)
  #[arg(long)]
  pub build_dir: Option<PathBuf>,

  /// Lint profile: relaxed, defaults, preferred or strict
  #[arg(long, default_value = "defaults")]
  pub lint: LintProfile,

  /// Add "use strict" to every module body
  #[arg(long)]
  pub strict: bool,

  /// Only build these modules or rollups (repeatable)
  #[arg(short, long = "module", value_name = "NAME")]
  pub modules: Vec<String>,

  /// Shell for exec commands (default: /bin/sh, or powershell on Windows)
  #[arg(long)]
  pub shell: Option<String>,

  /// Output format
  #[arg(short = 'o', long, value_enum, default_value = "text")]
  pub output: OutputFormat,
}

pub fn cmd_build(args: BuildArgs) -> Result<()> {
  let module_dir = args.source.module_dir()?;
  let (path, file) = args.source.load(&module_dir)?;
  let file = file.select(&args.modules).context("Invalid module selection")?;

  let build_dir = normalize(&module_dir.join(args.build_dir.as_deref().unwrap_or(Path::new(DEFAULT_BUILD_DIR))));
  let options = BuildOptions {
    lint: args.lint,
    strict: args.strict,
  };
  let ctx = Arc::new(BuildContext::new(&module_dir, &build_dir, options).with_shell(args.shell));

  info!(
    config = %path.display(),
    build_dir = %build_dir.display(),
    "building {} module(s)",
    file.len()
  );

  let started = Instant::now();
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let run = rt.block_on(run_plan(&file, ctx)).context("Failed to plan build")?;
  let elapsed = started.elapsed();

  if args.output.is_json() {
    print_json(&run)?;
  } else {
    print_summary(&run, &build_dir, elapsed);
  }

  let failed = run.reports.iter().filter(|r| !r.is_success()).count() + run.panicked.len();
  if failed > 0 {
    bail!("{} of {} build(s) had failures", failed, run.reports.len());
  }

  Ok(())
}

fn print_summary(run: &RunReport, build_dir: &Path, elapsed: Duration) {
  for report in &run.reports {
    let written = report.written().count();

    if report.is_success() {
      print_success(&format!("{} ({} artifact(s))", report.module, written));
    } else {
      print_error(&format!("{} ({} artifact(s), with failures)", report.module, written));
    }

    for command in report.commands.iter().filter(|c| !c.is_success()) {
      let reason = match (&command.error, command.code) {
        (Some(error), _) => error.clone(),
        (None, Some(code)) => format!("exit code {}", code),
        (None, None) => "terminated".to_string(),
      };
      print_warning(&format!("  exec '{}': {}", command.cmd, reason));
    }
    for failure in report.failures() {
      print_error(&format!("  {}", failure));
    }
    for panic in &report.panicked {
      print_error(&format!("  panicked: {}", panic));
    }

    let findings: usize = report.lint().map(|l| l.findings.len()).sum();
    if findings > 0 {
      print_info(&format!("  {} lint finding(s)", findings));
    }
  }

  for panic in &run.panicked {
    print_error(&format!("build panicked: {}", panic));
  }

  println!();
  print_stat("Build directory", &display_path(build_dir));
  print_stat("Artifacts", &run.written().count().to_string());
  print_stat("Time", &format_duration(elapsed));
}
