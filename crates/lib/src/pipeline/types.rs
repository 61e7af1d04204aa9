//! Pipeline inputs and reports.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::lint::{LintConfig, LintProfile, LintReport};
use crate::paths::ArtifactLayout;
use crate::queue::{QueueError, QueueOutput};

/// User-facing build switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
  pub lint: LintProfile,
  /// Emit `"use strict";` at the top of each module body.
  pub strict: bool,
}

/// Everything a sequencer needs besides the module itself.
///
/// Resolved once per run and shared read-only between tasks.
#[derive(Debug, Clone)]
pub struct BuildContext {
  /// Module source directory; declared files resolve against it.
  pub cwd: PathBuf,
  /// Output root; each module writes under `<build_dir>/<name>`.
  pub build_dir: PathBuf,
  pub lint: LintConfig,
  pub strict: bool,
  /// Shell used for pre-build commands instead of the platform default.
  pub shell: Option<String>,
}

impl BuildContext {
  pub fn new(cwd: impl Into<PathBuf>, build_dir: impl Into<PathBuf>, options: BuildOptions) -> Self {
    Self {
      cwd: cwd.into(),
      build_dir: build_dir.into(),
      lint: LintConfig::for_profile(options.lint),
      strict: options.strict,
      shell: None,
    }
  }

  pub fn with_shell(mut self, shell: Option<String>) -> Self {
    self.shell = shell;
    self
  }

  pub fn layout(&self, name: &str) -> ArtifactLayout {
    ArtifactLayout::new(&self.build_dir, name)
  }

  /// `<cwd>/<relative>`
  pub fn source(&self, relative: impl AsRef<Path>) -> PathBuf {
    self.cwd.join(relative)
  }
}

/// Which sequencer produced a report or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
  Js,
  Css,
  Coverage,
  Lang,
  Skin,
  Rollup,
  Exec,
}

impl ArtifactKind {
  /// Prefix used when logging failures of this kind.
  pub fn as_str(self) -> &'static str {
    match self {
      ArtifactKind::Js => "js",
      ArtifactKind::Css => "css",
      ArtifactKind::Coverage => "coverage",
      ArtifactKind::Lang => "lang",
      ArtifactKind::Skin => "skin",
      ArtifactKind::Rollup => "rollup",
      ArtifactKind::Exec => "exec",
    }
  }
}

impl fmt::Display for ArtifactKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A recorded sequencer failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
  pub kind: ArtifactKind,
  /// Failing step, when a queue step failed.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub step: Option<&'static str>,
  pub message: String,
}

impl Failure {
  pub fn new(kind: ArtifactKind, message: impl Into<String>) -> Self {
    Self {
      kind,
      step: None,
      message: message.into(),
    }
  }

  pub fn from_queue(kind: ArtifactKind, err: &QueueError) -> Self {
    Self {
      kind,
      step: Some(err.step),
      message: err.to_string(),
    }
  }
}

impl fmt::Display for Failure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.kind, self.message)
  }
}

/// Outcome of one sequencer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceReport {
  pub kind: ArtifactKind,
  pub written: Vec<PathBuf>,
  pub lint: Vec<LintReport>,
  pub failures: Vec<Failure>,
}

impl SequenceReport {
  pub fn new(kind: ArtifactKind) -> Self {
    Self {
      kind,
      written: Vec::new(),
      lint: Vec::new(),
      failures: Vec::new(),
    }
  }

  pub fn is_success(&self) -> bool {
    self.failures.is_empty()
  }

  /// Fold a queue result into the report.
  pub fn record(&mut self, result: Result<QueueOutput, QueueError>) {
    match result {
      Ok(output) => {
        self.written.extend(output.written);
        self.lint.extend(output.lint);
      }
      Err(err) => self.failures.push(Failure::from_queue(self.kind, &err)),
    }
  }

  pub fn fail(&mut self, message: impl Into<String>) {
    self.failures.push(Failure::new(self.kind, message));
  }

  pub fn merge(&mut self, other: SequenceReport) {
    self.written.extend(other.written);
    self.lint.extend(other.lint);
    self.failures.extend(other.failures);
  }
}

/// Result of one pre-build command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutcome {
  pub cmd: String,
  /// Exit code; `None` when the process could not be started or was killed.
  pub code: Option<i32>,
  pub stdout: String,
  pub stderr: String,
  /// Why the command produced no exit status: the shell could not be
  /// started, or the task running it panicked.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl CommandOutcome {
  pub fn is_success(&self) -> bool {
    self.error.is_none() && self.code == Some(0)
  }
}

/// Outcome of building one module or rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
  pub module: String,
  pub commands: Vec<CommandOutcome>,
  pub sequences: Vec<SequenceReport>,
  /// Sequencers that panicked instead of reporting.
  pub panicked: Vec<String>,
}

impl BuildReport {
  pub fn new(module: impl Into<String>) -> Self {
    Self {
      module: module.into(),
      commands: Vec::new(),
      sequences: Vec::new(),
      panicked: Vec::new(),
    }
  }

  /// True when every command and sequencer succeeded.
  pub fn is_success(&self) -> bool {
    self.panicked.is_empty()
      && self.commands.iter().all(CommandOutcome::is_success)
      && self.sequences.iter().all(SequenceReport::is_success)
  }

  pub fn sequence(&self, kind: ArtifactKind) -> Option<&SequenceReport> {
    self.sequences.iter().find(|s| s.kind == kind)
  }

  pub fn written(&self) -> impl Iterator<Item = &PathBuf> {
    self.sequences.iter().flat_map(|s| s.written.iter())
  }

  pub fn failures(&self) -> impl Iterator<Item = &Failure> {
    self.sequences.iter().flat_map(|s| s.failures.iter())
  }

  pub fn lint(&self) -> impl Iterator<Item = &LintReport> {
    self.sequences.iter().flat_map(|s| s.lint.iter())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::queue::StepError;

  #[test]
  fn context_resolves_lint_profile() {
    let ctx = BuildContext::new(
      "/src/foo",
      "/build",
      BuildOptions {
        lint: LintProfile::Strict,
        strict: true,
      },
    );
    assert_eq!(ctx.lint, LintConfig::for_profile(LintProfile::Strict));
    assert!(ctx.strict);
    assert_eq!(ctx.layout("foo").js(), PathBuf::from("/build/foo/foo.js"));
    assert_eq!(ctx.source("assets"), PathBuf::from("/src/foo/assets"));
  }

  #[test]
  fn failures_display_with_kind_prefix() {
    let err = QueueError {
      step: "write",
      index: 3,
      source: StepError::BlobCount {
        path: PathBuf::from("out.js"),
        count: 2,
      },
    };
    let failure = Failure::from_queue(ArtifactKind::Css, &err);
    assert_eq!(failure.step, Some("write"));
    assert!(failure.to_string().starts_with("css: "));
  }

  #[test]
  fn report_success_covers_commands_and_sequences() {
    let mut report = BuildReport::new("foo");
    report.sequences.push(SequenceReport::new(ArtifactKind::Js));
    assert!(report.is_success());

    report.commands.push(CommandOutcome {
      cmd: "false".to_string(),
      code: Some(1),
      stdout: String::new(),
      stderr: String::new(),
      error: None,
    });
    assert!(!report.is_success());

    let mut report = BuildReport::new("foo");
    let mut css = SequenceReport::new(ArtifactKind::Css);
    css.fail("boom");
    report.sequences.push(css);
    assert!(!report.is_success());
    assert_eq!(report.failures().count(), 1);
  }
}
