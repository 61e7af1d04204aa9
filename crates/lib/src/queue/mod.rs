//! Declarative step queues.
//!
//! A [`Queue`] is an ordered list of named steps over a list of text blobs,
//! built fluently and run once:
//!
//! ```no_run
//! # async fn example() -> Result<(), shifter_lib::queue::QueueError> {
//! use shifter_lib::compress::CompressOptions;
//! use shifter_lib::queue::Queue;
//!
//! let output = Queue::new("foo")
//!   .read(vec!["/src/foo/css/foo.css".into()])
//!   .concat()
//!   .compress(CompressOptions::css())
//!   .write("/build/foo/foo-min.css".into())
//!   .run()
//!   .await?;
//! assert_eq!(output.written.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! Steps run strictly in declaration order; the first failing step stops the
//! queue and is reported in the returned [`QueueError`].

mod execute;
mod types;

use std::path::PathBuf;

use crate::compress::CompressOptions;
use crate::lint::LintConfig;
use crate::stamp::{CssStamp, JsStamp};

pub use types::{Blob, QueueError, QueueOutput, ReplaceMode, Replacer, StepError};

/// One queue operation.
#[derive(Debug, Clone)]
pub enum Step {
  /// Append one blob per file, in order.
  Read(Vec<PathBuf>),
  /// Append an in-memory blob.
  Source(Blob),
  /// Join all blobs into one.
  Concat,
  /// Wrap each blob in a registration envelope.
  JsStamp(JsStamp),
  /// Append a detection rule to each blob.
  CssStamp(CssStamp),
  /// Surround each blob with the contents of other files.
  Wrap { prepend: Vec<PathBuf>, append: Vec<PathBuf> },
  /// Apply each replacer, in order, to each blob.
  Replace(Vec<Replacer>),
  /// Lint each blob; never modifies it.
  Lint(LintConfig),
  /// Instrument each blob for line coverage.
  Coverage { name: String },
  /// Minify each blob.
  Compress(CompressOptions),
  /// Write the single blob to a file.
  Write(PathBuf),
}

impl Step {
  pub fn name(&self) -> &'static str {
    match self {
      Step::Read(_) => "read",
      Step::Source(_) => "source",
      Step::Concat => "concat",
      Step::JsStamp(_) => "jsstamp",
      Step::CssStamp(_) => "cssstamp",
      Step::Wrap { .. } => "wrap",
      Step::Replace(_) => "replace",
      Step::Lint(_) => "lint",
      Step::Coverage { .. } => "coverage",
      Step::Compress(_) => "compressor",
      Step::Write(_) => "write",
    }
  }
}

/// An ordered sequence of steps, owned by the pipeline that built it.
#[derive(Debug, Clone)]
pub struct Queue {
  label: String,
  steps: Vec<Step>,
}

impl Queue {
  /// Create an empty queue. `label` names the blob produced by `concat`.
  pub fn new(label: impl Into<String>) -> Self {
    Self {
      label: label.into(),
      steps: Vec::new(),
    }
  }

  pub fn label(&self) -> &str {
    &self.label
  }

  pub fn steps(&self) -> &[Step] {
    &self.steps
  }

  /// Step names in execution order.
  pub fn step_names(&self) -> Vec<&'static str> {
    self.steps.iter().map(Step::name).collect()
  }

  pub fn push(mut self, step: Step) -> Self {
    self.steps.push(step);
    self
  }

  pub fn read(self, paths: Vec<PathBuf>) -> Self {
    self.push(Step::Read(paths))
  }

  pub fn source(self, name: impl Into<String>, content: impl Into<String>) -> Self {
    self.push(Step::Source(Blob::new(name, content)))
  }

  pub fn concat(self) -> Self {
    self.push(Step::Concat)
  }

  pub fn js_stamp(self, stamp: JsStamp) -> Self {
    self.push(Step::JsStamp(stamp))
  }

  pub fn css_stamp(self, stamp: CssStamp) -> Self {
    self.push(Step::CssStamp(stamp))
  }

  pub fn wrap(self, prepend: Vec<PathBuf>, append: Vec<PathBuf>) -> Self {
    self.push(Step::Wrap { prepend, append })
  }

  pub fn replace(self, replacers: Vec<Replacer>) -> Self {
    self.push(Step::Replace(replacers))
  }

  pub fn lint(self, config: LintConfig) -> Self {
    self.push(Step::Lint(config))
  }

  pub fn coverage(self, name: impl Into<String>) -> Self {
    self.push(Step::Coverage { name: name.into() })
  }

  pub fn compress(self, options: CompressOptions) -> Self {
    self.push(Step::Compress(options))
  }

  pub fn write(self, path: PathBuf) -> Self {
    self.push(Step::Write(path))
  }

  /// Run every step in order.
  pub async fn run(self) -> Result<QueueOutput, QueueError> {
    execute::run(self).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builder_keeps_declaration_order() {
    let queue = Queue::new("foo")
      .read(vec![PathBuf::from("a.js")])
      .concat()
      .lint(LintConfig::default())
      .write(PathBuf::from("out.js"))
      .compress(CompressOptions::js())
      .write(PathBuf::from("out-min.js"));

    assert_eq!(
      queue.step_names(),
      vec!["read", "concat", "lint", "write", "compressor", "write"]
    );
    assert_eq!(queue.label(), "foo");
  }
}
