//! Types shared by queue construction and execution.

use std::path::PathBuf;

use regex::{NoExpand, Regex};
use thiserror::Error;

use crate::compress::CompressError;
use crate::lint::LintReport;

/// A named piece of text flowing through a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
  pub name: String,
  pub content: String,
}

impl Blob {
  pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      content: content.into(),
    }
  }
}

/// How a [`Replacer`] rewrites its matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceMode {
  /// Every match; `$1`/`${name}` in the replacement are expanded.
  All,
  /// First match only; the replacement is inserted verbatim.
  FirstLiteral,
}

/// A compiled find/replace rule.
#[derive(Debug, Clone)]
pub struct Replacer {
  regex: Regex,
  replacement: String,
  mode: ReplaceMode,
}

impl Replacer {
  pub fn all(regex: Regex, replacement: impl Into<String>) -> Self {
    Self {
      regex,
      replacement: replacement.into(),
      mode: ReplaceMode::All,
    }
  }

  /// Remove every match.
  pub fn strip(regex: Regex) -> Self {
    Self::all(regex, "")
  }

  pub fn first_literal(regex: Regex, replacement: impl Into<String>) -> Self {
    Self {
      regex,
      replacement: replacement.into(),
      mode: ReplaceMode::FirstLiteral,
    }
  }

  pub fn pattern(&self) -> &str {
    self.regex.as_str()
  }

  pub fn mode(&self) -> ReplaceMode {
    self.mode
  }

  pub fn apply(&self, text: &str) -> String {
    match self.mode {
      ReplaceMode::All => self.regex.replace_all(text, self.replacement.as_str()).into_owned(),
      ReplaceMode::FirstLiteral => self.regex.replace(text, NoExpand(&self.replacement)).into_owned(),
    }
  }
}

/// What a completed queue produced.
#[derive(Debug, Default, Clone)]
pub struct QueueOutput {
  /// Files written, in write order.
  pub written: Vec<PathBuf>,
  /// One report per blob linted.
  pub lint: Vec<LintReport>,
}

/// Failure of a single step.
#[derive(Debug, Error)]
pub enum StepError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("write to {path} expects exactly one blob, found {count}")]
  BlobCount { path: PathBuf, count: usize },

  #[error("failed to compress {name}: {source}")]
  Compress {
    name: String,
    #[source]
    source: CompressError,
  },
}

/// A queue run that stopped at a failing step.
#[derive(Debug, Error)]
#[error("{step} (step {index}): {source}")]
pub struct QueueError {
  /// Name of the failing step.
  pub step: &'static str,
  /// Position of the failing step in the queue.
  pub index: usize,
  #[source]
  pub source: StepError,
}
