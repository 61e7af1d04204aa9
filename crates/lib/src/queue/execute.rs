//! Queue execution.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, trace};

use crate::compress::compress;
use crate::coverage::instrument;
use crate::lint::{LintReport, lint};

use super::types::{Blob, QueueError, QueueOutput, StepError};
use super::{Queue, Step};

pub(super) async fn run(queue: Queue) -> Result<QueueOutput, QueueError> {
  let Queue { label, steps } = queue;
  let mut blobs: Vec<Blob> = Vec::new();
  let mut output = QueueOutput::default();

  for (index, step) in steps.into_iter().enumerate() {
    let name = step.name();
    trace!(queue = %label, step = name, index, blobs = blobs.len(), "running step");

    blobs = run_step(step, blobs, &label, &mut output)
      .await
      .map_err(|source| QueueError {
        step: name,
        index,
        source,
      })?;
  }

  debug!(queue = %label, written = output.written.len(), "queue complete");
  Ok(output)
}

async fn run_step(
  step: Step,
  mut blobs: Vec<Blob>,
  label: &str,
  output: &mut QueueOutput,
) -> Result<Vec<Blob>, StepError> {
  match step {
    Step::Read(paths) => {
      for path in paths {
        let content = read_file(&path).await?;
        blobs.push(Blob::new(path.display().to_string(), content));
      }
      Ok(blobs)
    }

    Step::Source(blob) => {
      blobs.push(blob);
      Ok(blobs)
    }

    Step::Concat => Ok(vec![Blob::new(label, join(&blobs))]),

    Step::JsStamp(stamp) => Ok(map_content(blobs, |content| stamp.apply(content))),

    Step::CssStamp(stamp) => Ok(map_content(blobs, |content| stamp.apply(content))),

    Step::Wrap { prepend, append } => {
      let before = read_all(&prepend).await?;
      let after = read_all(&append).await?;
      Ok(map_content(blobs, |content| format!("{}{}{}", before, content, after)))
    }

    Step::Replace(replacers) => Ok(map_content(blobs, |content| {
      replacers
        .iter()
        .fold(content.to_string(), |text, replacer| replacer.apply(&text))
    })),

    Step::Lint(config) => {
      for blob in &blobs {
        output.lint.push(LintReport {
          name: blob.name.clone(),
          findings: lint(&blob.content, &config),
        });
      }
      Ok(blobs)
    }

    Step::Coverage { name } => Ok(map_content(blobs, |content| instrument(content, &name))),

    Step::Compress(options) => {
      let mut compressed = Vec::with_capacity(blobs.len());
      for blob in blobs {
        let content = compress(&blob.content, &options).map_err(|source| StepError::Compress {
          name: blob.name.clone(),
          source,
        })?;
        compressed.push(Blob { content, ..blob });
      }
      Ok(compressed)
    }

    Step::Write(path) => {
      let [blob] = blobs.as_slice() else {
        return Err(StepError::BlobCount {
          path,
          count: blobs.len(),
        });
      };
      write_file(&path, &blob.content).await?;
      output.written.push(path);
      Ok(blobs)
    }
  }
}

/// Join blobs, adding a newline between two only when the first lacks one.
fn join(blobs: &[Blob]) -> String {
  let mut out = String::new();
  for blob in blobs {
    if !out.is_empty() && !out.ends_with('\n') {
      out.push('\n');
    }
    out.push_str(&blob.content);
  }
  out
}

fn map_content(blobs: Vec<Blob>, f: impl Fn(&str) -> String) -> Vec<Blob> {
  blobs
    .into_iter()
    .map(|blob| Blob {
      content: f(&blob.content),
      name: blob.name,
    })
    .collect()
}

async fn read_file(path: &Path) -> Result<String, StepError> {
  fs::read_to_string(path).await.map_err(|source| StepError::Read {
    path: path.to_path_buf(),
    source,
  })
}

async fn read_all(paths: &[PathBuf]) -> Result<String, StepError> {
  let mut out = String::new();
  for path in paths {
    out.push_str(&read_file(path).await?);
  }
  Ok(out)
}

async fn write_file(path: &Path, content: &str) -> Result<(), StepError> {
  let to_error = |source| StepError::Write {
    path: path.to_path_buf(),
    source,
  };

  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).await.map_err(to_error)?;
  }
  fs::write(path, content).await.map_err(to_error)
}
