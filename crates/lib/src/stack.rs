//! Completion stack: wait for a set of concurrent operations.
//!
//! Operations are registered with [`Stack::add`] and start running on the
//! tokio runtime right away. [`Stack::done`] consumes the stack, so it
//! resolves exactly once, after every registered operation has finished,
//! whatever order they finish in. With nothing registered it resolves
//! immediately.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use tokio::task::{Id, JoinSet};
use tracing::error;

/// A set of spawned operations producing `T`.
pub struct Stack<T> {
  tasks: JoinSet<(usize, T)>,
  indices: HashMap<Id, usize>,
  added: usize,
}

/// An operation that panicked instead of producing a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panic {
  /// Registration index of the operation.
  pub index: usize,
  pub message: String,
}

impl fmt::Display for Panic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.message)
  }
}

/// Outcome of [`Stack::done`].
#[derive(Debug)]
pub struct Joined<T> {
  /// Results of the operations that completed, in registration order.
  pub results: Vec<T>,
  /// Operations that panicked, in registration order.
  pub panicked: Vec<Panic>,
}

impl<T> Joined<T> {
  /// True when no operation panicked.
  pub fn is_clean(&self) -> bool {
    self.panicked.is_empty()
  }

  /// Every operation in registration order: its result, or its panic.
  pub fn into_ordered(self) -> Vec<Result<T, Panic>> {
    let total = self.results.len() + self.panicked.len();
    let mut results = self.results.into_iter();
    let mut panicked = self.panicked.into_iter().peekable();

    (0..total)
      .filter_map(|index| match panicked.peek() {
        Some(panic) if panic.index == index => panicked.next().map(Err),
        _ => results.next().map(Ok),
      })
      .collect()
  }
}

impl<T: Send + 'static> Stack<T> {
  pub fn new() -> Self {
    Self {
      tasks: JoinSet::new(),
      indices: HashMap::new(),
      added: 0,
    }
  }

  /// Register and start an operation.
  pub fn add<F>(&mut self, operation: F)
  where
    F: Future<Output = T> + Send + 'static,
  {
    let index = self.added;
    self.added += 1;
    let handle = self.tasks.spawn(async move { (index, operation.await) });
    self.indices.insert(handle.id(), index);
  }

  /// Operations still running.
  pub fn pending(&self) -> usize {
    self.tasks.len()
  }

  /// Wait for every registered operation.
  pub async fn done(mut self) -> Joined<T> {
    let mut results = Vec::with_capacity(self.added);
    let mut panicked = Vec::new();

    while let Some(joined) = self.tasks.join_next().await {
      match joined {
        Ok(result) => results.push(result),
        Err(e) => {
          let index = self.indices.get(&e.id()).copied().unwrap_or(usize::MAX);
          error!(error = %e, index, "operation panicked");
          panicked.push(Panic {
            index,
            message: e.to_string(),
          });
        }
      }
    }

    results.sort_by_key(|(index, _)| *index);
    panicked.sort_by_key(|panic| panic.index);
    Joined {
      results: results.into_iter().map(|(_, result)| result).collect(),
      panicked,
    }
  }
}

impl<T: Send + 'static> Default for Stack<T> {
  fn default() -> Self {
    Self::new()
  }
}
