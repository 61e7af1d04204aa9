//! Module descriptors and `build.json` loading.

mod types;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

pub use types::{BuildFile, LogPattern, ModuleConfig, ModuleDescriptor, RollupDescriptor};

/// Errors raised while loading or validating a build file.
#[derive(Debug, Error)]
pub enum DescriptorError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("'{0}' is declared both as a build and as a rollup")]
  NameConflict(String),

  #[error("module name must not be empty")]
  EmptyName,

  #[error("no build or rollup named '{0}'")]
  UnknownModule(String),

  #[error("rollup dependency cycle detected")]
  CycleDetected,
}

impl BuildFile {
  /// Read and validate a `build.json`.
  pub fn load(path: &Path) -> Result<Self, DescriptorError> {
    let content = std::fs::read_to_string(path).map_err(|source| DescriptorError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let file = Self::parse(&content).map_err(|e| match e {
      DescriptorError::Parse { source, .. } => DescriptorError::Parse {
        path: path.to_path_buf(),
        source,
      },
      other => other,
    })?;

    debug!(
      path = %path.display(),
      builds = file.builds.len(),
      rollups = file.rollups.len(),
      "loaded build file"
    );

    Ok(file)
  }

  /// Parse build file JSON, filling every descriptor's `name` from its key.
  pub fn parse(content: &str) -> Result<Self, DescriptorError> {
    let mut file: BuildFile = serde_json::from_str(content).map_err(|source| DescriptorError::Parse {
      path: PathBuf::new(),
      source,
    })?;

    for (name, module) in file.builds.iter_mut() {
      module.name = name.clone();
    }
    for (name, rollup) in file.rollups.iter_mut() {
      rollup.name = name.clone();
    }

    file.validate()?;
    Ok(file)
  }

  fn validate(&self) -> Result<(), DescriptorError> {
    if self.builds.keys().chain(self.rollups.keys()).any(String::is_empty) {
      return Err(DescriptorError::EmptyName);
    }

    if let Some(name) = self.rollups.keys().find(|name| self.builds.contains_key(*name)) {
      return Err(DescriptorError::NameConflict(name.clone()));
    }

    Ok(())
  }

  /// Total number of buildable nodes.
  pub fn len(&self) -> usize {
    self.builds.len() + self.rollups.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Keep only the named builds and rollups, in declaration order.
  ///
  /// An empty selection keeps everything.
  pub fn select(&self, names: &[String]) -> Result<Self, DescriptorError> {
    if names.is_empty() {
      return Ok(self.clone());
    }

    if let Some(unknown) = names
      .iter()
      .find(|name| !self.builds.contains_key(*name) && !self.rollups.contains_key(*name))
    {
      return Err(DescriptorError::UnknownModule(unknown.clone()));
    }

    let wanted = |name: &String| names.contains(name);
    Ok(Self {
      name: self.name.clone(),
      builds: self
        .builds
        .iter()
        .filter(|(name, _)| wanted(name))
        .map(|(name, module)| (name.clone(), module.clone()))
        .collect(),
      rollups: self
        .rollups
        .iter()
        .filter(|(name, _)| wanted(name))
        .map(|(name, rollup)| (name.clone(), rollup.clone()))
        .collect(),
    })
  }
}
