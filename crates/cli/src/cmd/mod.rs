mod build;
mod list;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use shifter_lib::consts::BUILD_FILE;
use shifter_lib::descriptor::BuildFile;

pub use build::{BuildArgs, cmd_build};
pub use list::{ListArgs, cmd_list};

/// Where to find the build file.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
  /// Module source directory (default: current directory)
  #[arg(long)]
  pub cwd: Option<PathBuf>,

  /// Build file, relative to the module directory
  #[arg(short, long, default_value = BUILD_FILE)]
  pub config: PathBuf,
}

impl SourceArgs {
  /// Canonical module directory.
  pub fn module_dir(&self) -> Result<PathBuf> {
    let dir = match &self.cwd {
      Some(dir) => dir.clone(),
      None => std::env::current_dir().context("Failed to read current directory")?,
    };
    dunce::canonicalize(&dir).with_context(|| format!("Module directory not found: {}", dir.display()))
  }

  pub fn load(&self, module_dir: &Path) -> Result<(PathBuf, BuildFile)> {
    let path = module_dir.join(&self.config);
    let file = BuildFile::load(&path).with_context(|| format!("Failed to load {}", path.display()))?;
    Ok((path, file))
  }
}
