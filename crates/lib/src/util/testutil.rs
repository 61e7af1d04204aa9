//! Test utilities for shifter-lib.
//!
//! [`ModuleTree`] lays out a throwaway source tree the way a component
//! checkout looks, with the build directory two levels up:
//!
//! ```text
//! <tmp>/src/<name>/   module sources (the working directory)
//! <tmp>/build/        build output
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use crate::pipeline::{BuildContext, BuildOptions};

pub struct ModuleTree {
  // Held so the directory lives as long as the tree.
  _temp: TempDir,
  root: PathBuf,
  build_dir: PathBuf,
}

impl ModuleTree {
  pub fn new(name: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("src").join(name);
    let build_dir = temp.path().join("build");
    std::fs::create_dir_all(&root).unwrap();

    Self {
      _temp: temp,
      root,
      build_dir,
    }
  }

  /// Module source directory.
  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn build_dir(&self) -> &Path {
    &self.build_dir
  }

  /// Write a source file relative to the module directory.
  pub fn write(&self, relative: &str, content: &str) -> PathBuf {
    write_file(&self.root.join(relative), content)
  }

  /// Write a file relative to the build directory.
  pub fn write_output(&self, relative: &str, content: &str) -> PathBuf {
    write_file(&self.build_dir.join(relative), content)
  }

  /// Read a file relative to the build directory.
  pub fn read_output(&self, relative: &str) -> String {
    let path = self.build_dir.join(relative);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {}: {}", path.display(), e))
  }

  pub fn context(&self, options: BuildOptions) -> Arc<BuildContext> {
    Arc::new(BuildContext::new(&self.root, &self.build_dir, options))
  }
}

fn write_file(path: &Path, content: &str) -> PathBuf {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(path, content).unwrap();
  path.to_path_buf()
}
