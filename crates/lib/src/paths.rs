//! Source path resolution and the build output layout.
//!
//! Every artifact path a pipeline writes is named here, so the on-disk
//! layout lives in one place:
//!
//! ```text
//! <build_dir>/<name>/<name>.js, <name>-debug.js, <name>-min.js, <name>-coverage.js
//! <build_dir>/<name>/<name>.css, <name>-min.css
//! <build_dir>/<name>/lang/<name>[_<lang>].js
//! <build_dir>/<name>/assets/<name>-core.css
//! <build_dir>/<name>/assets/skins/<skin>/<name>.css, <name>-skin.css
//! ```

use std::path::{Component, Path, PathBuf};

use crate::consts::{ASSETS_DIR, LANG_DIR, SKINS_DIR};

/// Resolve declared file references against the module directory.
///
/// Each entry is joined as `cwd/dir/file`, unless the entry already starts
/// with `dir` (optionally behind `./`), in which case `dir` is not added a
/// second time. Output order matches input order. `None` in gives `None` out.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use shifter_lib::paths::resolve;
///
/// let files = vec!["foo.js".to_string(), "js/bar.js".to_string()];
/// let resolved = resolve(Some(files.as_slice()), "js", Path::new("/src/foo")).unwrap();
/// assert_eq!(resolved[0], Path::new("/src/foo/js/foo.js"));
/// assert_eq!(resolved[1], Path::new("/src/foo/js/bar.js"));
/// ```
pub fn resolve(items: Option<&[String]>, dir: &str, cwd: &Path) -> Option<Vec<PathBuf>> {
  let items = items?;

  Some(
    items
      .iter()
      .map(|file| {
        let rooted = starts_with_dir(file, dir);
        let joined = if rooted || dir.is_empty() {
          cwd.join(file)
        } else {
          cwd.join(dir).join(file)
        };
        normalize(&joined)
      })
      .collect(),
  )
}

/// True when the first normal component of `file` is `dir`.
fn starts_with_dir(file: &str, dir: &str) -> bool {
  if dir.is_empty() {
    return false;
  }

  Path::new(file)
    .components()
    .find(|c| !matches!(c, Component::CurDir))
    .is_some_and(|c| c.as_os_str() == dir)
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component. Never touches the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
  let mut out = PathBuf::new();

  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        let popped = matches!(out.components().next_back(), Some(Component::Normal(_))) && out.pop();
        if !popped && !out.has_root() {
          out.push("..");
        }
      }
      other => out.push(other.as_os_str()),
    }
  }

  out
}

/// Output locations for a single module under the build directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
  root: PathBuf,
  name: String,
}

impl ArtifactLayout {
  pub fn new(build_dir: &Path, name: &str) -> Self {
    Self {
      root: build_dir.join(name),
      name: name.to_string(),
    }
  }

  /// `<build_dir>/<name>`
  pub fn dir(&self) -> &Path {
    &self.root
  }

  pub fn js(&self) -> PathBuf {
    self.root.join(format!("{}.js", self.name))
  }

  pub fn debug_js(&self) -> PathBuf {
    self.root.join(format!("{}-debug.js", self.name))
  }

  pub fn min_js(&self) -> PathBuf {
    self.root.join(format!("{}-min.js", self.name))
  }

  pub fn coverage_js(&self) -> PathBuf {
    self.root.join(format!("{}-coverage.js", self.name))
  }

  pub fn css(&self) -> PathBuf {
    self.root.join(format!("{}.css", self.name))
  }

  pub fn min_css(&self) -> PathBuf {
    self.root.join(format!("{}-min.css", self.name))
  }

  /// `lang/<lang_module>.js`, where `lang_module` is `<name>` or `<name>_<lang>`.
  pub fn lang(&self, lang_module: &str) -> PathBuf {
    self.root.join(LANG_DIR).join(format!("{}.js", lang_module))
  }

  pub fn core_css(&self) -> PathBuf {
    self.root.join(ASSETS_DIR).join(format!("{}-core.css", self.name))
  }

  /// Full skin variant: core rules plus the skin's own rules.
  pub fn skin_css(&self, skin: &str) -> PathBuf {
    self.skin_dir(skin).join(format!("{}.css", self.name))
  }

  /// Skin-only variant, without the core rules.
  pub fn skin_only_css(&self, skin: &str) -> PathBuf {
    self.skin_dir(skin).join(format!("{}-skin.css", self.name))
  }

  fn skin_dir(&self, skin: &str) -> PathBuf {
    self.root.join(ASSETS_DIR).join(SKINS_DIR).join(skin)
  }
}

/// Name of a localization module: `<name>` for the unlocalized default,
/// `<name>_<lang>` otherwise.
pub fn lang_module_name(name: &str, lang: &str) -> String {
  if lang.is_empty() {
    name.to_string()
  } else {
    format!("{}_{}", name, lang)
  }
}
