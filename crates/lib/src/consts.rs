//! Constants shared across the pipelines.

/// Name of the build description file looked up in the module directory.
pub const BUILD_FILE: &str = "build.json";

/// Build output root, relative to the module source directory.
pub const DEFAULT_BUILD_DIR: &str = "../../build";

/// Line width at which minified stylesheets are broken after a rule.
pub const LINE_BREAK: usize = 6000;

/// Subdirectory holding script sources.
pub const JS_DIR: &str = "js";

/// Subdirectory holding stylesheet sources.
pub const CSS_DIR: &str = "css";

/// Subdirectory holding translation strings.
pub const LANG_DIR: &str = "lang";

/// Subdirectory holding skin assets.
pub const ASSETS_DIR: &str = "assets";

/// Subdirectory of [`ASSETS_DIR`] with one directory per skin.
pub const SKINS_DIR: &str = "skins";

/// Version token left in artifacts for the release tooling to fill in.
pub const VERSION_TOKEN: &str = "@VERSION@";

/// Global the localization template binds the library instance to.
pub const YUI_VAR: &str = "Y";
