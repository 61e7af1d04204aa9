//! `build.json` model.
//!
//! A build file maps module names to [`ModuleDescriptor`]s and rollup names
//! to [`RollupDescriptor`]s:
//!
//! ```json
//! {
//!   "name": "widget",
//!   "builds": {
//!     "widget-base": {
//!       "jsfiles": ["widget-base.js"],
//!       "cssfiles": ["widget-base.css"],
//!       "config": { "requires": ["node"], "skinnable": true, "lang": ["en", "fr"] }
//!     }
//!   },
//!   "rollups": {
//!     "widget": { "files": ["widget-base"], "config": {} }
//!   }
//! }
//! ```
//!
//! Both maps keep declaration order, as does the `config` block, which is
//! serialized verbatim into the built artifact.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form `config` block of a module.
///
/// Only `skinnable` and `lang` drive the build; every key, known or not, is
/// written into the module registration call.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleConfig(pub Map<String, Value>);

impl ModuleConfig {
  /// True only for an explicit `"skinnable": true`.
  pub fn skinnable(&self) -> bool {
    self.0.get("skinnable").and_then(Value::as_bool).unwrap_or(false)
  }

  /// Declared translation languages, or `None` when `lang` is absent.
  ///
  /// Non-string entries are ignored.
  pub fn languages(&self) -> Option<Vec<String>> {
    let langs = self.0.get("lang")?.as_array()?;
    Some(langs.iter().filter_map(Value::as_str).map(str::to_string).collect())
  }
}

impl From<Map<String, Value>> for ModuleConfig {
  fn from(map: Map<String, Value>) -> Self {
    Self(map)
  }
}

/// The `regex` override for logging-statement stripping.
///
/// `"regex": false` turns stripping off, `"regex": "<pattern>"` replaces the
/// default pattern, and `true` or an absent key keeps the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogPattern {
  #[default]
  #[serde(skip)]
  Default,
  Enabled(bool),
  Custom(String),
}

impl LogPattern {
  pub fn is_disabled(&self) -> bool {
    matches!(self, LogPattern::Enabled(false))
  }
}

/// One buildable module.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
  /// Module name. Filled from the `builds` key when loaded from a build file.
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub name: String,

  /// Script sources, relative to the module directory or its `js/` folder.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub jsfiles: Option<Vec<String>>,

  /// Stylesheet sources, relative to the module directory or its `css/` folder.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cssfiles: Option<Vec<String>>,

  /// Files whose contents go before the stamped script.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub prependfiles: Option<Vec<String>>,

  /// Files whose contents go after the stamped script.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub appendfiles: Option<Vec<String>>,

  #[serde(default)]
  pub config: ModuleConfig,

  /// Ordered regex -> replacement rules applied to the script before lint.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub replace: Option<IndexMap<String, String>>,

  #[serde(default, skip_serializing_if = "is_default_pattern")]
  pub regex: LogPattern,

  /// Shell commands to run before any pipeline starts.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub exec: Option<Vec<String>>,
}

/// An umbrella module concatenating other modules' debug builds.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupDescriptor {
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub name: String,

  /// Names of the modules to aggregate, in output order.
  #[serde(default)]
  pub files: Vec<String>,

  #[serde(default)]
  pub config: ModuleConfig,

  #[serde(default, skip_serializing_if = "is_default_pattern")]
  pub regex: LogPattern,
}

/// Contents of a `build.json`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildFile {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,

  #[serde(default)]
  pub builds: IndexMap<String, ModuleDescriptor>,

  #[serde(default)]
  pub rollups: IndexMap<String, RollupDescriptor>,
}

fn is_default_pattern(pattern: &LogPattern) -> bool {
  matches!(pattern, LogPattern::Default)
}
