//! Template stamping.
//!
//! Scripts are wrapped in a `YUI.add` registration envelope carrying the
//! module config; stylesheets get a detection rule the loader can probe; the
//! localization template has six tokens substituted per language.

use regex::Regex;
use serde_json::Value;

use crate::consts::{VERSION_TOKEN, YUI_VAR};
use crate::descriptor::ModuleConfig;
use crate::paths::lang_module_name;
use crate::queue::Replacer;

/// Localization bundle template shipped with the crate.
pub const LANG_TEMPLATE: &str = include_str!("../files/langtemplate.txt");

/// Tokens of [`LANG_TEMPLATE`], in substitution order.
pub const LANG_TOKENS: [&str; 6] = [
  "@LANG_MODULE@",
  "@YUIVAR@",
  "@MODULE@",
  "@LANG@",
  "@STRINGS@",
  "@LANG_DETAILS@",
];

/// Serialize a config block for the registration call.
///
/// Compact JSON in declared key order, with a space after every `:` and `,`.
/// Separators inside string values are spaced too.
pub fn stringify_config(config: &ModuleConfig) -> String {
  Value::Object(config.0.clone())
    .to_string()
    .replace(':', ": ")
    .replace(',', ", ")
}

/// Prefix/postfix envelope applied around a concatenated script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsStamp {
  pub prefix: String,
  pub postfix: String,
  pub strict: bool,
}

impl JsStamp {
  /// Registration envelope for a module's own sources.
  pub fn module(name: &str, strict: bool, config: &ModuleConfig) -> Self {
    Self {
      prefix: format!("YUI.add('{}', function (Y, NAME) {{\n\n", name),
      postfix: format!("\n\n}}, '{}', {});\n", VERSION_TOKEN, stringify_config(config)),
      strict,
    }
  }

  /// Empty-bodied registration appended after a rollup's concatenated modules.
  pub fn rollup(name: &str, config: &ModuleConfig) -> Self {
    Self {
      prefix: String::new(),
      postfix: format!(
        "YUI.add('{}', function (Y, NAME) {{}}, '{}', {});\n",
        name,
        VERSION_TOKEN,
        stringify_config(config)
      ),
      strict: false,
    }
  }

  pub fn apply(&self, body: &str) -> String {
    let strict = if self.strict { "\"use strict\";\n\n" } else { "" };
    format!("{}{}{}{}", self.prefix, strict, body, self.postfix)
  }
}

/// CSS detection rule appended to a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssStamp(pub String);

impl CssStamp {
  pub fn module(name: &str) -> Self {
    Self(format!(
      "/* YUI CSS Detection Stamp */\n#yui3-css-stamp.{} {{ display: none; }}",
      name
    ))
  }

  pub fn skin(skin: &str, name: &str) -> Self {
    Self(format!(
      "/* YUI CSS Detection Stamp */\n#yui3-css-stamp.skin-{}-{} {{ display: none; }}",
      skin, name
    ))
  }

  pub fn apply(&self, css: &str) -> String {
    let separator = if css.is_empty() || css.ends_with('\n') { "" } else { "\n" };
    format!("{}{}{}\n", css, separator, self.0)
  }
}

/// Runtime values for the localization template tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangTokens {
  pub lang_module: String,
  pub yui_var: String,
  pub module: String,
  pub lang: String,
  pub strings: String,
  pub details: String,
}

impl LangTokens {
  pub fn new(name: &str, lang: &str, strings: String) -> Self {
    Self {
      lang_module: format!("lang/{}", lang_module_name(name, lang)),
      yui_var: YUI_VAR.to_string(),
      module: name.to_string(),
      lang: lang.to_string(),
      strings,
      details: String::new(),
    }
  }

  fn values(&self) -> [&str; 6] {
    [
      &self.lang_module,
      &self.yui_var,
      &self.module,
      &self.lang,
      &self.strings,
      &self.details,
    ]
  }

  /// One first-match literal replacer per token, in [`LANG_TOKENS`] order.
  pub fn replacers(&self) -> Vec<Replacer> {
    LANG_TOKENS
      .iter()
      .zip(self.values())
      .map(|(token, value)| {
        let regex = Regex::new(&regex::escape(token)).expect("escaped token is a valid regex");
        Replacer::first_literal(regex, value)
      })
      .collect()
  }

  /// Substitute every token of `template` once.
  pub fn substitute(&self, template: &str) -> String {
    self
      .replacers()
      .iter()
      .fold(template.to_string(), |text, replacer| replacer.apply(&text))
  }
}

/// Languages to build: the unlocalized default first, then each declared
/// language once.
pub fn build_languages(declared: &[String]) -> Vec<String> {
  let mut langs = vec![String::new()];
  for lang in declared {
    if !langs.contains(lang) {
      langs.push(lang.clone());
    }
  }
  langs
}
