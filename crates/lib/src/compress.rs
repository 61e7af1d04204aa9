//! Script and stylesheet minification.
//!
//! Scripts go through minify-js first. Its output is kept only when it uses
//! no syntax the source did not already use; minify-js rewrites functions
//! into arrows and strings into template literals, which older script
//! engines cannot run. Sources it rejects as invalid are errors. When it
//! aborts on valid input or its output is too new, the script is compacted
//! instead: comments and insignificant whitespace are dropped and every
//! token is kept as written.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::LazyLock;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use minify_js::{Session, TopLevelMode};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::consts::LINE_BREAK;
use crate::lint::mask;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressKind {
  Js,
  Css,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressOptions {
  pub kind: CompressKind,
  /// Break minified stylesheets after a rule once a line reaches this many
  /// characters. `None` keeps the output on one line.
  pub line_break: Option<usize>,
}

impl CompressOptions {
  pub fn js() -> Self {
    Self {
      kind: CompressKind::Js,
      line_break: None,
    }
  }

  pub fn css() -> Self {
    Self {
      kind: CompressKind::Css,
      line_break: Some(LINE_BREAK),
    }
  }
}

#[derive(Debug, Error)]
pub enum CompressError {
  #[error("script minification failed: {0}")]
  Js(String),

  #[error("stylesheet minification failed: {0}")]
  Css(String),

  #[error("minified output is not valid UTF-8")]
  Utf8(#[from] std::string::FromUtf8Error),
}

pub fn compress(source: &str, options: &CompressOptions) -> Result<String, CompressError> {
  match options.kind {
    CompressKind::Js => minify_js(source),
    CompressKind::Css => {
      let css = minify_css(source)?;
      Ok(match options.line_break {
        Some(width) => break_lines(&css, width),
        None => css,
      })
    }
  }
}

pub fn minify_js(source: &str) -> Result<String, CompressError> {
  let minified = match catch_unwind(AssertUnwindSafe(|| run_minify_js(source))) {
    Ok(result) => result?,
    Err(panic) => {
      warn!(reason = %panic_reason(panic.as_ref()), "script minifier aborted, compacting instead");
      return Ok(compact_js(source));
    }
  };

  if uses_newer_syntax(&minified) && !uses_newer_syntax(source) {
    debug!("minified script uses newer syntax than its source, compacting instead");
    return Ok(compact_js(source));
  }

  Ok(minified)
}

fn run_minify_js(source: &str) -> Result<String, CompressError> {
  let session = Session::new();
  let mut out = Vec::new();

  minify_js::minify(&session, TopLevelMode::Global, source.as_bytes(), &mut out)
    .map_err(|e| CompressError::Js(e.to_string()))?;

  Ok(String::from_utf8(out)?)
}

fn panic_reason(payload: &(dyn std::any::Any + Send)) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    message.to_string()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "unknown panic".to_string()
  }
}

static NEWER_SYNTAX: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"=>|`|\b(?:let|const|class)\b").expect("valid regex"));

/// Arrow functions, template literals or block-scoped declarations outside
/// strings and comments.
fn uses_newer_syntax(script: &str) -> bool {
  NEWER_SYNTAX.is_match(&mask(script))
}

/// Keywords after which a `/` starts a regular expression literal.
const REGEX_KEYWORDS: [&str; 11] = [
  "return",
  "typeof",
  "case",
  "do",
  "else",
  "in",
  "instanceof",
  "new",
  "delete",
  "void",
  "throw",
];

fn is_word(ch: char) -> bool {
  ch.is_alphanumeric() || ch == '_' || ch == '$' || !ch.is_ascii()
}

/// Drop comments and whitespace that carry no meaning.
///
/// A line break survives unless the previous or next token makes it
/// irrelevant to semicolon insertion, so statements relying on it keep
/// their meaning. Strings, template literals and regular expressions are
/// copied untouched.
fn compact_js(source: &str) -> String {
  let chars: Vec<char> = source.chars().collect();
  let mut out = String::with_capacity(source.len());
  let mut word = String::new();
  let mut space = false;
  let mut newline = false;
  let mut i = 0;

  while i < chars.len() {
    let ch = chars[i];
    let next = chars.get(i + 1).copied();

    match ch {
      '/' if next == Some('/') => {
        while i < chars.len() && chars[i] != '\n' {
          i += 1;
        }
        continue;
      }
      '/' if next == Some('*') => {
        let body = i + 2;
        let end = (body..chars.len().saturating_sub(1))
          .find(|&j| chars[j] == '*' && chars[j + 1] == '/')
          .map_or(chars.len(), |j| j + 2);
        if chars[body.min(end)..end].contains(&'\n') {
          newline = true;
        } else {
          space = true;
        }
        i = end;
        continue;
      }
      '\n' => {
        newline = true;
        i += 1;
        continue;
      }
      c if c.is_whitespace() => {
        space = true;
        i += 1;
        continue;
      }
      _ => {}
    }

    let prev = out.chars().last();
    let gap = space || newline;
    if let Some(prev) = prev {
      if newline && !"{;,([".contains(prev) && !"})],.;?:".contains(ch) {
        out.push('\n');
      } else if gap && needs_space(prev, ch) {
        out.push(' ');
      }
    }
    space = false;
    newline = false;

    let end = match ch {
      '\'' | '"' | '`' => string_end(&chars, i, ch),
      '/' if regex_allowed(prev, &word) => regex_end(&chars, i),
      _ => i + 1,
    };
    out.extend(&chars[i..end]);

    if end == i + 1 && is_word(ch) {
      if gap || !prev.is_some_and(is_word) {
        word.clear();
      }
      word.push(ch);
    } else {
      word.clear();
    }
    i = end;
  }

  out
}

/// Whether two tokens separated by whitespace would fuse without it.
fn needs_space(prev: char, next: char) -> bool {
  (is_word(prev) && is_word(next))
    || (prev == '+' && next == '+')
    || (prev == '-' && next == '-')
    || (prev == '/' && (next == '/' || next == '*'))
    || (prev.is_ascii_digit() && next == '.')
}

fn regex_allowed(prev: Option<char>, word: &str) -> bool {
  match prev {
    None => true,
    Some(c) if is_word(c) => REGEX_KEYWORDS.contains(&word),
    Some(c) => "(,=:[!&|?{};~+-*%<>^".contains(c),
  }
}

/// Index just past the string starting at `start`. Unterminated single-line
/// strings end before the line break.
fn string_end(chars: &[char], start: usize, quote: char) -> usize {
  let mut j = start + 1;
  while j < chars.len() {
    match chars[j] {
      '\\' => j += 2,
      c if c == quote => return j + 1,
      '\n' if quote != '`' => return j,
      _ => j += 1,
    }
  }
  chars.len()
}

/// Index just past the regular expression literal starting at `start`,
/// before its flags.
fn regex_end(chars: &[char], start: usize) -> usize {
  let mut j = start + 1;
  let mut in_class = false;
  while j < chars.len() {
    match chars[j] {
      '\\' => j += 2,
      '[' => {
        in_class = true;
        j += 1;
      }
      ']' => {
        in_class = false;
        j += 1;
      }
      '/' if !in_class => return j + 1,
      '\n' => return j,
      _ => j += 1,
    }
  }
  chars.len()
}

pub fn minify_css(source: &str) -> Result<String, CompressError> {
  let mut stylesheet =
    StyleSheet::parse(source, ParserOptions::default()).map_err(|e| CompressError::Css(e.to_string()))?;

  stylesheet
    .minify(MinifyOptions::default())
    .map_err(|e| CompressError::Css(e.to_string()))?;

  let printed = stylesheet
    .to_css(PrinterOptions {
      minify: true,
      ..Default::default()
    })
    .map_err(|e| CompressError::Css(e.to_string()))?;

  Ok(printed.code)
}

/// Insert a newline after a closing brace once the current line is at least
/// `width` characters long. Braces inside quoted strings are ignored.
fn break_lines(css: &str, width: usize) -> String {
  let mut out = String::with_capacity(css.len() + css.len() / width.max(1));
  let mut line_len = 0;
  let mut quote: Option<char> = None;
  let mut escaped = false;

  for ch in css.chars() {
    out.push(ch);
    line_len += 1;

    if ch == '\n' {
      line_len = 0;
      continue;
    }

    match quote {
      Some(_) if escaped => escaped = false,
      Some(_) if ch == '\\' => escaped = true,
      Some(q) if ch == q => quote = None,
      Some(_) => {}
      None if ch == '"' || ch == '\'' => quote = Some(ch),
      None if ch == '}' && line_len >= width => {
        out.push('\n');
        line_len = 0;
      }
      None => {}
    }
  }

  out
}
