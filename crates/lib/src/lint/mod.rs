//! Script linting.
//!
//! A small rule set checked line by line, selected through named severity
//! profiles. Findings are reported in the `{reason, evidence, line,
//! character}` shape consumers print to the console; they never fail a build.

mod scan;

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use scan::mask;

/// Named rule presets, from most to least permissive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LintProfile {
  Relaxed,
  #[default]
  Defaults,
  Preferred,
  Strict,
}

impl LintProfile {
  pub const ALL: [LintProfile; 4] = [
    LintProfile::Relaxed,
    LintProfile::Defaults,
    LintProfile::Preferred,
    LintProfile::Strict,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      LintProfile::Relaxed => "relaxed",
      LintProfile::Defaults => "defaults",
      LintProfile::Preferred => "preferred",
      LintProfile::Strict => "strict",
    }
  }
}

impl fmt::Display for LintProfile {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LintError {
  #[error("unknown lint profile '{0}' (expected one of: relaxed, defaults, preferred, strict)")]
  UnknownProfile(String),
}

impl FromStr for LintProfile {
  type Err = LintError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    LintProfile::ALL
      .into_iter()
      .find(|profile| profile.as_str() == s)
      .ok_or_else(|| LintError::UnknownProfile(s.to_string()))
  }
}

/// Which rules run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintConfig {
  pub profile: LintProfile,
  /// `debugger` statements.
  pub debugger: bool,
  /// Trailing commas before `}` or `]`.
  pub trailing_comma: bool,
  /// `==` / `!=` instead of `===` / `!==`.
  pub eqeqeq: bool,
  pub trailing_whitespace: bool,
  /// Tabs in indentation.
  pub tabs: bool,
  /// `console.*` calls.
  pub console: bool,
  pub max_len: Option<usize>,
}

impl LintConfig {
  pub fn for_profile(profile: LintProfile) -> Self {
    let at_least = |min: LintProfile| profile as u8 >= min as u8;

    Self {
      profile,
      debugger: true,
      trailing_comma: true,
      eqeqeq: at_least(LintProfile::Defaults),
      trailing_whitespace: at_least(LintProfile::Preferred),
      tabs: at_least(LintProfile::Preferred),
      console: at_least(LintProfile::Strict),
      max_len: at_least(LintProfile::Strict).then_some(150),
    }
  }
}

impl Default for LintConfig {
  fn default() -> Self {
    Self::for_profile(LintProfile::default())
  }
}

/// A single lint finding. `line` and `character` are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintFinding {
  pub reason: String,
  pub evidence: String,
  pub line: usize,
  pub character: usize,
}

/// Findings for one linted blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintReport {
  pub name: String,
  pub findings: Vec<LintFinding>,
}

impl LintReport {
  pub fn is_clean(&self) -> bool {
    self.findings.is_empty()
  }
}

static DEBUGGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bdebugger\b").expect("valid regex"));
static CONSOLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bconsole\s*\.").expect("valid regex"));
static LOOSE_EQ: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?:^|[^=!<>])(==|!=)(?:[^=]|$)").expect("valid regex"));
static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*[}\]]").expect("valid regex"));

/// Lint `source` with the rules enabled in `config`.
///
/// Findings are ordered by position.
pub fn lint(source: &str, config: &LintConfig) -> Vec<LintFinding> {
  let masked = mask(source);
  let lines: Vec<&str> = source.lines().collect();
  let masked_lines: Vec<&str> = masked.lines().collect();
  let mut findings = Vec::new();

  let mut report = |line_idx: usize, char_idx: usize, reason: String| {
    let evidence = lines.get(line_idx).map(|l| l.trim().to_string()).unwrap_or_default();
    findings.push(LintFinding {
      reason,
      evidence,
      line: line_idx + 1,
      character: char_idx + 1,
    });
  };

  for (idx, (raw, code)) in lines.iter().zip(masked_lines.iter()).enumerate() {
    let raw = raw.strip_suffix('\r').unwrap_or(raw);

    if config.debugger {
      for m in DEBUGGER.find_iter(code) {
        report(idx, char_offset(code, m.start()), "Unexpected 'debugger'.".to_string());
      }
    }

    if config.console {
      for m in CONSOLE.find_iter(code) {
        report(idx, char_offset(code, m.start()), "Unexpected 'console'.".to_string());
      }
    }

    if config.eqeqeq {
      for caps in LOOSE_EQ.captures_iter(code) {
        if let Some(op) = caps.get(1) {
          let strict = if op.as_str() == "==" { "===" } else { "!==" };
          report(
            idx,
            char_offset(code, op.start()),
            format!("Expected '{}' and instead saw '{}'.", strict, op.as_str()),
          );
        }
      }
    }

    if config.tabs {
      let indent: String = raw.chars().take_while(|c| c.is_whitespace()).collect();
      if let Some(pos) = indent.chars().position(|c| c == '\t') {
        report(idx, pos, "Unexpected tab in indentation.".to_string());
      }
    }

    if config.trailing_whitespace {
      let trimmed = raw.trim_end();
      if trimmed.len() < raw.len() {
        report(idx, trimmed.chars().count(), "Trailing whitespace.".to_string());
      }
    }

    if let Some(max) = config.max_len
      && raw.chars().count() > max
    {
      report(idx, max, format!("Line is longer than {} characters.", max));
    }
  }

  if config.trailing_comma {
    for m in TRAILING_COMMA.find_iter(&masked) {
      let (line_idx, char_idx) = position(&masked, m.start());
      report(line_idx, char_idx, "Unexpected trailing ','.".to_string());
    }
  }

  findings.sort_by_key(|f| (f.line, f.character));
  findings
}

/// Character index of a byte offset within a line.
fn char_offset(line: &str, byte: usize) -> usize {
  line[..byte].chars().count()
}

/// Zero-based (line, character) of a byte offset.
fn position(text: &str, byte: usize) -> (usize, usize) {
  let before = &text[..byte];
  let line = before.matches('\n').count();
  let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
  (line, before[line_start..].chars().count())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn reasons(findings: &[LintFinding]) -> Vec<&str> {
    findings.iter().map(|f| f.reason.as_str()).collect()
  }

  #[test]
  fn profile_names_round_trip() {
    for profile in LintProfile::ALL {
      assert_eq!(profile.as_str().parse::<LintProfile>().unwrap(), profile);
    }
    assert!(matches!("loose".parse::<LintProfile>(), Err(LintError::UnknownProfile(name)) if name == "loose"));
  }

  #[test]
  fn profiles_grow_stricter() {
    let relaxed = LintConfig::for_profile(LintProfile::Relaxed);
    let strict = LintConfig::for_profile(LintProfile::Strict);

    assert!(!relaxed.eqeqeq && !relaxed.console && relaxed.max_len.is_none());
    assert!(LintConfig::default().eqeqeq);
    assert!(!LintConfig::default().trailing_whitespace);
    assert!(LintConfig::for_profile(LintProfile::Preferred).tabs);
    assert!(strict.console && strict.max_len == Some(150));
  }

  #[test]
  fn clean_source_has_no_findings() {
    let source = "var a = 1;\nif (a === 1) {\n    go([1, 2], { b: 3 });\n}\n";
    assert!(lint(source, &LintConfig::for_profile(LintProfile::Strict)).is_empty());
  }

  #[test]
  fn reports_debugger_with_position() {
    let findings = lint("var a;\n  debugger;\n", &LintConfig::default());
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].reason, "Unexpected 'debugger'.");
    assert_eq!(findings[0].evidence, "debugger;");
    assert_eq!(findings[0].line, 2);
    assert_eq!(findings[0].character, 3);
  }

  #[test]
  fn reports_loose_equality() {
    let findings = lint("if (a == b && c != d && e === f) {}\n", &LintConfig::default());
    assert_eq!(
      reasons(&findings),
      vec![
        "Expected '===' and instead saw '=='.",
        "Expected '!==' and instead saw '!='."
      ]
    );
    assert_eq!(findings[0].character, 7);
  }

  #[test]
  fn ignores_strings_and_comments() {
    let source = "var s = 'a == b, debugger'; // c != d\n/* debugger */\n";
    assert!(lint(source, &LintConfig::default()).is_empty());
  }

  #[test]
  fn reports_trailing_comma_across_lines() {
    let source = "var o = {\n    a: 1,\n};\nvar l = [1, 2,];\n";
    let findings = lint(source, &LintConfig::for_profile(LintProfile::Relaxed));
    assert_eq!(findings.len(), 2);
    assert_eq!((findings[0].line, findings[0].character), (2, 9));
    assert_eq!((findings[1].line, findings[1].character), (4, 14));
  }

  #[test]
  fn whitespace_rules_only_in_preferred() {
    let source = "\tvar a = 1;  \n";
    assert!(lint(source, &LintConfig::default()).is_empty());

    let findings = lint(source, &LintConfig::for_profile(LintProfile::Preferred));
    assert_eq!(
      reasons(&findings),
      vec!["Unexpected tab in indentation.", "Trailing whitespace."]
    );
  }

  #[test]
  fn strict_reports_console_and_long_lines() {
    let long = format!("var a = '{}';\n", "x".repeat(200));
    let source = format!("console.log('x');\n{}", long);
    let findings = lint(&source, &LintConfig::for_profile(LintProfile::Strict));
    assert_eq!(
      reasons(&findings),
      vec!["Unexpected 'console'.", "Line is longer than 150 characters."]
    );
    assert_eq!(findings[1].character, 151);
  }
}
