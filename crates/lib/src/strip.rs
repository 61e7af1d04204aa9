//! Logging-statement stripping.
//!
//! Production builds drop `Y.log(...)` and `logger` calls; the debug build
//! keeps them. The default pattern matches a logging call through to the end
//! of its statement, including calls spanning several lines.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::descriptor::LogPattern;

/// A user-supplied pattern that does not compile.
#[derive(Debug, Error)]
#[error("invalid pattern '{pattern}': {source}")]
pub struct RegexError {
  pub pattern: String,
  #[source]
  pub source: regex::Error,
}

/// Source of the default pattern.
pub const DEFAULT_LOG_PATTERN: &str = r"^.*?(?:logger|Y.log).*?(?:;|\).*;|(?:\r?\n.*?)*?\).*;).*;?.*?\r?\n";

static DEFAULT_LOG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
  RegexBuilder::new(DEFAULT_LOG_PATTERN)
    .multi_line(true)
    .build()
    .expect("default log pattern is a valid regex")
});

/// The compiled default pattern.
pub fn default_log_regex() -> &'static Regex {
  &DEFAULT_LOG_REGEX
}

/// Compile a user pattern the way every replace rule is compiled: multi-line.
pub fn compile_pattern(pattern: &str) -> Result<Regex, RegexError> {
  RegexBuilder::new(pattern)
    .multi_line(true)
    .build()
    .map_err(|source| RegexError {
      pattern: pattern.to_string(),
      source,
    })
}

/// Rewrite a replacement written for `String.prototype.replace` into the
/// expansion syntax of [`Regex::replace_all`].
///
/// `$n` and `$nn` name a group only when `regex` has that many groups, the
/// way scripts read them, so `$1_x` is group 1 followed by `_x`. `$&` is the
/// whole match and `$<name>` a named group. Any other `$` is literal.
pub fn script_replacement(replacement: &str, regex: &Regex) -> String {
  let groups = regex.captures_len() - 1;
  let chars: Vec<char> = replacement.chars().collect();
  let mut out = String::with_capacity(replacement.len());
  let mut i = 0;

  while i < chars.len() {
    if chars[i] != '$' {
      out.push(chars[i]);
      i += 1;
      continue;
    }

    let next = chars.get(i + 1).copied();
    match next {
      Some('$') => {
        out.push_str("$$");
        i += 2;
      }
      Some('&') => {
        out.push_str("${0}");
        i += 2;
      }
      Some('<') => match chars[i + 2..].iter().position(|&c| c == '>') {
        Some(len) => {
          let name: String = chars[i + 2..i + 2 + len].iter().collect();
          out.push_str(&format!("${{{}}}", name));
          i += len + 3;
        }
        None => {
          out.push_str("$$");
          i += 1;
        }
      },
      Some(first) if first.is_ascii_digit() => {
        let one = first.to_digit(10).unwrap_or(0) as usize;
        let two = chars
          .get(i + 2)
          .and_then(|c| c.to_digit(10))
          .map(|second| one * 10 + second as usize);

        match two {
          Some(group) if (1..=groups).contains(&group) => {
            out.push_str(&format!("${{{}}}", group));
            i += 3;
          }
          _ if (1..=groups).contains(&one) => {
            out.push_str(&format!("${{{}}}", one));
            i += 2;
          }
          _ => {
            out.push_str("$$");
            i += 1;
          }
        }
      }
      _ => {
        out.push_str("$$");
        i += 1;
      }
    }
  }

  out
}

/// The stripping regex for a module, or `None` when stripping is disabled.
pub fn log_regex(setting: &LogPattern) -> Result<Option<Regex>, RegexError> {
  match setting {
    LogPattern::Default | LogPattern::Enabled(true) => Ok(Some(default_log_regex().clone())),
    LogPattern::Enabled(false) => Ok(None),
    LogPattern::Custom(pattern) if pattern.is_empty() => Ok(None),
    LogPattern::Custom(pattern) => compile_pattern(pattern).map(Some),
  }
}

/// Remove every match of `regex` from `source`.
pub fn strip_logging(source: &str, regex: &Regex) -> String {
  regex.replace_all(source, "").into_owned()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn expand(pattern: &str, replacement: &str, input: &str) -> String {
    let regex = compile_pattern(pattern).unwrap();
    regex.replace_all(input, script_replacement(replacement, &regex).as_str()).into_owned()
  }

  #[test]
  fn group_reference_followed_by_word_characters() {
    assert_eq!(
      expand(r"(@\w+@)", "$1_suffix", "var v = '@VERSION@';"),
      "var v = '@VERSION@_suffix';"
    );
  }

  #[test]
  fn script_replacement_references() {
    assert_eq!(expand("b+", "[$&]", "abbc"), "a[bb]c");
    assert_eq!(expand("(a)(b)", "$2$1", "ab"), "ba");
    assert_eq!(expand("(?P<word>x)", "<$<word>>", "x"), "<x>");
    assert_eq!(expand("x", "$$1", "x"), "$1");
    assert_eq!(expand("(x)", "$0 $9 $", "x"), "$0 $9 $");
  }

  #[test]
  fn two_digit_reference_needs_that_many_groups() {
    assert_eq!(expand("(a)", "$10", "a"), "a0");
    let twelve = "(a)(b)(c)(d)(e)(f)(g)(h)(i)(j)(k)(l)";
    assert_eq!(expand(twelve, "$12", "abcdefghijkl"), "l");
  }

  #[test]
  fn strips_single_line_calls() {
    let source = "var a = 1;\nY.log('hello', 'info', NAME);\nvar b = 2;\n";
    assert_eq!(strip_logging(source, default_log_regex()), "var a = 1;\nvar b = 2;\n");
  }

  #[test]
  fn strips_multi_line_calls() {
    let source = "start();\n    Y.log('a very long message ' +\n        value, 'warn', NAME);\nend();\n";
    assert_eq!(strip_logging(source, default_log_regex()), "start();\nend();\n");
  }

  #[test]
  fn strips_logger_calls() {
    let source = "if (x) {\n    this.logger.info('x');\n}\n";
    assert_eq!(strip_logging(source, default_log_regex()), "if (x) {\n}\n");
  }

  #[test]
  fn keeps_non_matching_lines_in_order() {
    let source = "one();\nY.log('x');\ntwo();\nY.log('y');\nthree();\n";
    let stripped = strip_logging(source, default_log_regex());
    assert_eq!(stripped, "one();\ntwo();\nthree();\n");
    assert!(!stripped.contains("Y.log"));
  }

  #[test]
  fn disabled_setting_has_no_regex() {
    assert!(log_regex(&LogPattern::Enabled(false)).unwrap().is_none());
    assert!(log_regex(&LogPattern::Custom(String::new())).unwrap().is_none());
  }

  #[test]
  fn default_settings_use_default_pattern() {
    let regex = log_regex(&LogPattern::Default).unwrap().unwrap();
    assert_eq!(regex.as_str(), DEFAULT_LOG_PATTERN);
    let regex = log_regex(&LogPattern::Enabled(true)).unwrap().unwrap();
    assert_eq!(regex.as_str(), DEFAULT_LOG_PATTERN);
  }

  #[test]
  fn custom_pattern_overrides_default() {
    let regex = log_regex(&LogPattern::Custom(r"^.*?console\.log.*?;\n".to_string()))
      .unwrap()
      .unwrap();
    let source = "console.log('x');\nY.log('kept');\n";
    assert_eq!(strip_logging(source, &regex), "Y.log('kept');\n");
  }

  #[test]
  fn invalid_custom_pattern_is_an_error() {
    let err = log_regex(&LogPattern::Custom("(unclosed".to_string())).unwrap_err();
    assert_eq!(err.pattern, "(unclosed");
  }
}
