//! Source masking for line-oriented analysis.

/// Blank out the contents of comments and string literals.
///
/// Every masked character becomes one space, quotes and newlines are kept,
/// so line and character positions in the result match the input. Regex
/// literals are not recognized; a quote inside one masks to end of line.
pub fn mask(source: &str) -> String {
  #[derive(Clone, Copy, PartialEq)]
  enum State {
    Code,
    LineComment,
    BlockComment,
    Str(char),
  }

  let mut out = String::with_capacity(source.len());
  let mut state = State::Code;
  let mut chars = source.chars().peekable();

  while let Some(ch) = chars.next() {
    match state {
      State::Code => match ch {
        '/' if chars.peek() == Some(&'/') => {
          chars.next();
          out.push_str("  ");
          state = State::LineComment;
        }
        '/' if chars.peek() == Some(&'*') => {
          chars.next();
          out.push_str("  ");
          state = State::BlockComment;
        }
        '\'' | '"' | '`' => {
          out.push(ch);
          state = State::Str(ch);
        }
        _ => out.push(ch),
      },

      State::LineComment => {
        if ch == '\n' {
          out.push('\n');
          state = State::Code;
        } else {
          out.push(' ');
        }
      }

      State::BlockComment => match ch {
        '*' if chars.peek() == Some(&'/') => {
          chars.next();
          out.push_str("  ");
          state = State::Code;
        }
        '\n' => out.push('\n'),
        _ => out.push(' '),
      },

      State::Str(quote) => match ch {
        '\\' => {
          out.push(' ');
          if let Some(&next) = chars.peek() {
            if next == '\n' {
              continue;
            }
            chars.next();
            out.push(' ');
          }
        }
        '\n' if quote != '`' => {
          out.push('\n');
          state = State::Code;
        }
        '\n' => out.push('\n'),
        c if c == quote => {
          out.push(c);
          state = State::Code;
        }
        _ => out.push(' '),
      },
    }
  }

  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn masks_strings_and_comments() {
    assert_eq!(mask("a = 'x==y'; // debugger"), "a = '    ';            ");
    assert_eq!(mask("/* a\nb */ c"), "    \n     c");
    assert_eq!(mask(r#"s = "q\"==";"#), r#"s = "     ";"#);
  }

  #[test]
  fn keeps_line_structure() {
    let source = "var a = `multi\nline`;\nb();";
    let masked = mask(source);
    assert_eq!(masked.lines().count(), source.lines().count());
    assert!(masked.ends_with("b();"));
  }

  #[test]
  fn unterminated_string_ends_at_newline() {
    assert_eq!(mask("x = 'abc\ny == z"), "x = '   \ny == z");
  }
}
