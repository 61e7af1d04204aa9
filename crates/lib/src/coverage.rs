//! Line coverage instrumentation.
//!
//! Produces scripts in the `_yuitest_coverage` format: a prelude that
//! registers the file's source lines and a hit counter per executable line,
//! followed by the source with a `_yuitest_coverline` call at the start of
//! each line that begins a statement.
//!
//! Statement detection is lexical. Braces are classified as blocks or object
//! literals from the token before them, and only lines directly inside a block,
//! outside any open parenthesis or bracket, and following `;`, `{` or a
//! closing block brace are instrumented. Lines that are skipped stay valid.

use serde_json::{Map, Value};

use crate::lint::mask;

const PRELUDE: &str = r#"if (typeof _yuitest_coverage == "undefined"){
    _yuitest_coverage = {};
    _yuitest_coverline = function(src, line){
        var coverage = _yuitest_coverage[src];
        if (!coverage.lines[line]){
            coverage.calledLines++;
        }
        coverage.lines[line]++;
    };
}
"#;

/// Key a module's counters are registered under.
pub fn coverage_key(name: &str) -> String {
  format!("build/{0}/{0}.js", name)
}

/// Instrument `source` for line coverage under [`coverage_key`]`(name)`.
pub fn instrument(source: &str, name: &str) -> String {
  let key = coverage_key(name);
  let quoted_key = Value::String(key.clone()).to_string();
  let lines: Vec<&str> = source.lines().collect();
  let starts = statement_lines(&mask(source));

  let executable: Vec<usize> = starts
    .iter()
    .enumerate()
    .filter(|&(_, is_start)| *is_start)
    .map(|(idx, _)| idx + 1)
    .collect();

  let hits: Map<String, Value> = executable
    .iter()
    .map(|line| (line.to_string(), Value::from(0)))
    .collect();
  let code = Value::from(lines.iter().map(|l| l.to_string()).collect::<Vec<_>>());

  let mut out = String::from(PRELUDE);
  out.push_str(&format!(
    "_yuitest_coverage[{k}] = {{\n    lines: {{}},\n    functions: {{}},\n    coveredLines: {n},\n    calledLines: 0,\n    coveredFunctions: 0,\n    calledFunctions: 0,\n    path: {k},\n    code: []\n}};\n",
    k = quoted_key,
    n = executable.len()
  ));
  out.push_str(&format!("_yuitest_coverage[{}].code={};\n", quoted_key, code));
  out.push_str(&format!(
    "_yuitest_coverage[{}].lines = {};\n",
    quoted_key,
    Value::Object(hits)
  ));

  for (idx, line) in lines.iter().enumerate() {
    if idx > 0 {
      out.push('\n');
    }
    if starts.get(idx).copied().unwrap_or(false) {
      let body = line.trim_start();
      let indent = &line[..line.len() - body.len()];
      out.push_str(&format!(
        "{}_yuitest_coverline({}, {}); {}",
        indent,
        quoted_key,
        idx + 1,
        body
      ));
    } else {
      out.push_str(line);
    }
  }
  if source.ends_with('\n') {
    out.push('\n');
  }

  out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Brace {
  Block,
  Object,
}

struct Frame {
  kind: Brace,
  /// Open parentheses and brackets since this brace.
  depth: usize,
}

/// Keywords that continue the previous statement.
const CONTINUATIONS: [&str; 6] = ["else", "catch", "finally", "case", "default", "while"];

/// One flag per line of `masked`: does a statement begin there?
fn statement_lines(masked: &str) -> Vec<bool> {
  let mut frames = vec![Frame {
    kind: Brace::Block,
    depth: 0,
  }];
  let mut quote: Option<char> = None;
  let mut prev: Option<char> = None;
  let mut last_closed = Brace::Block;
  let mut word = String::new();
  let mut in_word = false;
  let mut starts = Vec::new();

  for line in masked.lines() {
    let body = line.trim_start();
    let top = frames.last().map(|f| (f.kind, f.depth));
    let at_boundary = match prev {
      None | Some(';') | Some('{') => true,
      Some('}') => last_closed == Brace::Block,
      _ => false,
    };

    starts.push(
      quote.is_none()
        && top == Some((Brace::Block, 0))
        && at_boundary
        && begins_statement(body),
    );

    for ch in line.chars() {
      if let Some(q) = quote {
        if ch == q {
          quote = None;
          prev = Some(ch);
        }
        continue;
      }

      if ch.is_whitespace() {
        in_word = false;
        continue;
      }

      if is_ident(ch) {
        if !in_word {
          word.clear();
        }
        word.push(ch);
        in_word = true;
        prev = Some(ch);
        continue;
      }

      in_word = false;
      match ch {
        '\'' | '"' | '`' => quote = Some(ch),
        '{' => {
          let kind = brace_kind(prev, &word);
          frames.push(Frame { kind, depth: 0 });
        }
        '}' => {
          if frames.len() > 1
            && let Some(frame) = frames.pop()
          {
            last_closed = frame.kind;
          }
        }
        '(' | '[' => {
          if let Some(frame) = frames.last_mut() {
            frame.depth += 1;
          }
        }
        ')' | ']' => {
          if let Some(frame) = frames.last_mut() {
            frame.depth = frame.depth.saturating_sub(1);
          }
        }
        _ => {}
      }
      word.clear();
      prev = Some(ch);
    }

    // Only template literals span lines.
    if quote.is_some_and(|q| q != '`') {
      quote = None;
    }
    in_word = false;
  }

  starts
}

fn brace_kind(prev: Option<char>, word: &str) -> Brace {
  match prev {
    None | Some(';') | Some('{') | Some('}') | Some(')') | Some('>') => Brace::Block,
    Some(c) if is_ident(c) => match word {
      "else" | "try" | "finally" | "do" => Brace::Block,
      _ => Brace::Object,
    },
    _ => Brace::Object,
  }
}

fn begins_statement(body: &str) -> bool {
  let Some(first) = body.chars().next() else {
    return false;
  };
  if matches!(first, '}' | ')' | ']' | '.' | ',' | ':' | '?') {
    return false;
  }

  let keyword: String = body.chars().take_while(|c| is_ident(*c)).collect();
  !CONTINUATIONS.contains(&keyword.as_str())
}

fn is_ident(ch: char) -> bool {
  ch.is_alphanumeric() || ch == '_' || ch == '$'
}
