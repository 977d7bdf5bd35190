//! Line-level grammar for PKGBUILD assignments.
//!
//! Only column-0 `name=value` lines are recognized. Indented lines (function
//! bodies), comments and `name+=` appends never match. A value that leaves a
//! `(` or a quote open, or ends in a `\` continuation, spans the following
//! lines until it closes; those continuation lines belong to it and are never
//! indexed on their own.

/// One top-level assignment in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Assignment {
    pub name: String,
    /// Index of the line holding `name=`
    pub first_line: usize,
    /// Number of lines the assignment covers (more than one for multi-line arrays)
    pub line_count: usize,
    /// Everything after `=` on the first line, without the line terminator
    pub value: String,
}

impl Assignment {
    pub fn is_multiline(&self) -> bool {
        self.line_count > 1
    }
}

/// Split a stored line into its body and its terminator (`\n`, `\r\n` or nothing).
pub(super) fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

fn parse_assignment(body: &str) -> Option<(&str, &str)> {
    let (name, value) = body.split_once('=')?;
    let mut chars = name.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((name, value))
}

/// Lexical state carried from one line of a value to the next.
#[derive(Debug, Default)]
struct Continuation {
    depth: i32,
    quote: Option<char>,
    escaped_newline: bool,
}

impl Continuation {
    /// Scan one line, ignoring parentheses inside quotes and comments.
    fn feed(&mut self, text: &str) {
        let mut escaped = false;
        let mut prev = ' ';

        for c in text.chars() {
            if escaped {
                escaped = false;
            } else if let Some(q) = self.quote {
                if c == q {
                    self.quote = None;
                } else if c == '\\' && q == '"' {
                    escaped = true;
                }
            } else {
                match c {
                    '\\' => escaped = true,
                    '\'' | '"' => self.quote = Some(c),
                    '#' if prev.is_whitespace() || prev == '(' => break,
                    '(' => self.depth += 1,
                    ')' => self.depth -= 1,
                    _ => {}
                }
            }
            prev = c;
        }
        self.escaped_newline = escaped;
    }

    fn is_open(&self) -> bool {
        self.depth > 0 || self.quote.is_some() || self.escaped_newline
    }
}

/// Index every top-level assignment in `lines`.
pub(super) fn index(lines: &[String]) -> Vec<Assignment> {
    let mut assignments = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let (body, _) = split_terminator(&lines[i]);
        let Some((name, value)) = parse_assignment(body) else {
            i += 1;
            continue;
        };

        let mut line_count = 1;
        let mut state = Continuation::default();
        state.feed(value);
        while state.is_open() && i + line_count < lines.len() {
            let (continuation, _) = split_terminator(&lines[i + line_count]);
            state.feed(continuation);
            line_count += 1;
        }

        assignments.push(Assignment {
            name: name.to_string(),
            first_line: i,
            line_count,
            value: value.to_string(),
        });
        i += line_count;
    }

    assignments
}

/// Elements of a single-line array value such as `('a' "b" c)`.
///
/// Returns `None` if `value` is not a complete parenthesized array.
pub(super) fn array_elements(value: &str) -> Option<Vec<String>> {
    let inner = value.trim_end().strip_prefix('(')?.strip_suffix(')')?;

    let mut elements = Vec::new();
    let mut current = String::new();
    let mut in_element = false;
    let mut quote: Option<char> = None;

    for c in inner.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                in_element = true;
            }
            None if c.is_whitespace() => {
                if in_element {
                    elements.push(std::mem::take(&mut current));
                    in_element = false;
                }
            }
            None => {
                current.push(c);
                in_element = true;
            }
        }
    }

    if quote.is_some() {
        return None;
    }
    if in_element {
        elements.push(current);
    }
    Some(elements)
}
