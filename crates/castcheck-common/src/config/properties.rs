//! Reader for `.properties` test data files.
//!
//! Follows the `java.util.Properties` line format: `=`, `:` or whitespace
//! separates key from value, `#` and `!` start comment lines, a trailing
//! backslash continues the logical line, and backslash escapes (`\t`, `\n`,
//! `\r`, `\f`, `\uXXXX`, and `\` before any other character) are decoded in
//! keys and values. Later duplicates replace earlier ones.

use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: HashMap<String, String>,
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{c}')
}

/// True when the line ends in an odd number of backslashes.
fn continues(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Join natural lines into logical lines, dropping comments and blanks.
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut natural = content.lines();
    while let Some(first) = natural.next() {
        let first = first.trim_start_matches(is_blank);
        if first.is_empty() || first.starts_with('#') || first.starts_with('!') {
            continue;
        }
        let mut logical = String::new();
        let mut current = first;
        loop {
            if !continues(current) {
                logical.push_str(current);
                break;
            }
            logical.push_str(&current[..current.len() - 1]);
            match natural.next() {
                Some(next) => current = next.trim_start_matches(is_blank),
                None => break,
            }
        }
        lines.push(logical);
    }
    lines
}

/// Decode backslash escapes. A malformed `\u` escape is kept as text.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                let digits = hex.len() == 4 && hex.chars().all(|c| c.is_ascii_hexdigit());
                let decoded = digits
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match decoded {
                    Some(decoded) => {
                        out.push(decoded);
                        for _ in 0..4 {
                            chars.next();
                        }
                    }
                    _ => out.push_str("\\u"),
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Split a logical line into its raw (still escaped) key and value.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (pos, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || is_blank(c) {
            key_end = pos;
            break;
        }
    }

    let rest = line[key_end..].trim_start_matches(is_blank);
    let rest = match rest.chars().next() {
        Some('=') | Some(':') => rest[1..].trim_start_matches(is_blank),
        _ => rest,
    };
    (&line[..key_end], rest)
}

impl Properties {
    pub fn parse(content: &str) -> Self {
        let entries = logical_lines(content)
            .iter()
            .map(|line| {
                let (key, value) = split_entry(line);
                (unescape(key), unescape(value))
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
