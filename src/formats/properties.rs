//! Support for Java-style `.properties` files.
//!
//! Reading follows `java.util.Properties::load`: `#`/`!` comment lines, `=`,
//! `:` or whitespace separators, backslash line continuation and `\uXXXX`
//! escapes. Files are read and written as UTF-8.

use std::io::{BufRead, Read, Write};

use crate::{
    error::Error,
    traits::Parser,
    types::{Fragment, StringValue},
};

const HEADER: &str = "# This file was generated by locmerge.\n\n";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Format {
    pub pairs: Vec<(String, String)>,
}

impl Format {
    /// Plural values have no `.properties` representation and are skipped.
    pub fn from_fragment(fragment: &Fragment) -> Self {
        let pairs = fragment
            .iter()
            .filter_map(|(key, value)| match value {
                StringValue::Simple(text) => Some((key.clone(), text.clone())),
                StringValue::Plural(_) => None,
            })
            .collect();
        Format { pairs }
    }
}

impl Parser for Format {
    fn from_reader<R: BufRead>(mut reader: R) -> Result<Self, Error> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;

        let pairs = logical_lines(&content)
            .into_iter()
            .map(|line| split_pair(&line))
            .collect();
        Ok(Format { pairs })
    }

    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        let mut content = String::from(HEADER);
        for (key, value) in &self.pairs {
            content.push_str(&escape(key, true));
            content.push_str(" = ");
            content.push_str(&escape(value, false));
            content.push('\n');
        }
        writer.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl From<Format> for Fragment {
    fn from(format: Format) -> Self {
        format
            .pairs
            .into_iter()
            .map(|(key, value)| (key, StringValue::Simple(value)))
            .collect()
    }
}

/// Joins continuation lines and drops blanks and comments. Returned lines
/// are still escaped.
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending: Option<String> = None;

    for raw in content.lines() {
        let line = raw.trim_start_matches([' ', '\t', '\u{c}']);
        let line = match pending.take() {
            Some(mut joined) => {
                joined.push_str(line);
                joined
            }
            None => {
                if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                    continue;
                }
                line.to_string()
            }
        };

        let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
        if trailing % 2 == 1 {
            let mut line = line;
            line.pop();
            pending = Some(line);
        } else {
            lines.push(line);
        }
    }
    if let Some(line) = pending {
        lines.push(line);
    }
    lines
}

fn split_pair(line: &str) -> (String, String) {
    let mut key_end = line.len();
    let mut escaped = false;
    for (index, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\u{c}' => {
                key_end = index;
                break;
            }
            _ => {}
        }
    }

    let (key, rest) = line.split_at(key_end);
    let rest = rest.trim_start_matches([' ', '\t', '\u{c}']);
    let rest = rest
        .strip_prefix(['=', ':'])
        .map(|r| r.trim_start_matches([' ', '\t', '\u{c}']))
        .unwrap_or(rest);
    (unescape(key), unescape(rest))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => {
                        out.push(decoded);
                        chars.nth(3);
                    }
                    _ => out.push('u'),
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn escape(text: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (index, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{c}' => out.push_str("\\f"),
            ' ' if is_key || index == 0 => out.push_str("\\ "),
            '=' | ':' if is_key => {
                out.push('\\');
                out.push(c);
            }
            '#' | '!' if index == 0 => {
                out.push('\\');
                out.push(c);
            }
            other => out.push(other),
        }
    }
    out
}
