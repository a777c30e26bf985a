//! Support for Apple `.strings` localization format.
//!
//! Comments are stripped before `"key" = "value";` pairs are matched. A line
//! comment is only recognized when `//` starts a line or follows a `;`, so a
//! URL inside a single-line value survives, while a continuation line of a
//! multi-line value that starts with `//` is treated as a comment. Block
//! comments are removed wherever they appear, including inside values.

use std::io::{BufRead, Read, Write};

use indoc::indoc;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::{
    error::Error,
    traits::Parser,
    types::{Fragment, StringValue},
};

lazy_static! {
    static ref BLOCK_COMMENT: Regex = Regex::new(r"(?s)/\*.*?\*/").unwrap();
    static ref LINE_COMMENT: Regex = Regex::new(r"(?m)(^[ \t]*|;[ \t]*)//.*$").unwrap();
    static ref LANGUAGE_HEADER: Regex = Regex::new(r"(?m)^[ \t]*//:[ \t]*Language:[ \t]*(\S*)").unwrap();
    static ref PAIR: Regex =
        Regex::new(r#"(?s)"((?:[^"\\]|\\.)*)"\s*=\s*"((?:[^"\\]|\\.)*)"\s*;"#).unwrap();
}

/// Represents an Apple `.strings` localization file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Format {
    /// Language declared by a `//: Language: xx` header, if any.
    pub language: Option<String>,
    /// All key-value pairs in file order, unescaped.
    pub pairs: Vec<Pair>,
}

/// A single key-value pair in a `.strings` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub key: String,
    pub value: String,
}

impl Format {
    /// Builds a `.strings` file from one language slice. Plural values have no
    /// `.strings` representation and are skipped.
    pub fn from_fragment(language: Option<String>, fragment: &Fragment) -> Self {
        let pairs = fragment
            .iter()
            .filter_map(|(key, value)| match value {
                StringValue::Simple(text) => Some(Pair {
                    key: key.clone(),
                    value: text.clone(),
                }),
                StringValue::Plural(_) => None,
            })
            .collect();
        Format { language, pairs }
    }
}

impl Parser for Format {
    fn from_reader<R: BufRead>(mut reader: R) -> Result<Self, Error> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;

        let language = LANGUAGE_HEADER
            .captures(&content)
            .map(|caps| caps[1].to_string())
            .filter(|lang| !lang.is_empty());

        let stripped = strip_comments(&content);

        let mut pairs = Vec::new();
        let mut last_end = 0;
        for caps in PAIR.captures_iter(&stripped) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            check_gap(&stripped, last_end, whole.start())?;
            last_end = whole.end();
            pairs.push(Pair {
                key: unescape(&caps[1]),
                value: unescape(&caps[2]),
            });
        }
        check_gap(&stripped, last_end, stripped.len())?;

        Ok(Format { language, pairs })
    }

    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        let mut content = format!(
            indoc! {"
            // This file was generated by locmerge.
            //
            //: Language: {}

            "},
            self.language.as_deref().unwrap_or_default()
        );

        for pair in &self.pairs {
            content.push_str(&pair.to_string());
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
            .map(|pair| (pair.key, StringValue::Simple(pair.value)))
            .collect()
    }
}

impl std::fmt::Display for Pair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\" = \"{}\";", escape(&self.key), escape(&self.value))
    }
}

/// Removes comments while keeping line numbers stable.
fn strip_comments(content: &str) -> String {
    let without_blocks = BLOCK_COMMENT.replace_all(content, |caps: &Captures| {
        "\n".repeat(caps[0].matches('\n').count())
    });
    LINE_COMMENT
        .replace_all(&without_blocks, |caps: &Captures| {
            if caps[1].starts_with(';') { ";" } else { "" }
        })
        .into_owned()
}

/// Text between two matched pairs may only be whitespace or stray tokens; a
/// quote there means a pair that never closed.
fn check_gap(stripped: &str, start: usize, end: usize) -> Result<(), Error> {
    let gap = &stripped[start..end];
    if let Some(offset) = gap.find('"') {
        let line = stripped[..start + offset].matches('\n').count() + 1;
        return Err(Error::malformed(format!(
            "unbalanced quoting near line {}",
            line
        )));
    }
    Ok(())
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
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Parser;

    fn fragment(content: &str) -> Fragment {
        Fragment::from(Format::from_str(content).unwrap())
    }

    #[test]
    fn test_parse_escaped_quotes() {
        let parsed = fragment(r#""hello" = "Hi \"there\"";"#);
        assert_eq!(parsed["hello"], StringValue::simple(r#"Hi "there""#));
    }

    #[test]
    fn test_parse_with_comments() {
        let content = r#"
        /* Greeting for the user */
        "hello" = "Hello, world!";
        // Farewell
        "bye" = "Goodbye!"; // trailing comment
        "#;
        let parsed = fragment(content);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["hello"], StringValue::simple("Hello, world!"));
        assert_eq!(parsed["bye"], StringValue::simple("Goodbye!"));
    }

    #[test]
    fn test_newline_escape_is_unescaped() {
        let parsed = fragment(r#""two_lines" = "One\nTwo";"#);
        assert_eq!(parsed["two_lines"], StringValue::simple("One\nTwo"));
    }

    #[test]
    fn test_empty_input_is_empty_map() {
        assert!(fragment("").is_empty());
        assert!(fragment("  \n /* only a comment */ \n").is_empty());
    }

    #[test]
    fn test_url_in_single_line_value_survives() {
        let parsed = fragment(r#""site" = "https://example.com/path";"#);
        assert_eq!(parsed["site"], StringValue::simple("https://example.com/path"));
    }

    #[test]
    fn test_comment_marker_on_continuation_line_is_stripped() {
        // Known fragility: a multi-line value whose next line starts with `//`
        // loses its closing quote to comment stripping.
        let content = "\"k\" = \"first\n// second\";";
        assert!(Format::from_str(content).is_err());
    }

    #[test]
    fn test_unbalanced_quote_is_error() {
        let content = "\"ok\" = \"fine\";\n\"broken\" = \"never closed;\n";
        let err = Format::from_str(content).unwrap_err();
        assert!(err.to_string().contains("unbalanced quoting near line 2"));
    }

    #[test]
    fn test_lines_without_quotes_are_ignored() {
        let content = "\"good\" = \"yes\";\nbad line without equals\n\"another\" = \"ok\";";
        let parsed = fragment(content);
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_language_header() {
        let content = "//: Language: fr\n\"a\" = \"b\";";
        let format = Format::from_str(content).unwrap();
        assert_eq!(format.language.as_deref(), Some("fr"));
    }

    #[test]
    fn test_round_trip_serialization() {
        let content = r#"
        "quote" = "Say \"hi\"";
        "slash" = "C:\\Users";
        "multi" = "a\nb\tc";
        "unknown" = "\u00e9";
        "#;
        let parsed = Format::from_str(content).unwrap();
        let written = parsed.to_text().unwrap();
        let reparsed = Format::from_str(&written).unwrap();
        assert_eq!(parsed.pairs, reparsed.pairs);
    }

    #[test]
    fn test_from_fragment_skips_plurals() {
        use crate::types::{Plural, PluralCategory};
        let mut values = Fragment::new();
        values.insert("a".into(), StringValue::simple("A"));
        values.insert(
            "p".into(),
            StringValue::Plural(Plural::new([(PluralCategory::Other, "n".to_string())]).unwrap()),
        );
        let format = Format::from_fragment(Some("en".into()), &values);
        assert_eq!(format.pairs.len(), 1);
        let text = format.to_text().unwrap();
        assert!(text.contains("//: Language: en"));
        assert!(text.contains("\"a\" = \"A\";"));
    }
}
