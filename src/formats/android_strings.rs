//! Support for Android `strings.xml` localization format.
//!
//! `<string>`, `<plurals>` and `<string-array>` resources are supported. Inline
//! markup inside a `<string>` is stripped to plain text. Array items flatten to
//! `name.0`, `name.1`, ... and are regrouped into a `<string-array>` on write.

use std::{
    collections::{BTreeMap, BTreeSet},
    io::{BufRead, Read, Write},
};

use quick_xml::{
    Writer,
    escape::partial_escape,
    events::{BytesDecl, BytesText, Event},
};

use crate::{
    error::Error,
    formats::dom::{Element, parse_document},
    traits::Parser,
    types::{Fragment, Plural, PluralCategory, StringValue, ValidationIssue},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Format {
    pub resources: Vec<AndroidResource>,
    pub dropped: Vec<ValidationIssue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AndroidResource {
    String {
        name: String,
        value: String,
        translatable: Option<bool>,
    },
    Plurals {
        name: String,
        plural: Plural,
    },
    StringArray {
        name: String,
        items: Vec<String>,
    },
}

impl Parser for Format {
    fn from_reader<R: BufRead>(mut reader: R) -> Result<Self, Error> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;

        let Some(root) = parse_document(&content)? else {
            return Ok(Format::default());
        };
        if root.name != "resources" {
            return Err(Error::InvalidResource(format!(
                "expected <resources> root, found <{}>",
                root.name
            )));
        }

        let mut format = Format::default();
        for element in root.elements() {
            match element.name.as_str() {
                "string" => format.resources.push(AndroidResource::String {
                    name: required_name(element)?,
                    value: unescape(&element.text()),
                    translatable: element.attr("translatable").map(|v| v == "true"),
                }),
                "plurals" => {
                    let name = required_name(element)?;
                    let forms = element
                        .elements()
                        .filter(|item| item.name == "item")
                        .filter_map(|item| {
                            let category = item.attr("quantity")?.parse::<PluralCategory>().ok()?;
                            Some((category, unescape(&item.text())))
                        });
                    match Plural::new(forms) {
                        Some(plural) => format
                            .resources
                            .push(AndroidResource::Plurals { name, plural }),
                        None => format.dropped.push(ValidationIssue::new(
                            name,
                            "plurals is missing the `other` item",
                        )),
                    }
                }
                "string-array" => {
                    let name = required_name(element)?;
                    let items = element
                        .elements()
                        .filter(|item| item.name == "item")
                        .map(|item| unescape(&item.text()))
                        .collect();
                    format
                        .resources
                        .push(AndroidResource::StringArray { name, items });
                }
                _ => {}
            }
        }
        Ok(format)
    }

    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        let mut xml = Writer::new_with_indent(writer, b' ', 4);
        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        xml.create_element("resources").write_inner_content(|xml| {
            for resource in &self.resources {
                write_resource(xml, resource)?;
            }
            Ok(())
        })?;
        xml.get_mut().write_all(b"\n")?;
        Ok(())
    }
}

impl Format {
    /// Builds a `strings.xml` from one language slice. Keys `base.0 .. base.n-1`
    /// are regrouped into a `<string-array>` when the sequence is contiguous and
    /// `base` is not itself a key.
    pub fn from_fragment(fragment: &Fragment) -> Self {
        let arrays = array_groups(fragment);
        let mut ordered: BTreeMap<String, AndroidResource> = BTreeMap::new();

        for (key, value) in fragment {
            if split_array_key(key).is_some_and(|(base, _)| arrays.contains(base)) {
                continue;
            }
            let resource = match value {
                StringValue::Simple(text) => AndroidResource::String {
                    name: key.clone(),
                    value: text.clone(),
                    translatable: None,
                },
                StringValue::Plural(plural) => AndroidResource::Plurals {
                    name: key.clone(),
                    plural: plural.clone(),
                },
            };
            ordered.insert(key.clone(), resource);
        }

        for base in arrays {
            let items = (0..)
                .map_while(|i| match fragment.get(&format!("{}.{}", base, i)) {
                    Some(StringValue::Simple(text)) => Some(text.clone()),
                    _ => None,
                })
                .collect();
            ordered.insert(
                base.to_string(),
                AndroidResource::StringArray {
                    name: base.to_string(),
                    items,
                },
            );
        }

        Format {
            resources: ordered.into_values().collect(),
            dropped: Vec::new(),
        }
    }
}

impl From<Format> for Fragment {
    fn from(format: Format) -> Self {
        let mut fragment = Fragment::new();
        for resource in format.resources {
            match resource {
                AndroidResource::String { name, value, .. } => {
                    fragment.insert(name, StringValue::Simple(value));
                }
                AndroidResource::Plurals { name, plural } => {
                    fragment.insert(name, StringValue::Plural(plural));
                }
                AndroidResource::StringArray { name, items } => {
                    for (index, item) in items.into_iter().enumerate() {
                        fragment.insert(format!("{}.{}", name, index), StringValue::Simple(item));
                    }
                }
            }
        }
        fragment
    }
}

fn required_name(element: &Element) -> Result<String, Error> {
    element.attr("name").map(str::to_string).ok_or_else(|| {
        Error::InvalidResource(format!("{} tag missing 'name'", element.name))
    })
}

/// Splits `base.N` into its base and canonical decimal index.
fn split_array_key(key: &str) -> Option<(&str, usize)> {
    let (base, index) = key.rsplit_once('.')?;
    let parsed = index.parse::<usize>().ok()?;
    (!base.is_empty() && parsed.to_string() == index).then_some((base, parsed))
}

fn array_groups(fragment: &Fragment) -> BTreeSet<&str> {
    let mut indices: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (key, value) in fragment {
        if let (Some((base, index)), StringValue::Simple(_)) = (split_array_key(key), value) {
            indices.entry(base).or_default().push(index);
        }
    }
    indices
        .into_iter()
        .filter(|(base, found)| {
            let mut found = found.clone();
            found.sort_unstable();
            !fragment.contains_key(*base) && found.iter().copied().eq(0..found.len())
        })
        .map(|(base, _)| base)
        .collect()
}

fn write_resource<W: Write>(
    xml: &mut Writer<W>,
    resource: &AndroidResource,
) -> std::io::Result<()> {
    match resource {
        AndroidResource::String {
            name,
            value,
            translatable,
        } => {
            let mut element = xml
                .create_element("string")
                .with_attribute(("name", name.as_str()));
            if let Some(translatable) = translatable {
                element = element.with_attribute((
                    "translatable",
                    if *translatable { "true" } else { "false" },
                ));
            }
            element.write_text_content(escaped_text(value))?;
        }
        AndroidResource::Plurals { name, plural } => {
            xml.create_element("plurals")
                .with_attribute(("name", name.as_str()))
                .write_inner_content(|xml| {
                    for (category, text) in plural.forms() {
                        xml.create_element("item")
                            .with_attribute(("quantity", category.as_str()))
                            .write_text_content(escaped_text(text))?;
                    }
                    Ok(())
                })?;
        }
        AndroidResource::StringArray { name, items } => {
            xml.create_element("string-array")
                .with_attribute(("name", name.as_str()))
                .write_inner_content(|xml| {
                    for item in items {
                        xml.create_element("item")
                            .write_text_content(escaped_text(item))?;
                    }
                    Ok(())
                })?;
        }
    }
    Ok(())
}

fn escaped_text(value: &str) -> BytesText<'static> {
    BytesText::from_escaped(partial_escape(&escape(value)).into_owned())
}

/// Resolves Android string escapes and an optional pair of wrapping quotes.
fn unescape(raw: &str) -> String {
    let raw = match raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) if !inner.ends_with('\\') || inner.ends_with("\\\\") => inner,
        _ => raw,
    };

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
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => {
                        out.push(decoded);
                        chars.nth(3);
                    }
                    _ => out.push_str("\\u"),
                }
            }
            Some(c @ ('\'' | '"' | '\\' | '@' | '?')) => out.push(c),
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
    for (i, c) in value.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '@' | '?' if i == 0 => {
                out.push('\\');
                out.push(c);
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Parser;

    fn fragment(xml: &str) -> Fragment {
        Fragment::from(Format::from_str(xml).unwrap())
    }

    #[test]
    fn test_parse_basic_strings_xml() {
        let xml = r#"
        <resources>
            <string name="hello">Hello</string>
            <string name="bye" translatable="false">Goodbye</string>
            <string name="empty"></string>
        </resources>
        "#;
        let values = fragment(xml);
        assert_eq!(values.len(), 3);
        assert_eq!(values["hello"], StringValue::simple("Hello"));
        assert_eq!(values["bye"], StringValue::simple("Goodbye"));
        assert_eq!(values["empty"], StringValue::simple(""));
    }

    #[test]
    fn test_parse_plurals() {
        let xml = r#"<resources><plurals name="items"><item quantity="one">1 item</item><item quantity="other">%d items</item></plurals></resources>"#;
        let values = fragment(xml);
        let expected = Plural::new([
            (PluralCategory::One, "1 item".to_string()),
            (PluralCategory::Other, "%d items".to_string()),
        ])
        .unwrap();
        assert_eq!(values["items"], StringValue::Plural(expected));
    }

    #[test]
    fn test_plurals_without_other_are_dropped() {
        let xml = r#"
        <resources>
            <plurals name="bad"><item quantity="one">1</item></plurals>
            <string name="ok">fine</string>
        </resources>
        "#;
        let format = Format::from_str(xml).unwrap();
        assert_eq!(format.dropped.len(), 1);
        assert_eq!(format.dropped[0].key, "bad");
        let values = Fragment::from(format);
        assert_eq!(values.len(), 1);
        assert!(values.contains_key("ok"));
    }

    #[test]
    fn test_inner_markup_is_stripped() {
        let xml = r#"<resources><string name="rich">Hello <b>bold</b> <i>world</i></string></resources>"#;
        assert_eq!(fragment(xml)["rich"], StringValue::simple("Hello bold world"));
    }

    #[test]
    fn test_android_escapes() {
        let xml = r#"<resources><string name="e">Don\'t say \"no\"\nok &amp; é</string><string name="q">"wrapped"</string></resources>"#;
        let values = fragment(xml);
        assert_eq!(values["e"], StringValue::simple("Don't say \"no\"\nok & é"));
        assert_eq!(values["q"], StringValue::simple("wrapped"));
    }

    #[test]
    fn test_string_array_flattens() {
        let xml = r#"
        <resources>
            <string-array name="planets">
                <item>Mercury</item>
                <item>Venus</item>
            </string-array>
        </resources>
        "#;
        let values = fragment(xml);
        assert_eq!(values["planets.0"], StringValue::simple("Mercury"));
        assert_eq!(values["planets.1"], StringValue::simple("Venus"));
    }

    #[test]
    fn test_missing_name_attribute() {
        let xml = r#"<resources><string>No name attr</string></resources>"#;
        let err = Format::from_str(xml).unwrap_err();
        assert!(err.to_string().contains("missing 'name'"));
    }

    #[test]
    fn test_structural_errors() {
        assert!(Format::from_str("<resources><string name=\"a\">x</resources>").is_err());
        assert!(Format::from_str("<strings/>").is_err());
    }

    #[test]
    fn test_empty_input() {
        assert!(fragment("").is_empty());
        assert!(fragment("<resources/>").is_empty());
    }

    #[test]
    fn test_round_trip_serialization() {
        let xml = r#"
        <resources>
            <string name="greet">Hi &lt;there&gt; it's "me"</string>
            <string name="at">\@home</string>
            <plurals name="apples">
                <item quantity="other">%d apples</item>
                <item quantity="one">One apple</item>
            </plurals>
            <string-array name="days"><item>Mon</item><item>Tue</item></string-array>
        </resources>
        "#;
        let parsed = fragment(xml);
        let written = Format::from_fragment(&parsed).to_text().unwrap();
        assert!(written.contains("<string-array name=\"days\">"));
        let reparsed = fragment(&written);
        assert_eq!(parsed, reparsed);
    }

    #[test]
    fn test_non_contiguous_indices_stay_strings() {
        let mut values = Fragment::new();
        values.insert("list.0".into(), StringValue::simple("a"));
        values.insert("list.2".into(), StringValue::simple("c"));
        let format = Format::from_fragment(&values);
        assert_eq!(format.resources.len(), 2);
        assert!(
            format
                .resources
                .iter()
                .all(|r| matches!(r, AndroidResource::String { .. }))
        );
    }
}
