//! Support for Apple `.stringsdict` plural dictionaries.
//!
//! A `.stringsdict` file is a property list whose top-level dictionary maps
//! each key to a dictionary holding `NSStringLocalizedFormatKey` and one
//! variable dictionary keyed by plural category. Only plural values can be
//! represented here.

use std::io::{BufRead, Read, Write};

use quick_xml::{
    Writer,
    events::{BytesDecl, BytesText, Event},
};

use crate::{
    error::Error,
    formats::dom::{Element, parse_document},
    traits::Parser,
    types::{Fragment, Plural, PluralCategory, StringValue, ValidationIssue},
};

const FORMAT_KEY: &str = "NSStringLocalizedFormatKey";
const SPEC_TYPE_KEY: &str = "NSStringFormatSpecTypeKey";
const VALUE_TYPE_KEY: &str = "NSStringFormatValueTypeKey";
const PLURAL_RULE_TYPE: &str = "NSStringPluralRuleType";
const DEFAULT_VARIABLE: &str = "value";
const PLIST_DOCTYPE: &str =
    r#"plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd""#;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Format {
    pub entries: Vec<PluralEntry>,
    /// Entries that were present but unusable (e.g. no `other` variant).
    pub dropped: Vec<ValidationIssue>,
}

/// One plural rule entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluralEntry {
    pub key: String,
    /// The `NSStringLocalizedFormatKey`, e.g. `%#@items@`.
    pub format_key: String,
    /// Name of the variable dictionary, e.g. `items`.
    pub variable: String,
    /// `NSStringFormatValueTypeKey`, e.g. `d`.
    pub value_type: String,
    pub plural: Plural,
}

impl Format {
    /// Builds a `.stringsdict` file from one language slice. Simple values are
    /// skipped.
    pub fn from_fragment(fragment: &Fragment) -> Self {
        let entries = fragment
            .iter()
            .filter_map(|(key, value)| match value {
                StringValue::Plural(plural) => Some(PluralEntry {
                    key: key.clone(),
                    format_key: format!("%#@{}@", DEFAULT_VARIABLE),
                    variable: DEFAULT_VARIABLE.to_string(),
                    value_type: "d".to_string(),
                    plural: plural.clone(),
                }),
                StringValue::Simple(_) => None,
            })
            .collect();
        Format {
            entries,
            dropped: Vec::new(),
        }
    }
}

impl Parser for Format {
    fn from_reader<R: BufRead>(mut reader: R) -> Result<Self, Error> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;

        let Some(root) = parse_document(&content)? else {
            return Ok(Format::default());
        };
        if root.name != "plist" {
            return Err(Error::InvalidResource(format!(
                "expected <plist> root, found <{}>",
                root.name
            )));
        }
        let dict = root
            .elements()
            .find(|e| e.name == "dict")
            .ok_or_else(|| Error::InvalidResource("plist has no top-level <dict>".into()))?;

        let mut format = Format::default();
        for (key, value) in dict_pairs(dict)? {
            match parse_entry(&key, value)? {
                Ok(entry) => format.entries.push(entry),
                Err(issue) => format.dropped.push(issue),
            }
        }
        Ok(format)
    }

    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        let mut xml = Writer::new_with_indent(writer, b' ', 4);
        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        xml.write_event(Event::DocType(BytesText::from_escaped(PLIST_DOCTYPE)))?;

        xml.create_element("plist")
            .with_attribute(("version", "1.0"))
            .write_inner_content(|xml| {
                xml.create_element("dict").write_inner_content(|xml| {
                    for entry in &self.entries {
                        write_entry(xml, entry)?;
                    }
                    Ok(())
                })?;
                Ok(())
            })?;
        xml.get_mut().write_all(b"\n")?;
        Ok(())
    }
}

impl From<Format> for Fragment {
    fn from(format: Format) -> Self {
        format
            .entries
            .into_iter()
            .map(|entry| (entry.key, StringValue::Plural(entry.plural)))
            .collect()
    }
}

/// Pairs up `<key>` elements with the value element that follows each.
fn dict_pairs(dict: &Element) -> Result<Vec<(String, &Element)>, Error> {
    let mut pairs = Vec::new();
    let mut elements = dict.elements();
    while let Some(key) = elements.next() {
        if key.name != "key" {
            return Err(Error::InvalidResource(format!(
                "expected <key> in <dict>, found <{}>",
                key.name
            )));
        }
        let value = elements.next().ok_or_else(|| {
            Error::InvalidResource(format!("<key>{}</key> has no value", key.text()))
        })?;
        pairs.push((key.text(), value));
    }
    Ok(pairs)
}

/// Outer `Err` is structural and fails the file; inner `Err` drops the entry.
fn parse_entry(key: &str, value: &Element) -> Result<Result<PluralEntry, ValidationIssue>, Error> {
    if value.name != "dict" {
        return Ok(Err(ValidationIssue::new(key, "entry is not a dictionary")));
    }
    let fields = dict_pairs(value)?;

    let Some(format_key) = fields
        .iter()
        .find(|(name, _)| name == FORMAT_KEY)
        .map(|(_, v)| v.text())
    else {
        return Ok(Err(ValidationIssue::new(
            key,
            format!("missing {}", FORMAT_KEY),
        )));
    };

    let Some((variable, variable_dict)) = fields.iter().find(|(_, v)| v.name == "dict") else {
        return Ok(Err(ValidationIssue::new(key, "no plural variable dictionary")));
    };

    let variable_fields = dict_pairs(variable_dict)?;
    let value_type = variable_fields
        .iter()
        .find(|(name, _)| name == VALUE_TYPE_KEY)
        .map(|(_, v)| v.text())
        .unwrap_or_default();
    let forms = variable_fields.iter().filter_map(|(name, v)| {
        let category = name.parse::<PluralCategory>().ok()?;
        (v.name == "string").then(|| (category, v.text()))
    });

    match Plural::new(forms) {
        Some(plural) => Ok(Ok(PluralEntry {
            key: key.to_string(),
            format_key,
            variable: variable.clone(),
            value_type,
            plural,
        })),
        None => Ok(Err(ValidationIssue::new(
            key,
            "plural is missing the `other` variant",
        ))),
    }
}

fn write_entry<W: Write>(xml: &mut Writer<W>, entry: &PluralEntry) -> std::io::Result<()> {
    write_text_element(xml, "key", &entry.key)?;
    xml.create_element("dict").write_inner_content(|xml| {
        write_key_string(xml, FORMAT_KEY, &entry.format_key)?;
        write_text_element(xml, "key", &entry.variable)?;
        xml.create_element("dict").write_inner_content(|xml| {
            write_key_string(xml, SPEC_TYPE_KEY, PLURAL_RULE_TYPE)?;
            if !entry.value_type.is_empty() {
                write_key_string(xml, VALUE_TYPE_KEY, &entry.value_type)?;
            }
            for (category, text) in entry.plural.forms() {
                write_key_string(xml, category.as_str(), text)?;
            }
            Ok(())
        })?;
        Ok(())
    })?;
    Ok(())
}

fn write_key_string<W: Write>(xml: &mut Writer<W>, key: &str, value: &str) -> std::io::Result<()> {
    write_text_element(xml, "key", key)?;
    write_text_element(xml, "string", value)
}

fn write_text_element<W: Write>(
    xml: &mut Writer<W>,
    name: &str,
    text: &str,
) -> std::io::Result<()> {
    xml.create_element(name)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Parser;
    use indoc::indoc;

    const ITEMS: &str = indoc! {r#"
        <?xml version="1.0" encoding="UTF-8"?>
        <!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
        <plist version="1.0">
        <dict>
            <key>items</key>
            <dict>
                <key>NSStringLocalizedFormatKey</key>
                <string>%#@count@</string>
                <key>count</key>
                <dict>
                    <key>NSStringFormatSpecTypeKey</key>
                    <string>NSStringPluralRuleType</string>
                    <key>NSStringFormatValueTypeKey</key>
                    <string>d</string>
                    <key>one</key>
                    <string>1 item</string>
                    <key>other</key>
                    <string>%d items</string>
                </dict>
            </dict>
            <key>broken</key>
            <dict>
                <key>NSStringLocalizedFormatKey</key>
                <string>%#@n@</string>
                <key>n</key>
                <dict>
                    <key>one</key>
                    <string>only one</string>
                </dict>
            </dict>
        </dict>
        </plist>
    "#};

    #[test]
    fn test_parse_plural_entry() {
        let format = Format::from_str(ITEMS).unwrap();
        assert_eq!(format.entries.len(), 1);
        let entry = &format.entries[0];
        assert_eq!(entry.key, "items");
        assert_eq!(entry.format_key, "%#@count@");
        assert_eq!(entry.variable, "count");
        assert_eq!(entry.value_type, "d");
        assert_eq!(entry.plural.get(PluralCategory::One), Some("1 item"));
        assert_eq!(entry.plural.other(), "%d items");
    }

    #[test]
    fn test_entry_without_other_is_dropped_not_file() {
        let format = Format::from_str(ITEMS).unwrap();
        assert_eq!(format.dropped.len(), 1);
        assert_eq!(format.dropped[0].key, "broken");
    }

    #[test]
    fn test_missing_format_key_is_dropped() {
        let xml = r#"<plist><dict><key>k</key><dict><key>v</key><dict><key>other</key><string>x</string></dict></dict></dict></plist>"#;
        let format = Format::from_str(xml).unwrap();
        assert!(format.entries.is_empty());
        assert_eq!(format.dropped.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        let format = Format::from_str("").unwrap();
        assert!(format.entries.is_empty());
    }

    #[test]
    fn test_missing_plist_structure_is_error() {
        assert!(Format::from_str("<dict></dict>").is_err());
        assert!(Format::from_str("<plist version=\"1.0\"></plist>").is_err());
        assert!(Format::from_str("<plist><dict><key>a</key></dict></plist>").is_err());
        assert!(Format::from_str("<plist><dict><key>a</key>").is_err());
    }

    #[test]
    fn test_round_trip() {
        let parsed = Fragment::from(Format::from_str(ITEMS).unwrap());
        let written = Format::from_fragment(&parsed).to_text().unwrap();
        assert!(written.contains("<key>NSStringLocalizedFormatKey</key>"));
        let reparsed = Fragment::from(Format::from_str(&written).unwrap());
        assert_eq!(parsed, reparsed);
    }

    #[test]
    fn test_written_variants_are_in_fixed_order() {
        let plural = Plural::new([
            (PluralCategory::Other, "o".to_string()),
            (PluralCategory::Zero, "z".to_string()),
            (PluralCategory::Many, "m".to_string()),
        ])
        .unwrap();
        let mut fragment = Fragment::new();
        fragment.insert("k".into(), StringValue::Plural(plural));
        let written = Format::from_fragment(&fragment).to_text().unwrap();
        let zero = written.find("<key>zero</key>").unwrap();
        let many = written.find("<key>many</key>").unwrap();
        let other = written.find("<key>other</key>").unwrap();
        assert!(zero < many && many < other);
    }
}
