//! Support for flat and nested JSON key-value files.
//!
//! Nested objects flatten depth-first into dotted keys (`a.b.c`). An object of
//! the shape `{"type": "simple" | "plural", "value": ...}` is a tagged
//! [`StringValue`] and ends the walk at that point.

use std::{
    collections::BTreeMap,
    io::{BufRead, Read, Write},
};

use serde_json::{Map, Value};

use crate::{
    error::Error,
    traits::Parser,
    types::{Fragment, StringValue, ValidationIssue},
};

/// Output layout for [`Format::to_writer`]. Reading accepts both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonStyle {
    /// Dotted keys at the top level.
    #[default]
    Flat,
    /// Dotted keys expanded into nested objects.
    Nested,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Format {
    pub values: Fragment,
    pub dropped: Vec<ValidationIssue>,
    pub style: JsonStyle,
}

impl Format {
    pub fn from_fragment(fragment: &Fragment, style: JsonStyle) -> Self {
        Format {
            values: fragment.clone(),
            dropped: Vec::new(),
            style,
        }
    }

    fn to_value(&self) -> Result<Value, Error> {
        match self.style {
            JsonStyle::Flat => {
                let mut map = Map::new();
                for (key, value) in &self.values {
                    map.insert(key.clone(), leaf(value)?);
                }
                Ok(Value::Object(map))
            }
            JsonStyle::Nested => {
                let mut root = Tree::default();
                for (key, value) in &self.values {
                    let segments: Vec<&str> = key.split('.').collect();
                    root.insert(&segments, leaf(value)?);
                }
                Ok(root.into_value())
            }
        }
    }
}

impl Parser for Format {
    fn from_reader<R: BufRead>(mut reader: R) -> Result<Self, Error> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        if content.trim().is_empty() {
            return Ok(Format::default());
        }

        let Value::Object(root) = serde_json::from_str::<Value>(&content)? else {
            return Err(Error::InvalidResource(
                "JSON root must be an object".into(),
            ));
        };

        let mut format = Format::default();
        for (key, value) in root {
            flatten(key, value, &mut format);
        }
        Ok(format)
    }

    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        serde_json::to_writer_pretty(&mut writer, &self.to_value()?)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

impl From<Format> for Fragment {
    fn from(format: Format) -> Self {
        format.values
    }
}

fn flatten(key: String, value: Value, format: &mut Format) {
    match value {
        Value::String(text) => {
            format.values.insert(key, StringValue::Simple(text));
        }
        Value::Number(number) => {
            format.values.insert(key, StringValue::Simple(number.to_string()));
        }
        Value::Bool(flag) => {
            format.values.insert(key, StringValue::Simple(flag.to_string()));
        }
        Value::Null => {}
        Value::Array(items) => {
            for (index, item) in items.into_iter().enumerate() {
                flatten(format!("{}.{}", key, index), item, format);
            }
        }
        Value::Object(map) if is_tagged(&map) => {
            match serde_json::from_value::<StringValue>(Value::Object(map)) {
                Ok(value) => {
                    format.values.insert(key, value);
                }
                Err(e) => format.dropped.push(ValidationIssue::new(key, e.to_string())),
            }
        }
        Value::Object(map) => {
            for (child, value) in map {
                flatten(format!("{}.{}", key, child), value, format);
            }
        }
    }
}

fn is_tagged(map: &Map<String, Value>) -> bool {
    map.len() == 2
        && map.contains_key("value")
        && matches!(
            map.get("type").and_then(Value::as_str),
            Some("simple" | "plural")
        )
}

/// Simple values are written as bare strings, plurals as tagged objects.
fn leaf(value: &StringValue) -> Result<Value, Error> {
    match value {
        StringValue::Simple(text) => Ok(Value::String(text.clone())),
        StringValue::Plural(_) => Ok(serde_json::to_value(value)?),
    }
}

#[derive(Default)]
struct Tree {
    children: BTreeMap<String, Node>,
}

enum Node {
    Leaf(Value),
    Branch(Tree),
}

impl Tree {
    /// Inserts along `segments`. When a prefix is already a leaf, the rest of
    /// the key stays dotted at that level.
    fn insert(&mut self, segments: &[&str], value: Value) {
        let Some((first, rest)) = segments.split_first() else {
            return;
        };
        if rest.is_empty() {
            self.children.insert(first.to_string(), Node::Leaf(value));
            return;
        }
        match self
            .children
            .entry(first.to_string())
            .or_insert_with(|| Node::Branch(Tree::default()))
        {
            Node::Branch(tree) => tree.insert(rest, value),
            Node::Leaf(_) => {
                self.children.insert(segments.join("."), Node::Leaf(value));
            }
        }
    }

    fn into_value(self) -> Value {
        let map = self
            .children
            .into_iter()
            .map(|(key, node)| {
                let value = match node {
                    Node::Leaf(value) => value,
                    Node::Branch(tree) => tree.into_value(),
                };
                (key, value)
            })
            .collect();
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Parser;
    use crate::types::{Plural, PluralCategory};

    fn fragment(content: &str) -> Fragment {
        Fragment::from(Format::from_str(content).unwrap())
    }

    fn items_plural() -> StringValue {
        StringValue::Plural(
            Plural::new([
                (PluralCategory::One, "1 item".to_string()),
                (PluralCategory::Other, "%d items".to_string()),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_flatten_nested_objects() {
        let values =
            fragment(r#"{"menu": {"file": {"open": "Open", "close": "Close"}}, "title": "App"}"#);
        assert_eq!(values.len(), 3);
        assert_eq!(values["menu.file.open"], StringValue::simple("Open"));
        assert_eq!(values["menu.file.close"], StringValue::simple("Close"));
        assert_eq!(values["title"], StringValue::simple("App"));
    }

    #[test]
    fn test_tagged_plural_is_a_leaf() {
        let values = fragment(
            r#"{"cart": {"items": {"type": "plural", "value": {"one": "1 item", "other": "%d items"}}}}"#,
        );
        assert_eq!(values.len(), 1);
        assert_eq!(values["cart.items"], items_plural());
    }

    #[test]
    fn test_tagged_plural_without_other_is_dropped() {
        let format =
            Format::from_str(r#"{"a": {"type": "plural", "value": {"one": "x"}}, "b": "ok"}"#).unwrap();
        assert_eq!(format.dropped.len(), 1);
        assert_eq!(format.dropped[0].key, "a");
        assert_eq!(format.values.len(), 1);
    }

    #[test]
    fn test_arrays_numbers_and_nulls() {
        let values = fragment(r#"{"list": ["a", "b"], "n": 3, "flag": true, "none": null}"#);
        assert_eq!(values["list.0"], StringValue::simple("a"));
        assert_eq!(values["list.1"], StringValue::simple("b"));
        assert_eq!(values["n"], StringValue::simple("3"));
        assert_eq!(values["flag"], StringValue::simple("true"));
        assert!(!values.contains_key("none"));
    }

    #[test]
    fn test_root_must_be_object() {
        assert!(Format::from_str("[1, 2]").is_err());
        assert!(Format::from_str("{\"a\": ").is_err());
        assert!(fragment("").is_empty());
    }

    #[test]
    fn test_nested_writer_expands_keys() {
        let mut values = Fragment::new();
        values.insert("menu.open".into(), StringValue::simple("Open"));
        values.insert("menu.close".into(), StringValue::simple("Close"));
        let text = Format::from_fragment(&values, JsonStyle::Nested)
            .to_text()
            .unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["menu"]["open"], "Open");
        assert_eq!(fragment(&text), values);
    }

    #[test]
    fn test_nested_writer_keeps_key_under_leaf_dotted() {
        let mut values = Fragment::new();
        values.insert("a".into(), StringValue::simple("leaf"));
        values.insert("a.b".into(), StringValue::simple("child"));
        let text = Format::from_fragment(&values, JsonStyle::Nested)
            .to_text()
            .unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["a"], "leaf");
        assert_eq!(parsed["a.b"], "child");
        assert_eq!(fragment(&text), values);
    }

    #[test]
    fn test_round_trip_flat_with_plural() {
        let mut values = Fragment::new();
        values.insert("cart.items".into(), items_plural());
        values.insert("title".into(), StringValue::simple("Say \"hi\"\n"));
        for style in [JsonStyle::Flat, JsonStyle::Nested] {
            let text = Format::from_fragment(&values, style).to_text().unwrap();
            assert_eq!(fragment(&text), values);
        }
    }
}
