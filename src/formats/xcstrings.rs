//! Support for Apple String Catalogs (`.xcstrings`).
//!
//! A String Catalog holds every language of a table in one JSON document, so it
//! converts to and from a whole [`Catalog`] rather than a single fragment.

use std::{
    collections::BTreeMap,
    io::{BufRead, Read, Write},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    traits::Parser,
    types::{
        Catalog, Entry, EntryState, Localization as CatalogLocalization, Plural, PluralCategory,
        StringValue, ValidationIssue,
    },
};

const DEFAULT_EXTRACTION_STATE: &str = "manual";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Format {
    #[serde(default)]
    pub source_language: String,
    #[serde(default)]
    pub strings: BTreeMap<String, Item>,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for Format {
    fn default() -> Self {
        Format {
            source_language: String::new(),
            strings: BTreeMap::new(),
            version: default_version(),
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
        Ok(serde_json::from_str(&content)?)
    }

    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_state: Option<String>,
    #[serde(default)]
    pub localizations: BTreeMap<String, Localization>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_translate: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Localization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_unit: Option<StringUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variations: Option<Variations>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StringUnit {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub value: String,
}

/// Only plural variations are understood; `device` and other variation kinds
/// are ignored when reading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Variations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plural: Option<BTreeMap<String, PluralVariation>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluralVariation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_unit: Option<StringUnit>,
}

impl StringUnit {
    fn new(state: EntryState, value: &str) -> Self {
        StringUnit {
            state: state.as_str().to_string(),
            value: value.to_string(),
        }
    }
}

impl Localization {
    fn from_catalog(localization: &CatalogLocalization) -> Self {
        match &localization.value {
            StringValue::Simple(value) => Localization {
                string_unit: Some(StringUnit::new(localization.state, value)),
                variations: None,
            },
            StringValue::Plural(plural) => {
                let forms = plural
                    .forms()
                    .iter()
                    .map(|(category, value)| {
                        let variation = PluralVariation {
                            string_unit: Some(StringUnit::new(localization.state, value)),
                        };
                        (category.as_str().to_string(), variation)
                    })
                    .collect();
                Localization {
                    string_unit: None,
                    variations: Some(Variations {
                        plural: Some(forms),
                    }),
                }
            }
        }
    }

    /// Converts to the canonical model. A plural state is taken from its
    /// `other` variant.
    fn to_catalog(&self) -> Result<CatalogLocalization, &'static str> {
        if let Some(unit) = &self.string_unit {
            return Ok(CatalogLocalization::new(
                StringValue::Simple(unit.value.clone()),
                EntryState::from_wire(&unit.state),
            ));
        }

        let Some(variations) = self.variations.as_ref().and_then(|v| v.plural.as_ref()) else {
            return Err("no string unit or plural variations");
        };

        let forms = variations.iter().filter_map(|(category, variation)| {
            let category = category.parse::<PluralCategory>().ok()?;
            let unit = variation.string_unit.as_ref()?;
            Some((category, unit.value.clone()))
        });
        let plural = Plural::new(forms).ok_or("plural is missing the `other` variant")?;

        let state = variations
            .get(PluralCategory::Other.as_str())
            .and_then(|variation| variation.string_unit.as_ref())
            .map(|unit| EntryState::from_wire(&unit.state))
            .unwrap_or(EntryState::New);
        Ok(CatalogLocalization::new(StringValue::Plural(plural), state))
    }
}

impl Format {
    /// Converts into the canonical catalog, dropping localizations that cannot
    /// be represented.
    pub fn into_catalog(self) -> (Catalog, Vec<ValidationIssue>) {
        let mut catalog = Catalog::new(self.source_language);
        let mut dropped = Vec::new();

        for (key, item) in self.strings {
            let mut entry = Entry {
                comment: item.comment,
                extraction_state: Some(
                    item.extraction_state
                        .unwrap_or_else(|| DEFAULT_EXTRACTION_STATE.to_string()),
                ),
                ..Entry::default()
            };
            for (language, localization) in item.localizations {
                match localization.to_catalog() {
                    Ok(localization) => {
                        entry.localizations.insert(language, localization);
                    }
                    Err(reason) => {
                        dropped.push(ValidationIssue::new(
                            key.clone(),
                            format!("{} ({})", reason, language),
                        ));
                    }
                }
            }
            catalog.entries.insert(key, entry);
        }

        (catalog, dropped)
    }
}

impl From<&Catalog> for Format {
    fn from(catalog: &Catalog) -> Self {
        let strings = catalog
            .entries
            .iter()
            .map(|(key, entry)| {
                let item = Item {
                    comment: entry.comment.clone(),
                    extraction_state: Some(
                        entry
                            .extraction_state
                            .clone()
                            .unwrap_or_else(|| DEFAULT_EXTRACTION_STATE.to_string()),
                    ),
                    localizations: entry
                        .localizations
                        .iter()
                        .map(|(language, localization)| {
                            (language.clone(), Localization::from_catalog(localization))
                        })
                        .collect(),
                    should_translate: None,
                };
                (key.clone(), item)
            })
            .collect();

        Format {
            source_language: catalog.source_language.clone(),
            strings,
            version: default_version(),
        }
    }
}
