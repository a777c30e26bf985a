//! Core, format-agnostic types for locmerge.
//! Parsers decode into these; encoders serialize these.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Single-language slice of a catalog: key → value.
pub type Fragment = BTreeMap<String, StringValue>;

/// Standard CLDR plural forms.
///
/// The declaration order is the serialization order of plural variants.
#[derive(Ord, PartialOrd, Eq, PartialEq, Debug, Clone, Copy, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    pub const ALL: [PluralCategory; 6] = [
        PluralCategory::Zero,
        PluralCategory::One,
        PluralCategory::Two,
        PluralCategory::Few,
        PluralCategory::Many,
        PluralCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PluralCategory::Zero => "zero",
            PluralCategory::One => "one",
            PluralCategory::Two => "two",
            PluralCategory::Few => "few",
            PluralCategory::Many => "many",
            PluralCategory::Other => "other",
        }
    }
}

impl Display for PluralCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PluralCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ZERO" => Ok(PluralCategory::Zero),
            "ONE" => Ok(PluralCategory::One),
            "TWO" => Ok(PluralCategory::Two),
            "FEW" => Ok(PluralCategory::Few),
            "MANY" => Ok(PluralCategory::Many),
            "OTHER" => Ok(PluralCategory::Other),
            _ => Err(format!("Unknown plural category: {}", s)),
        }
    }
}

/// All plural variants for a single message.
///
/// A `Plural` always holds a non-empty `other` variant; values that would
/// violate this cannot be constructed or deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(
    try_from = "BTreeMap<PluralCategory, String>",
    into = "BTreeMap<PluralCategory, String>"
)]
pub struct Plural {
    forms: BTreeMap<PluralCategory, String>,
}

impl Plural {
    /// Builds a plural from its variants. Empty variants are discarded.
    ///
    /// Returns `None` when no non-empty `other` variant is present.
    pub fn new(forms: impl IntoIterator<Item = (PluralCategory, String)>) -> Option<Self> {
        let forms: BTreeMap<PluralCategory, String> = forms
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .collect();

        if forms.contains_key(&PluralCategory::Other) {
            Some(Self { forms })
        } else {
            None
        }
    }

    /// Variants in fixed order: zero, one, two, few, many, other.
    pub fn forms(&self) -> &BTreeMap<PluralCategory, String> {
        &self.forms
    }

    pub fn get(&self, category: PluralCategory) -> Option<&str> {
        self.forms.get(&category).map(String::as_str)
    }

    pub fn other(&self) -> &str {
        self.get(PluralCategory::Other).unwrap_or_default()
    }
}

impl TryFrom<BTreeMap<PluralCategory, String>> for Plural {
    type Error = String;

    fn try_from(forms: BTreeMap<PluralCategory, String>) -> Result<Self, Self::Error> {
        Plural::new(forms).ok_or_else(|| "plural is missing a non-empty `other` variant".into())
    }
}

impl From<Plural> for BTreeMap<PluralCategory, String> {
    fn from(plural: Plural) -> Self {
        plural.forms
    }
}

/// A localized value: plain text or a set of plural variants.
///
/// Serialized with an explicit discriminator:
/// `{"type": "simple", "value": "..."}` or `{"type": "plural", "value": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StringValue {
    Simple(String),
    Plural(Plural),
}

impl StringValue {
    pub fn simple(value: impl Into<String>) -> Self {
        StringValue::Simple(value.into())
    }

    pub fn is_plural(&self) -> bool {
        matches!(self, StringValue::Plural(_))
    }

    /// True when there is no text at all.
    pub fn is_empty(&self) -> bool {
        match self {
            StringValue::Simple(value) => value.is_empty(),
            StringValue::Plural(plural) => plural.forms.values().all(String::is_empty),
        }
    }

    /// Every piece of text in this value, with the plural category it belongs to.
    pub fn texts(&self) -> Vec<(Option<PluralCategory>, &str)> {
        match self {
            StringValue::Simple(value) => vec![(None, value.as_str())],
            StringValue::Plural(plural) => plural
                .forms
                .iter()
                .map(|(category, value)| (Some(*category), value.as_str()))
                .collect(),
        }
    }
}

impl Display for StringValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StringValue::Simple(value) => write!(f, "{}", value),
            StringValue::Plural(plural) => {
                let parts = plural
                    .forms
                    .iter()
                    .map(|(category, value)| format!("{}: {}", category, value))
                    .collect::<Vec<_>>();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

/// Translation state of one localization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    /// The localization is translated and reviewed.
    Translated,

    /// The localization was changed or went stale and needs review.
    NeedsReview,

    /// The localization has not been translated yet.
    New,
}

impl EntryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryState::Translated => "translated",
            EntryState::NeedsReview => "needs_review",
            EntryState::New => "new",
        }
    }

    /// Reads a state as written by String Catalogs. `stale` folds into
    /// `needs_review`; anything unrecognized is `new`.
    pub fn from_wire(s: &str) -> Self {
        s.parse().unwrap_or(match s {
            "stale" => EntryState::NeedsReview,
            _ => EntryState::New,
        })
    }

    /// Default state for values read from formats without state metadata.
    pub fn for_value(value: &StringValue) -> Self {
        if value.is_empty() {
            EntryState::New
        } else {
            EntryState::Translated
        }
    }
}

impl FromStr for EntryState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TRANSLATED" => Ok(EntryState::Translated),
            "NEEDS_REVIEW" => Ok(EntryState::NeedsReview),
            "NEW" => Ok(EntryState::New),
            _ => Err(format!("Unknown entry state: {}", s)),
        }
    }
}

/// One value in one language, with its state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Localization {
    pub value: StringValue,
    pub state: EntryState,
}

impl Localization {
    pub fn new(value: StringValue, state: EntryState) -> Self {
        Self { value, state }
    }

    /// Localization with the state implied by its content.
    pub fn inferred(value: StringValue) -> Self {
        let state = EntryState::for_value(&value);
        Self { value, state }
    }

    /// Whether this localization carries usable translator work: a non-empty
    /// simple value in state `translated`, or any populated plural variant.
    pub fn is_translated(&self) -> bool {
        match &self.value {
            StringValue::Simple(value) => !value.is_empty() && self.state == EntryState::Translated,
            StringValue::Plural(plural) => plural.forms.values().any(|v| !v.is_empty()),
        }
    }
}

/// All localizations of a single key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Language code → localization.
    #[serde(default)]
    pub localizations: BTreeMap<String, Localization>,

    /// Optional comment for translators.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub comment: Option<String>,

    /// String Catalog extraction state (`manual`, `stale`, ...), if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub extraction_state: Option<String>,
}

impl Entry {
    pub fn with_localization(language: impl Into<String>, localization: Localization) -> Self {
        let mut entry = Entry::default();
        entry.localizations.insert(language.into(), localization);
        entry
    }

    pub fn get(&self, language: &str) -> Option<&Localization> {
        self.localizations.get(language)
    }
}

/// A canonical multi-language catalog: key → language → value.
///
/// The set of languages is always derived from the entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// The development language of the catalog.
    pub source_language: String,

    /// Entries ordered by key.
    #[serde(default)]
    pub entries: BTreeMap<String, Entry>,
}

impl Catalog {
    pub fn new(source_language: impl Into<String>) -> Self {
        Self {
            source_language: source_language.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Builds a catalog holding one language, inferring each state from content.
    pub fn from_fragment(language: &str, fragment: Fragment) -> Self {
        let mut catalog = Catalog::new(language);
        for (key, value) in fragment {
            catalog.insert(key, language, Localization::inferred(value));
        }
        catalog
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        language: impl Into<String>,
        localization: Localization,
    ) {
        self.entries
            .entry(key.into())
            .or_default()
            .localizations
            .insert(language.into(), localization);
    }

    pub fn get(&self, key: &str, language: &str) -> Option<&Localization> {
        self.entries.get(key).and_then(|entry| entry.get(language))
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All language codes observed in any entry, sorted.
    pub fn languages(&self) -> BTreeSet<String> {
        self.entries
            .values()
            .flat_map(|entry| entry.localizations.keys().cloned())
            .collect()
    }

    pub fn has_language(&self, language: &str) -> bool {
        self.entries
            .values()
            .any(|entry| entry.localizations.contains_key(language))
    }

    /// The values of one language, by key.
    pub fn language_slice(&self, language: &str) -> Fragment {
        self.entries
            .iter()
            .filter_map(|(key, entry)| {
                entry
                    .get(language)
                    .map(|localization| (key.clone(), localization.value.clone()))
            })
            .collect()
    }
}

impl Display for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Catalog {{ source_language: {}, keys: {}, languages: [{}] }}",
            self.source_language,
            self.entries.len(),
            self.languages().into_iter().collect::<Vec<_>>().join(", ")
        )
    }
}

/// An entry dropped during parsing because it is structurally valid but
/// semantically incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ValidationIssue {
    pub key: String,
    pub reason: String,
}

impl ValidationIssue {
    pub(crate) fn new(key: impl Into<String>, reason: impl Into<String>) -> Self {
        let issue = Self {
            key: key.into(),
            reason: reason.into(),
        };
        tracing::warn!(key = %issue.key, "dropping entry: {}", issue.reason);
        issue
    }
}

impl From<ValidationIssue> for Error {
    fn from(issue: ValidationIssue) -> Self {
        Error::validation_error(format!("{}: {}", issue.key, issue.reason))
    }
}
