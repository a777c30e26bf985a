//! Read-only queries over parsed catalogs: duplicate values and word counts.

use std::collections::{BTreeMap, BTreeSet};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{Catalog, PluralCategory, StringValue};

lazy_static! {
    /// printf-style and Foundation specifiers (`%@`, `%d`, `%1$@`, `%.2f`,
    /// `%lld`, `%#@var@`). `%%` is matched separately and kept.
    static ref FORMAT_SPECIFIER: Regex = Regex::new(
        r"%%|%#@[^@\s]*@|%(?:\d+\$)?[-+0#]*(?:\d+|\*)?(?:\.(?:\d+|\*))?(?:hh|h|ll|l|q|L|z|t|j)?[@dDiuUxXoOfFeEgGcCsSpaA]"
    )
    .unwrap();
    static ref ESCAPE_SEQUENCE: Regex = Regex::new(r"\\[nrt]").unwrap();
}

/// Where one value was found.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Occurrence {
    pub file: String,
    pub key: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub quantity: Option<PluralCategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// The shared value; for loose groups, its normalized form.
    pub value: String,
    /// Distinct raw spellings joined by a loose group.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub spellings: Vec<String>,
    pub occurrences: Vec<Occurrence>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub exact: Vec<DuplicateGroup>,
    pub loose: Vec<DuplicateGroup>,
}

/// Case-folds and collapses whitespace runs.
pub fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Groups identical localized values across every file, key and language.
///
/// Exact groups share the raw text. Loose groups share the normalized text and
/// are reported only when they join at least two different spellings.
pub fn find_duplicates<'a>(
    catalogs: impl IntoIterator<Item = (&'a str, &'a Catalog)>,
) -> DuplicateReport {
    let mut exact: BTreeMap<String, Vec<Occurrence>> = BTreeMap::new();

    for (file, catalog) in catalogs {
        for (key, entry) in &catalog.entries {
            for (language, localization) in &entry.localizations {
                for (quantity, text) in localization.value.texts() {
                    if text.trim().is_empty() {
                        continue;
                    }
                    exact.entry(text.to_string()).or_default().push(Occurrence {
                        file: file.to_string(),
                        key: key.clone(),
                        language: language.clone(),
                        quantity,
                    });
                }
            }
        }
    }

    let mut loose: BTreeMap<String, (BTreeSet<String>, Vec<Occurrence>)> = BTreeMap::new();
    for (text, occurrences) in &exact {
        let (spellings, grouped) = loose.entry(normalize(text)).or_default();
        spellings.insert(text.clone());
        grouped.extend(occurrences.iter().cloned());
    }

    let exact = exact
        .into_iter()
        .filter(|(_, occurrences)| occurrences.len() > 1)
        .map(|(value, mut occurrences)| {
            occurrences.sort();
            DuplicateGroup {
                value,
                spellings: Vec::new(),
                occurrences,
            }
        })
        .collect();

    let loose = loose
        .into_iter()
        .filter(|(_, (spellings, _))| spellings.len() > 1)
        .map(|(value, (spellings, mut occurrences))| {
            occurrences.sort();
            DuplicateGroup {
                value,
                spellings: spellings.into_iter().collect(),
                occurrences,
            }
        })
        .collect();

    DuplicateReport { exact, loose }
}

/// Counts words the way translators are billed: format specifiers and
/// literal `\n`, `\r`, `\t` sequences separate words and are not words.
pub fn count_words(text: &str) -> usize {
    let without_specifiers = FORMAT_SPECIFIER.replace_all(text, |caps: &regex::Captures| {
        if &caps[0] == "%%" { "%%" } else { " " }
    });
    ESCAPE_SEQUENCE
        .replace_all(&without_specifiers, " ")
        .split_whitespace()
        .count()
}

/// Word and entry totals of one language in one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordCount {
    pub file: String,
    pub language: String,
    pub translated_entries: usize,
    pub translated_words: usize,
    pub pending_entries: usize,
    /// Words still to translate. An empty pending value is counted with the
    /// words of its source-language value.
    pub pending_words: usize,
}

impl WordCount {
    pub fn total_words(&self) -> usize {
        self.translated_words + self.pending_words
    }
}

/// Per-file, per-language word counts split into translated and pending.
pub fn word_counts<'a>(
    catalogs: impl IntoIterator<Item = (&'a str, &'a Catalog)>,
) -> Vec<WordCount> {
    let mut counts = Vec::new();

    for (file, catalog) in catalogs {
        let mut by_language: BTreeMap<&str, WordCount> = BTreeMap::new();
        for (key, entry) in &catalog.entries {
            for (language, localization) in &entry.localizations {
                let count = by_language.entry(language.as_str()).or_insert_with(|| WordCount {
                    file: file.to_string(),
                    language: language.clone(),
                    ..WordCount::default()
                });
                let words = value_words(&localization.value);
                if localization.is_translated() {
                    count.translated_entries += 1;
                    count.translated_words += words;
                } else {
                    count.pending_entries += 1;
                    count.pending_words += if words > 0 {
                        words
                    } else {
                        catalog
                            .get(key, &catalog.source_language)
                            .map(|source| value_words(&source.value))
                            .unwrap_or_default()
                    };
                }
            }
        }
        counts.extend(by_language.into_values());
    }

    counts
}

/// Plural values count every populated variant.
fn value_words(value: &StringValue) -> usize {
    value.texts().into_iter().map(|(_, text)| count_words(text)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntryState, Localization, Plural};

    fn translated(text: &str) -> Localization {
        Localization::new(StringValue::simple(text), EntryState::Translated)
    }

    #[test]
    fn test_count_words_strips_specifiers() {
        assert_eq!(count_words("%d items left"), 2);
        assert_eq!(count_words("Hello, %@!"), 2);
        assert_eq!(count_words("%1$@ sent %2$lld photos"), 2);
        assert_eq!(count_words("Total: %.2f"), 1);
        assert_eq!(count_words("line one\\nline two"), 4);
        assert_eq!(count_words("%#@files@ selected"), 1);
        assert_eq!(count_words("100%% done"), 2);
        assert_eq!(count_words("   "), 0);
    }

    #[test]
    fn test_find_exact_and_loose_duplicates() {
        let mut a = Catalog::new("en");
        a.insert("ok", "en", translated("OK"));
        a.insert("confirm", "en", translated("OK"));
        a.insert("cancel", "en", translated("Cancel"));
        a.insert("empty", "en", translated(""));
        a.insert("empty2", "en", translated(""));

        let mut b = Catalog::new("en");
        b.insert("dismiss", "en", translated("ok"));
        b.insert("cancel", "en", translated("Cancel  "));

        let report = find_duplicates([("a", &a), ("b", &b)]);

        assert_eq!(report.exact.len(), 1);
        assert_eq!(report.exact[0].value, "OK");
        let keys: Vec<_> = report.exact[0].occurrences.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["confirm", "ok"]);

        let values: Vec<_> = report.loose.iter().map(|g| g.value.as_str()).collect();
        assert_eq!(values, vec!["cancel", "ok"]);
        let ok = &report.loose[1];
        assert_eq!(ok.spellings, vec!["OK".to_string(), "ok".to_string()]);
        assert_eq!(ok.occurrences.len(), 3);
    }

    #[test]
    fn test_plural_variants_are_tagged_with_quantity() {
        let plural = Plural::new([
            (PluralCategory::One, "Item".to_string()),
            (PluralCategory::Other, "Items".to_string()),
        ])
        .unwrap();
        let mut catalog = Catalog::new("en");
        catalog.insert("a", "en", Localization::inferred(StringValue::Plural(plural)));
        catalog.insert("b", "en", translated("Items"));

        let report = find_duplicates([("f", &catalog)]);
        assert_eq!(report.exact.len(), 1);
        let quantities: Vec<_> = report.exact[0].occurrences.iter().map(|o| o.quantity).collect();
        assert_eq!(quantities, vec![Some(PluralCategory::Other), None]);
    }

    #[test]
    fn test_word_counts_split_translated_and_pending() {
        let mut catalog = Catalog::new("en");
        catalog.insert("left", "en", translated("%d items left"));
        catalog.insert("left", "fr", Localization::new(StringValue::simple(""), EntryState::New));
        catalog.insert("title", "en", translated("Home screen"));
        catalog.insert(
            "title",
            "fr",
            Localization::new(StringValue::simple("Écran d'accueil"), EntryState::NeedsReview),
        );
        catalog.insert(
            "count",
            "fr",
            Localization::new(
                StringValue::Plural(
                    Plural::new([
                        (PluralCategory::One, "%d élément".to_string()),
                        (PluralCategory::Other, "%d éléments".to_string()),
                    ])
                    .unwrap(),
                ),
                EntryState::New,
            ),
        );

        let counts = word_counts([("Localizable.xcstrings", &catalog)]);
        assert_eq!(counts.len(), 2);

        let en = &counts[0];
        assert_eq!(en.language, "en");
        assert_eq!(en.translated_entries, 2);
        assert_eq!(en.translated_words, 4);
        assert_eq!(en.pending_entries, 0);

        let fr = &counts[1];
        assert_eq!(fr.language, "fr");
        assert_eq!(fr.translated_entries, 1);
        assert_eq!(fr.translated_words, 2);
        assert_eq!(fr.pending_entries, 2);
        assert_eq!(fr.pending_words, 2 + 2);
        assert_eq!(fr.total_words(), 6);
    }
}
