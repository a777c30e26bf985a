//! Merging several sources of the same catalog into one.
//!
//! Every key present in more than one source is folded pairwise in source
//! order. Per language the two sides are classified with [`classify`]:
//!
//! - [`Divergence::Agree`]: identical, nothing to decide.
//! - [`Divergence::Progress`]: only one side carries translator work (or only
//!   one side has a localization at all); that side wins.
//! - [`Divergence::Conflict`]: both sides are translated and differ.
//!
//! A conflict marks the whole key. Unless the caller resolves it, conflicted
//! languages keep the left (earlier) value and the key is reported in
//! [`MergeReport::missing_keys`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    codec::{ParseOptions, ParsedSource, Source},
    formats::FormatType,
    types::{Catalog, Entry, EntryState, Localization},
};

/// Reason recorded for keys that fell back to the first source's value.
pub const UNRESOLVED_CONFLICT: &str = "Unresolved conflict, used default.";

/// Which of the two folded sources a decision keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Outcome of comparing one language of one key across two sources:
/// agreement, one-sided progress, or a true conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Divergence {
    Agree,
    Progress(Side),
    Conflict,
}

/// Classifies two localizations of the same key and language.
pub fn classify(left: Option<&Localization>, right: Option<&Localization>) -> Divergence {
    let (left, right) = match (left, right) {
        (l, r) if l == r => return Divergence::Agree,
        (Some(l), Some(r)) => (l, r),
        (Some(_), None) => return Divergence::Progress(Side::Left),
        (None, Some(_)) => return Divergence::Progress(Side::Right),
        (None, None) => return Divergence::Agree,
    };

    // Same text, different state: keep the further-along state.
    if left.value == right.value {
        return further_along(left, right);
    }

    match (left.is_translated(), right.is_translated()) {
        (true, true) => Divergence::Conflict,
        (false, true) => Divergence::Progress(Side::Right),
        (true, false) => Divergence::Progress(Side::Left),
        // Neither is translated: text beats a placeholder, then state decides.
        (false, false) => match (left.value.is_empty(), right.value.is_empty()) {
            (true, false) => Divergence::Progress(Side::Right),
            (false, true) => Divergence::Progress(Side::Left),
            _ => further_along(left, right),
        },
    }
}

/// Left wins ties.
fn further_along(left: &Localization, right: &Localization) -> Divergence {
    if state_rank(right.state) > state_rank(left.state) {
        Divergence::Progress(Side::Right)
    } else {
        Divergence::Progress(Side::Left)
    }
}

fn state_rank(state: EntryState) -> u8 {
    match state {
        EntryState::New => 0,
        EntryState::NeedsReview => 1,
        EntryState::Translated => 2,
    }
}

/// Result of folding two entries of one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub entry: Entry,
    /// Languages where both sides were translated and differ.
    pub conflicts: Vec<String>,
}

/// Folds `right` into `left`. Conflicted languages keep the left value;
/// key metadata takes the first non-empty value.
pub fn fold(left: &Entry, right: &Entry) -> Fold {
    if left == right {
        return Fold {
            entry: left.clone(),
            conflicts: Vec::new(),
        };
    }

    let languages: BTreeSet<&String> = left
        .localizations
        .keys()
        .chain(right.localizations.keys())
        .collect();

    let mut entry = Entry {
        comment: first_non_empty(&left.comment, &right.comment),
        extraction_state: first_non_empty(&left.extraction_state, &right.extraction_state),
        ..Entry::default()
    };
    let mut conflicts = Vec::new();

    for language in languages {
        let l = left.localizations.get(language);
        let r = right.localizations.get(language);
        let chosen = match classify(l, r) {
            Divergence::Agree | Divergence::Progress(Side::Left) => l,
            Divergence::Progress(Side::Right) => r,
            Divergence::Conflict => {
                conflicts.push(language.clone());
                l
            }
        };
        if let Some(localization) = chosen {
            entry.localizations.insert(language.clone(), localization.clone());
        }
    }

    Fold { entry, conflicts }
}

fn first_non_empty(left: &Option<String>, right: &Option<String>) -> Option<String> {
    left.iter()
        .chain(right.iter())
        .find(|value| !value.is_empty())
        .cloned()
}

/// Options for [`merge`] and [`merge_parsed`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOptions {
    pub parse: ParseOptions,
    /// Caller decisions, key → chosen entry. These bypass the fold.
    pub resolutions: BTreeMap<String, Entry>,
}

impl MergeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parse_options(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }

    pub fn with_resolution(mut self, key: impl Into<String>, entry: Entry) -> Self {
        self.resolutions.insert(key.into(), entry);
        self
    }

    pub fn with_resolutions(mut self, resolutions: BTreeMap<String, Entry>) -> Self {
        self.resolutions.extend(resolutions);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    pub total_keys: usize,
    /// Keys combined from two or more sources.
    pub merged_keys_count: usize,
    pub conflicts_resolved: usize,
    pub per_source_stats: Vec<SourceStats>,
    pub missing_keys: Vec<MissingKey>,
    pub log: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStats {
    pub name: String,
    pub keys: usize,
    pub languages: Vec<String>,
    /// Entries dropped while parsing (e.g. plurals without `other`).
    pub dropped: usize,
    /// Set when the source could not be parsed and was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub error: Option<String>,
}

impl SourceStats {
    fn parsed(parsed: &ParsedSource) -> Self {
        SourceStats {
            name: parsed.name.clone(),
            keys: parsed.catalog.len(),
            languages: parsed.catalog.languages().into_iter().collect(),
            dropped: parsed.dropped.len(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingKey {
    pub key: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    pub catalog: Catalog,
    pub report: MergeReport,
}

/// A source that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSource {
    pub name: String,
    pub error: String,
}

/// Parses every source in order, logging the ones that fail.
fn parse_all(
    sources: &[Source],
    options: &ParseOptions,
) -> Vec<Result<ParsedSource, SkippedSource>> {
    sources
        .iter()
        .map(|source| {
            source.parse(options).map_err(|e| {
                tracing::warn!(source = %source.name(), error = %e, "skipping malformed source");
                SkippedSource {
                    name: source.name().to_string(),
                    error: e.to_string(),
                }
            })
        })
        .collect()
}

/// Merges `sources` in the given order. A source that fails to parse is
/// skipped with a warning; the rest still merge.
pub fn merge(sources: &[Source], options: &MergeOptions) -> MergeResult {
    let outcomes = parse_all(sources, &options.parse);
    let parsed: Vec<ParsedSource> = outcomes
        .iter()
        .filter_map(|outcome| outcome.as_ref().ok())
        .cloned()
        .collect();
    let mut result = merge_parsed(&parsed, options);

    let mut log = Vec::new();
    let mut stats = Vec::with_capacity(outcomes.len());
    let mut parsed_stats = result.report.per_source_stats.into_iter();
    for outcome in &outcomes {
        match outcome {
            Ok(_) => stats.extend(parsed_stats.next()),
            Err(skip) => {
                log.push(format!("Skipped {}: {}", skip.name, skip.error));
                stats.push(SourceStats {
                    name: skip.name.clone(),
                    error: Some(skip.error.clone()),
                    ..SourceStats::default()
                });
            }
        }
    }
    log.append(&mut result.report.log);
    result.report.per_source_stats = stats;
    result.report.log = log;
    result
}

/// Merges already parsed sources in the given order.
pub fn merge_parsed(parsed: &[ParsedSource], options: &MergeOptions) -> MergeResult {
    let source_language = parsed
        .first()
        .map(|p| p.catalog.source_language.clone())
        .unwrap_or_else(|| options.parse.fallback_language.clone());

    let mut report = MergeReport {
        per_source_stats: parsed.iter().map(SourceStats::parsed).collect(),
        ..MergeReport::default()
    };
    for p in parsed {
        report.log.push(format!(
            "Loaded {} ({}): {} keys",
            p.name,
            p.format,
            p.catalog.len()
        ));
    }
    if let Some(mismatch) = source_language_mismatch(parsed) {
        let listed = mismatch
            .iter()
            .map(|d| format!("{}={}", d.source, d.source_language))
            .collect::<Vec<_>>()
            .join(", ");
        tracing::warn!("sources declare different source languages: {}", listed);
        report
            .log
            .push(format!("Sources declare different source languages: {}", listed));
    }

    let mut catalog = Catalog::new(source_language);
    for key in union_keys(parsed) {
        let present = entries_for(parsed, key);
        if present.len() > 1 {
            report.merged_keys_count += 1;
        }

        if let Some(resolved) = options.resolutions.get(key) {
            tracing::debug!(%key, "using caller resolution");
            report.conflicts_resolved += 1;
            report.log.push(format!("Resolved {} with caller-supplied entry", key));
            catalog.entries.insert(key.clone(), resolved.clone());
            continue;
        }

        let (entry, conflicts) = fold_all(&present);
        if !conflicts.is_empty() {
            let (first, _) = present[0];
            tracing::debug!(%key, languages = ?conflicts, "unresolved conflict");
            report.log.push(format!(
                "Conflict on {} [{}], kept value from {}",
                key,
                conflicts.join(", "),
                first
            ));
            report.missing_keys.push(MissingKey {
                key: key.clone(),
                reason: UNRESOLVED_CONFLICT.to_string(),
            });
        }
        catalog.entries.insert(key.clone(), entry);
    }

    for key in options.resolutions.keys() {
        if !catalog.entries.contains_key(key) {
            tracing::debug!(%key, "resolution for unknown key ignored");
            report
                .log
                .push(format!("Ignored resolution for unknown key {}", key));
        }
    }

    report.total_keys = catalog.len();
    report.log.push(format!(
        "Merged {} keys ({} from several sources, {} resolved, {} unresolved)",
        report.total_keys,
        report.merged_keys_count,
        report.conflicts_resolved,
        report.missing_keys.len()
    ));
    MergeResult { catalog, report }
}

fn union_keys(parsed: &[ParsedSource]) -> BTreeSet<&String> {
    parsed.iter().flat_map(|p| p.catalog.keys()).collect()
}

fn entries_for<'a>(parsed: &'a [ParsedSource], key: &str) -> Vec<(&'a str, &'a Entry)> {
    parsed
        .iter()
        .filter_map(|p| p.catalog.entries.get(key).map(|e| (p.name.as_str(), e)))
        .collect()
}

/// Folds all entries of one key left to right, collecting conflicted languages.
fn fold_all(present: &[(&str, &Entry)]) -> (Entry, Vec<String>) {
    let mut iter = present.iter();
    let Some((_, first)) = iter.next() else {
        return (Entry::default(), Vec::new());
    };
    let mut acc = (*first).clone();
    let mut conflicts = BTreeSet::new();
    for (_, next) in iter {
        let folded = fold(&acc, next);
        conflicts.extend(folded.conflicts);
        acc = folded.entry;
    }
    (acc, conflicts.into_iter().collect())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub source: String,
    pub entry: Entry,
}

/// A key whose sources carry different translations of the same language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConflict {
    pub key: String,
    pub languages: Vec<String>,
    /// Every source entry carrying the key, in source order.
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclaredLanguage {
    pub source: String,
    pub source_language: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub conflicts: Vec<MergeConflict>,
    /// Non-empty when sources declare different source languages.
    pub source_language_mismatch: Vec<DeclaredLanguage>,
    pub skipped: Vec<SkippedSource>,
}

/// Reports every conflicted key without deciding anything.
pub fn detect_conflicts(sources: &[Source], options: &ParseOptions) -> ConflictReport {
    let mut parsed = Vec::new();
    let mut skipped = Vec::new();
    for outcome in parse_all(sources, options) {
        match outcome {
            Ok(p) => parsed.push(p),
            Err(skip) => skipped.push(skip),
        }
    }
    ConflictReport {
        skipped,
        ..detect_conflicts_parsed(&parsed)
    }
}

pub fn detect_conflicts_parsed(parsed: &[ParsedSource]) -> ConflictReport {
    let mut conflicts = Vec::new();
    for key in union_keys(parsed) {
        let present = entries_for(parsed, key);
        if present.len() < 2 {
            continue;
        }
        let (_, languages) = fold_all(&present);
        if languages.is_empty() {
            continue;
        }
        conflicts.push(MergeConflict {
            key: key.clone(),
            languages,
            candidates: present
                .into_iter()
                .map(|(source, entry)| Candidate {
                    source: source.to_string(),
                    entry: entry.clone(),
                })
                .collect(),
        });
    }

    ConflictReport {
        conflicts,
        source_language_mismatch: source_language_mismatch(parsed).unwrap_or_default(),
        skipped: Vec::new(),
    }
}

/// Only String Catalogs declare a source language; other formats get the
/// fallback and are not compared.
fn source_language_mismatch(parsed: &[ParsedSource]) -> Option<Vec<DeclaredLanguage>> {
    let declared: Vec<DeclaredLanguage> = parsed
        .iter()
        .filter(|p| p.format == FormatType::Xcstrings)
        .map(|p| DeclaredLanguage {
            source: p.name.clone(),
            source_language: p.catalog.source_language.clone(),
        })
        .collect();
    let distinct: BTreeSet<&str> = declared.iter().map(|d| d.source_language.as_str()).collect();
    (distinct.len() > 1).then_some(declared)
}
