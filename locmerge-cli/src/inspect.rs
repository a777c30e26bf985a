use locmerge::analysis::{WordCount, find_duplicates, word_counts};
use serde::Serialize;

use crate::sources::{parse_options, parse_sources, read_sources};

/// Prints groups of repeated values as JSON. Loose groups only with `--loose`.
pub fn run_duplicates_command(inputs: Vec<String>, loose: bool) -> Result<(), String> {
    let sources = read_sources(&inputs)?;
    let parsed = parse_sources(&sources, &parse_options(None))?;

    let mut report = find_duplicates(parsed.iter().map(|p| (p.name.as_str(), &p.catalog)));
    if !loose {
        report.loose.clear();
    }
    print_json(&report)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WordSummary {
    counts: Vec<WordCount>,
    translated_words: usize,
    pending_words: usize,
}

/// Prints per-file, per-language word counts as JSON.
pub fn run_words_command(inputs: Vec<String>, lang: Option<String>) -> Result<(), String> {
    let sources = read_sources(&inputs)?;
    let parsed = parse_sources(&sources, &parse_options(lang.as_deref()))?;

    let counts = word_counts(parsed.iter().map(|p| (p.name.as_str(), &p.catalog)));
    let summary = WordSummary {
        translated_words: counts.iter().map(|c| c.translated_words).sum(),
        pending_words: counts.iter().map(|c| c.pending_words).sum(),
        counts,
    };
    print_json(&summary)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Error serializing output: {}", e))?;
    println!("{}", json);
    Ok(())
}
