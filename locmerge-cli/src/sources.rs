use locmerge::{ParseOptions, ParsedSource, Source};

use crate::path_glob::expand_input_globs;

/// Reads every input (after glob expansion) in order.
///
/// Unreadable files are skipped with a warning. Fails only when nothing at
/// all could be read.
pub fn read_sources(inputs: &[String]) -> Result<Vec<Source>, String> {
    if inputs.is_empty() {
        return Err("At least one input file is required.".to_string());
    }

    let paths = expand_input_globs(inputs)?;
    let mut sources = Vec::with_capacity(paths.len());
    for path in &paths {
        match Source::read_from(path) {
            Ok(source) => sources.push(source),
            Err(e) => tracing::warn!(input = %path, error = %e, "skipping unreadable input"),
        }
    }

    if sources.is_empty() {
        return Err(format!("None of the {} input(s) could be read.", paths.len()));
    }
    Ok(sources)
}

/// Parses sources for the read-only commands, skipping the ones that fail.
pub fn parse_sources(
    sources: &[Source],
    options: &ParseOptions,
) -> Result<Vec<ParsedSource>, String> {
    let parsed: Vec<ParsedSource> = sources
        .iter()
        .filter_map(|source| match source.parse(options) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed source");
                None
            }
        })
        .collect();

    if parsed.is_empty() {
        return Err("No input could be parsed.".to_string());
    }
    Ok(parsed)
}

/// `--lang` names the language of inputs whose path and header do not.
pub fn parse_options(lang: Option<&str>) -> ParseOptions {
    ParseOptions::new().with_language_hint(lang.map(str::to_string))
}
