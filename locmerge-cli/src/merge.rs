use std::collections::BTreeMap;
use std::fs;

use locmerge::{Entry, JsonStyle, MergeOptions, detect_conflicts, merge};

use crate::sources::{parse_options, read_sources};

pub struct MergeArgs {
    pub inputs: Vec<String>,
    pub output: String,
    pub lang: Option<String>,
    pub resolutions: Option<String>,
    pub report: Option<String>,
    pub style: JsonStyle,
}

/// Run the merge command: merge multiple localization files into one output file.
pub fn run_merge_command(args: MergeArgs) -> Result<(), String> {
    let sources = read_sources(&args.inputs)?;

    let mut options = MergeOptions::new().with_parse_options(parse_options(args.lang.as_deref()));
    if let Some(path) = &args.resolutions {
        options = options.with_resolutions(read_resolutions(path)?);
    }

    let result = merge(&sources, &options);
    let usable = result
        .report
        .per_source_stats
        .iter()
        .filter(|stats| stats.error.is_none())
        .count();
    if usable == 0 {
        return Err("No input could be parsed; nothing to merge.".to_string());
    }

    for line in &result.report.log {
        tracing::info!("{}", line);
    }

    result
        .catalog
        .write_file(&args.output, args.lang.as_deref(), args.style)
        .map_err(|e| format!("Error writing to {}: {}", args.output, e))?;

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&result.report)
            .map_err(|e| format!("Error serializing merge report: {}", e))?;
        fs::write(path, json).map_err(|e| format!("Error writing report to {}: {}", path, e))?;
    }

    println!(
        "Merged {} keys from {} of {} sources into {}",
        result.report.total_keys,
        usable,
        sources.len(),
        args.output
    );
    for missing in &result.report.missing_keys {
        eprintln!("warning: {}: {}", missing.key, missing.reason);
    }
    Ok(())
}

/// Resolutions are a JSON object mapping keys to the entry to keep.
fn read_resolutions(path: &str) -> Result<BTreeMap<String, Entry>, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("Error reading resolutions {}: {}", path, e))?;
    serde_json::from_str(&content).map_err(|e| format!("Invalid resolutions in {}: {}", path, e))
}

/// Prints the conflict analysis of `inputs` as JSON.
pub fn run_conflicts_command(inputs: Vec<String>, lang: Option<String>) -> Result<(), String> {
    let sources = read_sources(&inputs)?;
    let report = detect_conflicts(&sources, &parse_options(lang.as_deref()));
    if report.skipped.len() == sources.len() {
        return Err("No input could be parsed.".to_string());
    }

    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| format!("Error serializing conflict report: {}", e))?;
    println!("{}", json);
    Ok(())
}
