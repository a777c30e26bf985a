use std::collections::HashSet;

/// Expand glob patterns in a list of inputs into concrete file paths.
///
/// Inputs keep their relative order (matches of one pattern are sorted), so
/// the expanded list is still a valid merge order. A pattern without matches
/// is kept as-is to surface the error when it is read.
pub fn expand_input_globs(inputs: &[String]) -> Result<Vec<String>, String> {
    fn has_glob_meta(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut results = Vec::with_capacity(inputs.len());

    for input in inputs {
        if !has_glob_meta(input) {
            if seen.insert(input.clone()) {
                results.push(input.clone());
            }
            continue;
        }

        let paths = glob::glob(input)
            .map_err(|e| format!("Invalid glob pattern '{}': {}", input, e))?;
        let mut matched: Vec<String> = paths
            .filter_map(|entry| match entry {
                Ok(path) if path.is_file() => Some(path.display().to_string()),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(pattern = %input, error = %e, "unreadable glob match");
                    None
                }
            })
            .collect();
        matched.sort();

        if matched.is_empty() {
            tracing::warn!(pattern = %input, "glob pattern matched no files");
            matched.push(input.clone());
        }
        for path in matched {
            if seen.insert(path.clone()) {
                results.push(path);
            }
        }
    }

    Ok(results)
}
