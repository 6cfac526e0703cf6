use crate::engine::normalize::normalize;

/// Maximum candidate snippets attached to an anchor-not-found diagnostic.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 3;

/// Collect candidate context snippets for an anchor that failed to match.
///
/// Scans the buffer for lines containing the first line of the unmatched
/// search text as a substring (normalized on both sides) and emits the
/// surrounding window of lines, window length equal to the search text's
/// line count. When more windows match than `limit`, the closest by edit
/// distance to the search text are kept.
///
/// Suggestions aid operator or model self-correction; the engine never
/// retries on its own.
pub fn suggest(content: &str, search: &str, limit: usize) -> Vec<String> {
    let norm_search = normalize(search);
    let first_line = match norm_search.lines().next().map(str::trim) {
        Some(line) if !line.is_empty() => line,
        _ => return Vec::new(),
    };
    let window = norm_search.lines().count().max(1);

    let lines: Vec<&str> = content.lines().collect();
    let mut candidates = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if normalize(line).contains(first_line) {
            let end = (idx + window).min(lines.len());
            candidates.push(lines[idx..end].join("\n"));
        }
    }

    if candidates.len() > limit {
        candidates.sort_by(|a, b| {
            let score_a = strsim::normalized_levenshtein(&normalize(a), &norm_search);
            let score_b = strsim::normalized_levenshtein(&normalize(b), &norm_search);
            score_b
                .partial_cmp(&score_a)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(limit);
    }

    candidates
}
