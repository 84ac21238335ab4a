//! Fuzzy matching for misspelled kinds and keys

use strsim::levenshtein;

/// Maximum Levenshtein distance to consider for suggestions
pub const MAX_SUGGESTION_DISTANCE: usize = 2;

/// A candidate correction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    /// Levenshtein distance (lower = better match)
    pub distance: usize,
}

/// Candidates within [`MAX_SUGGESTION_DISTANCE`] of `input`, closest first
///
/// Exact matches are not suggestions. Ties keep candidate order.
pub fn find_closest_matches<'a>(
    input: &str,
    candidates: impl IntoIterator<Item = &'a str>,
    max_results: usize,
) -> Vec<Suggestion> {
    let mut suggestions: Vec<Suggestion> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let distance = levenshtein(input, candidate);
            (distance > 0 && distance <= MAX_SUGGESTION_DISTANCE).then(|| Suggestion {
                text: candidate.to_string(),
                distance,
            })
        })
        .collect();

    suggestions.sort_by_key(|s| s.distance);
    suggestions.truncate(max_results);
    suggestions
}

/// Format as "Did you mean `x`?" or "Did you mean one of: `a`, `b`?"
pub fn did_you_mean(suggestions: &[Suggestion]) -> Option<String> {
    match suggestions {
        [] => None,
        [only] => Some(format!("Did you mean `{}`?", only.text)),
        many => {
            let names: Vec<String> = many.iter().map(|s| format!("`{}`", s.text)).collect();
            Some(format!("Did you mean one of: {}?", names.join(", ")))
        }
    }
}
