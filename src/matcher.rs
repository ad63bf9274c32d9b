use crate::error::TailError;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::warn;

/// Result of filtering candidates against a pattern set.
#[derive(Debug)]
pub struct Matches<T> {
    pub selected: Vec<T>,
    /// Patterns that failed to compile and were skipped.
    pub invalid: Vec<TailError>,
}

/// Keep every candidate whose `name` matches at least one pattern.
///
/// Candidates are deduplicated on `key` and returned sorted by it. A pattern
/// that is not a valid regex is logged and skipped, the remaining patterns
/// still apply. Callers short-circuit the empty pattern set themselves.
pub fn filter_matching<T, K, F, N>(
    candidates: Vec<T>,
    patterns: &[String],
    key: F,
    name: N,
) -> Matches<T>
where
    K: Ord,
    F: Fn(&T) -> K,
    N: Fn(&T) -> &str,
{
    let mut invalid = Vec::new();
    let regexes: Vec<Regex> = patterns
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(source) => {
                warn!("Skipping invalid pattern '{}': {}", pattern, source);
                invalid.push(TailError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                });
                None
            }
        })
        .collect();

    let mut set = BTreeMap::new();
    for candidate in candidates {
        if regexes.iter().any(|re| re.is_match(name(&candidate))) {
            set.entry(key(&candidate)).or_insert(candidate);
        }
    }

    Matches {
        selected: set.into_values().collect(),
        invalid,
    }
}

/// Plain-string flavour of [`filter_matching`].
pub fn filter_names(names: Vec<String>, patterns: &[String]) -> Matches<String> {
    filter_matching(names, patterns, |n| n.clone(), |n| n.as_str())
}
