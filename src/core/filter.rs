//! Fuzzy filtering of document notes.
//!
//! A term is split on whitespace; every token must fuzzy-match the candidate
//! (skim algorithm). The candidate's score is the sum of its token scores.

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

/// Score `value` against `term`, or `None` if any token fails to match.
/// An empty term matches everything with score 0.
pub fn score(matcher: &SkimMatcherV2, term: &str, value: &str) -> Option<i64> {
    term.split_whitespace()
        .map(|token| matcher.fuzzy_match(value, &token.to_lowercase()))
        .sum()
}

/// Indices of the matching candidates, best match first. Ties keep their
/// original (discovery) order.
pub fn rank(term: &str, candidates: &[(usize, String)]) -> Vec<usize> {
    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, usize)> = candidates
        .iter()
        .filter_map(|(index, value)| score(&matcher, term, value).map(|s| (s, *index)))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, index)| index).collect()
}
