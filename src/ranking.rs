//! Search Result Ranking
//!
//! Orders free-text search candidates by relevance to the query:
//! 1. exact name match first,
//! 2. then earlier position of the query inside the name (names not
//!    containing it last),
//! 3. then smaller Levenshtein distance between name and query.
//!
//! The sort is stable, so candidates with equal keys keep catalog order.

use crate::upstream::SearchResult;

/// Orders `results` by relevance to `query`.
pub fn rank(results: Vec<SearchResult>, query: &str, ignore_case: bool) -> Vec<SearchResult> {
    let query = normalize(query, ignore_case);

    let mut keyed: Vec<(RankKey, SearchResult)> = results
        .into_iter()
        .map(|result| (RankKey::new(&normalize(&result.name, ignore_case), &query), result))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    keyed.into_iter().map(|(_, result)| result).collect()
}

fn normalize(text: &str, ignore_case: bool) -> String {
    if ignore_case {
        text.to_lowercase()
    } else {
        text.to_string()
    }
}

// Field order is the priority order; derive(Ord) compares lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct RankKey {
    not_exact: bool,
    /// Char offset of the query in the name, `usize::MAX` when absent
    position: usize,
    distance: usize,
}

impl RankKey {
    fn new(name: &str, query: &str) -> Self {
        let position = name
            .find(query)
            .map(|byte_idx| name[..byte_idx].chars().count())
            .unwrap_or(usize::MAX);

        Self {
            not_exact: name != query,
            position,
            distance: levenshtein(name, query),
        }
    }
}

/// Classic dynamic-programming edit distance over chars, unit costs.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two rolling rows of the (len a + 1) x (len b + 1) table
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            let deletion = prev[j + 1] + 1;
            let insertion = curr[j] + 1;
            curr[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
