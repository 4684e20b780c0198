use crate::geonames::Candidate;

/// Index of the candidate whose title equals `query`, ignoring case.
///
/// Every candidate is compared and the last match wins. Without a match the
/// first candidate is used. `None` only for an empty list.
pub fn select_best_match(candidates: &[Candidate], query: &str) -> Option<usize> {
    if candidates.is_empty() {
        return None;
    }
    let query = query.to_lowercase();
    let mut best = 0;
    for (i, c) in candidates.iter().enumerate() {
        if c.title.to_lowercase() == query {
            best = i;
        }
    }
    Some(best)
}
