//! "Did you mean" suggestions based on edit distance.

/// Maximum edit distance for a candidate to be suggested.
pub const DEFAULT_MAX_DISTANCE: usize = 2;

/// Levenshtein distance between two strings, counted in characters.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != *cb);
            cur[j + 1] = substitution.min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    prev[b.len()]
}

/// Candidates within `max_distance` edits of `target`, closest first.
///
/// Ties keep the order in which candidates were given, which callers supply
/// in declaration order. Exact matches and repeated names are skipped.
pub fn find_similar_names<S: AsRef<str>>(target: &str, candidates: &[S], max_distance: usize) -> Vec<String> {
    let mut scored: Vec<(usize, &str)> = Vec::new();
    for candidate in candidates {
        let candidate = candidate.as_ref();
        if candidate == target || scored.iter().any(|(_, seen)| *seen == candidate) {
            continue;
        }
        let distance = edit_distance(target, candidate);
        if distance <= max_distance {
            scored.push((distance, candidate));
        }
    }
    // sort_by_key is stable, so equal distances stay in declaration order
    scored.sort_by_key(|(distance, _)| *distance);
    scored.into_iter().map(|(_, name)| name.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("positon", "position"), 1);
        assert_eq!(edit_distance("xyz", "xzy"), 2);
    }

    #[test]
    fn test_closest_first() {
        let candidates = ["normal", "position", "positions", "color"];
        let found = find_similar_names("positon", &candidates, DEFAULT_MAX_DISTANCE);
        assert_eq!(found, vec!["position".to_string(), "positions".to_string()]);
    }

    #[test]
    fn test_ties_keep_declaration_order() {
        let candidates = ["cat", "bat", "hat"];
        let found = find_similar_names("rat", &candidates, 1);
        assert_eq!(found, vec!["cat", "bat", "hat"]);
    }

    #[test]
    fn test_respects_max_distance() {
        let candidates = ["uv", "texture_coords"];
        assert!(find_similar_names("tex_coord", &candidates, DEFAULT_MAX_DISTANCE).is_empty());
    }

    #[test]
    fn test_skips_duplicates_and_exact_match() {
        let candidates = ["time", "tim", "tim"];
        assert_eq!(find_similar_names("time", &candidates, 2), vec!["tim"]);
    }
}
