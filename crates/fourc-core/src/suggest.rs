//! # Close-Match Suggestions
//!
//! "Did you mean ...?" hints for unknown section and field names. Similarity
//! is the normalized Levenshtein ratio over case-folded characters, so
//! `structural dynamic` still finds `STRUCTURAL DYNAMIC`.

/// Minimum similarity for a candidate to be suggested.
pub const SUGGESTION_CUTOFF: f64 = 0.6;

/// Similarity in `[0, 1]` between two names, case-insensitive.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().flat_map(char::to_uppercase).collect();
    let b: Vec<char> = b.chars().flat_map(char::to_uppercase).collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / longest as f64
}

/// The candidate most similar to `name`, if any reaches [`SUGGESTION_CUTOFF`].
///
/// Ties resolve to the candidate seen first.
pub fn closest_match<'a, I>(name: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, f64)> = None;
    for candidate in candidates {
        let score = similarity(name, candidate);
        if score < SUGGESTION_CUTOFF {
            continue;
        }
        match best {
            Some((_, best_score)) if best_score >= score => {}
            _ => best = Some((candidate, score)),
        }
    }
    best.map(|(candidate, _)| candidate)
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_names() {
        assert_eq!(similarity("PROBLEM TYPE", "PROBLEM TYPE"), 1.0);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(similarity("solver", "SOLVER"), 1.0);
    }

    #[test]
    fn test_closest_match_picks_best() {
        let sections = ["STRUCTURAL DYNAMIC", "SOLVER 1", "PROBLEM TYPE"];
        assert_eq!(
            closest_match("STRUCTURAL DYNAMICS", sections),
            Some("STRUCTURAL DYNAMIC")
        );
        assert_eq!(closest_match("problem typ", sections), Some("PROBLEM TYPE"));
    }

    #[test]
    fn test_no_match_below_cutoff() {
        assert_eq!(closest_match("xyz", ["STRUCTURAL DYNAMIC"]), None);
    }

    #[test]
    fn test_levenshtein_distances() {
        let d = |a: &str, b: &str| {
            levenshtein(
                &a.chars().collect::<Vec<_>>(),
                &b.chars().collect::<Vec<_>>(),
            )
        };
        assert_eq!(d("kitten", "sitting"), 3);
        assert_eq!(d("", "abc"), 3);
        assert_eq!(d("abc", "abc"), 0);
    }
}
