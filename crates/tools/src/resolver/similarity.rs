//! Pluggable similarity scoring for the fuzzy resolution tier.

/// Scores how close two normalized keys are, in `[0.0, 1.0]`.
///
/// Implementations must be pure: the same pair always yields the same score.
pub trait SimilarityScorer: Send + Sync {
    fn score(&self, candidate: &str, target: &str) -> f64;
}

/// `1 - levenshtein(a, b) / max(len(a), len(b))`, measured in chars.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevenshteinScorer;

impl SimilarityScorer for LevenshteinScorer {
    fn score(&self, candidate: &str, target: &str) -> f64 {
        let longest = candidate.chars().count().max(target.chars().count());
        if longest == 0 {
            return 1.0;
        }
        1.0 - levenshtein(candidate, target) as f64 / longest as f64
    }
}

/// Compares keys token by token, scoring the weakest aligned pair.
///
/// Every `_`-separated token must be close on its own, so a typo in one word
/// still matches while a different verb (`import` vs `export`) does not.
/// Keys with different token counts score `0.0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenwiseScorer<S = LevenshteinScorer> {
    inner: S,
}

impl<S: SimilarityScorer> TokenwiseScorer<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: SimilarityScorer> SimilarityScorer for TokenwiseScorer<S> {
    fn score(&self, candidate: &str, target: &str) -> f64 {
        let a: Vec<&str> = candidate.split('_').filter(|t| !t.is_empty()).collect();
        let b: Vec<&str> = target.split('_').filter(|t| !t.is_empty()).collect();
        if a.len() != b.len() {
            return 0.0;
        }
        if a.is_empty() {
            return 1.0;
        }
        a.iter()
            .zip(&b)
            .map(|(x, y)| self.inner.score(x, y))
            .fold(1.0, f64::min)
    }
}

/// Jaccard overlap of `_`-separated tokens. Ignores token order.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenOverlapScorer;

impl SimilarityScorer for TokenOverlapScorer {
    fn score(&self, candidate: &str, target: &str) -> f64 {
        use std::collections::BTreeSet;
        let a: BTreeSet<&str> = candidate.split('_').filter(|t| !t.is_empty()).collect();
        let b: BTreeSet<&str> = target.split('_').filter(|t| !t.is_empty()).collect();
        let union = a.union(&b).count();
        if union == 0 {
            return 1.0;
        }
        a.intersection(&b).count() as f64 / union as f64
    }
}

pub fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}
