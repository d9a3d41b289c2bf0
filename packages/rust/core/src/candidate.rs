//! Scored views over catalog records, produced and discarded per request.

use std::collections::HashSet;

use assessrank_shared::AssessmentRecord;

/// Which step placed a candidate in the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    /// Cosine similarity against the query embedding, in [-1, 1].
    Semantic,
    /// Additive keyword score, ≥ 0.
    Keyword,
    /// Added only to reach the minimum result count.
    Padding,
}

/// A catalog record paired with the score that ranked it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub record: AssessmentRecord,
    pub score: f32,
    pub source: ScoreSource,
}

impl ScoredCandidate {
    pub fn new(record: &AssessmentRecord, score: f32, source: ScoreSource) -> Self {
        Self {
            record: record.clone(),
            score,
            source,
        }
    }

    pub fn url(&self) -> &str {
        &self.record.url
    }
}

/// Drop later candidates whose URL was already seen, preserving order.
pub fn dedup_by_url(candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.record.url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;

    #[test]
    fn dedup_keeps_first_occurrence() {
        let a = record("a", "A", "", 60, &[]);
        let b = record("b", "B", "", 60, &[]);
        let out = dedup_by_url(vec![
            ScoredCandidate::new(&a, 0.9, ScoreSource::Semantic),
            ScoredCandidate::new(&b, 0.8, ScoreSource::Semantic),
            ScoredCandidate::new(&a, 0.1, ScoreSource::Semantic),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].url(), "a");
        assert_eq!(out[0].score, 0.9);
        assert_eq!(out[1].url(), "b");
    }
}
