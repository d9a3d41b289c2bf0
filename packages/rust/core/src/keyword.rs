//! Lexical scoring used when the semantic path is unavailable.
//!
//! Scores are small non-negative integers built from token overlap plus
//! vocabulary, role, duration and test-type bonuses.

use std::collections::HashSet;
use std::sync::LazyLock;

use assessrank_catalog::Catalog;
use assessrank_shared::{AssessmentRecord, KeywordsConfig};
use regex::Regex;

use crate::candidate::{ScoreSource, ScoredCandidate};

// ---------------------------------------------------------------------------
// Bonus tables
// ---------------------------------------------------------------------------

/// Points for a vocabulary hit, by where in the record it was found.
#[derive(Debug, Clone, Copy)]
struct Placement {
    name: u32,
    description: u32,
    elsewhere: u32,
}

const TECHNICAL_POINTS: Placement = Placement {
    name: 5,
    description: 3,
    elsewhere: 1,
};

const BEHAVIORAL_POINTS: Placement = Placement {
    name: 4,
    description: 2,
    elsewhere: 1,
};

const ROLE_POINTS: u32 = 2;

/// +`points` when the query mentions any of `query_any` and the record's
/// joined labels contain any of `labels_any`.
struct TestTypeBonus {
    query_any: &'static [&'static str],
    labels_any: &'static [&'static str],
    points: u32,
}

const TEST_TYPE_BONUSES: &[TestTypeBonus] = &[
    TestTypeBonus {
        query_any: &["knowledge", "skill", "technical"],
        labels_any: &["knowledge", "skill"],
        points: 3,
    },
    TestTypeBonus {
        query_any: &["personality", "behavioral", "culture"],
        labels_any: &["personality", "behavior"],
        points: 3,
    },
    TestTypeBonus {
        query_any: &["cognitive", "aptitude"],
        labels_any: &["ability", "aptitude"],
        points: 3,
    },
];

/// (max difference in minutes, points), checked in order.
const DURATION_BANDS: &[(u32, u32)] = &[(15, 3), (30, 1)];

// ---------------------------------------------------------------------------
// Duration parsing
// ---------------------------------------------------------------------------

static MINUTES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(?:minutes?|mins?)").expect("valid regex"));
static HOURS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(?:hours?|hrs?)").expect("valid regex"));

/// The first duration the query mentions, in minutes.
///
/// Minutes are tried before hours; the first pattern that matches decides.
/// A range such as `30-40 minutes` resolves to its upper figure, the one
/// adjacent to the unit. Zero counts as no duration.
pub fn parse_duration(query: &str) -> Option<u32> {
    let query = query.to_lowercase();

    let minutes = if let Some(caps) = MINUTES_RE.captures(&query) {
        caps[1].parse::<u32>().ok()
    } else if let Some(caps) = HOURS_RE.captures(&query) {
        caps[1].parse::<u32>().ok().map(|h| h.saturating_mul(60))
    } else {
        None
    };

    minutes.filter(|m| *m > 0)
}

// ---------------------------------------------------------------------------
// KeywordScorer
// ---------------------------------------------------------------------------

/// A query prepared once for scoring against every record.
#[derive(Debug, Clone)]
pub struct QueryTerms {
    lower: String,
    tokens: HashSet<String>,
    duration: Option<u32>,
}

impl QueryTerms {
    pub fn new(query: &str) -> Self {
        let lower = query.to_lowercase();
        let tokens = lower.split_whitespace().map(str::to_string).collect();
        Self {
            duration: parse_duration(&lower),
            tokens,
            lower,
        }
    }

    pub fn duration(&self) -> Option<u32> {
        self.duration
    }
}

/// Deterministic lexical ranker over the whole catalog.
#[derive(Debug, Clone)]
pub struct KeywordScorer {
    technical: HashSet<String>,
    behavioral: HashSet<String>,
    roles: HashSet<String>,
}

impl KeywordScorer {
    pub fn from_config(keywords: &KeywordsConfig) -> Self {
        let set = |words: &[String]| words.iter().map(|w| w.to_lowercase()).collect();
        Self {
            technical: set(&keywords.scorer_technical),
            behavioral: set(&keywords.scorer_behavioral),
            roles: set(&keywords.scorer_roles),
        }
    }

    /// Score one record against a prepared query.
    pub fn score(&self, query: &QueryTerms, record: &AssessmentRecord) -> u32 {
        let text = record.search_text().to_lowercase();
        let name = record.name.to_lowercase();
        let description = record.description.to_lowercase();

        let text_tokens: HashSet<&str> = text.split_whitespace().collect();
        let mut score = query
            .tokens
            .iter()
            .filter(|t| text_tokens.contains(t.as_str()))
            .count() as u32;

        let placed = |word: &str, points: Placement| {
            if name.contains(word) {
                points.name
            } else if description.contains(word) {
                points.description
            } else if text.contains(word) {
                points.elsewhere
            } else {
                0
            }
        };

        for token in &query.tokens {
            if self.technical.contains(token) {
                score += placed(token.as_str(), TECHNICAL_POINTS);
            }
            if self.behavioral.contains(token) {
                score += placed(token.as_str(), BEHAVIORAL_POINTS);
            }
            if self.roles.contains(token)
                && (name.contains(token.as_str()) || description.contains(token.as_str()))
            {
                score += ROLE_POINTS;
            }
        }

        if let Some(wanted) = query.duration {
            let diff = record.duration.abs_diff(wanted);
            if let Some((_, points)) = DURATION_BANDS.iter().find(|(max, _)| diff <= *max) {
                score += points;
            }
        }

        let labels = record.test_types_lower();
        for bonus in TEST_TYPE_BONUSES {
            if bonus.query_any.iter().any(|w| query.lower.contains(*w))
                && bonus.labels_any.iter().any(|l| labels.contains(*l))
            {
                score += bonus.points;
            }
        }

        score
    }

    /// Rank the catalog for `query`, returning at most `top_k` candidates.
    ///
    /// Records scoring zero are left out, then the result is padded with
    /// unlisted records in catalog order (score 0) up to `top_k`.
    pub fn recommend(
        &self,
        query: &str,
        catalog: &Catalog,
        top_k: usize,
    ) -> Vec<ScoredCandidate> {
        let terms = QueryTerms::new(query);

        let mut scored: Vec<(u32, &AssessmentRecord)> = catalog
            .iter()
            .map(|record| (self.score(&terms, record), record))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let mut results: Vec<ScoredCandidate> = scored
            .into_iter()
            .map(|(score, record)| ScoredCandidate::new(record, score as f32, ScoreSource::Keyword))
            .collect();

        if results.len() < top_k {
            let listed: HashSet<String> = results.iter().map(|c| c.record.url.clone()).collect();
            for record in catalog.iter().filter(|r| !listed.contains(&r.url)) {
                if results.len() >= top_k {
                    break;
                }
                results.push(ScoredCandidate::new(record, 0.0, ScoreSource::Keyword));
            }
        }

        results.truncate(top_k);
        results
    }
}

impl Default for KeywordScorer {
    fn default() -> Self {
        Self::from_config(&KeywordsConfig::default())
    }
}
