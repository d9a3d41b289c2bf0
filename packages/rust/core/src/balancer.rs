//! Intent-aware reshaping of the similarity pool.

use std::collections::HashSet;

use assessrank_catalog::Catalog;
use assessrank_shared::AssessmentRecord;
use tracing::debug;

use crate::SemanticFault;
use crate::candidate::{ScoreSource, ScoredCandidate, dedup_by_url};
use crate::rules::{Bucket, IntentDetector, categorize, mix_rule_for, quotas};

/// Mixes categories in the over-fetched pool according to the query's intent.
#[derive(Debug, Clone, Default)]
pub struct CategoryBalancer {
    detector: IntentDetector,
}

impl CategoryBalancer {
    pub fn new(detector: IntentDetector) -> Self {
        Self { detector }
    }

    /// Select up to `top_k` candidates from `pool`.
    ///
    /// `pool` is `(catalog index, similarity)` in descending similarity.
    /// Each bucket is consumed in pool order up to its quota; shortfalls are
    /// filled from the whole pool, skipping URLs already chosen.
    pub fn balance(
        &self,
        query: &str,
        pool: &[(usize, f32)],
        catalog: &Catalog,
        top_k: usize,
    ) -> Result<Vec<ScoredCandidate>, SemanticFault> {
        let candidates = pool
            .iter()
            .map(|&(index, score)| {
                catalog
                    .get(index)
                    .map(|record| ScoredCandidate::new(record, score, ScoreSource::Semantic))
                    .ok_or_else(|| {
                        SemanticFault::RankingFailure(format!("pool index {index} outside catalog"))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut buckets: [Vec<&ScoredCandidate>; 5] = Default::default();
        for candidate in &candidates {
            buckets[categorize(&candidate.record).index()].push(candidate);
        }

        let intents = self.detector.detect(query);
        let rule = mix_rule_for(&intents);
        debug!(?intents, rule = rule.name, pool = candidates.len(), "balancing candidates");

        let mut selected: Vec<ScoredCandidate> = Vec::with_capacity(top_k);
        for (bucket, quota) in quotas(rule, top_k) {
            selected.extend(buckets[bucket.index()].iter().take(quota).map(|c| (*c).clone()));
        }

        if selected.len() < top_k {
            let needed = top_k - selected.len();
            let chosen: HashSet<&str> = selected.iter().map(ScoredCandidate::url).collect();
            let fill: Vec<ScoredCandidate> = candidates
                .iter()
                .filter(|c| !chosen.contains(c.url()))
                .take(needed)
                .cloned()
                .collect();
            selected.extend(fill);
        }

        let mut selected = dedup_by_url(selected);
        selected.truncate(top_k);
        Ok(selected)
    }
}

/// Count how many candidates fall in each bucket.
pub fn bucket_counts<'a>(
    records: impl IntoIterator<Item = &'a AssessmentRecord>,
) -> [(Bucket, usize); 5] {
    let mut counts = Bucket::ALL.map(|b| (b, 0));
    for record in records {
        counts[categorize(record).index()].1 += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;

    const TECH: &[&str] = &["Knowledge & Skills"];
    const BEHAV: &[&str] = &["Personality & Behavior"];
    const COG: &[&str] = &["Ability & Aptitude"];
    const COMP: &[&str] = &["Competencies"];
    const SIM: &[&str] = &["Simulations"];

    /// 20 technical, 20 behavioral, 10 cognitive, interleaved.
    fn mixed_catalog() -> Catalog {
        let mut records = Vec::new();
        for i in 0..20 {
            records.push(record(&format!("t{i}"), &format!("Tech {i}"), "", 30, TECH));
            records.push(record(&format!("b{i}"), &format!("Behav {i}"), "", 30, BEHAV));
            if i < 10 {
                records.push(record(&format!("c{i}"), &format!("Cog {i}"), "", 30, COG));
            }
        }
        Catalog::from_records(records)
    }

    fn pool_in_catalog_order(catalog: &Catalog, limit: usize) -> Vec<(usize, f32)> {
        (0..catalog.len().min(limit))
            .map(|i| (i, 1.0 - i as f32 / 100.0))
            .collect()
    }

    fn count(results: &[ScoredCandidate], bucket: Bucket) -> usize {
        results.iter().filter(|c| categorize(&c.record) == bucket).count()
    }

    #[test]
    fn technical_query_caps_cognitive() {
        let catalog = mixed_catalog();
        let pool = pool_in_catalog_order(&catalog, 20);
        let results = CategoryBalancer::default()
            .balance("Java developer, 40 minutes", &pool, &catalog, 10)
            .unwrap();

        // the interleaved pool holds only 7 technical records
        assert_eq!(results.len(), 10);
        assert_eq!(count(&results, Bucket::Technical), 7);
        assert_eq!(count(&results, Bucket::Cognitive), 2);
        assert_eq!(count(&results, Bucket::Behavioral), 1);
    }

    #[test]
    fn technical_and_behavioral_split_in_half() {
        let catalog = mixed_catalog();
        let pool = pool_in_catalog_order(&catalog, 50);
        let results = CategoryBalancer::default()
            .balance("Java developer who can collaborate", &pool, &catalog, 10)
            .unwrap();

        assert_eq!(count(&results, Bucket::Technical), 5);
        assert_eq!(count(&results, Bucket::Behavioral), 5);
        // buckets are concatenated technical first
        assert!(results[..5].iter().all(|c| c.url().starts_with('t')));
    }

    #[test]
    fn behavioral_query_takes_two_cognitive() {
        let catalog = mixed_catalog();
        let pool = pool_in_catalog_order(&catalog, 50);
        let results = CategoryBalancer::default()
            .balance("personality profile for team work", &pool, &catalog, 10)
            .unwrap();

        assert_eq!(results.len(), 10);
        assert_eq!(count(&results, Bucket::Behavioral), 8);
        assert_eq!(count(&results, Bucket::Cognitive), 2);
        assert!(results[..8].iter().all(|c| c.url().starts_with('b')));
        assert!(results[8..].iter().all(|c| c.url().starts_with('c')));
    }

    #[test]
    fn sales_query_prefers_named_competencies() {
        let mut records = Vec::new();
        for i in 0..3 {
            records.push(record(&format!("g{i}"), &format!("Graduate Scenarios {i}"), "", 30, COMP));
        }
        for i in 0..10 {
            records.push(record(&format!("s{i}"), &format!("Entry Level Sales {i}"), "", 30, COMP));
        }
        for i in 0..5 {
            records.push(record(&format!("b{i}"), &format!("Behav {i}"), "", 30, BEHAV));
            records.push(record(&format!("t{i}"), &format!("Tech {i}"), "", 30, TECH));
        }
        let catalog = Catalog::from_records(records);
        let pool = pool_in_catalog_order(&catalog, 50);

        let results = CategoryBalancer::default()
            .balance("customer-facing sales role", &pool, &catalog, 10)
            .unwrap();

        let urls: Vec<&str> = results.iter().map(ScoredCandidate::url).collect();
        assert_eq!(
            urls,
            vec!["s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "b0", "b1"]
        );
        assert_eq!(count(&results, Bucket::Other), 0);
        assert_eq!(categorize(catalog.get(0).unwrap()), Bucket::Other);
    }

    #[test]
    fn no_intent_mixes_every_bucket_in_order() {
        let mut records = Vec::new();
        for i in 0..5 {
            if i % 2 == 0 {
                records.push(record(&format!("o{i}"), &format!("Simulation {i}"), "", 30, SIM));
            } else {
                records.push(record(&format!("o{i}"), &format!("Graduate Scenarios {i}"), "", 30, COMP));
            }
            records.push(record(&format!("c{i}"), &format!("Cog {i}"), "", 30, COG));
            records.push(record(&format!("b{i}"), &format!("Behav {i}"), "", 30, BEHAV));
            records.push(record(&format!("t{i}"), &format!("Tech {i}"), "", 30, TECH));
        }
        let catalog = Catalog::from_records(records);
        let pool = pool_in_catalog_order(&catalog, 50);

        let results = CategoryBalancer::default()
            .balance("anything at all", &pool, &catalog, 10)
            .unwrap();

        let buckets: Vec<Bucket> = results.iter().map(|c| categorize(&c.record)).collect();
        assert_eq!(
            buckets,
            vec![
                Bucket::Technical,
                Bucket::Technical,
                Bucket::Technical,
                Bucket::Behavioral,
                Bucket::Behavioral,
                Bucket::Behavioral,
                Bucket::Cognitive,
                Bucket::Cognitive,
                Bucket::Other,
                Bucket::Other,
            ]
        );
        let urls: Vec<&str> = results.iter().map(ScoredCandidate::url).collect();
        assert_eq!(&urls[8..], ["o0", "o1"]);
    }

    #[test]
    fn shortfall_filled_from_pool_in_order() {
        let catalog = Catalog::from_records(vec![
            record("b0", "B0", "", 30, BEHAV),
            record("b1", "B1", "", 30, BEHAV),
            record("t0", "T0", "", 30, TECH),
            record("b2", "B2", "", 30, BEHAV),
        ]);
        let pool = pool_in_catalog_order(&catalog, 4);
        let results = CategoryBalancer::default()
            .balance("python coding", &pool, &catalog, 4)
            .unwrap();

        let urls: Vec<&str> = results.iter().map(ScoredCandidate::url).collect();
        assert_eq!(urls, vec!["t0", "b0", "b1", "b2"]);
    }

    #[test]
    fn output_is_unique_and_bounded() {
        let catalog = mixed_catalog();
        let pool = pool_in_catalog_order(&catalog, 6);
        let results = CategoryBalancer::default()
            .balance("anything at all", &pool, &catalog, 10)
            .unwrap();

        assert_eq!(results.len(), 6);
        let urls: HashSet<&str> = results.iter().map(ScoredCandidate::url).collect();
        assert_eq!(urls.len(), results.len());
    }

    #[test]
    fn index_outside_catalog_fails() {
        let catalog = Catalog::from_records(vec![record("a", "A", "", 30, TECH)]);
        let err = CategoryBalancer::default()
            .balance("java", &[(3, 0.5)], &catalog, 5)
            .unwrap_err();
        assert!(matches!(err, SemanticFault::RankingFailure(_)));
    }

    #[test]
    fn bucket_counts_cover_catalog() {
        let catalog = mixed_catalog();
        let counts = bucket_counts(&catalog);
        assert_eq!(counts[Bucket::Technical.index()], (Bucket::Technical, 20));
        assert_eq!(counts[Bucket::Behavioral.index()], (Bucket::Behavioral, 20));
        assert_eq!(counts[Bucket::Cognitive.index()], (Bucket::Cognitive, 10));
    }
}
