//! The consuming interface: validation, result-count bounds, projection.

use std::collections::HashSet;

use assessrank_catalog::Catalog;
use assessrank_embedding::EmbeddingProvider;
use assessrank_shared::{AssessRankError, AssessmentResponse, RecommendConfig, Result};
use tracing::debug;

use crate::candidate::{ScoreSource, ScoredCandidate};
use crate::pipeline::RecommendationPipeline;

/// Wraps a pipeline with the caller-facing guarantees on result count.
pub struct RecommendationService<P> {
    pipeline: RecommendationPipeline<P>,
    min_results: usize,
    max_results: usize,
    min_query_chars: usize,
}

impl<P: EmbeddingProvider> RecommendationService<P> {
    pub fn new(pipeline: RecommendationPipeline<P>, config: &RecommendConfig) -> Self {
        Self {
            pipeline,
            min_results: config.min_results,
            max_results: config.max_results,
            min_query_chars: config.min_query_chars,
        }
    }

    pub fn pipeline(&self) -> &RecommendationPipeline<P> {
        &self.pipeline
    }

    /// Recommend with `top_k` set to the configured maximum.
    pub async fn recommend(&self, query: &str) -> Result<Vec<AssessmentResponse>> {
        let scored = self.recommend_scored(query, self.max_results).await?;
        Ok(format_response(&scored))
    }

    /// Recommend with an explicit `top_k` in `[min_results, max_results]`.
    pub async fn recommend_with_top_k(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<AssessmentResponse>> {
        let scored = self.recommend_scored(query, top_k).await?;
        Ok(format_response(&scored))
    }

    /// Validated, padded and truncated candidates with their scores.
    pub async fn recommend_scored(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredCandidate>> {
        let query = validate_query(query, self.min_query_chars)?;
        if !(self.min_results..=self.max_results).contains(&top_k) {
            return Err(AssessRankError::validation(format!(
                "top_k must be between {} and {}, got {top_k}",
                self.min_results, self.max_results
            )));
        }

        let results = self.pipeline.recommend(query, top_k).await;
        let mut results = pad_to_minimum(results, self.pipeline.catalog(), self.min_results);
        results.truncate(self.max_results);
        Ok(results)
    }
}

/// Trim the query and require at least `min_chars` characters.
pub fn validate_query(query: &str, min_chars: usize) -> Result<&str> {
    let trimmed = query.trim();
    if trimmed.chars().count() < min_chars {
        return Err(AssessRankError::validation(format!(
            "query must be at least {min_chars} characters long"
        )));
    }
    Ok(trimmed)
}

/// Append catalog records not yet present, in catalog order, until
/// `minimum` is reached. Results already at the minimum are returned as is.
pub fn pad_to_minimum(
    mut results: Vec<ScoredCandidate>,
    catalog: &Catalog,
    minimum: usize,
) -> Vec<ScoredCandidate> {
    if results.len() >= minimum {
        return results;
    }

    let present: HashSet<String> = results.iter().map(|c| c.record.url.clone()).collect();
    let before = results.len();
    for record in catalog.iter().filter(|r| !present.contains(&r.url)) {
        if results.len() >= minimum {
            break;
        }
        results.push(ScoredCandidate::new(record, 0.0, ScoreSource::Padding));
    }
    debug!(added = results.len() - before, minimum, "padded recommendations");
    results
}

/// Project candidates to the response shape, preserving order.
pub fn format_response(candidates: &[ScoredCandidate]) -> Vec<AssessmentResponse> {
    candidates
        .iter()
        .map(|c| AssessmentResponse::from(&c.record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{AxisProvider, record};
    use assessrank_catalog::fallback_records;
    use assessrank_embedding::DisabledProvider;
    use assessrank_shared::{AppConfig, AssessmentRecord};
    use std::sync::Arc;

    fn service<P: EmbeddingProvider>(
        records: Vec<AssessmentRecord>,
        provider: P,
    ) -> RecommendationService<P> {
        let config = AppConfig::default();
        let pipeline =
            RecommendationPipeline::new(Arc::new(Catalog::from_records(records)), provider, &config);
        RecommendationService::new(pipeline, &config.recommend)
    }

    #[tokio::test]
    async fn rejects_short_queries() {
        let service = service(fallback_records(), DisabledProvider::new(768));
        let err = service.recommend("   java    ").await.unwrap_err();
        assert!(matches!(err, AssessRankError::Validation { .. }));
    }

    #[tokio::test]
    async fn rejects_top_k_out_of_range() {
        let service = service(fallback_records(), DisabledProvider::new(768));
        for top_k in [0, 4, 11] {
            let err = service
                .recommend_with_top_k("Java developer with SQL", top_k)
                .await
                .unwrap_err();
            assert!(matches!(err, AssessRankError::Validation { .. }));
        }
        let ok = service.recommend_with_top_k("Java developer with SQL", 7).await.unwrap();
        assert_eq!(ok.len(), 7);
    }

    #[tokio::test]
    async fn output_stays_within_bounds() {
        let service = service(fallback_records(), AxisProvider::new());
        for query in [
            "Java developer, 40 minutes",
            "personality test for a team lead",
            "a numerical reasoning test",
            "sales representative hiring",
            "completely unrelated request text",
        ] {
            let results = service.recommend(query).await.unwrap();
            assert!((5..=10).contains(&results.len()), "{query}: {}", results.len());
            let urls: HashSet<&str> = results.iter().map(|r| r.url.as_str()).collect();
            assert_eq!(urls.len(), results.len());
        }
    }

    #[tokio::test]
    async fn semantic_results_are_padded_to_minimum() {
        // only two technical records are similar and cognitive is empty
        let mut records = vec![
            record("t0", "Java", "", 30, &["Knowledge & Skills"]),
            record("t1", "Python", "", 30, &["Knowledge & Skills"]),
        ];
        for i in 0..6 {
            let name = format!("Other {i}");
            records.push(record(&format!("o{i}"), &name, "", 30, &["Simulations"]));
        }
        let service = service(records, AxisProvider::new());
        let results = service.pipeline().recommend("Java developer", 2).await;
        assert_eq!(results.len(), 2);

        let padded = pad_to_minimum(results, service.pipeline().catalog(), 5);
        let urls: Vec<&str> = padded.iter().map(ScoredCandidate::url).collect();
        assert_eq!(urls, vec!["t0", "t1", "o0", "o1", "o2"]);
        assert_eq!(padded[4].source, ScoreSource::Padding);
    }

    #[test]
    fn padding_is_idempotent_at_minimum() {
        let catalog = Catalog::from_records(fallback_records());
        let results: Vec<ScoredCandidate> = catalog
            .iter()
            .rev()
            .take(6)
            .map(|r| ScoredCandidate::new(r, 1.0, ScoreSource::Keyword))
            .collect();
        let padded = pad_to_minimum(results.clone(), &catalog, 5);
        assert_eq!(padded, results);
    }

    #[test]
    fn format_preserves_order_and_fields() {
        let records = fallback_records();
        let candidates: Vec<ScoredCandidate> = records
            .iter()
            .take(3)
            .map(|r| ScoredCandidate::new(r, 0.5, ScoreSource::Semantic))
            .collect();
        let formatted = format_response(&candidates);
        assert_eq!(formatted.len(), 3);
        assert_eq!(formatted[0].name, "Automata Fix");
        assert_eq!(formatted[1].duration, 45);
        assert_eq!(formatted[2].remote_support, "Yes");
    }

    #[test]
    fn validate_counts_characters_after_trim() {
        assert!(validate_query("  héllo wörld  ", 10).is_ok());
        assert!(validate_query("  short  ", 10).is_err());
    }
}
