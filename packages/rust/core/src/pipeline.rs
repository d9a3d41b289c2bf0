//! `recommend`: semantic ranking with balancing, or keyword scoring when
//! the semantic path cannot serve the request.

use std::sync::Arc;
use std::time::Duration;

use assessrank_catalog::Catalog;
use assessrank_embedding::{EmbeddingProvider, Unavailable};
use assessrank_shared::AppConfig;
use tracing::{debug, info, instrument, warn};

use crate::balancer::CategoryBalancer;
use crate::candidate::ScoredCandidate;
use crate::keyword::KeywordScorer;
use crate::rules::IntentDetector;
use crate::similarity::{self, EmbeddingCache};

/// Why the semantic path gave up on a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SemanticFault {
    #[error("embedding provider unavailable")]
    ProviderUnavailable,

    #[error("ranking failed: {0}")]
    RankingFailure(String),
}

impl From<Unavailable> for SemanticFault {
    fn from(_: Unavailable) -> Self {
        Self::ProviderUnavailable
    }
}

/// Tuning knobs for [`RecommendationPipeline`].
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Candidates ranked per requested result before balancing.
    pub over_fetch_factor: usize,
    /// Bound on every embedding call.
    pub embed_timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            over_fetch_factor: 2,
            embed_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&AppConfig> for PipelineOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            over_fetch_factor: config.recommend.over_fetch_factor.max(1),
            embed_timeout: Duration::from_secs(config.embedding.timeout_secs),
        }
    }
}

/// The recommendation engine for one catalog and one embedding provider.
///
/// Shared across requests; the only mutable state is the write-once
/// embedding cache.
pub struct RecommendationPipeline<P> {
    catalog: Arc<Catalog>,
    provider: P,
    cache: EmbeddingCache,
    balancer: CategoryBalancer,
    scorer: KeywordScorer,
    options: PipelineOptions,
}

impl<P: EmbeddingProvider> RecommendationPipeline<P> {
    pub fn new(catalog: Arc<Catalog>, provider: P, config: &AppConfig) -> Self {
        Self::with_options(
            catalog,
            provider,
            IntentDetector::from_config(&config.keywords),
            KeywordScorer::from_config(&config.keywords),
            PipelineOptions::from(config),
        )
    }

    pub fn with_options(
        catalog: Arc<Catalog>,
        provider: P,
        detector: IntentDetector,
        scorer: KeywordScorer,
        options: PipelineOptions,
    ) -> Self {
        Self {
            cache: EmbeddingCache::new(catalog.len()),
            catalog,
            provider,
            balancer: CategoryBalancer::new(detector),
            scorer,
            options,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn keyword_scorer(&self) -> &KeywordScorer {
        &self.scorer
    }

    /// Recommend up to `top_k` catalog records for `query`.
    ///
    /// Never fails: any fault on the semantic path sends the whole request
    /// to the keyword scorer.
    #[instrument(skip_all, fields(top_k = top_k, provider = self.provider.name()))]
    pub async fn recommend(&self, query: &str, top_k: usize) -> Vec<ScoredCandidate> {
        if self.catalog.is_empty() {
            debug!("catalog is empty, nothing to recommend");
            return Vec::new();
        }

        match self.semantic(query, top_k).await {
            Ok(results) => {
                info!(path = "semantic", count = results.len(), "served recommendations");
                results
            }
            Err(fault) => {
                match &fault {
                    SemanticFault::ProviderUnavailable => {
                        debug!(reason = %fault, "semantic path unavailable")
                    }
                    SemanticFault::RankingFailure(_) => {
                        warn!(reason = %fault, "semantic ranking failed, falling back to keywords")
                    }
                }
                let results = self.scorer.recommend(query, &self.catalog, top_k);
                info!(path = "keyword", count = results.len(), "served recommendations");
                results
            }
        }
    }

    async fn semantic(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredCandidate>, SemanticFault> {
        let query_vector =
            similarity::embed_bounded(&self.provider, query, self.options.embed_timeout)
                .await
                .ok_or(SemanticFault::ProviderUnavailable)?;

        self.cache
            .ensure(&self.catalog, &self.provider, self.options.embed_timeout)
            .await;
        let vectors = self.cache.vectors()?;

        let pool_size = top_k.saturating_mul(self.options.over_fetch_factor);
        let pool = similarity::rank(&query_vector, &vectors, pool_size)?;

        let mut results = self.balancer.balance(query, &pool, &self.catalog, top_k)?;
        results.truncate(top_k);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::ScoreSource;
    use crate::rules::{Bucket, categorize};
    use crate::testing::{AxisProvider, record};
    use assessrank_catalog::fallback_records;
    use assessrank_embedding::DisabledProvider;
    use assessrank_shared::AssessmentRecord;
    use std::collections::HashSet;

    fn pipeline<P: EmbeddingProvider>(
        records: Vec<AssessmentRecord>,
        provider: P,
    ) -> RecommendationPipeline<P> {
        RecommendationPipeline::new(
            Arc::new(Catalog::from_records(records)),
            provider,
            &AppConfig::default(),
        )
    }

    fn timed<P: EmbeddingProvider>(
        records: Vec<AssessmentRecord>,
        provider: P,
        timeout: Duration,
    ) -> RecommendationPipeline<P> {
        RecommendationPipeline::with_options(
            Arc::new(Catalog::from_records(records)),
            provider,
            IntentDetector::default(),
            KeywordScorer::default(),
            PipelineOptions {
                over_fetch_factor: 2,
                embed_timeout: timeout,
            },
        )
    }

    fn balanced_catalog() -> Vec<AssessmentRecord> {
        let mut records = Vec::new();
        for i in 0..20 {
            records.push(record(
                &format!("t{i}"),
                &format!("Java Test {i}"),
                "programming",
                40,
                &["Knowledge & Skills"],
            ));
            records.push(record(
                &format!("b{i}"),
                &format!("Team Profile {i}"),
                "personality",
                40,
                &["Personality & Behavior"],
            ));
        }
        for i in 0..10 {
            records.push(record(
                &format!("c{i}"),
                &format!("Reasoning {i}"),
                "numerical",
                40,
                &["Ability & Aptitude"],
            ));
        }
        records
    }

    #[tokio::test]
    async fn empty_catalog_yields_nothing() {
        let engine = pipeline(Vec::new(), AxisProvider::new());
        assert!(engine.recommend("Java developer", 10).await.is_empty());
        assert_eq!(engine.provider().calls(), 0);
    }

    #[tokio::test]
    async fn disabled_provider_matches_keyword_scorer() {
        let engine = pipeline(fallback_records(), DisabledProvider::new(768));
        for query in [
            "I need a Python and SQL skills test",
            "team leadership for a sales manager",
            "something unrelated entirely",
        ] {
            let expected = KeywordScorer::default().recommend(query, engine.catalog(), 10);
            assert_eq!(engine.recommend(query, 10).await, expected);
        }
    }

    #[tokio::test]
    async fn seed_catalog_recall_without_embeddings() {
        let engine = pipeline(fallback_records(), DisabledProvider::new(768));
        let results = engine.recommend("I need a Python and SQL skills test", 5).await;
        let names: Vec<&str> = results.iter().map(|c| c.record.name.as_str()).collect();
        assert!(names.contains(&"Python"));
        assert!(names.contains(&"SQL Server"));
    }

    #[tokio::test]
    async fn technical_query_is_balanced() {
        let engine = pipeline(balanced_catalog(), AxisProvider::new());
        let results = engine.recommend("Java developer, 40 minutes", 10).await;

        assert_eq!(results.len(), 10);
        assert!(results.iter().all(|c| c.source == ScoreSource::Semantic));
        let cognitive = results.iter().filter(|c| categorize(&c.record) == Bucket::Cognitive).count();
        let technical = results.iter().filter(|c| categorize(&c.record) == Bucket::Technical).count();
        assert!(cognitive <= 2);
        assert_eq!(technical + cognitive, 10);
    }

    #[tokio::test]
    async fn results_are_unique_and_bounded() {
        let engine = pipeline(balanced_catalog(), AxisProvider::new());
        for query in ["Java developer who works with the team", "sales lead", "anything"] {
            let results = engine.recommend(query, 10).await;
            assert!(results.len() <= 10);
            let urls: HashSet<&str> = results.iter().map(ScoredCandidate::url).collect();
            assert_eq!(urls.len(), results.len());
        }
    }

    #[tokio::test]
    async fn catalog_embedded_once_across_requests() {
        let records = balanced_catalog();
        let count = records.len();
        let engine = pipeline(records, AxisProvider::new());

        engine.recommend("Java developer", 10).await;
        engine.recommend("personality profile for a team lead", 10).await;

        // one call per record plus one per query
        assert_eq!(engine.provider().calls(), count + 2);
    }

    #[tokio::test]
    async fn concurrent_requests_agree() {
        let engine = pipeline(balanced_catalog(), AxisProvider::new());
        let (a, b) = tokio::join!(
            engine.recommend("Java developer", 10),
            engine.recommend("Java developer", 10),
        );
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn timeout_falls_back_to_keywords() {
        let engine = timed(
            fallback_records(),
            AxisProvider::slow(Duration::from_millis(200)),
            Duration::from_millis(10),
        );
        let query = "I need a Python and SQL skills test";
        let expected = KeywordScorer::default().recommend(query, engine.catalog(), 10);
        assert_eq!(engine.recommend(query, 10).await, expected);
    }

    #[tokio::test]
    async fn dimension_mismatch_falls_back_to_keywords() {
        let engine = pipeline(fallback_records(), AxisProvider::short());
        let query = "Java developer";
        let results = engine.recommend(query, 10).await;
        assert!(results.iter().all(|c| c.source == ScoreSource::Keyword));
        assert_eq!(results, KeywordScorer::default().recommend(query, engine.catalog(), 10));
    }
}
