//! The hybrid recommendation engine.
//!
//! A query is embedded and ranked against cached catalog embeddings, then
//! balanced across intent buckets. When the embedding provider is
//! unavailable, or anything on that path fails, the whole request is served
//! by the lexical [`KeywordScorer`] instead. [`RecommendationService`] adds
//! query validation and the minimum/maximum result bounds.

pub mod balancer;
pub mod candidate;
pub mod evaluation;
pub mod keyword;
pub mod pipeline;
pub mod rules;
pub mod service;
pub mod similarity;

#[cfg(test)]
mod testing;

pub use balancer::{CategoryBalancer, bucket_counts};
pub use candidate::{ScoreSource, ScoredCandidate};
pub use keyword::KeywordScorer;
pub use pipeline::{PipelineOptions, RecommendationPipeline, SemanticFault};
pub use rules::{Bucket, Intent, IntentDetector, Intents};
pub use service::{RecommendationService, format_response};
