//! Shared types, error model, and configuration for AssessRank.
//!
//! This crate is the foundation depended on by all other AssessRank crates.
//! It provides:
//! - [`AssessRankError`]: the unified error type
//! - Domain types ([`AssessmentRecord`], [`AssessmentResponse`], [`SupportFlag`])
//! - Configuration ([`AppConfig`] and its sections, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CatalogConfig, EmbeddingConfig, EvaluationConfig, KeywordsConfig,
    RecommendConfig, api_key, config_dir, config_file_path, init_config, load_config,
    load_config_from, validate_config,
};
pub use error::{AssessRankError, Result};
pub use types::{
    AssessmentRecord, AssessmentResponse, DEFAULT_DURATION_MINUTES, RawAssessmentRecord,
    RecommendationResponse, SupportFlag,
};
