//! Text embedding capability for semantic ranking.
//!
//! An [`EmbeddingProvider`] maps text to a fixed-length vector or reports
//! [`Unavailable`]. Callers never learn *why* a provider is unavailable; the
//! provider logs the reason and the engine falls back to keyword scoring.

mod gemini;

use std::future::Future;

use assessrank_shared::{AppConfig, EmbeddingConfig, api_key};
use tracing::{info, warn};

pub use gemini::GeminiProvider;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// The provider could not produce a vector for this input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("embedding provider unavailable")]
pub struct Unavailable;

/// Maps text to a vector of [`EmbeddingProvider::dimension`] floats.
///
/// Implementations must never panic or surface transport errors; every
/// failure becomes `Err(Unavailable)`.
pub trait EmbeddingProvider: Send + Sync {
    /// Short backend name for tracing.
    fn name(&self) -> &str;

    /// Length of every vector this provider returns.
    fn dimension(&self) -> usize;

    /// Embed a single text.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, Unavailable>> + Send;
}

// ---------------------------------------------------------------------------
// Disabled stub
// ---------------------------------------------------------------------------

/// Provider used when no credentials are configured. Always unavailable.
#[derive(Debug, Clone)]
pub struct DisabledProvider {
    dimension: usize,
}

impl DisabledProvider {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl EmbeddingProvider for DisabledProvider {
    fn name(&self) -> &str {
        "disabled"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, Unavailable> {
        Err(Unavailable)
    }
}

// ---------------------------------------------------------------------------
// Runtime selection
// ---------------------------------------------------------------------------

/// The provider chosen at startup from configuration.
#[derive(Debug)]
pub enum Provider {
    Gemini(GeminiProvider),
    Disabled(DisabledProvider),
}

impl Provider {
    /// Use the Gemini backend when its API key is present, otherwise disable
    /// semantic ranking.
    pub fn from_config(config: &AppConfig) -> Self {
        match api_key(config) {
            Some(key) => Self::with_key(&config.embedding, key),
            None => {
                warn!(
                    env = %config.embedding.api_key_env,
                    "embedding API key not set, using keyword-based recommendations"
                );
                Self::Disabled(DisabledProvider::new(config.embedding.dimension))
            }
        }
    }

    /// Build the Gemini backend with an explicit key.
    pub fn with_key(config: &EmbeddingConfig, key: String) -> Self {
        match GeminiProvider::new(config, key) {
            Ok(provider) => {
                info!(model = %config.model, "embedding provider configured");
                Self::Gemini(provider)
            }
            Err(e) => {
                warn!(error = %e, "could not configure embedding provider, falling back to keywords");
                Self::Disabled(DisabledProvider::new(config.dimension))
            }
        }
    }
}

impl EmbeddingProvider for Provider {
    fn name(&self) -> &str {
        match self {
            Self::Gemini(p) => p.name(),
            Self::Disabled(p) => p.name(),
        }
    }

    fn dimension(&self) -> usize {
        match self {
            Self::Gemini(p) => p.dimension(),
            Self::Disabled(p) => p.dimension(),
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, Unavailable> {
        match self {
            Self::Gemini(p) => p.embed(text).await,
            Self::Disabled(p) => p.embed(text).await,
        }
    }
}
