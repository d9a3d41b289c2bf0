//! Cosine ranking over cached catalog embeddings.

use std::sync::OnceLock;
use std::time::Duration;

use assessrank_catalog::Catalog;
use assessrank_embedding::EmbeddingProvider;
use tracing::{debug, info, warn};

use crate::SemanticFault;

/// Cosine similarity; 0.0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Score every vector against `query` and keep the best `limit`.
///
/// Returns `(catalog index, similarity)` in descending order; equal scores
/// keep catalog order.
pub fn rank(
    query: &[f32],
    vectors: &[&[f32]],
    limit: usize,
) -> Result<Vec<(usize, f32)>, SemanticFault> {
    let mut scored = Vec::with_capacity(vectors.len());
    for (index, vector) in vectors.iter().enumerate() {
        if vector.len() != query.len() {
            return Err(SemanticFault::RankingFailure(format!(
                "query has {} dimensions, catalog entry {index} has {}",
                query.len(),
                vector.len()
            )));
        }
        let score = cosine_similarity(query, vector);
        if score.is_nan() {
            return Err(SemanticFault::RankingFailure(format!(
                "similarity for catalog entry {index} is not a number"
            )));
        }
        scored.push((index, score));
    }

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(limit);
    Ok(scored)
}

/// Embed `text`, treating a timeout like any other unavailability.
pub async fn embed_bounded<P: EmbeddingProvider>(
    provider: &P,
    text: &str,
    timeout: Duration,
) -> Option<Vec<f32>> {
    match tokio::time::timeout(timeout, provider.embed(text)).await {
        Ok(Ok(vector)) => Some(vector),
        Ok(Err(_)) => None,
        Err(_) => {
            warn!(provider = provider.name(), ?timeout, "embedding call timed out");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// EmbeddingCache
// ---------------------------------------------------------------------------

/// One vector slot per catalog index, each written at most once.
///
/// Concurrent fills may compute a slot twice; the first stored value wins
/// and the other is dropped.
#[derive(Debug)]
pub struct EmbeddingCache {
    slots: Vec<OnceLock<Vec<f32>>>,
}

impl EmbeddingCache {
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| OnceLock::new()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.get().is_some()).count()
    }

    pub fn get(&self, index: usize) -> Option<&[f32]> {
        self.slots.get(index)?.get().map(Vec::as_slice)
    }

    /// Compute every missing slot from the record's search text.
    ///
    /// A record the provider cannot embed, or embeds with the wrong length,
    /// gets a zero vector so indices stay aligned with the catalog.
    pub async fn ensure<P: EmbeddingProvider>(
        &self,
        catalog: &Catalog,
        provider: &P,
        timeout: Duration,
    ) {
        let missing = self.slots.len() - self.filled();
        if missing == 0 {
            return;
        }
        info!(missing, provider = provider.name(), "generating embeddings for assessments");

        let dimension = provider.dimension();
        for (index, record) in catalog.iter().enumerate().take(self.slots.len()) {
            if self.slots[index].get().is_some() {
                continue;
            }
            let vector = match embed_bounded(provider, &record.search_text(), timeout).await {
                Some(v) if v.len() == dimension => v,
                Some(v) => {
                    warn!(url = %record.url, got = v.len(), dimension, "embedding has wrong length, using zero vector");
                    vec![0.0; dimension]
                }
                None => {
                    debug!(url = %record.url, "no embedding for record, using zero vector");
                    vec![0.0; dimension]
                }
            };
            let _ = self.slots[index].set(vector);
        }
    }

    /// All cached vectors in catalog order.
    pub fn vectors(&self) -> Result<Vec<&[f32]>, SemanticFault> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.get().map(Vec::as_slice).ok_or_else(|| {
                    SemanticFault::RankingFailure(format!("no embedding cached for entry {index}"))
                })
            })
            .collect()
    }
}
