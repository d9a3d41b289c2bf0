//! Fixtures shared by the unit tests in this crate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use assessrank_embedding::{EmbeddingProvider, Unavailable};
use assessrank_shared::{AssessmentRecord, SupportFlag};

pub(crate) fn record(
    url: &str,
    name: &str,
    description: &str,
    duration: u32,
    types: &[&str],
) -> AssessmentRecord {
    AssessmentRecord {
        url: url.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        duration,
        adaptive_support: SupportFlag::No,
        remote_support: SupportFlag::Yes,
        test_type: types.iter().map(|t| (*t).to_string()).collect(),
    }
}

const AXES: [&[&str]; 4] = [
    &["java", "python", "sql", "programming", "coding", "developer", "knowledge", "skills"],
    &["personality", "behavior", "team", "communication", "collaborate", "leadership"],
    &["ability", "aptitude", "reasoning", "numerical", "verbal", "cognitive"],
    &["sales", "customer", "marketing"],
];

/// Deterministic four-axis embedder that counts its calls.
pub(crate) struct AxisProvider {
    calls: AtomicUsize,
    delay: Option<Duration>,
    truncate: bool,
}

impl AxisProvider {
    pub(crate) fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: None,
            truncate: false,
        }
    }

    /// Sleeps for `delay` before answering.
    pub(crate) fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    /// Reports four dimensions but returns three.
    pub(crate) fn short() -> Self {
        Self {
            truncate: true,
            ..Self::new()
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingProvider for AxisProvider {
    fn name(&self) -> &str {
        "axis"
    }

    fn dimension(&self) -> usize {
        AXES.len()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, Unavailable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut vector = vec![0.0; AXES.len()];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            for (axis, words) in AXES.iter().enumerate() {
                if words.contains(&token) {
                    vector[axis] += 1.0;
                }
            }
        }

        if self.truncate {
            vector.pop();
        }
        Ok(vector)
    }
}
