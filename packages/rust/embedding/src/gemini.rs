//! Gemini `embedContent` backend.

use std::time::Duration;

use assessrank_shared::{AssessRankError, EmbeddingConfig, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{EmbeddingProvider, Unavailable};

/// User-Agent string for embedding requests.
const USER_AGENT: &str = concat!("AssessRank/", env!("CARGO_PKG_VERSION"));

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Values,
}

#[derive(Debug, Deserialize)]
struct Values {
    values: Vec<f32>,
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Calls the Gemini embedding endpoint over HTTPS.
pub struct GeminiProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    task_type: String,
    dimension: usize,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl GeminiProvider {
    /// Build a provider for `config.model` authenticated with `api_key`.
    pub fn new(config: &EmbeddingConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AssessRankError::Network(format!("failed to build HTTP client: {e}")))?;

        let endpoint = format!(
            "{}/v1beta/{}:embedContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            model: config.model.clone(),
            task_type: config.task_type.clone(),
            dimension: config.dimension,
        })
    }

    /// Perform the HTTP call and validate the returned vector.
    async fn request(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbedRequest {
            model: &self.model,
            content: Content {
                parts: vec![Part { text }],
            },
            task_type: &self.task_type,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AssessRankError::Network(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssessRankError::Network(format!(
                "{}: HTTP {status}",
                self.endpoint
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| AssessRankError::parse(format!("malformed embedding response: {e}")))?;

        let values = parsed.embedding.values;
        if values.len() != self.dimension {
            return Err(AssessRankError::parse(format!(
                "expected {} dimensions, got {}",
                self.dimension,
                values.len()
            )));
        }

        Ok(values)
    }
}

impl EmbeddingProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, Unavailable> {
        match self.request(text).await {
            Ok(values) => {
                debug!(chars = text.len(), "embedded text");
                Ok(values)
            }
            Err(e) => {
                warn!(error = %e, "error getting embedding");
                Err(Unavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const EMBED_PATH: &str = "/v1beta/models/embedding-001:embedContent";

    fn config_for(server: &MockServer, dimension: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            base_url: server.uri(),
            dimension,
            timeout_secs: 2,
            ..EmbeddingConfig::default()
        }
    }

    #[tokio::test]
    async fn returns_vector_on_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(EMBED_PATH))
            .and(header(API_KEY_HEADER, "test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "models/embedding-001",
                "taskType": "RETRIEVAL_DOCUMENT",
                "content": { "parts": [{ "text": "java developer" }] }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embedding": { "values": [0.5, -0.25, 1.0] }
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(&config_for(&server, 3), "test-key").unwrap();
        let vector = provider.embed("java developer").await.unwrap();
        assert_eq!(vector, vec![0.5, -0.25, 1.0]);
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(EMBED_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(&config_for(&server, 3), "test-key").unwrap();
        assert_eq!(provider.embed("anything").await, Err(Unavailable));
    }

    #[tokio::test]
    async fn malformed_body_is_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(EMBED_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(&config_for(&server, 3), "test-key").unwrap();
        assert_eq!(provider.embed("anything").await, Err(Unavailable));
    }

    #[tokio::test]
    async fn wrong_dimension_is_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(EMBED_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embedding": { "values": [0.1, 0.2] }
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(&config_for(&server, 768), "test-key").unwrap();
        assert_eq!(provider.embed("anything").await, Err(Unavailable));
    }

    #[test]
    fn debug_output_hides_key() {
        let provider = GeminiProvider::new(&EmbeddingConfig::default(), "secret-key").unwrap();
        let rendered = format!("{provider:?}");
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("embedding-001"));
    }
}
