//! Application configuration for AssessRank.
//!
//! User config lives at `~/.assessrank/assessrank.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AssessRankError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "assessrank.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".assessrank";

// ---------------------------------------------------------------------------
// Config structs (matching assessrank.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Catalog location and scraping settings.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Embedding backend settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Result bounds and ranking knobs.
    #[serde(default)]
    pub recommend: RecommendConfig,

    /// Intent keyword sets and fallback scorer vocabularies.
    #[serde(default)]
    pub keywords: KeywordsConfig,

    /// Evaluation harness defaults.
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

/// `[catalog]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path of the catalog JSON file.
    #[serde(default = "default_catalog_path")]
    pub path: String,

    /// Listing page the scraper starts from.
    #[serde(default = "default_source_url")]
    pub source_url: String,

    /// Origin used to resolve relative product links.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Maximum number of product pages fetched per scrape.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Delay between product page requests.
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,

    /// HTTP timeout for scraper requests.
    #[serde(default = "default_catalog_timeout")]
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
            source_url: default_source_url(),
            base_url: default_base_url(),
            max_pages: default_max_pages(),
            request_delay_ms: default_request_delay(),
            timeout_secs: default_catalog_timeout(),
        }
    }
}

fn default_catalog_path() -> String {
    "data/assessments.json".into()
}
fn default_source_url() -> String {
    "https://www.shl.com/solutions/products/product-catalog/".into()
}
fn default_base_url() -> String {
    "https://www.shl.com".into()
}
fn default_max_pages() -> usize {
    100
}
fn default_request_delay() -> u64 {
    500
}
fn default_catalog_timeout() -> u64 {
    30
}

/// `[embedding]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Embedding model resource name.
    #[serde(default = "default_model")]
    pub model: String,

    /// API origin; overridable for tests and proxies.
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,

    /// Expected vector length. Responses of any other length are rejected.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Upper bound on a single embedding call.
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    /// Task hint sent with each request.
    #[serde(default = "default_task_type")]
    pub task_type: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            model: default_model(),
            base_url: default_embedding_base_url(),
            dimension: default_dimension(),
            timeout_secs: default_embedding_timeout(),
            task_type: default_task_type(),
        }
    }
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".into()
}
fn default_model() -> String {
    "models/embedding-001".into()
}
fn default_embedding_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_dimension() -> usize {
    768
}
fn default_embedding_timeout() -> u64 {
    10
}
fn default_task_type() -> String {
    "RETRIEVAL_DOCUMENT".into()
}

/// `[recommend]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendConfig {
    /// Fewest results returned when the catalog allows it.
    #[serde(default = "default_min_results")]
    pub min_results: usize,

    /// Most results ever returned.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Multiple of `top_k` retrieved by similarity before balancing.
    #[serde(default = "default_over_fetch")]
    pub over_fetch_factor: usize,

    /// Shortest accepted query (after trimming).
    #[serde(default = "default_min_query_chars")]
    pub min_query_chars: usize,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            min_results: default_min_results(),
            max_results: default_max_results(),
            over_fetch_factor: default_over_fetch(),
            min_query_chars: default_min_query_chars(),
        }
    }
}

fn default_min_results() -> usize {
    5
}
fn default_max_results() -> usize {
    10
}
fn default_over_fetch() -> usize {
    2
}
fn default_min_query_chars() -> usize {
    10
}

/// `[keywords]` section.
///
/// The `*_intent` sets drive query intent detection for category balancing.
/// The `scorer_*` sets drive the keyword fallback bonuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordsConfig {
    #[serde(default = "default_technical_intent")]
    pub technical_intent: Vec<String>,
    #[serde(default = "default_behavioral_intent")]
    pub behavioral_intent: Vec<String>,
    #[serde(default = "default_cognitive_intent")]
    pub cognitive_intent: Vec<String>,
    #[serde(default = "default_sales_intent")]
    pub sales_intent: Vec<String>,
    #[serde(default = "default_scorer_technical")]
    pub scorer_technical: Vec<String>,
    #[serde(default = "default_scorer_behavioral")]
    pub scorer_behavioral: Vec<String>,
    #[serde(default = "default_scorer_roles")]
    pub scorer_roles: Vec<String>,
}

impl Default for KeywordsConfig {
    fn default() -> Self {
        Self {
            technical_intent: default_technical_intent(),
            behavioral_intent: default_behavioral_intent(),
            cognitive_intent: default_cognitive_intent(),
            sales_intent: default_sales_intent(),
            scorer_technical: default_scorer_technical(),
            scorer_behavioral: default_scorer_behavioral(),
            scorer_roles: default_scorer_roles(),
        }
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| (*w).to_string()).collect()
}

fn default_technical_intent() -> Vec<String> {
    words(&[
        "java",
        "python",
        "programming",
        "technical",
        "coding",
        "sql",
        "developer",
        "software",
        "engineer",
    ])
}
fn default_behavioral_intent() -> Vec<String> {
    words(&[
        "collaborate",
        "communication",
        "personality",
        "behavioral",
        "leadership",
        "team",
        "cultural",
    ])
}
fn default_cognitive_intent() -> Vec<String> {
    words(&["cognitive", "reasoning", "aptitude", "numerical", "verbal"])
}
fn default_sales_intent() -> Vec<String> {
    words(&["sales", "customer", "marketing"])
}
fn default_scorer_technical() -> Vec<String> {
    words(&[
        "java",
        "python",
        "sql",
        "javascript",
        "css",
        "html",
        "selenium",
        "excel",
        "tableau",
        "data",
        "analyst",
        "developer",
        "engineer",
        "testing",
        "qa",
        "automation",
        "programming",
    ])
}
fn default_scorer_behavioral() -> Vec<String> {
    words(&[
        "leadership",
        "communication",
        "personality",
        "behavioral",
        "collaborate",
        "team",
        "management",
        "cultural",
        "fit",
        "interpersonal",
        "sales",
        "customer",
        "service",
    ])
}
fn default_scorer_roles() -> Vec<String> {
    words(&[
        "senior",
        "junior",
        "entry",
        "level",
        "manager",
        "director",
        "executive",
        "analyst",
        "consultant",
        "admin",
        "assistant",
    ])
}

/// `[evaluation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// CSV with `Query` and `Assessment_url` columns.
    #[serde(default = "default_labels_path")]
    pub labels_path: String,

    /// Cut-off for Recall@K.
    #[serde(default = "default_eval_k")]
    pub k: usize,

    /// Where the JSON report is written.
    #[serde(default = "default_report_path")]
    pub report_path: String,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            labels_path: default_labels_path(),
            k: default_eval_k(),
            report_path: default_report_path(),
        }
    }
}

fn default_labels_path() -> String {
    "data/train_set.csv".into()
}
fn default_eval_k() -> usize {
    10
}
fn default_report_path() -> String {
    "evaluation/train_evaluation_results.json".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.assessrank/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| AssessRankError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.assessrank/assessrank.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AssessRankError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        AssessRankError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Reject configurations the engine cannot honour.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let r = &config.recommend;
    if r.min_results == 0 || r.min_results > r.max_results {
        return Err(AssessRankError::config(format!(
            "recommend.min_results ({}) must be between 1 and max_results ({})",
            r.min_results, r.max_results
        )));
    }
    if r.over_fetch_factor == 0 {
        return Err(AssessRankError::config(
            "recommend.over_fetch_factor must be at least 1",
        ));
    }
    if config.embedding.timeout_secs == 0 {
        return Err(AssessRankError::config(
            "embedding.timeout_secs must be at least 1",
        ));
    }
    if config.embedding.dimension == 0 {
        return Err(AssessRankError::config("embedding.dimension must be positive"));
    }
    Ok(())
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| AssessRankError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| AssessRankError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| AssessRankError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the embedding API key from the configured env var.
///
/// Returns `None` when the variable is unset or blank; the engine then runs
/// on the keyword fallback alone.
pub fn api_key(config: &AppConfig) -> Option<String> {
    match std::env::var(&config.embedding.api_key_env) {
        Ok(val) if !val.trim().is_empty() => Some(val.trim().to_string()),
        _ => None,
    }
}
