//! Recall@K evaluation against labelled query → URL data, and batch
//! prediction output.

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use assessrank_embedding::EmbeddingProvider;
use assessrank_shared::{AssessRankError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::pipeline::RecommendationPipeline;

// ---------------------------------------------------------------------------
// Labelled data
// ---------------------------------------------------------------------------

/// One query with every URL judged relevant for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelledQuery {
    pub query: String,
    pub relevant_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LabelRow {
    #[serde(rename = "Query")]
    query: String,
    #[serde(rename = "Assessment_url")]
    assessment_url: String,
}

#[derive(Debug, Deserialize)]
struct QueryRow {
    #[serde(rename = "Query")]
    query: String,
}

/// A single recommendation written to a predictions file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictionRow {
    #[serde(rename = "Query")]
    pub query: String,
    #[serde(rename = "Assessment_url")]
    pub assessment_url: String,
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn csv_error(e: csv::Error) -> AssessRankError {
    AssessRankError::Evaluation(format!("invalid CSV: {e}"))
}

/// Parse `Query,Assessment_url` rows, grouping URLs by query in first-seen
/// order.
pub fn parse_labels<R: Read>(reader: R) -> Result<Vec<LabelledQuery>> {
    let mut groups: Vec<LabelledQuery> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for row in csv_reader(reader).deserialize::<LabelRow>() {
        let row = row.map_err(csv_error)?;
        if row.query.is_empty() {
            continue;
        }
        let position = *positions.entry(row.query.clone()).or_insert_with(|| {
            groups.push(LabelledQuery {
                query: row.query.clone(),
                relevant_urls: Vec::new(),
            });
            groups.len() - 1
        });
        if !row.assessment_url.is_empty() {
            groups[position].relevant_urls.push(row.assessment_url);
        }
    }

    Ok(groups)
}

pub fn load_labels(path: &Path) -> Result<Vec<LabelledQuery>> {
    let file = std::fs::File::open(path).map_err(|e| AssessRankError::io(path, e))?;
    let labels = parse_labels(file)?;
    info!(?path, queries = labels.len(), "loaded labelled queries");
    Ok(labels)
}

/// Parse a CSV with a `Query` column, keeping each query once.
pub fn parse_queries<R: Read>(reader: R) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut queries = Vec::new();
    for row in csv_reader(reader).deserialize::<QueryRow>() {
        let row = row.map_err(csv_error)?;
        if !row.query.is_empty() && seen.insert(row.query.clone()) {
            queries.push(row.query);
        }
    }
    Ok(queries)
}

pub fn load_queries(path: &Path) -> Result<Vec<String>> {
    let file = std::fs::File::open(path).map_err(|e| AssessRankError::io(path, e))?;
    parse_queries(file)
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// |top-k recommended ∩ relevant| / |relevant|, counting each URL once.
pub fn recall_at_k(relevant: &[String], recommended: &[String], k: usize) -> f64 {
    let relevant: HashSet<&str> = relevant.iter().map(String::as_str).collect();
    if relevant.is_empty() {
        return 0.0;
    }
    let top: HashSet<&str> = recommended.iter().take(k).map(String::as_str).collect();
    let hits = top.intersection(&relevant).count();
    hits as f64 / relevant.len() as f64
}

pub fn mean_recall_at_k(recalls: &[f64]) -> f64 {
    if recalls.is_empty() {
        return 0.0;
    }
    recalls.iter().sum::<f64>() / recalls.len() as f64
}

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

/// Progress callback for batch runs.
pub trait EvaluationProgress: Send + Sync {
    fn started(&self, total: usize);
    fn query_done(&self, current: usize, total: usize);
    fn finished(&self);
}

/// No-op progress reporter.
pub struct SilentEvaluationProgress;

impl EvaluationProgress for SilentEvaluationProgress {
    fn started(&self, _total: usize) {}
    fn query_done(&self, _current: usize, _total: usize) {}
    fn finished(&self) {}
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryEvaluation {
    pub query: String,
    pub recall: f64,
    pub num_relevant: usize,
    pub num_recommended: usize,
    pub recommended_urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub mean_recall_at_k: f64,
    pub min_recall: f64,
    pub max_recall: f64,
    pub k: usize,
    pub generated_at: DateTime<Utc>,
    pub per_query: Vec<QueryEvaluation>,
}

impl EvaluationReport {
    /// Write the report as pretty JSON, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| AssessRankError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AssessRankError::Evaluation(format!("failed to serialize report: {e}")))?;
        std::fs::write(path, json).map_err(|e| AssessRankError::io(path, e))?;
        info!(?path, "wrote evaluation report");
        Ok(())
    }
}

/// Run every labelled query with `top_k = k` and score Recall@k.
#[instrument(skip_all, fields(queries = labelled.len(), k = k))]
pub async fn evaluate<P: EmbeddingProvider>(
    pipeline: &RecommendationPipeline<P>,
    labelled: &[LabelledQuery],
    k: usize,
    progress: &dyn EvaluationProgress,
) -> EvaluationReport {
    progress.started(labelled.len());

    let mut per_query = Vec::with_capacity(labelled.len());
    for (index, item) in labelled.iter().enumerate() {
        let recommended: Vec<String> = pipeline
            .recommend(&item.query, k)
            .await
            .into_iter()
            .map(|c| c.record.url)
            .collect();
        let recall = recall_at_k(&item.relevant_urls, &recommended, k);

        per_query.push(QueryEvaluation {
            query: item.query.clone(),
            recall,
            num_relevant: item.relevant_urls.len(),
            num_recommended: recommended.len(),
            recommended_urls: recommended,
        });
        progress.query_done(index + 1, labelled.len());
    }

    let recalls: Vec<f64> = per_query.iter().map(|q| q.recall).collect();
    let report = EvaluationReport {
        mean_recall_at_k: mean_recall_at_k(&recalls),
        min_recall: recalls.iter().copied().reduce(f64::min).unwrap_or(0.0),
        max_recall: recalls.iter().copied().reduce(f64::max).unwrap_or(0.0),
        k,
        generated_at: Utc::now(),
        per_query,
    };

    progress.finished();
    info!(mean_recall = report.mean_recall_at_k, "evaluation complete");
    report
}

/// Recommend for each query and flatten into one row per result.
#[instrument(skip_all, fields(queries = queries.len(), k = k))]
pub async fn predict<P: EmbeddingProvider>(
    pipeline: &RecommendationPipeline<P>,
    queries: &[String],
    k: usize,
    progress: &dyn EvaluationProgress,
) -> Vec<PredictionRow> {
    progress.started(queries.len());

    let mut rows = Vec::new();
    for (index, query) in queries.iter().enumerate() {
        rows.extend(
            pipeline
                .recommend(query, k)
                .await
                .into_iter()
                .map(|c| PredictionRow {
                    query: query.clone(),
                    assessment_url: c.record.url,
                }),
        );
        progress.query_done(index + 1, queries.len());
    }

    progress.finished();
    rows
}

pub fn write_predictions(path: &Path, rows: &[PredictionRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| AssessRankError::io(parent, e))?;
    }
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    for row in rows {
        writer.serialize(row).map_err(csv_error)?;
    }
    writer.flush().map_err(|e| AssessRankError::io(path, e))?;
    info!(?path, rows = rows.len(), "wrote predictions");
    Ok(())
}
