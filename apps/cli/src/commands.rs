//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use assessrank_catalog::{
    Catalog, CatalogScraper, ScrapeOptions, ScrapeProgress, fallback_records,
};
use assessrank_core::evaluation::{self, EvaluationProgress};
use assessrank_core::{
    RecommendationPipeline, RecommendationService, ScoreSource, ScoredCandidate, bucket_counts,
    format_response,
};
use assessrank_embedding::{EmbeddingProvider, Provider};
use assessrank_shared::{
    AppConfig, RecommendationResponse, init_config, load_config, load_config_from,
};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// AssessRank: recommend assessments for a hiring need.
#[derive(Parser)]
#[command(
    name = "assessrank",
    version,
    about = "Recommend assessments from a product catalog for a free-text hiring query.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file to use instead of ~/.assessrank/assessrank.toml.
    #[arg(long, global = true, env = "ASSESSRANK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Recommend assessments for a query.
    Recommend {
        /// Hiring query or job description.
        query: String,

        /// Number of results (defaults to the configured maximum).
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Print the JSON response instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Catalog management.
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Measure Recall@K against labelled queries.
    Eval {
        /// CSV with Query and Assessment_url columns.
        #[arg(long)]
        labels: Option<PathBuf>,

        /// Cut-off for recall and results per query.
        #[arg(long)]
        k: Option<usize>,

        /// Where to write the JSON report.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Write recommendations for a list of queries as CSV.
    Predict {
        /// CSV with a Query column.
        #[arg(long)]
        queries: PathBuf,

        /// Results per query.
        #[arg(long)]
        k: Option<usize>,

        /// Output CSV path.
        #[arg(short, long, default_value = "predictions.csv")]
        out: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Catalog subcommands.
#[derive(Subcommand)]
pub(crate) enum CatalogAction {
    /// Scrape the public catalog (writes the seed data if nothing is found).
    Scrape {
        /// Output path (defaults to the configured catalog path).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Write the built-in seed catalog.
    Seed {
        /// Output path (defaults to the configured catalog path).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Show record counts per category.
    Stats,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "assessrank=info",
        1 => "assessrank=debug",
        _ => "assessrank=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    match cli.command {
        Command::Recommend { query, top_k, json } => {
            cmd_recommend(&config, &query, top_k, json).await
        }
        Command::Catalog { action } => match action {
            CatalogAction::Scrape { out } => cmd_catalog_scrape(&config, out.as_deref()).await,
            CatalogAction::Seed { out } => cmd_catalog_seed(&config, out.as_deref()),
            CatalogAction::Stats => cmd_catalog_stats(&config),
        },
        Command::Eval { labels, k, out } => {
            cmd_eval(&config, labels.as_deref(), k, out.as_deref()).await
        }
        Command::Predict { queries, k, out } => cmd_predict(&config, &queries, k, &out).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

/// Load the configured catalog and pick the embedding provider.
fn build_pipeline(config: &AppConfig) -> Result<RecommendationPipeline<Provider>> {
    let catalog = Catalog::load(Path::new(&config.catalog.path))?;
    if catalog.is_empty() {
        warn!(
            path = %config.catalog.path,
            "catalog is empty, run `assessrank catalog seed` or `assessrank catalog scrape`"
        );
    }

    let provider = Provider::from_config(config);
    info!(
        records = catalog.len(),
        provider = provider.name(),
        "recommendation engine ready"
    );
    Ok(RecommendationPipeline::new(Arc::new(catalog), provider, config))
}

// ---------------------------------------------------------------------------
// recommend
// ---------------------------------------------------------------------------

async fn cmd_recommend(
    config: &AppConfig,
    query: &str,
    top_k: Option<usize>,
    json: bool,
) -> Result<()> {
    let service = RecommendationService::new(build_pipeline(config)?, &config.recommend);
    let top_k = top_k.unwrap_or(config.recommend.max_results);
    let results = service.recommend_scored(query, top_k).await?;

    if json {
        let response = RecommendationResponse {
            recommended_assessments: format_response(&results),
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    print_table(&results);
    Ok(())
}

fn print_table(results: &[ScoredCandidate]) {
    if results.is_empty() {
        println!("No recommendations.");
        return;
    }

    println!();
    for (rank, candidate) in results.iter().enumerate() {
        let record = &candidate.record;
        let score = match candidate.source {
            ScoreSource::Semantic => format!("similarity {:.3}", candidate.score),
            ScoreSource::Keyword => format!("keyword score {}", candidate.score),
            ScoreSource::Padding => "padding".to_string(),
        };
        println!("  {:>2}. {}", rank + 1, record.name);
        println!(
            "      {} min | adaptive {} | remote {} | {}",
            record.duration,
            record.adaptive_support,
            record.remote_support,
            record.test_type.join(", ")
        );
        println!("      {score}");
        println!("      {}", record.url);
    }
    println!();
}

// ---------------------------------------------------------------------------
// catalog
// ---------------------------------------------------------------------------

async fn cmd_catalog_scrape(config: &AppConfig, out: Option<&Path>) -> Result<()> {
    let out = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.catalog.path));
    let scraper = CatalogScraper::new(ScrapeOptions::from(&config.catalog))?;

    let progress = CliProgress::new("Fetching catalog listing");
    let mut records = scraper.scrape(&progress).await;
    progress.finish();

    if records.is_empty() {
        warn!("no assessments scraped, writing built-in seed data instead");
        records = fallback_records();
    }

    let catalog = Catalog::from_records(records);
    catalog.save(&out)?;
    println!("  Saved {} assessments to {}", catalog.len(), out.display());
    Ok(())
}

fn cmd_catalog_seed(config: &AppConfig, out: Option<&Path>) -> Result<()> {
    let out = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.catalog.path));
    let catalog = Catalog::from_records(fallback_records());
    catalog.save(&out)?;
    println!("  Saved {} seed assessments to {}", catalog.len(), out.display());
    Ok(())
}

fn cmd_catalog_stats(config: &AppConfig) -> Result<()> {
    let path = Path::new(&config.catalog.path);
    let catalog = Catalog::load(path)?;

    println!();
    println!("  Catalog:  {}", path.display());
    println!("  Records:  {}", catalog.len());
    for (bucket, count) in bucket_counts(&catalog) {
        println!("  {:<9} {count}", format!("{bucket}:"));
    }
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// eval / predict
// ---------------------------------------------------------------------------

async fn cmd_eval(
    config: &AppConfig,
    labels: Option<&Path>,
    k: Option<usize>,
    out: Option<&Path>,
) -> Result<()> {
    let labels_path = labels
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.evaluation.labels_path));
    let out = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.evaluation.report_path));
    let k = k.unwrap_or(config.evaluation.k);
    if k == 0 {
        return Err(eyre!("k must be at least 1"));
    }

    let labelled = evaluation::load_labels(&labels_path)?;
    let pipeline = build_pipeline(config)?;

    let progress = CliProgress::new("Evaluating");
    let report = evaluation::evaluate(&pipeline, &labelled, k, &progress).await;
    report.write(&out)?;

    println!();
    println!("  Queries:         {}", report.per_query.len());
    println!("  Mean Recall@{k}:  {:.4}", report.mean_recall_at_k);
    println!("  Min Recall@{k}:   {:.4}", report.min_recall);
    println!("  Max Recall@{k}:   {:.4}", report.max_recall);
    println!("  Report:          {}", out.display());
    println!();
    Ok(())
}

async fn cmd_predict(
    config: &AppConfig,
    queries: &Path,
    k: Option<usize>,
    out: &Path,
) -> Result<()> {
    let k = k.unwrap_or(config.recommend.max_results);
    let queries = evaluation::load_queries(queries)?;
    let pipeline = build_pipeline(config)?;

    let progress = CliProgress::new("Predicting");
    let rows = evaluation::predict(&pipeline, &queries, k, &progress).await;
    evaluation::write_predictions(out, &rows)?;

    println!(
        "  Wrote {} rows for {} queries to {}",
        rows.len(),
        queries.len(),
        out.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
    label: &'static str,
}

impl CliProgress {
    fn new(label: &'static str) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.set_message(label);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner, label }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ScrapeProgress for CliProgress {
    fn product(&self, url: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Fetching [{current}/{total}] {url}"));
    }
}

impl EvaluationProgress for CliProgress {
    fn started(&self, total: usize) {
        self.spinner.set_message(format!("{} [0/{total}]", self.label));
    }

    fn query_done(&self, current: usize, total: usize) {
        self.spinner
            .set_message(format!("{} [{current}/{total}]", self.label));
    }

    fn finished(&self) {
        self.finish();
    }
}
