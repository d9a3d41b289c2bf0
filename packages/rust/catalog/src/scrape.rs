//! Product catalog scraper.
//!
//! Fetches the catalog listing page, collects individual product links
//! (pre-packaged job solutions excluded), then visits each product page in
//! turn and extracts an [`AssessmentRecord`].

use std::sync::LazyLock;
use std::time::Duration;

use assessrank_shared::{
    AssessRankError, AssessmentRecord, CatalogConfig, DEFAULT_DURATION_MINUTES, Result,
    SupportFlag,
};
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// User-Agent string for catalog requests.
const USER_AGENT: &str = concat!("AssessRank/", env!("CARGO_PKG_VERSION"));

/// Path fragment that marks an individual product page.
const PRODUCT_PATH_MARKER: &str = "/product-catalog/view/";

/// Listing links containing this fragment are pre-packaged job solutions.
const JOB_SOLUTION_MARKER: &str = "job-";

/// Longest description kept when falling back to page content.
const MAX_DESCRIPTION_CHARS: usize = 500;

/// Used when a page carries no description at all.
const DEFAULT_DESCRIPTION: &str = "SHL assessment for talent evaluation";

/// Label assigned when no category keyword is found.
const DEFAULT_TEST_TYPE: &str = "Assessment";

/// Category labels and the page keywords that imply them, in output order.
const TEST_TYPE_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Knowledge & Skills",
        &[
            "technical", "coding", "programming", "java", "python", "sql", "javascript", "css",
            "html", "knowledge", "skill",
        ],
    ),
    (
        "Personality & Behavior",
        &[
            "personality", "behavior", "opq", "leadership", "cultural fit", "behavioral",
            "competenc",
        ],
    ),
    (
        "Ability & Aptitude",
        &[
            "cognitive", "numerical", "verbal", "reasoning", "aptitude", "inductive",
            "deductive", "ability",
        ],
    ),
    (
        "Competencies",
        &["competenc", "sales", "customer service", "communication", "manager"],
    ),
    (
        "Simulations",
        &["simulation", "exercise", "case study", "role play"],
    ),
];

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Runtime scrape configuration, derived from `[catalog]`.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Listing page to start from.
    pub source_url: String,
    /// Origin relative links are resolved against.
    pub base_url: String,
    /// Maximum product pages to fetch.
    pub max_pages: usize,
    /// Pause between product requests.
    pub request_delay_ms: u64,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl From<&CatalogConfig> for ScrapeOptions {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            source_url: config.source_url.clone(),
            base_url: config.base_url.clone(),
            max_pages: config.max_pages,
            request_delay_ms: config.request_delay_ms,
            timeout_secs: config.timeout_secs,
        }
    }
}

/// Progress callback for scraping.
pub trait ScrapeProgress: Send + Sync {
    /// Called before each product page is fetched.
    fn product(&self, url: &str, current: usize, total: usize);
}

/// No-op progress for headless/test usage.
pub struct SilentScrapeProgress;

impl ScrapeProgress for SilentScrapeProgress {
    fn product(&self, _url: &str, _current: usize, _total: usize) {}
}

// ---------------------------------------------------------------------------
// Scraper
// ---------------------------------------------------------------------------

/// Sequential, rate-limited catalog scraper.
pub struct CatalogScraper {
    client: Client,
    options: ScrapeOptions,
}

impl CatalogScraper {
    /// Create a scraper with its own HTTP client.
    pub fn new(options: ScrapeOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(options.timeout_secs))
            .build()
            .map_err(|e| AssessRankError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, options })
    }

    /// Scrape the catalog. Failures are logged; the result holds whatever
    /// products were scraped successfully (possibly none).
    #[instrument(skip_all, fields(source = %self.options.source_url))]
    pub async fn scrape(&self, progress: &dyn ScrapeProgress) -> Vec<AssessmentRecord> {
        info!("starting to scrape catalog");

        let links = match self.listing_links().await {
            Ok(links) => links,
            Err(e) => {
                warn!(error = %e, "error scraping catalog");
                return Vec::new();
            }
        };
        info!(count = links.len(), "found assessment links");

        let total = links.len().min(self.options.max_pages);
        let mut records = Vec::with_capacity(total);

        for (i, link) in links.iter().take(total).enumerate() {
            progress.product(link, i + 1, total);

            match self.scrape_product(link).await {
                Ok(record) => records.push(record),
                Err(e) => warn!(url = %link, error = %e, "error scraping product page"),
            }

            if self.options.request_delay_ms > 0 && i + 1 < total {
                tokio::time::sleep(Duration::from_millis(self.options.request_delay_ms)).await;
            }
        }

        info!(scraped = records.len(), "catalog scrape finished");
        records
    }

    /// Fetch the listing page and collect product links.
    async fn listing_links(&self) -> Result<Vec<String>> {
        let base = Url::parse(&self.options.base_url).map_err(|e| {
            AssessRankError::config(format!("invalid base_url {}: {e}", self.options.base_url))
        })?;
        let html = self.fetch_html(&self.options.source_url).await?;
        Ok(product_links(&html, &base))
    }

    /// Fetch and parse one product page.
    pub async fn scrape_product(&self, url: &str) -> Result<AssessmentRecord> {
        debug!(%url, "fetching product page");
        let html = self.fetch_html(url).await?;
        Ok(parse_product(url, &html))
    }

    async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AssessRankError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssessRankError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| AssessRankError::Network(format!("{url}: failed to read body: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Unique product links on a listing page, in document order.
pub(crate) fn product_links(html: &str, base: &Url) -> Vec<String> {
    let doc = Html::parse_document(html);
    let anchor = Selector::parse("a[href]").unwrap();

    let mut links: Vec<String> = Vec::new();
    for el in doc.select(&anchor) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        if !href.contains(PRODUCT_PATH_MARKER)
            || href.to_lowercase().contains(JOB_SOLUTION_MARKER)
        {
            continue;
        }

        let full = if href.starts_with("http") {
            href.to_string()
        } else {
            match base.join(href) {
                Ok(u) => u.to_string(),
                Err(_) => continue,
            }
        };

        if !links.contains(&full) {
            links.push(full);
        }
    }
    links
}

/// Build a record from a product page.
pub(crate) fn parse_product(url: &str, html: &str) -> AssessmentRecord {
    let doc = Html::parse_document(html);
    let page_text = doc.root_element().text().collect::<Vec<_>>().join(" ");

    let name = extract_name(&doc).unwrap_or_else(|| name_from_url(url));
    let description = extract_description(&doc).unwrap_or_else(|| DEFAULT_DESCRIPTION.into());

    let combined = format!("{page_text} {description}");
    let adaptive_support = if page_text.to_lowercase().contains("adaptive") {
        SupportFlag::Yes
    } else {
        SupportFlag::No
    };

    AssessmentRecord {
        url: url.to_string(),
        name,
        test_type: extract_test_types(&combined),
        duration: extract_duration(&combined),
        description,
        adaptive_support,
        remote_support: SupportFlag::Yes,
    }
}

fn extract_name(doc: &Html) -> Option<String> {
    let h1 = Selector::parse("h1").unwrap();
    doc.select(&h1)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_description(doc: &Html) -> Option<String> {
    static CLASS_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)description|overview").expect("valid regex"));

    let meta = Selector::parse(r#"meta[name="description"]"#).unwrap();
    if let Some(content) = doc
        .select(&meta)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        return Some(content.to_string());
    }

    let div = Selector::parse("div[class]").unwrap();
    doc.select(&div)
        .find(|el| el.value().attr("class").is_some_and(|c| CLASS_RE.is_match(c)))
        .map(|el| {
            el.text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .map(|text| text.chars().take(MAX_DESCRIPTION_CHARS).collect::<String>())
        .filter(|text| !text.is_empty())
}

/// `.../view/core-java-entry-level-new/` → `Core Java Entry Level New`.
fn name_from_url(url: &str) -> String {
    let slug = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url);

    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Category labels implied by page text, defaulting to `["Assessment"]`.
pub fn extract_test_types(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let types: Vec<String> = TEST_TYPE_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(label, _)| (*label).to_string())
        .collect();

    if types.is_empty() {
        vec![DEFAULT_TEST_TYPE.to_string()]
    } else {
        types
    }
}

/// First minutes figure in the text, else first hours figure ×60, else 60.
pub fn extract_duration(text: &str) -> u32 {
    static MINUTES_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(?:minutes?|mins?)").expect("valid regex"));
    static HOURS_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(?:hours?|hrs?)").expect("valid regex"));

    let first = |re: &Regex| -> Option<u32> {
        re.captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    };

    first(&MINUTES_RE)
        .or_else(|| first(&HOURS_RE).map(|h| h.saturating_mul(60)))
        .unwrap_or(DEFAULT_DURATION_MINUTES)
}
