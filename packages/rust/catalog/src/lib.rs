//! Assessment catalog: loading, saving, seeding and scraping.
//!
//! This crate provides:
//! - [`Catalog`]: the ordered, URL-unique record collection the engine reads
//! - [`fallback_records`]: built-in seed data used when scraping yields nothing
//! - [`CatalogScraper`]: fetches product pages from the public catalog site

mod scrape;
mod seed;

use std::collections::HashSet;
use std::path::Path;

use assessrank_shared::{AssessRankError, AssessmentRecord, RawAssessmentRecord, Result};
use tracing::{info, warn};

pub use scrape::{
    CatalogScraper, ScrapeOptions, ScrapeProgress, SilentScrapeProgress, extract_duration,
    extract_test_types,
};
pub use seed::fallback_records;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Ordered assessment records with unique URLs.
///
/// Built once at startup and never mutated; catalog position is the index
/// used by the embedding cache.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<AssessmentRecord>,
}

impl Catalog {
    /// Build a catalog, keeping the first record for each URL.
    pub fn from_records(records: impl IntoIterator<Item = AssessmentRecord>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::new();

        for record in records {
            if seen.insert(record.url.clone()) {
                kept.push(record);
            } else {
                warn!(url = %record.url, "duplicate catalog URL, keeping first occurrence");
            }
        }

        Self { records: kept }
    }

    /// Parse a JSON array of raw records.
    ///
    /// Entries that are not objects or have no URL are skipped; missing
    /// fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let values: Vec<serde_json::Value> = serde_json::from_str(json)
            .map_err(|e| AssessRankError::Catalog(format!("catalog is not a JSON array: {e}")))?;

        let mut records = Vec::with_capacity(values.len());
        for (position, value) in values.into_iter().enumerate() {
            let raw: RawAssessmentRecord = match serde_json::from_value(value) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(position, error = %e, "skipping unreadable catalog entry");
                    continue;
                }
            };
            match AssessmentRecord::from_raw(raw) {
                Some(record) => records.push(record),
                None => warn!(position, "skipping catalog entry without url"),
            }
        }

        Ok(Self::from_records(records))
    }

    /// Load the catalog from a JSON file. A missing file yields an empty catalog.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(?path, "no assessments file found, catalog is empty");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| AssessRankError::io(path, e))?;
        let catalog = Self::from_json(&content)?;
        info!(?path, count = catalog.len(), "loaded assessments");
        Ok(catalog)
    }

    /// Write the catalog as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| AssessRankError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(&self.records)
            .map_err(|e| AssessRankError::Catalog(format!("failed to serialize catalog: {e}")))?;
        std::fs::write(path, json).map_err(|e| AssessRankError::io(path, e))?;

        info!(?path, count = self.len(), "saved assessments");
        Ok(())
    }

    pub fn records(&self) -> &[AssessmentRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&AssessmentRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AssessmentRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a AssessmentRecord;
    type IntoIter = std::slice::Iter<'a, AssessmentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_skips_bad_entries_and_duplicates() {
        let json = r#"[
            {"url": "https://x/a", "name": "A"},
            {"name": "no url"},
            42,
            {"url": "https://x/a", "name": "A again"},
            {"url": "https://x/b", "name": "B", "duration": 20}
        ]"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.records()[0].name, "A");
        assert_eq!(catalog.records()[1].duration, 20);
    }

    #[test]
    fn from_json_rejects_non_array() {
        let err = Catalog::from_json(r#"{"url": "x"}"#).unwrap_err();
        assert!(matches!(err, AssessRankError::Catalog(_)));
    }

    #[test]
    fn missing_file_is_empty_catalog() {
        let catalog = Catalog::load(Path::new("/nonexistent/assessments.json")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn save_then_load_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("assessments.json");

        let catalog = Catalog::from_records(fallback_records());
        catalog.save(&path).unwrap();

        let loaded = Catalog::load(&path).unwrap();
        assert_eq!(loaded.len(), catalog.len());
        assert_eq!(loaded.records(), catalog.records());
    }
}
