//! Core domain types for assessment catalogs and recommendation output.

use serde::{Deserialize, Serialize};

/// Duration assumed when a record carries none.
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

// ---------------------------------------------------------------------------
// SupportFlag
// ---------------------------------------------------------------------------

/// A Yes/No capability flag as published in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupportFlag {
    Yes,
    No,
}

impl SupportFlag {
    /// Parse a catalog value, falling back to `default` for anything unrecognised.
    pub fn parse_or(value: Option<&str>, default: SupportFlag) -> SupportFlag {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "yes" || v == "true" => SupportFlag::Yes,
            Some(v) if v == "no" || v == "false" => SupportFlag::No,
            _ => default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }
}

impl std::fmt::Display for SupportFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RawAssessmentRecord
// ---------------------------------------------------------------------------

/// A catalog entry exactly as found on disk or produced by the scraper.
///
/// Every field is optional and loosely typed; [`AssessmentRecord::from_raw`]
/// applies the defaults once.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAssessmentRecord {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration: Option<serde_json::Value>,
    #[serde(default)]
    pub adaptive_support: Option<String>,
    #[serde(default)]
    pub remote_support: Option<String>,
    #[serde(default)]
    pub test_type: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// AssessmentRecord
// ---------------------------------------------------------------------------

/// One assessment product in the catalog. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    /// Product page URL, the record's identity.
    pub url: String,
    /// Display name.
    pub name: String,
    /// Free text used for lexical matching.
    pub description: String,
    /// Duration in minutes.
    pub duration: u32,
    pub adaptive_support: SupportFlag,
    pub remote_support: SupportFlag,
    /// Category labels such as "Knowledge & Skills", in catalog order.
    pub test_type: Vec<String>,
}

impl AssessmentRecord {
    /// Build a record from a raw entry, applying per-field defaults.
    ///
    /// Returns `None` when the entry has no usable `url`, since the URL is
    /// the only identity a record has.
    pub fn from_raw(raw: RawAssessmentRecord) -> Option<Self> {
        let url = raw.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())?;

        Some(Self {
            url,
            name: raw.name.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            duration: raw
                .duration
                .as_ref()
                .and_then(duration_minutes)
                .unwrap_or(DEFAULT_DURATION_MINUTES),
            adaptive_support: SupportFlag::parse_or(raw.adaptive_support.as_deref(), SupportFlag::No),
            remote_support: SupportFlag::parse_or(raw.remote_support.as_deref(), SupportFlag::Yes),
            test_type: raw.test_type.as_ref().map(labels).unwrap_or_default(),
        })
    }

    /// `name description labels`, the text embedded and tokenised for matching.
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {}",
            self.name,
            self.description,
            self.test_type.join(" ")
        )
    }

    /// All category labels joined with spaces and lowercased.
    pub fn test_types_lower(&self) -> String {
        self.test_type.join(" ").to_lowercase()
    }
}

/// Accept `45`, `45.0` or `"45 minutes"`.
fn duration_minutes(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        serde_json::Value::String(s) => {
            let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

/// Accept a list of labels or a single label string.
fn labels(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect(),
        serde_json::Value::String(s) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Response projection
// ---------------------------------------------------------------------------

/// The shape handed to collaborators for each recommended assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentResponse {
    pub url: String,
    pub name: String,
    pub adaptive_support: String,
    pub description: String,
    pub duration: u32,
    pub remote_support: String,
    pub test_type: Vec<String>,
}

impl From<&AssessmentRecord> for AssessmentResponse {
    fn from(record: &AssessmentRecord) -> Self {
        Self {
            url: record.url.clone(),
            name: record.name.clone(),
            adaptive_support: record.adaptive_support.to_string(),
            description: record.description.clone(),
            duration: record.duration,
            remote_support: record.remote_support.to_string(),
            test_type: record.test_type.clone(),
        }
    }
}

/// Envelope used for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommended_assessments: Vec<AssessmentResponse>,
}
