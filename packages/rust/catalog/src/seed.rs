//! Built-in seed catalog.
//!
//! Ten well-known products used when scraping produces nothing, so the
//! engine always has something to rank.

use assessrank_shared::{AssessmentRecord, SupportFlag};

/// (url, name, description, duration, test types)
const SEED: &[(&str, &str, &str, u32, &[&str])] = &[
    (
        "https://www.shl.com/solutions/products/product-catalog/view/automata-fix-new/",
        "Automata Fix",
        "Technical coding assessment for automated testing",
        60,
        &["Knowledge & Skills"],
    ),
    (
        "https://www.shl.com/solutions/products/product-catalog/view/core-java-entry-level-new/",
        "Core Java Entry Level",
        "Java programming assessment for entry-level developers",
        45,
        &["Knowledge & Skills"],
    ),
    (
        "https://www.shl.com/solutions/products/product-catalog/view/java-8-new/",
        "Java 8",
        "Advanced Java 8 programming assessment",
        60,
        &["Knowledge & Skills"],
    ),
    (
        "https://www.shl.com/products/product-catalog/view/interpersonal-communications/",
        "Interpersonal Communications",
        "Assessment of communication and collaboration skills",
        30,
        &["Personality & Behavior", "Competencies"],
    ),
    (
        "https://www.shl.com/solutions/products/product-catalog/view/entry-level-sales-7-1/",
        "Entry Level Sales 7.1",
        "Sales aptitude assessment for entry-level positions",
        60,
        &["Competencies"],
    ),
    (
        "https://www.shl.com/products/product-catalog/view/occupational-personality-questionnaire-opq32r/",
        "Occupational Personality Questionnaire OPQ32r",
        "Comprehensive personality assessment for workplace behavior",
        90,
        &["Personality & Behavior"],
    ),
    (
        "https://www.shl.com/solutions/products/product-catalog/view/verify-verbal-ability-next-generation/",
        "Verify Verbal Ability Next Generation",
        "Verbal reasoning and comprehension assessment",
        18,
        &["Ability & Aptitude"],
    ),
    (
        "https://www.shl.com/solutions/products/product-catalog/view/verify-numerical-ability/",
        "Verify Numerical Ability",
        "Numerical reasoning assessment",
        18,
        &["Ability & Aptitude"],
    ),
    (
        "https://www.shl.com/solutions/products/product-catalog/view/python-new/",
        "Python",
        "Python programming skills assessment",
        60,
        &["Knowledge & Skills"],
    ),
    (
        "https://www.shl.com/solutions/products/product-catalog/view/sql-server-new/",
        "SQL Server",
        "SQL database querying and management assessment",
        60,
        &["Knowledge & Skills"],
    ),
];

/// The built-in seed records, in a fixed order.
pub fn fallback_records() -> Vec<AssessmentRecord> {
    SEED.iter()
        .map(|(url, name, description, duration, types)| AssessmentRecord {
            url: (*url).to_string(),
            name: (*name).to_string(),
            description: (*description).to_string(),
            duration: *duration,
            adaptive_support: if description.to_lowercase().contains("adaptive") {
                SupportFlag::Yes
            } else {
                SupportFlag::No
            },
            remote_support: SupportFlag::Yes,
            test_type: types.iter().map(|t| (*t).to_string()).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn seed_has_ten_unique_urls() {
        let records = fallback_records();
        assert_eq!(records.len(), 10);
        let urls: HashSet<_> = records.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls.len(), 10);
    }

    #[test]
    fn seed_flags() {
        let records = fallback_records();
        assert!(records.iter().all(|r| r.remote_support == SupportFlag::Yes));
        assert!(records.iter().all(|r| r.adaptive_support == SupportFlag::No));
        let python = records.iter().find(|r| r.name == "Python").unwrap();
        assert_eq!(python.duration, 60);
        assert_eq!(python.test_type, vec!["Knowledge & Skills"]);
    }
}
