//! Intent detection, candidate categorization and the mixing policy.
//!
//! All three are ordered data tables: the first matching entry wins.

use assessrank_shared::{AssessmentRecord, KeywordsConfig};

// ---------------------------------------------------------------------------
// Intents
// ---------------------------------------------------------------------------

/// A hiring need that a query can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Technical,
    Behavioral,
    Cognitive,
    Sales,
}

/// The set of intents detected in one query. Several may hold at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Intents {
    pub technical: bool,
    pub behavioral: bool,
    pub cognitive: bool,
    pub sales: bool,
}

impl Intents {
    pub fn has(&self, intent: Intent) -> bool {
        match intent {
            Intent::Technical => self.technical,
            Intent::Behavioral => self.behavioral,
            Intent::Cognitive => self.cognitive,
            Intent::Sales => self.sales,
        }
    }

    fn set(&mut self, intent: Intent) {
        match intent {
            Intent::Technical => self.technical = true,
            Intent::Behavioral => self.behavioral = true,
            Intent::Cognitive => self.cognitive = true,
            Intent::Sales => self.sales = true,
        }
    }
}

/// Detects intents by substring search for configured keywords.
#[derive(Debug, Clone)]
pub struct IntentDetector {
    sets: Vec<(Intent, Vec<String>)>,
}

impl IntentDetector {
    pub fn from_config(keywords: &KeywordsConfig) -> Self {
        let lower = |words: &[String]| words.iter().map(|w| w.to_lowercase()).collect();
        Self {
            sets: vec![
                (Intent::Technical, lower(&keywords.technical_intent)),
                (Intent::Behavioral, lower(&keywords.behavioral_intent)),
                (Intent::Cognitive, lower(&keywords.cognitive_intent)),
                (Intent::Sales, lower(&keywords.sales_intent)),
            ],
        }
    }

    /// Lowercase the query and test each keyword as a substring.
    pub fn detect(&self, query: &str) -> Intents {
        let query = query.to_lowercase();
        let mut intents = Intents::default();
        for (intent, words) in &self.sets {
            if words.iter().any(|w| query.contains(w.as_str())) {
                intents.set(*intent);
            }
        }
        intents
    }
}

impl Default for IntentDetector {
    fn default() -> Self {
        Self::from_config(&KeywordsConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Buckets
// ---------------------------------------------------------------------------

/// The category a candidate is balanced under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    Technical,
    Behavioral,
    Cognitive,
    Sales,
    Other,
}

impl Bucket {
    pub const ALL: [Bucket; 5] = [
        Bucket::Technical,
        Bucket::Behavioral,
        Bucket::Cognitive,
        Bucket::Sales,
        Bucket::Other,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::Behavioral => "behavioral",
            Self::Cognitive => "cognitive",
            Self::Sales => "sales",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Narrows a rule match by the record's name.
#[derive(Debug, Clone, Copy)]
pub struct NameGate {
    /// Lowercase substring the name must contain for the rule's bucket.
    pub contains: &'static str,
    /// Bucket used when the name does not match.
    pub otherwise: Bucket,
}

/// Places a record whose joined labels contain any of `labels_any`.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub labels_any: &'static [&'static str],
    pub bucket: Bucket,
    pub name_gate: Option<NameGate>,
}

pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        labels_any: &["knowledge", "skills"],
        bucket: Bucket::Technical,
        name_gate: None,
    },
    CategoryRule {
        labels_any: &["personality", "behavior"],
        bucket: Bucket::Behavioral,
        name_gate: None,
    },
    CategoryRule {
        labels_any: &["ability", "aptitude"],
        bucket: Bucket::Cognitive,
        name_gate: None,
    },
    CategoryRule {
        labels_any: &["competencies"],
        bucket: Bucket::Sales,
        name_gate: Some(NameGate {
            contains: "sales",
            otherwise: Bucket::Other,
        }),
    },
];

/// Assign a record to exactly one bucket.
pub fn categorize(record: &AssessmentRecord) -> Bucket {
    let labels = record.test_types_lower();

    let Some(rule) = CATEGORY_RULES
        .iter()
        .find(|rule| rule.labels_any.iter().any(|l| labels.contains(*l)))
    else {
        return Bucket::Other;
    };

    match rule.name_gate {
        Some(gate) if !record.name.to_lowercase().contains(gate.contains) => gate.otherwise,
        _ => rule.bucket,
    }
}

// ---------------------------------------------------------------------------
// Mixing policy
// ---------------------------------------------------------------------------

/// How many slots a bucket receives out of `top_k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quota {
    Fixed(usize),
    /// `top_k / 2`, rounded down.
    Half,
    /// `top_k` minus the quotas already handed out by this rule.
    Remainder,
    /// `top_k - n`, saturating.
    AllBut(usize),
}

impl Quota {
    pub fn resolve(self, top_k: usize, allocated: usize) -> usize {
        match self {
            Self::Fixed(n) => n,
            Self::Half => top_k / 2,
            Self::Remainder => top_k.saturating_sub(allocated),
            Self::AllBut(n) => top_k.saturating_sub(n),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Allocation {
    pub bucket: Bucket,
    pub quota: Quota,
}

/// Applies when every intent in `requires` was detected.
#[derive(Debug, Clone, Copy)]
pub struct MixRule {
    pub name: &'static str,
    pub requires: &'static [Intent],
    pub allocations: &'static [Allocation],
}

impl MixRule {
    pub fn matches(&self, intents: &Intents) -> bool {
        self.requires.iter().all(|i| intents.has(*i))
    }
}

const fn alloc(bucket: Bucket, quota: Quota) -> Allocation {
    Allocation { bucket, quota }
}

/// Ordered so that "technical only" is only reached without behavioral, and
/// "sales only" without either. The last rule always matches.
pub const MIX_RULES: &[MixRule] = &[
    MixRule {
        name: "technical+behavioral",
        requires: &[Intent::Technical, Intent::Behavioral],
        allocations: &[
            alloc(Bucket::Technical, Quota::Half),
            alloc(Bucket::Behavioral, Quota::Remainder),
        ],
    },
    MixRule {
        name: "technical",
        requires: &[Intent::Technical],
        allocations: &[
            alloc(Bucket::Technical, Quota::AllBut(2)),
            alloc(Bucket::Cognitive, Quota::Fixed(2)),
        ],
    },
    MixRule {
        name: "behavioral",
        requires: &[Intent::Behavioral],
        allocations: &[
            alloc(Bucket::Behavioral, Quota::AllBut(2)),
            alloc(Bucket::Cognitive, Quota::Fixed(2)),
        ],
    },
    MixRule {
        name: "sales",
        requires: &[Intent::Sales],
        allocations: &[
            alloc(Bucket::Sales, Quota::AllBut(2)),
            alloc(Bucket::Behavioral, Quota::Fixed(2)),
        ],
    },
    MixRule {
        name: "mixed",
        requires: &[],
        allocations: &[
            alloc(Bucket::Technical, Quota::Fixed(3)),
            alloc(Bucket::Behavioral, Quota::Fixed(3)),
            alloc(Bucket::Cognitive, Quota::Fixed(2)),
            alloc(Bucket::Other, Quota::Fixed(2)),
        ],
    },
];

/// The first rule whose required intents are all present.
pub fn mix_rule_for(intents: &Intents) -> &'static MixRule {
    MIX_RULES
        .iter()
        .find(|rule| rule.matches(intents))
        .unwrap_or(&MIX_RULES[MIX_RULES.len() - 1])
}

/// Resolve a rule's quotas for `top_k`, in allocation order.
pub fn quotas(rule: &MixRule, top_k: usize) -> Vec<(Bucket, usize)> {
    let mut allocated = 0;
    rule.allocations
        .iter()
        .map(|a| {
            let n = a.quota.resolve(top_k, allocated);
            allocated += n;
            (a.bucket, n)
        })
        .collect()
}
