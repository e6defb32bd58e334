//! Intent Classification
//!
//! Maps free-form request text (plus optional context hints) to one of a
//! closed set of intent categories with a confidence in `[0, 1]`.
//!
//! # Scoring
//!
//! Every category has one rule in a versioned scoring table. A rule adds
//! evidence from several sources and the sum is clamped to `[0, 1]`:
//!
//! ```text
//! keyword (whole word)     0.30 per distinct keyword
//! regex pattern            0.30 per pattern
//! question form            0.20 per pattern
//! relevant entity kind     0.15 per kind
//! temporal marker          0.20 (temporal categories)
//! relational language      0.20 (relational categories)
//! long-form / markdown     0.20 (document-writing categories)
//! ```
//!
//! The best score wins; ties go to the category declared first. Below the
//! confidence floor a looser keyword-only pass (substring matches at 0.10
//! each) gets a chance before the result falls back to `Unknown`.
//!
//! Context hints override scoring entirely, in this order: `intent`,
//! `needs_persistence`, `is_relational`, `is_temporary`.
//!
//! An `operation` hint (`store`, `search`, `retrieve` and their synonyms)
//! adds fixed evidence to the categories that operation implies. The
//! request's own [`Operation`] only nudges categories that already have
//! evidence, so it settles exact ties toward reads or writes without
//! lifting anything over the floor.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::config::DEFAULT_CONFIDENCE_FLOOR;
use super::entities::EntityKind;
use super::policy::ContextHints;
use crate::backend::Operation;

/// Version of the scoring table below. Bump whenever weights or rules change.
pub const SCORING_TABLE_VERSION: u32 = 2;

const KEYWORD_WEIGHT: f32 = 0.30;
const PATTERN_WEIGHT: f32 = 0.30;
const QUESTION_WEIGHT: f32 = 0.20;
const ENTITY_WEIGHT: f32 = 0.15;
const TEMPORAL_WEIGHT: f32 = 0.20;
const RELATIONAL_WEIGHT: f32 = 0.20;
const SHAPE_WEIGHT: f32 = 0.20;
const LOOSE_KEYWORD_WEIGHT: f32 = 0.10;
const OPERATION_NUDGE: f32 = 0.025;

/// Confidence given to a hint override when scoring found less
const HINT_CONFIDENCE: f32 = 0.9;

// ============================================================================
// Categories
// ============================================================================

/// Intent category
///
/// Declaration order matters: it breaks score ties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentCategory {
    /// Create an edge between entities
    CreateRelation,
    /// Ask how entities are related
    QueryRelation,
    /// Walk paths through the graph
    TraverseGraph,
    /// Write a new document or note
    WriteDoc,
    /// Read an existing document
    ReadDoc,
    /// Edit an existing document
    UpdateDoc,
    /// Similarity search
    SemanticSearch,
    /// Recall conversational context
    ContextRetrieval,
    /// Key/value style memory lookup
    MemoryLookup,
    /// Keep stores in sync
    SyncData,
    /// Compare across stores
    CrossReference,
    /// Store in every system
    ComprehensiveStore,
    /// Nothing matched
    Unknown,
}

impl IntentCategory {
    /// All categories in declaration order
    pub const ALL: [IntentCategory; 13] = [
        Self::CreateRelation,
        Self::QueryRelation,
        Self::TraverseGraph,
        Self::WriteDoc,
        Self::ReadDoc,
        Self::UpdateDoc,
        Self::SemanticSearch,
        Self::ContextRetrieval,
        Self::MemoryLookup,
        Self::SyncData,
        Self::CrossReference,
        Self::ComprehensiveStore,
        Self::Unknown,
    ];

    /// Stable snake_case name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateRelation => "create_relation",
            Self::QueryRelation => "query_relation",
            Self::TraverseGraph => "traverse_graph",
            Self::WriteDoc => "write_doc",
            Self::ReadDoc => "read_doc",
            Self::UpdateDoc => "update_doc",
            Self::SemanticSearch => "semantic_search",
            Self::ContextRetrieval => "context_retrieval",
            Self::MemoryLookup => "memory_lookup",
            Self::SyncData => "sync_data",
            Self::CrossReference => "cross_reference",
            Self::ComprehensiveStore => "comprehensive_store",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a category from its snake_case name
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Categories that always fan out to several backends
    #[must_use]
    pub fn is_multi_system(self) -> bool {
        matches!(
            self,
            Self::SyncData | Self::CrossReference | Self::ComprehensiveStore
        )
    }

    /// Categories that describe writing rather than reading
    #[must_use]
    pub fn is_write(self) -> bool {
        matches!(
            self,
            Self::CreateRelation
                | Self::WriteDoc
                | Self::UpdateDoc
                | Self::SyncData
                | Self::ComprehensiveStore
        )
    }
}

impl fmt::Display for IntentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Result
// ============================================================================

/// Outcome of classifying one request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    /// Winning category
    pub category: IntentCategory,
    /// Confidence in `[0, 1]`
    pub confidence: f32,
    /// Evidence that contributed to the winning score
    pub matched_patterns: Vec<String>,
    /// Human-readable explanation
    pub reasoning: String,
}

impl IntentResult {
    fn unknown(reasoning: impl Into<String>) -> Self {
        Self {
            category: IntentCategory::Unknown,
            confidence: 0.0,
            matched_patterns: Vec::new(),
            reasoning: reasoning.into(),
        }
    }

    /// Whether classification fell through to `Unknown`
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.category == IntentCategory::Unknown
    }
}

// ============================================================================
// Scoring Table
// ============================================================================

struct IntentRule {
    category: IntentCategory,
    keywords: &'static [&'static str],
    patterns: Vec<Regex>,
    questions: Vec<Regex>,
    temporal: bool,
    relational: bool,
    long_form: bool,
    entity_kinds: &'static [EntityKind],
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("intent pattern is valid"))
        .collect()
}

static RULES: Lazy<Vec<IntentRule>> = Lazy::new(|| {
    vec![
        IntentRule {
            category: IntentCategory::CreateRelation,
            keywords: &["connect", "link", "associate", "relate", "tie", "establish"],
            patterns: compile(&[
                r"\b(connect|link|associate|relate)\b.*\b(to|with)\b",
                r"\b(create|add|make|establish)\b.*\b(relation|relationship|link|connection)s?\b",
            ]),
            questions: Vec::new(),
            temporal: false,
            relational: true,
            long_form: false,
            entity_kinds: &[
                EntityKind::Person,
                EntityKind::Organization,
                EntityKind::Relationship,
            ],
        },
        IntentRule {
            category: IntentCategory::QueryRelation,
            keywords: &[
                "relationship",
                "relationships",
                "connections",
                "connected",
                "related",
                "linked",
                "associated",
            ],
            patterns: compile(&[
                r"\b(find|show|get|list)\b.*\b(relationships?|connections?|links?)\b",
                r"\bhow\b.*\b(related|connected|linked)\b",
            ]),
            questions: compile(&[r"^(who|what)\b.*\b(related|connected|linked|associated)\b"]),
            temporal: false,
            relational: true,
            long_form: false,
            entity_kinds: &[
                EntityKind::Relationship,
                EntityKind::Person,
                EntityKind::Organization,
            ],
        },
        IntentRule {
            category: IntentCategory::TraverseGraph,
            keywords: &["path", "traverse", "route", "network", "graph", "degrees", "hops"],
            patterns: compile(&[
                r"\b(path|route)\b.*\bfrom\b.*\bto\b",
                r"\b(degrees?|hops?)\s+(of\s+)?(separation|away)\b",
            ]),
            questions: compile(&[r"^(what|which)\b.*\bpath\b"]),
            temporal: false,
            relational: true,
            long_form: false,
            entity_kinds: &[EntityKind::Relationship],
        },
        IntentRule {
            category: IntentCategory::WriteDoc,
            keywords: &["write", "create", "compose", "draft", "note", "notes", "record"],
            patterns: compile(&[
                r"\b(create|write|draft|compose)\b.*\b(documentation|document|doc|note|notes|report|guide|page)\b",
                r"\b(save|record)\b.*\b(as|in)\s+(a\s+)?(note|document|doc)\b",
            ]),
            questions: Vec::new(),
            temporal: false,
            relational: false,
            long_form: true,
            entity_kinds: &[EntityKind::Document],
        },
        IntentRule {
            category: IntentCategory::ReadDoc,
            keywords: &["read", "open", "view", "display"],
            patterns: compile(&[
                r"\b(read|open|show|view)\b.*\b(documentation|document|doc|note|notes|report|file)\b",
            ]),
            questions: compile(&[r"^what\s+(does|did)\b.*\b(document|doc|note|report)\b.*\bsay\b"]),
            temporal: false,
            relational: false,
            long_form: false,
            entity_kinds: &[EntityKind::Document],
        },
        IntentRule {
            category: IntentCategory::UpdateDoc,
            keywords: &["update", "edit", "revise", "amend", "append", "modify"],
            patterns: compile(&[
                r"\b(update|edit|revise|amend|modify)\b.*\b(documentation|document|doc|note|notes|report|file)\b",
                r"\b(append|add)\b.*\bto\b.*\b(document|doc|note|notes|report|file)\b",
            ]),
            questions: Vec::new(),
            temporal: false,
            relational: false,
            long_form: false,
            entity_kinds: &[EntityKind::Document],
        },
        IntentRule {
            category: IntentCategory::SemanticSearch,
            keywords: &["search", "similar", "semantic", "meaning", "find"],
            patterns: compile(&[
                r"\bsearch\s+(for|through)\b",
                r"\bsimilar\s+to\b",
                r"\bfind\b.*\b(similar|about|like)\b",
            ]),
            questions: compile(&[r"^(is|are)\s+there\b.*\b(about|like|similar)\b"]),
            temporal: false,
            relational: false,
            long_form: false,
            entity_kinds: &[EntityKind::Concept],
        },
        IntentRule {
            category: IntentCategory::ContextRetrieval,
            keywords: &[
                "remember",
                "recall",
                "discussed",
                "discuss",
                "said",
                "conversation",
                "context",
                "history",
                "previous",
                "earlier",
            ],
            patterns: compile(&[
                r"\b(remember|recall)\b.*\b(discuss(ed)?|said|talked|mentioned|told)\b",
                r"\b(what|when)\s+(did\s+)?(we|i|you)\s+(discuss|say|talk|mention)",
                r"\blast\s+(conversation|session|time)\b",
            ]),
            questions: compile(&[r"^what\s+did\s+(we|i|you)\b"]),
            temporal: true,
            relational: false,
            long_form: false,
            entity_kinds: &[EntityKind::Conversation],
        },
        IntentRule {
            category: IntentCategory::MemoryLookup,
            keywords: &[
                "retrieve",
                "fetch",
                "lookup",
                "stored",
                "saved",
                "preference",
                "preferences",
                "memory",
                "memories",
            ],
            patterns: compile(&[
                r"\b(get|fetch|retrieve|lookup|look\s+up)\b.*\b(preferences?|settings?|value|key)\b",
                r"\bwhat\s+(is|are)\s+my\b.*\b(preferences?|settings?)\b",
            ]),
            questions: Vec::new(),
            temporal: false,
            relational: false,
            long_form: false,
            entity_kinds: &[EntityKind::Memory],
        },
        IntentRule {
            category: IntentCategory::SyncData,
            keywords: &["sync", "synchronize", "replicate", "mirror", "reconcile"],
            patterns: compile(&[
                r"\b(sync|synchronize|replicate|mirror)\b.*\b(across|between|with|to)\b",
                r"\bkeep\b.*\bin\s+sync\b",
            ]),
            questions: Vec::new(),
            temporal: false,
            relational: false,
            long_form: false,
            entity_kinds: &[],
        },
        IntentRule {
            category: IntentCategory::CrossReference,
            keywords: &["cross-reference", "cross-check", "correlate", "compare"],
            patterns: compile(&[
                r"\bcross[- ]?(reference|check)\b",
                r"\b(compare|correlate)\b.*\b(with|against|across|between)\b",
            ]),
            questions: Vec::new(),
            temporal: false,
            relational: false,
            long_form: false,
            entity_kinds: &[],
        },
        IntentRule {
            category: IntentCategory::ComprehensiveStore,
            keywords: &["comprehensive", "complete", "everything", "full", "everywhere"],
            patterns: compile(&[
                r"\b(store|save|remember|keep)\b.*\b(everywhere|all\s+systems|every\s+system|all\s+backends)\b",
                r"\b(comprehensive|complete|full)\s+(record|backup|copy|store)\b",
            ]),
            questions: Vec::new(),
            temporal: false,
            relational: false,
            long_form: false,
            entity_kinds: &[],
        },
    ]
});

static WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-z0-9]+(?:['-][a-z0-9]+)*").expect("word pattern is valid")
});

static TEMPORAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(yesterday|today|earlier|previously|recently|ago|before|last\s+(week|month|time|session))\b",
    )
    .expect("temporal pattern is valid")
});

static RELATIONAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(between|connected|linked)\b").expect("relational pattern is valid")
});

static MARKDOWN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(#{1,6}\s|[-*+]\s|\d+\.\s|```)").expect("markdown pattern is valid")
});

/// Content this long with line breaks counts as long-form
const LONG_FORM_CHARS: usize = 280;

fn is_long_form(text: &str) -> bool {
    MARKDOWN.is_match(text) || (text.len() >= LONG_FORM_CHARS && text.contains('\n'))
}

/// `operation` hint words and the evidence they add
const OPERATION_HINTS: [(&[&str], &[(IntentCategory, f32)]); 3] = [
    (
        &["store", "save", "create"],
        &[
            (IntentCategory::WriteDoc, 0.5),
            (IntentCategory::ComprehensiveStore, 0.3),
        ],
    ),
    (
        &["search", "find", "query"],
        &[
            (IntentCategory::SemanticSearch, 0.7),
            (IntentCategory::MemoryLookup, 0.5),
        ],
    ),
    (
        &["retrieve", "get", "recall"],
        &[
            (IntentCategory::ContextRetrieval, 0.7),
            (IntentCategory::MemoryLookup, 0.3),
        ],
    ),
];

/// Hint keys that force a category, in precedence order
const FLAG_OVERRIDES: [(&str, IntentCategory); 3] = [
    ("needs_persistence", IntentCategory::WriteDoc),
    ("is_relational", IntentCategory::CreateRelation),
    ("is_temporary", IntentCategory::MemoryLookup),
];

// ============================================================================
// Classifier
// ============================================================================

#[derive(Debug)]
struct RuleScore {
    category: IntentCategory,
    score: f32,
    matched: Vec<String>,
}

/// Rule-based intent classifier
#[derive(Clone, Debug)]
pub struct IntentClassifier {
    confidence_floor: f32,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_FLOOR)
    }
}

impl IntentClassifier {
    /// Create a classifier with the given confidence floor
    #[must_use]
    pub fn new(confidence_floor: f32) -> Self {
        Self { confidence_floor }
    }

    /// Confidence floor below which the keyword-only pass runs
    #[must_use]
    pub fn confidence_floor(&self) -> f32 {
        self.confidence_floor
    }

    /// Classify text with only hint-supplied entity kinds
    #[must_use]
    pub fn classify(&self, text: &str, hints: &ContextHints) -> IntentResult {
        self.classify_with_entities(text, hints, &BTreeSet::new())
    }

    /// Classify text, letting extracted entity kinds contribute evidence
    #[must_use]
    pub fn classify_with_entities(
        &self,
        text: &str,
        hints: &ContextHints,
        entity_kinds: &BTreeSet<EntityKind>,
    ) -> IntentResult {
        self.classify_inner(text, hints, entity_kinds, None)
    }

    /// Classify the text of a request, biased by the requested operation
    #[must_use]
    pub fn classify_for_operation(
        &self,
        operation: Operation,
        text: &str,
        hints: &ContextHints,
        entity_kinds: &BTreeSet<EntityKind>,
    ) -> IntentResult {
        self.classify_inner(text, hints, entity_kinds, Some(operation))
    }

    fn classify_inner(
        &self,
        text: &str,
        hints: &ContextHints,
        entity_kinds: &BTreeSet<EntityKind>,
        operation: Option<Operation>,
    ) -> IntentResult {
        let mut kinds = entity_kinds.clone();
        kinds.extend(hint_entity_kinds(hints));

        let lowered = text.trim().to_lowercase();
        let mut scores = score_rules(text, &lowered, &kinds);
        apply_operation_bias(&mut scores, hints, operation);

        if let Some((category, key)) = hint_override(hints) {
            let (score, mut matched) = scores
                .iter()
                .find(|s| s.category == category)
                .map(|s| (s.score, s.matched.clone()))
                .unwrap_or_default();
            matched.push(format!("hint:{key}"));
            return IntentResult {
                category,
                confidence: score.max(HINT_CONFIDENCE).min(1.0),
                matched_patterns: matched,
                reasoning: format!("context hint '{key}' selects {category}"),
            };
        }

        if let Some(best) = pick_best(scores) {
            if best.score >= self.confidence_floor {
                let reasoning = format!(
                    "{} scored {:.2} from {} signal(s)",
                    best.category,
                    best.score,
                    best.matched.len()
                );
                return IntentResult {
                    category: best.category,
                    confidence: best.score,
                    matched_patterns: best.matched,
                    reasoning,
                };
            }
        }

        match pick_best(loose_keyword_scores(&lowered)) {
            Some(best) if best.score > 0.0 => {
                let reasoning = format!(
                    "low-confidence keyword match for {} ({:.2})",
                    best.category, best.score
                );
                IntentResult {
                    category: best.category,
                    confidence: best.score,
                    matched_patterns: best.matched,
                    reasoning,
                }
            }
            _ => IntentResult::unknown("no pattern or keyword matched"),
        }
    }
}

fn score_rules(original: &str, lowered: &str, kinds: &BTreeSet<EntityKind>) -> Vec<RuleScore> {
    let words: HashSet<&str> = WORD.find_iter(lowered).map(|m| m.as_str()).collect();
    let temporal = TEMPORAL.is_match(lowered);
    let relational = RELATIONAL.is_match(lowered);
    let long_form = is_long_form(original);

    RULES
        .iter()
        .map(|rule| {
            let mut score = 0.0_f32;
            let mut matched = Vec::new();

            for keyword in rule.keywords {
                if words.contains(keyword) {
                    score += KEYWORD_WEIGHT;
                    matched.push(format!("keyword:{keyword}"));
                }
            }
            for pattern in &rule.patterns {
                if pattern.is_match(lowered) {
                    score += PATTERN_WEIGHT;
                    matched.push(format!("pattern:{}", pattern.as_str()));
                }
            }
            for question in &rule.questions {
                if question.is_match(lowered) {
                    score += QUESTION_WEIGHT;
                    matched.push(format!("question:{}", question.as_str()));
                }
            }
            for kind in rule.entity_kinds {
                if kinds.contains(kind) {
                    score += ENTITY_WEIGHT;
                    matched.push(format!("entity:{kind}"));
                }
            }
            if rule.temporal && temporal {
                score += TEMPORAL_WEIGHT;
                matched.push("temporal".to_string());
            }
            if rule.relational && relational {
                score += RELATIONAL_WEIGHT;
                matched.push("relational".to_string());
            }
            if rule.long_form && long_form {
                score += SHAPE_WEIGHT;
                matched.push("shape:long_form".to_string());
            }

            RuleScore {
                category: rule.category,
                score: score.clamp(0.0, 1.0),
                matched,
            }
        })
        .collect()
}

fn loose_keyword_scores(lowered: &str) -> Vec<RuleScore> {
    RULES
        .iter()
        .map(|rule| {
            let matched: Vec<String> = rule
                .keywords
                .iter()
                .filter(|k| lowered.contains(**k))
                .map(|k| format!("substring:{k}"))
                .collect();
            #[allow(clippy::cast_precision_loss)]
            let score = (matched.len() as f32 * LOOSE_KEYWORD_WEIGHT).min(1.0);
            RuleScore {
                category: rule.category,
                score,
                matched,
            }
        })
        .collect()
}

fn apply_operation_bias(
    scores: &mut [RuleScore],
    hints: &ContextHints,
    operation: Option<Operation>,
) {
    if let Some(word) = hints.str("operation").map(|w| w.trim().to_lowercase()) {
        let boosts = OPERATION_HINTS
            .iter()
            .find(|(words, _)| words.contains(&word.as_str()))
            .map_or(&[][..], |(_, boosts)| *boosts);
        for (category, boost) in boosts {
            if let Some(entry) = scores.iter_mut().find(|s| s.category == *category) {
                entry.score = (entry.score + boost).min(1.0);
                entry.matched.push(format!("operation:{word}"));
            }
        }
    }

    if let Some(operation) = operation {
        for entry in scores.iter_mut() {
            if entry.score > 0.0 && entry.category.is_write() == operation.is_write() {
                entry.score = (entry.score + OPERATION_NUDGE).min(1.0);
            }
        }
    }
}

/// Highest score, first-declared category on ties
fn pick_best(scores: Vec<RuleScore>) -> Option<RuleScore> {
    scores.into_iter().fold(None, |best, candidate| match best {
        Some(b) if b.score >= candidate.score => Some(b),
        _ => Some(candidate),
    })
}

fn hint_override(hints: &ContextHints) -> Option<(IntentCategory, &'static str)> {
    if let Some(category) = hints.str("intent").and_then(IntentCategory::parse) {
        return Some((category, "intent"));
    }
    FLAG_OVERRIDES
        .iter()
        .find(|(key, _)| hints.flag(key))
        .map(|(key, category)| (*category, *key))
}

fn hint_entity_kinds(hints: &ContextHints) -> Vec<EntityKind> {
    hints
        .get("entity_types")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .filter_map(EntityKind::parse)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classify(text: &str) -> IntentResult {
        IntentClassifier::default().classify(text, &ContextHints::new())
    }

    #[test]
    fn test_relationship_query() {
        let result = classify("Find relationships between the user and the project");
        assert_eq!(result.category, IntentCategory::QueryRelation);
        assert!(result.confidence >= 0.75);
        assert!(result
            .matched_patterns
            .contains(&"keyword:relationships".to_string()));
        assert!(result.matched_patterns.contains(&"relational".to_string()));
    }

    #[test]
    fn test_documentation_request() {
        let result = classify("Create comprehensive documentation for the API");
        assert_eq!(result.category, IntentCategory::WriteDoc);
        assert!(result.confidence >= 0.6);
    }

    #[test]
    fn test_context_recall() {
        let result = classify("Remember what we discussed yesterday");
        assert_eq!(result.category, IntentCategory::ContextRetrieval);
        assert!((result.confidence - 1.0).abs() < f32::EPSILON);
        assert!(result.matched_patterns.contains(&"temporal".to_string()));
    }

    #[test]
    fn test_ties_go_to_first_declared_category() {
        let result = classify("sync compare");
        assert_eq!(result.category, IntentCategory::SyncData);
        assert!((result.confidence - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_empty_and_gibberish_are_unknown() {
        for text in ["", "   ", "qwzx plorb", "!!!"] {
            let result = classify(text);
            assert_eq!(result.category, IntentCategory::Unknown, "text: {text:?}");
            assert!(result.confidence.abs() < f32::EPSILON);
            assert!(result.matched_patterns.is_empty());
        }
    }

    #[test]
    fn test_keyword_pass_rescues_low_confidence() {
        // "reconnection" is not a whole-word keyword but contains "connect"
        let result = classify("reconnection");
        assert_eq!(result.category, IntentCategory::CreateRelation);
        assert!((result.confidence - 0.1).abs() < 1e-6);
        assert_eq!(result.matched_patterns, vec!["substring:connect".to_string()]);
    }

    #[test]
    fn test_explicit_intent_hint_wins() {
        let hints = ContextHints::new().with("intent", json!("traverse_graph"));
        let result = IntentClassifier::default()
            .classify("Remember what we discussed yesterday", &hints);
        assert_eq!(result.category, IntentCategory::TraverseGraph);
        assert!((result.confidence - 0.9).abs() < 1e-6);
        assert_eq!(result.matched_patterns.last().unwrap(), "hint:intent");
    }

    #[test]
    fn test_flag_hint_precedence() {
        let hints = ContextHints::new()
            .with("is_temporary", json!(true))
            .with("needs_persistence", json!(true));
        let result = IntentClassifier::default().classify("anything", &hints);
        assert_eq!(result.category, IntentCategory::WriteDoc);

        let hints = ContextHints::new().with("is_relational", json!(true));
        let result = IntentClassifier::default().classify("anything", &hints);
        assert_eq!(result.category, IntentCategory::CreateRelation);
    }

    #[test]
    fn test_invalid_intent_hint_is_ignored() {
        let hints = ContextHints::new().with("intent", json!("teleport"));
        let result = IntentClassifier::default().classify("sync compare", &hints);
        assert_eq!(result.category, IntentCategory::SyncData);
    }

    #[test]
    fn test_markdown_shape_counts_toward_write_doc() {
        let text = "# Release notes\n\n- faster startup\n- fewer crashes";
        let result = classify(text);
        assert_eq!(result.category, IntentCategory::WriteDoc);
        assert!(result.matched_patterns.contains(&"shape:long_form".to_string()));
    }

    #[test]
    fn test_entity_kinds_add_evidence() {
        let classifier = IntentClassifier::default();
        let hints = ContextHints::new();
        let without = classifier.classify("link", &hints);
        let kinds: BTreeSet<EntityKind> = [EntityKind::Relationship, EntityKind::Person].into();
        let with = classifier.classify_with_entities("link", &hints, &kinds);
        assert_eq!(with.category, IntentCategory::CreateRelation);
        assert!(with.confidence > without.confidence);
    }

    #[test]
    fn test_confidence_is_always_in_range() {
        let texts = [
            "connect link associate relate tie establish between connected linked",
            "Find relationships between the user and the project",
            "x",
        ];
        for text in texts {
            let result = classify(text);
            assert!((0.0..=1.0).contains(&result.confidence));
        }
    }

    #[test]
    fn test_operation_hint_adds_evidence() {
        let classifier = IntentClassifier::default();
        let no_kinds = BTreeSet::new();

        let hints = ContextHints::new().with("operation", json!("Search"));
        let result = classifier.classify_with_entities("qwzx plorb", &hints, &no_kinds);
        assert_eq!(result.category, IntentCategory::SemanticSearch);
        assert!((result.confidence - 0.7).abs() < 1e-6);
        assert_eq!(result.matched_patterns, vec!["operation:search".to_string()]);

        let hints = ContextHints::new().with("operation", json!("recall"));
        let result = classifier.classify_with_entities("qwzx plorb", &hints, &no_kinds);
        assert_eq!(result.category, IntentCategory::ContextRetrieval);

        let hints = ContextHints::new().with("operation", json!("save"));
        let result = classifier.classify_with_entities("qwzx plorb", &hints, &no_kinds);
        assert_eq!(result.category, IntentCategory::WriteDoc);

        let hints = ContextHints::new().with("operation", json!("juggle"));
        let result = classifier.classify_with_entities("qwzx plorb", &hints, &no_kinds);
        assert!(result.is_unknown());
    }

    #[test]
    fn test_request_operation_settles_exact_ties() {
        let classifier = IntentClassifier::default();
        let hints = ContextHints::new();
        let no_kinds = BTreeSet::new();

        // "read" and "update" are one keyword each
        let plain = classifier.classify_with_entities("read update", &hints, &no_kinds);
        assert_eq!(plain.category, IntentCategory::ReadDoc);

        let store =
            classifier.classify_for_operation(Operation::Store, "read update", &hints, &no_kinds);
        assert_eq!(store.category, IntentCategory::UpdateDoc);

        let retrieve =
            classifier.classify_for_operation(Operation::Retrieve, "read update", &hints, &no_kinds);
        assert_eq!(retrieve.category, IntentCategory::ReadDoc);
    }

    #[test]
    fn test_request_operation_alone_is_not_evidence() {
        let classifier = IntentClassifier::default();
        for operation in [Operation::Store, Operation::Retrieve] {
            let result = classifier.classify_for_operation(
                operation,
                "qwzx plorb",
                &ContextHints::new(),
                &BTreeSet::new(),
            );
            assert!(result.is_unknown());
        }
    }

    #[test]
    fn test_floor_is_configurable() {
        let strict = IntentClassifier::new(0.9);
        assert!((strict.confidence_floor() - 0.9).abs() < f32::EPSILON);

        // One keyword clears the default floor but not a strict one
        let result = strict.classify("sync compare", &ContextHints::new());
        assert_eq!(result.category, IntentCategory::SyncData);
        assert!(result.confidence < strict.confidence_floor());
    }

    #[test]
    fn test_category_names() {
        for category in IntentCategory::ALL {
            assert_eq!(IntentCategory::parse(category.as_str()), Some(category));
        }
        assert!(IntentCategory::ComprehensiveStore.is_multi_system());
        assert!(!IntentCategory::WriteDoc.is_multi_system());
        assert!(IntentCategory::UpdateDoc.is_write());
        assert!(!IntentCategory::ReadDoc.is_write());
        assert!(!IntentCategory::Unknown.is_write());
    }
}
