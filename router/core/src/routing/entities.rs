//! Entity Extraction
//!
//! Pulls structured entity mentions out of free-form request text. The
//! extractor is pure: the same text always yields the same [`EntitySet`],
//! in the same order.
//!
//! # Matching
//!
//! ```text
//! "Link @dana to the Q3 report.md"
//!   vocabulary (whole word)  -> Relationship("link"), Document("report")
//!   @handle                  -> Person("@dana")
//!   file name                -> Document("report.md")
//! ```
//!
//! Vocabulary matching is whole-word and case-insensitive. Aliases collapse
//! to one canonical surface form, so "Users" and "user" are the same entity.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// ============================================================================
// Entity Kinds
// ============================================================================

/// Kind of an extracted entity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A person or user
    Person,
    /// A project or task
    Project,
    /// A document, note or file
    Document,
    /// An abstract idea or topic
    Concept,
    /// A team, company or organization
    Organization,
    /// Relationship language ("connection", "link")
    Relationship,
    /// A conversation or discussion
    Conversation,
    /// Memory language ("remember", "memories")
    Memory,
}

impl EntityKind {
    /// All kinds in declaration order
    pub const ALL: [EntityKind; 8] = [
        Self::Person,
        Self::Project,
        Self::Document,
        Self::Concept,
        Self::Organization,
        Self::Relationship,
        Self::Conversation,
        Self::Memory,
    ];

    /// Stable snake_case name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Project => "project",
            Self::Document => "document",
            Self::Concept => "concept",
            Self::Organization => "organization",
            Self::Relationship => "relationship",
            Self::Conversation => "conversation",
            Self::Memory => "memory",
        }
    }

    /// Parse a kind from its snake_case name
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Entities
// ============================================================================

/// One extracted entity mention
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity kind
    pub kind: EntityKind,
    /// Normalized surface text
    pub surface_text: String,
    /// Byte offsets `(start, end)` of the first occurrence in the input
    pub span: (usize, usize),
}

/// Deduplicated set of entities
///
/// Unique by `(kind, surface_text)`, iterated by kind declaration order and
/// then surface text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntitySet {
    entities: Vec<Entity>,
}

impl EntitySet {
    /// Build a set from raw mentions, keeping the first span of each entity
    fn from_mentions(mentions: Vec<Entity>) -> Self {
        let mut unique: BTreeMap<(EntityKind, String), (usize, usize)> = BTreeMap::new();
        for mention in mentions {
            let slot = unique
                .entry((mention.kind, mention.surface_text))
                .or_insert(mention.span);
            if mention.span.0 < slot.0 {
                *slot = mention.span;
            }
        }

        let entities = unique
            .into_iter()
            .map(|((kind, surface_text), span)| Entity {
                kind,
                surface_text,
                span,
            })
            .collect();
        Self { entities }
    }

    /// Iterate entities in deterministic order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Number of distinct entities
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether nothing was extracted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Distinct kinds present
    #[must_use]
    pub fn kinds(&self) -> BTreeSet<EntityKind> {
        self.entities.iter().map(|e| e.kind).collect()
    }

    /// Whether any entity of `kind` was found
    #[must_use]
    pub fn contains_kind(&self, kind: EntityKind) -> bool {
        self.entities.iter().any(|e| e.kind == kind)
    }

    /// Whether a specific entity was found
    #[must_use]
    pub fn contains(&self, kind: EntityKind, surface_text: &str) -> bool {
        self.entities
            .iter()
            .any(|e| e.kind == kind && e.surface_text == surface_text)
    }
}

impl EntitySet {
    /// Add entities not already present; existing spans are kept
    pub fn merge(&mut self, other: EntitySet) {
        for entity in other.entities {
            if !self.contains(entity.kind, &entity.surface_text) {
                self.entities.push(entity);
            }
        }
        self.entities
            .sort_by(|a, b| (a.kind, &a.surface_text).cmp(&(b.kind, &b.surface_text)));
    }
}

impl FromIterator<Entity> for EntitySet {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        Self::from_mentions(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a EntitySet {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

// ============================================================================
// Vocabulary
// ============================================================================

/// `(kind, alias, canonical surface)`
const VOCABULARY: &[(EntityKind, &str, &str)] = &[
    (EntityKind::Person, "user", "user"),
    (EntityKind::Person, "users", "user"),
    (EntityKind::Person, "person", "person"),
    (EntityKind::Person, "people", "person"),
    (EntityKind::Person, "me", "me"),
    (EntityKind::Person, "myself", "me"),
    (EntityKind::Person, "member", "member"),
    (EntityKind::Person, "members", "member"),
    (EntityKind::Organization, "team", "team"),
    (EntityKind::Organization, "teams", "team"),
    (EntityKind::Organization, "company", "company"),
    (EntityKind::Organization, "companies", "company"),
    (EntityKind::Organization, "organization", "organization"),
    (EntityKind::Organization, "organizations", "organization"),
    (EntityKind::Project, "project", "project"),
    (EntityKind::Project, "projects", "project"),
    (EntityKind::Project, "task", "task"),
    (EntityKind::Project, "tasks", "task"),
    (EntityKind::Project, "assignment", "assignment"),
    (EntityKind::Project, "assignments", "assignment"),
    (EntityKind::Document, "document", "document"),
    (EntityKind::Document, "documents", "document"),
    (EntityKind::Document, "doc", "document"),
    (EntityKind::Document, "docs", "document"),
    (EntityKind::Document, "documentation", "documentation"),
    (EntityKind::Document, "file", "file"),
    (EntityKind::Document, "files", "file"),
    (EntityKind::Document, "note", "note"),
    (EntityKind::Document, "notes", "note"),
    (EntityKind::Document, "report", "report"),
    (EntityKind::Document, "reports", "report"),
    (EntityKind::Concept, "concept", "concept"),
    (EntityKind::Concept, "concepts", "concept"),
    (EntityKind::Concept, "idea", "idea"),
    (EntityKind::Concept, "ideas", "idea"),
    (EntityKind::Concept, "notion", "notion"),
    (EntityKind::Concept, "topic", "topic"),
    (EntityKind::Concept, "topics", "topic"),
    (EntityKind::Relationship, "relationship", "relationship"),
    (EntityKind::Relationship, "relationships", "relationship"),
    (EntityKind::Relationship, "connection", "connection"),
    (EntityKind::Relationship, "connections", "connection"),
    (EntityKind::Relationship, "link", "link"),
    (EntityKind::Relationship, "links", "link"),
    (EntityKind::Conversation, "conversation", "conversation"),
    (EntityKind::Conversation, "conversations", "conversation"),
    (EntityKind::Conversation, "chat", "chat"),
    (EntityKind::Conversation, "discussion", "discussion"),
    (EntityKind::Conversation, "discussed", "discussion"),
    (EntityKind::Memory, "memory", "memory"),
    (EntityKind::Memory, "memories", "memory"),
    (EntityKind::Memory, "remember", "memory"),
    (EntityKind::Memory, "recall", "memory"),
];

static VOCABULARY_INDEX: Lazy<HashMap<&'static str, Vec<(EntityKind, &'static str)>>> =
    Lazy::new(|| {
        let mut index: HashMap<&'static str, Vec<(EntityKind, &'static str)>> = HashMap::new();
        for (kind, alias, canonical) in VOCABULARY {
            index.entry(*alias).or_default().push((*kind, *canonical));
        }
        index
    });

static WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z0-9]*").expect("word pattern is valid"));

static HANDLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\B@[A-Za-z0-9_]+").expect("handle pattern is valid"));

static FILE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b[A-Za-z0-9_-]+(?:\.[A-Za-z0-9_-]+)*\.(?:md|txt|pdf|doc)\b")
        .expect("file name pattern is valid")
});

// ============================================================================
// Extractor
// ============================================================================

/// Vocabulary and shape based entity extractor
#[derive(Clone, Copy, Debug, Default)]
pub struct EntityExtractor;

impl EntityExtractor {
    /// Create an extractor
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Extract entities from text
    #[must_use]
    pub fn extract(&self, text: &str) -> EntitySet {
        let mut mentions = Vec::new();

        for word in WORD.find_iter(text) {
            let lowered = word.as_str().to_lowercase();
            if let Some(hits) = VOCABULARY_INDEX.get(lowered.as_str()) {
                for (kind, canonical) in hits {
                    mentions.push(Entity {
                        kind: *kind,
                        surface_text: (*canonical).to_string(),
                        span: (word.start(), word.end()),
                    });
                }
            }
        }

        for handle in HANDLE.find_iter(text) {
            mentions.push(Entity {
                kind: EntityKind::Person,
                surface_text: handle.as_str().to_lowercase(),
                span: (handle.start(), handle.end()),
            });
        }

        for file in FILE_NAME.find_iter(text) {
            mentions.push(Entity {
                kind: EntityKind::Document,
                surface_text: file.as_str().to_lowercase(),
                span: (file.start(), file.end()),
            });
        }

        EntitySet::from_mentions(mentions)
    }
}
