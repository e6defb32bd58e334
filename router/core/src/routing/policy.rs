//! Routing Policy
//!
//! Turns a request into a ranked routing decision based on:
//! - Intent classification
//! - Extracted entities
//! - Historical backend performance
//! - Backend availability (enabled and registered)
//!
//! # Routing Decision Flow
//!
//! ```text
//! 1. Extract entities from the request text, merge hinted entities
//! 2. Classify intent (entities, hints and the operation contribute)
//! 3. Score every available backend
//!      intent_affinity * w_intent + entity_affinity * w_entity
//!    + success_rate * w_perf - latency_penalty * w_latency
//!    + context_adjustment * w_context
//! 4. Rank: score descending, ties by Graph > Document > SemanticMemory
//! 5. Decide multi-system fan-out (coordinated category or near-tie)
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::config::RouterConfig;
use super::entities::{Entity, EntityExtractor, EntityKind, EntitySet};
use super::intent::{IntentCategory, IntentClassifier, IntentResult};
use super::metrics::PerformanceTracker;
use crate::backend::{BackendId, Operation};
use crate::error::RouterError;

/// Absorbs float noise when comparing score gaps against the epsilon
const SCORE_TOLERANCE: f32 = 1e-6;

// ============================================================================
// Context Hints
// ============================================================================

/// Caller-supplied routing hints
///
/// Recognized keys: `intent`, `needs_persistence`, `is_relational`,
/// `is_temporary`, `entity_types`, `entities`, `operation`, `urgency`,
/// `content_length`. Unknown keys are carried but ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextHints(Map<String, Value>);

impl ContextHints {
    /// Empty hints
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hint (builder style)
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Set a hint
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Raw hint value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Boolean hint; `true` or `"true"` count as set
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// String hint
    #[must_use]
    pub fn str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Entities supplied under `entities`
    ///
    /// Items are either a kind name (`"person"`) or an object with a
    /// `kind`/`type` and an optional `text`/`name`. Unrecognized kinds are
    /// skipped. Hinted entities carry an empty span.
    #[must_use]
    pub fn entities(&self) -> EntitySet {
        let Some(items) = self.0.get("entities").and_then(Value::as_array) else {
            return EntitySet::default();
        };
        items.iter().filter_map(hinted_entity).collect()
    }

    /// Number of hints
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no hints were given
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn hinted_entity(item: &Value) -> Option<Entity> {
    let (kind, text) = match item {
        Value::String(kind) => (kind.as_str(), None),
        Value::Object(fields) => {
            let kind = fields
                .get("kind")
                .or_else(|| fields.get("type"))
                .and_then(Value::as_str)?;
            let text = fields
                .get("text")
                .or_else(|| fields.get("name"))
                .and_then(Value::as_str);
            (kind, text)
        }
        _ => return None,
    };
    let kind = EntityKind::parse(kind)?;
    let surface_text = text
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| kind.as_str().to_string());
    Some(Entity {
        kind,
        surface_text,
        span: (0, 0),
    })
}

impl From<Map<String, Value>> for ContextHints {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// ============================================================================
// Routing Request
// ============================================================================

/// A request to be routed
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoutingRequest {
    /// Unique request ID
    pub request_id: String,
    /// Store or retrieve
    pub operation: Operation,
    /// Free-form request text
    pub content: String,
    /// Caller hints
    pub context_hints: ContextHints,
}

impl RoutingRequest {
    /// Create a request with a fresh id and no hints
    pub fn new(operation: Operation, content: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            operation,
            content: content.into(),
            context_hints: ContextHints::new(),
        }
    }

    /// Replace all hints
    #[must_use]
    pub fn with_hints(mut self, hints: ContextHints) -> Self {
        self.context_hints = hints;
        self
    }

    /// Add one hint
    #[must_use]
    pub fn with_hint(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context_hints.insert(key, value);
        self
    }

    /// Use a caller-chosen request id
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }
}

// ============================================================================
// Routing Decision
// ============================================================================

/// Score of one backend with its contributing factors
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackendScore {
    /// Backend
    pub backend: BackendId,
    /// Composite score
    pub score: f32,
    /// `intent`, `entity`, `performance`, `latency_penalty`, `context`
    pub factors: BTreeMap<String, f32>,
}

/// The result of routing one request
#[derive(Clone, Debug, Serialize)]
pub struct RoutingDecision {
    /// Request ID
    pub request_id: String,
    /// Requested operation
    pub operation: Operation,
    /// Backend tried first
    pub primary: BackendId,
    /// Remaining backends, best first
    pub fallback_order: Vec<BackendId>,
    /// Backends involved alongside the primary in multi-system execution
    pub secondaries: Vec<BackendId>,
    /// Whether several backends are used
    pub is_multi_system: bool,
    /// Scores of every available backend, ranked
    pub scores: Vec<BackendScore>,
    /// Intent classification
    pub intent: IntentResult,
    /// Extracted entities
    pub entities: EntitySet,
    /// Human-readable reason trail
    pub reasons: Vec<String>,
}

impl RoutingDecision {
    /// Primary followed by the fallback order
    #[must_use]
    pub fn candidates(&self) -> Vec<BackendId> {
        std::iter::once(self.primary)
            .chain(self.fallback_order.iter().copied())
            .collect()
    }

    /// Score of a backend, if it was scored
    #[must_use]
    pub fn score_of(&self, backend: BackendId) -> Option<f32> {
        self.scores
            .iter()
            .find(|s| s.backend == backend)
            .map(|s| s.score)
    }
}

// ============================================================================
// Affinity Tables
// ============================================================================

/// How well a backend suits an intent category
#[must_use]
pub fn intent_affinity(category: IntentCategory, backend: BackendId) -> f32 {
    use BackendId::{Document, Graph, SemanticMemory};
    use IntentCategory as C;

    match (category, backend) {
        (C::CreateRelation | C::QueryRelation, Graph) => 1.0,
        (C::CreateRelation | C::QueryRelation, Document) => 0.1,
        (C::CreateRelation | C::QueryRelation, SemanticMemory) => 0.4,

        (C::TraverseGraph, Graph) => 1.0,
        (C::TraverseGraph, Document | SemanticMemory) => 0.1,

        (C::WriteDoc | C::ReadDoc, Graph) => 0.1,
        (C::WriteDoc | C::ReadDoc, Document) => 1.0,
        (C::WriteDoc | C::ReadDoc, SemanticMemory) => 0.4,

        (C::UpdateDoc, Document) => 1.0,
        (C::UpdateDoc, Graph | SemanticMemory) => 0.1,

        (C::SemanticSearch, Graph) => 0.4,
        (C::SemanticSearch, Document) => 0.2,
        (C::SemanticSearch, SemanticMemory) => 1.0,

        (C::ContextRetrieval, Graph) => 0.1,
        (C::ContextRetrieval, Document) => 0.2,
        (C::ContextRetrieval, SemanticMemory) => 1.0,

        (C::MemoryLookup, Graph) => 0.1,
        (C::MemoryLookup, Document) => 0.4,
        (C::MemoryLookup, SemanticMemory) => 1.0,

        (C::SyncData | C::CrossReference | C::ComprehensiveStore, Graph) => 1.0,
        (C::SyncData | C::CrossReference | C::ComprehensiveStore, Document) => 0.6,
        (C::SyncData | C::CrossReference | C::ComprehensiveStore, SemanticMemory) => 0.8,

        (C::Unknown, Graph | Document) => 0.3,
        (C::Unknown, SemanticMemory) => 1.0,
    }
}

fn entity_weight(kind: EntityKind, backend: BackendId) -> f32 {
    use BackendId::{Document, Graph, SemanticMemory};
    use EntityKind as K;

    match (backend, kind) {
        (Graph, K::Relationship) => 0.5,
        (Graph, K::Person | K::Organization) => 0.2,
        (Graph | Document, K::Project) => 0.1,
        (Document, K::Document) => 0.5,
        (Document, K::Concept) => 0.2,
        (SemanticMemory, K::Conversation | K::Memory) => 0.5,
        _ => 0.0,
    }
}

/// Content above this many bytes leans toward the document store
const LONG_CONTENT_BYTES: f64 = 1000.0;

/// Content below this many bytes leans toward the semantic store
const SHORT_CONTENT_BYTES: f64 = 100.0;

/// Signed adjustment from `urgency` and `content_length` hints
///
/// Each matching hint multiplies a per-backend factor; the result is the
/// factor minus one, so no hints means `0.0`.
#[must_use]
pub fn context_adjustment(hints: &ContextHints, backend: BackendId) -> f32 {
    use BackendId::{Document, Graph, SemanticMemory};

    let mut factor = 1.0_f32;
    if let Some(length) = hints.get("content_length").and_then(Value::as_f64) {
        if length > LONG_CONTENT_BYTES {
            factor *= match backend {
                Document => 1.2,
                SemanticMemory => 0.9,
                Graph => 1.0,
            };
        } else if length < SHORT_CONTENT_BYTES && backend == SemanticMemory {
            factor *= 1.1;
        }
    }
    if hints
        .str("urgency")
        .is_some_and(|u| u.trim().eq_ignore_ascii_case("high"))
    {
        factor *= match backend {
            SemanticMemory => 1.2,
            Graph => 0.9,
            Document => 1.0,
        };
    }
    factor - 1.0
}

/// How well a backend suits the extracted entities, in `[0, 1]`
#[must_use]
pub fn entity_affinity(entities: &EntitySet, backend: BackendId) -> f32 {
    entities
        .kinds()
        .into_iter()
        .map(|kind| entity_weight(kind, backend))
        .sum::<f32>()
        .min(1.0)
}

// ============================================================================
// Routing Engine
// ============================================================================

/// Scores backends and produces routing decisions
pub struct RoutingEngine {
    config: RouterConfig,
    classifier: IntentClassifier,
    extractor: EntityExtractor,
    tracker: Arc<PerformanceTracker>,
    available: Vec<BackendId>,
}

impl RoutingEngine {
    /// Create an engine over the given available backends
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::NoBackendsAvailable`] when `available` is empty.
    pub fn new(
        config: RouterConfig,
        tracker: Arc<PerformanceTracker>,
        available: Vec<BackendId>,
    ) -> Result<Self, RouterError> {
        let mut available: Vec<BackendId> = available
            .into_iter()
            .filter(|b| config.backends.get(*b).enabled)
            .collect();
        available.sort();
        available.dedup();

        if available.is_empty() {
            return Err(RouterError::NoBackendsAvailable);
        }

        Ok(Self {
            classifier: IntentClassifier::new(config.confidence_floor),
            extractor: EntityExtractor::new(),
            config,
            tracker,
            available,
        })
    }

    /// Backends this engine may route to, in priority order
    #[must_use]
    pub fn available_backends(&self) -> &[BackendId] {
        &self.available
    }

    /// Score one backend
    #[must_use]
    pub fn score_backend(
        &self,
        backend: BackendId,
        category: IntentCategory,
        entities: &EntitySet,
        hints: &ContextHints,
    ) -> BackendScore {
        let weights = &self.config.weights;
        let metrics = self.tracker.metrics_for(backend);

        let intent = intent_affinity(category, backend);
        let entity = entity_affinity(entities, backend);
        let context = context_adjustment(hints, backend);
        #[allow(clippy::cast_possible_truncation)]
        let performance = metrics.success_rate as f32;
        #[allow(clippy::cast_possible_truncation)]
        let latency_penalty =
            (metrics.avg_latency_ms / self.config.latency_ceiling_ms).clamp(0.0, 1.0) as f32;

        let score = intent * weights.intent + entity * weights.entity
            + performance * weights.performance
            - latency_penalty * weights.latency
            + context * weights.context;

        let factors = BTreeMap::from([
            ("intent".to_string(), intent),
            ("entity".to_string(), entity),
            ("performance".to_string(), performance),
            ("latency_penalty".to_string(), latency_penalty),
            ("context".to_string(), context),
        ]);

        BackendScore {
            backend,
            score,
            factors,
        }
    }

    /// Route a request
    #[must_use]
    pub fn route(&self, request: &RoutingRequest) -> RoutingDecision {
        let hints = &request.context_hints;
        let mut entities = self.extractor.extract(&request.content);
        entities.merge(hints.entities());
        let intent = self.classifier.classify_for_operation(
            request.operation,
            &request.content,
            hints,
            &entities.kinds(),
        );

        let mut scores: Vec<BackendScore> = self
            .available
            .iter()
            .map(|b| self.score_backend(*b, intent.category, &entities, hints))
            .collect();
        scores.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.backend.priority().cmp(&b.backend.priority()))
        });

        for s in &scores {
            debug!(
                request_id = %request.request_id,
                backend = %s.backend,
                score = s.score,
                "Scored backend"
            );
        }

        let primary = scores[0].backend;
        let fallback_order: Vec<BackendId> = scores.iter().skip(1).map(|s| s.backend).collect();

        let mut reasons = vec![
            format!(
                "intent {} at confidence {:.2}",
                intent.category, intent.confidence
            ),
            format!("primary {} scored {:.3}", primary, scores[0].score),
        ];
        if !entities.is_empty() {
            let kinds: Vec<&str> = entities.kinds().into_iter().map(EntityKind::as_str).collect();
            reasons.push(format!("entities: {}", kinds.join(", ")));
        }
        for backend in BackendId::ALL {
            if !self.available.contains(&backend) {
                reasons.push(format!("{backend} not available"));
            }
        }

        let secondaries = if fallback_order.is_empty() {
            Vec::new()
        } else if intent.category.is_multi_system() {
            reasons.push(format!(
                "{} coordinates every available backend",
                intent.category
            ));
            fallback_order.clone()
        } else if scores[0].score - scores[1].score <= self.config.ambiguity_epsilon + SCORE_TOLERANCE
        {
            reasons.push(format!(
                "ambiguous: {} and {} within {:.2}",
                primary, scores[1].backend, self.config.ambiguity_epsilon
            ));
            vec![scores[1].backend]
        } else {
            Vec::new()
        };
        let is_multi_system = !secondaries.is_empty();

        info!(
            request_id = %request.request_id,
            operation = %request.operation,
            intent = %intent.category,
            confidence = intent.confidence,
            primary = %primary,
            multi_system = is_multi_system,
            "Routing decision"
        );

        RoutingDecision {
            request_id: request.request_id.clone(),
            operation: request.operation,
            primary,
            fallback_order,
            secondaries,
            is_multi_system,
            scores,
            intent,
            entities,
            reasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn engine(config: RouterConfig) -> RoutingEngine {
        RoutingEngine::new(
            config,
            Arc::new(PerformanceTracker::default()),
            BackendId::ALL.to_vec(),
        )
        .unwrap()
    }

    fn retrieve(text: &str) -> RoutingRequest {
        RoutingRequest::new(Operation::Retrieve, text)
    }

    #[test]
    fn test_relationship_query_routes_to_graph() {
        let decision = engine(RouterConfig::default())
            .route(&retrieve("Find relationships between the user and the project"));
        assert_eq!(decision.intent.category, IntentCategory::QueryRelation);
        assert_eq!(decision.primary, BackendId::Graph);
        assert!(!decision.is_multi_system);
        assert_eq!(decision.fallback_order.len(), 2);
    }

    #[test]
    fn test_documentation_routes_to_document() {
        let decision = engine(RouterConfig::default())
            .route(&retrieve("Create comprehensive documentation for the API"));
        assert_eq!(decision.primary, BackendId::Document);
    }

    #[test]
    fn test_recall_routes_to_semantic_memory() {
        let decision =
            engine(RouterConfig::default()).route(&retrieve("Remember what we discussed yesterday"));
        assert_eq!(decision.primary, BackendId::SemanticMemory);
    }

    #[test]
    fn test_unknown_defaults_to_semantic_memory_with_priority_tiebreak() {
        let decision = engine(RouterConfig::default()).route(&retrieve("qwzx plorb"));
        assert_eq!(decision.intent.category, IntentCategory::Unknown);
        assert_eq!(decision.primary, BackendId::SemanticMemory);
        // Graph and Document tie; Graph ranks first
        assert_eq!(
            decision.fallback_order,
            vec![BackendId::Graph, BackendId::Document]
        );
    }

    #[test]
    fn test_exact_tie_prefers_canonical_priority_and_is_ambiguous() {
        let config = RouterConfig::default().with_backend_disabled(BackendId::SemanticMemory);
        let decision = engine(config).route(&retrieve("qwzx plorb"));
        assert_eq!(decision.primary, BackendId::Graph);
        assert_eq!(decision.fallback_order, vec![BackendId::Document]);
        assert!(decision.is_multi_system);
        assert_eq!(decision.secondaries, vec![BackendId::Document]);
    }

    #[test]
    fn test_disabled_backend_never_appears() {
        let config = RouterConfig::default().with_backend_disabled(BackendId::Graph);
        let decision = engine(config)
            .route(&retrieve("Find relationships between the user and the project"));
        assert_ne!(decision.primary, BackendId::Graph);
        assert!(!decision.fallback_order.contains(&BackendId::Graph));
        assert!(decision.score_of(BackendId::Graph).is_none());
    }

    #[test]
    fn test_fallback_order_invariants() {
        let engine = engine(RouterConfig::default());
        for text in [
            "Find relationships between the user and the project",
            "sync everything across systems",
            "",
            "update the notes",
        ] {
            let decision = engine.route(&retrieve(text));
            assert!(!decision.fallback_order.contains(&decision.primary));
            let mut sorted = decision.fallback_order.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), decision.fallback_order.len());
            if decision.is_multi_system {
                assert!(!decision.secondaries.is_empty());
                assert!(decision
                    .secondaries
                    .iter()
                    .all(|s| decision.fallback_order.contains(s)));
            }
        }
    }

    #[test]
    fn test_coordinated_category_uses_every_fallback() {
        let request = retrieve("keep it").with_hint("intent", json!("sync_data"));
        let decision = engine(RouterConfig::default()).route(&request);
        assert_eq!(decision.primary, BackendId::Graph);
        assert!(decision.is_multi_system);
        assert_eq!(decision.secondaries, decision.fallback_order);
    }

    #[test]
    fn test_routing_is_deterministic_for_unchanged_tracker() {
        let engine = engine(RouterConfig::default());
        let request = retrieve("Remember what we discussed yesterday");
        let first = engine.route(&request);
        let second = engine.route(&request);
        assert_eq!(first.primary, second.primary);
        assert_eq!(first.fallback_order, second.fallback_order);
        assert_eq!(first.scores, second.scores);
    }

    #[test]
    fn test_performance_history_lowers_scores() {
        let tracker = Arc::new(PerformanceTracker::default());
        let engine =
            RoutingEngine::new(RouterConfig::default(), Arc::clone(&tracker), BackendId::ALL.to_vec())
                .unwrap();
        let request = retrieve("Remember what we discussed yesterday");
        let before = engine.route(&request).score_of(BackendId::SemanticMemory).unwrap();

        for _ in 0..10 {
            tracker.record(BackendId::SemanticMemory, false, 2000);
        }
        let after = engine.route(&request).score_of(BackendId::SemanticMemory).unwrap();
        assert!(after < before);
    }

    #[test]
    fn test_no_available_backends_is_an_error() {
        let result = RoutingEngine::new(
            RouterConfig::default(),
            Arc::new(PerformanceTracker::default()),
            Vec::new(),
        );
        assert!(matches!(result, Err(RouterError::NoBackendsAvailable)));
    }

    #[test]
    fn test_score_factors_are_reported() {
        let decision = engine(RouterConfig::default()).route(&retrieve("update the notes"));
        let top = &decision.scores[0];
        for key in ["intent", "entity", "performance", "latency_penalty", "context"] {
            assert!(top.factors.contains_key(key), "missing factor {key}");
        }
    }

    #[test]
    fn test_engine_classifies_with_configured_floor() {
        let mut config = RouterConfig::default();
        config.confidence_floor = 0.9;
        let decision = engine(config).route(&retrieve("sync compare"));
        assert!(decision.intent.confidence < 0.9);
        assert_eq!(decision.intent.category, IntentCategory::SyncData);
    }

    #[test]
    fn test_context_adjustment_values() {
        let none = ContextHints::new();
        for backend in BackendId::ALL {
            assert!(context_adjustment(&none, backend).abs() < f32::EPSILON);
        }

        let long = ContextHints::new().with("content_length", json!(5000));
        assert!((context_adjustment(&long, BackendId::Document) - 0.2).abs() < 1e-6);
        assert!((context_adjustment(&long, BackendId::SemanticMemory) + 0.1).abs() < 1e-6);
        assert!(context_adjustment(&long, BackendId::Graph).abs() < 1e-6);

        let short = ContextHints::new().with("content_length", json!(40));
        assert!((context_adjustment(&short, BackendId::SemanticMemory) - 0.1).abs() < 1e-6);
        assert!(context_adjustment(&short, BackendId::Document).abs() < 1e-6);

        let urgent = ContextHints::new().with("urgency", json!("HIGH"));
        assert!((context_adjustment(&urgent, BackendId::SemanticMemory) - 0.2).abs() < 1e-6);
        assert!((context_adjustment(&urgent, BackendId::Graph) + 0.1).abs() < 1e-6);

        let both = urgent.with("content_length", json!(40));
        assert!((context_adjustment(&both, BackendId::SemanticMemory) - 0.32).abs() < 1e-6);
    }

    #[test]
    fn test_hinted_entities_parse_strings_and_objects() {
        let hints = ContextHints::new().with(
            "entities",
            json!([
                "person",
                {"type": "organization", "text": "Acme"},
                {"kind": "document", "name": " Roadmap "},
                {"kind": "spaceship"},
                42
            ]),
        );
        let set = hints.entities();
        assert_eq!(set.len(), 3);
        assert!(set.contains(EntityKind::Person, "person"));
        assert!(set.contains(EntityKind::Organization, "acme"));
        assert!(set.contains(EntityKind::Document, "roadmap"));
        assert!(ContextHints::new().entities().is_empty());
    }

    #[test]
    fn test_hinted_entities_raise_entity_affinity() {
        let engine = engine(RouterConfig::default());
        let plain = engine.route(&retrieve("qwzx plorb"));
        let hinted = engine.route(
            &retrieve("qwzx plorb").with_hint("entities", json!(["document", "concept"])),
        );
        assert!(plain.entities.is_empty());
        assert_eq!(hinted.entities.len(), 2);
        assert!(
            hinted.score_of(BackendId::Document).unwrap()
                > plain.score_of(BackendId::Document).unwrap()
        );
    }

    #[test]
    fn test_hint_flags() {
        let hints = ContextHints::new()
            .with("a", json!(true))
            .with("b", json!("TRUE"))
            .with("c", json!(1))
            .with("d", json!("text"));
        assert!(hints.flag("a"));
        assert!(hints.flag("b"));
        assert!(!hints.flag("c"));
        assert!(!hints.flag("missing"));
        assert_eq!(hints.str("d"), Some("text"));
        assert_eq!(hints.len(), 4);
    }
}
