//! tutor-core — adaptive learning orchestrator.
//!
//! Sequences learning content and chooses pedagogical interventions for an
//! individual learner. Four tightly-coupled decision components:
//!
//! - [`graph::ConceptGraph`] — prerequisite knowledge graph with cycle
//!   detection and deterministic topological ordering.
//! - [`affect`] — affective-state classification and dropout-risk scoring
//!   over bounded windows of recent interactions.
//! - [`policy::InterventionPolicy`] — a persistent Q-learning agent
//!   mapping affective state to pedagogical action.
//! - [`plan::StudyPlanGenerator`] — fuses graph order, completion state,
//!   and error history into a ranked study plan.
//!
//! ## Architecture
//!
//! ```text
//! plan request ──► DomainResolver ──► ConceptGraph ──► StudyPlanGenerator ──► PlanItem[]
//!                                          ▲
//!                  LearnerStateReader ─────┘
//!
//! interaction window ──► affect::classify ──► InterventionEngine
//!                                                   │
//!                              InterventionPolicy ◄─┤ choose_action
//!                                    │              ▼
//!                               PolicyStore   InterventionDescriptor
//! ```
//!
//! The core performs no I/O of its own beyond dataset loads and policy
//! persistence; storage, HTTP, and content generation are injected or out
//! of scope.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use tutor_core::{MemoryLearnerStore, MemoryStore, Orchestrator, StaticResolver};
//!
//! let orchestrator = Orchestrator::new(
//!     Arc::new(StaticResolver::new()),
//!     Arc::new(MemoryLearnerStore::new()),
//!     Box::new(MemoryStore::new()),
//! );
//! // No content for the domain: empty plan, not an error.
//! assert!(orchestrator.generate_study_plan("learner-1", "algebra").is_empty());
//! ```

pub mod affect;
pub mod dataset;
pub mod error;
pub mod graph;
pub mod intervention;
pub mod learner;
pub mod orchestrator;
pub mod plan;
pub mod policy;

pub use affect::{classify, risk_score, AffectiveState};
pub use dataset::{domain_slug, Concept, ConceptId, DirResolver, DomainResolver, GraphDataset, StaticResolver};
pub use error::TutorError;
pub use graph::{ConceptGraph, CycleError};
pub use intervention::{
    recommend_path, InterventionDescriptor, InterventionEngine, PathDescriptor,
};
pub use learner::{InteractionRecord, LearnerSnapshot, LearnerStateReader, MemoryLearnerStore};
pub use orchestrator::Orchestrator;
pub use plan::{PlanItem, PlanStatus, StudyPlanGenerator};
pub use policy::{
    Action, ActionValues, Hyperparams, InterventionPolicy, JsonFileStore, MemoryStore,
    PolicyStore, QTable,
};
