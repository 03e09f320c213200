//! Study plan generation: graph order fused with completion state and
//! error history.
//!
//! The planner is a heuristic composer, not a solver: review candidates
//! (completed concepts with a poor long-term error record) come first,
//! then new content in topological order with lock/unlock status from
//! direct prerequisites. Every tie-break is deterministic so an unchanged
//! learner gets an identical plan on every call.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dataset::{Concept, DomainResolver};
use crate::graph::ConceptGraph;
use crate::learner::{LearnerSnapshot, LearnerStateReader};

/// Errors on a completed concept before it becomes a review candidate.
const REVIEW_ERROR_THRESHOLD: usize = 2;

const REVIEW_REASON: &str = "High error rate detected previously";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    /// Prerequisites not yet completed.
    Locked,
    /// All direct prerequisites completed.
    Unlocked,
    /// Previously completed, flagged for re-study.
    Review,
}

/// One entry of a generated study plan. Sequence order is significant:
/// review items precede new content, which keeps topological order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanItem {
    #[serde(flatten)]
    pub concept: Concept,
    pub status: PlanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Composes ranked study plans from the concept graph and learner state.
pub struct StudyPlanGenerator {
    resolver: Arc<dyn DomainResolver>,
    learners: Arc<dyn LearnerStateReader>,
}

impl StudyPlanGenerator {
    pub fn new(resolver: Arc<dyn DomainResolver>, learners: Arc<dyn LearnerStateReader>) -> Self {
        Self { resolver, learners }
    }

    /// Generate the ordered, status-annotated plan for a learner.
    ///
    /// Absence of content is not a fault: an unknown domain yields an
    /// empty plan. A cyclic graph is a content-authoring defect — logged
    /// server-side, surfaced as an empty plan rather than an error.
    pub fn generate_plan(&self, learner_id: &str, domain: &str) -> Vec<PlanItem> {
        let dataset = match self.resolver.resolve(domain) {
            Ok(Some(dataset)) => dataset,
            Ok(None) => {
                debug!(%domain, "no concept dataset for domain, returning empty plan");
                return Vec::new();
            }
            Err(e) => {
                warn!(%domain, error = %format!("{e:#}"), "dataset resolution failed");
                return Vec::new();
            }
        };
        let graph = ConceptGraph::build(dataset);

        let snapshot = match self.learners.snapshot(learner_id) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => LearnerSnapshot::default(),
            Err(e) => {
                warn!(%learner_id, error = %format!("{e:#}"), "learner state unavailable");
                LearnerSnapshot::default()
            }
        };

        let order = match graph.topological_order() {
            Ok(order) => order,
            Err(e) => {
                warn!(%domain, error = %e, "concept graph has a cycle, returning empty plan");
                return Vec::new();
            }
        };

        // Completed concepts with a poor long-term error record go back on
        // the plan. Full-history counts, not windowed: long-term mastery
        // is a different signal from short-term affect.
        let error_counts = snapshot.error_counts();
        let review: BTreeSet<&str> = error_counts
            .iter()
            .filter(|&(&id, &errors)| {
                errors >= REVIEW_ERROR_THRESHOLD && snapshot.completed.contains(id)
            })
            .map(|(&id, _)| id)
            .collect();

        let mut plan = Vec::new();

        // Review items first, ascending concept id — no graph ordering
        // applies among them at this stage.
        for id in &review {
            if let Some(concept) = graph.concept(id) {
                plan.push(PlanItem {
                    concept: concept.clone(),
                    status: PlanStatus::Review,
                    reason: Some(REVIEW_REASON.to_string()),
                });
            }
        }

        // Then new content in topological order. Completed concepts that
        // are not under review are neither relisted nor reviewed. Ids
        // without metadata are silently skipped.
        for id in order {
            if snapshot.completed.contains(&id) {
                continue;
            }
            let Some(concept) = graph.concept(&id) else {
                continue;
            };
            let unlocked = graph
                .predecessors(&id)
                .map_or(true, |prereqs| {
                    prereqs.iter().all(|p| snapshot.completed.contains(p))
                });
            plan.push(PlanItem {
                concept: concept.clone(),
                status: if unlocked {
                    PlanStatus::Unlocked
                } else {
                    PlanStatus::Locked
                },
                reason: None,
            });
        }

        plan
    }
}
