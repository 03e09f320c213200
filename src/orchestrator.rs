//! Top-level facade wiring the decision components together.
//!
//! Built once at process start from injected collaborators and shared by
//! the request-serving layer. Each call runs to completion synchronously
//! over an immutable snapshot of learner state; the only cross-request
//! mutable state is the policy's action-value table, which serializes its
//! own updates.

use std::sync::Arc;

use crate::affect::{self, AffectiveState};
use crate::dataset::DomainResolver;
use crate::intervention::{InterventionDescriptor, InterventionEngine, PathDescriptor};
use crate::learner::{InteractionRecord, LearnerStateReader};
use crate::plan::{PlanItem, StudyPlanGenerator};
use crate::policy::{Action, InterventionPolicy, PolicyStore};

/// Adaptive learning orchestrator: plans, affect, interventions.
pub struct Orchestrator {
    planner: StudyPlanGenerator,
    engine: InterventionEngine,
    policy: Arc<InterventionPolicy>,
}

impl Orchestrator {
    /// Wire the orchestrator from its three external collaborators.
    pub fn new(
        resolver: Arc<dyn DomainResolver>,
        learners: Arc<dyn LearnerStateReader>,
        store: Box<dyn PolicyStore>,
    ) -> Self {
        Self::with_policy(resolver, learners, Arc::new(InterventionPolicy::new(store)))
    }

    /// Wire with a pre-built policy (custom hyperparameters, shared
    /// instances).
    pub fn with_policy(
        resolver: Arc<dyn DomainResolver>,
        learners: Arc<dyn LearnerStateReader>,
        policy: Arc<InterventionPolicy>,
    ) -> Self {
        Self {
            planner: StudyPlanGenerator::new(resolver, learners),
            engine: InterventionEngine::new(Arc::clone(&policy)),
            policy,
        }
    }

    /// Ranked, status-annotated study plan. Empty when the domain has no
    /// content or its graph is defective — never an error.
    pub fn generate_study_plan(&self, learner_id: &str, domain: &str) -> Vec<PlanItem> {
        self.planner.generate_plan(learner_id, domain)
    }

    /// Categorical affective state plus dropout-risk score for a recent
    /// interaction window.
    pub fn classify_affect(&self, window: &[InteractionRecord]) -> (AffectiveState, u8) {
        (affect::classify(window), affect::risk_score(window))
    }

    /// Policy-chosen intervention for a detected affective state.
    pub fn recommend_intervention(
        &self,
        state: AffectiveState,
        current_concept_id: &str,
    ) -> InterventionDescriptor {
        self.engine.recommend_action(state, current_concept_id)
    }

    /// Risk-threshold path recommendation, independent of the policy.
    pub fn recommend_path(&self, risk_score: u8, domain: &str) -> PathDescriptor {
        self.engine.recommend_path(risk_score, domain)
    }

    /// Feed a reward signal back into the policy.
    pub fn record_outcome(
        &self,
        state: AffectiveState,
        action: Action,
        reward: f64,
        next_state: AffectiveState,
    ) {
        self.policy.update(state, action, reward, next_state);
    }

    /// Handle to the shared policy, for inspection.
    pub fn policy(&self) -> &InterventionPolicy {
        &self.policy
    }
}
