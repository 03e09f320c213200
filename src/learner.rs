//! Learner state as consumed by the core.
//!
//! The core never owns this data: a snapshot is fetched per invocation
//! through [`LearnerStateReader`] and treated as immutable. Updates flow
//! back through whatever persistence layer the caller wires in.

use std::collections::{BTreeSet, HashMap};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dataset::ConceptId;

/// One logged learner interaction. Immutable once created; the core only
/// reads bounded windows of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub concept_id: ConceptId,
    pub is_correct: bool,
    pub response_time_ms: u64,
    pub timestamp: DateTime<Utc>,
    /// What the learner was doing, e.g. "quiz_answer".
    pub action: String,
    /// Free-form payload, uninterpreted by the core.
    #[serde(default)]
    pub detail: Value,
}

impl InteractionRecord {
    /// A quiz-answer record stamped now, for callers that only care about
    /// the signals the core reads.
    pub fn answer(concept_id: impl Into<ConceptId>, is_correct: bool, response_time_ms: u64) -> Self {
        Self {
            concept_id: concept_id.into(),
            is_correct,
            response_time_ms,
            timestamp: Utc::now(),
            action: "quiz_answer".to_string(),
            detail: Value::Null,
        }
    }
}

/// Immutable per-invocation view of a learner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LearnerSnapshot {
    /// Membership-only semantics; insertion order is irrelevant.
    pub completed: BTreeSet<ConceptId>,
    /// Full interaction history, oldest first.
    pub history: Vec<InteractionRecord>,
    pub domain: Option<String>,
}

impl LearnerSnapshot {
    /// Per-concept error counts over the full (unwindowed) history.
    ///
    /// Deliberately not windowed: long-term mastery is a different signal
    /// from the short-term windows affect classification uses.
    pub fn error_counts(&self) -> HashMap<&str, usize> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for record in &self.history {
            let entry = counts.entry(record.concept_id.as_str()).or_insert(0);
            if !record.is_correct {
                *entry += 1;
            }
        }
        counts
    }
}

/// Reads a learner's completion set and interaction history.
///
/// `Ok(None)` means the learner is unknown; plan generation treats that as
/// an empty snapshot rather than a fault.
pub trait LearnerStateReader: Send + Sync {
    fn snapshot(&self, learner_id: &str) -> Result<Option<LearnerSnapshot>>;
}

/// In-memory learner store, for tests and embedding.
#[derive(Default)]
pub struct MemoryLearnerStore {
    learners: HashMap<String, LearnerSnapshot>,
}

impl MemoryLearnerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, learner_id: impl Into<String>, snapshot: LearnerSnapshot) {
        self.learners.insert(learner_id.into(), snapshot);
    }
}

impl LearnerStateReader for MemoryLearnerStore {
    fn snapshot(&self, learner_id: &str) -> Result<Option<LearnerSnapshot>> {
        Ok(self.learners.get(learner_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_counts_cover_full_history() {
        let mut snapshot = LearnerSnapshot::default();
        for correct in [false, true, false, false] {
            snapshot
                .history
                .push(InteractionRecord::answer("loops", correct, 10_000));
        }
        snapshot
            .history
            .push(InteractionRecord::answer("variables", true, 5_000));

        let counts = snapshot.error_counts();
        assert_eq!(counts.get("loops"), Some(&3));
        assert_eq!(counts.get("variables"), Some(&0));
    }

    #[test]
    fn unknown_learner_is_none() {
        let store = MemoryLearnerStore::new();
        assert!(store.snapshot("nobody").unwrap().is_none());
    }
}
