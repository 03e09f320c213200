//! Reinforcement-learning intervention policy.
//!
//! A tabular Q-learning agent over affective states and a fixed set of six
//! pedagogical actions. The action-value table is the one piece of shared,
//! mutable, process-wide state in the core, so it lives behind a mutex and
//! is persisted through an injected [`PolicyStore`] after every update —
//! durability of resumed learning outweighs batching efficiency here.
//!
//! The policy is agnostic to what each action *means*; that mapping lives
//! in the intervention engine.

mod store;

pub use store::{JsonFileStore, MemoryStore, PolicyStore};

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use rand::Rng;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::affect::AffectiveState;
use crate::error::TutorError;

/// The six pedagogical actions, in fixed tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Hint,
    VisualAid,
    Break,
    MindGame,
    Video,
    EasierProblem,
}

impl Action {
    pub const COUNT: usize = 6;

    /// Fixed ordering used for value rows and for deterministic argmax
    /// tie-breaks.
    pub const ALL: [Action; Self::COUNT] = [
        Action::Hint,
        Action::VisualAid,
        Action::Break,
        Action::MindGame,
        Action::Video,
        Action::EasierProblem,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hint => "hint",
            Self::VisualAid => "visual_aid",
            Self::Break => "break",
            Self::MindGame => "mind_game",
            Self::Video => "video",
            Self::EasierProblem => "easier_problem",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.as_str() == label)
    }

    fn index(self) -> usize {
        match self {
            Self::Hint => 0,
            Self::VisualAid => 1,
            Self::Break => 2,
            Self::MindGame => 3,
            Self::Video => 4,
            Self::EasierProblem => 5,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the action-value table: a value per action, in [`Action::ALL`]
/// order. Serialized as an action-label → value map so the on-disk shape
/// stays `{state: {action: value}}`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActionValues([f64; Action::COUNT]);

impl ActionValues {
    pub fn get(&self, action: Action) -> f64 {
        self.0[action.index()]
    }

    pub fn set(&mut self, action: Action, value: f64) {
        self.0[action.index()] = value;
    }

    /// Highest value in the row.
    pub fn max(&self) -> f64 {
        self.0.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Action with the highest value; ties resolve to the first action in
    /// [`Action::ALL`], so repeated calls under identical values agree.
    pub fn argmax(&self) -> Action {
        let mut best = Action::ALL[0];
        for action in Action::ALL {
            if self.get(action) > self.get(best) {
                best = action;
            }
        }
        best
    }
}

impl Serialize for ActionValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Action::COUNT))?;
        for action in Action::ALL {
            map.serialize_entry(action.as_str(), &self.get(action))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ActionValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = ActionValues;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of action labels to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut row = ActionValues::default();
                while let Some((label, value)) = access.next_entry::<String, f64>()? {
                    // Unknown labels are tolerated so old table files with
                    // retired actions still load.
                    if let Some(action) = Action::from_label(&label) {
                        row.set(action, value);
                    }
                }
                Ok(row)
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

/// Learned state → action-value mapping. Grows monotonically in keys;
/// rows are lazily seeded to all-zero on first sight and never removed.
pub type QTable = BTreeMap<AffectiveState, ActionValues>;

/// Q-learning hyperparameters.
#[derive(Debug, Clone, Copy)]
pub struct Hyperparams {
    pub learning_rate: f64,
    pub discount_factor: f64,
    /// Probability of taking a uniformly random action instead of the
    /// current argmax. Zero makes `choose_action` fully deterministic.
    pub epsilon: f64,
}

impl Default for Hyperparams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.9,
            epsilon: 0.2,
        }
    }
}

/// Online-updated intervention policy with durable action values.
///
/// Constructed once at process start and shared by handle. Concurrent
/// `choose_action`/`update` calls are serialized on the table mutex, which
/// is coarser than the per-state requirement but never races a
/// read-modify-write.
pub struct InterventionPolicy {
    table: Mutex<QTable>,
    store: Box<dyn PolicyStore>,
    hyper: Hyperparams,
    /// Set after the first failed save so degraded operation is logged
    /// loudly once, then quietly.
    save_failed: AtomicBool,
}

impl InterventionPolicy {
    /// Load the persisted table (if any) and start serving with default
    /// hyperparameters. A failed load starts from an empty table rather
    /// than failing construction.
    pub fn new(store: Box<dyn PolicyStore>) -> Self {
        Self::with_hyperparams(store, Hyperparams::default())
    }

    pub fn with_hyperparams(store: Box<dyn PolicyStore>, hyper: Hyperparams) -> Self {
        let table = match store.load() {
            Ok(Some(table)) => {
                info!(states = table.len(), "loaded persisted action-value table");
                table
            }
            Ok(None) => QTable::new(),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "could not load action-value table, starting empty");
                QTable::new()
            }
        };
        Self {
            table: Mutex::new(table),
            store,
            hyper,
            save_failed: AtomicBool::new(false),
        }
    }

    fn lock_table(&self) -> std::sync::MutexGuard<'_, QTable> {
        // A poisoned lock only means another thread panicked mid-update;
        // the table itself is still structurally valid.
        self.table.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// ε-greedy action selection for a state, seeding its row on first
    /// sight.
    pub fn choose_action(&self, state: AffectiveState) -> Action {
        let mut table = self.lock_table();
        let row = *table.entry(state).or_default();
        drop(table);

        if self.hyper.epsilon > 0.0 && rand::thread_rng().gen::<f64>() < self.hyper.epsilon {
            let explored = Action::ALL[rand::thread_rng().gen_range(0..Action::COUNT)];
            debug!(%state, action = %explored, "exploring");
            return explored;
        }
        row.argmax()
    }

    /// One-step Q-learning update, persisted immediately.
    ///
    /// `q ← q + α·(reward + γ·max(next_row) − q)`
    ///
    /// Persistence failure degrades to in-memory-only operation: the
    /// update is retained for the rest of the process lifetime and the
    /// failure is logged, never surfaced to the caller.
    pub fn update(&self, state: AffectiveState, action: Action, reward: f64, next_state: AffectiveState) {
        let mut table = self.lock_table();

        let max_next = table.entry(next_state).or_default().max();
        let row = table.entry(state).or_default();
        let q = row.get(action);
        let new_q = q + self.hyper.learning_rate
            * (reward + self.hyper.discount_factor * max_next - q);
        row.set(action, new_q);
        debug!(%state, %action, reward, value = new_q, "applied q-learning update");

        if let Err(e) = self.store.save(&table) {
            if !self.save_failed.swap(true, Ordering::Relaxed) {
                warn!(
                    error = %format!("{e:#}"),
                    "failed to persist action-value table, continuing in-memory"
                );
            } else {
                debug!(error = %format!("{e:#}"), "action-value table save failed again");
            }
        } else {
            self.save_failed.store(false, Ordering::Relaxed);
        }
    }

    /// Force a save of the current table, surfacing failures.
    ///
    /// Routine updates degrade silently; this is for shutdown paths that
    /// want to know whether the table actually reached durable storage.
    pub fn flush(&self) -> Result<(), TutorError> {
        let table = self.lock_table();
        self.store
            .save(&table)
            .map_err(|e| TutorError::PersistenceUnavailable(format!("{e:#}")))
    }

    /// Copy of the current table, for inspection and tests.
    pub fn snapshot(&self) -> QTable {
        self.lock_table().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deterministic(store: Box<dyn PolicyStore>) -> InterventionPolicy {
        InterventionPolicy::with_hyperparams(
            store,
            Hyperparams {
                epsilon: 0.0,
                ..Hyperparams::default()
            },
        )
    }

    #[test]
    fn action_labels_round_trip() {
        for action in Action::ALL {
            assert_eq!(Action::from_label(action.as_str()), Some(action));
        }
        assert_eq!(Action::from_label("bribe"), None);
    }

    #[test]
    fn choose_action_seeds_and_breaks_ties_first_in_order() {
        let policy = deterministic(Box::new(MemoryStore::new()));
        // All-zero row: first action in fixed order wins, repeatedly.
        for _ in 0..3 {
            assert_eq!(policy.choose_action(AffectiveState::Confused), Action::Hint);
        }
        assert!(policy.snapshot().contains_key(&AffectiveState::Confused));
    }

    #[test]
    fn choose_action_exploits_highest_value() {
        let policy = deterministic(Box::new(MemoryStore::new()));
        policy.update(AffectiveState::Fatigued, Action::Break, 5.0, AffectiveState::Engaged);
        assert_eq!(policy.choose_action(AffectiveState::Fatigued), Action::Break);
    }

    #[test]
    fn single_update_from_zero_table() {
        let policy = deterministic(Box::new(MemoryStore::new()));
        policy.update(AffectiveState::Struggling, Action::Hint, 1.0, AffectiveState::Engaged);

        let table = policy.snapshot();
        let value = table[&AffectiveState::Struggling].get(Action::Hint);
        // 0 + 0.1 * (1 + 0.9 * 0 - 0)
        assert!((value - 0.1).abs() < 1e-12);
        // next_state row was seeded before reading its max.
        assert!(table.contains_key(&AffectiveState::Engaged));
    }

    #[test]
    fn update_discounts_next_state_max() {
        let policy = deterministic(Box::new(MemoryStore::new()));
        policy.update(AffectiveState::Engaged, Action::Video, 2.0, AffectiveState::Engaged);
        // Second update sees max(engaged) = 0.2.
        policy.update(AffectiveState::Confused, Action::Hint, 1.0, AffectiveState::Engaged);

        let table = policy.snapshot();
        let expected = 0.1 * (1.0 + 0.9 * 0.2);
        assert!((table[&AffectiveState::Confused].get(Action::Hint) - expected).abs() < 1e-12);
    }

    #[test]
    fn table_persists_through_store() {
        let store = MemoryStore::new();
        let shared = store.clone();
        let policy = deterministic(Box::new(store));
        policy.update(AffectiveState::Struggling, Action::Hint, 1.0, AffectiveState::Neutral);

        // A fresh policy over the same store resumes the learned values.
        let resumed = deterministic(Box::new(shared));
        let table = resumed.snapshot();
        assert!((table[&AffectiveState::Struggling].get(Action::Hint) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn save_failure_keeps_in_memory_update() {
        struct FailingStore;
        impl PolicyStore for FailingStore {
            fn load(&self) -> anyhow::Result<Option<QTable>> {
                Ok(None)
            }
            fn save(&self, _table: &QTable) -> anyhow::Result<()> {
                anyhow::bail!("disk on fire")
            }
        }

        let policy = deterministic(Box::new(FailingStore));
        policy.update(AffectiveState::Struggling, Action::Hint, 1.0, AffectiveState::Engaged);
        // Update retained despite the failed save; selection still works.
        let table = policy.snapshot();
        assert!((table[&AffectiveState::Struggling].get(Action::Hint) - 0.1).abs() < 1e-12);
        assert_eq!(policy.choose_action(AffectiveState::Struggling), Action::Hint);

        // An explicit flush does surface the failure.
        assert!(matches!(
            policy.flush(),
            Err(TutorError::PersistenceUnavailable(_))
        ));
    }

    #[test]
    fn row_serializes_as_label_map() {
        let mut row = ActionValues::default();
        row.set(Action::VisualAid, 0.25);
        let json = serde_json::to_value(row).unwrap();
        assert_eq!(json["visual_aid"], 0.25);
        assert_eq!(json["hint"], 0.0);

        let back: ActionValues = serde_json::from_value(json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn row_deserialization_tolerates_unknown_labels() {
        let row: ActionValues =
            serde_json::from_value(serde_json::json!({"hint": 0.5, "retired_action": 9.0})).unwrap();
        assert_eq!(row.get(Action::Hint), 0.5);
    }
}
