//! Concept dependency graph: adjacency lists, cycle detection, ordering.
//!
//! A minimal internal representation — adjacency lists with explicit
//! in-degree tracking — rather than a general-purpose graph library, since
//! only three operations are needed: build, topological order, and direct
//! predecessor lookup.
//!
//! Ordering uses Kahn's algorithm with a min-heap keyed on concept id, so
//! concepts with no remaining constraint come out in ascending id order.
//! The tie-break matters: identical inputs must produce identical plans.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, BTreeMap, BTreeSet};

use crate::dataset::{Concept, ConceptId, DomainResolver, GraphDataset};
use crate::error::TutorError;

/// The dependency graph is not a DAG.
///
/// Carries the ids still locked in the cycle once Kahn's algorithm stalls.
#[derive(Debug, Clone)]
pub struct CycleError {
    pub cycle_ids: Vec<ConceptId>,
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "concept dependency cycle involving: {}",
            self.cycle_ids.join(", ")
        )
    }
}

impl std::error::Error for CycleError {}

/// Directed concept-dependency graph for one domain.
///
/// Edges point prerequisite → dependent. Built fresh per request and owned
/// by it; never shared or mutated across requests.
#[derive(Debug, Default)]
pub struct ConceptGraph {
    /// Concept metadata, keyed by id. Ids referenced only by edges have no
    /// entry here but still participate in ordering.
    nodes: BTreeMap<ConceptId, Concept>,
    /// Every id seen in a node or an edge endpoint.
    ids: BTreeSet<ConceptId>,
    successors: BTreeMap<ConceptId, BTreeSet<ConceptId>>,
    predecessors: BTreeMap<ConceptId, BTreeSet<ConceptId>>,
}

impl ConceptGraph {
    /// Build a graph from a normalized dataset. Empty input yields an
    /// empty graph, not an error.
    pub fn build(dataset: GraphDataset) -> Self {
        let mut graph = Self::default();
        for concept in dataset.concepts {
            graph.ids.insert(concept.id.clone());
            graph.nodes.insert(concept.id.clone(), concept);
        }
        for (source, target) in dataset.edges {
            graph.ids.insert(source.clone());
            graph.ids.insert(target.clone());
            graph
                .successors
                .entry(source.clone())
                .or_default()
                .insert(target.clone());
            graph.predecessors.entry(target).or_default().insert(source);
        }
        graph
    }

    /// Resolve and build the graph for a domain in one step.
    ///
    /// # Errors
    ///
    /// [`TutorError::DomainNotFound`] when no dataset resolves.
    pub fn load(resolver: &dyn DomainResolver, domain: &str) -> Result<Self, TutorError> {
        Ok(Self::build(GraphDataset::load(resolver, domain)?))
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of ids in the graph (including edge-only ids).
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Metadata for a concept id, if the dataset carried any.
    pub fn concept(&self, id: &str) -> Option<&Concept> {
        self.nodes.get(id)
    }

    /// Direct prerequisites of a concept. `None` when it has none.
    pub fn predecessors(&self, id: &str) -> Option<&BTreeSet<ConceptId>> {
        self.predecessors.get(id)
    }

    /// Topological order of every id in the graph.
    ///
    /// Kahn's algorithm with a min-heap on concept id: among concepts with
    /// no remaining constraint, the lexicographically smallest id comes
    /// first. Deterministic for identical input.
    ///
    /// # Errors
    ///
    /// [`CycleError`] when the graph is cyclic. Never returns a partial
    /// ordering.
    pub fn topological_order(&self) -> Result<Vec<ConceptId>, CycleError> {
        let mut in_degree: BTreeMap<&str, usize> = self
            .ids
            .iter()
            .map(|id| {
                let degree = self.predecessors.get(id.as_str()).map_or(0, BTreeSet::len);
                (id.as_str(), degree)
            })
            .collect();

        let mut heap: BinaryHeap<Reverse<&str>> = BinaryHeap::new();
        for (id, &degree) in &in_degree {
            if degree == 0 {
                heap.push(Reverse(*id));
            }
        }

        let mut order: Vec<ConceptId> = Vec::with_capacity(self.ids.len());
        while let Some(Reverse(id)) = heap.pop() {
            order.push(id.to_string());
            if let Some(next) = self.successors.get(id) {
                for succ in next {
                    if let Some(degree) = in_degree.get_mut(succ.as_str()) {
                        *degree -= 1;
                        if *degree == 0 {
                            heap.push(Reverse(succ.as_str()));
                        }
                    }
                }
            }
        }

        if order.len() != self.ids.len() {
            let ordered: BTreeSet<&str> = order.iter().map(String::as_str).collect();
            let cycle_ids: Vec<ConceptId> = self
                .ids
                .iter()
                .filter(|id| !ordered.contains(id.as_str()))
                .cloned()
                .collect();
            return Err(CycleError { cycle_ids });
        }

        Ok(order)
    }
}
