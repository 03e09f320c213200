//! Domain dataset resolution and normalization.
//!
//! A domain (e.g. "Programming Basics") resolves to a concept/edge dataset.
//! Two source shapes are accepted:
//!
//! 1. Explicit node + edge lists:
//!    `{"nodes": [{"id": ...}, ...], "edges": [{"source": ..., "target": ...}]}`
//! 2. Concept list with embedded prerequisite lists:
//!    `{"concepts": [{"id": ..., "prerequisites": [...]}, ...]}`
//!
//! The second shape is normalized into directed edges prerequisite→concept
//! at load time, so everything downstream sees one [`GraphDataset`] form.
//!
//! Malformed entries (a node without a string `id`, an edge missing an
//! endpoint) are skipped with a warning; one bad record never aborts the
//! whole load.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::TutorError;

/// Stable string key identifying a concept within a domain.
pub type ConceptId = String;

/// An atomic unit of learnable material.
///
/// Only `id` is interpreted by the core; everything else (title,
/// description, difficulty, …) is an opaque payload passed through to
/// plan items untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub id: ConceptId,
    #[serde(flatten)]
    pub meta: serde_json::Map<String, Value>,
}

impl Concept {
    /// Construct a concept with no metadata (mainly for tests).
    pub fn bare(id: impl Into<ConceptId>) -> Self {
        Self {
            id: id.into(),
            meta: serde_json::Map::new(),
        }
    }
}

/// Normalized concept/edge dataset for one domain.
///
/// Edges are directed prerequisite → dependent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphDataset {
    pub concepts: Vec<Concept>,
    pub edges: Vec<(ConceptId, ConceptId)>,
}

impl GraphDataset {
    /// Normalize a raw JSON dataset into node + edge lists.
    ///
    /// Accepts both source shapes described in the module docs. Entries
    /// missing required fields are skipped with a warning.
    pub fn from_value(value: &Value) -> Self {
        let mut concepts = Vec::new();
        let mut edges = Vec::new();

        // Shape 1: explicit "nodes" + "edges".
        // Shape 2: "concepts" with embedded "prerequisites".
        let node_list = value
            .get("nodes")
            .or_else(|| value.get("concepts"))
            .and_then(Value::as_array);

        if let Some(nodes) = node_list {
            for raw in nodes {
                match serde_json::from_value::<Concept>(raw.clone()) {
                    Ok(concept) => {
                        if let Some(prereqs) =
                            concept.meta.get("prerequisites").and_then(Value::as_array)
                        {
                            for prereq in prereqs {
                                match prereq.as_str() {
                                    Some(p) => edges.push((p.to_string(), concept.id.clone())),
                                    None => warn!(
                                        concept = %concept.id,
                                        "skipping non-string prerequisite entry"
                                    ),
                                }
                            }
                        }
                        concepts.push(concept);
                    }
                    Err(e) => warn!(error = %e, "skipping malformed concept record"),
                }
            }
        }

        if let Some(raw_edges) = value.get("edges").and_then(Value::as_array) {
            for raw in raw_edges {
                let source = raw.get("source").and_then(Value::as_str);
                let target = raw.get("target").and_then(Value::as_str);
                match (source, target) {
                    (Some(s), Some(t)) => edges.push((s.to_string(), t.to_string())),
                    _ => warn!("skipping edge record missing source or target"),
                }
            }
        }

        Self { concepts, edges }
    }

    /// Resolve a domain through `resolver`, failing explicitly when no
    /// dataset exists.
    pub fn load(resolver: &dyn DomainResolver, domain: &str) -> Result<Self, TutorError> {
        resolver
            .resolve(domain)?
            .ok_or_else(|| TutorError::DomainNotFound(domain.to_string()))
    }
}

/// Normalize a domain name to its dataset slug: lowercased, whitespace
/// collapsed to single underscores.
pub fn domain_slug(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Resolves a domain identifier to a concept/edge dataset.
///
/// `Ok(None)` means a genuine absence — callers translate it to
/// [`TutorError::DomainNotFound`] or an empty plan as their contract
/// requires. Fuzzy slug matching inside an implementation is best-effort
/// and must never mask a real absence.
pub trait DomainResolver: Send + Sync {
    fn resolve(&self, domain: &str) -> Result<Option<GraphDataset>>;
}

/// Picks the best fuzzy match for `slug` among `known` slugs.
///
/// A candidate matches when one slug is a prefix of the other (so "prog"
/// finds "programming", and "programming_basics" falls back to
/// "programming"). `known` must be sorted; the lexicographically smallest
/// match wins, keeping resolution deterministic.
fn fuzzy_slug_match<'a>(slug: &str, known: &'a [String]) -> Option<&'a String> {
    if slug.is_empty() {
        return None;
    }
    known
        .iter()
        .find(|k| k.starts_with(slug) || slug.starts_with(k.as_str()))
}

// ---------------------------------------------------------------------------
// DirResolver — `<slug>_graph.json` files under a data directory
// ---------------------------------------------------------------------------

const GRAPH_FILE_SUFFIX: &str = "_graph.json";

/// Resolves domains against `<slug>_graph.json` files in a directory.
pub struct DirResolver {
    root: PathBuf,
}

impl DirResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Slugs of every dataset present in the data directory, sorted.
    fn known_slugs(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return Vec::new();
        };
        let mut slugs: BTreeSet<String> = BTreeSet::new();
        for entry in entries.flatten() {
            let name = entry.file_name();
            if let Some(slug) = name
                .to_str()
                .and_then(|n| n.strip_suffix(GRAPH_FILE_SUFFIX))
            {
                slugs.insert(slug.to_string());
            }
        }
        slugs.into_iter().collect()
    }

    fn load_slug(&self, slug: &str) -> Result<GraphDataset> {
        let path = self.root.join(format!("{slug}{GRAPH_FILE_SUFFIX}"));
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading dataset {}", path.display()))?;
        let value: Value = serde_json::from_str(&text)
            .with_context(|| format!("parsing dataset {}", path.display()))?;
        Ok(GraphDataset::from_value(&value))
    }
}

impl DomainResolver for DirResolver {
    fn resolve(&self, domain: &str) -> Result<Option<GraphDataset>> {
        let slug = domain_slug(domain);
        if self.root.join(format!("{slug}{GRAPH_FILE_SUFFIX}")).exists() {
            return self.load_slug(&slug).map(Some);
        }
        let known = self.known_slugs();
        match fuzzy_slug_match(&slug, &known) {
            Some(matched) => {
                debug!(%domain, %matched, "fuzzy-matched domain to dataset slug");
                self.load_slug(matched).map(Some)
            }
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// StaticResolver — in-memory datasets, for tests and embedding
// ---------------------------------------------------------------------------

/// In-memory resolver over pre-built datasets keyed by slug.
#[derive(Default)]
pub struct StaticResolver {
    datasets: std::collections::BTreeMap<String, GraphDataset>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, domain: &str, dataset: GraphDataset) {
        self.datasets.insert(domain_slug(domain), dataset);
    }
}

impl DomainResolver for StaticResolver {
    fn resolve(&self, domain: &str) -> Result<Option<GraphDataset>> {
        let slug = domain_slug(domain);
        if let Some(dataset) = self.datasets.get(&slug) {
            return Ok(Some(dataset.clone()));
        }
        let known: Vec<String> = self.datasets.keys().cloned().collect();
        Ok(fuzzy_slug_match(&slug, &known)
            .and_then(|k| self.datasets.get(k))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data_dir() -> PathBuf {
        PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/data"))
    }

    #[test]
    fn slug_normalization() {
        assert_eq!(domain_slug("Programming Basics"), "programming_basics");
        assert_eq!(domain_slug("  Data   Science "), "data_science");
    }

    #[test]
    fn normalizes_node_edge_shape() {
        let raw = json!({
            "nodes": [
                {"id": "a", "title": "A"},
                {"id": "b", "title": "B"}
            ],
            "edges": [
                {"source": "a", "target": "b"}
            ]
        });
        let dataset = GraphDataset::from_value(&raw);
        assert_eq!(dataset.concepts.len(), 2);
        assert_eq!(dataset.edges, vec![("a".to_string(), "b".to_string())]);
        assert_eq!(
            dataset.concepts[0].meta.get("title"),
            Some(&json!("A"))
        );
    }

    #[test]
    fn normalizes_prerequisite_shape() {
        let raw = json!({
            "concepts": [
                {"id": "stats", "prerequisites": []},
                {"id": "ml", "prerequisites": ["stats", "linear_algebra"]}
            ]
        });
        let dataset = GraphDataset::from_value(&raw);
        assert_eq!(dataset.concepts.len(), 2);
        assert_eq!(
            dataset.edges,
            vec![
                ("stats".to_string(), "ml".to_string()),
                ("linear_algebra".to_string(), "ml".to_string())
            ]
        );
    }

    #[test]
    fn skips_malformed_records_without_aborting() {
        let raw = json!({
            "nodes": [
                {"title": "no id here"},
                {"id": "ok"}
            ],
            "edges": [
                {"source": "ok"},
                {"source": "ok", "target": "ok2"}
            ]
        });
        let dataset = GraphDataset::from_value(&raw);
        assert_eq!(dataset.concepts.len(), 1);
        assert_eq!(dataset.edges.len(), 1);
    }

    #[test]
    fn empty_input_yields_empty_dataset() {
        let dataset = GraphDataset::from_value(&json!({}));
        assert!(dataset.concepts.is_empty());
        assert!(dataset.edges.is_empty());
    }

    #[test]
    fn dir_resolver_exact_and_fuzzy() {
        let resolver = DirResolver::new(data_dir());

        let exact = resolver.resolve("programming").unwrap();
        assert!(exact.is_some());

        // Prefix of a known slug.
        let fuzzy = resolver.resolve("prog").unwrap();
        assert_eq!(fuzzy, exact);

        // Known slug is a prefix of the query.
        let superset = resolver.resolve("Programming Basics").unwrap();
        assert_eq!(superset, exact);

        assert!(resolver.resolve("underwater basket weaving").unwrap().is_none());
    }

    #[test]
    fn dir_resolver_missing_root_is_absence() {
        let resolver = DirResolver::new("/nonexistent/data/dir");
        assert!(resolver.resolve("programming").unwrap().is_none());
    }

    #[test]
    fn load_surfaces_domain_not_found() {
        let resolver = StaticResolver::new();
        let err = GraphDataset::load(&resolver, "algebra").unwrap_err();
        assert!(matches!(err, TutorError::DomainNotFound(d) if d == "algebra"));
    }
}
