//! Error types for the orchestrator core.
//!
//! Failure taxonomy:
//!
//! - [`TutorError::DomainNotFound`] — no concept dataset for the requested
//!   domain; surfaced to callers as a "not found" condition.
//! - [`TutorError::Cycle`] — the concept graph violated the acyclicity
//!   invariant. Plan generation logs this and degrades to an empty plan.
//! - [`TutorError::PersistenceUnavailable`] — the action-value table could
//!   not be saved; the policy keeps operating in memory.
//!
//! Nothing in this crate should ever panic the host process: every failure
//! path either returns one of these variants or degrades to a well-defined
//! empty/default result plus a tracing diagnostic.

use thiserror::Error;

use crate::graph::CycleError;

/// Main error type for the orchestrator core.
#[derive(Error, Debug)]
pub enum TutorError {
    #[error("no concept dataset found for domain '{0}'")]
    DomainNotFound(String),

    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error("action-value table could not be persisted: {0}")]
    PersistenceUnavailable(String),

    #[error("dataset resolution failed: {0}")]
    Resolver(#[from] anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
