//! Run-level error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::classify::RuleError;
use crate::config::ConfigError;
use crate::knowledge::emitter::EmitError;
use crate::knowledge::ontology::OntologyError;
use crate::knowledge::parser::CatalogError;

/// Errors that stop a run.
///
/// Per-file problems never show up here; they are recorded as
/// [`FailureEvent`](crate::knowledge::pipeline::FailureEvent)s and the run
/// carries on.
#[derive(Debug, Error)]
pub enum RunError {
    /// The run was cancelled between files. Nothing was emitted.
    #[error("Run cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Classification rules error: {0}")]
    Rules(#[from] RuleError),

    #[error("Ontology error: {0}")]
    Ontology(#[from] OntologyError),

    #[error("Grammar catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Emit error: {0}")]
    Emit(#[from] EmitError),

    /// Repository root is missing or not a directory.
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// A worker task panicked or was aborted.
    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl RunError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunError::Cancelled)
    }
}
