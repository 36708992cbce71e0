//! Ontology-typed knowledge graph extraction.
//!
//! Turns a source repository into files, entities and typed relationship
//! edges whose classes and predicates all come from a closed ontology
//! vocabulary.
//!
//! # Components
//!
//! - [`ontology::OntologyRegistry`] - closed vocabulary with membership checks
//! - [`parser::GrammarCatalog`] - per-language tree-sitter query tables
//! - [`indexer::EntityExtractor`] - entities and raw observations from a tree
//! - [`resolver::RelationshipResolver`] - containment, call, import,
//!   inheritance, test and documentation edges
//! - [`emitter::RecordEmitter`] - validated records for a [`emitter::GraphSink`]
//! - [`pipeline::Pipeline`] - concurrent, cancellable run driver
//!
//! # Example
//!
//! ```ignore
//! use ontograph_core::knowledge::{JsonLinesSink, Pipeline};
//! use ontograph_core::Config;
//! use tokio_util::sync::CancellationToken;
//!
//! let pipeline = Pipeline::from_config(Config::load()?)?;
//! let sink = JsonLinesSink::to_file("graph.jsonl");
//! let output = pipeline
//!     .run_and_emit(".".as_ref(), "my-repo", &CancellationToken::new(), &sink)
//!     .await?;
//! println!("{} entities, {} edges", output.report.entities, output.report.edges);
//! ```

pub mod emitter;
mod error;
pub mod indexer;
pub mod models;
pub mod ontology;
pub mod parser;
pub mod pipeline;
pub mod resolver;

pub use emitter::{EmitError, GraphRecord, GraphSink, JsonLinesSink, MemorySink, RecordEmitter};
pub use error::RunError;
pub use models::{Entity, EntityKind, FileRecord, ParseStatus, RelationshipEdge, Resolution, SourceFile};
pub use ontology::{OntologyError, OntologyRegistry};
pub use parser::{GrammarCatalog, Language};
pub use pipeline::{FailureEvent, Pipeline, RunOutput, RunReport, Stage};
