//! Data models for the knowledge graph.

mod edge;
mod entity;
mod file;

pub use edge::{Ambiguity, ObservationKind, RawObservation, RelationshipEdge, Resolution, Span};
pub use entity::{entity_id, Entity, EntityKind};
pub use file::{file_id, FileRecord, ParseStatus, SourceFile};
