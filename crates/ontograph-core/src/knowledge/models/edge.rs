//! Relationships and the raw observations they are resolved from.

use serde::{Deserialize, Serialize};

/// Target of a relationship.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Id of an entity or file.
    Resolved(String),
    /// Reference text that matched nothing in the repository.
    Unresolved(String),
}

impl Resolution {
    pub fn resolved_id(&self) -> Option<&str> {
        match self {
            Resolution::Resolved(id) => Some(id),
            Resolution::Unresolved(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

/// Inclusive 1-based line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start_line: u32,
    pub end_line: u32,
}

impl Span {
    pub fn new(start_line: u32, end_line: u32) -> Self {
        Self {
            start_line,
            end_line,
        }
    }
}

/// A typed directed relationship. Edges have set semantics over
/// `(subject_id, predicate, object)`; `evidence` is informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub subject_id: String,
    /// Object property name.
    pub predicate: String,
    pub object: Resolution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Span>,
}

impl RelationshipEdge {
    pub fn key(&self) -> (&str, &str, &Resolution) {
        (&self.subject_id, &self.predicate, &self.object)
    }
}

/// What a raw observation records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationKind {
    Call,
    Import,
    Inheritance,
}

/// An unresolved reference found while walking a syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawObservation {
    pub kind: ObservationKind,
    /// Enclosing entity, or the file id at module level.
    pub source_id: String,
    pub file_id: String,
    /// Called name, import path or supertype name.
    pub target: String,
    /// Call receiver text (`self`, `obj`, `pkg.Type`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    /// Imported member (`from pkg import member`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    pub span: Span,
}

/// A reference that had more than one plausible target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ambiguity {
    pub subject_id: String,
    pub file_path: String,
    pub name: String,
    pub line: u32,
    pub candidates: usize,
    pub chosen: String,
}
