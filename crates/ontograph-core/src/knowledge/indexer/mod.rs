//! Entity extraction from parsed syntax trees.
//!
//! The extractor runs a language's compiled queries, turns definition
//! captures into [`Entity`](crate::knowledge::models::Entity) records with
//! lexical containment, and turns call, import and inheritance captures into
//! [`RawObservation`](crate::knowledge::models::RawObservation)s for the
//! resolver.

mod extractor;
mod scope;

pub use extractor::{EntityExtractor, Extraction, ExtractionWarning};
pub use scope::module_path;
