//! Ontology registry.
//!
//! The ontology is a closed vocabulary: four pairwise-disjoint sets of names
//! (classes, object properties, data properties and annotation properties).
//! It is loaded once per process from a JSON cache artifact and shared
//! read-only. The cache is derived offline from the Turtle source with
//! [`regenerate`].
//!
//! ## Modules
//!
//! - `vocab` - names the engine emits directly
//! - `regenerate` - Turtle to cache derivation and atomic replacement

mod regenerate;
pub mod vocab;

pub use regenerate::{derive_cache, regenerate, write_cache};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Vocabulary cache shipped with the crate.
pub const EMBEDDED_CACHE: &str = include_str!("../../../ontology/cache.json");

/// Authoritative ontology source shipped with the crate.
pub const EMBEDDED_SOURCE: &str = include_str!("../../../ontology/ontology.ttl");

/// Errors raised while loading or regenerating the vocabulary.
#[derive(Debug, Error)]
pub enum OntologyError {
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid ontology cache: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Term {term:?} is declared both as {first} and as {second}")]
    Overlap {
        term: String,
        first: TermKind,
        second: TermKind,
    },

    #[error("Empty term name in {0} set")]
    EmptyTerm(TermKind),

    #[error("Unknown {kind}: {name:?}")]
    Unknown { kind: TermKind, name: String },

    #[error("Ontology source defines no terms")]
    NoDefinitions,

    #[error("Invalid ontology source: {0}")]
    Source(String),
}

/// The four disjoint vocabularies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TermKind {
    Class,
    ObjectProperty,
    DataProperty,
    AnnotationProperty,
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TermKind::Class => "class",
            TermKind::ObjectProperty => "object property",
            TermKind::DataProperty => "data property",
            TermKind::AnnotationProperty => "annotation property",
        };
        f.write_str(name)
    }
}

/// On-disk shape of the vocabulary cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyCache {
    pub classes: BTreeSet<String>,
    pub object_properties: BTreeSet<String>,
    pub data_properties: BTreeSet<String>,
    pub annotation_properties: BTreeSet<String>,
}

impl OntologyCache {
    fn sets(&self) -> [(TermKind, &BTreeSet<String>); 4] {
        [
            (TermKind::Class, &self.classes),
            (TermKind::ObjectProperty, &self.object_properties),
            (TermKind::DataProperty, &self.data_properties),
            (TermKind::AnnotationProperty, &self.annotation_properties),
        ]
    }

    /// Total number of terms across all four sets.
    pub fn len(&self) -> usize {
        self.sets().iter().map(|(_, set)| set.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check that no name is empty and no name appears in two sets.
    pub fn validate(&self) -> Result<(), OntologyError> {
        let sets = self.sets();
        for (i, (kind, set)) in sets.iter().enumerate() {
            if set.iter().any(|term| term.trim().is_empty()) {
                return Err(OntologyError::EmptyTerm(*kind));
            }
            for (other_kind, other) in &sets[i + 1..] {
                if let Some(term) = set.intersection(other).next() {
                    return Err(OntologyError::Overlap {
                        term: term.clone(),
                        first: *kind,
                        second: *other_kind,
                    });
                }
            }
        }
        Ok(())
    }

    /// Serialize the cache in its canonical on-disk form.
    pub fn to_json(&self) -> Result<String, OntologyError> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

/// Read-only membership checks over the closed vocabulary.
#[derive(Debug, Clone)]
pub struct OntologyRegistry {
    cache: OntologyCache,
}

impl OntologyRegistry {
    /// Build a registry from an already-parsed cache.
    pub fn from_cache(cache: OntologyCache) -> Result<Self, OntologyError> {
        cache.validate()?;
        Ok(Self { cache })
    }

    /// Parse a JSON cache artifact.
    pub fn from_json(json: &str) -> Result<Self, OntologyError> {
        let cache: OntologyCache = serde_json::from_str(json)?;
        Self::from_cache(cache)
    }

    /// Load a JSON cache artifact from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, OntologyError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| OntologyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// The vocabulary built into the crate.
    pub fn embedded() -> Result<Self, OntologyError> {
        Self::from_json(EMBEDDED_CACHE)
    }

    /// Load from `path` when given, the embedded cache otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, OntologyError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::embedded(),
        }
    }

    pub fn is_known_class(&self, name: &str) -> bool {
        self.cache.classes.contains(name)
    }

    pub fn is_known_object_property(&self, name: &str) -> bool {
        self.cache.object_properties.contains(name)
    }

    pub fn is_known_data_property(&self, name: &str) -> bool {
        self.cache.data_properties.contains(name)
    }

    pub fn is_known_annotation_property(&self, name: &str) -> bool {
        self.cache.annotation_properties.contains(name)
    }

    /// True for any of the three property vocabularies.
    pub fn is_known_property(&self, name: &str) -> bool {
        self.is_known_object_property(name)
            || self.is_known_data_property(name)
            || self.is_known_annotation_property(name)
    }

    /// Which vocabulary a name belongs to, if any.
    pub fn term_kind(&self, name: &str) -> Option<TermKind> {
        self.cache
            .sets()
            .into_iter()
            .find(|(_, set)| set.contains(name))
            .map(|(kind, _)| kind)
    }

    /// Fail unless `name` is a known class.
    pub fn require_class(&self, name: &str) -> Result<(), OntologyError> {
        if self.is_known_class(name) {
            Ok(())
        } else {
            Err(OntologyError::Unknown {
                kind: TermKind::Class,
                name: name.to_string(),
            })
        }
    }

    /// Fail unless `name` is a known object property.
    pub fn require_object_property(&self, name: &str) -> Result<(), OntologyError> {
        if self.is_known_object_property(name) {
            Ok(())
        } else {
            Err(OntologyError::Unknown {
                kind: TermKind::ObjectProperty,
                name: name.to_string(),
            })
        }
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.cache.classes.iter().map(String::as_str)
    }

    pub fn object_properties(&self) -> impl Iterator<Item = &str> {
        self.cache.object_properties.iter().map(String::as_str)
    }

    pub fn data_properties(&self) -> impl Iterator<Item = &str> {
        self.cache.data_properties.iter().map(String::as_str)
    }

    pub fn annotation_properties(&self) -> impl Iterator<Item = &str> {
        self.cache.annotation_properties.iter().map(String::as_str)
    }

    pub fn cache(&self) -> &OntologyCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_registry_loads() {
        let registry = OntologyRegistry::embedded().unwrap();
        assert!(registry.is_known_class("SourceCodeFile"));
        assert!(registry.is_known_class("Readme"));
        assert!(registry.is_known_object_property("callsFunction"));
        assert!(registry.is_known_data_property("startLine"));
        assert!(registry.is_known_annotation_property("label"));
    }

    #[test]
    fn test_unknown_names_rejected() {
        let registry = OntologyRegistry::embedded().unwrap();
        assert!(!registry.is_known_class("Spaceship"));
        assert!(!registry.is_known_property("Readme"));
        assert!(!registry.is_known_class("callsFunction"));
        assert!(registry.require_class("Spaceship").is_err());
    }

    #[test]
    fn test_vocab_terms_are_known() {
        let registry = OntologyRegistry::embedded().unwrap();
        for class in vocab::CONSTRUCT_CLASSES {
            assert!(registry.is_known_class(class), "missing class {}", class);
        }
        for property in vocab::EMITTED_OBJECT_PROPERTIES {
            assert!(
                registry.is_known_object_property(property),
                "missing property {}",
                property
            );
        }
        for property in [
            vocab::CANONICAL_NAME,
            vocab::SIMPLE_NAME,
            vocab::START_LINE,
            vocab::END_LINE,
            vocab::SOURCE_SNIPPET,
            vocab::RELATIVE_PATH,
            vocab::PROGRAMMING_LANGUAGE,
            vocab::FILE_SIZE,
            vocab::CONTENT_CLASS,
            vocab::PARSE_STATUS,
            vocab::REPOSITORY_ID,
            vocab::RAW_REFERENCE,
            vocab::EVIDENCE_START_LINE,
            vocab::EVIDENCE_END_LINE,
        ] {
            assert!(registry.is_known_data_property(property), "missing {}", property);
        }
        assert!(registry.is_known_class(vocab::TEST_CODE));
        assert!(registry.is_known_annotation_property(vocab::LABEL));
    }

    #[test]
    fn test_overlapping_sets_rejected() {
        let json = r#"{
            "classes": ["Thing"],
            "object_properties": ["Thing"],
            "data_properties": [],
            "annotation_properties": []
        }"#;
        let err = OntologyRegistry::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            OntologyError::Overlap {
                first: TermKind::Class,
                second: TermKind::ObjectProperty,
                ..
            }
        ));
    }

    #[test]
    fn test_term_kind() {
        let registry = OntologyRegistry::embedded().unwrap();
        assert_eq!(registry.term_kind("Comment"), Some(TermKind::Class));
        assert_eq!(registry.term_kind("imports"), Some(TermKind::ObjectProperty));
        assert_eq!(registry.term_kind("fileSize"), Some(TermKind::DataProperty));
        assert_eq!(registry.term_kind("nope"), None);
    }

    #[test]
    fn test_malformed_cache_is_error() {
        assert!(OntologyRegistry::from_json("{ not json").is_err());
        assert!(OntologyRegistry::from_json(r#"{"classes": [""]}"#).is_err());
    }
}
