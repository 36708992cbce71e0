//! Graph emission.
//!
//! Maps a run's files, entities and edges to ontology-typed records and
//! hands the batch to a [`GraphSink`]. Every class and property name is
//! checked against the [`OntologyRegistry`] first; a record that uses a name
//! outside the vocabulary, or an edge whose endpoints were not emitted, is
//! dropped and reported as an `emit` failure.

mod jsonl;

pub use jsonl::{JsonLinesSink, MemorySink};

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::knowledge::models::{Entity, FileRecord, RelationshipEdge, Resolution};
use crate::knowledge::ontology::{vocab, OntologyRegistry};
use crate::knowledge::pipeline::{FailureEvent, Stage};

/// Errors raised by a sink.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EmitError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EmitError::Io {
            path: path.into(),
            source,
        }
    }
}

/// One output record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "lowercase")]
pub enum GraphRecord {
    Node {
        id: String,
        class: String,
        properties: BTreeMap<String, Value>,
    },
    Edge {
        subject: String,
        predicate: String,
        /// Target id, or the raw reference text when unresolved.
        object: String,
        resolved: bool,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        properties: BTreeMap<String, Value>,
    },
}

impl GraphRecord {
    pub fn is_node(&self) -> bool {
        matches!(self, GraphRecord::Node { .. })
    }

    pub fn is_edge(&self) -> bool {
        matches!(self, GraphRecord::Edge { .. })
    }

    /// Class of a node, predicate of an edge.
    pub fn term(&self) -> &str {
        match self {
            GraphRecord::Node { class, .. } => class,
            GraphRecord::Edge { predicate, .. } => predicate,
        }
    }
}

/// Receives the records of one completed run.
#[async_trait]
pub trait GraphSink: Send + Sync {
    /// Write a full batch. Returns the number of records written.
    async fn write_batch(&self, records: &[GraphRecord]) -> Result<usize, EmitError>;
}

/// Validated records plus the ones that were dropped.
#[derive(Debug, Default)]
pub struct EmitBatch {
    /// Files first, then entities, then edges.
    pub records: Vec<GraphRecord>,
    pub failures: Vec<FailureEvent>,
}

impl EmitBatch {
    pub fn nodes(&self) -> impl Iterator<Item = &GraphRecord> {
        self.records.iter().filter(|r| r.is_node())
    }

    pub fn edges(&self) -> impl Iterator<Item = &GraphRecord> {
        self.records.iter().filter(|r| r.is_edge())
    }
}

/// Builds and validates records.
#[derive(Debug, Clone)]
pub struct RecordEmitter {
    registry: Arc<OntologyRegistry>,
}

impl RecordEmitter {
    pub fn new(registry: Arc<OntologyRegistry>) -> Self {
        Self { registry }
    }

    /// Map a run's output to records. Input order is kept within each group.
    pub fn build(&self, files: &[FileRecord], entities: &[Entity], edges: &[RelationshipEdge]) -> EmitBatch {
        let mut batch = EmitBatch::default();
        let mut emitted: HashSet<&str> = HashSet::with_capacity(files.len() + entities.len());
        let mut paths: HashMap<&str, &str> = HashMap::with_capacity(files.len() + entities.len());

        for record in files {
            let file = &record.file;
            paths.insert(&file.id, &file.relative_path);
            let node = file_node(record);
            match self.check(&node) {
                Ok(()) => {
                    emitted.insert(&file.id);
                    batch.records.push(node);
                }
                Err(reason) => batch.reject(&file.relative_path, reason),
            }
        }

        for entity in entities {
            paths.insert(&entity.id, &entity.file_path);
            let node = entity_node(entity);
            match self.check(&node) {
                Ok(()) => {
                    emitted.insert(&entity.id);
                    batch.records.push(node);
                }
                Err(reason) => batch.reject(&entity.file_path, reason),
            }
        }

        for edge in edges {
            let path = paths.get(edge.subject_id.as_str()).copied().unwrap_or(edge.subject_id.as_str());
            if !emitted.contains(edge.subject_id.as_str()) {
                batch.reject(path, format!("edge {} has no subject node {}", edge.predicate, edge.subject_id));
                continue;
            }
            if let Some(target) = edge.object.resolved_id() {
                if !emitted.contains(target) {
                    batch.reject(path, format!("edge {} has no object node {}", edge.predicate, target));
                    continue;
                }
            }
            let record = edge_record(edge);
            match self.check(&record) {
                Ok(()) => batch.records.push(record),
                Err(reason) => batch.reject(path, reason),
            }
        }

        batch
    }

    /// Check every vocabulary name a record uses.
    pub fn check(&self, record: &GraphRecord) -> Result<(), String> {
        let properties = match record {
            GraphRecord::Node { class, properties, .. } => {
                if !self.registry.is_known_class(class) {
                    return Err(format!("unknown class {}", class));
                }
                properties
            }
            GraphRecord::Edge {
                predicate, properties, ..
            } => {
                if !self.registry.is_known_object_property(predicate) {
                    return Err(format!("unknown object property {}", predicate));
                }
                properties
            }
        };

        for name in properties.keys() {
            if !(self.registry.is_known_data_property(name) || self.registry.is_known_annotation_property(name)) {
                return Err(format!("unknown property {}", name));
            }
        }

        if let GraphRecord::Node { properties, .. } = record {
            if let Some(Value::String(content)) = properties.get(vocab::CONTENT_CLASS) {
                if !self.registry.is_known_class(content) {
                    return Err(format!("unknown content class {}", content));
                }
            }
        }
        Ok(())
    }

    /// Build, validate and write. Dropped records come back as failures.
    pub async fn emit(
        &self,
        files: &[FileRecord],
        entities: &[Entity],
        edges: &[RelationshipEdge],
        sink: &dyn GraphSink,
    ) -> Result<EmitSummary, EmitError> {
        let batch = self.build(files, entities, edges);
        let written = sink.write_batch(&batch.records).await?;
        tracing::debug!(
            written,
            dropped = batch.failures.len(),
            "Emitted graph records"
        );
        Ok(EmitSummary {
            written,
            failures: batch.failures,
        })
    }
}

/// Outcome of [`RecordEmitter::emit`].
#[derive(Debug, Default)]
pub struct EmitSummary {
    pub written: usize,
    pub failures: Vec<FailureEvent>,
}

impl EmitBatch {
    fn reject(&mut self, path: &str, reason: String) {
        tracing::warn!(path, "Dropped record: {}", reason);
        self.failures.push(FailureEvent::new(path, Stage::Emit, reason));
    }
}

fn file_node(record: &FileRecord) -> GraphRecord {
    let file = &record.file;
    let mut properties = BTreeMap::new();
    properties.insert(vocab::RELATIVE_PATH.to_string(), Value::from(file.relative_path.as_str()));
    properties.insert(vocab::REPOSITORY_ID.to_string(), Value::from(file.repository_id.as_str()));
    properties.insert(vocab::FILE_SIZE.to_string(), Value::from(file.size));
    properties.insert(vocab::CONTENT_CLASS.to_string(), Value::from(file.class_content.as_str()));
    properties.insert(vocab::PARSE_STATUS.to_string(), Value::from(record.status.as_str()));
    properties.insert(vocab::LABEL.to_string(), Value::from(file.file_name()));
    if let Some(language) = file.language {
        properties.insert(vocab::PROGRAMMING_LANGUAGE.to_string(), Value::from(language.name()));
    }
    GraphRecord::Node {
        id: file.id.clone(),
        class: file.class_carrier.clone(),
        properties,
    }
}

fn entity_node(entity: &Entity) -> GraphRecord {
    let mut properties = BTreeMap::new();
    properties.insert(vocab::CANONICAL_NAME.to_string(), Value::from(entity.canonical_name.as_str()));
    properties.insert(vocab::SIMPLE_NAME.to_string(), Value::from(entity.simple_name.as_str()));
    properties.insert(vocab::START_LINE.to_string(), Value::from(entity.start_line));
    properties.insert(vocab::END_LINE.to_string(), Value::from(entity.end_line));
    properties.insert(vocab::SOURCE_SNIPPET.to_string(), Value::from(entity.source_snippet.as_str()));
    properties.insert(vocab::RELATIVE_PATH.to_string(), Value::from(entity.file_path.as_str()));
    properties.insert(vocab::LABEL.to_string(), Value::from(entity.simple_name.as_str()));
    GraphRecord::Node {
        id: entity.id.clone(),
        class: entity.ontology_class.clone(),
        properties,
    }
}

fn edge_record(edge: &RelationshipEdge) -> GraphRecord {
    let mut properties = BTreeMap::new();
    if let Some(span) = edge.evidence {
        properties.insert(vocab::EVIDENCE_START_LINE.to_string(), Value::from(span.start_line));
        properties.insert(vocab::EVIDENCE_END_LINE.to_string(), Value::from(span.end_line));
    }
    let (object, resolved) = match &edge.object {
        Resolution::Resolved(id) => (id.clone(), true),
        Resolution::Unresolved(raw) => {
            properties.insert(vocab::RAW_REFERENCE.to_string(), Value::from(raw.as_str()));
            (raw.clone(), false)
        }
    };
    GraphRecord::Edge {
        subject: edge.subject_id.clone(),
        predicate: edge.predicate.clone(),
        object,
        resolved,
        properties,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::models::{entity_id, EntityKind, ParseStatus, SourceFile, Span};
    use crate::knowledge::parser::Language;
    use pretty_assertions::assert_eq;

    fn emitter() -> RecordEmitter {
        RecordEmitter::new(Arc::new(OntologyRegistry::embedded().unwrap()))
    }

    fn file() -> FileRecord {
        FileRecord {
            file: SourceFile::new("repo", "src/app.py", Some(Language::Python), 42, "SourceCodeFile", "PythonCode"),
            status: ParseStatus::Parsed,
        }
    }

    fn function(file: &SourceFile, class: &str, name: &str) -> Entity {
        let canonical = format!("src.app.{name}");
        Entity {
            id: entity_id("repo", &file.relative_path, class, &canonical, 1),
            ontology_class: class.to_string(),
            kind: EntityKind::FunctionDefinition,
            canonical_name: canonical,
            simple_name: name.to_string(),
            file_id: file.id.clone(),
            file_path: file.relative_path.clone(),
            start_line: 1,
            end_line: 2,
            source_snippet: format!("def {name}():\n    pass"),
            parent_id: None,
        }
    }

    #[test]
    fn test_file_and_entity_nodes() {
        let record = file();
        let entity = function(&record.file, "FunctionDefinition", "main");
        let edge = RelationshipEdge {
            subject_id: record.file.id.clone(),
            predicate: "declares".to_string(),
            object: Resolution::Resolved(entity.id.clone()),
            evidence: Some(Span::new(1, 2)),
        };
        let batch = emitter().build(&[record.clone()], &[entity.clone()], &[edge]);
        assert!(batch.failures.is_empty());
        assert_eq!(batch.records.len(), 3);

        match &batch.records[0] {
            GraphRecord::Node { id, class, properties } => {
                assert_eq!(id, &record.file.id);
                assert_eq!(class, "SourceCodeFile");
                assert_eq!(properties["contentClass"], "PythonCode");
                assert_eq!(properties["parseStatus"], "parsed");
                assert_eq!(properties["programmingLanguage"], "Python");
            }
            other => panic!("expected a node, got {:?}", other),
        }
        match &batch.records[2] {
            GraphRecord::Edge {
                object,
                resolved,
                properties,
                ..
            } => {
                assert_eq!(object, &entity.id);
                assert!(resolved);
                assert_eq!(properties["evidenceStartLine"], 1);
            }
            other => panic!("expected an edge, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_class_is_dropped() {
        let record = file();
        let bogus = function(&record.file, "Gadget", "main");
        let edge = RelationshipEdge {
            subject_id: record.file.id.clone(),
            predicate: "declares".to_string(),
            object: Resolution::Resolved(bogus.id.clone()),
            evidence: None,
        };
        let batch = emitter().build(&[record], &[bogus], &[edge]);
        assert_eq!(batch.nodes().count(), 1);
        assert_eq!(batch.edges().count(), 0);
        assert_eq!(batch.failures.len(), 2);
        assert!(batch.failures.iter().all(|f| f.stage == Stage::Emit));
        assert!(batch.failures[0].reason.contains("Gadget"));
    }

    #[test]
    fn test_unknown_predicate_is_dropped() {
        let record = file();
        let edge = RelationshipEdge {
            subject_id: record.file.id.clone(),
            predicate: "dependsOnMagic".to_string(),
            object: Resolution::Unresolved("numpy".to_string()),
            evidence: None,
        };
        let batch = emitter().build(&[record], &[], &[edge]);
        assert_eq!(batch.edges().count(), 0);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].path, "src/app.py");
    }

    #[test]
    fn test_unresolved_import_keeps_raw_text() {
        let record = file();
        let edge = RelationshipEdge {
            subject_id: record.file.id.clone(),
            predicate: "imports".to_string(),
            object: Resolution::Unresolved("numpy".to_string()),
            evidence: Some(Span::new(1, 1)),
        };
        let batch = emitter().build(&[record], &[], &[edge]);
        let edge = batch.edges().next().unwrap();
        match edge {
            GraphRecord::Edge {
                object,
                resolved,
                properties,
                ..
            } => {
                assert_eq!(object, "numpy");
                assert!(!resolved);
                assert_eq!(properties["rawReference"], "numpy");
            }
            other => panic!("expected an edge, got {:?}", other),
        }
    }

    #[test]
    fn test_record_json_shape() {
        let record = GraphRecord::Edge {
            subject: "a".to_string(),
            predicate: "imports".to_string(),
            object: "b".to_string(),
            resolved: true,
            properties: BTreeMap::new(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["record"], "edge");
        assert!(json.get("properties").is_none());
        let back: GraphRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[tokio::test]
    async fn test_emit_to_memory_sink() {
        let record = file();
        let sink = MemorySink::new();
        let summary = emitter().emit(&[record], &[], &[], &sink).await.unwrap();
        assert_eq!(summary.written, 1);
        assert_eq!(sink.records().len(), 1);
    }
}
