//! Query-driven extraction of entities and raw observations.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Range;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, QueryCursor, QueryMatch, Tree};

use super::scope::{module_path, ScopeStack};
use crate::knowledge::models::{
    entity_id, Entity, EntityKind, ObservationKind, RawObservation, SourceFile, Span,
};
use crate::knowledge::ontology::vocab;
use crate::knowledge::parser::{node_end_line, node_line, node_text, CompiledQuery, LanguageQueries};

/// Upper bound on in-flight matches per query, as tree-sitter counts them.
const MATCH_LIMIT: u32 = 10_000;

/// A capture that could not become an entity or observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionWarning {
    pub line: u32,
    pub kind: EntityKind,
    pub message: String,
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}: {}", self.line, self.kind, self.message)
    }
}

/// Everything extracted from one file.
#[derive(Debug, Default)]
pub struct Extraction {
    pub entities: Vec<Entity>,
    pub observations: Vec<RawObservation>,
    pub warnings: Vec<ExtractionWarning>,
}

/// One `@definition` capture of an entity kind.
#[derive(Debug, Clone)]
struct Definition {
    kind: EntityKind,
    range: Range<usize>,
    name_range: Option<Range<usize>>,
    start_line: u32,
    end_line: u32,
    name: String,
    owner: Option<String>,
}

/// One capture of an observation kind.
#[derive(Debug, Clone)]
struct Reference {
    kind: ObservationKind,
    /// Byte offset used to find the enclosing entity.
    anchor: usize,
    name_range: Option<Range<usize>>,
    span: Span,
    target: String,
    receiver: Option<String>,
    member: Option<String>,
    owner: Option<String>,
}

/// Runs a language's compiled queries over a syntax tree.
///
/// Extraction is a pure function of the file, the tree and the source text:
/// the same input always yields the same entities in the same order.
pub struct EntityExtractor<'a> {
    queries: &'a LanguageQueries,
}

impl<'a> EntityExtractor<'a> {
    pub fn new(queries: &'a LanguageQueries) -> Self {
        Self { queries }
    }

    pub fn extract(&self, file: &SourceFile, tree: &Tree, source: &str) -> Extraction {
        let mut warnings = Vec::new();
        let mut definitions = Vec::new();
        let mut references = Vec::new();
        let root = tree.root_node();

        for compiled in &self.queries.queries {
            let mut cursor = QueryCursor::new();
            cursor.set_match_limit(MATCH_LIMIT);
            {
                let mut matches = cursor.matches(&compiled.query, root, source.as_bytes());
                while let Some(m) = matches.next() {
                    match collect(compiled, m, source) {
                        Ok(Captured::Definition(def)) => definitions.push(def),
                        Ok(Captured::Reference(reference)) => references.push(reference),
                        Err(warning) => {
                            tracing::warn!(
                                path = %file.relative_path,
                                line = warning.line,
                                kind = %warning.kind,
                                "{}",
                                warning.message
                            );
                            warnings.push(warning);
                        }
                    }
                }
            }
            if cursor.did_exceed_match_limit() {
                tracing::warn!(
                    path = %file.relative_path,
                    kind = %compiled.kind,
                    pattern = compiled.index,
                    "Query exceeded the match limit, some captures were dropped"
                );
            }
        }

        let definitions = merge_definitions(definitions);
        let defined_names: HashSet<Range<usize>> = definitions
            .iter()
            .filter_map(|def| def.name_range.clone())
            .collect();
        references.retain(|r| {
            r.kind != ObservationKind::Call
                || r.name_range.as_ref().map_or(true, |range| !defined_names.contains(range))
        });

        let (entities, index_to_entity) = build_entities(file, source, &definitions);
        let observations = attach_references(file, &definitions, &entities, &index_to_entity, references);

        Extraction {
            entities,
            observations,
            warnings,
        }
    }
}

enum Captured {
    Definition(Definition),
    Reference(Reference),
}

fn capture<'t>(m: &QueryMatch<'_, 't>, slot: Option<u32>) -> Option<Node<'t>> {
    let slot = slot?;
    m.captures.iter().find(|c| c.index == slot).map(|c| c.node)
}

fn capture_text(m: &QueryMatch<'_, '_>, slot: Option<u32>, source: &str) -> Option<String> {
    capture(m, slot)
        .map(|node| node_text(&node, source).trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Name as it should appear in the graph; `None` when unusable.
fn clean_name(raw: &str) -> Option<String> {
    let name = raw.trim().trim_start_matches(':').trim();
    if name.is_empty() || name.chars().any(char::is_control) {
        None
    } else {
        Some(name.to_string())
    }
}

fn clean_path(raw: &str) -> Option<String> {
    let path = raw
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '`' | '<' | '>'))
        .trim();
    if path.is_empty() || path.chars().any(char::is_control) {
        None
    } else {
        Some(path.to_string())
    }
}

fn collect(compiled: &CompiledQuery, m: &QueryMatch<'_, '_>, source: &str) -> Result<Captured, ExtractionWarning> {
    let kind = compiled.kind;
    let name_node = capture(m, compiled.name);
    let anchor_node = match kind {
        EntityKind::ImportDeclaration => capture(m, compiled.definition).or(capture(m, compiled.path)),
        EntityKind::Inheritance => capture(m, compiled.supertype),
        _ => capture(m, compiled.definition).or(name_node),
    };
    let Some(anchor) = anchor_node else {
        return Err(ExtractionWarning {
            line: 0,
            kind,
            message: format!("pattern #{} matched without an anchor capture", compiled.index),
        });
    };
    let start_line = node_line(&anchor);
    let end_line = node_end_line(&anchor).max(start_line);
    let warning = |message: String| ExtractionWarning {
        line: start_line,
        kind,
        message,
    };
    let raw_name = || name_node.map(|node| node_text(&node, source)).unwrap_or("");

    let observation = match kind {
        EntityKind::CallSite => Some(ObservationKind::Call),
        EntityKind::ImportDeclaration => Some(ObservationKind::Import),
        EntityKind::Inheritance => Some(ObservationKind::Inheritance),
        _ => None,
    };

    if let Some(observation) = observation {
        let target = match observation {
            ObservationKind::Call => clean_name(raw_name()),
            ObservationKind::Import => capture(m, compiled.path).and_then(|n| clean_path(node_text(&n, source))),
            ObservationKind::Inheritance => clean_name(node_text(&anchor, source)),
        };
        let Some(target) = target else {
            return Err(warning(format!("discarded {kind} with an empty or unparsable reference")));
        };
        return Ok(Captured::Reference(Reference {
            kind: observation,
            anchor: anchor.start_byte(),
            name_range: name_node.map(|n| n.byte_range()),
            span: Span::new(start_line, end_line),
            target,
            receiver: capture_text(m, compiled.receiver, source),
            member: capture(m, compiled.member).and_then(|n| clean_name(node_text(&n, source))),
            owner: capture(m, compiled.owner).and_then(|n| clean_name(node_text(&n, source))),
        }));
    }

    let name = if kind == EntityKind::Comment {
        format!("comment_L{start_line}C{}", anchor.start_position().column + 1)
    } else {
        match clean_name(raw_name()) {
            Some(name) => name,
            None => {
                return Err(warning(format!(
                    "discarded {kind} with empty or unparsable name {:?}",
                    raw_name()
                )))
            }
        }
    };

    Ok(Captured::Definition(Definition {
        kind,
        range: anchor.byte_range(),
        name_range: name_node.map(|n| n.byte_range()),
        start_line,
        end_line,
        name,
        owner: capture(m, compiled.owner).and_then(|n| clean_name(node_text(&n, source))),
    }))
}

/// Union overlapping patterns: one definition per `(range, name)`, keeping
/// the kind declared first in [`EntityKind`] and preferring an owner capture.
/// The result is in document order, outer before inner.
fn merge_definitions(definitions: Vec<Definition>) -> Vec<Definition> {
    let mut merged: HashMap<(usize, usize, String), Definition> = HashMap::new();
    for def in definitions {
        let key = (def.range.start, def.range.end, def.name.clone());
        match merged.get_mut(&key) {
            Some(existing) => {
                if def.kind < existing.kind {
                    let owner = existing.owner.take();
                    *existing = def;
                    if existing.owner.is_none() {
                        existing.owner = owner;
                    }
                } else if existing.owner.is_none() && def.kind == existing.kind {
                    existing.owner = def.owner;
                }
            }
            None => {
                merged.insert(key, def);
            }
        }
    }

    let mut definitions: Vec<Definition> = merged.into_values().collect();
    definitions.sort_by(|a, b| {
        (a.range.start, Reverse(a.range.end), a.kind, &a.name).cmp(&(
            b.range.start,
            Reverse(b.range.end),
            b.kind,
            &b.name,
        ))
    });
    definitions
}

/// Lexical parents by scope, then `@owner` links for out-of-line members.
fn assign_parents(definitions: &[Definition]) -> Vec<Option<usize>> {
    let mut parents = vec![None; definitions.len()];
    let mut stack = ScopeStack::new();

    for (i, def) in definitions.iter().enumerate() {
        stack.enter(&def.range);
        parents[i] = if def.kind == EntityKind::AttributeDeclaration {
            stack
                .innermost_where(|p| definitions[p].kind.is_type())
                .or_else(|| stack.innermost())
        } else {
            stack.innermost()
        };
        if def.kind.is_container() {
            stack.push(i, def.range.clone());
        }
    }

    for (i, def) in definitions.iter().enumerate() {
        let Some(owner) = def.owner.as_deref() else { continue };
        if parents[i].is_some_and(|p| definitions[p].kind.is_type()) {
            continue;
        }
        let scope = parents[i];
        let candidates: Vec<usize> = definitions
            .iter()
            .enumerate()
            .filter(|(j, d)| *j != i && d.kind.is_type() && d.name == owner)
            .map(|(j, _)| j)
            .collect();
        let chosen = candidates
            .iter()
            .copied()
            .find(|j| parents[*j] == scope)
            .or_else(|| candidates.first().copied());
        if let Some(target) = chosen {
            if !is_ancestor(&parents, i, target) {
                parents[i] = Some(target);
            }
        }
    }

    parents
}

/// True when `ancestor` is `node` or on its parent chain.
fn is_ancestor(parents: &[Option<usize>], ancestor: usize, node: usize) -> bool {
    let mut current = Some(node);
    let mut steps = 0;
    while let Some(i) = current {
        if i == ancestor {
            return true;
        }
        steps += 1;
        if steps > parents.len() {
            return true;
        }
        current = parents[i];
    }
    false
}

fn build_entities(
    file: &SourceFile,
    source: &str,
    definitions: &[Definition],
) -> (Vec<Entity>, Vec<usize>) {
    let parents = assign_parents(definitions);
    let module = module_path(&file.relative_path);

    let classes: Vec<&'static str> = definitions
        .iter()
        .enumerate()
        .map(|(i, def)| {
            let typed_parent = parents[i].is_some_and(|p| definitions[p].kind.is_type());
            match def.kind {
                EntityKind::FunctionDefinition if typed_parent || def.owner.is_some() => {
                    vocab::METHOD_DEFINITION
                }
                kind => kind.ontology_class().unwrap_or(vocab::COMMENT),
            }
        })
        .collect();

    let canonical: Vec<String> = definitions
        .iter()
        .enumerate()
        .map(|(i, def)| {
            let mut segments = vec![def.name.as_str()];
            if let (Some(owner), None) = (def.owner.as_deref(), parents[i].filter(|p| definitions[*p].kind.is_type())) {
                segments.push(owner);
            }
            let mut current = parents[i];
            while let Some(p) = current {
                segments.push(definitions[p].name.as_str());
                current = parents[p];
            }
            if !module.is_empty() {
                segments.push(module.as_str());
            }
            segments.reverse();
            segments.join(".")
        })
        .collect();

    let ids: Vec<String> = definitions
        .iter()
        .enumerate()
        .map(|(i, def)| {
            entity_id(
                &file.repository_id,
                &file.relative_path,
                classes[i],
                &canonical[i],
                def.start_line,
            )
        })
        .collect();

    // Exact duplicates collapse onto the first occurrence.
    let mut first_by_id: HashMap<&str, usize> = HashMap::new();
    let mut index_to_entity = Vec::with_capacity(definitions.len());
    let mut entities: Vec<Entity> = Vec::new();
    for (i, def) in definitions.iter().enumerate() {
        if let Some(&existing) = first_by_id.get(ids[i].as_str()) {
            index_to_entity.push(existing);
            continue;
        }
        first_by_id.insert(ids[i].as_str(), entities.len());
        index_to_entity.push(entities.len());
        entities.push(Entity {
            id: ids[i].clone(),
            ontology_class: classes[i].to_string(),
            kind: def.kind,
            canonical_name: canonical[i].clone(),
            simple_name: def.name.clone(),
            file_id: file.id.clone(),
            file_path: file.relative_path.clone(),
            start_line: def.start_line,
            end_line: def.end_line,
            source_snippet: source.get(def.range.clone()).unwrap_or("").to_string(),
            parent_id: parents[i].map(|p| ids[p].clone()),
        });
    }

    (entities, index_to_entity)
}

/// Smallest definition accepted by `pred` whose range contains `offset`.
fn smallest_enclosing(
    definitions: &[Definition],
    offset: usize,
    pred: impl Fn(&Definition) -> bool,
) -> Option<usize> {
    definitions
        .iter()
        .enumerate()
        .filter(|(_, d)| pred(d) && d.range.start <= offset && offset < d.range.end)
        .min_by_key(|(i, d)| (d.range.end - d.range.start, Reverse(*i)))
        .map(|(i, _)| i)
}

fn attach_references(
    file: &SourceFile,
    definitions: &[Definition],
    entities: &[Entity],
    index_to_entity: &[usize],
    references: Vec<Reference>,
) -> Vec<RawObservation> {
    let entity_id_of = |i: usize| entities[index_to_entity[i]].id.clone();
    let mut observations = Vec::with_capacity(references.len());

    for reference in references {
        let source_id = match reference.kind {
            ObservationKind::Import => Some(file.id.clone()),
            ObservationKind::Call => Some(
                smallest_enclosing(definitions, reference.anchor, |d| d.kind.is_container())
                    .map(entity_id_of)
                    .unwrap_or_else(|| file.id.clone()),
            ),
            ObservationKind::Inheritance => match reference.owner.as_deref() {
                Some(owner) => definitions
                    .iter()
                    .position(|d| d.kind.is_type() && d.name == owner)
                    .map(entity_id_of),
                None => smallest_enclosing(definitions, reference.anchor, |d| {
                    d.kind.is_type() || d.kind == EntityKind::ModuleDefinition
                })
                .map(entity_id_of),
            },
        };
        let Some(source_id) = source_id else {
            tracing::debug!(
                path = %file.relative_path,
                target = %reference.target,
                "Inheritance without an enclosing type in this file"
            );
            continue;
        };

        observations.push(RawObservation {
            kind: reference.kind,
            source_id,
            file_id: file.id.clone(),
            target: reference.target,
            receiver: reference.receiver,
            member: reference.member,
            span: reference.span,
        });
    }

    observations.sort_by(|a, b| {
        (a.span, a.kind, &a.target, &a.source_id).cmp(&(b.span, b.kind, &b.target, &b.source_id))
    });
    observations.dedup();
    observations
}
