//! Name indexes over a run's entities and the candidate selection policy.

use std::collections::HashMap;

use crate::knowledge::models::{Entity, EntityKind};

/// Receivers that refer to the enclosing type.
const SELF_RECEIVERS: &[&str] = &["self", "this", "cls", "Self", "@", "__MODULE__"];

/// Where a reference was found.
#[derive(Debug, Clone, Copy)]
pub struct Site<'a> {
    pub file_id: &'a str,
    pub line: u32,
    pub receiver: Option<&'a str>,
    /// Simple name of the type enclosing the reference, if any.
    pub enclosing_type: Option<&'a str>,
}

/// Outcome of choosing among same-named candidates.
#[derive(Debug, Clone, Copy)]
pub struct Choice<'e> {
    pub entity: &'e Entity,
    /// Candidates left after the same-file and receiver filters.
    pub remaining: usize,
}

impl Choice<'_> {
    pub fn is_ambiguous(&self) -> bool {
        self.remaining > 1
    }
}

/// Lookup tables built once per run.
pub struct SymbolIndex<'e> {
    by_id: HashMap<&'e str, &'e Entity>,
    callables: HashMap<&'e str, Vec<&'e Entity>>,
    functions: HashMap<&'e str, Vec<&'e Entity>>,
    types: HashMap<&'e str, Vec<&'e Entity>>,
}

impl<'e> SymbolIndex<'e> {
    pub fn new(entities: &'e [Entity]) -> Self {
        let mut index = Self {
            by_id: HashMap::with_capacity(entities.len()),
            callables: HashMap::new(),
            functions: HashMap::new(),
            types: HashMap::new(),
        };
        for entity in entities {
            index.by_id.insert(entity.id.as_str(), entity);
            let name = entity.simple_name.as_str();
            if entity.is_callable() {
                index.callables.entry(name).or_default().push(entity);
            }
            if entity.is_function() {
                index.functions.entry(name).or_default().push(entity);
            }
            if entity.kind.is_type() || entity.kind == EntityKind::ModuleDefinition {
                index.types.entry(name).or_default().push(entity);
            }
        }
        for list in index
            .callables
            .values_mut()
            .chain(index.functions.values_mut())
            .chain(index.types.values_mut())
        {
            list.sort_by(|a, b| (&a.file_path, a.start_line, &a.id).cmp(&(&b.file_path, b.start_line, &b.id)));
        }
        index
    }

    pub fn get(&self, id: &str) -> Option<&'e Entity> {
        self.by_id.get(id).copied()
    }

    /// Functions, methods and classes named `name`.
    pub fn callables(&self, name: &str) -> &[&'e Entity] {
        self.callables.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Functions and methods named `name`.
    pub fn functions(&self, name: &str) -> &[&'e Entity] {
        self.functions.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Type-like definitions and modules named `name`.
    pub fn types(&self, name: &str) -> &[&'e Entity] {
        self.types.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Simple name of the nearest type enclosing `id`, the entity itself
    /// included.
    pub fn enclosing_type(&self, id: &str) -> Option<&'e str> {
        let mut current = self.get(id);
        let mut depth = 0;
        while let Some(entity) = current {
            if entity.kind.is_type() {
                return Some(entity.simple_name.as_str());
            }
            depth += 1;
            if depth > self.by_id.len() {
                return None;
            }
            current = entity.parent_id.as_deref().and_then(|p| self.get(p));
        }
        None
    }

    fn parent_name(&self, entity: &Entity) -> Option<&'e str> {
        entity
            .parent_id
            .as_deref()
            .and_then(|p| self.get(p))
            .map(|parent| parent.simple_name.as_str())
    }

    /// Pick one of `candidates` for a reference at `site`.
    ///
    /// Same-file candidates win over the rest of the repository. Among those,
    /// candidates declared in the receiver's type are preferred. The closest
    /// by line in the same file, or the first by path and line elsewhere,
    /// breaks the remaining tie.
    pub fn choose(&self, candidates: &[&'e Entity], site: Site<'_>) -> Option<Choice<'e>> {
        if candidates.is_empty() {
            return None;
        }

        let same_file: Vec<&'e Entity> = candidates
            .iter()
            .copied()
            .filter(|c| c.file_id == site.file_id)
            .collect();
        let local = !same_file.is_empty();
        let mut pool = if local { same_file } else { candidates.to_vec() };

        if let Some(expected) = receiver_type(site.receiver, site.enclosing_type) {
            let matching: Vec<&'e Entity> = pool
                .iter()
                .copied()
                .filter(|c| self.parent_name(c) == Some(expected) || c.simple_name == expected)
                .collect();
            if !matching.is_empty() {
                pool = matching;
            }
        }

        let remaining = pool.len();
        let entity = if local {
            pool.into_iter()
                .min_by_key(|c| (c.start_line.abs_diff(site.line), c.start_line))?
        } else {
            pool.into_iter().next()?
        };
        Some(Choice { entity, remaining })
    }
}

/// Type name a call receiver points at.
///
/// Self-references map to the enclosing type; anything else to its last
/// path segment (`pkg.Client` and `pkg::Client` give `Client`).
pub fn receiver_type<'a>(receiver: Option<&'a str>, enclosing_type: Option<&'a str>) -> Option<&'a str> {
    let receiver = receiver?.trim();
    if SELF_RECEIVERS.contains(&receiver) {
        return enclosing_type;
    }
    let last = receiver
        .rsplit(|c: char| c == '.' || c == ':' || c == '>')
        .find(|segment| !segment.is_empty())?;
    let last = last.trim_matches(|c: char| !(c.is_alphanumeric() || c == '_'));
    if last.is_empty() {
        None
    } else {
        Some(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::models::entity_id;

    fn entity(file: &str, class: &str, kind: EntityKind, name: &str, line: u32, parent: Option<&Entity>) -> Entity {
        let canonical = format!("{file}.{name}");
        Entity {
            id: entity_id("r", file, class, &canonical, line),
            ontology_class: class.to_string(),
            kind,
            canonical_name: canonical,
            simple_name: name.to_string(),
            file_id: format!("file:{file}"),
            file_path: file.to_string(),
            start_line: line,
            end_line: line + 1,
            source_snippet: String::new(),
            parent_id: parent.map(|p| p.id.clone()),
        }
    }

    #[test]
    fn test_receiver_type() {
        assert_eq!(receiver_type(Some("self"), Some("Greeter")), Some("Greeter"));
        assert_eq!(receiver_type(Some("this"), None), None);
        assert_eq!(receiver_type(Some("pkg.Client"), None), Some("Client"));
        assert_eq!(receiver_type(Some("crate::net::Client"), None), Some("Client"));
        assert_eq!(receiver_type(Some("obj->inner"), None), Some("inner"));
        assert_eq!(receiver_type(None, Some("Greeter")), None);
    }

    #[test]
    fn test_same_file_wins() {
        let local = entity("a.py", "FunctionDefinition", EntityKind::FunctionDefinition, "run", 10, None);
        let remote = entity("b.py", "FunctionDefinition", EntityKind::FunctionDefinition, "run", 1, None);
        let entities = vec![remote, local];
        let index = SymbolIndex::new(&entities);
        let site = Site {
            file_id: "file:a.py",
            line: 50,
            receiver: None,
            enclosing_type: None,
        };
        let choice = index.choose(index.callables("run"), site).unwrap();
        assert_eq!(choice.entity.file_path, "a.py");
        assert!(!choice.is_ambiguous());
    }

    #[test]
    fn test_receiver_then_nearest() {
        let a = entity("m.py", "ClassDefinition", EntityKind::ClassDefinition, "A", 1, None);
        let b = entity("m.py", "ClassDefinition", EntityKind::ClassDefinition, "B", 20, None);
        let a_run = entity("m.py", "MethodDefinition", EntityKind::FunctionDefinition, "run", 2, Some(&a));
        let b_run = entity("m.py", "MethodDefinition", EntityKind::FunctionDefinition, "run", 21, Some(&b));
        let entities = vec![a, b, a_run, b_run];
        let index = SymbolIndex::new(&entities);

        let by_receiver = Site {
            file_id: "file:m.py",
            line: 22,
            receiver: Some("A"),
            enclosing_type: None,
        };
        let choice = index.choose(index.callables("run"), by_receiver).unwrap();
        assert_eq!(choice.entity.start_line, 2);

        let by_distance = Site {
            receiver: None,
            ..by_receiver
        };
        let choice = index.choose(index.callables("run"), by_distance).unwrap();
        assert_eq!(choice.entity.start_line, 21);
        assert!(choice.is_ambiguous());
    }

    #[test]
    fn test_cross_file_choice_is_lexicographic() {
        let z = entity("z.py", "FunctionDefinition", EntityKind::FunctionDefinition, "load", 1, None);
        let a = entity("a.py", "FunctionDefinition", EntityKind::FunctionDefinition, "load", 9, None);
        let entities = vec![z, a];
        let index = SymbolIndex::new(&entities);
        let site = Site {
            file_id: "file:main.py",
            line: 1,
            receiver: None,
            enclosing_type: None,
        };
        let choice = index.choose(index.callables("load"), site).unwrap();
        assert_eq!(choice.entity.file_path, "a.py");
        assert_eq!(choice.remaining, 2);
    }

    #[test]
    fn test_enclosing_type() {
        let class = entity("m.py", "ClassDefinition", EntityKind::ClassDefinition, "A", 1, None);
        let method = entity("m.py", "MethodDefinition", EntityKind::FunctionDefinition, "f", 2, Some(&class));
        let method_id = method.id.clone();
        let entities = vec![class, method];
        let index = SymbolIndex::new(&entities);
        assert_eq!(index.enclosing_type(&method_id), Some("A"));
        assert_eq!(index.enclosing_type("file:m.py"), None);
    }
}
