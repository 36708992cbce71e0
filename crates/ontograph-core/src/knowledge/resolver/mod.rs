//! Relationship resolution.
//!
//! Runs once all files of a run are extracted. Turns lexical containment and
//! the extractor's raw call, import and inheritance observations into typed
//! [`RelationshipEdge`]s, and derives test and documentation links from
//! names and positions.
//!
//! Edges have set semantics: one edge per `(subject, predicate, object)`,
//! carrying the earliest evidence span seen for it.

mod imports;
mod index;

pub use imports::ImportResolver;
pub use index::{receiver_type, Choice, Site, SymbolIndex};

use std::collections::{BTreeMap, HashMap};

use crate::knowledge::models::{
    Ambiguity, Entity, EntityKind, ObservationKind, RawObservation, RelationshipEdge, Resolution, SourceFile, Span,
};
use crate::knowledge::ontology::vocab;

/// Edges and recorded ambiguities of one run.
#[derive(Debug, Default)]
pub struct ResolveOutput {
    /// Sorted by `(subject, predicate, object)`.
    pub edges: Vec<RelationshipEdge>,
    pub ambiguities: Vec<Ambiguity>,
}

/// Builds the relationship edges of a run.
pub struct RelationshipResolver<'a> {
    files: HashMap<&'a str, &'a SourceFile>,
    entities: &'a [Entity],
    symbols: SymbolIndex<'a>,
    imports: ImportResolver<'a>,
}

#[derive(Default)]
struct EdgeSet {
    edges: BTreeMap<(String, String, Resolution), Option<Span>>,
}

impl EdgeSet {
    fn insert(&mut self, subject: &str, predicate: &str, object: Resolution, evidence: Option<Span>) {
        let key = (subject.to_string(), predicate.to_string(), object);
        match self.edges.get_mut(&key) {
            Some(existing) => {
                if evidence.is_some() && (existing.is_none() || evidence < *existing) {
                    *existing = evidence;
                }
            }
            None => {
                self.edges.insert(key, evidence);
            }
        }
    }

    fn into_edges(self) -> Vec<RelationshipEdge> {
        self.edges
            .into_iter()
            .map(|((subject_id, predicate, object), evidence)| RelationshipEdge {
                subject_id,
                predicate,
                object,
                evidence,
            })
            .collect()
    }
}

impl<'a> RelationshipResolver<'a> {
    pub fn new(files: &'a [SourceFile], entities: &'a [Entity]) -> Self {
        Self {
            files: files.iter().map(|f| (f.id.as_str(), f)).collect(),
            entities,
            symbols: SymbolIndex::new(entities),
            imports: ImportResolver::new(files),
        }
    }

    pub fn resolve(&self, observations: &[RawObservation]) -> ResolveOutput {
        let mut edges = EdgeSet::default();
        let mut ambiguities = Vec::new();

        self.containment(&mut edges);
        for observation in observations {
            match observation.kind {
                ObservationKind::Call => self.call(observation, &mut edges, &mut ambiguities),
                ObservationKind::Import => self.import(observation, &mut edges),
                ObservationKind::Inheritance => self.inheritance(observation, &mut edges, &mut ambiguities),
            }
        }
        self.tests(&mut edges, &mut ambiguities);
        self.documentation(&mut edges);

        ambiguities.sort_by(|a, b| (&a.file_path, a.line, &a.name).cmp(&(&b.file_path, b.line, &b.name)));
        let edges = edges.into_edges();
        tracing::debug!(
            edges = edges.len(),
            ambiguities = ambiguities.len(),
            "Resolved relationships"
        );
        ResolveOutput { edges, ambiguities }
    }

    /// `declares`/`hasField`/`hasMethod`/`hasParameter` from parents, and
    /// `isDeclaredIn` from every entity to its file.
    fn containment(&self, edges: &mut EdgeSet) {
        for entity in self.entities {
            let span = Some(Span::new(entity.start_line, entity.end_line));
            edges.insert(
                &entity.id,
                vocab::IS_DECLARED_IN,
                Resolution::Resolved(entity.file_id.clone()),
                span,
            );

            let parent = entity.parent_id.as_deref().and_then(|p| self.symbols.get(p));
            let (subject, predicate) = match parent {
                None => (entity.file_id.as_str(), vocab::DECLARES),
                Some(parent) => (parent.id.as_str(), containment_predicate(parent, entity)),
            };
            edges.insert(subject, predicate, Resolution::Resolved(entity.id.clone()), span);
        }
    }

    fn site<'o>(&self, observation: &'o RawObservation) -> Site<'o>
    where
        'a: 'o,
    {
        Site {
            file_id: &observation.file_id,
            line: observation.span.start_line,
            receiver: observation.receiver.as_deref(),
            enclosing_type: self.symbols.enclosing_type(&observation.source_id),
        }
    }

    fn record(
        &self,
        ambiguities: &mut Vec<Ambiguity>,
        subject_id: &str,
        observation_file: &str,
        name: &str,
        line: u32,
        choice: &Choice<'_>,
    ) {
        if !choice.is_ambiguous() {
            return;
        }
        let file_path = self
            .files
            .get(observation_file)
            .map(|f| f.relative_path.clone())
            .unwrap_or_default();
        tracing::debug!(
            path = %file_path,
            line,
            name,
            candidates = choice.remaining,
            chosen = %choice.entity.canonical_name,
            "Ambiguous reference"
        );
        ambiguities.push(Ambiguity {
            subject_id: subject_id.to_string(),
            file_path,
            name: name.to_string(),
            line,
            candidates: choice.remaining,
            chosen: choice.entity.id.clone(),
        });
    }

    fn call(&self, observation: &RawObservation, edges: &mut EdgeSet, ambiguities: &mut Vec<Ambiguity>) {
        let candidates = self.symbols.callables(&observation.target);
        let Some(choice) = self.symbols.choose(candidates, self.site(observation)) else {
            return;
        };
        self.record(
            ambiguities,
            &observation.source_id,
            &observation.file_id,
            &observation.target,
            observation.span.start_line,
            &choice,
        );
        let predicate = if choice.entity.ontology_class == vocab::CLASS_DEFINITION {
            vocab::INSTANTIATES
        } else {
            vocab::CALLS_FUNCTION
        };
        edges.insert(
            &observation.source_id,
            predicate,
            Resolution::Resolved(choice.entity.id.clone()),
            Some(observation.span),
        );
    }

    fn import(&self, observation: &RawObservation, edges: &mut EdgeSet) {
        let Some(importer) = self.files.get(observation.file_id.as_str()) else {
            return;
        };
        let object = match self
            .imports
            .resolve(importer, &observation.target, observation.member.as_deref())
        {
            Some(file) => Resolution::Resolved(file.id.clone()),
            None => Resolution::Unresolved(observation.target.clone()),
        };
        edges.insert(&observation.source_id, vocab::IMPORTS, object, Some(observation.span));
    }

    fn inheritance(&self, observation: &RawObservation, edges: &mut EdgeSet, ambiguities: &mut Vec<Ambiguity>) {
        let candidates: Vec<&Entity> = self
            .symbols
            .types(&observation.target)
            .iter()
            .copied()
            .filter(|candidate| candidate.id != observation.source_id)
            .collect();
        let site = Site {
            receiver: None,
            ..self.site(observation)
        };
        let Some(choice) = self.symbols.choose(&candidates, site) else {
            return;
        };
        self.record(
            ambiguities,
            &observation.source_id,
            &observation.file_id,
            &observation.target,
            observation.span.start_line,
            &choice,
        );
        edges.insert(
            &observation.source_id,
            vocab::EXTENDS_TYPE,
            Resolution::Resolved(choice.entity.id.clone()),
            Some(observation.span),
        );
    }

    /// `testsFunction` from test functions to the function their name points at.
    fn tests(&self, edges: &mut EdgeSet, ambiguities: &mut Vec<Ambiguity>) {
        for test in self.entities.iter().filter(|e| e.is_function()) {
            let Some(file) = self.files.get(test.file_id.as_str()) else {
                continue;
            };
            let Some(spec) = file.language.map(|l| l.spec()) else {
                continue;
            };
            let Some(subject) = spec.test_subject(&test.simple_name) else {
                continue;
            };

            let mut names = vec![subject.clone()];
            let mut chars = subject.chars();
            if let Some(first) = chars.next() {
                let flipped: String = if first.is_uppercase() {
                    first.to_lowercase().chain(chars).collect()
                } else {
                    first.to_uppercase().chain(chars).collect()
                };
                if flipped != subject {
                    names.push(flipped);
                }
            }

            for name in names {
                let all: Vec<&Entity> = self
                    .symbols
                    .functions(&name)
                    .iter()
                    .copied()
                    .filter(|candidate| candidate.id != test.id)
                    .collect();
                let outside_tests: Vec<&Entity> = all
                    .iter()
                    .copied()
                    .filter(|candidate| !self.is_test_file(&candidate.file_id))
                    .collect();
                let pool = if outside_tests.is_empty() { all } else { outside_tests };
                let site = Site {
                    file_id: &test.file_id,
                    line: test.start_line,
                    receiver: None,
                    enclosing_type: None,
                };
                if let Some(choice) = self.symbols.choose(&pool, site) {
                    self.record(ambiguities, &test.id, &test.file_id, &name, test.start_line, &choice);
                    edges.insert(
                        &test.id,
                        vocab::TESTS_FUNCTION,
                        Resolution::Resolved(choice.entity.id.clone()),
                        Some(Span::new(test.start_line, test.end_line)),
                    );
                    break;
                }
            }
        }
    }

    fn is_test_file(&self, file_id: &str) -> bool {
        self.files
            .get(file_id)
            .is_some_and(|f| f.class_content == vocab::TEST_CODE)
    }

    /// `documents` from each run of comments directly above an entity with
    /// the same parent.
    fn documentation(&self, edges: &mut EdgeSet) {
        let mut scopes: HashMap<(&str, Option<&str>), Vec<&Entity>> = HashMap::new();
        for entity in self.entities {
            scopes
                .entry((entity.file_id.as_str(), entity.parent_id.as_deref()))
                .or_default()
                .push(entity);
        }

        for siblings in scopes.values() {
            let comments_by_end: HashMap<u32, &Entity> = siblings
                .iter()
                .filter(|e| e.kind == EntityKind::Comment)
                .map(|e| (e.end_line, *e))
                .collect();
            if comments_by_end.is_empty() {
                continue;
            }
            let occupied: HashMap<u32, usize> = siblings
                .iter()
                .filter(|e| e.kind != EntityKind::Comment)
                .fold(HashMap::new(), |mut lines, e| {
                    *lines.entry(e.start_line).or_default() += 1;
                    lines
                });

            for target in siblings.iter().filter(|e| e.kind != EntityKind::Comment) {
                let mut line = target.start_line;
                while let Some(comment) = line.checked_sub(1).and_then(|above| comments_by_end.get(&above)) {
                    // A comment sharing its line with another construct is a trailing comment.
                    if occupied.get(&comment.start_line).is_some_and(|n| *n > 0) {
                        break;
                    }
                    edges.insert(
                        &comment.id,
                        vocab::DOCUMENTS,
                        Resolution::Resolved(target.id.clone()),
                        Some(Span::new(comment.start_line, comment.end_line)),
                    );
                    line = comment.start_line;
                }
            }
        }
    }
}

/// Containment predicate from `parent` to `child`.
fn containment_predicate(parent: &Entity, child: &Entity) -> &'static str {
    match child.kind {
        EntityKind::Parameter => vocab::HAS_PARAMETER,
        EntityKind::AttributeDeclaration if parent.kind.is_type() => vocab::HAS_FIELD,
        EntityKind::FunctionDefinition if parent.kind.is_type() => vocab::HAS_METHOD,
        _ => vocab::DECLARES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::indexer::EntityExtractor;
    use crate::knowledge::ontology::OntologyRegistry;
    use crate::knowledge::parser::{GrammarCatalog, Language, SyntaxParser};
    use std::sync::OnceLock;

    fn catalog() -> &'static GrammarCatalog {
        static CATALOG: OnceLock<GrammarCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| {
            let registry = OntologyRegistry::embedded().unwrap();
            GrammarCatalog::new(&registry).unwrap()
        })
    }

    struct Run {
        files: Vec<SourceFile>,
        entities: Vec<Entity>,
        output: ResolveOutput,
    }

    impl Run {
        fn entity(&self, name: &str) -> &Entity {
            self.entities
                .iter()
                .find(|e| e.simple_name == name)
                .unwrap_or_else(|| panic!("no entity {name}"))
        }

        fn file(&self, path: &str) -> &SourceFile {
            self.files.iter().find(|f| f.relative_path == path).unwrap()
        }

        fn has_edge(&self, subject: &str, predicate: &str, object: &str) -> bool {
            self.output.edges.iter().any(|e| {
                e.subject_id == subject && e.predicate == predicate && e.object.resolved_id() == Some(object)
            })
        }

        fn count(&self, predicate: &str) -> usize {
            self.output.edges.iter().filter(|e| e.predicate == predicate).count()
        }
    }

    fn run(sources: &[(&str, &str, &str)]) -> Run {
        let mut files = Vec::new();
        let mut entities = Vec::new();
        let mut observations = Vec::new();
        for (path, content_class, source) in sources {
            let language = Language::from_path(path).unwrap();
            let file = SourceFile::new("repo", path, Some(language), source.len() as u64, "SourceCodeFile", *content_class);
            let queries = catalog().queries(language).unwrap();
            let tree = SyntaxParser::new(None, true).parse(queries, source).unwrap();
            let extraction = EntityExtractor::new(queries).extract(&file, &tree, source);
            entities.extend(extraction.entities);
            observations.extend(extraction.observations);
            files.push(file);
        }
        let output = RelationshipResolver::new(&files, &entities).resolve(&observations);
        Run {
            files,
            entities,
            output,
        }
    }

    #[test]
    fn test_call_to_function_declared_later() {
        let run = run(&[("app.py", "PythonCode", "def foo():\n    bar()\n\ndef bar():\n    pass\n")]);
        let foo = run.entity("foo");
        let bar = run.entity("bar");
        assert!(run.has_edge(&foo.id, vocab::CALLS_FUNCTION, &bar.id));
        assert_eq!(run.count(vocab::CALLS_FUNCTION), 1);
    }

    #[test]
    fn test_containment_edges() {
        let run = run(&[(
            "shapes.py",
            "PythonCode",
            "class Shape:\n    sides = 0\n    def area(self, scale):\n        return 0\n",
        )]);
        let file = run.file("shapes.py");
        let shape = run.entity("Shape");
        let area = run.entity("area");
        let sides = run.entity("sides");
        let scale = run.entity("scale");
        assert!(run.has_edge(&file.id, vocab::DECLARES, &shape.id));
        assert!(run.has_edge(&shape.id, vocab::HAS_METHOD, &area.id));
        assert!(run.has_edge(&shape.id, vocab::HAS_FIELD, &sides.id));
        assert!(run.has_edge(&area.id, vocab::HAS_PARAMETER, &scale.id));
        assert!(run.has_edge(&area.id, vocab::IS_DECLARED_IN, &file.id));
        assert_eq!(run.count(vocab::IS_DECLARED_IN), run.entities.len());
    }

    #[test]
    fn test_instantiation_and_self_receiver() {
        let source = "class Engine:\n    def start(self):\n        self.check()\n    def check(self):\n        pass\n\nclass Checker:\n    def check(self):\n        pass\n\ndef main():\n    Engine()\n";
        let run = run(&[("engine.py", "PythonCode", source)]);
        let engine = run.entity("Engine");
        let main = run.entity("main");
        let start = run.entity("start");
        assert!(run.has_edge(&main.id, vocab::INSTANTIATES, &engine.id));

        let engine_check = run
            .entities
            .iter()
            .find(|e| e.simple_name == "check" && e.parent_id.as_deref() == Some(engine.id.as_str()))
            .unwrap();
        assert!(run.has_edge(&start.id, vocab::CALLS_FUNCTION, &engine_check.id));
        assert!(run.output.ambiguities.is_empty());
    }

    #[test]
    fn test_cross_file_imports_and_inheritance() {
        let run = run(&[
            ("pkg/base.py", "PythonCode", "class Base:\n    pass\n"),
            ("pkg/child.py", "PythonCode", "from .base import Base\nimport numpy\n\nclass Child(Base):\n    pass\n"),
        ]);
        let base_file = run.file("pkg/base.py");
        let child_file = run.file("pkg/child.py");
        assert!(run.has_edge(&child_file.id, vocab::IMPORTS, &base_file.id));
        assert!(run.output.edges.iter().any(|e| e.subject_id == child_file.id
            && e.predicate == vocab::IMPORTS
            && e.object == Resolution::Unresolved("numpy".into())));

        let base = run.entity("Base");
        let child = run.entity("Child");
        assert!(run.has_edge(&child.id, vocab::EXTENDS_TYPE, &base.id));
    }

    #[test]
    fn test_tests_function() {
        let run = run(&[
            ("calc.py", "PythonCode", "def add(a, b):\n    return a + b\n"),
            ("tests/test_calc.py", "TestCode", "from calc import add\n\ndef test_add():\n    assert add(1, 2) == 3\n"),
        ]);
        let add = run.entity("add");
        let test_add = run.entity("test_add");
        assert!(run.has_edge(&test_add.id, vocab::TESTS_FUNCTION, &add.id));
        assert!(run.has_edge(&test_add.id, vocab::CALLS_FUNCTION, &add.id));
    }

    #[test]
    fn test_documents_follows_comment_runs() {
        let source = "# Adds numbers.\n# Returns the sum.\ndef add(a, b):\n    return a + b\n\nx = 1  # trailing\ndef other():\n    pass\n";
        let run = run(&[("doc.py", "PythonCode", source)]);
        let add = run.entity("add");
        let documented: Vec<&RelationshipEdge> = run
            .output
            .edges
            .iter()
            .filter(|e| e.predicate == vocab::DOCUMENTS)
            .collect();
        assert_eq!(documented.len(), 2);
        assert!(documented.iter().all(|e| e.object.resolved_id() == Some(add.id.as_str())));
    }

    #[test]
    fn test_unresolved_call_produces_no_edge() {
        let run = run(&[("solo.py", "PythonCode", "def solo():\n    print('x')\n")]);
        assert_eq!(run.count(vocab::CALLS_FUNCTION), 0);
    }

    #[test]
    fn test_edges_are_sorted_and_unique() {
        let run = run(&[("dup.py", "PythonCode", "def a():\n    b()\n    b()\n\ndef b():\n    pass\n")]);
        assert_eq!(run.count(vocab::CALLS_FUNCTION), 1);
        let call = run.output.edges.iter().find(|e| e.predicate == vocab::CALLS_FUNCTION).unwrap();
        assert_eq!(call.evidence, Some(Span::new(2, 2)));
        let keys: Vec<_> = run.output.edges.iter().map(|e| e.key()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(keys, sorted);
    }
}
