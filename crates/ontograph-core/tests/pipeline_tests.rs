use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use ontograph_core::config::{Config, ExtractionConfig};
use ontograph_core::knowledge::models::{Entity, EntityKind, ParseStatus, Resolution};
use ontograph_core::knowledge::{
    GraphRecord, JsonLinesSink, MemorySink, OntologyRegistry, Pipeline, RecordEmitter, RunError, RunOutput, Stage,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn write(root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, content).unwrap();
}

fn pipeline_with_workers(workers: usize) -> Pipeline {
    let config = Config {
        extraction: ExtractionConfig {
            workers,
            ..ExtractionConfig::default()
        },
        ..Config::default()
    };
    Pipeline::from_config(config).unwrap()
}

fn pipeline() -> Pipeline {
    pipeline_with_workers(4)
}

async fn run(pipeline: &Pipeline, root: &Path) -> RunOutput {
    pipeline.run(root, "fixture", &CancellationToken::new()).await.unwrap()
}

fn named<'a>(output: &'a RunOutput, name: &str) -> Vec<&'a Entity> {
    output.entities.iter().filter(|e| e.simple_name == name).collect()
}

fn sample_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "README.md", "# Sample\n");
    write(root, "src/utils/helper.min.js", "var a=1;");
    write(
        root,
        "src/app.py",
        r#"from src.models import User


def foo():
    """Entry point."""
    return bar()


def bar():
    return User("x")
"#,
    );
    write(
        root,
        "src/models.py",
        r#"class Base:
    pass


# A user of the system.
class User(Base):
    def __init__(self, name):
        self.name = name

    def greet(self):
        return self.format()

    def format(self):
        return "hi " + self.name
"#,
    );
    write(
        root,
        "web/app.ts",
        r#"import { helper } from "./util";

export function main(): number {
  return helper(2);
}
"#,
    );
    write(
        root,
        "web/util.ts",
        r#"export function helper(x: number): number {
  return x * 2;
}
"#,
    );
    write(
        root,
        "tests/test_models.py",
        r#"from src.models import User


def test_greet():
    assert User("a").greet() == "hi a"
"#,
    );
    dir
}

#[tokio::test]
async fn test_ignored_and_classified_files() {
    let repo = sample_repo();
    let output = run(&pipeline(), repo.path()).await;

    let paths: Vec<&str> = output.files.iter().map(|f| f.file.relative_path.as_str()).collect();
    assert!(!paths.contains(&"src/utils/helper.min.js"));
    assert_eq!(output.report.ignored, 1);

    let readme = output
        .files
        .iter()
        .find(|f| f.file.relative_path == "README.md")
        .unwrap();
    assert_eq!(readme.file.class_carrier, "DocumentationFile");
    assert_eq!(readme.file.class_content, "Readme");
    assert_eq!(readme.status, ParseStatus::NotParsed);
}

#[tokio::test]
async fn test_call_to_function_declared_later() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "m.py", "def foo():\n    bar()\n\n\ndef bar():\n    pass\n");
    let output = run(&pipeline(), dir.path()).await;

    let foo = named(&output, "foo")[0];
    let bar = named(&output, "bar")[0];
    let calls: Vec<_> = output
        .edges
        .iter()
        .filter(|e| e.predicate == "callsFunction")
        .collect();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].subject_id, foo.id);
    assert_eq!(calls[0].object, Resolution::Resolved(bar.id.clone()));
}

#[tokio::test]
async fn test_same_named_methods_under_conditionals() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "greeter.py",
        r#"class Greeter:
    if FLAG:
        def greet(self):
            return "a"
    else:
        def greet(self):
            return "b"
"#,
    );
    let output = run(&pipeline(), dir.path()).await;

    let class = named(&output, "Greeter")[0];
    let methods = named(&output, "greet");
    assert_eq!(methods.len(), 2);
    assert_ne!(methods[0].id, methods[1].id);
    for method in methods {
        assert_eq!(method.parent_id.as_deref(), Some(class.id.as_str()));
        assert_eq!(method.ontology_class, "MethodDefinition");
    }
}

#[tokio::test]
async fn test_syntax_error_isolated_to_its_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "good.py", "def fine():\n    return 1\n");
    write(dir.path(), "bad.py", "def ok():\n    return 1\n\ndef broken(:\n    pass\n");
    let output = run(&pipeline(), dir.path()).await;

    let bad = output
        .files
        .iter()
        .find(|f| f.file.relative_path == "bad.py")
        .unwrap();
    assert_eq!(bad.status, ParseStatus::ParseFailed);
    assert!(output.entities.iter().all(|e| e.file_path != "bad.py"));

    assert_eq!(output.report.failures.len(), 1);
    assert_eq!(output.report.failures[0].stage, Stage::Parse);
    assert_eq!(output.report.failures[0].path, "bad.py");
    assert_eq!(output.report.parse_failed, 1);

    assert_eq!(named(&output, "fine").len(), 1);
}

#[tokio::test]
async fn test_parse_timeout_fails_only_its_file() {
    let dir = TempDir::new().unwrap();
    let big: String = (0..40_000)
        .map(|i| format!("def f{i}():\n    return {i}\n"))
        .collect();
    write(dir.path(), "big.py", &big);
    write(dir.path(), "small.py", "def fine():\n    return 1\n");

    let config = Config {
        extraction: ExtractionConfig {
            workers: 2,
            parse_timeout_ms: 1,
            ..ExtractionConfig::default()
        },
        ..Config::default()
    };
    let output = run(&Pipeline::from_config(config).unwrap(), dir.path()).await;

    let big = output
        .files
        .iter()
        .find(|f| f.file.relative_path == "big.py")
        .unwrap();
    assert_eq!(big.status, ParseStatus::ParseFailed);
    assert!(output.entities.iter().all(|e| e.file_path != "big.py"));

    let parse_failures: Vec<_> = output
        .report
        .failures
        .iter()
        .filter(|f| f.path == "big.py" && f.stage == Stage::Parse)
        .collect();
    assert_eq!(parse_failures.len(), 1);
    assert!(parse_failures[0].reason.contains("timed out"), "{}", parse_failures[0].reason);

    assert_eq!(named(&output, "fine").len(), 1);
}

#[tokio::test]
async fn test_cross_file_edges() {
    let repo = sample_repo();
    let output = run(&pipeline(), repo.path()).await;
    let file_id = |path: &str| {
        output
            .files
            .iter()
            .find(|f| f.file.relative_path == path)
            .map(|f| f.file.id.clone())
            .unwrap()
    };
    let has_edge = |subject: &str, predicate: &str, object: &str| {
        output.edges.iter().any(|e| {
            e.subject_id == subject && e.predicate == predicate && e.object == Resolution::Resolved(object.to_string())
        })
    };

    assert!(has_edge(&file_id("web/app.ts"), "imports", &file_id("web/util.ts")));
    assert!(has_edge(&file_id("src/app.py"), "imports", &file_id("src/models.py")));

    let user = named(&output, "User")[0];
    let base = named(&output, "Base")[0];
    let bar = named(&output, "bar")[0];
    let greet = named(&output, "greet")[0];
    let format = named(&output, "format")[0];
    let test_greet = named(&output, "test_greet")[0];

    assert!(has_edge(&user.id, "extendsType", &base.id));
    assert!(has_edge(&bar.id, "instantiates", &user.id));
    assert!(has_edge(&greet.id, "callsFunction", &format.id));
    assert!(has_edge(&user.id, "hasMethod", &greet.id));
    assert!(has_edge(&test_greet.id, "testsFunction", &greet.id));

    let comment = output
        .entities
        .iter()
        .find(|e| e.kind == EntityKind::Comment && e.file_path == "src/models.py")
        .unwrap();
    assert!(has_edge(&comment.id, "documents", &user.id));
}

#[tokio::test]
async fn test_runs_are_idempotent() {
    let repo = sample_repo();
    let first = run(&pipeline_with_workers(1), repo.path()).await;
    let second = run(&pipeline_with_workers(8), repo.path()).await;

    assert_eq!(first.files, second.files);
    assert_eq!(first.entities, second.entities);
    assert_eq!(first.edges, second.edges);
    assert_ne!(first.report.run_id, second.report.run_id);
}

#[tokio::test]
async fn test_vocabulary_is_closed() {
    let repo = sample_repo();
    let pipeline = pipeline();
    let output = run(&pipeline, repo.path()).await;
    let registry = pipeline.registry();

    for entity in &output.entities {
        assert!(registry.is_known_class(&entity.ontology_class), "{}", entity.ontology_class);
    }
    for record in &output.files {
        assert!(registry.is_known_class(&record.file.class_carrier));
        assert!(registry.is_known_class(&record.file.class_content));
    }
    for edge in &output.edges {
        assert!(registry.is_known_object_property(&edge.predicate), "{}", edge.predicate);
    }

    let batch = RecordEmitter::new(Arc::clone(registry)).build(&output.files, &output.entities, &output.edges);
    assert!(batch.failures.is_empty(), "{:?}", batch.failures);
}

#[tokio::test]
async fn test_containment_is_acyclic_and_file_local() {
    let repo = sample_repo();
    let output = run(&pipeline(), repo.path()).await;
    let by_id: HashMap<&str, &Entity> = output.entities.iter().map(|e| (e.id.as_str(), e)).collect();

    for entity in &output.entities {
        let mut seen = HashSet::new();
        let mut current = entity;
        while let Some(parent_id) = current.parent_id.as_deref() {
            assert!(seen.insert(parent_id), "cycle at {}", entity.canonical_name);
            let parent = by_id[parent_id];
            assert_eq!(parent.file_id, entity.file_id);
            assert!(parent.start_line <= entity.start_line);
            current = parent;
        }
    }
}

#[tokio::test]
async fn test_entity_ids_are_unique() {
    let repo = sample_repo();
    let output = run(&pipeline(), repo.path()).await;
    let ids: HashSet<&str> = output.entities.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids.len(), output.entities.len());
}

#[tokio::test]
async fn test_unresolved_import_is_kept() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.py", "import numpy\n\nx = numpy.zeros(3)\n");
    let output = run(&pipeline(), dir.path()).await;
    assert!(output
        .edges
        .iter()
        .any(|e| e.predicate == "imports" && e.object == Resolution::Unresolved("numpy".to_string())));
}

#[tokio::test]
async fn test_cancelled_run_emits_nothing() {
    let repo = sample_repo();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let sink = MemorySink::new();
    let err = pipeline()
        .run_and_emit(repo.path(), "fixture", &cancel, &sink)
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::Cancelled));
    assert!(sink.records().is_empty());
}

#[tokio::test]
async fn test_emit_json_lines() {
    let repo = sample_repo();
    let out = TempDir::new().unwrap();
    let path = out.path().join("graph.jsonl");
    let sink = JsonLinesSink::to_file(&path);

    let output = pipeline()
        .run_and_emit(repo.path(), "fixture", &CancellationToken::new(), &sink)
        .await
        .unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let records: Vec<GraphRecord> = text.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
    assert_eq!(records.len(), output.report.emitted);
    assert_eq!(
        records.iter().filter(|r| r.is_node()).count(),
        output.files.len() + output.entities.len()
    );
    assert_eq!(records.iter().filter(|r| r.is_edge()).count(), output.edges.len());
    assert_eq!(output.report.failures_in(Stage::Emit), 0);
}

#[tokio::test]
async fn test_custom_ontology_cache_rejects_records() {
    let repo = sample_repo();
    let dir = TempDir::new().unwrap();
    let registry = OntologyRegistry::embedded().unwrap();
    let mut cache = registry.cache().clone();
    cache.object_properties.remove("documents");
    let cache_path = dir.path().join("cache.json");
    fs::write(&cache_path, cache.to_json().unwrap()).unwrap();

    let mut config = Config::default();
    config.ontology.cache_path = Some(cache_path);
    let pipeline = Pipeline::from_config(config).unwrap();

    let sink = MemorySink::new();
    let output = pipeline
        .run_and_emit(repo.path(), "fixture", &CancellationToken::new(), &sink)
        .await
        .unwrap();
    let dropped = output.edges.iter().filter(|e| e.predicate == "documents").count();
    assert!(dropped > 0);
    assert_eq!(output.report.failures_in(Stage::Emit), dropped);
    assert!(sink.records().iter().all(|r| r.term() != "documents"));
}

#[tokio::test]
async fn test_missing_rules_file_is_fatal() {
    let mut config = Config::default();
    config.classification.rules_path = Some("/nonexistent/rules.toml".into());
    let err = Pipeline::from_config(config).err().unwrap();
    assert!(matches!(err, RunError::Rules(_)));
}
