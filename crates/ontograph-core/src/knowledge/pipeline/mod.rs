//! Run driver.
//!
//! A run walks a repository, then classifies, parses and extracts every file
//! on a bounded pool of blocking workers. Once all files are in, the
//! resolver builds the relationship edges and the output is sorted, so the
//! same repository always produces the same records regardless of worker
//! scheduling.
//!
//! Per-file problems are recorded as [`FailureEvent`]s in the [`RunReport`]
//! and never stop the run. The run can be cancelled between files through a
//! [`CancellationToken`]; a cancelled run returns [`RunError::Cancelled`] and
//! emits nothing.

mod discovery;
mod telemetry;

pub use discovery::{discover, DiscoveredFile, Discovery};
pub use telemetry::{FailureEvent, RunReport, Stage};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use crate::classify::{ClassifyOutcome, FileClassifier};
use crate::config::Config;
use crate::knowledge::emitter::{GraphSink, RecordEmitter};
use crate::knowledge::error::RunError;
use crate::knowledge::indexer::EntityExtractor;
use crate::knowledge::models::{Ambiguity, Entity, FileRecord, ParseStatus, RawObservation, RelationshipEdge, SourceFile};
use crate::knowledge::ontology::OntologyRegistry;
use crate::knowledge::parser::{GrammarCatalog, SyntaxParser};
use crate::knowledge::resolver::RelationshipResolver;

/// What one file contributed to a run.
#[derive(Debug, Default)]
pub struct FileOutcome {
    /// `None` when the path was ignored by classification.
    pub record: Option<FileRecord>,
    pub entities: Vec<Entity>,
    pub observations: Vec<RawObservation>,
    pub failures: Vec<FailureEvent>,
}

impl FileOutcome {
    fn ignored() -> Self {
        Self::default()
    }

    fn terminal(file: SourceFile, status: ParseStatus, failure: Option<FailureEvent>) -> Self {
        Self {
            record: Some(FileRecord { file, status }),
            failures: failure.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn status(&self) -> Option<ParseStatus> {
        self.record.as_ref().map(|r| r.status)
    }
}

/// Everything a completed run produced.
#[derive(Debug)]
pub struct RunOutput {
    pub report: RunReport,
    /// Sorted by path.
    pub files: Vec<FileRecord>,
    /// Grouped by file in path order, extraction order within a file.
    pub entities: Vec<Entity>,
    /// Sorted by `(subject, predicate, object)`.
    pub edges: Vec<RelationshipEdge>,
    pub ambiguities: Vec<Ambiguity>,
}

/// Shared, read-only run configuration.
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<Config>,
    registry: Arc<OntologyRegistry>,
    classifier: Arc<FileClassifier>,
    catalog: Arc<GrammarCatalog>,
}

impl Pipeline {
    pub fn new(
        config: Config,
        registry: Arc<OntologyRegistry>,
        classifier: Arc<FileClassifier>,
        catalog: Arc<GrammarCatalog>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            registry,
            classifier,
            catalog,
        }
    }

    /// Load the registry, rule table and grammar catalog named by `config`.
    ///
    /// Any problem here is fatal: a malformed rule, an unknown ontology
    /// name or a query that does not compile stops the run before it starts.
    pub fn from_config(config: Config) -> Result<Self, RunError> {
        config.validate()?;
        let registry = OntologyRegistry::load(config.ontology.cache_path.as_deref())?;
        let classifier = FileClassifier::load(config.classification.rules_path.as_deref(), &registry)?;
        let catalog = GrammarCatalog::new(&registry)?;
        tracing::debug!(
            languages = catalog.len(),
            patterns = catalog.pattern_count(),
            "Loaded grammar catalog"
        );
        Ok(Self::new(config, Arc::new(registry), Arc::new(classifier), Arc::new(catalog)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Arc<OntologyRegistry> {
        &self.registry
    }

    pub fn classifier(&self) -> &FileClassifier {
        &self.classifier
    }

    pub fn catalog(&self) -> &GrammarCatalog {
        &self.catalog
    }

    fn parser(&self) -> SyntaxParser {
        let extraction = &self.config.extraction;
        let timeout = (extraction.parse_timeout_ms > 0).then(|| Duration::from_millis(extraction.parse_timeout_ms));
        SyntaxParser::new(timeout, extraction.strict_syntax)
    }

    /// Classify a path into a [`SourceFile`]. `None` when it is ignored.
    pub fn classify_file(&self, repository_id: &str, relative_path: &str, size: u64) -> Option<SourceFile> {
        match self.classifier.classify(relative_path) {
            ClassifyOutcome::Ignored => None,
            ClassifyOutcome::Classified(classes) => {
                let language = self.catalog.language_for_path(relative_path);
                Some(SourceFile::new(
                    repository_id,
                    relative_path,
                    language,
                    size,
                    classes.carrier,
                    classes.content,
                ))
            }
        }
    }

    /// Classify, parse and extract one file from its bytes.
    pub fn analyze_source(&self, repository_id: &str, relative_path: &str, bytes: &[u8]) -> FileOutcome {
        match self.classify_file(repository_id, relative_path, bytes.len() as u64) {
            Some(file) => self.analyze_file(file, bytes),
            None => FileOutcome::ignored(),
        }
    }

    /// Parse and extract an already classified file.
    pub fn analyze_file(&self, file: SourceFile, bytes: &[u8]) -> FileOutcome {
        let Some(queries) = file.language.and_then(|language| self.catalog.queries(language)) else {
            return FileOutcome::terminal(file, ParseStatus::NotParsed, None);
        };

        let source = match std::str::from_utf8(bytes) {
            Ok(source) => source,
            Err(err) => {
                let failure = FailureEvent::new(&file.relative_path, Stage::Read, format!("not valid UTF-8: {}", err));
                return FileOutcome::terminal(file, ParseStatus::NotParsed, Some(failure));
            }
        };

        let tree = match self.parser().parse(queries, source) {
            Ok(tree) => tree,
            Err(err) => {
                let failure = FailureEvent::new(&file.relative_path, Stage::Parse, err.to_string());
                return FileOutcome::terminal(file, ParseStatus::ParseFailed, Some(failure));
            }
        };

        let extraction = EntityExtractor::new(queries).extract(&file, &tree, source);
        let failures = extraction
            .warnings
            .iter()
            .map(|warning| FailureEvent::new(&file.relative_path, Stage::Extract, warning.to_string()))
            .collect();
        tracing::debug!(
            path = %file.relative_path,
            entities = extraction.entities.len(),
            observations = extraction.observations.len(),
            "Extracted file"
        );

        FileOutcome {
            record: Some(FileRecord {
                file,
                status: ParseStatus::Parsed,
            }),
            entities: extraction.entities,
            observations: extraction.observations,
            failures,
        }
    }

    /// Classify a discovered file, reading it only when it has a grammar.
    fn process(&self, repository_id: &str, discovered: &DiscoveredFile) -> FileOutcome {
        let Some(file) = self.classify_file(repository_id, &discovered.relative_path, discovered.size) else {
            tracing::debug!(path = %discovered.relative_path, "Ignored");
            return FileOutcome::ignored();
        };
        if file.language.is_none() {
            return FileOutcome::terminal(file, ParseStatus::NotParsed, None);
        }
        match std::fs::read(&discovered.absolute_path) {
            Ok(bytes) => self.analyze_file(file, &bytes),
            Err(err) => {
                let failure = FailureEvent::new(&file.relative_path, Stage::Read, err.to_string());
                FileOutcome::terminal(file, ParseStatus::NotParsed, Some(failure))
            }
        }
    }

    /// Record for a file whose worker panicked. The file counts as failed
    /// and the run carries on.
    fn worker_panicked(&self, repository_id: &str, discovered: &DiscoveredFile, panic: JoinError) -> FileOutcome {
        let reason = match panic.into_panic().downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => payload
                .downcast_ref::<&str>()
                .map(|message| message.to_string())
                .unwrap_or_else(|| "unknown panic".to_string()),
        };
        let failure = FailureEvent::new(&discovered.relative_path, Stage::Extract, format!("worker panicked: {}", reason));
        match self.classify_file(repository_id, &discovered.relative_path, discovered.size) {
            Some(file) => FileOutcome::terminal(file, ParseStatus::ParseFailed, Some(failure)),
            None => FileOutcome {
                failures: vec![failure],
                ..FileOutcome::default()
            },
        }
    }

    /// Extract and resolve the repository at `root`.
    pub async fn run(&self, root: &Path, repository_id: &str, cancel: &CancellationToken) -> Result<RunOutput, RunError> {
        self.run_with(root, repository_id, cancel, Pipeline::process).await
    }

    async fn run_with<F>(
        &self,
        root: &Path,
        repository_id: &str,
        cancel: &CancellationToken,
        process: F,
    ) -> Result<RunOutput, RunError>
    where
        F: Fn(&Pipeline, &str, &DiscoveredFile) -> FileOutcome + Clone + Send + Sync + 'static,
    {
        if !root.is_dir() {
            return Err(RunError::NotADirectory(root.to_path_buf()));
        }
        if cancel.is_cancelled() {
            return Err(RunError::Cancelled);
        }

        let mut report = RunReport::new(repository_id);
        tracing::info!(root = %root.display(), run_id = %report.run_id, "Starting run");

        let discovery = {
            let root = root.to_path_buf();
            let extraction = self.config.extraction.clone();
            tokio::task::spawn_blocking(move || discover(&root, &extraction)).await?
        };
        report.record_all(discovery.failures);

        let workers = self.config.extraction.effective_workers();
        let repository: Arc<str> = Arc::from(repository_id);
        let mut tasks = stream::iter(discovery.files.into_iter().map(|discovered| {
            let pipeline = self.clone();
            let repository = Arc::clone(&repository);
            let cancel = cancel.clone();
            let process = process.clone();
            async move {
                if cancel.is_cancelled() {
                    return Ok(None);
                }
                let discovered = Arc::new(discovered);
                let worker = {
                    let pipeline = pipeline.clone();
                    let repository = Arc::clone(&repository);
                    let discovered = Arc::clone(&discovered);
                    tokio::task::spawn_blocking(move || process(&pipeline, &*repository, &*discovered))
                };
                match worker.await {
                    Ok(outcome) => Ok(Some(outcome)),
                    Err(err) if err.is_panic() => Ok(Some(pipeline.worker_panicked(&repository, &discovered, err))),
                    Err(err) => Err(err),
                }
            }
        }))
        .buffer_unordered(workers);

        let mut outcomes = Vec::new();
        while let Some(result) = tasks.next().await {
            match result? {
                Some(outcome) => outcomes.push(outcome),
                None => return Err(RunError::Cancelled),
            }
        }
        drop(tasks);
        if cancel.is_cancelled() {
            return Err(RunError::Cancelled);
        }

        outcomes.sort_by(|a, b| {
            let path = |o: &FileOutcome| o.record.as_ref().map(|r| r.file.relative_path.clone());
            path(a).cmp(&path(b))
        });

        let mut files = Vec::new();
        let mut entities = Vec::new();
        let mut observations = Vec::new();
        for outcome in outcomes {
            report.record_all(outcome.failures);
            let Some(record) = outcome.record else {
                report.ignored += 1;
                continue;
            };
            match record.status {
                ParseStatus::Parsed => report.parsed += 1,
                ParseStatus::ParseFailed => report.parse_failed += 1,
                ParseStatus::NotParsed => {}
            }
            files.push(record);
            entities.extend(outcome.entities);
            observations.extend(outcome.observations);
        }

        let sources: Vec<SourceFile> = files.iter().map(|record| record.file.clone()).collect();
        let (entities, resolved) = tokio::task::spawn_blocking(move || {
            let resolved = RelationshipResolver::new(&sources, &entities).resolve(&observations);
            (entities, resolved)
        })
        .await?;

        if cancel.is_cancelled() {
            return Err(RunError::Cancelled);
        }

        report.record_all(resolved.ambiguities.iter().map(|ambiguity| {
            FailureEvent::new(
                &ambiguity.file_path,
                Stage::Resolve,
                format!(
                    "ambiguous reference {:?} at line {}: {} candidates, chose {}",
                    ambiguity.name, ambiguity.line, ambiguity.candidates, ambiguity.chosen
                ),
            )
        }));
        report.files = files.len();
        report.entities = entities.len();
        report.edges = resolved.edges.len();
        report.ambiguities = resolved.ambiguities.len();
        report.finish();
        tracing::info!(
            files = report.files,
            ignored = report.ignored,
            parsed = report.parsed,
            parse_failed = report.parse_failed,
            entities = report.entities,
            edges = report.edges,
            failures = report.failures.len(),
            "Run complete"
        );

        Ok(RunOutput {
            report,
            files,
            entities,
            edges: resolved.edges,
            ambiguities: resolved.ambiguities,
        })
    }

    /// Run, then validate and write every record to `sink`.
    ///
    /// Records dropped by validation are added to the report as `emit`
    /// failures. A run cancelled before emission writes nothing.
    pub async fn run_and_emit(
        &self,
        root: &Path,
        repository_id: &str,
        cancel: &CancellationToken,
        sink: &dyn GraphSink,
    ) -> Result<RunOutput, RunError> {
        let mut output = self.run(root, repository_id, cancel).await?;
        if cancel.is_cancelled() {
            return Err(RunError::Cancelled);
        }

        let emitter = RecordEmitter::new(Arc::clone(&self.registry));
        let summary = emitter
            .emit(&output.files, &output.entities, &output.edges, sink)
            .await?;
        output.report.emitted = summary.written;
        output.report.record_all(summary.failures);
        output.report.finish();
        tracing::info!(records = summary.written, "Emitted records");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;
    use std::fs;
    use tempfile::TempDir;

    fn pipeline(extraction: ExtractionConfig) -> Pipeline {
        let config = Config {
            extraction,
            ..Config::default()
        };
        Pipeline::from_config(config).unwrap()
    }

    fn strict() -> ExtractionConfig {
        ExtractionConfig {
            strict_syntax: true,
            workers: 2,
            ..ExtractionConfig::default()
        }
    }

    #[test]
    fn test_analyze_source_ignored() {
        let outcome = pipeline(strict()).analyze_source("r", "src/utils/helper.min.js", b"var a=1;");
        assert!(outcome.record.is_none());
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn test_analyze_source_not_parsed() {
        let outcome = pipeline(strict()).analyze_source("r", "README.md", b"# Title\n");
        assert_eq!(outcome.status(), Some(ParseStatus::NotParsed));
        let file = &outcome.record.unwrap().file;
        assert_eq!(file.class_carrier, "DocumentationFile");
        assert_eq!(file.class_content, "Readme");
    }

    #[test]
    fn test_analyze_source_syntax_error() {
        let source = b"def ok():\n    return 1\n\ndef broken(:\n    pass\n";
        let outcome = pipeline(strict()).analyze_source("r", "app.py", source);
        assert_eq!(outcome.status(), Some(ParseStatus::ParseFailed));
        assert!(outcome.entities.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].stage, Stage::Parse);
    }

    #[test]
    fn test_analyze_source_invalid_utf8() {
        let outcome = pipeline(strict()).analyze_source("r", "app.py", &[0x66, 0xff, 0xfe, 0x0a]);
        assert_eq!(outcome.status(), Some(ParseStatus::NotParsed));
        assert_eq!(outcome.failures[0].stage, Stage::Read);
    }

    #[tokio::test]
    async fn test_run_counts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "def foo():\n    bar()\n\ndef bar():\n    pass\n").unwrap();
        fs::write(dir.path().join("README.md"), "# hi\n").unwrap();

        let output = pipeline(strict())
            .run(dir.path(), "repo", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(output.report.files, 2);
        assert_eq!(output.report.parsed, 1);
        assert_eq!(output.files[0].file.relative_path, "README.md");
        assert!(output.edges.iter().any(|e| e.predicate == "callsFunction"));
    }

    #[tokio::test]
    async fn test_cancelled_run() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = pipeline(strict()).run(dir.path(), "repo", &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_worker_panic_fails_only_its_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("good.py"), "def fine():\n    return 1\n").unwrap();
        fs::write(dir.path().join("boom.py"), "def boom():\n    return 2\n").unwrap();

        let output = pipeline(strict())
            .run_with(dir.path(), "repo", &CancellationToken::new(), |pipeline: &Pipeline, repository: &str, file: &DiscoveredFile| {
                if file.relative_path == "boom.py" {
                    panic!("extractor bug");
                }
                pipeline.process(repository, file)
            })
            .await
            .unwrap();

        let boom = output.files.iter().find(|f| f.file.relative_path == "boom.py").unwrap();
        assert_eq!(boom.status, ParseStatus::ParseFailed);
        assert!(output.entities.iter().all(|e| e.file_path != "boom.py"));
        assert!(output.entities.iter().any(|e| e.simple_name == "fine"));
        assert_eq!(output.report.parse_failed, 1);
        assert_eq!(output.report.failures_in(Stage::Extract), 1);
        let failure = &output.report.failures[0];
        assert_eq!(failure.path, "boom.py");
        assert!(failure.reason.contains("extractor bug"), "{}", failure.reason);
    }

    #[tokio::test]
    async fn test_ambiguous_calls_are_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "def helper():\n    pass\n").unwrap();
        fs::write(dir.path().join("b.py"), "def helper():\n    pass\n").unwrap();
        fs::write(dir.path().join("c.py"), "def main():\n    return helper()\n").unwrap();

        let output = pipeline(strict())
            .run(dir.path(), "repo", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(output.ambiguities.len(), 1);
        assert_eq!(output.report.ambiguities, 1);
        assert_eq!(output.report.failures_in(Stage::Resolve), 1);
        let failure = output.report.failures.iter().find(|f| f.stage == Stage::Resolve).unwrap();
        assert_eq!(failure.path, "c.py");
        assert!(output.edges.iter().any(|e| e.predicate == "callsFunction"));
    }

    #[tokio::test]
    async fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        let err = pipeline(strict())
            .run(&dir.path().join("nope"), "repo", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::NotADirectory(_)));
    }
}
