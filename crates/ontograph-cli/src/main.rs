use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use ontograph_core::classify::{ClassifyOutcome, FileClassifier};
use ontograph_core::config::Config;
use ontograph_core::knowledge::ontology::{self, derive_cache, OntologyRegistry, EMBEDDED_SOURCE};
use ontograph_core::knowledge::{GrammarCatalog, JsonLinesSink, Pipeline, RunReport};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "ontograph")]
#[command(about = "Extract ontology-typed knowledge graphs from source repositories", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the knowledge graph of a repository as JSON lines
    Analyze {
        /// Repository root
        root: PathBuf,
        /// Repository id stamped on every file (defaults to the root's name)
        #[arg(long)]
        repo_id: Option<String>,
        /// Output file (stdout when omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Number of concurrent file workers
        #[arg(short, long)]
        workers: Option<usize>,
        /// Write the run report as JSON
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },
    /// Classify repository-relative paths
    Classify {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// List supported languages and their extensions
    Languages,
    /// Ontology vocabulary maintenance
    #[command(subcommand)]
    Ontology(OntologyCommands),
}

#[derive(Subcommand)]
enum OntologyCommands {
    /// Re-derive the vocabulary cache from the Turtle ontology
    Regenerate {
        /// Turtle source
        #[arg(long, value_name = "TTL")]
        source: Option<PathBuf>,
        /// Cache artifact to replace
        #[arg(long, value_name = "JSON")]
        output: PathBuf,
    },
    /// Load a cache and compare it with the Turtle ontology
    Check {
        /// Cache artifact (the built-in one when omitted)
        #[arg(long, value_name = "JSON")]
        cache: Option<PathBuf>,
        /// Turtle source (the built-in one when omitted)
        #[arg(long, value_name = "TTL")]
        source: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = dispatch(cli).await {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Analyze {
            root,
            repo_id,
            output,
            workers,
            report,
        } => analyze(config, &root, repo_id, output, workers, report.as_deref()).await,
        Commands::Classify { paths } => classify(&config, &paths),
        Commands::Languages => languages(&config),
        Commands::Ontology(OntologyCommands::Regenerate { source, output }) => {
            let source = source
                .or(config.ontology.source_path)
                .ok_or("no ontology source given (use --source or ontology.source_path)")?;
            let cache = ontology::regenerate(&source, &output)?;
            println!("Wrote {} terms to {}", cache.len(), output.display());
            Ok(())
        }
        Commands::Ontology(OntologyCommands::Check { cache, source }) => {
            let cache = cache.or(config.ontology.cache_path);
            let source = source.or(config.ontology.source_path);
            check_ontology(cache.as_deref(), source.as_deref())
        }
    }
}

async fn analyze(
    mut config: Config,
    root: &Path,
    repo_id: Option<String>,
    output: Option<PathBuf>,
    workers: Option<usize>,
    report_path: Option<&Path>,
) -> CliResult<()> {
    if let Some(workers) = workers {
        config.extraction.workers = workers;
    }
    if output.is_some() {
        config.output.path = output;
    }
    let repo_id = repo_id.unwrap_or_else(|| repository_name(root));
    let sink = JsonLinesSink::new(config.output.path.as_deref());
    let pipeline = Pipeline::from_config(config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling run");
            on_interrupt.cancel();
        }
    });

    let spinner = create_spinner(&format!("Analyzing {}", root.display()));
    let result = pipeline.run_and_emit(root, &repo_id, &cancel, &sink).await;
    spinner.finish_and_clear();
    let output = result?;

    print_summary(&output.report);
    if let Some(path) = report_path {
        std::fs::write(path, serde_json::to_string_pretty(&output.report)?)?;
    }
    Ok(())
}

fn classify(config: &Config, paths: &[String]) -> CliResult<()> {
    let registry = OntologyRegistry::load(config.ontology.cache_path.as_deref())?;
    let classifier = FileClassifier::load(config.classification.rules_path.as_deref(), &registry)?;
    for path in paths {
        match classifier.classify(path) {
            ClassifyOutcome::Classified(classes) => {
                println!("{}\t{}\t{}", path, classes.carrier, classes.content)
            }
            ClassifyOutcome::Ignored => println!("{}\tignored", path),
        }
    }
    Ok(())
}

fn languages(config: &Config) -> CliResult<()> {
    let registry = OntologyRegistry::load(config.ontology.cache_path.as_deref())?;
    let catalog = GrammarCatalog::new(&registry)?;
    for (name, extensions) in catalog.list_languages() {
        println!("{:<12} {}", name, extensions.join(", "));
    }
    println!("\n{} languages, {} query patterns", catalog.len(), catalog.pattern_count());
    Ok(())
}

fn check_ontology(cache: Option<&Path>, source: Option<&Path>) -> CliResult<()> {
    let registry = OntologyRegistry::load(cache)?;
    let loaded = registry.cache();
    println!(
        "{} classes, {} object properties, {} data properties, {} annotation properties",
        loaded.classes.len(),
        loaded.object_properties.len(),
        loaded.data_properties.len(),
        loaded.annotation_properties.len()
    );

    let turtle = match source {
        Some(path) => std::fs::read_to_string(path)?,
        None => EMBEDDED_SOURCE.to_string(),
    };
    let derived = derive_cache(&turtle)?;
    if &derived != loaded {
        return Err("ontology cache is out of date; run `ontograph ontology regenerate`".into());
    }
    println!("Cache matches the ontology source");
    Ok(())
}

fn repository_name(root: &Path) -> String {
    root.canonicalize()
        .ok()
        .and_then(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "repository".to_string())
}

fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn print_summary(report: &RunReport) {
    eprintln!("Run {}", report.run_id);
    eprintln!("  Files:        {} ({} ignored)", report.files, report.ignored);
    eprintln!("  Parsed:       {} ({} failed)", report.parsed, report.parse_failed);
    eprintln!("  Entities:     {}", report.entities);
    eprintln!("  Edges:        {}", report.edges);
    eprintln!("  Ambiguities:  {}", report.ambiguities);
    eprintln!("  Records:      {}", report.emitted);
    if !report.failures_by_stage.is_empty() {
        eprintln!("  Failures:");
        for (stage, count) in &report.failures_by_stage {
            eprintln!("    {:<10} {}", stage, count);
        }
    }
}
