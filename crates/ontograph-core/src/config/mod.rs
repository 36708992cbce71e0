//! Configuration management for ontograph.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `ontograph.toml` file
//! 3. User config `~/.config/ontograph/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod defaults;

pub use defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Discovery, parsing and worker pool settings.
    pub extraction: ExtractionConfig,

    /// Classification rule table location.
    pub classification: ClassificationConfig,

    /// Ontology cache and source locations.
    pub ontology: OntologyConfig,

    /// Record output.
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./ontograph.toml` (project local)
    /// 2. `~/.config/ontograph/config.toml` (user config)
    /// 3. Falls back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_file(DEFAULT_CONFIG_FILE);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir
                .join(DEFAULT_CONFIG_DIR)
                .join(DEFAULT_USER_CONFIG_FILE);
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(workers) = std::env::var(ENV_WORKERS) {
            self.extraction.workers = parse_env(ENV_WORKERS, &workers)?;
        }
        if let Ok(size) = std::env::var(ENV_MAX_FILE_SIZE) {
            self.extraction.max_file_size = parse_env(ENV_MAX_FILE_SIZE, &size)?;
        }
        if let Ok(ms) = std::env::var(ENV_PARSE_TIMEOUT_MS) {
            self.extraction.parse_timeout_ms = parse_env(ENV_PARSE_TIMEOUT_MS, &ms)?;
        }
        if let Ok(strict) = std::env::var(ENV_STRICT_SYNTAX) {
            self.extraction.strict_syntax = parse_env(ENV_STRICT_SYNTAX, &strict)?;
        }

        if let Ok(path) = std::env::var(ENV_RULES_PATH) {
            self.classification.rules_path = Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var(ENV_ONTOLOGY_CACHE) {
            self.ontology.cache_path = Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var(ENV_OUTPUT) {
            self.output.path = Some(PathBuf::from(path));
        }

        Ok(())
    }

    /// Reject values that would make a run meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extraction.max_file_size == 0 {
            return Err(ConfigError::Invalid(
                "extraction.max_file_size must be greater than zero".to_string(),
            ));
        }
        if self.extraction.parse_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "extraction.parse_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{} has an invalid value: {:?}", name, value)))
}

/// Extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Number of concurrent per-file workers (0 = available parallelism).
    pub workers: usize,

    /// Maximum size of a single file to analyze (in bytes).
    pub max_file_size: u64,

    /// Parse budget per file (in milliseconds).
    pub parse_timeout_ms: u64,

    /// Treat syntax error nodes as parse failures.
    pub strict_syntax: bool,

    /// Respect `.gitignore` while walking the repository.
    pub follow_gitignore: bool,

    /// Walk hidden files and directories.
    pub include_hidden: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            parse_timeout_ms: DEFAULT_PARSE_TIMEOUT_MS,
            strict_syntax: DEFAULT_STRICT_SYNTAX,
            follow_gitignore: DEFAULT_FOLLOW_GITIGNORE,
            include_hidden: DEFAULT_INCLUDE_HIDDEN,
        }
    }
}

impl ExtractionConfig {
    /// Resolve the effective worker count.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

/// Classification configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Rule table (TOML or YAML). The built-in table is used when unset.
    pub rules_path: Option<PathBuf>,
}

/// Ontology configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OntologyConfig {
    /// JSON vocabulary cache. The built-in cache is used when unset.
    pub cache_path: Option<PathBuf>,

    /// Turtle ontology the cache is regenerated from.
    pub source_path: Option<PathBuf>,
}

/// Output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// JSON-lines output file. Records go to stdout when unset.
    pub path: Option<PathBuf>,
}
