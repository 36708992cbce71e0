//! Classification rule errors.

use std::path::PathBuf;
use thiserror::Error;

use super::Taxonomy;

/// Errors raised while loading a rule table. All of them are fatal.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported rule file extension: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Invalid ignore pattern #{index} {pattern:?}: {source}")]
    InvalidIgnorePattern {
        index: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid {taxonomy} rule #{index} {pattern:?}: {source}")]
    InvalidPattern {
        taxonomy: Taxonomy,
        index: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("{taxonomy} {location} names unknown ontology class {class:?}")]
    UnknownClass {
        taxonomy: Taxonomy,
        /// `rule #N` or `fallback`.
        location: String,
        class: String,
    },
}
