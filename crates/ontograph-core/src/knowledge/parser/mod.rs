//! Grammar query catalog and syntax parsing.
//!
//! Every supported language contributes one static [`LanguageSpec`]: its
//! file extensions, tree-sitter grammar, the query patterns for each
//! [`EntityKind`] it produces, and the conventions the resolver uses for its
//! imports and test names.
//!
//! ## Components
//!
//! - [`Language`] - closed set of supported grammars
//! - [`GrammarCatalog`] - all query tables compiled once, shared via `Arc`
//! - [`SyntaxParser`] - parses one file with timeout and strict-mode checks
//!
//! ## Supported Languages
//!
//! Python, JavaScript, TypeScript, TSX, Rust, Go, Java, C#, C, C++, Ruby,
//! Bash, Elixir, CSS and HTML.

mod bash;
mod c;
mod cpp;
mod csharp;
mod elixir;
mod go;
mod java;
mod javascript;
mod markup;
mod python;
mod registry;
mod ruby;
mod rust;
mod treesitter;
mod typescript;

pub use registry::{CompiledQuery, GrammarCatalog, LanguageQueries};
pub use treesitter::{node_end_line, node_line, node_text, ParseError, SyntaxParser};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::knowledge::models::EntityKind;

/// A language with a grammar and a query table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Rust,
    Go,
    Java,
    CSharp,
    C,
    Cpp,
    Ruby,
    Bash,
    Elixir,
    Css,
    Html,
}

impl Language {
    pub const ALL: [Language; 15] = [
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Tsx,
        Language::Rust,
        Language::Go,
        Language::Java,
        Language::CSharp,
        Language::C,
        Language::Cpp,
        Language::Ruby,
        Language::Bash,
        Language::Elixir,
        Language::Css,
        Language::Html,
    ];

    /// Static query table for this language.
    pub fn spec(self) -> &'static LanguageSpec {
        match self {
            Language::Python => &python::SPEC,
            Language::JavaScript => &javascript::SPEC,
            Language::TypeScript => &typescript::TYPESCRIPT_SPEC,
            Language::Tsx => &typescript::TSX_SPEC,
            Language::Rust => &rust::SPEC,
            Language::Go => &go::SPEC,
            Language::Java => &java::SPEC,
            Language::CSharp => &csharp::SPEC,
            Language::C => &c::SPEC,
            Language::Cpp => &cpp::SPEC,
            Language::Ruby => &ruby::SPEC,
            Language::Bash => &bash::SPEC,
            Language::Elixir => &elixir::SPEC,
            Language::Css => &markup::CSS_SPEC,
            Language::Html => &markup::HTML_SPEC,
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Language for a file extension (case-insensitive, without the dot).
    pub fn from_extension(extension: &str) -> Option<Language> {
        Language::ALL.into_iter().find(|language| {
            language
                .spec()
                .extensions
                .iter()
                .any(|ext| ext.eq_ignore_ascii_case(extension))
        })
    }

    /// Language for a file path, by its extension.
    pub fn from_path(path: &str) -> Option<Language> {
        Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Language::from_extension)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a language's import text maps onto repository files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportConvention {
    /// Paths relative to the importing file (`./util`, `"lib.h"`).
    ///
    /// `extensions` are tried when the reference has none, `index_files`
    /// allows `dir` to mean `dir/index.<ext>`, and with `bare_is_external` a
    /// reference not starting with `.` or `/` is a package, never a file.
    Relative {
        extensions: &'static [&'static str],
        index_files: bool,
        bare_is_external: bool,
    },
    /// Python dotted modules, including leading-dot relative forms.
    Dotted,
    /// Dotted package names mirrored by directories (`com.foo.Bar`).
    PackagePath {
        extensions: &'static [&'static str],
        snake_case: bool,
    },
    /// Rust `crate::`, `super::` and `self::` paths.
    ModulePath,
    /// Go import paths naming a package directory.
    Directory,
    /// Ruby features, found relative to the file or on the load path.
    Feature { extensions: &'static [&'static str] },
}

/// A naming convention marking a function as a test of another function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestConvention {
    Prefix(&'static str),
    Suffix(&'static str),
}

impl TestConvention {
    /// Name of the function under test, if `name` follows this convention.
    ///
    /// A prefix ending in a letter must be followed by an upper-case letter
    /// or an underscore, so `testFoo` matches `test` but `testament` does not.
    pub fn subject(self, name: &str) -> Option<String> {
        let rest = match self {
            TestConvention::Prefix(prefix) => {
                let rest = name.strip_prefix(prefix)?;
                let needs_boundary = prefix.ends_with(|c: char| c.is_ascii_alphabetic());
                if needs_boundary && rest.starts_with(|c: char| c.is_lowercase()) {
                    return None;
                }
                rest.trim_start_matches('_')
            }
            TestConvention::Suffix(suffix) => name.strip_suffix(suffix)?.trim_end_matches('_'),
        };
        if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        }
    }
}

/// Static description of one language.
pub struct LanguageSpec {
    pub language: Language,
    pub name: &'static str,
    /// File extensions without the dot.
    pub extensions: &'static [&'static str],
    pub grammar: fn() -> tree_sitter::Language,
    /// Entity kind to ordered query patterns. Kinds that are absent are never
    /// produced for this language.
    pub queries: &'static [(EntityKind, &'static [&'static str])],
    pub imports: ImportConvention,
    pub tests: &'static [TestConvention],
}

impl LanguageSpec {
    /// Patterns for `kind`, empty if the language never produces it.
    pub fn patterns(&self, kind: EntityKind) -> &'static [&'static str] {
        self.queries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, patterns)| *patterns)
            .unwrap_or(&[])
    }

    /// Function under test for a test named `name`, by the first matching
    /// convention.
    pub fn test_subject(&self, name: &str) -> Option<String> {
        self.tests.iter().find_map(|convention| convention.subject(name))
    }
}

impl fmt::Debug for LanguageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageSpec")
            .field("language", &self.language)
            .field("extensions", &self.extensions)
            .field("kinds", &self.queries.len())
            .finish()
    }
}

/// Errors building the grammar catalog. All are fatal at load time.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to load {language} grammar: {source}")]
    Grammar {
        language: Language,
        #[source]
        source: tree_sitter::LanguageError,
    },

    #[error("Invalid {language} {kind} query #{index}: {source}")]
    InvalidQuery {
        language: Language,
        kind: EntityKind,
        index: usize,
        #[source]
        source: tree_sitter::QueryError,
    },

    #[error("{language} {kind} query #{index} lacks a @{capture} capture")]
    MissingCapture {
        language: Language,
        kind: EntityKind,
        index: usize,
        capture: &'static str,
    },

    #[error("{language} {kind} queries map to unknown ontology class '{class}'")]
    UnknownClass {
        language: Language,
        kind: EntityKind,
        class: String,
    },
}
