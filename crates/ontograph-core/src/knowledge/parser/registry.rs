//! Compiled grammar query catalog.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tree_sitter::Query;

use super::{CatalogError, Language, LanguageSpec};
use crate::knowledge::models::EntityKind;
use crate::knowledge::ontology::{vocab, OntologyRegistry};

/// One compiled pattern with its capture slots resolved.
pub struct CompiledQuery {
    pub kind: EntityKind,
    /// Position of the pattern within its kind's list.
    pub index: usize,
    pub query: Query,
    pub definition: Option<u32>,
    pub name: Option<u32>,
    pub owner: Option<u32>,
    pub receiver: Option<u32>,
    pub path: Option<u32>,
    pub member: Option<u32>,
    pub supertype: Option<u32>,
}

impl CompiledQuery {
    fn compile(
        spec: &LanguageSpec,
        grammar: &tree_sitter::Language,
        kind: EntityKind,
        index: usize,
        pattern: &str,
    ) -> Result<Self, CatalogError> {
        let query = Query::new(grammar, pattern).map_err(|source| CatalogError::InvalidQuery {
            language: spec.language,
            kind,
            index,
            source,
        })?;
        let slot = |name: &str| query.capture_index_for_name(name);
        let compiled = Self {
            kind,
            index,
            definition: slot("definition"),
            name: slot("name"),
            owner: slot("owner"),
            receiver: slot("receiver"),
            path: slot("path"),
            member: slot("member"),
            supertype: slot("supertype"),
            query,
        };

        let required = match kind {
            EntityKind::Comment => ("definition", compiled.definition),
            EntityKind::ImportDeclaration => ("path", compiled.path),
            EntityKind::Inheritance => ("supertype", compiled.supertype),
            _ => ("name", compiled.name),
        };
        if required.1.is_none() {
            return Err(CatalogError::MissingCapture {
                language: spec.language,
                kind,
                index,
                capture: required.0,
            });
        }
        Ok(compiled)
    }
}

/// All compiled queries of one language.
pub struct LanguageQueries {
    pub spec: &'static LanguageSpec,
    pub grammar: tree_sitter::Language,
    /// In table order: kinds as declared, patterns in order within a kind.
    pub queries: Vec<CompiledQuery>,
}

impl LanguageQueries {
    fn compile(spec: &'static LanguageSpec, registry: &OntologyRegistry) -> Result<Self, CatalogError> {
        let grammar = (spec.grammar)();
        let mut queries = Vec::new();

        for (kind, patterns) in spec.queries {
            let classes = match kind.ontology_class() {
                Some(vocab::FUNCTION_DEFINITION) => {
                    vec![vocab::FUNCTION_DEFINITION, vocab::METHOD_DEFINITION]
                }
                Some(class) => vec![class],
                None => Vec::new(),
            };
            for class in classes {
                if !registry.is_known_class(class) {
                    return Err(CatalogError::UnknownClass {
                        language: spec.language,
                        kind: *kind,
                        class: class.to_string(),
                    });
                }
            }

            for (index, pattern) in patterns.iter().enumerate() {
                queries.push(CompiledQuery::compile(spec, &grammar, *kind, index, pattern)?);
            }
        }

        Ok(Self {
            spec,
            grammar,
            queries,
        })
    }

    pub fn language(&self) -> Language {
        self.spec.language
    }

    /// Compiled queries for one kind.
    pub fn for_kind(&self, kind: EntityKind) -> impl Iterator<Item = &CompiledQuery> {
        self.queries.iter().filter(move |q| q.kind == kind)
    }
}

/// Every supported language's queries, compiled once and shared read-only.
///
/// Maps file extensions to their language. Building the catalog compiles
/// every pattern, so a broken pattern fails at startup, not mid-run.
pub struct GrammarCatalog {
    languages: BTreeMap<Language, LanguageQueries>,
    /// Lower-cased extension to language mapping.
    extensions: HashMap<String, Language>,
}

impl GrammarCatalog {
    /// Compile the built-in table of every language.
    pub fn new(registry: &OntologyRegistry) -> Result<Self, CatalogError> {
        Self::with_languages(&Language::ALL, registry)
    }

    /// Compile only the given languages.
    pub fn with_languages(languages: &[Language], registry: &OntologyRegistry) -> Result<Self, CatalogError> {
        let mut catalog = Self {
            languages: BTreeMap::new(),
            extensions: HashMap::new(),
        };

        for language in languages {
            let compiled = LanguageQueries::compile(language.spec(), registry)?;
            for ext in compiled.spec.extensions {
                catalog.extensions.insert(ext.to_lowercase(), *language);
            }
            tracing::debug!(
                language = %language,
                queries = compiled.queries.len(),
                "Compiled grammar queries"
            );
            catalog.languages.insert(*language, compiled);
        }

        Ok(catalog)
    }

    pub fn queries(&self, language: Language) -> Option<&LanguageQueries> {
        self.languages.get(&language)
    }

    /// Get the language for the given file extension.
    pub fn language_for_extension(&self, extension: &str) -> Option<Language> {
        self.extensions.get(&extension.to_lowercase()).copied()
    }

    /// Get the language for the given file path.
    pub fn language_for_path(&self, path: &str) -> Option<Language> {
        Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|ext| self.language_for_extension(ext))
    }

    /// Check if any grammar can handle the given extension.
    pub fn can_parse(&self, extension: &str) -> bool {
        self.extensions.contains_key(&extension.to_lowercase())
    }

    /// List all supported extensions, sorted.
    pub fn supported_extensions(&self) -> Vec<&str> {
        let mut extensions: Vec<&str> = self.extensions.keys().map(|s| s.as_str()).collect();
        extensions.sort_unstable();
        extensions
    }

    /// List all compiled languages with their extensions.
    pub fn list_languages(&self) -> Vec<(&'static str, &'static [&'static str])> {
        self.languages
            .values()
            .map(|compiled| (compiled.spec.name, compiled.spec.extensions))
            .collect()
    }

    /// Total number of compiled patterns.
    pub fn pattern_count(&self) -> usize {
        self.languages.values().map(|l| l.queries.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    fn catalog() -> &'static GrammarCatalog {
        static CATALOG: OnceLock<GrammarCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| {
            let registry = OntologyRegistry::embedded().unwrap();
            GrammarCatalog::new(&registry).unwrap()
        })
    }

    #[test]
    fn test_every_language_compiles() {
        let catalog = catalog();
        assert_eq!(catalog.len(), Language::ALL.len());
        for language in Language::ALL {
            let compiled = catalog.queries(language).unwrap();
            assert!(!compiled.queries.is_empty(), "{language} has no queries");
        }
    }

    #[test]
    fn test_catalog_has_all_extensions() {
        let catalog = catalog();

        // Rust
        assert!(catalog.can_parse("rs"));

        // TypeScript/JavaScript
        assert!(catalog.can_parse("ts"));
        assert!(catalog.can_parse("tsx"));
        assert!(catalog.can_parse("js"));
        assert!(catalog.can_parse("jsx"));
        assert!(catalog.can_parse("mjs"));

        // Python, Go, Java, C#
        assert!(catalog.can_parse("py"));
        assert!(catalog.can_parse("go"));
        assert!(catalog.can_parse("java"));
        assert!(catalog.can_parse("cs"));

        // C family, scripting, markup
        assert!(catalog.can_parse("c"));
        assert!(catalog.can_parse("cpp"));
        assert!(catalog.can_parse("rb"));
        assert!(catalog.can_parse("sh"));
        assert!(catalog.can_parse("ex"));
        assert!(catalog.can_parse("css"));
        assert!(catalog.can_parse("html"));

        assert!(!catalog.can_parse("md"));
    }

    #[test]
    fn test_language_for_path() {
        let catalog = catalog();
        assert_eq!(catalog.language_for_path("src/lib.rs"), Some(Language::Rust));
        assert_eq!(catalog.language_for_path("src/main.py"), Some(Language::Python));
        assert_eq!(catalog.language_for_path("src/App.tsx"), Some(Language::Tsx));
        assert_eq!(catalog.language_for_path("Main.java"), Some(Language::Java));
        assert_eq!(catalog.language_for_path("unknown.xyz"), None);
        assert_eq!(catalog.language_for_path("LICENSE"), None);
    }

    #[test]
    fn test_case_insensitive() {
        let catalog = catalog();
        assert!(catalog.can_parse("RS"));
        assert!(catalog.can_parse("Py"));
        assert!(catalog.can_parse("TS"));
    }

    #[test]
    fn test_subset_catalog() {
        let registry = OntologyRegistry::embedded().unwrap();
        let catalog = GrammarCatalog::with_languages(&[Language::Python], &registry).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.can_parse("py"));
        assert!(!catalog.can_parse("rs"));
        assert_eq!(catalog.list_languages(), vec![("Python", &["py", "pyi"][..])]);
    }

    #[test]
    fn test_capture_slots() {
        let python = catalog().queries(Language::Python).unwrap();
        for query in python.for_kind(EntityKind::CallSite) {
            assert!(query.name.is_some());
            assert!(query.definition.is_some());
        }
        for query in python.for_kind(EntityKind::ImportDeclaration) {
            assert!(query.path.is_some());
        }
        assert!(python.for_kind(EntityKind::InterfaceDefinition).next().is_none());
    }
}
