//! Rule tables: the serialized form and its compiled counterpart.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::RuleError;
use super::Taxonomy;
use crate::knowledge::ontology::OntologyRegistry;

/// Rule table built into the crate.
pub const EMBEDDED_RULES: &str = include_str!("../../rules/classification.toml");

/// Serialized rule table, as read from TOML or YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTable {
    /// Checked before any taxonomy; a match drops the path.
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    pub carrier: TaxonomyTable,

    pub content: TaxonomyTable,
}

/// One taxonomy's ordered rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyTable {
    /// Class assigned when no rule matches.
    pub fallback: String,

    #[serde(default)]
    pub rules: Vec<RuleEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleEntry {
    pub class: String,
    pub regex: String,
}

impl RuleTable {
    pub fn from_toml(content: &str) -> Result<Self, RuleError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_yaml(content: &str) -> Result<Self, RuleError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Read a table, picking the format from the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RuleError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| RuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("toml") => Self::from_toml(&content),
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => Err(RuleError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// The built-in table.
    pub fn embedded() -> Result<Self, RuleError> {
        Self::from_toml(EMBEDDED_RULES)
    }

    fn taxonomy(&self, taxonomy: Taxonomy) -> &TaxonomyTable {
        match taxonomy {
            Taxonomy::Carrier => &self.carrier,
            Taxonomy::Content => &self.content,
        }
    }
}

/// A compiled rule. Rules are evaluated in ascending `order`.
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    pub target_class: String,
    pub pattern: Regex,
    pub order: usize,
}

/// Compiled rules of one taxonomy.
#[derive(Debug, Clone)]
pub struct TaxonomyRules {
    taxonomy: Taxonomy,
    rules: Vec<ClassificationRule>,
    fallback: String,
}

impl TaxonomyRules {
    fn compile(
        table: &TaxonomyTable,
        taxonomy: Taxonomy,
        registry: &OntologyRegistry,
    ) -> Result<Self, RuleError> {
        if !registry.is_known_class(&table.fallback) {
            return Err(RuleError::UnknownClass {
                taxonomy,
                location: "fallback".to_string(),
                class: table.fallback.clone(),
            });
        }

        let mut rules = Vec::with_capacity(table.rules.len());
        for (order, entry) in table.rules.iter().enumerate() {
            if !registry.is_known_class(&entry.class) {
                return Err(RuleError::UnknownClass {
                    taxonomy,
                    location: format!("rule #{}", order),
                    class: entry.class.clone(),
                });
            }
            let pattern = Regex::new(&entry.regex).map_err(|source| RuleError::InvalidPattern {
                taxonomy,
                index: order,
                pattern: entry.regex.clone(),
                source,
            })?;
            rules.push(ClassificationRule {
                target_class: entry.class.clone(),
                pattern,
                order,
            });
        }

        Ok(Self {
            taxonomy,
            rules,
            fallback: table.fallback.clone(),
        })
    }

    /// First matching rule's class, or the fallback. Never fails.
    pub fn classify(&self, path: &str) -> &str {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(path))
            .map(|rule| rule.target_class.as_str())
            .unwrap_or(&self.fallback)
    }

    pub fn taxonomy(&self) -> Taxonomy {
        self.taxonomy
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}

/// Compiled, validated rule set. Immutable after construction.
#[derive(Debug, Clone)]
pub struct RuleSet {
    ignore: Vec<Regex>,
    carrier: TaxonomyRules,
    content: TaxonomyRules,
}

impl RuleSet {
    /// Compile every pattern and check every class against the ontology.
    pub fn compile(table: &RuleTable, registry: &OntologyRegistry) -> Result<Self, RuleError> {
        let ignore = table
            .ignore_patterns
            .iter()
            .enumerate()
            .map(|(index, pattern)| {
                Regex::new(pattern).map_err(|source| RuleError::InvalidIgnorePattern {
                    index,
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            ignore,
            carrier: TaxonomyRules::compile(
                table.taxonomy(Taxonomy::Carrier),
                Taxonomy::Carrier,
                registry,
            )?,
            content: TaxonomyRules::compile(
                table.taxonomy(Taxonomy::Content),
                Taxonomy::Content,
                registry,
            )?,
        })
    }

    /// The built-in table compiled against `registry`.
    pub fn embedded(registry: &OntologyRegistry) -> Result<Self, RuleError> {
        Self::compile(&RuleTable::embedded()?, registry)
    }

    /// Load from `path` when given, the built-in table otherwise.
    pub fn load(path: Option<&Path>, registry: &OntologyRegistry) -> Result<Self, RuleError> {
        let table = match path {
            Some(path) => RuleTable::from_file(path)?,
            None => RuleTable::embedded()?,
        };
        Self::compile(&table, registry)
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignore.iter().any(|pattern| pattern.is_match(path))
    }

    pub fn taxonomy(&self, taxonomy: Taxonomy) -> &TaxonomyRules {
        match taxonomy {
            Taxonomy::Carrier => &self.carrier,
            Taxonomy::Content => &self.content,
        }
    }
}
