//! File classification.
//!
//! Every repository path is assigned one class from each of two independent
//! taxonomies: the *carrier* (what kind of artifact the file is) and the
//! *content* (what the file is about). Rules are ordered and the first match
//! wins; ignore patterns are checked first and drop the path entirely.

mod error;
mod rules;

pub use error::RuleError;
pub use rules::{
    ClassificationRule, RuleEntry, RuleSet, RuleTable, TaxonomyRules, TaxonomyTable,
    EMBEDDED_RULES,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::knowledge::ontology::OntologyRegistry;

/// The two classification taxonomies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Taxonomy {
    Carrier,
    Content,
}

impl fmt::Display for Taxonomy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Taxonomy::Carrier => f.write_str("carrier"),
            Taxonomy::Content => f.write_str("content"),
        }
    }
}

/// Classes assigned to one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub carrier: String,
    pub content: String,
}

/// Result of classifying a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ClassifyOutcome {
    Classified(Classification),
    Ignored,
}

impl ClassifyOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, ClassifyOutcome::Ignored)
    }

    pub fn classification(&self) -> Option<&Classification> {
        match self {
            ClassifyOutcome::Classified(c) => Some(c),
            ClassifyOutcome::Ignored => None,
        }
    }
}

/// Applies a [`RuleSet`] to repository-relative paths.
#[derive(Debug, Clone)]
pub struct FileClassifier {
    rules: Arc<RuleSet>,
}

impl FileClassifier {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    /// Classifier over the built-in rule table.
    pub fn embedded(registry: &OntologyRegistry) -> Result<Self, RuleError> {
        Ok(Self::new(Arc::new(RuleSet::embedded(registry)?)))
    }

    /// Classifier over the rule table at `path`, or the built-in one.
    pub fn load(path: Option<&Path>, registry: &OntologyRegistry) -> Result<Self, RuleError> {
        Ok(Self::new(Arc::new(RuleSet::load(path, registry)?)))
    }

    /// Classify a path. Total and pure: the same path always yields the
    /// same outcome, and every non-ignored path gets both classes.
    pub fn classify(&self, path: &str) -> ClassifyOutcome {
        let path = normalize_path(path);
        if self.rules.is_ignored(&path) {
            return ClassifyOutcome::Ignored;
        }
        ClassifyOutcome::Classified(Classification {
            carrier: self.rules.taxonomy(Taxonomy::Carrier).classify(&path).to_string(),
            content: self.rules.taxonomy(Taxonomy::Content).classify(&path).to_string(),
        })
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

/// Normalize to forward-slash, repository-relative form.
///
/// Backslashes become slashes, leading `./` and `/` are stripped, and
/// interior `.` segments and repeated separators are collapsed.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}
