//! Extracted code constructs.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::knowledge::ontology::vocab;

/// Abstract construct kinds the grammar queries capture.
///
/// The first ten produce entities. `CallSite`, `ImportDeclaration` and
/// `Inheritance` produce raw observations that the resolver turns into edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    ModuleDefinition,
    ClassDefinition,
    StructDefinition,
    InterfaceDefinition,
    EnumDefinition,
    FunctionDefinition,
    Parameter,
    AttributeDeclaration,
    VariableDeclaration,
    Comment,
    CallSite,
    ImportDeclaration,
    Inheritance,
}

impl EntityKind {
    pub const ALL: [EntityKind; 13] = [
        EntityKind::ModuleDefinition,
        EntityKind::ClassDefinition,
        EntityKind::StructDefinition,
        EntityKind::InterfaceDefinition,
        EntityKind::EnumDefinition,
        EntityKind::FunctionDefinition,
        EntityKind::Parameter,
        EntityKind::AttributeDeclaration,
        EntityKind::VariableDeclaration,
        EntityKind::Comment,
        EntityKind::CallSite,
        EntityKind::ImportDeclaration,
        EntityKind::Inheritance,
    ];

    /// Captures of this kind become observations rather than entities.
    pub fn is_observation(self) -> bool {
        matches!(
            self,
            EntityKind::CallSite | EntityKind::ImportDeclaration | EntityKind::Inheritance
        )
    }

    /// Entities of this kind can lexically contain other entities.
    pub fn is_container(self) -> bool {
        self.is_type() || matches!(self, EntityKind::ModuleDefinition | EntityKind::FunctionDefinition)
    }

    /// Type-like containers: their functions are methods, their attributes fields.
    pub fn is_type(self) -> bool {
        matches!(
            self,
            EntityKind::ClassDefinition
                | EntityKind::StructDefinition
                | EntityKind::InterfaceDefinition
                | EntityKind::EnumDefinition
        )
    }

    /// Ontology class of an entity of this kind, before method promotion.
    /// `None` for observation kinds.
    pub fn ontology_class(self) -> Option<&'static str> {
        let class = match self {
            EntityKind::ModuleDefinition => vocab::MODULE_DEFINITION,
            EntityKind::ClassDefinition => vocab::CLASS_DEFINITION,
            EntityKind::StructDefinition => vocab::STRUCT_DEFINITION,
            EntityKind::InterfaceDefinition => vocab::INTERFACE_DEFINITION,
            EntityKind::EnumDefinition => vocab::ENUM_DEFINITION,
            EntityKind::FunctionDefinition => vocab::FUNCTION_DEFINITION,
            EntityKind::Parameter => vocab::PARAMETER,
            EntityKind::AttributeDeclaration => vocab::ATTRIBUTE_DECLARATION,
            EntityKind::VariableDeclaration => vocab::VARIABLE_DECLARATION,
            EntityKind::Comment => vocab::COMMENT,
            EntityKind::CallSite | EntityKind::ImportDeclaration | EntityKind::Inheritance => {
                return None
            }
        };
        Some(class)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::ModuleDefinition => "ModuleDefinition",
            EntityKind::ClassDefinition => "ClassDefinition",
            EntityKind::StructDefinition => "StructDefinition",
            EntityKind::InterfaceDefinition => "InterfaceDefinition",
            EntityKind::EnumDefinition => "EnumDefinition",
            EntityKind::FunctionDefinition => "FunctionDefinition",
            EntityKind::Parameter => "Parameter",
            EntityKind::AttributeDeclaration => "AttributeDeclaration",
            EntityKind::VariableDeclaration => "VariableDeclaration",
            EntityKind::Comment => "Comment",
            EntityKind::CallSite => "CallSite",
            EntityKind::ImportDeclaration => "ImportDeclaration",
            EntityKind::Inheritance => "Inheritance",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extracted construct. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Deterministic id, see [`entity_id`].
    pub id: String,
    /// Ontology class (e.g. `MethodDefinition`).
    pub ontology_class: String,
    /// Query kind that produced the entity.
    pub kind: EntityKind,
    /// Dotted, fully-qualified name within the repository.
    pub canonical_name: String,
    /// Name as written in source.
    pub simple_name: String,
    /// Id of the declaring [`SourceFile`](super::SourceFile).
    pub file_id: String,
    /// Repository-relative path of the declaring file.
    pub file_path: String,
    /// 1-based, inclusive.
    pub start_line: u32,
    /// 1-based, inclusive.
    pub end_line: u32,
    /// Verbatim source of the definition.
    pub source_snippet: String,
    /// Smallest enclosing container entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Entity {
    pub fn is_callable(&self) -> bool {
        matches!(
            self.ontology_class.as_str(),
            vocab::FUNCTION_DEFINITION | vocab::METHOD_DEFINITION | vocab::CLASS_DEFINITION
        )
    }

    pub fn is_function(&self) -> bool {
        matches!(
            self.ontology_class.as_str(),
            vocab::FUNCTION_DEFINITION | vocab::METHOD_DEFINITION
        )
    }
}

/// Deterministic entity id.
///
/// A SHA-256 over `(repository_id, relative_path, ontology_class,
/// canonical_name, start_line)`, so re-analysing unchanged code yields the
/// same ids and two same-named constructs on different lines never collide.
pub fn entity_id(
    repository_id: &str,
    relative_path: &str,
    ontology_class: &str,
    canonical_name: &str,
    start_line: u32,
) -> String {
    let mut hasher = Sha256::new();
    for part in [repository_id, relative_path, ontology_class, canonical_name] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update(start_line.to_be_bytes());
    format!("entity:{}", hex::encode(hasher.finalize()))
}
