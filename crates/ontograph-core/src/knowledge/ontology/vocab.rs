//! Ontology terms referenced directly by the extraction engine.
//!
//! Every name here must exist in the vocabulary cache; the registry tests
//! check that.

// === Construct classes ===

pub const MODULE_DEFINITION: &str = "ModuleDefinition";
pub const CLASS_DEFINITION: &str = "ClassDefinition";
pub const STRUCT_DEFINITION: &str = "StructDefinition";
pub const INTERFACE_DEFINITION: &str = "InterfaceDefinition";
pub const ENUM_DEFINITION: &str = "EnumDefinition";
pub const FUNCTION_DEFINITION: &str = "FunctionDefinition";
pub const METHOD_DEFINITION: &str = "MethodDefinition";
pub const PARAMETER: &str = "Parameter";
pub const ATTRIBUTE_DECLARATION: &str = "AttributeDeclaration";
pub const VARIABLE_DECLARATION: &str = "VariableDeclaration";
pub const COMMENT: &str = "Comment";

/// Content class marking test sources.
pub const TEST_CODE: &str = "TestCode";

// === Object properties ===

pub const DECLARES: &str = "declares";
pub const HAS_FIELD: &str = "hasField";
pub const HAS_METHOD: &str = "hasMethod";
pub const HAS_PARAMETER: &str = "hasParameter";
pub const CALLS_FUNCTION: &str = "callsFunction";
pub const INSTANTIATES: &str = "instantiates";
pub const IMPORTS: &str = "imports";
pub const EXTENDS_TYPE: &str = "extendsType";
pub const TESTS_FUNCTION: &str = "testsFunction";
pub const DOCUMENTS: &str = "documents";
pub const IS_DECLARED_IN: &str = "isDeclaredIn";

// === Data properties ===

pub const CANONICAL_NAME: &str = "canonicalName";
pub const SIMPLE_NAME: &str = "simpleName";
pub const START_LINE: &str = "startLine";
pub const END_LINE: &str = "endLine";
pub const SOURCE_SNIPPET: &str = "sourceSnippet";
pub const RELATIVE_PATH: &str = "relativePath";
pub const PROGRAMMING_LANGUAGE: &str = "programmingLanguage";
pub const FILE_SIZE: &str = "fileSize";
pub const CONTENT_CLASS: &str = "contentClass";
pub const PARSE_STATUS: &str = "parseStatus";
pub const REPOSITORY_ID: &str = "repositoryId";
pub const RAW_REFERENCE: &str = "rawReference";
pub const EVIDENCE_START_LINE: &str = "evidenceStartLine";
pub const EVIDENCE_END_LINE: &str = "evidenceEndLine";

// === Annotation properties ===

pub const LABEL: &str = "label";

/// Every construct class the extractor can assign.
pub const CONSTRUCT_CLASSES: &[&str] = &[
    MODULE_DEFINITION,
    CLASS_DEFINITION,
    STRUCT_DEFINITION,
    INTERFACE_DEFINITION,
    ENUM_DEFINITION,
    FUNCTION_DEFINITION,
    METHOD_DEFINITION,
    PARAMETER,
    ATTRIBUTE_DECLARATION,
    VARIABLE_DECLARATION,
    COMMENT,
];

/// Every object property the resolver can emit.
pub const EMITTED_OBJECT_PROPERTIES: &[&str] = &[
    DECLARES,
    HAS_FIELD,
    HAS_METHOD,
    HAS_PARAMETER,
    CALLS_FUNCTION,
    INSTANTIATES,
    IMPORTS,
    EXTENDS_TYPE,
    TESTS_FUNCTION,
    DOCUMENTS,
    IS_DECLARED_IN,
];
