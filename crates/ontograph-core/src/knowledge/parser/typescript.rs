//! TypeScript and TSX query tables.
//!
//! Both grammars share node names, so one table serves both.

use super::{ImportConvention, Language, LanguageSpec, TestConvention};
use crate::knowledge::models::EntityKind;

fn typescript_grammar() -> tree_sitter::Language {
    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
}

fn tsx_grammar() -> tree_sitter::Language {
    tree_sitter_typescript::LANGUAGE_TSX.into()
}

const QUERIES: &[(EntityKind, &[&str])] = &[
    (
        EntityKind::ModuleDefinition,
        &[
            r#"(internal_module name: (identifier) @name) @definition"#,
            r#"(module name: (identifier) @name) @definition"#,
        ],
    ),
    (
        EntityKind::ClassDefinition,
        &[
            r#"(class_declaration name: (type_identifier) @name) @definition"#,
            r#"(abstract_class_declaration name: (type_identifier) @name) @definition"#,
        ],
    ),
    (
        EntityKind::InterfaceDefinition,
        &[r#"(interface_declaration name: (type_identifier) @name) @definition"#],
    ),
    (
        EntityKind::EnumDefinition,
        &[r#"(enum_declaration name: (identifier) @name) @definition"#],
    ),
    (
        EntityKind::FunctionDefinition,
        &[
            r#"(function_declaration name: (identifier) @name) @definition"#,
            r#"(generator_function_declaration name: (identifier) @name) @definition"#,
            r#"(method_definition name: [(property_identifier) (private_property_identifier)] @name) @definition"#,
            r#"(method_signature name: (property_identifier) @name) @definition"#,
            r#"(abstract_method_signature name: (property_identifier) @name) @definition"#,
            r#"(variable_declarator
                name: (identifier) @name
                value: [(arrow_function) (function_expression)]) @definition"#,
        ],
    ),
    (
        EntityKind::Parameter,
        &[
            r#"(function_declaration
                parameters: (formal_parameters
                    [(required_parameter pattern: (identifier) @name)
                     (required_parameter pattern: (rest_pattern (identifier) @name))
                     (optional_parameter pattern: (identifier) @name)] @definition))"#,
            r#"(generator_function_declaration
                parameters: (formal_parameters
                    [(required_parameter pattern: (identifier) @name)
                     (required_parameter pattern: (rest_pattern (identifier) @name))
                     (optional_parameter pattern: (identifier) @name)] @definition))"#,
            r#"(method_definition
                parameters: (formal_parameters
                    [(required_parameter pattern: (identifier) @name)
                     (required_parameter pattern: (rest_pattern (identifier) @name))
                     (optional_parameter pattern: (identifier) @name)] @definition))"#,
            r#"(method_signature
                parameters: (formal_parameters
                    [(required_parameter pattern: (identifier) @name)
                     (required_parameter pattern: (rest_pattern (identifier) @name))
                     (optional_parameter pattern: (identifier) @name)] @definition))"#,
            r#"(abstract_method_signature
                parameters: (formal_parameters
                    [(required_parameter pattern: (identifier) @name)
                     (required_parameter pattern: (rest_pattern (identifier) @name))
                     (optional_parameter pattern: (identifier) @name)] @definition))"#,
            r#"(variable_declarator
                value: (arrow_function
                    parameters: (formal_parameters
                        [(required_parameter pattern: (identifier) @name)
                         (required_parameter pattern: (rest_pattern (identifier) @name))
                         (optional_parameter pattern: (identifier) @name)] @definition)))"#,
            r#"(variable_declarator
                value: (function_expression
                    parameters: (formal_parameters
                        [(required_parameter pattern: (identifier) @name)
                         (required_parameter pattern: (rest_pattern (identifier) @name))
                         (optional_parameter pattern: (identifier) @name)] @definition)))"#,
            r#"(variable_declarator value: (arrow_function parameter: (identifier) @name @definition))"#,
        ],
    ),
    (
        EntityKind::AttributeDeclaration,
        &[
            r#"(public_field_definition name: [(property_identifier) (private_property_identifier)] @name) @definition"#,
            r#"(property_signature name: (property_identifier) @name) @definition"#,
            r#"(enum_body name: (property_identifier) @name @definition)"#,
            r#"(enum_assignment name: (property_identifier) @name) @definition"#,
        ],
    ),
    (
        EntityKind::VariableDeclaration,
        &[r#"(program
            [(lexical_declaration (variable_declarator name: (identifier) @name value: (_) @_value) @definition)
             (variable_declaration (variable_declarator name: (identifier) @name value: (_) @_value) @definition)
             (export_statement
                declaration: (lexical_declaration
                    (variable_declarator name: (identifier) @name value: (_) @_value) @definition))])"#],
    ),
    (EntityKind::Comment, &[r#"(comment) @definition"#]),
    (
        EntityKind::CallSite,
        &[
            r#"(call_expression function: (identifier) @name) @definition"#,
            r#"(call_expression
                function: (member_expression object: (_) @receiver property: (property_identifier) @name)) @definition"#,
            r#"(new_expression constructor: (identifier) @name) @definition"#,
        ],
    ),
    (
        EntityKind::ImportDeclaration,
        &[
            r#"(import_statement source: (string (string_fragment) @path)) @definition"#,
            r#"(export_statement source: (string (string_fragment) @path)) @definition"#,
            r#"(call_expression
                function: (identifier) @_require
                arguments: (arguments . (string (string_fragment) @path))
                (#eq? @_require "require")) @definition"#,
        ],
    ),
    (
        EntityKind::Inheritance,
        &[
            r#"(class_heritage (extends_clause value: (identifier) @supertype))"#,
            r#"(class_heritage (extends_clause value: (member_expression property: (property_identifier) @supertype)))"#,
            r#"(class_heritage (implements_clause (type_identifier) @supertype))"#,
            r#"(class_heritage (implements_clause (generic_type name: (type_identifier) @supertype)))"#,
            r#"(extends_type_clause type: (type_identifier) @supertype)"#,
            r#"(extends_type_clause type: (generic_type name: (type_identifier) @supertype))"#,
        ],
    ),
];

const IMPORTS: ImportConvention = ImportConvention::Relative {
    extensions: &["ts", "tsx", "mts", "cts", "d.ts", "js", "jsx", "mjs"],
    index_files: true,
    bare_is_external: true,
};

pub(super) static TYPESCRIPT_SPEC: LanguageSpec = LanguageSpec {
    language: Language::TypeScript,
    name: "TypeScript",
    extensions: &["ts", "mts", "cts"],
    grammar: typescript_grammar,
    queries: QUERIES,
    imports: IMPORTS,
    tests: &[TestConvention::Prefix("test")],
};

pub(super) static TSX_SPEC: LanguageSpec = LanguageSpec {
    language: Language::Tsx,
    name: "TSX",
    extensions: &["tsx"],
    grammar: tsx_grammar,
    queries: QUERIES,
    imports: IMPORTS,
    tests: &[TestConvention::Prefix("test")],
};
