//! Python query table.

use super::{ImportConvention, Language, LanguageSpec, TestConvention};
use crate::knowledge::models::EntityKind;

fn grammar() -> tree_sitter::Language {
    tree_sitter_python::LANGUAGE.into()
}

pub(super) static SPEC: LanguageSpec = LanguageSpec {
    language: Language::Python,
    name: "Python",
    extensions: &["py", "pyi"],
    grammar,
    queries: &[
        (
            EntityKind::ClassDefinition,
            &[r#"(class_definition name: (identifier) @name) @definition"#],
        ),
        (
            EntityKind::FunctionDefinition,
            &[r#"(function_definition name: (identifier) @name) @definition"#],
        ),
        (
            EntityKind::Parameter,
            &[
                r#"(function_definition
                    parameters: (parameters (identifier) @name @definition)
                    (#not-any-of? @name "self" "cls"))"#,
                r#"(function_definition
                    parameters: (parameters (typed_parameter . (identifier) @name) @definition)
                    (#not-any-of? @name "self" "cls"))"#,
                r#"(function_definition
                    parameters: (parameters (default_parameter name: (identifier) @name) @definition))"#,
                r#"(function_definition
                    parameters: (parameters (typed_default_parameter name: (identifier) @name) @definition))"#,
                r#"(function_definition
                    parameters: (parameters (list_splat_pattern (identifier) @name) @definition))"#,
                r#"(function_definition
                    parameters: (parameters (dictionary_splat_pattern (identifier) @name) @definition))"#,
            ],
        ),
        (
            EntityKind::AttributeDeclaration,
            &[
                r#"(class_definition
                    body: (block (expression_statement (assignment left: (identifier) @name) @definition)))"#,
                r#"(assignment
                    left: (attribute object: (identifier) @_self attribute: (identifier) @name)
                    (#eq? @_self "self")) @definition"#,
            ],
        ),
        (
            EntityKind::VariableDeclaration,
            &[r#"(module (expression_statement (assignment left: (identifier) @name) @definition))"#],
        ),
        (EntityKind::Comment, &[r#"(comment) @definition"#]),
        (
            EntityKind::CallSite,
            &[
                r#"(call function: (identifier) @name) @definition"#,
                r#"(call function: (attribute object: (_) @receiver attribute: (identifier) @name)) @definition"#,
            ],
        ),
        (
            EntityKind::ImportDeclaration,
            &[
                r#"(import_statement name: (dotted_name) @path) @definition"#,
                r#"(import_statement name: (aliased_import name: (dotted_name) @path)) @definition"#,
                r#"(import_from_statement module_name: (_) @path name: (dotted_name) @member) @definition"#,
                r#"(import_from_statement
                    module_name: (_) @path
                    name: (aliased_import name: (dotted_name) @member)) @definition"#,
                r#"(import_from_statement module_name: (_) @path (wildcard_import)) @definition"#,
            ],
        ),
        (
            EntityKind::Inheritance,
            &[
                r#"(class_definition superclasses: (argument_list (identifier) @supertype))"#,
                r#"(class_definition superclasses: (argument_list (attribute attribute: (identifier) @supertype)))"#,
            ],
        ),
    ],
    imports: ImportConvention::Dotted,
    tests: &[TestConvention::Prefix("test_"), TestConvention::Prefix("test")],
};
