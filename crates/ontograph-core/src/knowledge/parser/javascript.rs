//! JavaScript query table.

use super::{ImportConvention, Language, LanguageSpec, TestConvention};
use crate::knowledge::models::EntityKind;

fn grammar() -> tree_sitter::Language {
    tree_sitter_javascript::LANGUAGE.into()
}

pub(super) static SPEC: LanguageSpec = LanguageSpec {
    language: Language::JavaScript,
    name: "JavaScript",
    extensions: &["js", "jsx", "mjs", "cjs"],
    grammar,
    queries: &[
        (
            EntityKind::ClassDefinition,
            &[r#"(class_declaration name: (identifier) @name) @definition"#],
        ),
        (
            EntityKind::FunctionDefinition,
            &[
                r#"(function_declaration name: (identifier) @name) @definition"#,
                r#"(generator_function_declaration name: (identifier) @name) @definition"#,
                r#"(method_definition name: [(property_identifier) (private_property_identifier)] @name) @definition"#,
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
                        [(identifier) @name
                         (assignment_pattern left: (identifier) @name)
                         (rest_pattern (identifier) @name)] @definition))"#,
                r#"(generator_function_declaration
                    parameters: (formal_parameters
                        [(identifier) @name
                         (assignment_pattern left: (identifier) @name)
                         (rest_pattern (identifier) @name)] @definition))"#,
                r#"(method_definition
                    parameters: (formal_parameters
                        [(identifier) @name
                         (assignment_pattern left: (identifier) @name)
                         (rest_pattern (identifier) @name)] @definition))"#,
                r#"(variable_declarator
                    value: (arrow_function
                        parameters: (formal_parameters
                            [(identifier) @name
                             (assignment_pattern left: (identifier) @name)
                             (rest_pattern (identifier) @name)] @definition)))"#,
                r#"(variable_declarator
                    value: (function_expression
                        parameters: (formal_parameters
                            [(identifier) @name
                             (assignment_pattern left: (identifier) @name)
                             (rest_pattern (identifier) @name)] @definition)))"#,
                r#"(variable_declarator value: (arrow_function parameter: (identifier) @name @definition))"#,
            ],
        ),
        (
            EntityKind::AttributeDeclaration,
            &[
                r#"(field_definition property: [(property_identifier) (private_property_identifier)] @name) @definition"#,
                r#"(expression_statement
                    (assignment_expression
                        left: (member_expression object: (this) property: (property_identifier) @name))) @definition"#,
            ],
        ),
        (
            EntityKind::VariableDeclaration,
            &[
                r#"(program
                    [(lexical_declaration (variable_declarator name: (identifier) @name value: (_) @_value) @definition)
                     (variable_declaration (variable_declarator name: (identifier) @name value: (_) @_value) @definition)
                     (export_statement
                        declaration: (lexical_declaration
                            (variable_declarator name: (identifier) @name value: (_) @_value) @definition))])"#,
            ],
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
                r#"(class_declaration (class_heritage (identifier) @supertype))"#,
                r#"(class_declaration (class_heritage (member_expression property: (property_identifier) @supertype)))"#,
            ],
        ),
    ],
    imports: ImportConvention::Relative {
        extensions: &["js", "jsx", "mjs", "cjs", "ts", "tsx"],
        index_files: true,
        bare_is_external: true,
    },
    tests: &[TestConvention::Prefix("test")],
};
