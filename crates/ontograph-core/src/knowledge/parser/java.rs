//! Java query table.

use super::{ImportConvention, Language, LanguageSpec, TestConvention};
use crate::knowledge::models::EntityKind;

fn grammar() -> tree_sitter::Language {
    tree_sitter_java::LANGUAGE.into()
}

pub(super) static SPEC: LanguageSpec = LanguageSpec {
    language: Language::Java,
    name: "Java",
    extensions: &["java"],
    grammar,
    queries: &[
        (
            EntityKind::ClassDefinition,
            &[
                r#"(class_declaration name: (identifier) @name) @definition"#,
                r#"(record_declaration name: (identifier) @name) @definition"#,
            ],
        ),
        (
            EntityKind::InterfaceDefinition,
            &[
                r#"(interface_declaration name: (identifier) @name) @definition"#,
                r#"(annotation_type_declaration name: (identifier) @name) @definition"#,
            ],
        ),
        (
            EntityKind::EnumDefinition,
            &[r#"(enum_declaration name: (identifier) @name) @definition"#],
        ),
        (
            EntityKind::FunctionDefinition,
            &[
                r#"(method_declaration name: (identifier) @name) @definition"#,
                r#"(constructor_declaration name: (identifier) @name) @definition"#,
            ],
        ),
        (
            EntityKind::Parameter,
            &[
                r#"(method_declaration
                    parameters: (formal_parameters
                        [(formal_parameter name: (identifier) @name)
                         (spread_parameter (variable_declarator name: (identifier) @name))] @definition))"#,
                r#"(constructor_declaration
                    parameters: (formal_parameters
                        [(formal_parameter name: (identifier) @name)
                         (spread_parameter (variable_declarator name: (identifier) @name))] @definition))"#,
            ],
        ),
        (
            EntityKind::AttributeDeclaration,
            &[
                r#"(field_declaration declarator: (variable_declarator name: (identifier) @name)) @definition"#,
                r#"(constant_declaration declarator: (variable_declarator name: (identifier) @name)) @definition"#,
                r#"(enum_constant name: (identifier) @name) @definition"#,
            ],
        ),
        (
            EntityKind::Comment,
            &[r#"(line_comment) @definition"#, r#"(block_comment) @definition"#],
        ),
        (
            EntityKind::CallSite,
            &[
                r#"(method_invocation !object name: (identifier) @name) @definition"#,
                r#"(method_invocation object: (_) @receiver name: (identifier) @name) @definition"#,
                r#"(object_creation_expression type: (type_identifier) @name) @definition"#,
                r#"(object_creation_expression type: (generic_type (type_identifier) @name)) @definition"#,
            ],
        ),
        (
            EntityKind::ImportDeclaration,
            &[r#"(import_declaration (scoped_identifier) @path) @definition"#],
        ),
        (
            EntityKind::Inheritance,
            &[
                r#"(superclass [(type_identifier) @supertype (generic_type (type_identifier) @supertype)])"#,
                r#"(super_interfaces
                    (type_list [(type_identifier) @supertype (generic_type (type_identifier) @supertype)]))"#,
                r#"(extends_interfaces
                    (type_list [(type_identifier) @supertype (generic_type (type_identifier) @supertype)]))"#,
            ],
        ),
    ],
    imports: ImportConvention::PackagePath {
        extensions: &["java"],
        snake_case: false,
    },
    tests: &[TestConvention::Prefix("test")],
};
