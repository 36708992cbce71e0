//! Go query table.

use super::{ImportConvention, Language, LanguageSpec, TestConvention};
use crate::knowledge::models::EntityKind;

fn grammar() -> tree_sitter::Language {
    tree_sitter_go::LANGUAGE.into()
}

pub(super) static SPEC: LanguageSpec = LanguageSpec {
    language: Language::Go,
    name: "Go",
    extensions: &["go"],
    grammar,
    queries: &[
        (
            EntityKind::StructDefinition,
            &[r#"(type_spec name: (type_identifier) @name type: (struct_type)) @definition"#],
        ),
        (
            EntityKind::InterfaceDefinition,
            &[r#"(type_spec name: (type_identifier) @name type: (interface_type)) @definition"#],
        ),
        (
            EntityKind::FunctionDefinition,
            &[
                r#"(function_declaration name: (identifier) @name) @definition"#,
                r#"(method_declaration
                    receiver: (parameter_list
                        (parameter_declaration
                            type: [(type_identifier) @owner
                                   (pointer_type (type_identifier) @owner)
                                   (generic_type type: (type_identifier) @owner)
                                   (pointer_type (generic_type type: (type_identifier) @owner))]))
                    name: (field_identifier) @name) @definition"#,
                r#"(method_elem name: (field_identifier) @name) @definition"#,
            ],
        ),
        (
            EntityKind::Parameter,
            &[
                r#"(function_declaration
                    parameters: (parameter_list
                        [(parameter_declaration name: (identifier) @name)
                         (variadic_parameter_declaration name: (identifier) @name)] @definition))"#,
                r#"(method_declaration
                    parameters: (parameter_list
                        [(parameter_declaration name: (identifier) @name)
                         (variadic_parameter_declaration name: (identifier) @name)] @definition))"#,
            ],
        ),
        (
            EntityKind::AttributeDeclaration,
            &[r#"(field_declaration name: (field_identifier) @name) @definition"#],
        ),
        (
            EntityKind::VariableDeclaration,
            &[
                r#"(source_file (const_declaration (const_spec name: (identifier) @name) @definition))"#,
                r#"(source_file (var_declaration (var_spec name: (identifier) @name) @definition))"#,
                r#"(source_file (var_declaration (var_spec_list (var_spec name: (identifier) @name) @definition)))"#,
            ],
        ),
        (EntityKind::Comment, &[r#"(comment) @definition"#]),
        (
            EntityKind::CallSite,
            &[
                r#"(call_expression function: (identifier) @name) @definition"#,
                r#"(call_expression
                    function: (selector_expression operand: (_) @receiver field: (field_identifier) @name)) @definition"#,
            ],
        ),
        (
            EntityKind::ImportDeclaration,
            &[
                r#"(import_spec path: (interpreted_string_literal (interpreted_string_literal_content) @path)) @definition"#,
                r#"(import_spec path: (raw_string_literal (raw_string_literal_content) @path)) @definition"#,
            ],
        ),
        (
            EntityKind::Inheritance,
            &[
                r#"(field_declaration_list
                    (field_declaration
                        !name
                        type: [(type_identifier) @supertype
                               (qualified_type name: (type_identifier) @supertype)]))"#,
                r#"(interface_type (type_elem (type_identifier) @supertype))"#,
            ],
        ),
    ],
    imports: ImportConvention::Directory,
    tests: &[TestConvention::Prefix("Test")],
};
