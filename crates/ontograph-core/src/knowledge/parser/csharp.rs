//! C# query table.

use super::{ImportConvention, Language, LanguageSpec, TestConvention};
use crate::knowledge::models::EntityKind;

fn grammar() -> tree_sitter::Language {
    tree_sitter_c_sharp::LANGUAGE.into()
}

pub(super) static SPEC: LanguageSpec = LanguageSpec {
    language: Language::CSharp,
    name: "C#",
    extensions: &["cs"],
    grammar,
    queries: &[
        (
            EntityKind::ModuleDefinition,
            &[r#"(namespace_declaration name: [(identifier) (qualified_name)] @name) @definition"#],
        ),
        (
            EntityKind::ClassDefinition,
            &[
                r#"(class_declaration name: (identifier) @name) @definition"#,
                r#"(record_declaration name: (identifier) @name) @definition"#,
            ],
        ),
        (
            EntityKind::StructDefinition,
            &[r#"(struct_declaration name: (identifier) @name) @definition"#],
        ),
        (
            EntityKind::InterfaceDefinition,
            &[r#"(interface_declaration name: (identifier) @name) @definition"#],
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
                r#"(local_function_statement name: (identifier) @name) @definition"#,
            ],
        ),
        (
            EntityKind::Parameter,
            &[
                r#"(method_declaration
                    parameters: (parameter_list (parameter name: (identifier) @name) @definition))"#,
                r#"(constructor_declaration
                    parameters: (parameter_list (parameter name: (identifier) @name) @definition))"#,
                r#"(local_function_statement
                    parameters: (parameter_list (parameter name: (identifier) @name) @definition))"#,
            ],
        ),
        (
            EntityKind::AttributeDeclaration,
            &[
                r#"(field_declaration
                    (variable_declaration (variable_declarator name: (identifier) @name))) @definition"#,
                r#"(property_declaration name: (identifier) @name) @definition"#,
                r#"(enum_member_declaration name: (identifier) @name) @definition"#,
            ],
        ),
        (EntityKind::Comment, &[r#"(comment) @definition"#]),
        (
            EntityKind::CallSite,
            &[
                r#"(invocation_expression function: (identifier) @name) @definition"#,
                r#"(invocation_expression function: (generic_name (identifier) @name)) @definition"#,
                r#"(invocation_expression
                    function: (member_access_expression
                        expression: (_) @receiver
                        name: [(identifier) @name (generic_name (identifier) @name)])) @definition"#,
                r#"(object_creation_expression
                    type: [(identifier) @name (generic_name (identifier) @name)]) @definition"#,
            ],
        ),
        (
            EntityKind::ImportDeclaration,
            &[r#"(using_directive [(identifier) (qualified_name)] @path) @definition"#],
        ),
        (
            EntityKind::Inheritance,
            &[r#"(base_list
                [(identifier) @supertype
                 (generic_name (identifier) @supertype)
                 (qualified_name name: (identifier) @supertype)])"#],
        ),
    ],
    imports: ImportConvention::PackagePath {
        extensions: &["cs"],
        snake_case: false,
    },
    tests: &[TestConvention::Prefix("Test")],
};
