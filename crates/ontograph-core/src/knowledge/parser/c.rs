//! C query table.

use super::{ImportConvention, Language, LanguageSpec, TestConvention};
use crate::knowledge::models::EntityKind;

fn grammar() -> tree_sitter::Language {
    tree_sitter_c::LANGUAGE.into()
}

pub(super) static SPEC: LanguageSpec = LanguageSpec {
    language: Language::C,
    name: "C",
    extensions: &["c", "h"],
    grammar,
    queries: &[
        (
            EntityKind::StructDefinition,
            &[
                r#"(struct_specifier name: (type_identifier) @name body: (field_declaration_list)) @definition"#,
                r#"(union_specifier name: (type_identifier) @name body: (field_declaration_list)) @definition"#,
                r#"(type_definition
                    type: (struct_specifier !name body: (field_declaration_list))
                    declarator: (type_identifier) @name) @definition"#,
            ],
        ),
        (
            EntityKind::EnumDefinition,
            &[
                r#"(enum_specifier name: (type_identifier) @name body: (enumerator_list)) @definition"#,
                r#"(type_definition
                    type: (enum_specifier !name body: (enumerator_list))
                    declarator: (type_identifier) @name) @definition"#,
            ],
        ),
        (
            EntityKind::FunctionDefinition,
            &[
                r#"(function_definition
                    declarator: (function_declarator declarator: (identifier) @name)) @definition"#,
                r#"(function_definition
                    declarator: (pointer_declarator
                        declarator: (function_declarator declarator: (identifier) @name))) @definition"#,
            ],
        ),
        (
            EntityKind::Parameter,
            &[r#"(function_definition
                declarator: [(function_declarator
                                parameters: (parameter_list
                                    (parameter_declaration
                                        declarator: [(identifier) @name
                                                     (pointer_declarator declarator: (identifier) @name)
                                                     (array_declarator declarator: (identifier) @name)]) @definition))
                             (pointer_declarator
                                declarator: (function_declarator
                                    parameters: (parameter_list
                                        (parameter_declaration
                                            declarator: [(identifier) @name
                                                         (pointer_declarator declarator: (identifier) @name)
                                                         (array_declarator declarator: (identifier) @name)]) @definition)))])"#],
        ),
        (
            EntityKind::AttributeDeclaration,
            &[
                r#"(field_declaration
                    declarator: [(field_identifier) @name
                                 (pointer_declarator declarator: (field_identifier) @name)
                                 (array_declarator declarator: (field_identifier) @name)]) @definition"#,
                r#"(enumerator name: (identifier) @name) @definition"#,
            ],
        ),
        (
            EntityKind::VariableDeclaration,
            &[
                r#"(translation_unit
                    (declaration
                        declarator: [(identifier) @name
                                     (init_declarator declarator: (identifier) @name)
                                     (init_declarator declarator: (pointer_declarator declarator: (identifier) @name))]) @definition)"#,
            ],
        ),
        (EntityKind::Comment, &[r#"(comment) @definition"#]),
        (
            EntityKind::CallSite,
            &[
                r#"(call_expression function: (identifier) @name) @definition"#,
                r#"(call_expression
                    function: (field_expression argument: (_) @receiver field: (field_identifier) @name)) @definition"#,
            ],
        ),
        (
            EntityKind::ImportDeclaration,
            &[
                r#"(preproc_include path: (string_literal (string_content) @path)) @definition"#,
                r#"(preproc_include path: (system_lib_string) @path) @definition"#,
            ],
        ),
    ],
    imports: ImportConvention::Relative {
        extensions: &[],
        index_files: false,
        bare_is_external: false,
    },
    tests: &[TestConvention::Prefix("test_")],
};
