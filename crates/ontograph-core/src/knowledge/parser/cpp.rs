//! C++ query table.
//!
//! Out-of-line member definitions (`void Widget::draw() {}`) carry the class
//! name in their qualified declarator, captured as `@owner`.

use super::{ImportConvention, Language, LanguageSpec, TestConvention};
use crate::knowledge::models::EntityKind;

fn grammar() -> tree_sitter::Language {
    tree_sitter_cpp::LANGUAGE.into()
}

pub(super) static SPEC: LanguageSpec = LanguageSpec {
    language: Language::Cpp,
    name: "C++",
    extensions: &["cc", "cpp", "cxx", "hpp", "hh", "hxx"],
    grammar,
    queries: &[
        (
            EntityKind::ModuleDefinition,
            &[r#"(namespace_definition name: (namespace_identifier) @name) @definition"#],
        ),
        (
            EntityKind::ClassDefinition,
            &[r#"(class_specifier name: (type_identifier) @name body: (field_declaration_list)) @definition"#],
        ),
        (
            EntityKind::StructDefinition,
            &[
                r#"(struct_specifier name: (type_identifier) @name body: (field_declaration_list)) @definition"#,
                r#"(union_specifier name: (type_identifier) @name body: (field_declaration_list)) @definition"#,
            ],
        ),
        (
            EntityKind::EnumDefinition,
            &[r#"(enum_specifier name: (type_identifier) @name body: (enumerator_list)) @definition"#],
        ),
        (
            EntityKind::FunctionDefinition,
            &[
                r#"(function_definition
                    declarator: (function_declarator
                        declarator: [(identifier) @name (field_identifier) @name])) @definition"#,
                r#"(function_definition
                    declarator: [(pointer_declarator
                                    declarator: (function_declarator
                                        declarator: [(identifier) @name (field_identifier) @name]))
                                 (reference_declarator
                                    (function_declarator
                                        declarator: [(identifier) @name (field_identifier) @name]))]) @definition"#,
                r#"(function_definition
                    declarator: (function_declarator
                        declarator: (qualified_identifier
                            scope: [(namespace_identifier) @owner (template_type name: (type_identifier) @owner)]
                            name: [(identifier) @name (destructor_name) @name]))) @definition"#,
                r#"(field_declaration_list
                    (field_declaration
                        declarator: (function_declarator declarator: (field_identifier) @name)) @definition)"#,
            ],
        ),
        (
            EntityKind::Parameter,
            &[r#"(function_definition
                declarator: (function_declarator
                    parameters: (parameter_list
                        [(parameter_declaration
                            declarator: [(identifier) @name
                                         (pointer_declarator declarator: (identifier) @name)
                                         (reference_declarator (identifier) @name)])
                         (optional_parameter_declaration
                            declarator: [(identifier) @name
                                         (pointer_declarator declarator: (identifier) @name)
                                         (reference_declarator (identifier) @name)])] @definition)))"#],
        ),
        (
            EntityKind::AttributeDeclaration,
            &[
                r#"(field_declaration
                    declarator: [(field_identifier) @name
                                 (pointer_declarator declarator: (field_identifier) @name)
                                 (reference_declarator (field_identifier) @name)
                                 (array_declarator declarator: (field_identifier) @name)]) @definition"#,
                r#"(enumerator name: (identifier) @name) @definition"#,
            ],
        ),
        (
            EntityKind::VariableDeclaration,
            &[r#"(translation_unit
                (declaration
                    declarator: [(identifier) @name
                                 (init_declarator declarator: (identifier) @name)]) @definition)"#],
        ),
        (EntityKind::Comment, &[r#"(comment) @definition"#]),
        (
            EntityKind::CallSite,
            &[
                r#"(call_expression function: (identifier) @name) @definition"#,
                r#"(call_expression function: (template_function name: (identifier) @name)) @definition"#,
                r#"(call_expression
                    function: (field_expression argument: (_) @receiver field: (field_identifier) @name)) @definition"#,
                r#"(call_expression
                    function: (qualified_identifier scope: (_) @receiver name: (identifier) @name)) @definition"#,
                r#"(new_expression type: (type_identifier) @name) @definition"#,
            ],
        ),
        (
            EntityKind::ImportDeclaration,
            &[
                r#"(preproc_include path: (string_literal (string_content) @path)) @definition"#,
                r#"(preproc_include path: (system_lib_string) @path) @definition"#,
            ],
        ),
        (
            EntityKind::Inheritance,
            &[r#"(base_class_clause
                [(type_identifier) @supertype
                 (template_type name: (type_identifier) @supertype)
                 (qualified_identifier name: (type_identifier) @supertype)])"#],
        ),
    ],
    imports: ImportConvention::Relative {
        extensions: &[],
        index_files: false,
        bare_is_external: false,
    },
    tests: &[TestConvention::Prefix("test_"), TestConvention::Prefix("Test")],
};
