//! Rust query table.
//!
//! Methods live in `impl` blocks, which are not entities themselves; the
//! `@owner` capture names the implemented type so methods can be attached to
//! the struct, enum or trait declared in the same file.

use super::{ImportConvention, Language, LanguageSpec, TestConvention};
use crate::knowledge::models::EntityKind;

fn grammar() -> tree_sitter::Language {
    tree_sitter_rust::LANGUAGE.into()
}

pub(super) static SPEC: LanguageSpec = LanguageSpec {
    language: Language::Rust,
    name: "Rust",
    extensions: &["rs"],
    grammar,
    queries: &[
        (
            EntityKind::ModuleDefinition,
            &[r#"(mod_item name: (identifier) @name body: (declaration_list)) @definition"#],
        ),
        (
            EntityKind::StructDefinition,
            &[
                r#"(struct_item name: (type_identifier) @name) @definition"#,
                r#"(union_item name: (type_identifier) @name) @definition"#,
            ],
        ),
        (
            EntityKind::EnumDefinition,
            &[r#"(enum_item name: (type_identifier) @name) @definition"#],
        ),
        (
            EntityKind::InterfaceDefinition,
            &[r#"(trait_item name: (type_identifier) @name) @definition"#],
        ),
        (
            EntityKind::FunctionDefinition,
            &[
                r#"(function_item name: (identifier) @name) @definition"#,
                r#"(function_signature_item name: (identifier) @name) @definition"#,
                r#"(impl_item
                    type: [(type_identifier) @owner (generic_type type: (type_identifier) @owner)]
                    body: (declaration_list (function_item name: (identifier) @name) @definition))"#,
            ],
        ),
        (
            EntityKind::Parameter,
            &[
                r#"(function_item
                    parameters: (parameters (parameter pattern: (identifier) @name) @definition))"#,
                r#"(function_signature_item
                    parameters: (parameters (parameter pattern: (identifier) @name) @definition))"#,
            ],
        ),
        (
            EntityKind::AttributeDeclaration,
            &[
                r#"(field_declaration name: (field_identifier) @name) @definition"#,
                r#"(enum_variant name: (identifier) @name) @definition"#,
            ],
        ),
        (
            EntityKind::VariableDeclaration,
            &[
                r#"(const_item name: (identifier) @name) @definition"#,
                r#"(static_item name: (identifier) @name) @definition"#,
            ],
        ),
        (
            EntityKind::Comment,
            &[r#"(line_comment) @definition"#, r#"(block_comment) @definition"#],
        ),
        (
            EntityKind::CallSite,
            &[
                r#"(call_expression function: (identifier) @name) @definition"#,
                r#"(call_expression
                    function: (field_expression value: (_) @receiver field: (field_identifier) @name)) @definition"#,
                r#"(call_expression
                    function: (scoped_identifier path: (_) @receiver name: (identifier) @name)) @definition"#,
                r#"(call_expression
                    function: (generic_function function: (identifier) @name)) @definition"#,
                r#"(call_expression
                    function: (generic_function
                        function: (scoped_identifier path: (_) @receiver name: (identifier) @name))) @definition"#,
            ],
        ),
        (
            EntityKind::ImportDeclaration,
            &[
                r#"(use_declaration argument: (_) @path) @definition"#,
                r#"(mod_item name: (identifier) @path !body) @definition"#,
            ],
        ),
        (
            EntityKind::Inheritance,
            &[
                r#"(impl_item
                    trait: [(type_identifier) @supertype
                            (scoped_type_identifier name: (type_identifier) @supertype)
                            (generic_type type: (type_identifier) @supertype)]
                    type: [(type_identifier) @owner (generic_type type: (type_identifier) @owner)])"#,
                r#"(trait_item bounds: (trait_bounds (type_identifier) @supertype))"#,
            ],
        ),
    ],
    imports: ImportConvention::ModulePath,
    tests: &[TestConvention::Prefix("test_"), TestConvention::Suffix("_test")],
};
