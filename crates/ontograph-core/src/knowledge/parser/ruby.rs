//! Ruby query table.

use super::{ImportConvention, Language, LanguageSpec, TestConvention};
use crate::knowledge::models::EntityKind;

fn grammar() -> tree_sitter::Language {
    tree_sitter_ruby::LANGUAGE.into()
}

pub(super) static SPEC: LanguageSpec = LanguageSpec {
    language: Language::Ruby,
    name: "Ruby",
    extensions: &["rb", "rake", "gemspec"],
    grammar,
    queries: &[
        (
            EntityKind::ModuleDefinition,
            &[
                r#"(module name: (constant) @name) @definition"#,
                r#"(module name: (scope_resolution name: (constant) @name)) @definition"#,
            ],
        ),
        (
            EntityKind::ClassDefinition,
            &[
                r#"(class name: (constant) @name) @definition"#,
                r#"(class name: (scope_resolution name: (constant) @name)) @definition"#,
            ],
        ),
        (
            EntityKind::FunctionDefinition,
            &[
                r#"(method name: (_) @name) @definition"#,
                r#"(singleton_method name: (_) @name) @definition"#,
            ],
        ),
        (
            EntityKind::Parameter,
            &[
                r#"(method
                    parameters: (method_parameters
                        [(identifier) @name
                         (optional_parameter name: (identifier) @name)
                         (keyword_parameter name: (identifier) @name)
                         (splat_parameter name: (identifier) @name)
                         (hash_splat_parameter name: (identifier) @name)
                         (block_parameter name: (identifier) @name)] @definition))"#,
                r#"(singleton_method
                    parameters: (method_parameters
                        [(identifier) @name
                         (optional_parameter name: (identifier) @name)
                         (keyword_parameter name: (identifier) @name)
                         (splat_parameter name: (identifier) @name)
                         (hash_splat_parameter name: (identifier) @name)
                         (block_parameter name: (identifier) @name)] @definition))"#,
            ],
        ),
        (
            EntityKind::AttributeDeclaration,
            &[
                r#"(assignment left: (instance_variable) @name) @definition"#,
                r#"(call
                    !receiver
                    method: (identifier) @_macro
                    arguments: (argument_list (simple_symbol) @name)
                    (#any-of? @_macro "attr_accessor" "attr_reader" "attr_writer")) @definition"#,
            ],
        ),
        (
            EntityKind::VariableDeclaration,
            &[r#"(program (assignment left: [(constant) (identifier)] @name) @definition)"#],
        ),
        (EntityKind::Comment, &[r#"(comment) @definition"#]),
        (
            EntityKind::CallSite,
            &[
                r#"(call !receiver method: (identifier) @name) @definition"#,
                r#"(call receiver: (_) @receiver method: (identifier) @name) @definition"#,
                r#"(call
                    receiver: (constant) @name
                    method: (identifier) @_new
                    (#eq? @_new "new")) @definition"#,
            ],
        ),
        (
            EntityKind::ImportDeclaration,
            &[r#"(call
                !receiver
                method: (identifier) @_require
                arguments: (argument_list . (string (string_content) @path))
                (#any-of? @_require "require" "require_relative" "load")) @definition"#],
        ),
        (
            EntityKind::Inheritance,
            &[
                r#"(class superclass: (superclass (constant) @supertype))"#,
                r#"(class superclass: (superclass (scope_resolution name: (constant) @supertype)))"#,
                r#"(call
                    !receiver
                    method: (identifier) @_mixin
                    arguments: (argument_list (constant) @supertype)
                    (#any-of? @_mixin "include" "extend" "prepend"))"#,
            ],
        ),
    ],
    imports: ImportConvention::Feature {
        extensions: &["rb"],
    },
    tests: &[TestConvention::Prefix("test_")],
};
