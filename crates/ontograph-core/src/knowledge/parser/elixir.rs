//! Elixir query table.
//!
//! Elixir has no dedicated definition nodes: `defmodule`, `def` and friends
//! are ordinary calls, told apart by their target identifier.

use super::{ImportConvention, Language, LanguageSpec};
use crate::knowledge::models::EntityKind;

fn grammar() -> tree_sitter::Language {
    tree_sitter_elixir::LANGUAGE.into()
}

pub(super) static SPEC: LanguageSpec = LanguageSpec {
    language: Language::Elixir,
    name: "Elixir",
    extensions: &["ex", "exs"],
    grammar,
    queries: &[
        (
            EntityKind::ModuleDefinition,
            &[r#"(call
                target: (identifier) @_keyword
                (arguments . (alias) @name)
                (#eq? @_keyword "defmodule")) @definition"#],
        ),
        (
            EntityKind::InterfaceDefinition,
            &[r#"(call
                target: (identifier) @_keyword
                (arguments . (alias) @name)
                (#eq? @_keyword "defprotocol")) @definition"#],
        ),
        (
            EntityKind::FunctionDefinition,
            &[
                r#"(call
                    target: (identifier) @_keyword
                    (arguments . [(call target: (identifier) @name) (identifier) @name])
                    (#any-of? @_keyword "def" "defp" "defmacro" "defmacrop")) @definition"#,
                r#"(call
                    target: (identifier) @_keyword
                    (arguments . (binary_operator left: (call target: (identifier) @name) operator: "when"))
                    (#any-of? @_keyword "def" "defp" "defmacro" "defmacrop")) @definition"#,
            ],
        ),
        (
            EntityKind::Parameter,
            &[r#"(call
                target: (identifier) @_keyword
                (arguments . (call target: (identifier) (arguments (identifier) @name @definition)))
                (#any-of? @_keyword "def" "defp" "defmacro" "defmacrop"))"#],
        ),
        (
            EntityKind::AttributeDeclaration,
            &[r#"(call
                target: (identifier) @_keyword
                (arguments (list (atom) @name @definition))
                (#eq? @_keyword "defstruct"))"#],
        ),
        (EntityKind::Comment, &[r#"(comment) @definition"#]),
        (
            EntityKind::CallSite,
            &[
                r#"(call
                    target: (identifier) @name
                    (#not-any-of? @name
                        "def" "defp" "defmacro" "defmacrop" "defmodule" "defprotocol" "defimpl"
                        "defstruct" "alias" "import" "use" "require" "if" "unless" "case"
                        "cond" "with" "for" "quote" "unquote" "receive" "try")) @definition"#,
                r#"(call target: (dot left: (_) @receiver right: (identifier) @name)) @definition"#,
            ],
        ),
        (
            EntityKind::ImportDeclaration,
            &[r#"(call
                target: (identifier) @_keyword
                (arguments . (alias) @path)
                (#any-of? @_keyword "alias" "import" "use" "require")) @definition"#],
        ),
        (
            EntityKind::Inheritance,
            &[r#"(unary_operator
                operator: "@"
                operand: (call
                    target: (identifier) @_attribute
                    (arguments . (alias) @supertype))
                (#eq? @_attribute "behaviour"))"#],
        ),
    ],
    imports: ImportConvention::PackagePath {
        extensions: &["ex", "exs"],
        snake_case: true,
    },
    tests: &[],
};
