//! Bash query table.

use super::{ImportConvention, Language, LanguageSpec, TestConvention};
use crate::knowledge::models::EntityKind;

fn grammar() -> tree_sitter::Language {
    tree_sitter_bash::LANGUAGE.into()
}

pub(super) static SPEC: LanguageSpec = LanguageSpec {
    language: Language::Bash,
    name: "Bash",
    extensions: &["sh", "bash"],
    grammar,
    queries: &[
        (
            EntityKind::FunctionDefinition,
            &[r#"(function_definition name: (word) @name) @definition"#],
        ),
        (
            EntityKind::VariableDeclaration,
            &[
                r#"(program (variable_assignment name: (variable_name) @name) @definition)"#,
                r#"(program (declaration_command (variable_assignment name: (variable_name) @name) @definition))"#,
            ],
        ),
        (EntityKind::Comment, &[r#"(comment) @definition"#]),
        (
            EntityKind::CallSite,
            &[r#"(command
                name: (command_name (word) @name)
                (#not-any-of? @name "source" ".")) @definition"#],
        ),
        (
            EntityKind::ImportDeclaration,
            &[r#"(command
                name: (command_name (word) @_builtin)
                argument: [(word) (string) (raw_string)] @path
                (#any-of? @_builtin "source" ".")) @definition"#],
        ),
    ],
    imports: ImportConvention::Relative {
        extensions: &["sh", "bash"],
        index_files: false,
        bare_is_external: false,
    },
    tests: &[TestConvention::Prefix("test_")],
};
