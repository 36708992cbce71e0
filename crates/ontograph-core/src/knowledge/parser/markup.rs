//! Stylesheet and markup query tables.
//!
//! Neither language declares code constructs, so only comments and the
//! resources a document pulls in are extracted.

use super::{ImportConvention, Language, LanguageSpec};
use crate::knowledge::models::EntityKind;

fn css_grammar() -> tree_sitter::Language {
    tree_sitter_css::LANGUAGE.into()
}

fn html_grammar() -> tree_sitter::Language {
    tree_sitter_html::LANGUAGE.into()
}

const RELATIVE: ImportConvention = ImportConvention::Relative {
    extensions: &[],
    index_files: false,
    bare_is_external: false,
};

pub(super) static CSS_SPEC: LanguageSpec = LanguageSpec {
    language: Language::Css,
    name: "CSS",
    extensions: &["css"],
    grammar: css_grammar,
    queries: &[
        (EntityKind::Comment, &[r#"(comment) @definition"#]),
        (
            EntityKind::ImportDeclaration,
            &[
                r#"(import_statement (string_value) @path) @definition"#,
                r#"(import_statement
                    (call_expression
                        (function_name) @_function
                        (arguments (string_value) @path))
                    (#eq? @_function "url")) @definition"#,
            ],
        ),
    ],
    imports: RELATIVE,
    tests: &[],
};

pub(super) static HTML_SPEC: LanguageSpec = LanguageSpec {
    language: Language::Html,
    name: "HTML",
    extensions: &["html", "htm"],
    grammar: html_grammar,
    queries: &[
        (EntityKind::Comment, &[r#"(comment) @definition"#]),
        (
            EntityKind::ImportDeclaration,
            &[
                r#"(script_element
                    (start_tag
                        (attribute
                            (attribute_name) @_attribute
                            (quoted_attribute_value (attribute_value) @path)))
                    (#eq? @_attribute "src")) @definition"#,
                r#"(element
                    (start_tag
                        (tag_name) @_tag
                        (attribute
                            (attribute_name) @_attribute
                            (quoted_attribute_value (attribute_value) @path)))
                    (#eq? @_tag "link")
                    (#eq? @_attribute "href")) @definition"#,
            ],
        ),
    ],
    imports: RELATIVE,
    tests: &[],
};
