//! Tree-sitter parsing shared across languages.

use std::time::Duration;

use thiserror::Error;
use tree_sitter::{Node, Parser as TSParser, Tree};

use super::{Language, LanguageQueries};

/// Why a file did not yield a usable syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Failed to set {language} grammar: {message}")]
    Grammar { language: Language, message: String },

    #[error("Parsing timed out after {millis} ms")]
    Timeout { millis: u64 },

    #[error("Syntax error at line {line}")]
    Syntax { line: u32 },

    #[error("Parser produced no tree")]
    Failed,
}

/// Parses source text into a tree-sitter tree.
///
/// In strict mode a tree containing any `ERROR` or `MISSING` node is a
/// [`ParseError::Syntax`]; otherwise the partial tree is returned.
#[derive(Debug, Clone, Copy)]
pub struct SyntaxParser {
    timeout: Option<Duration>,
    strict: bool,
}

impl SyntaxParser {
    pub fn new(timeout: Option<Duration>, strict: bool) -> Self {
        Self { timeout, strict }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Parse source code into a tree-sitter tree.
    pub fn parse(&self, queries: &LanguageQueries, content: &str) -> Result<Tree, ParseError> {
        let mut parser = TSParser::new();
        parser
            .set_language(&queries.grammar)
            .map_err(|e| ParseError::Grammar {
                language: queries.language(),
                message: e.to_string(),
            })?;
        if let Some(timeout) = self.timeout {
            parser.set_timeout_micros(u64::try_from(timeout.as_micros()).unwrap_or(u64::MAX));
        }

        let tree = match parser.parse(content, None) {
            Some(tree) => tree,
            None => {
                return Err(match self.timeout {
                    Some(timeout) => ParseError::Timeout {
                        millis: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    },
                    None => ParseError::Failed,
                })
            }
        };

        if self.strict {
            if let Some(node) = first_error(tree.root_node()) {
                return Err(ParseError::Syntax {
                    line: node_line(&node),
                });
            }
        }
        Ok(tree)
    }
}

/// First `ERROR` or `MISSING` node in document order.
pub fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    if !root.has_error() {
        return None;
    }
    let mut node = root;
    'descend: loop {
        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            if child.is_error() || child.is_missing() {
                return Some(child);
            }
            if child.has_error() {
                node = child;
                continue 'descend;
            }
        }
        return Some(node);
    }
}

/// Get text for a node from source content.
pub fn node_text<'a>(node: &Node, content: &'a str) -> &'a str {
    content.get(node.byte_range()).unwrap_or("")
}

/// Get line number (1-based) for a node.
pub fn node_line(node: &Node) -> u32 {
    node.start_position().row as u32 + 1
}

/// Get end line number (1-based) for a node.
///
/// A node ending at column 0 stops at the newline of the previous line.
pub fn node_end_line(node: &Node) -> u32 {
    let end = node.end_position();
    if end.column == 0 && end.row > node.start_position().row {
        end.row as u32
    } else {
        end.row as u32 + 1
    }
}
