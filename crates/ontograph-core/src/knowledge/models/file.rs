//! Repository files.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::knowledge::parser::Language;

/// A classified repository file. Immutable once classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Deterministic id, see [`file_id`].
    pub id: String,
    pub repository_id: String,
    /// Forward-slash, repository-relative path.
    pub relative_path: String,
    /// Grammar used to parse the file, if one is supported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    /// Size in bytes.
    pub size: u64,
    pub class_carrier: String,
    pub class_content: String,
}

impl SourceFile {
    pub fn new(
        repository_id: &str,
        relative_path: &str,
        language: Option<Language>,
        size: u64,
        class_carrier: impl Into<String>,
        class_content: impl Into<String>,
    ) -> Self {
        Self {
            id: file_id(repository_id, relative_path),
            repository_id: repository_id.to_string(),
            relative_path: relative_path.to_string(),
            language,
            size,
            class_carrier: class_carrier.into(),
            class_content: class_content.into(),
        }
    }

    /// File name without directories.
    pub fn file_name(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.relative_path)
    }

    /// Directory part of the path (empty at the repository root).
    pub fn directory(&self) -> &str {
        match self.relative_path.rfind('/') {
            Some(i) => &self.relative_path[..i],
            None => "",
        }
    }
}

/// Where a file ended up in the per-file state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStatus {
    /// Parsed and extracted.
    Parsed,
    /// Parser error, strict-mode syntax error or timeout. No entities.
    ParseFailed,
    /// Classified only: no grammar for the file, or it could not be read.
    NotParsed,
}

impl ParseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ParseStatus::Parsed => "parsed",
            ParseStatus::ParseFailed => "parse_failed",
            ParseStatus::NotParsed => "not_parsed",
        }
    }
}

impl fmt::Display for ParseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file together with its terminal state for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub file: SourceFile,
    pub status: ParseStatus,
}

/// Deterministic file id over `(repository_id, relative_path)`.
pub fn file_id(repository_id: &str, relative_path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(repository_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(relative_path.as_bytes());
    format!("file:{}", hex::encode(hasher.finalize()))
}
