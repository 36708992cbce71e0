//! Repository walk.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use super::telemetry::{FailureEvent, Stage};
use crate::classify::normalize_path;
use crate::config::ExtractionConfig;

/// A file found under the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Forward-slash path relative to the root.
    pub relative_path: String,
    pub absolute_path: PathBuf,
    pub size: u64,
}

/// Result of walking a repository.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Sorted by relative path.
    pub files: Vec<DiscoveredFile>,
    pub failures: Vec<FailureEvent>,
}

/// Walk `root`, honouring `.gitignore` and hidden-file settings.
///
/// Files over `max_file_size` are skipped and reported as `discover`
/// failures, as are entries the walker could not read.
pub fn discover(root: &Path, config: &ExtractionConfig) -> Discovery {
    let mut discovery = Discovery::default();

    let walker = WalkBuilder::new(root)
        .hidden(!config.include_hidden)
        .git_ignore(config.follow_gitignore)
        .git_global(config.follow_gitignore)
        .git_exclude(config.follow_gitignore)
        .ignore(config.follow_gitignore)
        .parents(config.follow_gitignore)
        .require_git(false)
        .follow_links(false)
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err_path(&err).unwrap_or_default();
                discovery
                    .failures
                    .push(FailureEvent::new(path, Stage::Discover, err.to_string()));
                continue;
            }
        };

        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let path = entry.path();
        let relative = match path.strip_prefix(root) {
            Ok(relative) => normalize_path(&relative.to_string_lossy()),
            Err(_) => continue,
        };
        if relative.is_empty() {
            continue;
        }

        let size = match entry.metadata() {
            Ok(metadata) => metadata.len(),
            Err(err) => {
                discovery
                    .failures
                    .push(FailureEvent::new(relative, Stage::Discover, err.to_string()));
                continue;
            }
        };
        if size > config.max_file_size {
            discovery.failures.push(FailureEvent::new(
                relative,
                Stage::Discover,
                format!("{} bytes exceeds the {} byte limit", size, config.max_file_size),
            ));
            continue;
        }

        discovery.files.push(DiscoveredFile {
            relative_path: relative,
            absolute_path: path.to_path_buf(),
            size,
        });
    }

    discovery
        .files
        .sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    tracing::debug!(
        root = %root.display(),
        files = discovery.files.len(),
        skipped = discovery.failures.len(),
        "Discovered files"
    );
    discovery
}

fn err_path(err: &ignore::Error) -> Option<String> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.display().to_string()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => err_path(err),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, path: &str, content: &str) {
        let full = root.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    #[test]
    fn test_discover_sorted_relative_paths() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/b.py", "x = 1\n");
        write(dir.path(), "src/a.py", "x = 1\n");
        write(dir.path(), "README.md", "# hi\n");

        let discovery = discover(dir.path(), &ExtractionConfig::default());
        let paths: Vec<&str> = discovery.files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["README.md", "src/a.py", "src/b.py"]);
        assert!(discovery.failures.is_empty());
    }

    #[test]
    fn test_gitignore_and_hidden() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".gitignore", "build/\n");
        write(dir.path(), "build/out.js", "x\n");
        write(dir.path(), ".secret/key.txt", "k\n");
        write(dir.path(), "main.go", "package main\n");

        let discovery = discover(dir.path(), &ExtractionConfig::default());
        let paths: Vec<&str> = discovery.files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["main.go"]);

        let config = ExtractionConfig {
            follow_gitignore: false,
            include_hidden: true,
            ..ExtractionConfig::default()
        };
        let discovery = discover(dir.path(), &config);
        let paths: Vec<&str> = discovery.files.iter().map(|f| f.relative_path.as_str()).collect();
        assert!(paths.contains(&"build/out.js"));
        assert!(paths.contains(&".secret/key.txt"));
    }

    #[test]
    fn test_oversized_files_are_reported() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "big.txt", &"x".repeat(64));
        write(dir.path(), "small.txt", "x");
        let config = ExtractionConfig {
            max_file_size: 16,
            ..ExtractionConfig::default()
        };
        let discovery = discover(dir.path(), &config);
        assert_eq!(discovery.files.len(), 1);
        assert_eq!(discovery.failures.len(), 1);
        assert_eq!(discovery.failures[0].stage, Stage::Discover);
        assert_eq!(discovery.failures[0].path, "big.txt");
    }
}
