use ontograph_core::config::{
    DEFAULT_FOLLOW_GITIGNORE, DEFAULT_MAX_FILE_SIZE, DEFAULT_PARSE_TIMEOUT_MS, DEFAULT_STRICT_SYNTAX,
};
use ontograph_core::config::{ConfigError, ExtractionConfig};
use ontograph_core::Config;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.extraction.max_file_size, DEFAULT_MAX_FILE_SIZE);
    assert_eq!(config.extraction.parse_timeout_ms, DEFAULT_PARSE_TIMEOUT_MS);
    assert_eq!(config.extraction.strict_syntax, DEFAULT_STRICT_SYNTAX);
    assert_eq!(config.extraction.follow_gitignore, DEFAULT_FOLLOW_GITIGNORE);
    assert!(config.classification.rules_path.is_none());
    assert!(config.ontology.cache_path.is_none());
    assert!(config.output.path.is_none());
}

#[test]
fn test_config_to_toml() {
    let toml_str = Config::default_config_string();
    assert!(toml_str.contains("[extraction]"));
    assert!(toml_str.contains("max_file_size"));
}

#[test]
fn test_config_from_toml() {
    let toml_str = r#"
[extraction]
workers = 3
max_file_size = 200000
strict_syntax = false

[classification]
rules_path = "rules/custom.yaml"

[output]
path = "graph.jsonl"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.extraction.workers, 3);
    assert_eq!(config.extraction.max_file_size, 200000);
    assert!(!config.extraction.strict_syntax);
    assert_eq!(config.extraction.parse_timeout_ms, DEFAULT_PARSE_TIMEOUT_MS);
    assert_eq!(config.classification.rules_path, Some(PathBuf::from("rules/custom.yaml")));
    assert_eq!(config.output.path, Some(PathBuf::from("graph.jsonl")));
}

#[test]
fn test_effective_workers() {
    let config = ExtractionConfig {
        workers: 5,
        ..ExtractionConfig::default()
    };
    assert_eq!(config.effective_workers(), 5);

    let auto = ExtractionConfig {
        workers: 0,
        ..ExtractionConfig::default()
    };
    assert!(auto.effective_workers() >= 1);
}

#[test]
fn test_from_file_rejects_zero_timeout() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ontograph.toml");
    std::fs::write(&path, "[extraction]\nparse_timeout_ms = 0\n").unwrap();
    let err = Config::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_from_file_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ontograph.toml");
    std::fs::write(&path, "[extraction\n").unwrap();
    let err = Config::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}
