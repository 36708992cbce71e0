//! Default values for ontograph configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Extraction Defaults
// ============================================================================

/// Worker count used when none is configured. Zero means "one per CPU".
pub const DEFAULT_WORKERS: usize = 0;

/// Files larger than this are skipped during discovery (2 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 2 * 1024 * 1024;

/// Per-file parse budget in milliseconds.
pub const DEFAULT_PARSE_TIMEOUT_MS: u64 = 5_000;

/// Treat any syntax error node in a tree as a parse failure.
pub const DEFAULT_STRICT_SYNTAX: bool = true;

/// Honour `.gitignore` / `.ignore` files while walking.
pub const DEFAULT_FOLLOW_GITIGNORE: bool = true;

/// Walk hidden files and directories.
pub const DEFAULT_INCLUDE_HIDDEN: bool = false;

// ============================================================================
// Config file locations
// ============================================================================

/// Project-local config file name.
pub const DEFAULT_CONFIG_FILE: &str = "ontograph.toml";

/// Directory under the platform config dir holding the user config.
pub const DEFAULT_CONFIG_DIR: &str = "ontograph";

/// User config file name inside [`DEFAULT_CONFIG_DIR`].
pub const DEFAULT_USER_CONFIG_FILE: &str = "config.toml";

// ============================================================================
// Environment variable names
// ============================================================================

pub const ENV_WORKERS: &str = "ONTOGRAPH_WORKERS";
pub const ENV_MAX_FILE_SIZE: &str = "ONTOGRAPH_MAX_FILE_SIZE";
pub const ENV_PARSE_TIMEOUT_MS: &str = "ONTOGRAPH_PARSE_TIMEOUT_MS";
pub const ENV_STRICT_SYNTAX: &str = "ONTOGRAPH_STRICT_SYNTAX";
pub const ENV_RULES_PATH: &str = "ONTOGRAPH_RULES_PATH";
pub const ENV_ONTOLOGY_CACHE: &str = "ONTOGRAPH_ONTOLOGY_CACHE";
pub const ENV_OUTPUT: &str = "ONTOGRAPH_OUTPUT";
