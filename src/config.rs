//! Configuration module for symdex.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`.symdex/settings.toml`)
//! - Environment variable overrides
//! - CLI argument overrides (applied by the binary)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `SYMDEX_` and use double
//! underscores to separate nested levels:
//! - `SYMDEX_EMBEDDINGS__BATCH_SIZE=16` sets `embeddings.batch_size`
//! - `SYMDEX_SEARCH__DEFAULT_K=10` sets `search.default_k`
//! - `SYMDEX_LOGGING__LEVEL=debug` sets `logging.level`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding the workspace configuration
pub const CONFIG_DIR: &str = ".symdex";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Path to the binary SCIP index
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Directory the index's relative paths are resolved against
    #[serde(default = "default_source_root")]
    pub source_root: PathBuf,

    /// Workspace root directory (where .symdex is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Embedding map settings
    #[serde(default)]
    pub embeddings: EmbeddingConfig,

    /// Similarity search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// Where the embedding map is saved
    #[serde(default = "default_embeddings_path")]
    pub path: PathBuf,

    /// Model to use for embeddings
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Symbols per chunk; the map is checkpointed after each chunk
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Embed the symbols of a chunk concurrently
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Number of worker threads when `parallel` is set
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,

    /// Symbols whose URI contains any of these substrings are not embedded
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,

    /// Save the map to `path` after every chunk
    #[serde(default = "default_true")]
    pub checkpoint: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SearchConfig {
    /// Number of results when none is requested
    #[serde(default = "default_k")]
    pub default_k: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Colored output
    #[serde(default = "default_true")]
    pub ansi: bool,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_index_path() -> PathBuf {
    PathBuf::from("index.scip")
}
fn default_source_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_embeddings_path() -> PathBuf {
    PathBuf::from(".symdex/embeddings.json")
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_parallel_threads() -> usize {
    num_cpus::get()
}
fn default_denylist() -> Vec<String> {
    ["__init__", "setUp", "test", "local"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_true() -> bool {
    true
}
fn default_k() -> usize {
    5
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            index_path: default_index_path(),
            source_root: default_source_root(),
            workspace_root: None,
            embeddings: EmbeddingConfig::default(),
            search: SearchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            path: default_embeddings_path(),
            model: default_embedding_model(),
            batch_size: default_batch_size(),
            parallel: true,
            parallel_threads: default_parallel_threads(),
            denylist: default_denylist(),
            checkpoint: true,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_k: default_k(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            ansi: true,
        }
    }
}

impl EmbeddingConfig {
    /// Whether `uri` hits the denylist
    pub fn is_denied(&self, uri: &str) -> bool {
        self.denylist.iter().any(|marker| uri.contains(marker.as_str()))
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        // Try to find the workspace root by looking for .symdex directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                // If workspace_root is not set in config, detect it
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels, single underscores
            // stay inside field names
            .merge(Env::prefixed("SYMDEX_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the settings file by looking for a .symdex directory from the
    /// current directory up to the filesystem root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join("settings.toml"))
    }

    /// Get the workspace root directory (where .symdex is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Resolve a configured path against the workspace root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.workspace_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        Self::init_config_file_in(Path::new("."), force)
    }

    /// Like [`Settings::init_config_file`], below `dir` instead of the
    /// current directory
    pub fn init_config_file_in(dir: &Path, force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = dir.join(CONFIG_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = format!(
            r#"# symdex configuration file

# Version of the configuration schema
version = 1

# Binary SCIP index produced by an external indexer
index_path = "index.scip"

# Directory the index's document paths are relative to
source_root = "."

[embeddings]
# Where the embedding map is stored
path = ".symdex/embeddings.json"

# Model to use for embeddings
model = "AllMiniLML6V2"

# Symbols per chunk; a checkpoint is written after each chunk
batch_size = 64

# Embed the symbols of a chunk on a thread pool
parallel = true

# Number of worker threads (defaults to CPU count)
# parallel_threads = {}

# Symbols whose URI contains one of these substrings are skipped
denylist = ["__init__", "setUp", "test", "local"]

# Save the map after every chunk
checkpoint = true

[search]
# Number of results returned by `search` when -k is not given
default_k = 5

[logging]
# Default log filter, RUST_LOG takes precedence
level = "info"

# Colored output
ansi = true
"#,
            num_cpus::get()
        );

        std::fs::write(&config_path, template)?;
        Ok(config_path)
    }
}
