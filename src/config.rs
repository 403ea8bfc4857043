//! Configuration file handling.
//!
//! This module handles loading `.hera.toml` and merging it with
//! command-line arguments.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = ".hera.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Retrieval, caching and pipeline settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// SQLite database holding documents and analyses.
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Directory of exported document files.
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,

    /// Report output path. No report is written when unset.
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Content cap applied to documents at ingestion.
    #[serde(default = "default_max_document_chars")]
    pub max_document_chars: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            documents_dir: default_documents_dir(),
            output: None,
            verbose: false,
            max_document_chars: default_max_document_chars(),
        }
    }
}

fn default_database() -> PathBuf {
    PathBuf::from("hera.db")
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from("documents")
}

fn default_max_document_chars() -> usize {
    15000
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Default model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            ollama_url: default_ollama_url(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_timeout() -> u64 {
    300
}

/// Retrieval, caching and pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// How long a stored analysis is served from cache.
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,

    #[serde(default = "default_limit")]
    pub search_limit: usize,

    #[serde(default = "default_limit")]
    pub raw_limit: usize,

    /// Documents at or under this many characters are not evidence.
    #[serde(default = "default_min_content_length")]
    pub min_content_length: usize,

    /// Per-document content cap in the prompt.
    #[serde(default = "default_doc_truncate_chars")]
    pub doc_truncate_chars: usize,

    /// Phrase appended to the company name for indexed search.
    #[serde(default = "default_search_topic")]
    pub search_topic: String,

    /// Pause between ingestion and analysis so the index can catch up.
    #[serde(default = "default_index_settle_seconds")]
    pub index_settle_seconds: u64,

    /// Timeout for each store and search call.
    #[serde(default = "default_step_timeout_seconds")]
    pub step_timeout_seconds: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cache_ttl_hours: default_cache_ttl_hours(),
            search_limit: default_limit(),
            raw_limit: default_limit(),
            min_content_length: default_min_content_length(),
            doc_truncate_chars: default_doc_truncate_chars(),
            search_topic: default_search_topic(),
            index_settle_seconds: default_index_settle_seconds(),
            step_timeout_seconds: default_step_timeout_seconds(),
        }
    }
}

fn default_cache_ttl_hours() -> u64 {
    168 // one week
}

fn default_limit() -> usize {
    20
}

fn default_min_content_length() -> usize {
    50
}

fn default_doc_truncate_chars() -> usize {
    3000
}

fn default_search_topic() -> String {
    "workplace harassment discrimination".to_string()
}

fn default_index_settle_seconds() -> u64 {
    10
}

fn default_step_timeout_seconds() -> u64 {
    30
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence, but only when given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.ollama_url {
            self.model.ollama_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }

        if let Some(ref db) = args.db {
            self.general.database = db.clone();
        }
        if let Some(ref dir) = args.documents {
            self.general.documents_dir = dir.clone();
        }
        if let Some(ref output) = args.output {
            self.general.output = Some(output.clone());
        }

        if let Some(settle) = args.settle {
            self.analysis.index_settle_seconds = settle;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Log level after merging: `--quiet` wins, then `verbose` from either source.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.name, "llama3.2:latest");
        assert_eq!(config.model.timeout_seconds, 300);
        assert_eq!(config.analysis.cache_ttl_hours, 168);
        assert_eq!(config.analysis.min_content_length, 50);
        assert_eq!(config.analysis.doc_truncate_chars, 3000);
        assert_eq!(config.general.database, PathBuf::from("hera.db"));
        assert!(config.general.output.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
database = "/var/lib/hera/hera.db"
verbose = true

[model]
name = "mistral:7b"
temperature = 0.2

[analysis]
cache_ttl_hours = 24
search_topic = "retaliation lawsuit"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.database, PathBuf::from("/var/lib/hera/hera.db"));
        assert!(config.general.verbose);
        assert_eq!(config.model.name, "mistral:7b");
        assert_eq!(config.model.temperature, 0.2);
        assert_eq!(config.model.ollama_url, "http://localhost:11434");
        assert_eq!(config.analysis.cache_ttl_hours, 24);
        assert_eq!(config.analysis.search_topic, "retaliation lawsuit");
        assert_eq!(config.analysis.raw_limit, 20);
    }

    #[test]
    fn test_log_level_follows_merged_verbosity() {
        let mut config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        assert_eq!(config.log_level(false), tracing::Level::DEBUG);
        assert_eq!(config.log_level(true), tracing::Level::ERROR);

        config.general.verbose = false;
        assert_eq!(config.log_level(false), tracing::Level::INFO);
        config.merge_with_args(&Args::parse_from(["hera", "-t", "ZCORP", "-v"]));
        assert_eq!(config.log_level(false), tracing::Level::DEBUG);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[analysis]\nindex_settle_seconds = 0\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.analysis.index_settle_seconds, 0);

        std::fs::write(&path, "[analysis\n").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_merge_only_overrides_given_args() {
        let mut config: Config = toml::from_str("[model]\nname = \"from-file\"\n").unwrap();
        let args = Args::parse_from(["hera", "--ticker", "ZCORP", "--settle", "0", "--db", "x.db"]);

        config.merge_with_args(&args);
        assert_eq!(config.model.name, "from-file");
        assert_eq!(config.analysis.index_settle_seconds, 0);
        assert_eq!(config.general.database, PathBuf::from("x.db"));

        let args = Args::parse_from(["hera", "--ticker", "ZCORP", "--model", "from-cli"]);
        config.merge_with_args(&args);
        assert_eq!(config.model.name, "from-cli");
    }

    #[test]
    fn test_default_toml_round_trips() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[model]"));
        assert!(toml_str.contains("[analysis]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.analysis.search_topic, "workplace harassment discrimination");
    }
}
