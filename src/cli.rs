//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Hera - workplace accountability analyzer
///
/// Ingests documents about public companies and asks a local model for a
/// structured accountability analysis, cached per company.
///
/// Examples:
///   hera --ticker ZCORP --company-name "Zeta Corp"
///   hera --tickers ZCORP,ACME --documents ./exports --output report.md
///   hera --ticker ZCORP --skip-ingest --format json --output zcorp.json
///   hera --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Single ticker to process
    #[arg(
        short,
        long,
        value_name = "TICKER",
        conflicts_with = "tickers",
        required_unless_present_any = ["tickers", "init_config"]
    )]
    pub ticker: Option<String>,

    /// Several tickers to process in order (comma-separated)
    ///
    /// Example: --tickers ZCORP,ACME,INIT
    #[arg(long, value_name = "TICKERS", value_delimiter = ',')]
    pub tickers: Option<Vec<String>>,

    /// Company name for a single ticker
    ///
    /// Defaults to the stored company name, then the ticker itself.
    #[arg(
        short = 'n',
        long,
        value_name = "NAME",
        requires = "ticker",
        conflicts_with = "tickers"
    )]
    pub company_name: Option<String>,

    /// Directory of exported JSON document files
    #[arg(short, long, value_name = "DIR")]
    pub documents: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Ollama model to use for analysis
    ///
    /// Can also be set via HERA_MODEL env var or .hera.toml config.
    #[arg(short, long, env = "HERA_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Model request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Seconds to wait after ingestion before analyzing (0 disables)
    #[arg(long, value_name = "SECS")]
    pub settle: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .hera.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write a report of all successful analyses to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Skip document ingestion and analyze what is already stored
    #[arg(long)]
    pub skip_ingest: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .hera.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Normalized tickers in caller order, duplicates dropped.
    pub fn ticker_list(&self) -> Vec<String> {
        let raw: Vec<&String> = match (&self.ticker, &self.tickers) {
            (Some(t), _) => vec![t],
            (None, Some(ts)) => ts.iter().collect(),
            (None, None) => vec![],
        };

        let mut tickers: Vec<String> = Vec::new();
        for t in raw {
            let t = t.trim().to_uppercase();
            if !t.is_empty() && !tickers.contains(&t) {
                tickers.push(t);
            }
        }
        tickers
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.ticker_list().is_empty() {
            return Err("At least one non-empty ticker is required".to_string());
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref name) = self.company_name {
            if name.trim().is_empty() {
                return Err("Company name must not be empty".to_string());
            }
            if self.tickers.is_some() || self.ticker_list().len() != 1 {
                return Err("--company-name applies to a single --ticker only".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref dir) = self.documents {
            if !dir.is_dir() {
                return Err(format!("Documents directory does not exist: {}", dir.display()));
            }
        }

        Ok(())
    }
}
