//! Hera - workplace accountability analyzer
//!
//! A CLI tool that ingests documents about public companies and uses a
//! local Ollama model to produce cached, structured accountability
//! analyses.
//!
//! Exit codes:
//!   0 - Success (individual tickers may still lack an analysis)
//!   1 - Runtime error (config, database, model client, report write)

mod analysis;
mod cli;
mod config;
mod error;
mod ingest;
mod llm;
mod models;
mod pipeline;
mod providers;
mod report;
mod search;
mod store;

use analysis::{Orchestrator, OrchestratorConfig};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use llm::{OllamaClient, OllamaConfig};
use models::AnalysisRecord;
use pipeline::{resolve_company_name, Pipeline, TickerOutcome};
use providers::{DocumentProvider, JsonFileProvider};
use report::{Report, ReportMetadata};
use search::{SearchIndex, SqliteSearchIndex};
use std::sync::Arc;
use std::time::{Duration, Instant};
use store::SqliteStore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config comes first so its `verbose` setting can raise the log level.
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(config.log_level(args.quiet));

    info!("Hera v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Config: {:?}", config);

    if let Err(e) = run(args, config).await {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .hera.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize the database, model, and retrieval limits.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Process every ticker, then write the optional report.
async fn run(args: Args, config: Config) -> Result<()> {
    let start_time = Instant::now();

    let tickers = args.ticker_list();

    println!("🗄️  Opening database: {}", config.general.database.display());
    let store = SqliteStore::open(&config.general.database)
        .await
        .with_context(|| {
            format!("Failed to open database {}", config.general.database.display())
        })?;

    let search: Arc<dyn SearchIndex> = match SqliteSearchIndex::create(&store).await {
        Ok(index) => Arc::new(index),
        Err(e) => {
            warn!("Search index unavailable, raw documents only: {}", e);
            Arc::new(SqliteSearchIndex::attach(&store))
        }
    };

    println!("🤖 Model: {} at {}", config.model.name, config.model.ollama_url);
    println!("   Timeout: {}s", config.model.timeout_seconds);
    let model = OllamaClient::new(OllamaConfig {
        ollama_url: config.model.ollama_url.clone(),
        temperature: config.model.temperature,
        timeout_seconds: config.model.timeout_seconds,
    })
    .context("Failed to create model client")?;

    let store = Arc::new(store);
    let step_timeout = Duration::from_secs(config.analysis.step_timeout_seconds);
    let orchestrator = Orchestrator::new(
        store.clone(),
        store.clone(),
        search,
        Arc::new(model),
        OrchestratorConfig::from(&config),
    );

    let providers: Vec<Box<dyn DocumentProvider>> = vec![Box::new(JsonFileProvider::new(
        config.general.documents_dir.clone(),
        config.general.max_document_chars,
    ))];

    let pipeline = Pipeline::new(
        providers,
        store.clone(),
        orchestrator,
        Duration::from_secs(config.analysis.index_settle_seconds),
        step_timeout,
        args.skip_ingest,
    );

    let mut records: Vec<AnalysisRecord> = Vec::new();
    let mut failed: Vec<String> = Vec::new();

    for ticker in &tickers {
        let name = resolve_company_name(
            store.as_ref(),
            ticker,
            args.company_name.as_deref(),
            step_timeout,
        )
        .await;

        println!("\n{}", "=".repeat(50));
        println!("🏢 {} ({})", name, ticker);
        println!("{}", "=".repeat(50));

        let spinner = spinner(&args, ticker);
        let outcome = pipeline.process_ticker(ticker, &name).await;
        spinner.finish_and_clear();

        print_outcome(&outcome, args.skip_ingest);
        match outcome.analysis {
            Some(record) => records.push(record),
            None => failed.push(outcome.ticker),
        }
    }

    println!("\n✅ All done! Processed {} ticker(s).", tickers.len());

    if let Some(ref path) = config.general.output {
        let report = Report::new(
            ReportMetadata {
                generated_at: Utc::now(),
                model_used: config.model.name.clone(),
                prompt_version: analysis::prompt::PROMPT_VERSION.to_string(),
                tickers_processed: tickers.len(),
                failed_tickers: failed,
                duration_seconds: start_time.elapsed().as_secs_f64(),
            },
            records,
        );

        let output = match args.format {
            OutputFormat::Json => report::generate_json_report(&report)?,
            OutputFormat::Markdown => report::generate_markdown_report(&report),
        };
        std::fs::write(path, &output)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!("📝 Report saved to: {}", path.display());
    }

    Ok(())
}

fn spinner(args: &Args, ticker: &str) -> ProgressBar {
    if args.quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!("Analyzing {}...", ticker));
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn print_outcome(outcome: &TickerOutcome, skip_ingest: bool) {
    if !skip_ingest {
        println!(
            "📥 Documents: {} fetched, {} new",
            outcome.fetched, outcome.stored
        );
    }

    match outcome.analysis {
        Some(ref record) => {
            let verdict = record.verdict();
            println!(
                "📊 Score: {}/10 (data quality: {}) {} {}",
                record.accountability_score,
                record.data_quality,
                verdict.emoji(),
                verdict
            );
            println!("   Summary: {}", record.summary);
        }
        None => println!(
            "⚠️  Analysis failed or no data for {} ({})",
            outcome.company_name, outcome.ticker
        ),
    }
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Ignoring {}: {:#}", DEFAULT_CONFIG_FILE, e);
            Ok(Config::default())
        }
    }
}
