//! The analysis orchestrator.

use crate::analysis::aggregator::ContextAggregator;
use crate::analysis::prompt::build_prompt;
use crate::analysis::quality;
use crate::analysis::repair::{invoke_with_repair, AnalysisError};
use crate::analysis::retrieval::{retrieve, RetrievalParams};
use crate::analysis::sentiment::{LexiconSentiment, SentimentScorer};
use crate::analysis::with_timeout;
use crate::config::Config;
use crate::llm::CompletionModel;
use crate::models::{AnalysisRecord, Company, ModelAnalysis, SourceType};
use crate::search::SearchIndex;
use crate::store::{AnalysisStore, DocumentStore};
use chrono::{DateTime, SubsecRound, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Orchestrator settings, derived from [`Config`].
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Model identifier passed to the completion service.
    pub model_name: String,
    pub model_timeout: Duration,
    /// How long a stored analysis may be served from cache.
    pub cache_ttl: chrono::Duration,
    pub retrieval: RetrievalParams,
}

/// Upper bound on the cache TTL (100 years); larger values are clamped.
const MAX_CACHE_TTL_HOURS: u64 = 24 * 365 * 100;

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            model_name: "llama3.2:latest".to_string(),
            model_timeout: Duration::from_secs(300),
            cache_ttl: chrono::Duration::hours(168),
            retrieval: RetrievalParams::default(),
        }
    }
}

impl From<&Config> for OrchestratorConfig {
    fn from(config: &Config) -> Self {
        let analysis = &config.analysis;
        Self {
            model_name: config.model.name.clone(),
            model_timeout: Duration::from_secs(config.model.timeout_seconds),
            cache_ttl: chrono::Duration::hours(
                analysis.cache_ttl_hours.min(MAX_CACHE_TTL_HOURS) as i64,
            ),
            retrieval: RetrievalParams {
                search_topic: analysis.search_topic.clone(),
                search_limit: analysis.search_limit,
                raw_limit: analysis.raw_limit,
                min_content_length: analysis.min_content_length,
                truncate_chars: analysis.doc_truncate_chars,
                step_timeout: Duration::from_secs(analysis.step_timeout_seconds),
            },
        }
    }
}

/// Runs one company through cache gate, retrieval, model and persistence.
pub struct Orchestrator {
    documents: Arc<dyn DocumentStore>,
    analyses: Arc<dyn AnalysisStore>,
    search: Arc<dyn SearchIndex>,
    model: Arc<dyn CompletionModel>,
    sentiment: Arc<dyn SentimentScorer>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        analyses: Arc<dyn AnalysisStore>,
        search: Arc<dyn SearchIndex>,
        model: Arc<dyn CompletionModel>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            documents,
            analyses,
            search,
            model,
            sentiment: Arc::new(LexiconSentiment::new()),
            config,
        }
    }

    /// Analyze a company, serving a fresh cached record when one exists.
    ///
    /// `None` means no usable analysis could be produced; the reason is logged.
    pub async fn analyze(&self, ticker: &str, company_name: &str) -> Option<AnalysisRecord> {
        match self.run(ticker, company_name).await {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("No analysis for {}: {}", ticker, e);
                None
            }
        }
    }

    async fn run(&self, ticker: &str, company_name: &str) -> Result<AnalysisRecord, AnalysisError> {
        let now = Utc::now().trunc_subsecs(6);

        if let Some(cached) = self.cached(ticker, now).await {
            info!("Using cached analysis for {}", ticker);
            return Ok(cached);
        }

        let evidence = retrieve(
            self.search.as_ref(),
            self.documents.as_ref(),
            ticker,
            company_name,
            &self.config.retrieval,
        )
        .await
        .ok_or(AnalysisError::NoEvidence)?;

        let context = ContextAggregator::new(
            self.documents.as_ref(),
            self.sentiment.as_ref(),
            self.config.retrieval.min_content_length,
            self.config.retrieval.step_timeout,
        )
        .aggregate(ticker, evidence.formatted, evidence.documents.len())
        .await;

        let prompt = build_prompt(company_name, ticker, &context);
        debug!("Prompt for {} is {} chars", ticker, prompt.len());

        let outcome = invoke_with_repair(
            self.model.as_ref(),
            &self.config.model_name,
            &prompt,
            self.config.model_timeout,
        )
        .await;
        debug!("Model calls for {}: {}", ticker, outcome.calls);
        let analysis = outcome.result?;

        let record = self.build_record(
            ticker,
            company_name,
            analysis,
            &context.source_types,
            context.document_count,
            now,
        );
        self.persist(&record).await;

        info!(
            "Analysis complete for {}: score={} quality={}",
            ticker, record.accountability_score, record.data_quality
        );
        Ok(record)
    }

    /// Cache gate. Lookup failures count as a miss.
    async fn cached(&self, ticker: &str, now: DateTime<Utc>) -> Option<AnalysisRecord> {
        match with_timeout(
            self.config.retrieval.step_timeout,
            self.analyses.latest_fresh(ticker, now),
        )
        .await
        {
            Ok(record) => record,
            Err(e) => {
                warn!("Cache lookup failed for {}, recomputing: {}", ticker, e);
                None
            }
        }
    }

    fn build_record(
        &self,
        ticker: &str,
        company_name: &str,
        analysis: ModelAnalysis,
        source_types: &[SourceType],
        document_count: usize,
        now: DateTime<Utc>,
    ) -> AnalysisRecord {
        let (data_quality, data_quality_detail) = quality::resolve(&analysis, source_types);

        let mut score_breakdown = analysis.score_breakdown;
        score_breakdown.data_quality = Some(data_quality);
        score_breakdown.data_quality_detail = Some(data_quality_detail.clone());

        AnalysisRecord {
            company_ticker: ticker.to_string(),
            company_name: company_name.to_string(),
            accountability_score: analysis.accountability_score,
            summary: analysis.summary,
            data_quality,
            data_quality_detail,
            issues: analysis.issues,
            response: analysis.response,
            timeline: analysis.timeline,
            score_breakdown,
            sources: analysis.sources,
            document_count,
            model_used: self.config.model_name.clone(),
            analyzed_at: now,
            expires_at: now + self.config.cache_ttl,
        }
    }

    /// Store the record and company. Failure leaves the result uncached.
    async fn persist(&self, record: &AnalysisRecord) {
        let company = Company {
            ticker: record.company_ticker.clone(),
            name: record.company_name.clone(),
        };

        if let Err(e) = with_timeout(
            self.config.retrieval.step_timeout,
            self.analyses.save_analysis(record, &company),
        )
        .await
        {
            error!(
                "Failed to persist analysis for {} (result not cached): {}",
                record.company_ticker, e
            );
        }
    }
}
