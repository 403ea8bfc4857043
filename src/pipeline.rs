//! Per-ticker pipeline: gather, load, settle, analyze.

use crate::analysis::{with_timeout, Orchestrator};
use crate::ingest::load_documents;
use crate::models::AnalysisRecord;
use crate::providers::{gather_documents, DocumentProvider};
use crate::store::{AnalysisStore, DocumentStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// What happened to one ticker.
#[derive(Debug, Clone)]
pub struct TickerOutcome {
    pub ticker: String,
    pub company_name: String,
    /// Documents returned by providers.
    pub fetched: usize,
    /// Documents newly stored.
    pub stored: usize,
    pub analysis: Option<AnalysisRecord>,
}

pub struct Pipeline {
    providers: Vec<Box<dyn DocumentProvider>>,
    documents: Arc<dyn DocumentStore>,
    orchestrator: Orchestrator,
    /// Wait after new documents are stored, so the index can catch up.
    settle: Duration,
    /// Bound on each ingestion store call.
    step_timeout: Duration,
    skip_ingest: bool,
}

impl Pipeline {
    pub fn new(
        providers: Vec<Box<dyn DocumentProvider>>,
        documents: Arc<dyn DocumentStore>,
        orchestrator: Orchestrator,
        settle: Duration,
        step_timeout: Duration,
        skip_ingest: bool,
    ) -> Self {
        Self {
            providers,
            documents,
            orchestrator,
            settle,
            step_timeout,
            skip_ingest,
        }
    }

    /// Run one ticker end to end. Never fails; problems are logged.
    pub async fn process_ticker(&self, ticker: &str, company_name: &str) -> TickerOutcome {
        let mut outcome = TickerOutcome {
            ticker: ticker.to_string(),
            company_name: company_name.to_string(),
            fetched: 0,
            stored: 0,
            analysis: None,
        };

        if !self.skip_ingest {
            info!("Gathering documents from {} providers", self.providers.len());
            let docs = gather_documents(&self.providers, ticker, company_name).await;
            outcome.fetched = docs.len();

            outcome.stored = match load_documents(self.documents.as_ref(), docs, self.step_timeout)
                .await
            {
                Ok(n) => n,
                Err(e) => {
                    error!("Failed to load documents for {}: {}", ticker, e);
                    0
                }
            };

            if outcome.stored > 0 && !self.settle.is_zero() {
                info!("Waiting {}s for search indexing", self.settle.as_secs());
                tokio::time::sleep(self.settle).await;
            }
        }

        outcome.analysis = self.orchestrator.analyze(ticker, company_name).await;
        outcome
    }
}

/// `explicit` if given, then the stored name, then the ticker itself.
pub async fn resolve_company_name(
    store: &dyn AnalysisStore,
    ticker: &str,
    explicit: Option<&str>,
    limit: Duration,
) -> String {
    if let Some(name) = explicit {
        return name.trim().to_string();
    }

    match with_timeout(limit, store.company(ticker)).await {
        Ok(Some(company)) if !company.name.trim().is_empty() => company.name,
        Ok(_) => ticker.to_string(),
        Err(e) => {
            debug!("Company lookup failed for {}: {}", ticker, e);
            ticker.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fakes::{FakeSearch, ScriptedModel};
    use crate::analysis::OrchestratorConfig;
    use crate::error::ProviderError;
    use crate::models::fixtures::document;
    use crate::models::{Document, SourceType};
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::Ordering;

    const MINIMAL: &str = r#"{"accountability_score": 8, "summary": "Nothing notable."}"#;

    struct StaticProvider(Vec<Document>);

    #[async_trait]
    impl DocumentProvider for StaticProvider {
        fn name(&self) -> &str {
            "static"
        }

        async fn scrape(&self, _: &str, _: &str) -> Result<Vec<Document>, ProviderError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenProvider;

    #[async_trait]
    impl DocumentProvider for BrokenProvider {
        fn name(&self) -> &str {
            "broken"
        }

        async fn scrape(&self, _: &str, _: &str) -> Result<Vec<Document>, ProviderError> {
            Err(ProviderError::MissingDirectory("/nowhere".to_string()))
        }
    }

    fn pipeline(
        store: Arc<MemoryStore>,
        model: Arc<ScriptedModel>,
        skip_ingest: bool,
    ) -> Pipeline {
        let doc = document(
            "ZCORP",
            SourceType::NewsArticle,
            "https://news/1",
            "Reporters found no evidence of the misconduct alleged in an anonymous post.",
        );
        let orchestrator = Orchestrator::new(
            store.clone(),
            store.clone(),
            Arc::new(FakeSearch::empty()),
            model,
            OrchestratorConfig::default(),
        );
        Pipeline::new(
            vec![Box::new(BrokenProvider), Box::new(StaticProvider(vec![doc]))],
            store,
            orchestrator,
            Duration::from_secs(10),
            Duration::from_secs(30),
            skip_ingest,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn settles_only_after_new_documents() {
        let store = Arc::new(MemoryStore::new());
        let model = Arc::new(ScriptedModel::replying(&[MINIMAL]));
        let pipeline = pipeline(store.clone(), model.clone(), false);

        let start = tokio::time::Instant::now();
        let first = pipeline.process_ticker("ZCORP", "Zeta Corp").await;
        assert!(start.elapsed() >= Duration::from_secs(10));
        assert_eq!((first.fetched, first.stored), (1, 1));
        assert_eq!(first.analysis.unwrap().accountability_score, 8);

        let start = tokio::time::Instant::now();
        let second = pipeline.process_ticker("ZCORP", "Zeta Corp").await;
        assert!(start.elapsed() < Duration::from_secs(10));
        assert_eq!((second.fetched, second.stored), (1, 0));
        // Served from cache.
        assert!(second.analysis.is_some());
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn skip_ingest_goes_straight_to_analysis() {
        let store = Arc::new(MemoryStore::new());
        let model = Arc::new(ScriptedModel::replying(&[MINIMAL]));
        let pipeline = pipeline(store.clone(), model.clone(), true);

        let outcome = pipeline.process_ticker("ZCORP", "Zeta Corp").await;

        assert_eq!(store.existing_calls.load(Ordering::SeqCst), 0);
        assert!(outcome.analysis.is_none());
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_ingestion_still_analyzes() {
        let store = Arc::new(MemoryStore::new());
        store.stall.store(true, Ordering::SeqCst);
        let model = Arc::new(ScriptedModel::replying(&[MINIMAL]));
        let pipeline = pipeline(store.clone(), model.clone(), false);

        let outcome = pipeline.process_ticker("ZCORP", "Zeta Corp").await;

        assert_eq!((outcome.fetched, outcome.stored), (1, 0));
        // Nothing was stored, so there is no evidence to analyze.
        assert!(outcome.analysis.is_none());
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn company_name_resolution() {
        let store = MemoryStore::new();
        let limit = Duration::from_secs(30);
        store
            .save_analysis(
                &crate::models::fixtures::record("ZCORP", chrono::Utc::now(), chrono::Duration::days(7)),
                &crate::models::Company {
                    ticker: "ZCORP".to_string(),
                    name: "Zeta Corporation".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(
            resolve_company_name(&store, "ZCORP", Some(" Zeta "), limit).await,
            "Zeta"
        );
        assert_eq!(
            resolve_company_name(&store, "ZCORP", None, limit).await,
            "Zeta Corporation"
        );
        assert_eq!(resolve_company_name(&store, "ACME", None, limit).await, "ACME");

        store.stall.store(true, Ordering::SeqCst);
        assert_eq!(resolve_company_name(&store, "ZCORP", None, limit).await, "ZCORP");
    }
}
