//! In-memory store used by tests, with call counters and failure switches.

use crate::error::{StoreError, StoreResult};
use crate::models::{AnalysisRecord, Company, Document, RetrievedDocument, SourceType};
use crate::store::{AnalysisStore, DocumentStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<Vec<Document>>,
    analyses: Mutex<Vec<AnalysisRecord>>,
    companies: Mutex<Vec<Company>>,

    pub existing_calls: AtomicUsize,
    pub append_calls: AtomicUsize,
    pub recent_calls: AtomicUsize,
    pub save_calls: AtomicUsize,

    pub fail_saves: AtomicBool,
    pub fail_signals: AtomicBool,
    /// Ingestion writes and company lookups never complete.
    pub stall: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: Vec<Document>) -> Self {
        let store = Self::new();
        *store.documents.lock().unwrap() = documents;
        store
    }

    pub fn with_analysis(record: AnalysisRecord) -> Self {
        let store = Self::new();
        store.analyses.lock().unwrap().push(record);
        store
    }

    pub fn documents(&self) -> Vec<Document> {
        self.documents.lock().unwrap().clone()
    }

    pub fn analyses(&self) -> Vec<AnalysisRecord> {
        self.analyses.lock().unwrap().clone()
    }

    fn content_len(doc: &Document) -> usize {
        doc.content.as_deref().map(|c| c.chars().count()).unwrap_or(0)
    }

    async fn maybe_stall(&self) {
        if self.stall.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }

    fn check_signals(&self) -> StoreResult<()> {
        if self.fail_signals.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("signal query failed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn existing_urls(&self, tickers: &[String]) -> StoreResult<HashSet<(String, String)>> {
        self.existing_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_stall().await;
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| tickers.contains(&d.company_ticker))
            .map(|d| (d.company_ticker.clone(), d.source_url.clone()))
            .collect())
    }

    async fn append_documents(&self, documents: &[Document]) -> StoreResult<usize> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_stall().await;
        let mut stored = self.documents.lock().unwrap();
        let mut inserted = 0;
        for doc in documents {
            let exists = stored
                .iter()
                .any(|d| d.company_ticker == doc.company_ticker && d.source_url == doc.source_url);
            if !exists {
                stored.push(doc.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn recent_documents(
        &self,
        ticker: &str,
        min_content_length: usize,
        limit: usize,
    ) -> StoreResult<Vec<RetrievedDocument>> {
        self.recent_calls.fetch_add(1, Ordering::SeqCst);
        let mut docs: Vec<Document> = self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.company_ticker == ticker && Self::content_len(d) > min_content_length)
            .cloned()
            .collect();
        // Newest first, undated last.
        docs.sort_by(|a, b| match (a.document_date, b.document_date) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        docs.truncate(limit);

        Ok(docs
            .into_iter()
            .map(|d| RetrievedDocument {
                source_type: d.source_type,
                title: Some(d.title),
                source_url: Some(d.source_url),
                content: d.content.unwrap_or_default(),
                document_date: d.document_date,
            })
            .collect())
    }

    async fn contents_of_type(
        &self,
        ticker: &str,
        source_type: SourceType,
        min_content_length: usize,
    ) -> StoreResult<Vec<String>> {
        self.check_signals()?;
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| {
                d.company_ticker == ticker
                    && d.source_type == source_type
                    && Self::content_len(d) > min_content_length
            })
            .filter_map(|d| d.content.clone())
            .collect())
    }

    async fn source_types(&self, ticker: &str) -> StoreResult<Vec<SourceType>> {
        self.check_signals()?;
        let mut types: Vec<SourceType> = self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.company_ticker == ticker)
            .map(|d| d.source_type)
            .collect();
        types.sort_by_key(|t| t.as_str());
        types.dedup();
        Ok(types)
    }
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    async fn latest_fresh(
        &self,
        ticker: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<AnalysisRecord>> {
        Ok(self
            .analyses
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.company_ticker == ticker && r.is_fresh(now))
            .max_by_key(|r| r.analyzed_at)
            .cloned())
    }

    async fn save_analysis(&self, record: &AnalysisRecord, company: &Company) -> StoreResult<()> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("save failed".to_string()));
        }
        self.analyses.lock().unwrap().push(record.clone());
        let mut companies = self.companies.lock().unwrap();
        if !companies.iter().any(|c| c.ticker == company.ticker) {
            companies.push(company.clone());
        }
        Ok(())
    }

    async fn company(&self, ticker: &str) -> StoreResult<Option<Company>> {
        self.maybe_stall().await;
        Ok(self
            .companies
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.ticker == ticker)
            .cloned())
    }
}
