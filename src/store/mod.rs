//! Storage abstractions for raw documents, analyses, and companies.
//!
//! The orchestrator and ingestion only depend on these traits. All writes
//! are append-only: nothing here updates or deletes an existing row.

pub(crate) mod schema;
pub mod sqlite;

#[cfg(test)]
pub(crate) mod memory;

use crate::error::StoreResult;
use crate::models::{AnalysisRecord, Company, Document, RetrievedDocument, SourceType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

pub use sqlite::SqliteStore;

/// The durable table of raw documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// `(ticker, source_url)` pairs already stored for any of `tickers`.
    async fn existing_urls(&self, tickers: &[String]) -> StoreResult<HashSet<(String, String)>>;

    /// Append documents in one unit of work; returns the number stored.
    async fn append_documents(&self, documents: &[Document]) -> StoreResult<usize>;

    /// Up to `limit` documents with content longer than `min_content_length`,
    /// newest first, undated last.
    async fn recent_documents(
        &self,
        ticker: &str,
        min_content_length: usize,
        limit: usize,
    ) -> StoreResult<Vec<RetrievedDocument>>;

    /// Contents of every document of `source_type` longer than `min_content_length`.
    async fn contents_of_type(
        &self,
        ticker: &str,
        source_type: SourceType,
        min_content_length: usize,
    ) -> StoreResult<Vec<String>>;

    /// Distinct source types observed for the ticker, sorted.
    async fn source_types(&self, ticker: &str) -> StoreResult<Vec<SourceType>>;
}

/// The analysis record and company tables.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Most recent record for `ticker` whose `expires_at` is after `now`.
    async fn latest_fresh(
        &self,
        ticker: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<AnalysisRecord>>;

    /// Insert the record and upsert the company as one transaction.
    ///
    /// The company upsert never overwrites an existing name.
    async fn save_analysis(&self, record: &AnalysisRecord, company: &Company) -> StoreResult<()>;

    async fn company(&self, ticker: &str) -> StoreResult<Option<Company>>;
}
