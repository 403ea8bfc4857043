//! Search index over stored documents.
//!
//! Newly appended documents may not be searchable yet, so every failure
//! here is expected and the caller falls back to the raw store.

pub mod sqlite;

use crate::error::SearchError;
use crate::models::RetrievedDocument;
use async_trait::async_trait;

pub use sqlite::SqliteSearchIndex;

/// Columns every search result carries.
pub const DEFAULT_COLUMNS: [&str; 5] =
    ["content", "company_ticker", "source_type", "title", "source_url"];

/// A ranked query restricted to one company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub company_ticker: String,
    pub limit: usize,
    pub columns: Vec<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, company_ticker: impl Into<String>, limit: usize) -> Self {
        Self {
            query: query.into(),
            company_ticker: company_ticker.into(),
            limit,
            columns: DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Ranked documents for the request, best match first.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RetrievedDocument>, SearchError>;
}
