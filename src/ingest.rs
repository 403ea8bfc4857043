//! Ingestion: merge scraped documents into the document store.

use crate::analysis::{with_timeout, StepError};
use crate::error::StoreError;
use crate::models::Document;
use crate::store::DocumentStore;
use std::time::Duration;
use tracing::{debug, info};

/// Store the documents not already present; returns how many were new.
///
/// Documents without a source URL are dropped, as are repeats of a
/// `(ticker, url)` pair earlier in the same batch. Each store call is
/// bounded by `limit`.
pub async fn load_documents(
    store: &dyn DocumentStore,
    documents: Vec<Document>,
    limit: Duration,
) -> Result<usize, StepError<StoreError>> {
    if documents.is_empty() {
        return Ok(0);
    }

    let mut tickers: Vec<String> = documents.iter().map(|d| d.company_ticker.clone()).collect();
    tickers.sort();
    tickers.dedup();

    let mut seen = with_timeout(limit, store.existing_urls(&tickers)).await?;
    let total = documents.len();

    let fresh: Vec<Document> = documents
        .into_iter()
        .filter(|d| !d.source_url.trim().is_empty())
        .filter(|d| seen.insert((d.company_ticker.clone(), d.source_url.clone())))
        .collect();

    if fresh.is_empty() {
        info!("No new documents to load ({} already stored or invalid)", total);
        return Ok(0);
    }

    debug!("Appending {} of {} documents", fresh.len(), total);
    let stored = with_timeout(limit, store.append_documents(&fresh)).await?;
    info!("Loaded {} new documents", stored);
    Ok(stored)
}
