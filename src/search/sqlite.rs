//! FTS5-backed search index living next to the raw documents.

use crate::error::SearchError;
use crate::models::RetrievedDocument;
use crate::search::{SearchIndex, SearchRequest};
use crate::store::schema::{SEARCH_REBUILD, SEARCH_SCHEMA};
use crate::store::sqlite::RawDocument;
use crate::store::SqliteStore;
use async_trait::async_trait;
use tracing::{debug, info};

const SUPPORTED_COLUMNS: [&str; 6] = [
    "content",
    "company_ticker",
    "source_type",
    "title",
    "source_url",
    "document_date",
];

/// Ranked full-text search (bm25) over `raw_documents`.
#[derive(Clone)]
pub struct SqliteSearchIndex {
    conn: tokio_rusqlite::Connection,
}

impl SqliteSearchIndex {
    /// Attach to the store without creating the index.
    ///
    /// Queries fail with [`SearchError::NotReady`] until [`Self::create`] runs.
    pub fn attach(store: &SqliteStore) -> Self {
        Self {
            conn: store.connection(),
        }
    }

    /// Create the index (if missing) and rebuild it from the stored documents.
    pub async fn create(store: &SqliteStore) -> Result<Self, SearchError> {
        let conn = store.connection();
        conn.call(|conn| {
            conn.execute_batch(SEARCH_SCHEMA)?;
            conn.execute_batch(SEARCH_REBUILD)?;
            Ok(())
        })
        .await
        .map_err(|e| SearchError::Query(e.to_string()))?;

        info!("Search index ready");
        Ok(Self { conn })
    }
}

/// Turn free text into an FTS5 query: quoted terms joined by OR.
pub(crate) fn fts_query(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 1)
        .map(|t| format!("\"{}\"", t.to_lowercase()))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

fn classify(err: tokio_rusqlite::Error) -> SearchError {
    let message = err.to_string();
    if message.contains("no such table") {
        SearchError::NotReady(message)
    } else {
        SearchError::Query(message)
    }
}

#[async_trait]
impl SearchIndex for SqliteSearchIndex {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RetrievedDocument>, SearchError> {
        if let Some(col) = request
            .columns
            .iter()
            .find(|c| !SUPPORTED_COLUMNS.contains(&c.as_str()))
        {
            return Err(SearchError::UnsupportedColumn(col.clone()));
        }

        let Some(query) = fts_query(&request.query) else {
            return Ok(Vec::new());
        };
        debug!("FTS query for {}: {}", request.company_ticker, query);

        let ticker = request.company_ticker.clone();
        let limit = request.limit as i64;

        let raw = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT d.content, d.source_type, d.title, d.source_url, d.document_date
                     FROM raw_documents_fts f
                     JOIN raw_documents d ON d.id = f.rowid
                     WHERE raw_documents_fts MATCH ?1
                       AND d.company_ticker = ?2
                       AND d.content IS NOT NULL
                     ORDER BY bm25(raw_documents_fts)
                     LIMIT ?3",
                )?;
                let rows = stmt
                    .query_map(rusqlite::params![query, ticker, limit], |r| {
                        Ok(RawDocument {
                            content: r.get(0)?,
                            source_type: r.get(1)?,
                            title: r.get(2)?,
                            source_url: r.get(3)?,
                            document_date: r.get(4)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(classify)?;

        raw.into_iter()
            .map(|r| r.decode().map_err(|e| SearchError::Query(e.to_string())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::document;
    use crate::models::SourceType;
    use crate::store::DocumentStore;

    const HARASSMENT: &str =
        "Employees filed a harassment complaint describing discrimination by managers.";
    const EARNINGS: &str = "Quarterly revenue rose eight percent on strong subscription growth.";

    #[test]
    fn test_fts_query_quotes_terms() {
        assert_eq!(
            fts_query("Zeta Corp. workplace harassment").as_deref(),
            Some("\"zeta\" OR \"corp\" OR \"workplace\" OR \"harassment\"")
        );
        assert_eq!(fts_query("  - ! "), None);
    }

    #[tokio::test]
    async fn search_before_create_is_not_ready() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let index = SqliteSearchIndex::attach(&store);

        let result = index
            .search(&SearchRequest::new("harassment", "ZCORP", 20))
            .await;
        assert!(matches!(result, Err(SearchError::NotReady(_))));
    }

    #[tokio::test]
    async fn search_filters_by_ticker_and_ranks_matches() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        // Rows stored before the index exists are picked up by the rebuild.
        store
            .append_documents(&[document("ZCORP", SourceType::NewsArticle, "https://n/1", HARASSMENT)])
            .await
            .unwrap();

        let index = SqliteSearchIndex::create(&store).await.unwrap();
        store
            .append_documents(&[
                document("ZCORP", SourceType::Sec10k, "https://sec/1", EARNINGS),
                document("OTHER", SourceType::NewsArticle, "https://n/2", HARASSMENT),
            ])
            .await
            .unwrap();

        let results = index
            .search(&SearchRequest::new(
                "Zeta workplace harassment discrimination",
                "ZCORP",
                20,
            ))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source_url.as_deref(), Some("https://n/1"));
        assert_eq!(results[0].source_type, SourceType::NewsArticle);
    }

    #[tokio::test]
    async fn search_rejects_unknown_columns() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let index = SqliteSearchIndex::create(&store).await.unwrap();

        let mut request = SearchRequest::new("harassment", "ZCORP", 20);
        request.columns.push("embedding".to_string());
        assert!(matches!(
            index.search(&request).await,
            Err(SearchError::UnsupportedColumn(_))
        ));
    }
}
