//! Evidence retrieval: indexed search first, raw store second.

use crate::analysis::with_timeout;
use crate::models::RetrievedDocument;
use crate::search::{SearchIndex, SearchRequest};
use crate::store::DocumentStore;
use std::time::Duration;
use tracing::{info, warn};

/// Knobs for the fallback chain.
#[derive(Debug, Clone)]
pub struct RetrievalParams {
    /// Appended to the company name to form the search query.
    pub search_topic: String,
    pub search_limit: usize,
    pub raw_limit: usize,
    pub min_content_length: usize,
    /// Per-document content cap when formatting for the prompt.
    pub truncate_chars: usize,
    pub step_timeout: Duration,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            search_topic: "workplace harassment discrimination".to_string(),
            search_limit: 20,
            raw_limit: 20,
            min_content_length: 50,
            truncate_chars: 3000,
            step_timeout: Duration::from_secs(30),
        }
    }
}

/// Which tier produced the evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Search,
    RawStore,
}

/// Documents from the winning tier, already formatted for the prompt.
#[derive(Debug, Clone)]
pub struct Evidence {
    pub tier: Tier,
    pub documents: Vec<RetrievedDocument>,
    pub formatted: String,
}

/// Run the fallback chain. `None` means neither tier found anything.
pub async fn retrieve(
    search: &dyn SearchIndex,
    store: &dyn DocumentStore,
    ticker: &str,
    company_name: &str,
    params: &RetrievalParams,
) -> Option<Evidence> {
    let request = SearchRequest::new(
        format!("{} {}", company_name, params.search_topic),
        ticker,
        params.search_limit,
    );

    match with_timeout(params.step_timeout, search.search(&request)).await {
        Ok(documents) if !documents.is_empty() => {
            let formatted = format_documents(&documents, params.truncate_chars);
            info!("Using {} documents from search index for {}", documents.len(), ticker);
            return Some(Evidence {
                tier: Tier::Search,
                documents,
                formatted,
            });
        }
        Ok(_) => info!("No search results for {}, trying raw documents", ticker),
        Err(e) => warn!("Search index query failed for {} (may not be ready): {}", ticker, e),
    }

    let documents = match with_timeout(
        params.step_timeout,
        store.recent_documents(ticker, params.min_content_length, params.raw_limit),
    )
    .await
    {
        Ok(documents) => documents,
        Err(e) => {
            warn!("Raw document query failed for {}: {}", ticker, e);
            return None;
        }
    };

    if documents.is_empty() {
        info!("No documents found for {}", ticker);
        return None;
    }

    info!("Using {} documents from raw store for {}", documents.len(), ticker);
    let formatted = format_documents(&documents, params.truncate_chars);
    Some(Evidence {
        tier: Tier::RawStore,
        documents,
        formatted,
    })
}

/// Render documents as delimited blocks, in order.
pub fn format_documents(documents: &[RetrievedDocument], limit: usize) -> String {
    let mut out = String::new();

    for (i, doc) in documents.iter().enumerate() {
        out.push_str(&format!("\n--- Document {} [{}] ---\n", i + 1, doc.source_type));
        out.push_str(&format!(
            "Title: {}\n",
            doc.title.as_deref().filter(|t| !t.is_empty()).unwrap_or("N/A")
        ));
        out.push_str(&format!(
            "Source: {}\n",
            doc.source_url.as_deref().filter(|u| !u.is_empty()).unwrap_or("N/A")
        ));
        out.push_str(truncate_chars(&doc.content, limit));
        out.push('\n');
    }

    out
}

/// The first `max` characters of `s`, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fakes::FakeSearch;
    use crate::models::fixtures::document;
    use crate::models::SourceType;
    use crate::store::memory::MemoryStore;
    use std::sync::atomic::Ordering;

    fn hit(url: &str) -> RetrievedDocument {
        RetrievedDocument {
            source_type: SourceType::CourtOpinion,
            title: Some("Doe v. Zeta".to_string()),
            source_url: Some(url.to_string()),
            content: "Opinion text".to_string(),
            document_date: None,
        }
    }

    const LONG: &str = "A former employee alleged retaliation after reporting harassment to HR.";

    #[tokio::test]
    async fn search_hit_skips_raw_store() {
        let search = FakeSearch::returning(vec![hit("https://court/1")]);
        let store = MemoryStore::with_documents(vec![document(
            "ZCORP",
            SourceType::NewsArticle,
            "https://n/1",
            LONG,
        )]);

        let evidence = retrieve(&search, &store, "ZCORP", "Zeta Corp", &RetrievalParams::default())
            .await
            .unwrap();

        assert_eq!(evidence.tier, Tier::Search);
        assert_eq!(store.recent_calls.load(Ordering::SeqCst), 0);

        let request = search.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.query, "Zeta Corp workplace harassment discrimination");
        assert_eq!(request.company_ticker, "ZCORP");
        assert_eq!(request.limit, 20);
    }

    #[tokio::test]
    async fn empty_search_falls_back_once() {
        let search = FakeSearch::empty();
        let store = MemoryStore::with_documents(vec![document(
            "ZCORP",
            SourceType::NewsArticle,
            "https://n/1",
            LONG,
        )]);

        let evidence = retrieve(&search, &store, "ZCORP", "Zeta Corp", &RetrievalParams::default())
            .await
            .unwrap();

        assert_eq!(evidence.tier, Tier::RawStore);
        assert_eq!(evidence.documents.len(), 1);
        assert_eq!(store.recent_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failing_search_falls_back_once() {
        let search = FakeSearch::failing();
        let store = MemoryStore::with_documents(vec![document(
            "ZCORP",
            SourceType::Sec10k,
            "https://sec/1",
            LONG,
        )]);

        let evidence = retrieve(&search, &store, "ZCORP", "Zeta Corp", &RetrievalParams::default())
            .await
            .unwrap();

        assert_eq!(evidence.tier, Tier::RawStore);
        assert_eq!(store.recent_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_evidence_anywhere() {
        let search = FakeSearch::empty();
        let store = MemoryStore::new();

        let evidence =
            retrieve(&search, &store, "ZCORP", "Zeta Corp", &RetrievalParams::default()).await;
        assert!(evidence.is_none());
    }

    #[test]
    fn test_format_documents_blocks() {
        let docs = vec![
            hit("https://court/1"),
            RetrievedDocument {
                source_type: SourceType::RedditPost,
                title: None,
                source_url: None,
                content: "x".repeat(5000),
                document_date: None,
            },
        ];

        let text = format_documents(&docs, 3000);
        assert!(text.starts_with("\n--- Document 1 [court_opinion] ---\nTitle: Doe v. Zeta\n"));
        assert!(text.contains("Source: https://court/1\nOpinion text\n"));
        assert!(text.contains("--- Document 2 [reddit_post] ---\nTitle: N/A\nSource: N/A\n"));
        assert!(text.contains(&format!("{}\n", "x".repeat(3000))));
        assert!(!text.contains(&"x".repeat(3001)));
    }

    #[test]
    fn test_truncate_chars_respects_code_points() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }
}
