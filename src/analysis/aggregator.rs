//! Context aggregation: the secondary signals that accompany the evidence.

use crate::analysis::sentiment::{average_sentiment, SentimentScorer};
use crate::analysis::with_timeout;
use crate::models::SourceType;
use crate::store::DocumentStore;
use std::time::Duration;
use tracing::warn;

/// Everything the prompt needs besides the company identity.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisContext {
    pub formatted_documents: String,
    pub document_count: usize,
    /// Average community sentiment, -1..1.
    pub avg_sentiment: f64,
    /// Number of community posts behind `avg_sentiment`.
    pub reddit_count: usize,
    pub source_types: Vec<SourceType>,
}

/// Gathers the optional signals. Each one degrades to its default on failure.
pub struct ContextAggregator<'a> {
    store: &'a dyn DocumentStore,
    scorer: &'a dyn SentimentScorer,
    min_content_length: usize,
    step_timeout: Duration,
}

impl<'a> ContextAggregator<'a> {
    pub fn new(
        store: &'a dyn DocumentStore,
        scorer: &'a dyn SentimentScorer,
        min_content_length: usize,
        step_timeout: Duration,
    ) -> Self {
        Self {
            store,
            scorer,
            min_content_length,
            step_timeout,
        }
    }

    /// Average sentiment over the ticker's Reddit posts, `(0.0, 0)` on failure.
    pub async fn sentiment(&self, ticker: &str) -> (f64, usize) {
        let posts = with_timeout(
            self.step_timeout,
            self.store
                .contents_of_type(ticker, SourceType::RedditPost, self.min_content_length),
        )
        .await;

        match posts {
            Ok(posts) => average_sentiment(self.scorer, &posts),
            Err(e) => {
                warn!("Sentiment query failed for {} (non-critical): {}", ticker, e);
                (0.0, 0)
            }
        }
    }

    /// Distinct source types on file for the ticker, empty on failure.
    pub async fn source_types(&self, ticker: &str) -> Vec<SourceType> {
        match with_timeout(self.step_timeout, self.store.source_types(ticker)).await {
            Ok(types) => types,
            Err(e) => {
                warn!("Source type query failed for {} (non-critical): {}", ticker, e);
                Vec::new()
            }
        }
    }

    pub async fn aggregate(
        &self,
        ticker: &str,
        formatted_documents: String,
        document_count: usize,
    ) -> AnalysisContext {
        let (avg_sentiment, reddit_count) = self.sentiment(ticker).await;
        let source_types = self.source_types(ticker).await;

        AnalysisContext {
            formatted_documents,
            document_count,
            avg_sentiment,
            reddit_count,
            source_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::sentiment::LexiconSentiment;
    use crate::models::fixtures::document;
    use crate::store::memory::MemoryStore;
    use std::sync::atomic::Ordering;

    fn store() -> MemoryStore {
        MemoryStore::with_documents(vec![
            document(
                "ZCORP",
                SourceType::RedditPost,
                "https://reddit/1",
                "Honestly a toxic place, managers ignored every harassment report we made.",
            ),
            document(
                "ZCORP",
                SourceType::RedditPost,
                "https://reddit/2",
                "short",
            ),
            document(
                "ZCORP",
                SourceType::Wikipedia,
                "https://wiki/1",
                "Zeta Corp is a software company founded in 1999 and based in Ohio.",
            ),
            document(
                "OTHER",
                SourceType::RedditPost,
                "https://reddit/3",
                "Great place with supportive leadership and fair pay for everyone there.",
            ),
        ])
    }

    #[tokio::test]
    async fn aggregate_collects_both_signals() {
        let store = store();
        let scorer = LexiconSentiment::new();
        let aggregator = ContextAggregator::new(&store, &scorer, 50, Duration::from_secs(5));

        let context = aggregator.aggregate("ZCORP", "docs".to_string(), 2).await;

        assert_eq!(context.reddit_count, 1);
        assert_eq!(context.avg_sentiment, -1.0);
        assert_eq!(
            context.source_types,
            vec![SourceType::RedditPost, SourceType::Wikipedia]
        );
        assert_eq!(context.document_count, 2);
        assert_eq!(context.formatted_documents, "docs");
    }

    #[tokio::test]
    async fn failing_signals_fall_back_to_defaults() {
        let store = store();
        store.fail_signals.store(true, Ordering::SeqCst);
        let scorer = LexiconSentiment::new();
        let aggregator = ContextAggregator::new(&store, &scorer, 50, Duration::from_secs(5));

        let context = aggregator.aggregate("ZCORP", String::new(), 0).await;

        assert_eq!((context.avg_sentiment, context.reddit_count), (0.0, 0));
        assert!(context.source_types.is_empty());
    }
}
