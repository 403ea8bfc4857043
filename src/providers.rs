//! Document providers.
//!
//! A provider turns a `(ticker, company name)` pair into normalized
//! documents. Scrapers run outside this crate and export their results as
//! JSON; [`JsonFileProvider`] picks those exports up.

use crate::analysis::retrieval::truncate_chars;
use crate::error::ProviderError;
use crate::models::Document;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[async_trait]
pub trait DocumentProvider: Send + Sync {
    /// Label used in progress output.
    fn name(&self) -> &str;

    async fn scrape(&self, ticker: &str, company_name: &str) -> Result<Vec<Document>, ProviderError>;
}

/// Reads `*.json` files under a directory, each holding one document or an array.
pub struct JsonFileProvider {
    root: PathBuf,
    max_document_chars: usize,
}

impl JsonFileProvider {
    pub fn new(root: impl Into<PathBuf>, max_document_chars: usize) -> Self {
        Self {
            root: root.into(),
            max_document_chars,
        }
    }

    /// Parse a file; a malformed entry is skipped without losing its siblings.
    fn parse_file(path: &Path) -> Result<Vec<Document>, ProviderError> {
        let content = std::fs::read_to_string(path)?;
        let parsed: Value =
            serde_json::from_str(&content).map_err(|source| ProviderError::InvalidFile {
                path: path.display().to_string(),
                source,
            })?;

        let entries = match parsed {
            Value::Array(items) => items,
            other => vec![other],
        };

        let mut documents = Vec::with_capacity(entries.len());
        for (i, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<Document>(entry) {
                Ok(doc) => documents.push(doc),
                Err(e) => warn!("Skipping entry {} of {}: {}", i, path.display(), e),
            }
        }
        Ok(documents)
    }

    fn normalize(&self, mut doc: Document, ticker: &str, company_name: &str) -> Document {
        doc.company_ticker = ticker.to_string();
        if doc.company_name.trim().is_empty() {
            doc.company_name = company_name.to_string();
        }
        doc.source_url = doc.source_url.trim().to_string();
        if let Some(content) = doc.content.take() {
            doc.content = Some(truncate_chars(&content, self.max_document_chars).to_string());
        }
        doc
    }
}

#[async_trait]
impl DocumentProvider for JsonFileProvider {
    fn name(&self) -> &str {
        "JSON exports"
    }

    async fn scrape(&self, ticker: &str, company_name: &str) -> Result<Vec<Document>, ProviderError> {
        if !self.root.is_dir() {
            return Err(ProviderError::MissingDirectory(self.root.display().to_string()));
        }

        let mut documents = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() || !path.extension().map_or(false, |ext| ext == "json") {
                continue;
            }

            let docs = match Self::parse_file(path) {
                Ok(docs) => docs,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            let before = documents.len();
            documents.extend(
                docs.into_iter()
                    .filter(|d| d.company_ticker.trim().eq_ignore_ascii_case(ticker))
                    .map(|d| self.normalize(d, ticker, company_name)),
            );
            debug!("{}: {} documents for {}", path.display(), documents.len() - before, ticker);
        }

        Ok(documents)
    }
}

/// Run every provider; a failing provider contributes nothing.
pub async fn gather_documents(
    providers: &[Box<dyn DocumentProvider>],
    ticker: &str,
    company_name: &str,
) -> Vec<Document> {
    let mut all = Vec::new();

    for provider in providers {
        match provider.scrape(ticker, company_name).await {
            Ok(docs) => {
                info!("[{}] {} documents for {}", provider.name(), docs.len(), ticker);
                all.extend(docs);
            }
            Err(e) => warn!("[{}] Failed: {}", provider.name(), e),
        }
    }

    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceType;

    fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    #[tokio::test]
    async fn reads_arrays_and_single_objects() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("news")).unwrap();
        write(
            dir.path(),
            "sec.json",
            r#"[
                {"company_ticker": "zcorp", "source_type": "sec_10k", "source_url": "https://sec/1",
                 "title": "10-K", "content": "Annual report text", "document_date": "2024-02-01"},
                {"company_ticker": "ACME", "source_type": "sec_10k", "source_url": "https://sec/2"}
            ]"#,
        );
        write(
            &dir.path().join("news"),
            "story.json",
            r#"{"company_ticker": "ZCORP", "company_name": "Zeta Corporation", "source_type": "news_article",
                "source_url": " https://news/1 ", "content": "A long news story"}"#,
        );
        write(dir.path(), "notes.txt", "not a document");

        let provider = JsonFileProvider::new(dir.path(), 15000);
        let docs = provider.scrape("ZCORP", "Zeta Corp").await.unwrap();

        assert_eq!(docs.len(), 2);
        let sec = docs.iter().find(|d| d.source_type == SourceType::Sec10k).unwrap();
        assert_eq!(sec.company_ticker, "ZCORP");
        assert_eq!(sec.company_name, "Zeta Corp");
        assert_eq!(sec.document_date.map(|d| d.to_string()).as_deref(), Some("2024-02-01"));

        let news = docs.iter().find(|d| d.source_type == SourceType::NewsArticle).unwrap();
        assert_eq!(news.company_name, "Zeta Corporation");
        assert_eq!(news.source_url, "https://news/1");
    }

    #[tokio::test]
    async fn truncates_content_and_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "broken.json", "{not json");
        write(
            dir.path(),
            "post.json",
            &format!(
                r#"{{"company_ticker": "ZCORP", "source_type": "reddit_post", "source_url": "https://r/1", "content": "{}"}}"#,
                "é".repeat(40)
            ),
        );

        let provider = JsonFileProvider::new(dir.path(), 25);
        let docs = provider.scrape("ZCORP", "Zeta Corp").await.unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content.as_deref().map(|c| c.chars().count()), Some(25));
    }

    #[tokio::test]
    async fn bad_entries_do_not_drop_their_siblings() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "news.json",
            r#"[
                {"company_ticker": "ZCORP", "source_type": "news_article", "source_url": "https://n/1",
                 "title": "Walkout at plant", "content": "Workers walked out."},
                {"company_ticker": "ZCORP", "source_type": "news_article", "source_url": "https://n/2",
                 "title": null, "content": "Untitled wire story."},
                {"company_ticker": "ZCORP", "source_type": "eeoc_release", "source_url": "https://e/1",
                 "document_date": "January 15", "content": "EEOC settles."},
                {"company_ticker": "ZCORP", "source_type": "podcast", "source_url": "https://p/1"}
            ]"#,
        );

        let provider = JsonFileProvider::new(dir.path(), 1000);
        let docs = provider.scrape("ZCORP", "Zeta Corp").await.unwrap();

        let urls: Vec<&str> = docs.iter().map(|d| d.source_url.as_str()).collect();
        assert_eq!(urls, vec!["https://n/1", "https://n/2", "https://e/1"]);
        assert_eq!(docs[1].title, "");
        assert_eq!(docs[2].document_date, None);
    }

    #[tokio::test]
    async fn missing_directory_is_an_error_but_gather_continues() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "wiki.json",
            r#"{"company_ticker": "ZCORP", "source_type": "wikipedia", "source_url": "https://wiki/1"}"#,
        );

        let missing = JsonFileProvider::new(dir.path().join("nope"), 100);
        assert!(matches!(
            missing.scrape("ZCORP", "Zeta Corp").await,
            Err(ProviderError::MissingDirectory(_))
        ));

        let providers: Vec<Box<dyn DocumentProvider>> = vec![
            Box::new(missing),
            Box::new(JsonFileProvider::new(dir.path(), 100)),
        ];
        let docs = gather_documents(&providers, "ZCORP", "Zeta Corp").await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source_type, SourceType::Wikipedia);
    }
}
