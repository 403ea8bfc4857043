//! [`SqliteStore`], the SQLite implementation of the store traits.

use crate::error::{StoreError, StoreResult};
use crate::models::{
    AnalysisRecord, Company, DataQuality, Document, RetrievedDocument, SourceType,
};
use crate::store::schema::SCHEMA;
use crate::store::{AnalysisStore, DocumentStore};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::OptionalExtension as _;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Document, analysis, and company tables in one SQLite database.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
    conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
    /// Open (or create) a store at `path` and run schema initialisation.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = tokio_rusqlite::Connection::open(path).await?;
        let store = Self { conn };
        store.init_schema().await?;
        Ok(store)
    }

    #[cfg(test)]
    pub async fn open_in_memory() -> StoreResult<Self> {
        let conn = tokio_rusqlite::Connection::open_in_memory().await?;
        let store = Self { conn };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> StoreResult<()> {
        self.conn
            .call(|conn| {
                conn.execute_batch(SCHEMA)?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// The shared connection, for the search index living in the same file.
    pub(crate) fn connection(&self) -> tokio_rusqlite::Connection {
        self.conn.clone()
    }
}

// ─── Encoding ────────────────────────────────────────────────────────────────

/// Fixed-width UTC timestamps so string comparison matches time order.
pub(crate) fn encode_dt(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_dt(s: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidValue(format!("timestamp {:?}: {}", s, e)))
}

fn encode_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn decode_date(s: Option<String>) -> StoreResult<Option<NaiveDate>> {
    s.filter(|s| !s.is_empty())
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map_err(|e| StoreError::InvalidValue(format!("date {:?}: {}", s, e)))
        })
        .transpose()
}

pub(crate) fn decode_source_type(s: &str) -> StoreResult<SourceType> {
    s.parse::<SourceType>().map_err(StoreError::InvalidValue)
}

/// A document row as read from SQLite, before decoding.
pub(crate) struct RawDocument {
    pub content: String,
    pub source_type: String,
    pub title: Option<String>,
    pub source_url: Option<String>,
    pub document_date: Option<String>,
}

impl RawDocument {
    pub(crate) fn decode(self) -> StoreResult<RetrievedDocument> {
        Ok(RetrievedDocument {
            source_type: decode_source_type(&self.source_type)?,
            title: self.title,
            source_url: self.source_url,
            content: self.content,
            document_date: decode_date(self.document_date)?,
        })
    }
}

struct RawAnalysis {
    company_ticker: String,
    company_name: String,
    accountability_score: i64,
    summary: String,
    data_quality: String,
    data_quality_detail: String,
    issues: String,
    response: String,
    timeline: String,
    score_breakdown: String,
    sources: String,
    document_count: i64,
    model_used: String,
    analyzed_at: String,
    expires_at: String,
}

impl RawAnalysis {
    fn decode(self) -> StoreResult<AnalysisRecord> {
        let score = u8::try_from(self.accountability_score).map_err(|_| {
            StoreError::InvalidValue(format!("score {}", self.accountability_score))
        })?;
        let data_quality = self
            .data_quality
            .parse::<DataQuality>()
            .map_err(StoreError::InvalidValue)?;

        Ok(AnalysisRecord {
            company_ticker: self.company_ticker,
            company_name: self.company_name,
            accountability_score: score,
            summary: self.summary,
            data_quality,
            data_quality_detail: self.data_quality_detail,
            issues: serde_json::from_str(&self.issues)?,
            response: serde_json::from_str(&self.response)?,
            timeline: serde_json::from_str(&self.timeline)?,
            score_breakdown: serde_json::from_str(&self.score_breakdown)?,
            sources: serde_json::from_str(&self.sources)?,
            document_count: usize::try_from(self.document_count).unwrap_or(0),
            model_used: self.model_used,
            analyzed_at: decode_dt(&self.analyzed_at)?,
            expires_at: decode_dt(&self.expires_at)?,
        })
    }
}

// ─── DocumentStore ───────────────────────────────────────────────────────────

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn existing_urls(&self, tickers: &[String]) -> StoreResult<HashSet<(String, String)>> {
        if tickers.is_empty() {
            return Ok(HashSet::new());
        }
        let tickers = tickers.to_vec();

        let pairs = self
            .conn
            .call(move |conn| {
                let placeholders = vec!["?"; tickers.len()].join(",");
                let sql = format!(
                    "SELECT company_ticker, source_url FROM raw_documents
                     WHERE company_ticker IN ({})",
                    placeholders
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(rusqlite::params_from_iter(tickers.iter()), |r| {
                        Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
                    })?
                    .collect::<Result<HashSet<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        Ok(pairs)
    }

    async fn append_documents(&self, documents: &[Document]) -> StoreResult<usize> {
        let now = encode_dt(Utc::now());
        let rows: Vec<_> = documents
            .iter()
            .map(|d| {
                (
                    d.company_ticker.clone(),
                    d.company_name.clone(),
                    d.source_type.as_str(),
                    d.source_url.clone(),
                    d.document_date.map(encode_date),
                    d.title.clone(),
                    d.content.clone(),
                )
            })
            .collect();

        let inserted = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let mut inserted = 0;
                {
                    let mut stmt = tx.prepare(
                        "INSERT OR IGNORE INTO raw_documents (
                           company_ticker, company_name, source_type, source_url,
                           document_date, title, content, ingested_at
                         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    )?;
                    for (ticker, name, source_type, url, date, title, content) in &rows {
                        inserted += stmt.execute(rusqlite::params![
                            ticker,
                            name,
                            source_type,
                            url,
                            date,
                            title,
                            content,
                            now
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(inserted)
            })
            .await?;

        debug!("Appended {} raw documents", inserted);
        Ok(inserted)
    }

    async fn recent_documents(
        &self,
        ticker: &str,
        min_content_length: usize,
        limit: usize,
    ) -> StoreResult<Vec<RetrievedDocument>> {
        let ticker = ticker.to_string();
        let min_len = min_content_length as i64;
        let limit = limit as i64;

        let raw = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT content, source_type, title, source_url, document_date
                     FROM raw_documents
                     WHERE company_ticker = ?1
                       AND content IS NOT NULL AND length(content) > ?2
                     ORDER BY document_date IS NULL, document_date DESC, id DESC
                     LIMIT ?3",
                )?;
                let rows = stmt
                    .query_map(rusqlite::params![ticker, min_len, limit], |r| {
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
            .await?;

        raw.into_iter().map(RawDocument::decode).collect()
    }

    async fn contents_of_type(
        &self,
        ticker: &str,
        source_type: SourceType,
        min_content_length: usize,
    ) -> StoreResult<Vec<String>> {
        let ticker = ticker.to_string();
        let min_len = min_content_length as i64;

        let contents = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT content FROM raw_documents
                     WHERE company_ticker = ?1 AND source_type = ?2
                       AND content IS NOT NULL AND length(content) > ?3",
                )?;
                let rows = stmt
                    .query_map(
                        rusqlite::params![ticker, source_type.as_str(), min_len],
                        |r| r.get::<_, String>(0),
                    )?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        Ok(contents)
    }

    async fn source_types(&self, ticker: &str) -> StoreResult<Vec<SourceType>> {
        let ticker = ticker.to_string();

        let raw = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT DISTINCT source_type FROM raw_documents
                     WHERE company_ticker = ?1 ORDER BY source_type",
                )?;
                let rows = stmt
                    .query_map(rusqlite::params![ticker], |r| r.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        raw.iter().map(|s| decode_source_type(s)).collect()
    }
}

// ─── AnalysisStore ───────────────────────────────────────────────────────────

#[async_trait]
impl AnalysisStore for SqliteStore {
    async fn latest_fresh(
        &self,
        ticker: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<AnalysisRecord>> {
        let ticker = ticker.to_string();
        let now = encode_dt(now);

        let raw = self
            .conn
            .call(move |conn| {
                let row = conn
                    .query_row(
                        "SELECT company_ticker, company_name, accountability_score, summary,
                                data_quality, data_quality_detail, issues, response, timeline,
                                score_breakdown, sources, document_count, model_used,
                                analyzed_at, expires_at
                         FROM company_analyses
                         WHERE company_ticker = ?1 AND expires_at > ?2
                         ORDER BY analyzed_at DESC, id DESC
                         LIMIT 1",
                        rusqlite::params![ticker, now],
                        |r| {
                            Ok(RawAnalysis {
                                company_ticker: r.get(0)?,
                                company_name: r.get(1)?,
                                accountability_score: r.get(2)?,
                                summary: r.get(3)?,
                                data_quality: r.get(4)?,
                                data_quality_detail: r.get(5)?,
                                issues: r.get(6)?,
                                response: r.get(7)?,
                                timeline: r.get(8)?,
                                score_breakdown: r.get(9)?,
                                sources: r.get(10)?,
                                document_count: r.get(11)?,
                                model_used: r.get(12)?,
                                analyzed_at: r.get(13)?,
                                expires_at: r.get(14)?,
                            })
                        },
                    )
                    .optional()?;
                Ok(row)
            })
            .await?;

        raw.map(RawAnalysis::decode).transpose()
    }

    async fn save_analysis(&self, record: &AnalysisRecord, company: &Company) -> StoreResult<()> {
        let issues = serde_json::to_string(&record.issues)?;
        let response = serde_json::to_string(&record.response)?;
        let timeline = serde_json::to_string(&record.timeline)?;
        let score_breakdown = serde_json::to_string(&record.score_breakdown)?;
        let sources = serde_json::to_string(&record.sources)?;

        let ticker = record.company_ticker.clone();
        let name = record.company_name.clone();
        let score = i64::from(record.accountability_score);
        let summary = record.summary.clone();
        let data_quality = record.data_quality.as_str();
        let detail = record.data_quality_detail.clone();
        let document_count = record.document_count as i64;
        let model_used = record.model_used.clone();
        let analyzed_at = encode_dt(record.analyzed_at);
        let expires_at = encode_dt(record.expires_at);
        let company = company.clone();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO company_analyses (
                       company_ticker, company_name, accountability_score, summary,
                       data_quality, data_quality_detail, issues, response, timeline,
                       score_breakdown, sources, document_count, model_used,
                       analyzed_at, expires_at
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                    rusqlite::params![
                        ticker,
                        name,
                        score,
                        summary,
                        data_quality,
                        detail,
                        issues,
                        response,
                        timeline,
                        score_breakdown,
                        sources,
                        document_count,
                        model_used,
                        analyzed_at,
                        expires_at
                    ],
                )?;
                tx.execute(
                    "INSERT INTO companies (ticker, name) VALUES (?1, ?2)
                     ON CONFLICT(ticker) DO NOTHING",
                    rusqlite::params![company.ticker, company.name],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await?;

        Ok(())
    }

    async fn company(&self, ticker: &str) -> StoreResult<Option<Company>> {
        let ticker = ticker.to_string();

        let company = self
            .conn
            .call(move |conn| {
                let row = conn
                    .query_row(
                        "SELECT ticker, name FROM companies WHERE ticker = ?1",
                        rusqlite::params![ticker],
                        |r| {
                            Ok(Company {
                                ticker: r.get(0)?,
                                name: r.get(1)?,
                            })
                        },
                    )
                    .optional()?;
                Ok(row)
            })
            .await?;

        Ok(company)
    }
}
