//! SQL schema for the SQLite store.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Raw documents are append-only. Identity is (company_ticker, source_url).
CREATE TABLE IF NOT EXISTS raw_documents (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    company_ticker TEXT NOT NULL,
    company_name   TEXT NOT NULL,
    source_type    TEXT NOT NULL,
    source_url     TEXT NOT NULL,
    document_date  TEXT,            -- YYYY-MM-DD or NULL
    title          TEXT,
    content        TEXT,
    ingested_at    TEXT NOT NULL,
    UNIQUE (company_ticker, source_url)
);

CREATE INDEX IF NOT EXISTS raw_documents_ticker_idx ON raw_documents(company_ticker, source_type);

CREATE TABLE IF NOT EXISTS company_analyses (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    company_ticker       TEXT NOT NULL,
    company_name         TEXT NOT NULL,
    accountability_score INTEGER NOT NULL,
    summary              TEXT NOT NULL,
    data_quality         TEXT NOT NULL,
    data_quality_detail  TEXT NOT NULL,
    issues               TEXT NOT NULL,  -- JSON
    response             TEXT NOT NULL,  -- JSON
    timeline             TEXT NOT NULL,  -- JSON
    score_breakdown      TEXT NOT NULL,  -- JSON
    sources              TEXT NOT NULL,  -- JSON
    document_count       INTEGER NOT NULL,
    model_used           TEXT NOT NULL,
    analyzed_at          TEXT NOT NULL,  -- RFC 3339 UTC, fixed width
    expires_at           TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS company_analyses_ticker_idx
    ON company_analyses(company_ticker, expires_at);

CREATE TABLE IF NOT EXISTS companies (
    ticker TEXT PRIMARY KEY,
    name   TEXT NOT NULL
);
";

/// Full-text index over `raw_documents`, kept in sync by an insert trigger.
///
/// Created separately so a store can exist without its index.
pub const SEARCH_SCHEMA: &str = "
CREATE VIRTUAL TABLE IF NOT EXISTS raw_documents_fts USING fts5(
    title,
    content,
    content = 'raw_documents',
    content_rowid = 'id'
);

CREATE TRIGGER IF NOT EXISTS raw_documents_fts_ai AFTER INSERT ON raw_documents BEGIN
    INSERT INTO raw_documents_fts(rowid, title, content)
    VALUES (new.id, new.title, new.content);
END;
";

/// Rebuilds the index from `raw_documents` (picks up rows added before it existed).
pub const SEARCH_REBUILD: &str =
    "INSERT INTO raw_documents_fts(raw_documents_fts) VALUES ('rebuild');";
