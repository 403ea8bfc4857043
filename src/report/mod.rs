//! Batch reports over the analyses produced in one run.

pub mod generator;

pub use generator::{generate_json_report, generate_markdown_report};

use crate::models::{AnalysisRecord, Verdict};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Run-level information shown at the top of a report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub model_used: String,
    pub prompt_version: String,
    pub tickers_processed: usize,
    /// Tickers that produced no analysis.
    pub failed_tickers: Vec<String>,
    pub duration_seconds: f64,
}

/// One company's analysis with its derived verdict.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyReport {
    pub verdict: Verdict,
    #[serde(flatten)]
    pub analysis: AnalysisRecord,
}

/// Verdict counts across a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VerdictSummary {
    pub concerns_found: usize,
    pub no_concerns: usize,
    pub insufficient_evidence: usize,
    pub average_score: Option<f64>,
}

impl VerdictSummary {
    pub fn from_records(records: &[AnalysisRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            match record.verdict() {
                Verdict::ConcernsFound => summary.concerns_found += 1,
                Verdict::NoConcerns => summary.no_concerns += 1,
                Verdict::InsufficientEvidence => summary.insufficient_evidence += 1,
            }
        }
        if !records.is_empty() {
            let total: f64 = records.iter().map(|r| f64::from(r.accountability_score)).sum();
            summary.average_score = Some(total / records.len() as f64);
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.concerns_found + self.no_concerns + self.insufficient_evidence
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub summary: VerdictSummary,
    pub companies: Vec<CompanyReport>,
}

impl Report {
    /// Build a report; companies are listed lowest score first.
    pub fn new(metadata: ReportMetadata, mut records: Vec<AnalysisRecord>) -> Self {
        records.sort_by(|a, b| {
            a.accountability_score
                .cmp(&b.accountability_score)
                .then_with(|| a.company_ticker.cmp(&b.company_ticker))
        });
        let summary = VerdictSummary::from_records(&records);
        let companies = records
            .into_iter()
            .map(|analysis| CompanyReport {
                verdict: analysis.verdict(),
                analysis,
            })
            .collect();

        Self {
            metadata,
            summary,
            companies,
        }
    }
}
