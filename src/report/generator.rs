//! Markdown and JSON report generation.

use crate::models::{AnalysisRecord, Issue, Verdict};
use crate::report::{CompanyReport, Report, ReportMetadata, VerdictSummary};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Hera Accountability Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&report.summary, &report.companies));
    output.push_str(&generate_companies_section(&report.companies));
    output.push_str(&generate_failed_section(&report.metadata.failed_tickers));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Model Used:** `{}` (prompt v{})\n",
        metadata.model_used, metadata.prompt_version
    ));
    section.push_str(&format!(
        "- **Tickers Processed:** {}\n",
        metadata.tickers_processed
    ));
    if !metadata.failed_tickers.is_empty() {
        section.push_str(&format!(
            "- **Without Analysis:** {}\n",
            metadata.failed_tickers.len()
        ));
    }
    section.push_str(&format!("- **Duration:** {:.1}s\n\n", metadata.duration_seconds));

    section
}

fn generate_summary_section(summary: &VerdictSummary, companies: &[CompanyReport]) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str(&format!(
        "| {} Concerns found | {} No concerns | {} Insufficient evidence | **Total** |\n",
        Verdict::ConcernsFound.emoji(),
        Verdict::NoConcerns.emoji(),
        Verdict::InsufficientEvidence.emoji(),
    ));
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | **{}** |\n\n",
        summary.concerns_found,
        summary.no_concerns,
        summary.insufficient_evidence,
        summary.total()
    ));

    if let Some(avg) = summary.average_score {
        section.push_str(&format!("Average accountability score: **{:.1}/10**\n\n", avg));
    }

    if !companies.is_empty() {
        section.push_str("| Company | Ticker | Score | Data Quality | Verdict |\n");
        section.push_str("|---------|--------|:-----:|:------------:|---------|\n");
        for company in companies {
            let a = &company.analysis;
            section.push_str(&format!(
                "| {} | {} | {}/10 | {} | {} {} |\n",
                a.company_name,
                a.company_ticker,
                a.accountability_score,
                a.data_quality,
                company.verdict.emoji(),
                company.verdict
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_companies_section(companies: &[CompanyReport]) -> String {
    let mut section = String::new();

    section.push_str("## Companies\n\n");
    if companies.is_empty() {
        section.push_str("No analyses were produced in this run.\n\n");
        return section;
    }

    for company in companies {
        section.push_str(&generate_company_block(company.verdict, &company.analysis));
    }

    section
}

fn generate_company_block(verdict: Verdict, a: &AnalysisRecord) -> String {
    let mut block = String::new();

    block.push_str(&format!("### {} ({})\n\n", a.company_name, a.company_ticker));
    block.push_str(&format!(
        "**Score:** {}/10 | **Verdict:** {} {} | **Data quality:** {} ({})\n\n",
        a.accountability_score,
        verdict.emoji(),
        verdict,
        a.data_quality,
        a.data_quality_detail
    ));
    block.push_str(&format!("{}\n\n", a.summary));
    block.push_str(&format!(
        "*{} documents analyzed with `{}` on {}*\n\n",
        a.document_count,
        a.model_used,
        a.analyzed_at.format("%Y-%m-%d")
    ));

    if !a.issues.is_empty() {
        block.push_str("#### Issues\n\n");
        for issue in &a.issues {
            block.push_str(&generate_issue_block(issue));
        }
    }

    if !a.response.actions_taken.is_empty() || !a.response.gaps.is_empty() {
        block.push_str("#### Company Response\n\n");
        for action in &a.response.actions_taken {
            block.push_str(&format!("- ✅ {}\n", action));
        }
        for gap in &a.response.gaps {
            block.push_str(&format!("- ⚠️ {}\n", gap));
        }
        block.push('\n');
    }

    if !a.timeline.is_empty() {
        block.push_str("#### Timeline\n\n");
        for event in &a.timeline {
            block.push_str(&format!("- **{}** {}\n", event.date, event.event));
        }
        block.push('\n');
    }

    if let Some(ref pattern) = a.score_breakdown.pattern_analysis {
        block.push_str(&format!("> **Pattern:** {}\n\n", pattern));
    }

    if !a.sources.is_empty() {
        block.push_str("<details>\n<summary>Sources</summary>\n\n");
        for source in &a.sources {
            let title = if source.title.is_empty() { &source.url } else { &source.title };
            block.push_str(&format!("- [{}]({}) `{}`\n", title, source.url, source.source_type));
        }
        block.push_str("\n</details>\n\n");
    }

    block.push_str("---\n\n");
    block
}

fn generate_issue_block(issue: &Issue) -> String {
    let mut block = String::new();

    let date = if issue.date.is_empty() { "undated" } else { issue.date.as_str() };
    block.push_str(&format!(
        "- **{}** ({}, {})",
        issue.issue_type, date, issue.status
    ));
    if let Some(amount) = issue.settlement_amount {
        block.push_str(&format!(", settlement ${}", amount));
    }
    if let Some(parties) = issue.affected_parties {
        block.push_str(&format!(", {} affected", parties));
    }
    block.push('\n');
    if !issue.description.is_empty() {
        block.push_str(&format!("  {}\n", issue.description));
    }

    block
}

fn generate_failed_section(failed: &[String]) -> String {
    if failed.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Without Analysis\n\n");
    section.push_str("No documents were found or the model output could not be used for:\n\n");
    for ticker in failed {
        section.push_str(&format!("- {}\n", ticker));
    }
    section.push('\n');
    section
}

fn generate_footer() -> String {
    "---\n\n*Report generated by Hera*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
