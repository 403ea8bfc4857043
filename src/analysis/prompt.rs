//! The analysis prompt template and the repair prompt.
//!
//! [`REQUIRED_KEYS`] is what the validator demands of a response to this
//! template. Bump [`PROMPT_VERSION`] whenever either changes.

use crate::analysis::aggregator::AnalysisContext;

pub const PROMPT_VERSION: &str = "2";

/// Top-level keys a response must carry to be accepted.
pub const REQUIRED_KEYS: [&str; 2] = ["accountability_score", "summary"];

/// Render the analysis prompt for one company.
pub fn build_prompt(company_name: &str, ticker: &str, context: &AnalysisContext) -> String {
    let source_types = if context.source_types.is_empty() {
        "none".to_string()
    } else {
        context
            .source_types
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        r#"You are analyzing workplace accountability for {company_name} ({ticker}).

Documents from SEC filings, court records, news, EEOC, Reddit, Wikipedia, and other sources:
{formatted_docs}

Additional signals:
- Reddit sentiment score (average across {reddit_count} posts): {avg_sentiment:.3} (-1 to 1 scale, where -1=very negative, 1=very positive)
- Data sources available: {source_types}
- Total documents analyzed: {doc_count}

Weight your analysis appropriately:
- SEC filings and court records are highest authority
- EEOC press releases are high authority
- News articles are medium authority
- Reddit posts and social media coverage are lower authority but useful for pattern detection
- Wikipedia is useful for historical context
- If only low-authority sources are available, note this in your summary and widen your confidence interval on the score

Return ONLY valid JSON (no markdown, no explanation):
{{
  "accountability_score": <1-10, where 1-3=serious unresolved issues, 4-6=incomplete response, 7-8=well-handled, 9-10=excellent record>,
  "summary": "<one concise sentence summarizing the company's accountability record>",
  "data_quality": "<high|medium|low>",
  "data_quality_detail": "<short sentence explaining what sources were available>",
  "issues": [
    {{
      "type": "<sexual_harassment|discrimination|assault|retaliation|pay_gap|hostile_work_environment>",
      "date": "YYYY-MM-DD",
      "status": "<settled|ongoing|dismissed|unknown>",
      "settlement_amount": <integer or null>,
      "affected_parties": <integer or null>,
      "description": "<2-3 sentences>",
      "source_urls": []
    }}
  ],
  "response": {{
    "actions_taken": ["<specific action the company took>"],
    "gaps": ["<specific gap in their response>"]
  }},
  "timeline": [
    {{"date": "YYYY-MM-DD", "event": "<description>"}}
  ],
  "score_breakdown": {{
    "severity": "<high|medium|low>",
    "response_quality": <1-10>,
    "transparency": <1-10>,
    "speed": "<fast|moderate|slow>",
    "current_status": "<resolved|monitoring|ongoing>",
    "pattern_analysis": "<one sentence about whether issues are systemic or isolated>"
  }},
  "sources": [
    {{"url": "<source_url>", "title": "<title>", "type": "<source_type>", "date": "<date>"}}
  ]
}}

Data quality rules:
- "high" = SEC filings or court records are present
- "medium" = News articles or EEOC data present but no court/SEC filings
- "low" = Only Reddit, Wikipedia, social media, or general knowledge

If the documents contain no relevant workplace accountability issues, return a score of 8-10 and empty issues array. Be thorough but fair.

Keep your response under 4000 tokens."#,
        company_name = company_name,
        ticker = ticker,
        formatted_docs = context.formatted_documents,
        reddit_count = context.reddit_count,
        avg_sentiment = context.avg_sentiment,
        source_types = source_types,
        doc_count = context.document_count,
    )
}

/// Ask the model to fix its own output.
pub fn repair_prompt(raw: &str) -> String {
    format!("Fix this invalid JSON and return ONLY valid JSON:\n{}", raw)
}
