//! Data models for the accountability analyzer.
//!
//! This module contains the core data structures shared by ingestion,
//! retrieval, the model contract, and persistence.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Kind of source a document was collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SourceType {
    #[serde(rename = "sec_8k")]
    Sec8k,
    #[serde(rename = "sec_10k")]
    Sec10k,
    #[serde(rename = "sec_proxy")]
    SecProxy,
    #[serde(rename = "court_opinion")]
    CourtOpinion,
    #[serde(rename = "news_article")]
    NewsArticle,
    #[serde(rename = "eeoc_release")]
    EeocRelease,
    #[serde(rename = "reddit_post")]
    RedditPost,
    #[serde(rename = "wikipedia")]
    Wikipedia,
    #[serde(rename = "glassdoor_proxy")]
    GlassdoorProxy,
    #[serde(rename = "social_news")]
    SocialNews,
}

impl SourceType {
    pub const ALL: [SourceType; 10] = [
        SourceType::Sec8k,
        SourceType::Sec10k,
        SourceType::SecProxy,
        SourceType::CourtOpinion,
        SourceType::NewsArticle,
        SourceType::EeocRelease,
        SourceType::RedditPost,
        SourceType::Wikipedia,
        SourceType::GlassdoorProxy,
        SourceType::SocialNews,
    ];

    /// Wire name used in storage, prompts, and provider files.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Sec8k => "sec_8k",
            SourceType::Sec10k => "sec_10k",
            SourceType::SecProxy => "sec_proxy",
            SourceType::CourtOpinion => "court_opinion",
            SourceType::NewsArticle => "news_article",
            SourceType::EeocRelease => "eeoc_release",
            SourceType::RedditPost => "reddit_post",
            SourceType::Wikipedia => "wikipedia",
            SourceType::GlassdoorProxy => "glassdoor_proxy",
            SourceType::SocialNews => "social_news",
        }
    }

    /// Evidentiary weight of this source type.
    pub fn authority(&self) -> Authority {
        match self {
            SourceType::Sec8k
            | SourceType::Sec10k
            | SourceType::SecProxy
            | SourceType::CourtOpinion => Authority::High,
            SourceType::NewsArticle | SourceType::EeocRelease => Authority::Medium,
            SourceType::RedditPost
            | SourceType::Wikipedia
            | SourceType::GlassdoorProxy
            | SourceType::SocialNews => Authority::Low,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown source type: {}", s))
    }
}

/// Coarse authority tier of a source type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Authority {
    Low,
    Medium,
    High,
}

/// A normalized document produced by a document provider.
///
/// Identity is `(company_ticker, source_url)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub company_ticker: String,
    #[serde(default)]
    pub company_name: String,
    pub source_type: SourceType,
    #[serde(default)]
    pub source_url: String,
    #[serde(default, deserialize_with = "lenient_date")]
    pub document_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// Accepts `YYYY-MM-DD` or a longer timestamp starting with one. Anything
/// else (`""`, null, "January 15") becomes `None`.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    let Some(s) = value.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let day = s.get(..10).unwrap_or(s);
    match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        Ok(date) => Ok(Some(date)),
        Err(e) => {
            debug!("Dropping unparseable document date {:?}: {}", s, e);
            Ok(None)
        }
    }
}

/// A document as returned by either retrieval tier.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedDocument {
    pub source_type: SourceType,
    pub title: Option<String>,
    pub source_url: Option<String>,
    pub content: String,
    pub document_date: Option<NaiveDate>,
}

/// Overall quality of the evidence behind an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    Low,
    Medium,
    High,
}

impl DataQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataQuality::Low => "low",
            DataQuality::Medium => "medium",
            DataQuality::High => "high",
        }
    }
}

impl fmt::Display for DataQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(DataQuality::Low),
            "medium" => Ok(DataQuality::Medium),
            "high" => Ok(DataQuality::High),
            other => Err(format!("unknown data quality: {}", other)),
        }
    }
}

/// Kind of workplace accountability issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    SexualHarassment,
    Discrimination,
    Assault,
    Retaliation,
    PayGap,
    HostileWorkEnvironment,
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IssueType::SexualHarassment => "Sexual harassment",
            IssueType::Discrimination => "Discrimination",
            IssueType::Assault => "Assault",
            IssueType::Retaliation => "Retaliation",
            IssueType::PayGap => "Pay gap",
            IssueType::HostileWorkEnvironment => "Hostile work environment",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    Settled,
    Ongoing,
    Dismissed,
    Unknown,
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueStatus::Settled => write!(f, "settled"),
            IssueStatus::Ongoing => write!(f, "ongoing"),
            IssueStatus::Dismissed => write!(f, "dismissed"),
            IssueStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// A single issue extracted by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date: String,
    #[serde(default = "default_issue_status")]
    pub status: IssueStatus,
    #[serde(default, deserialize_with = "lenient_int")]
    pub settlement_amount: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub affected_parties: Option<i64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default)]
    pub source_urls: Vec<String>,
}

fn default_issue_status() -> IssueStatus {
    IssueStatus::Unknown
}

/// Accepts integers, integral floats (`1500000.0`), or null.
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Number>::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(Some(i));
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Some(f as i64)),
                _ => Err(serde::de::Error::custom(format!("expected an integer, got {}", n))),
            }
        }
    }
}

/// Treats an explicit null like a missing string.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Sub-scores may come back fractional (`6.5`); they are rounded.
fn lenient_subscore<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(f) => {
            let rounded = f.round();
            if (0.0..=f64::from(u8::MAX)).contains(&rounded) {
                Ok(Some(rounded as u8))
            } else {
                Err(serde::de::Error::custom(format!("sub-score out of range: {}", f)))
            }
        }
    }
}

/// How the company responded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseAnalysis {
    #[serde(default)]
    pub actions_taken: Vec<String>,
    #[serde(default)]
    pub gaps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub event: String,
}

/// Structured score components.
///
/// `data_quality` and `data_quality_detail` are injected before persistence
/// so consumers reading only the breakdown still see them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_subscore",
        skip_serializing_if = "Option::is_none"
    )]
    pub response_quality: Option<u8>,
    #[serde(
        default,
        deserialize_with = "lenient_subscore",
        skip_serializing_if = "Option::is_none"
    )]
    pub transparency: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_quality: Option<DataQuality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_quality_detail: Option<String>,
}

/// A source cited by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_empty")]
    pub source_type: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date: String,
}

/// The model's structured output after validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAnalysis {
    pub accountability_score: u8,
    pub summary: String,
    #[serde(default)]
    pub data_quality: Option<DataQuality>,
    #[serde(default)]
    pub data_quality_detail: Option<String>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub response: ResponseAnalysis,
    #[serde(default)]
    pub timeline: Vec<TimelineEvent>,
    #[serde(default)]
    pub score_breakdown: ScoreBreakdown,
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl ModelAnalysis {
    /// Range checks that serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=10).contains(&self.accountability_score) {
            return Err(format!(
                "accountability_score out of range: {}",
                self.accountability_score
            ));
        }
        for (name, value) in [
            ("response_quality", self.score_breakdown.response_quality),
            ("transparency", self.score_breakdown.transparency),
        ] {
            if let Some(v) = value {
                if !(1..=10).contains(&v) {
                    return Err(format!("score_breakdown.{} out of range: {}", name, v));
                }
            }
        }
        Ok(())
    }
}

/// A persisted analysis of one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub company_ticker: String,
    pub company_name: String,
    pub accountability_score: u8,
    pub summary: String,
    pub data_quality: DataQuality,
    pub data_quality_detail: String,
    pub issues: Vec<Issue>,
    pub response: ResponseAnalysis,
    pub timeline: Vec<TimelineEvent>,
    pub score_breakdown: ScoreBreakdown,
    pub sources: Vec<Source>,
    pub document_count: usize,
    pub model_used: String,
    pub analyzed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AnalysisRecord {
    /// Whether the record may still be served from cache at `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// Read-time interpretation of the record.
    pub fn verdict(&self) -> Verdict {
        if !self.issues.is_empty() {
            Verdict::ConcernsFound
        } else if self.data_quality == DataQuality::Low {
            Verdict::InsufficientEvidence
        } else if self.accountability_score >= 8 {
            Verdict::NoConcerns
        } else {
            Verdict::InsufficientEvidence
        }
    }
}

/// Distinguishes a clean record from an empty one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    ConcernsFound,
    NoConcerns,
    InsufficientEvidence,
}

impl Verdict {
    pub fn emoji(&self) -> &'static str {
        match self {
            Verdict::ConcernsFound => "🔴",
            Verdict::NoConcerns => "🟢",
            Verdict::InsufficientEvidence => "⚪",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::ConcernsFound => write!(f, "Concerns found"),
            Verdict::NoConcerns => write!(f, "No concerns"),
            Verdict::InsufficientEvidence => write!(f, "Insufficient evidence"),
        }
    }
}

/// A company known to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub ticker: String,
    pub name: String,
}
