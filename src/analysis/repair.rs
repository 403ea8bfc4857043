//! Model invocation with a single bounded repair attempt.
//!
//! ```text
//! Invoke ──empty/error──▶ Failed(EmptyResponse | ModelFailed)
//!   │
//!   ▼
//! Parse ──ok──▶ Done
//!   │ failed (first time)
//!   ▼
//! Repair ──▶ Parse ──failed again──▶ Failed(Unparseable)
//! ```

use crate::analysis::prompt::{repair_prompt, REQUIRED_KEYS};
use crate::analysis::with_timeout;
use crate::llm::CompletionModel;
use crate::models::ModelAnalysis;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Per-ticker failures that end an analysis without a result.
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("no documents found")]
    NoEvidence,

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("model call failed: {0}")]
    ModelFailed(String),

    #[error("response is not valid analysis JSON: {0}")]
    Unparseable(String),
}

#[derive(Debug)]
enum RepairState {
    Invoke,
    Parse { raw: String, repaired: bool },
    Repair { raw: String },
    Done(ModelAnalysis),
    Failed(AnalysisError),
}

/// Result of the invoke/repair loop.
#[derive(Debug)]
pub struct ParseOutcome {
    pub result: Result<ModelAnalysis, AnalysisError>,
    /// Model calls made, 1 or 2.
    pub calls: usize,
}

/// Call the model and turn its answer into a [`ModelAnalysis`].
pub async fn invoke_with_repair(
    model: &dyn CompletionModel,
    model_name: &str,
    prompt: &str,
    timeout: Duration,
) -> ParseOutcome {
    let mut calls = 0;
    let mut state = RepairState::Invoke;

    loop {
        state = match state {
            RepairState::Invoke => {
                calls += 1;
                match with_timeout(timeout, model.complete(model_name, prompt)).await {
                    Ok(text) if !text.trim().is_empty() => RepairState::Parse {
                        raw: text,
                        repaired: false,
                    },
                    Ok(_) => RepairState::Failed(AnalysisError::EmptyResponse),
                    Err(e) => RepairState::Failed(AnalysisError::ModelFailed(e.to_string())),
                }
            }
            RepairState::Parse { raw, repaired } => match parse_analysis(&raw) {
                Ok(analysis) => RepairState::Done(analysis),
                Err(reason) if repaired => RepairState::Failed(AnalysisError::Unparseable(reason)),
                Err(reason) => {
                    debug!("Model output rejected ({}), requesting repair", reason);
                    RepairState::Repair { raw }
                }
            },
            RepairState::Repair { raw } => {
                calls += 1;
                match with_timeout(timeout, model.complete(model_name, &repair_prompt(&raw))).await {
                    Ok(text) => RepairState::Parse {
                        raw: text,
                        repaired: true,
                    },
                    Err(e) => {
                        warn!("Repair call failed: {}", e);
                        RepairState::Failed(AnalysisError::Unparseable(format!(
                            "repair call failed: {}",
                            e
                        )))
                    }
                }
            }
            RepairState::Done(analysis) => {
                return ParseOutcome {
                    result: Ok(analysis),
                    calls,
                }
            }
            RepairState::Failed(error) => {
                return ParseOutcome {
                    result: Err(error),
                    calls,
                }
            }
        };
    }
}

/// Parse raw model text into a validated analysis.
///
/// Fences are stripped first; if the remainder is not a JSON object the
/// first balanced `{...}` inside it is tried.
pub fn parse_analysis(raw: &str) -> Result<ModelAnalysis, String> {
    let text = strip_code_fence(raw);

    let value = match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Object(_)) => value,
        _ => {
            let candidate =
                extract_json_object(text).ok_or_else(|| "no JSON object found".to_string())?;
            serde_json::from_str::<Value>(candidate).map_err(|e| e.to_string())?
        }
    };

    let Value::Object(ref map) = value else {
        return Err("top-level value is not an object".to_string());
    };
    for key in REQUIRED_KEYS {
        if map.get(key).map_or(true, Value::is_null) {
            return Err(format!("missing required key: {}", key));
        }
    }

    let analysis: ModelAnalysis = serde_json::from_value(value).map_err(|e| e.to_string())?;
    analysis.validate()?;
    Ok(analysis)
}

/// Remove a surrounding Markdown code fence, with or without a language tag.
pub fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    // Drop the rest of the opening line (the language tag).
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };

    let body = match body.rfind("```") {
        Some(idx) => &body[..idx],
        None => body,
    };

    body.trim()
}

/// The first balanced `{...}` in `text`. Braces inside strings do not count.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}
