//! Data-quality classification from the observed source mix.

use crate::models::{Authority, DataQuality, ModelAnalysis, SourceType};

/// Quality implied by the strongest source on file.
pub fn classify(source_types: &[SourceType]) -> DataQuality {
    match source_types.iter().map(|t| t.authority()).max() {
        Some(Authority::High) => DataQuality::High,
        Some(Authority::Medium) => DataQuality::Medium,
        _ => DataQuality::Low,
    }
}

pub fn describe(source_types: &[SourceType]) -> String {
    if source_types.is_empty() {
        return "Limited data".to_string();
    }
    let names: Vec<&str> = source_types.iter().map(|t| t.as_str()).collect();
    format!("Based on {}", names.join(", "))
}

/// Final `(data_quality, data_quality_detail)` for an analysis.
///
/// Model-supplied values always win; only missing ones are synthesized.
pub fn resolve(analysis: &ModelAnalysis, source_types: &[SourceType]) -> (DataQuality, String) {
    let quality = analysis
        .data_quality
        .unwrap_or_else(|| classify(source_types));
    let detail = match analysis.data_quality_detail.as_deref() {
        Some(detail) if !detail.trim().is_empty() => detail.to_string(),
        _ => describe(source_types),
    };
    (quality, detail)
}
