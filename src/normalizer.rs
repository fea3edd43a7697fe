//! Best-effort normalization of raw model completions into analysis records.
//!
//! Model output obeys no schema guarantee no matter how firmly the prompt
//! asks for raw JSON: completions arrive wrapped in markdown fences, padded
//! with conversational prose, truncated mid-object, or as plain text. This
//! module turns any of that into a fully populated [`AnalysisRecord`].
//! [`normalize`] is total - it has no error path and degrades to a fallback
//! record instead of failing.

use crate::record::{AnalysisRecord, Sentiment};
use serde_json::Value;

/// Longest summary the fallback record will carry before truncation
const SUMMARY_LIMIT: usize = 500;

/// Key points used when the completion could not be parsed at all
const FALLBACK_KEY_POINTS: [&str; 3] = [
    "AI analysis completed",
    "Response could not be fully parsed",
    "See summary for full details",
];

/// A completion that could not be parsed as a JSON object carrying a
/// usable `summary` field.
#[derive(Debug)]
struct StructuralFailure;

/// Normalize a raw completion into an analysis record.
///
/// Tries a structural repair-and-parse first; on any structural failure
/// the original completion text itself becomes the summary of a fixed
/// fallback record. Never fails.
pub fn normalize(raw: &str) -> AnalysisRecord {
    match try_parse_strict(raw) {
        Ok(fields) => coerce_fields(&fields),
        Err(StructuralFailure) => fallback_record(raw),
    }
}

/// Repair cosmetic wrapping and parse the completion as a JSON object.
///
/// Fails when the cleaned text is not a JSON object, or when the object
/// lacks a non-empty string `summary` - a response without a summary is
/// treated as structurally broken, not as a field to default.
fn try_parse_strict(raw: &str) -> Result<serde_json::Map<String, Value>, StructuralFailure> {
    let cleaned = strip_fences(raw.trim());
    let cleaned = cleaned.trim();
    let candidate = extract_object_span(cleaned);

    let value: Value = serde_json::from_str(candidate).map_err(|_| StructuralFailure)?;
    let object = match value {
        Value::Object(map) => map,
        _ => return Err(StructuralFailure),
    };

    match object.get("summary").and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Ok(object),
        _ => Err(StructuralFailure),
    }
}

/// Remove every markdown JSON fence marker, wherever it occurs.
///
/// Models sometimes fence sub-sections rather than the whole reply, so
/// this strips globally instead of only at the string boundaries.
fn strip_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "")
}

/// Narrow the text to the span between the first `{` and the last `}`.
///
/// Recovers the object when the model prepended or appended prose. When
/// no such span exists the text is returned unchanged and the JSON parse
/// is left to fail on it.
fn extract_object_span(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Build a record from a structurally valid object, substituting the
/// per-field placeholder for anything missing or of the wrong shape.
fn coerce_fields(fields: &serde_json::Map<String, Value>) -> AnalysisRecord {
    let summary = fields
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or("No summary available")
        .to_string();

    // A keyPoints value of the wrong shape collapses to an empty list.
    let key_points = fields
        .get("keyPoints")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    // Malformed sentiment is discarded wholesale, never partially merged.
    let sentiment = fields
        .get("sentiment")
        .and_then(coerce_sentiment)
        .unwrap_or_else(Sentiment::not_analyzed);

    let tone = fields
        .get("tone")
        .and_then(Value::as_str)
        .unwrap_or("Not specified")
        .to_string();

    let bias_detection = fields
        .get("biasDetection")
        .and_then(Value::as_str)
        .unwrap_or("Not analyzed")
        .to_string();

    AnalysisRecord {
        summary,
        key_points,
        sentiment,
        tone,
        bias_detection,
    }
}

fn coerce_sentiment(value: &Value) -> Option<Sentiment> {
    let object = value.as_object()?;
    let kind = object.get("type")?.as_str()?;
    let explanation = object.get("explanation")?.as_str()?;
    Some(Sentiment::new(kind, explanation))
}

/// The terminal success path for unparseable completions: the raw text
/// itself, truncated, becomes the summary of a fixed degraded record.
fn fallback_record(raw: &str) -> AnalysisRecord {
    let summary = if raw.chars().count() > SUMMARY_LIMIT {
        let head: String = raw.chars().take(SUMMARY_LIMIT).collect();
        format!("{head}...")
    } else {
        raw.to_string()
    };

    AnalysisRecord {
        summary,
        key_points: FALLBACK_KEY_POINTS.iter().map(|s| s.to_string()).collect(),
        sentiment: Sentiment::new("Neutral", "Automatic sentiment parsing unavailable"),
        tone: "Informative".to_string(),
        bias_detection: "Could not perform automatic bias detection".to_string(),
    }
}
