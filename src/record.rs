//! Analysis record types - the structured output of the analysis pipeline.

use serde::{Deserialize, Serialize};

/// The article text handed to the analysis pipeline.
///
/// All fields are optional, but at least one must carry text for an
/// analysis to run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisInput {
    /// Article headline
    pub title: Option<String>,
    /// Short description or teaser
    pub description: Option<String>,
    /// Article body (often truncated by the news provider)
    pub content: Option<String>,
}

impl AnalysisInput {
    /// Whether any field carries usable text
    pub fn has_text(&self) -> bool {
        [&self.title, &self.description, &self.content]
            .iter()
            .any(|f| f.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }

    /// A field's text, or "N/A" when it is missing or blank
    pub fn field_or_na(field: &Option<String>) -> &str {
        field
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("N/A")
    }
}

/// Sentiment verdict for an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentiment {
    /// "Positive", "Negative", "Neutral", or whatever label the model chose
    #[serde(rename = "type")]
    pub kind: String,
    /// Why the model picked that label
    pub explanation: String,
}

impl Sentiment {
    pub fn new(kind: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            explanation: explanation.into(),
        }
    }

    /// The placeholder used when no sentiment could be read off the response
    pub fn not_analyzed() -> Self {
        Self::new("Neutral", "Not analyzed")
    }
}

/// Structured analysis of a news article.
///
/// Every field is always populated: the normalizer fills in per-field
/// placeholders rather than leaving anything absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    /// Concise summary of the article
    pub summary: String,
    /// Main takeaways, in the order the model gave them
    pub key_points: Vec<String>,
    /// Sentiment verdict
    pub sentiment: Sentiment,
    /// Overall tone of the writing
    pub tone: String,
    /// Detected bias, if any
    pub bias_detection: String,
}
