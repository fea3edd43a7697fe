//! LLM agent module for news article analysis.
//!
//! Builds the analysis prompt, drives the Gemini call under a fixed
//! deadline, and hands the raw completion to the normalizer. The agent can
//! fail (missing key, timeout, provider rejection); the normalization that
//! follows a received completion never does.

use crate::config::{Config, ConfigError};
use crate::normalizer;
use crate::record::{AnalysisInput, AnalysisRecord};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Upper bound on how long a single model call may take
const MODEL_TIMEOUT: Duration = Duration::from_secs(30);

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("no article text provided: at least one of title, description or content is required")]
    EmptyInput,
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("model call timed out after {0} seconds")]
    Timeout(u64),
    #[error("model request failed: {0}")]
    Provider(String),
}

/// User-facing rendering of an [`AgentError`], with a best-effort hint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub error: String,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Client for the Gemini generative-language API.
pub struct Analyst {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl Analyst {
    /// Build an analyst from configuration. Fails fast when the Gemini key
    /// is missing, before any network traffic.
    pub fn new(config: &Config) -> Result<Self, AgentError> {
        let api_key = config.gemini_key()?.to_string();
        Ok(Self {
            http: Client::new(),
            api_key,
            model: config.agent.model.clone(),
            base_url: GEMINI_BASE_URL.to_string(),
            timeout: MODEL_TIMEOUT,
        })
    }

    /// Analyze an article: validate the input, run the bounded model call,
    /// normalize whatever came back.
    pub async fn analyze(&self, input: &AnalysisInput) -> Result<AnalysisRecord, AgentError> {
        if !input.has_text() {
            return Err(AgentError::EmptyInput);
        }

        let prompt = build_prompt(input);
        let raw = self.bounded_generate(prompt).await?;
        info!(completion_len = raw.len(), "model completion received");

        Ok(normalizer::normalize(&raw))
    }

    /// Race the model call against the deadline.
    ///
    /// The request runs as its own task: when the timer fires first the
    /// caller stops waiting, the task is left to finish in the background
    /// and its eventual result is discarded.
    async fn bounded_generate(&self, prompt: String) -> Result<String, AgentError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let payload = json!({
            "contents": [{"parts": [{"text": prompt}]}]
        });

        let http = self.http.clone();
        let call = tokio::spawn(async move { send_completion(&http, &url, &payload).await });

        match tokio::time::timeout(self.timeout, call).await {
            Ok(joined) => joined.map_err(|e| AgentError::Provider(e.to_string()))?,
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "model call abandoned");
                Err(AgentError::Timeout(self.timeout.as_secs()))
            }
        }
    }
}

/// Send one completion request and extract the completion text.
async fn send_completion(http: &Client, url: &str, payload: &Value) -> Result<String, AgentError> {
    let response = http
        .post(url)
        .json(payload)
        .send()
        .await
        .map_err(|e| AgentError::Provider(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AgentError::Provider(format!(
            "completion request failed with status {status}: {body}"
        )));
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| AgentError::Provider(e.to_string()))?;

    extract_completion_text(&body)
        .ok_or_else(|| AgentError::Provider("completion response carried no text".to_string()))
}

fn extract_completion_text(body: &Value) -> Option<String> {
    body["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(str::to_string)
}

/// Build the deterministic analysis prompt for an article.
///
/// Missing fields are rendered as a literal "N/A". The instruction block
/// demands raw JSON with exactly the five expected keys; the normalizer's
/// repair heuristics exist for the models that ignore it.
pub fn build_prompt(input: &AnalysisInput) -> String {
    format!(
        r#"Analyze the following news article.

Title: {}
Description: {}
Content: {}

You MUST respond with a JSON object with exactly these five top-level keys:
{{
  "summary": "string - a concise 2-3 sentence summary of the article",
  "keyPoints": ["array of strings - the main takeaways"],
  "sentiment": {{"type": "Positive, Negative or Neutral", "explanation": "string - why"}},
  "tone": "string - the overall tone of the writing",
  "biasDetection": "string - any detectable bias, or 'None detected'"
}}

Do not include any markdown formatting, code blocks, or explanations. Only output the raw JSON object."#,
        AnalysisInput::field_or_na(&input.title),
        AnalysisInput::field_or_na(&input.description),
        AnalysisInput::field_or_na(&input.content),
    )
}

/// Map an agent failure to a user-facing report.
///
/// Classification is substring matching against known failure signatures,
/// first match wins. The provider's message format is not contractually
/// stable, so this stays best-effort: anything unrecognized gets the
/// generic message and no hint.
pub fn classify_error(err: &AgentError) -> ErrorReport {
    let details = err.to_string();
    let lowered = details.to_lowercase();

    let (error, hint) = if lowered.contains("api key") || lowered.contains("api_key") {
        (
            "Invalid or missing API key",
            Some("Check that GEMINI_API_KEY is set to a valid key"),
        )
    } else if lowered.contains("quota") || lowered.contains("rate limit") {
        (
            "API quota exceeded",
            Some("Wait a moment before retrying, or check your plan limits"),
        )
    } else if lowered.contains("timed out") || lowered.contains("timeout") {
        (
            "Analysis timed out",
            Some("Try again, or retry with a shorter article"),
        )
    } else if lowered.contains("not found") || lowered.contains("unavailable") {
        (
            "Model unavailable",
            Some("The configured model may not exist; try another model name"),
        )
    } else {
        ("Failed to analyze article", None)
    };

    ErrorReport {
        error: error.to_string(),
        details,
        hint: hint.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_analyst(base_url: String, timeout: Duration) -> Analyst {
        Analyst {
            http: Client::new(),
            api_key: "test-key".to_string(),
            model: "gemini-2.0-flash".to_string(),
            base_url,
            timeout,
        }
    }

    fn sample_input() -> AnalysisInput {
        AnalysisInput {
            title: Some("Rates held steady".to_string()),
            description: Some("Central bank leaves rates unchanged".to_string()),
            content: None,
        }
    }

    fn gemini_body(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": {"parts": [{"text": text}]}
            }]
        })
    }

    const GEMINI_PATH: &str = "/models/gemini-2.0-flash:generateContent";

    #[tokio::test]
    async fn analyzes_a_well_formed_completion() {
        let server = MockServer::start().await;
        let completion = r#"{"summary": "Rates were held.", "keyPoints": ["No change"], "sentiment": {"type": "Neutral", "explanation": "Expected move"}, "tone": "Factual", "biasDetection": "None detected"}"#;

        Mock::given(method("POST"))
            .and(path(GEMINI_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(completion)))
            .mount(&server)
            .await;

        let analyst = test_analyst(server.uri(), Duration::from_secs(5));
        let record = analyst.analyze(&sample_input()).await.unwrap();

        assert_eq!(record.summary, "Rates were held.");
        assert_eq!(record.key_points, vec!["No change".to_string()]);
        assert_eq!(record.tone, "Factual");
    }

    #[tokio::test]
    async fn fenced_completion_still_normalizes() {
        let server = MockServer::start().await;
        let completion = "```json\n{\"summary\": \"Rates were held.\"}\n```";

        Mock::given(method("POST"))
            .and(path(GEMINI_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(completion)))
            .mount(&server)
            .await;

        let analyst = test_analyst(server.uri(), Duration::from_secs(5));
        let record = analyst.analyze(&sample_input()).await.unwrap();

        assert_eq!(record.summary, "Rates were held.");
        assert_eq!(record.tone, "Not specified");
    }

    #[tokio::test]
    async fn prose_completion_degrades_instead_of_failing() {
        let server = MockServer::start().await;
        let completion = "Sorry, I can only answer in plain English.";

        Mock::given(method("POST"))
            .and(path(GEMINI_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(completion)))
            .mount(&server)
            .await;

        let analyst = test_analyst(server.uri(), Duration::from_secs(5));
        let record = analyst.analyze(&sample_input()).await.unwrap();

        assert_eq!(record.summary, completion);
        assert_eq!(record.tone, "Informative");
    }

    #[tokio::test]
    async fn empty_input_is_rejected_before_any_call() {
        // No mock server at all: the request must never be sent.
        let analyst = test_analyst("http://127.0.0.1:1".to_string(), Duration::from_secs(5));
        let result = analyst.analyze(&AnalysisInput::default()).await;
        assert!(matches!(result, Err(AgentError::EmptyInput)));
    }

    #[tokio::test]
    async fn provider_rejection_surfaces_with_its_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GEMINI_PATH))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string("API key not valid. Please pass a valid API key."),
            )
            .mount(&server)
            .await;

        let analyst = test_analyst(server.uri(), Duration::from_secs(5));
        let err = analyst.analyze(&sample_input()).await.unwrap_err();

        match &err {
            AgentError::Provider(msg) => assert!(msg.contains("API key not valid")),
            other => panic!("expected Provider error, got {other:?}"),
        }

        let report = classify_error(&err);
        assert_eq!(report.error, "Invalid or missing API key");
        assert!(report.hint.unwrap().contains("GEMINI_API_KEY"));
    }

    #[tokio::test]
    async fn slow_model_call_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GEMINI_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(gemini_body("too late"))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let analyst = test_analyst(server.uri(), Duration::from_millis(100));
        let result = analyst.analyze(&sample_input()).await;

        assert!(matches!(result, Err(AgentError::Timeout(_))));

        let report = classify_error(&result.unwrap_err());
        assert_eq!(report.error, "Analysis timed out");
        assert!(report.hint.is_some());
    }

    #[tokio::test]
    async fn prompt_text_reaches_the_provider() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GEMINI_PATH))
            .and(body_string_contains("Rates held steady"))
            .and(body_string_contains("Content: N/A"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(r#"{"summary": "ok"}"#)))
            .expect(1)
            .mount(&server)
            .await;

        let analyst = test_analyst(server.uri(), Duration::from_secs(5));
        analyst.analyze(&sample_input()).await.unwrap();
    }

    #[test]
    fn prompt_substitutes_na_for_missing_fields() {
        let prompt = build_prompt(&AnalysisInput {
            title: Some("Headline".to_string()),
            description: None,
            content: Some("   ".to_string()),
        });

        assert!(prompt.contains("Title: Headline"));
        assert!(prompt.contains("Description: N/A"));
        assert!(prompt.contains("Content: N/A"));
        assert!(prompt.contains("biasDetection"));
    }

    #[test]
    fn classification_priority_is_key_then_quota_then_timeout() {
        // A message matching several signatures resolves to the first one.
        let err = AgentError::Provider("API key over quota, request timed out".to_string());
        assert_eq!(classify_error(&err).error, "Invalid or missing API key");

        let err = AgentError::Provider("quota exhausted, request timed out".to_string());
        assert_eq!(classify_error(&err).error, "API quota exceeded");

        let err = AgentError::Provider("model gemini-9 not found".to_string());
        assert_eq!(classify_error(&err).error, "Model unavailable");
    }

    #[test]
    fn unclassified_errors_get_the_generic_report_without_a_hint() {
        let err = AgentError::Provider("connection reset by peer".to_string());
        let report = classify_error(&err);
        assert_eq!(report.error, "Failed to analyze article");
        assert!(report.hint.is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("hint").is_none());
    }
}
