//! NewsAPI client for top headlines and keyword search.
//!
//! Thin passthrough to the NewsAPI v2 endpoints; responses are deserialized
//! into typed articles and provider errors are surfaced with their code and
//! message.

use crate::record::AnalysisInput;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// User-Agent string identifying this client
const USER_AGENT: &str = concat!("newsbrief/", env!("CARGO_PKG_VERSION"));

/// Default timeout for HTTP requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const NEWSAPI_BASE_URL: &str = "https://newsapi.org/v2";

#[derive(Error, Debug)]
pub enum NewsError {
    #[error("failed to fetch news: {0}")]
    FetchError(#[from] reqwest::Error),
    #[error("news API error ({code}): {message}")]
    Api { code: String, message: String },
}

/// Where an article was published
#[derive(Debug, Clone, Deserialize)]
pub struct Source {
    pub name: String,
}

/// One article as returned by the news provider
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub source: Source,
    pub author: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub content: Option<String>,
}

impl From<&Article> for AnalysisInput {
    fn from(article: &Article) -> Self {
        AnalysisInput {
            title: Some(article.title.clone()),
            description: article.description.clone(),
            content: article.content.clone(),
        }
    }
}

/// Wire shape of a NewsAPI response; `code`/`message` are only present
/// when `status` is "error".
#[derive(Debug, Deserialize)]
struct NewsResponse {
    status: String,
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

/// Client for the NewsAPI v2 endpoints.
pub struct NewsClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl NewsClient {
    pub fn new(api_key: &str) -> Result<Self, NewsError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            base_url: NEWSAPI_BASE_URL.to_string(),
        })
    }

    /// Fetch the current top headlines for a country, optionally narrowed
    /// to a category.
    pub async fn top_headlines(
        &self,
        country: &str,
        category: Option<&str>,
        page_size: u32,
    ) -> Result<Vec<Article>, NewsError> {
        let mut query = vec![
            ("country".to_string(), country.to_string()),
            ("pageSize".to_string(), page_size.to_string()),
        ];
        if let Some(category) = category {
            query.push(("category".to_string(), category.to_string()));
        }
        self.fetch("top-headlines", &query).await
    }

    /// Keyword search across everything the provider indexes, newest first.
    pub async fn search(&self, keyword: &str, page_size: u32) -> Result<Vec<Article>, NewsError> {
        let query = vec![
            ("q".to_string(), keyword.to_string()),
            ("sortBy".to_string(), "publishedAt".to_string()),
            ("pageSize".to_string(), page_size.to_string()),
        ];
        self.fetch("everything", &query).await
    }

    async fn fetch(
        &self,
        endpoint: &str,
        query: &[(String, String)],
    ) -> Result<Vec<Article>, NewsError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .http
            .get(&url)
            .query(query)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await?;

        let body: NewsResponse = response.json().await?;
        if body.status != "ok" {
            return Err(NewsError::Api {
                code: body.code.unwrap_or_else(|| "unknown".to_string()),
                message: body
                    .message
                    .unwrap_or_else(|| "no message provided".to_string()),
            });
        }

        info!(endpoint, count = body.articles.len(), "articles fetched");
        Ok(body.articles)
    }
}
