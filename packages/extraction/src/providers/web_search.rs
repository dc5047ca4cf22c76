//! Primary web-search-and-scrape provider.
//!
//! Talks to a Tavily-shaped search API: POST a query, get back ranked
//! results with optional raw page content. When its API key is absent the
//! provider reports itself unavailable and is skipped rather than retried.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ProviderError;
use crate::traits::search::{SearchOptions, SearchProvider, SearchResult};

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// Live web search with optional landing-page scraping.
pub struct PrimarySearchProvider {
    api_key: Option<SecretString>,
    client: reqwest::Client,
    base_url: String,
}

impl PrimarySearchProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.map(SecretString::from),
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn classify_status(status: reqwest::StatusCode) -> ProviderError {
        match status.as_u16() {
            402 => ProviderError::InsufficientCredits,
            429 => ProviderError::RateLimited,
            _ => ProviderError::Transport(format!("HTTP {status}")),
        }
    }
}

#[derive(Serialize)]
struct SearchRequest {
    query: String,
    max_results: usize,
    include_raw_content: bool,
}

#[derive(Deserialize)]
struct SearchResponseBody {
    results: Vec<SearchResultBody>,
}

#[derive(Deserialize)]
struct SearchResultBody {
    url: String,
    title: Option<String>,
    content: Option<String>,
    raw_content: Option<String>,
}

#[derive(Serialize)]
struct ScrapeRequest {
    urls: Vec<String>,
}

#[derive(Deserialize)]
struct ScrapeResponseBody {
    results: Vec<ScrapeResultBody>,
}

#[derive(Deserialize)]
struct ScrapeResultBody {
    raw_content: Option<String>,
}

#[async_trait]
impl SearchProvider for PrimarySearchProvider {
    fn name(&self) -> &'static str {
        "primary_web_search"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        let Some(api_key) = &self.api_key else {
            return Err(ProviderError::Unavailable);
        };

        let body = SearchRequest {
            query: query.to_string(),
            max_results: options.limit,
            include_raw_content: options.scrape_content,
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key.expose_secret()))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let err = Self::classify_status(response.status());
            warn!(status = %response.status(), "primary search provider returned error");
            return Err(err);
        }

        let parsed: SearchResponseBody = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(parsed
            .results
            .into_iter()
            .map(|r| {
                let mut result = SearchResult::new(r.url);
                if let Some(title) = r.title {
                    result = result.with_title(title);
                }
                if let Some(content) = r.content {
                    result = result.with_snippet(content);
                }
                if let Some(raw) = r.raw_content {
                    result = result.with_content(raw);
                }
                result
            })
            .collect())
    }

    async fn scrape(&self, url: &str) -> Result<String, ProviderError> {
        let Some(api_key) = &self.api_key else {
            return Err(ProviderError::Unavailable);
        };

        let response = self
            .client
            .post(format!("{}/extract", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key.expose_secret()))
            .json(&ScrapeRequest { urls: vec![url.to_string()] })
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::classify_status(response.status()));
        }

        let parsed: ScrapeResponseBody = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        parsed
            .results
            .into_iter()
            .next()
            .and_then(|r| r.raw_content)
            .ok_or_else(|| ProviderError::Transport("empty scrape response".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_without_api_key() {
        let provider = PrimarySearchProvider::new(None);
        assert!(!provider.is_available());
    }

    #[test]
    fn available_with_api_key() {
        let provider = PrimarySearchProvider::new(Some("key".to_string()));
        assert!(provider.is_available());
    }

    #[test]
    fn status_classification() {
        assert_eq!(
            PrimarySearchProvider::classify_status(reqwest::StatusCode::PAYMENT_REQUIRED),
            ProviderError::InsufficientCredits
        );
        assert_eq!(
            PrimarySearchProvider::classify_status(reqwest::StatusCode::TOO_MANY_REQUESTS),
            ProviderError::RateLimited
        );
        assert!(matches!(
            PrimarySearchProvider::classify_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR),
            ProviderError::Transport(_)
        ));
    }
}
