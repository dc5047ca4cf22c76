//! Search provider trait: live web search with scrape, and an AI fallback.
//!
//! Two implementations share this trait (see `providers`): a primary
//! web-search-and-scrape provider and an AI-only fallback that synthesizes
//! candidates from model knowledge when the primary is exhausted.

use async_trait::async_trait;

use crate::error::ProviderError;

/// One search hit.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub url: String,
    pub title: Option<String>,
    pub snippet: Option<String>,
    /// Markdown of the landing page, present only when scraping was requested.
    pub content: Option<String>,
}

impl SearchResult {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            snippet: None,
            content: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Options for a single search call.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub limit: usize,
    pub scrape_content: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            scrape_content: false,
        }
    }
}

/// Uniform capability shared by every search backend.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Human-readable name, used in logs and `data_sources`-style reporting.
    fn name(&self) -> &'static str;

    /// Whether this provider has what it needs to run (typically: a
    /// configured credential). An unavailable provider is skipped, not
    /// retried.
    fn is_available(&self) -> bool;

    async fn search(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> Result<Vec<SearchResult>, ProviderError>;

    /// Fetch a single URL's content as Markdown. Only the primary provider
    /// needs a real implementation; the fallback provider returns
    /// `Unavailable`.
    async fn scrape(&self, url: &str) -> Result<String, ProviderError>;
}

#[cfg(any(test, feature = "testing"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// Test double recording canned results per query, and whether it
    /// should report itself unavailable or return a fixed error.
    #[derive(Default)]
    pub struct MockSearchProvider {
        results: RwLock<HashMap<String, Vec<SearchResult>>>,
        available: std::sync::atomic::AtomicBool,
        error: RwLock<Option<ProviderError>>,
    }

    impl MockSearchProvider {
        pub fn new() -> Self {
            let m = Self::default();
            m.available.store(true, std::sync::atomic::Ordering::SeqCst);
            m
        }

        pub fn with_results(self, query: &str, results: Vec<SearchResult>) -> Self {
            self.results
                .write()
                .unwrap()
                .insert(query.to_string(), results);
            self
        }

        pub fn unavailable(self) -> Self {
            self.available.store(false, std::sync::atomic::Ordering::SeqCst);
            self
        }

        pub fn failing_with(self, error: ProviderError) -> Self {
            *self.error.write().unwrap() = Some(error);
            self
        }
    }

    #[async_trait]
    impl SearchProvider for MockSearchProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn is_available(&self) -> bool {
            self.available.load(std::sync::atomic::Ordering::SeqCst)
        }

        async fn search(
            &self,
            query: &str,
            options: SearchOptions,
        ) -> Result<Vec<SearchResult>, ProviderError> {
            if let Some(err) = self.error.read().unwrap().clone() {
                return Err(err);
            }
            let mut results = self
                .results
                .read()
                .unwrap()
                .get(query)
                .cloned()
                .unwrap_or_default();
            results.truncate(options.limit);
            Ok(results)
        }

        async fn scrape(&self, _url: &str) -> Result<String, ProviderError> {
            Ok(String::new())
        }
    }
}
