//! AI-only fallback provider.
//!
//! Synthesizes plausible candidate companies from model knowledge when the
//! primary search provider is exhausted or returns nothing. Used only by
//! the Worker's composition logic, not through the [`SearchProvider`] trait
//! — it takes structured keywords/regions/industry rather than a single
//! free-text query.
//!
//! [`SearchProvider`]: crate::traits::search::SearchProvider

use tracing::warn;

use crate::traits::search::SearchResult;
use crate::traits::AiClient;

/// Synthesize up to `limit` candidate companies and present them in the
/// same shape the primary provider would have returned, so downstream
/// extraction is provider-agnostic.
pub async fn synthesize(
    ai: &dyn AiClient,
    keywords: &[String],
    regions: &[String],
    industry: Option<&str>,
    limit: usize,
) -> Vec<SearchResult> {
    let candidates = match ai.synthesize_candidates(keywords, regions, industry, limit).await {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "AI fallback provider failed to synthesize candidates");
            return Vec::new();
        }
    };

    candidates
        .into_iter()
        .filter(|c| !c.name.trim().is_empty() && !c.website.trim().is_empty())
        .map(|c| {
            let mut snippet = c.description.unwrap_or_default();
            if let Some(country) = c.country {
                snippet = format!("{snippet} (country: {country})");
            }
            SearchResult::new(c.website)
                .with_title(c.name)
                .with_snippet(snippet)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ai::mock::MockAiClient;
    use crate::types::BasicCompetitor;

    #[tokio::test]
    async fn synthesize_rejects_candidates_missing_required_fields() {
        let ai = MockAiClient::new();
        *ai.synthesized.lock().unwrap() = vec![
            BasicCompetitor {
                name: "Valid Co".into(),
                website: "validco.com".into(),
                country: Some("NG".into()),
                ..Default::default()
            },
            BasicCompetitor {
                name: "".into(),
                website: "missingname.com".into(),
                ..Default::default()
            },
        ];

        let results = synthesize(&ai, &["fintech".to_string()], &["NG".to_string()], None, 10).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "validco.com");
    }

    #[tokio::test]
    async fn synthesize_returns_empty_on_ai_failure() {
        let ai = MockAiClient::new().always_fail();
        let results = synthesize(&ai, &[], &[], None, 5).await;
        assert!(results.is_empty());
    }
}
