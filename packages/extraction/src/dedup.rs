//! Two-stage dedup (within-batch, cross-corpus) plus an optional semantic
//! pass that degrades to a no-op when the embedding collaborator is down.

use std::collections::HashSet;

use tracing::warn;
use url::Url;
use uuid::Uuid;

use crate::traits::{AiClient, CompetitorStore};
use crate::types::BasicCompetitor;

const SEMANTIC_SIMILARITY_THRESHOLD: f64 = 0.85;

/// `lower(strip-www(hostname))`. Used as the dedup key everywhere a
/// candidate or competitor needs to be compared by domain.
pub fn normalize_domain(url: &str) -> String {
    let candidate = if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{url}")
    };
    let Ok(parsed) = Url::parse(&candidate) else {
        return url.to_lowercase();
    };
    let host = parsed.host_str().unwrap_or(url).to_lowercase();
    host.strip_prefix("www.").unwrap_or(&host).to_string()
}

/// Drop candidates that share a normalized domain with an earlier entry in
/// the same batch. First occurrence wins.
pub fn dedup_within_batch(candidates: Vec<BasicCompetitor>) -> Vec<BasicCompetitor> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(normalize_domain(&c.website)))
        .collect()
}

/// Drop candidates whose normalized domain already exists somewhere in the
/// tenant's corpus.
pub fn dedup_against_corpus(
    candidates: Vec<BasicCompetitor>,
    existing_domains: &[String],
) -> Vec<BasicCompetitor> {
    let existing: HashSet<&str> = existing_domains.iter().map(|d| d.as_str()).collect();
    candidates
        .into_iter()
        .filter(|c| !existing.contains(normalize_domain(&c.website).as_str()))
        .collect()
}

fn fingerprint(candidate: &BasicCompetitor) -> String {
    [
        Some(candidate.name.as_str()),
        candidate.description.as_deref(),
        candidate.value_proposition.as_deref(),
        candidate.business_model.as_deref(),
        candidate.industry.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" | ")
}

/// Optional semantic dedup against the tenant's existing embeddings.
/// Never fails the caller: an embedding or store error is logged and the
/// candidate is admitted, per the "advisory filter" design note.
pub async fn semantic_dedup(
    candidates: Vec<BasicCompetitor>,
    ai: &dyn AiClient,
    store: &dyn CompetitorStore,
    organization_id: Uuid,
) -> Vec<BasicCompetitor> {
    let mut kept = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let embedding = match ai.embed(&fingerprint(&candidate)).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "semantic dedup embedding failed, admitting candidate");
                kept.push(candidate);
                continue;
            }
        };
        match store
            .match_competitors_by_embedding(
                organization_id,
                &embedding,
                SEMANTIC_SIMILARITY_THRESHOLD,
                1,
            )
            .await
        {
            Ok(matches) if matches.is_empty() => kept.push(candidate),
            Ok(_) => {
                // A sufficiently similar existing competitor exists; treat as duplicate.
            }
            Err(e) => {
                warn!(error = %e, "semantic dedup lookup failed, admitting candidate");
                kept.push(candidate);
            }
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, website: &str) -> BasicCompetitor {
        BasicCompetitor {
            name: name.into(),
            website: website.into(),
            ..Default::default()
        }
    }

    #[test]
    fn normalize_strips_www_and_scheme() {
        assert_eq!(normalize_domain("https://www.Kuda.com/about"), "kuda.com");
        assert_eq!(normalize_domain("kuda.com"), "kuda.com");
        assert_eq!(normalize_domain("http://KUDA.COM"), "kuda.com");
    }

    #[test]
    fn within_batch_dedup_keeps_first_occurrence() {
        let candidates = vec![
            candidate("Kuda", "https://kuda.com"),
            candidate("Kuda Bank", "https://www.kuda.com/alt"),
            candidate("Carbon", "https://carbon.ng"),
        ];
        let deduped = dedup_within_batch(candidates);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].name, "Kuda");
    }

    #[test]
    fn cross_corpus_dedup_drops_known_domains() {
        let candidates = vec![
            candidate("Kuda", "https://kuda.com"),
            candidate("Carbon", "https://carbon.ng"),
        ];
        let deduped = dedup_against_corpus(candidates, &["kuda.com".to_string()]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].name, "Carbon");
    }

    #[tokio::test]
    async fn semantic_dedup_admits_candidate_on_embedding_failure() {
        use crate::traits::ai::mock::MockAiClient;
        use crate::traits::store::mock::InMemoryStore;

        let ai = MockAiClient::new().always_fail();
        let store = InMemoryStore::new();
        let candidates = vec![candidate("Kuda", "https://kuda.com")];

        let kept = semantic_dedup(candidates, &ai, &store, Uuid::new_v4()).await;
        assert_eq!(kept.len(), 1);
    }
}
