//! The chat-completion/embedding collaborator the pipeline extracts and
//! analyzes through. One trait so the Extractor, the AI fallback provider,
//! and the Enrichment Engine can all be exercised against a mock.

use async_trait::async_trait;

use crate::error::PipelineError;
use crate::types::{BasicCompetitor, EnrichedExtraction, SwotAnalysis};

/// Low temperature ceiling required for every extraction/analysis call, to
/// keep structured output deterministic enough to parse reliably.
pub const MAX_EXTRACTION_TEMPERATURE: f32 = 0.3;

#[async_trait]
pub trait AiClient: Send + Sync {
    /// Prompt the model with a pre-built system/user pair and return the raw
    /// text response. Callers own parsing; this exists so the Extractor can
    /// apply its own bracket-substring recovery instead of a generic JSON
    /// decode.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<String, PipelineError>;

    /// Synthesize up to `limit` plausible candidate companies from model
    /// knowledge alone (no live search). Used only by the AI fallback
    /// provider.
    async fn synthesize_candidates(
        &self,
        keywords: &[String],
        regions: &[String],
        industry: Option<&str>,
        limit: usize,
    ) -> Result<Vec<BasicCompetitor>, PipelineError>;

    /// Structured extraction for the deep enrichment path.
    async fn extract_enriched(
        &self,
        system: &str,
        user: &str,
    ) -> Result<EnrichedExtraction, PipelineError>;

    /// SWOT/positioning analysis for the deep enrichment path.
    async fn analyze_swot(&self, system: &str, user: &str) -> Result<SwotAnalysis, PipelineError>;

    /// Fixed-dimension embedding vector for a text fingerprint. Used only by
    /// the Deduplicator's optional semantic pass; callers must treat
    /// failures as advisory, never fatal.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PipelineError>;
}

#[cfg(any(test, feature = "testing"))]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Test double returning canned responses, recording every call made to
    /// it so tests can assert on call order/arguments where it matters.
    #[derive(Default)]
    pub struct MockAiClient {
        pub complete_response: Mutex<Option<String>>,
        pub synthesized: Mutex<Vec<BasicCompetitor>>,
        pub enriched: Mutex<EnrichedExtraction>,
        pub swot: Mutex<SwotAnalysis>,
        pub embedding: Mutex<Vec<f32>>,
        pub fail: std::sync::atomic::AtomicBool,
    }

    impl MockAiClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn always_fail(self) -> Self {
            self.fail.store(true, std::sync::atomic::Ordering::SeqCst);
            self
        }

        fn check_fail(&self) -> Result<(), PipelineError> {
            if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(PipelineError::Ai("mock configured to fail".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl AiClient for MockAiClient {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            _temperature: f32,
        ) -> Result<String, PipelineError> {
            self.check_fail()?;
            Ok(self.complete_response.lock().unwrap().clone().unwrap_or_default())
        }

        async fn synthesize_candidates(
            &self,
            _keywords: &[String],
            _regions: &[String],
            _industry: Option<&str>,
            limit: usize,
        ) -> Result<Vec<BasicCompetitor>, PipelineError> {
            self.check_fail()?;
            let mut out = self.synthesized.lock().unwrap().clone();
            out.truncate(limit);
            Ok(out)
        }

        async fn extract_enriched(
            &self,
            _system: &str,
            _user: &str,
        ) -> Result<EnrichedExtraction, PipelineError> {
            self.check_fail()?;
            Ok(self.enriched.lock().unwrap().clone())
        }

        async fn analyze_swot(
            &self,
            _system: &str,
            _user: &str,
        ) -> Result<SwotAnalysis, PipelineError> {
            self.check_fail()?;
            Ok(self.swot.lock().unwrap().clone())
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, PipelineError> {
            self.check_fail()?;
            Ok(self.embedding.lock().unwrap().clone())
        }
    }
}
