//! Adapts the project's `openai-client` crate to the [`AiClient`] trait so
//! the pipeline's query building, extraction, and scoring stay unaware of
//! which model provider is behind them.

use async_trait::async_trait;
use openai_client::{ChatRequest, Message, OpenAIClient};

use crate::error::PipelineError;
use crate::traits::ai::{AiClient, MAX_EXTRACTION_TEMPERATURE};
use crate::types::{BasicCompetitor, EnrichedExtraction, SwotAnalysis};

const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

fn map_err(e: openai_client::OpenAIError) -> PipelineError {
    PipelineError::Ai(Box::new(e))
}

/// `AiClient` backed by a live OpenAI (or OpenAI-compatible) endpoint.
pub struct OpenAiCompetitorClient {
    client: OpenAIClient,
    chat_model: String,
    embedding_model: String,
}

impl OpenAiCompetitorClient {
    pub fn new(client: OpenAIClient) -> Self {
        Self {
            client,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }

    /// Build from `CHAT_MODEL_API_KEY`, falling back to the default models.
    pub fn from_env() -> Result<Self, PipelineError> {
        let client = OpenAIClient::from_env().map_err(map_err)?;
        Ok(Self::new(client))
    }

    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }
}

fn synthesize_candidates_prompt(keywords: &[String], regions: &[String], industry: Option<&str>) -> String {
    format!(
        "Keywords: {}\nRegions: {}\nIndustry: {}\n\nName up to 10 real companies matching this profile. \
         Respond as a JSON array of objects with fields: name, website, description, industry, country, \
         business_model, value_proposition, founded_year, total_funding (number or null).",
        keywords.join(", "),
        regions.join(", "),
        industry.unwrap_or("any"),
    )
}

#[async_trait]
impl AiClient for OpenAiCompetitorClient {
    async fn complete(&self, system: &str, user: &str, temperature: f32) -> Result<String, PipelineError> {
        let request = ChatRequest {
            model: self.chat_model.clone(),
            messages: vec![Message::system(system), Message::user(user)],
            temperature: Some(temperature.min(MAX_EXTRACTION_TEMPERATURE)),
            ..Default::default()
        };
        let response = self.client.chat_completion(request).await.map_err(map_err)?;
        Ok(response.content)
    }

    async fn synthesize_candidates(
        &self,
        keywords: &[String],
        regions: &[String],
        industry: Option<&str>,
        limit: usize,
    ) -> Result<Vec<BasicCompetitor>, PipelineError> {
        let system = "You are a market researcher recalling real companies from training knowledge, \
                       with no live search available. Never invent a company you are not confident exists.";
        let user = synthesize_candidates_prompt(keywords, regions, industry);
        let mut candidates: Vec<BasicCompetitor> = self
            .client
            .extract(&self.chat_model, system, user, MAX_EXTRACTION_TEMPERATURE)
            .await
            .map_err(map_err)?;
        candidates.truncate(limit);
        Ok(candidates)
    }

    async fn extract_enriched(&self, system: &str, user: &str) -> Result<EnrichedExtraction, PipelineError> {
        self.client
            .extract(&self.chat_model, system, user, MAX_EXTRACTION_TEMPERATURE)
            .await
            .map_err(map_err)
    }

    async fn analyze_swot(&self, system: &str, user: &str) -> Result<SwotAnalysis, PipelineError> {
        self.client
            .extract(&self.chat_model, system, user, MAX_EXTRACTION_TEMPERATURE)
            .await
            .map_err(map_err)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, PipelineError> {
        self.client
            .create_embedding(text, &self.embedding_model)
            .await
            .map_err(map_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_default_models() {
        let client = OpenAiCompetitorClient::new(OpenAIClient::new("sk-test"))
            .with_chat_model("gpt-4o-mini")
            .with_embedding_model("text-embedding-3-large");
        assert_eq!(client.chat_model, "gpt-4o-mini");
        assert_eq!(client.embedding_model, "text-embedding-3-large");
    }

    #[test]
    fn synthesize_prompt_includes_all_fields() {
        let prompt = synthesize_candidates_prompt(
            &["banking".to_string()],
            &["NG".to_string()],
            Some("Fintech"),
        );
        assert!(prompt.contains("banking"));
        assert!(prompt.contains("NG"));
        assert!(prompt.contains("Fintech"));
    }
}
