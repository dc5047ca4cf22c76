use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The extractor's output shape: the minimum a discovered company needs to
/// be scored and persisted.
///
/// Only `name` and `website` are required by the extraction contract;
/// everything else is `Option` because the model may not have surfaced it.
/// Kept as a closed variant distinct from [`EnrichedCompetitor`] rather than
/// one loosely-typed record, per the project's "no shape-polymorphism" rule.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct BasicCompetitor {
    pub name: String,
    pub website: String,
    pub description: Option<String>,
    pub industry: Option<String>,
    /// ISO-3166 alpha-2, uppercase.
    pub country: Option<String>,
    pub business_model: Option<String>,
    pub value_proposition: Option<String>,
    pub founded_year: Option<i32>,
    pub total_funding: Option<f64>,
}

/// Social profile URLs discovered for a competitor. A URL present here with
/// no matching entry in `data_sources` on [`EnrichedCompetitor`] is an
/// unverified synthesized guess, not a confirmed profile.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct SocialLinks {
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
}

impl SocialLinks {
    pub fn is_empty(&self) -> bool {
        self.linkedin.is_none()
            && self.twitter.is_none()
            && self.facebook.is_none()
            && self.instagram.is_none()
    }

    /// Overlay `other` on top of `self`, `other` winning on conflicts.
    /// Used to merge regex-derived links over model-extracted ones.
    pub fn merged_preferring(self, other: SocialLinks) -> SocialLinks {
        SocialLinks {
            linkedin: other.linkedin.or(self.linkedin),
            twitter: other.twitter.or(self.twitter),
            facebook: other.facebook.or(self.facebook),
            instagram: other.instagram.or(self.instagram),
        }
    }
}

/// Follower/employee counts observed on social profiles during enrichment.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct SocialMetrics {
    pub linkedin_employees: Option<u64>,
    pub linkedin_followers: Option<u64>,
    pub twitter_followers: Option<u64>,
    pub facebook_likes: Option<u64>,
}

/// Model-produced competitive analysis.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct SwotAnalysis {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub opportunities: Vec<String>,
    pub threats: Vec<String>,
    pub market_positioning: Option<String>,
    pub growth_signals: Vec<String>,
    pub risk_factors: Vec<String>,
}

impl SwotAnalysis {
    pub fn is_empty(&self) -> bool {
        self.strengths.is_empty()
            && self.weaknesses.is_empty()
            && self.opportunities.is_empty()
            && self.threats.is_empty()
    }
}

/// The full deep-enrichment record produced by walking a single competitor
/// through structured scraping, AI analysis, and scoring.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EnrichedCompetitor {
    pub name: String,
    pub website: String,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub tagline: Option<String>,
    pub headquarters: Option<String>,
    pub founders: Vec<String>,
    pub funding_stage: Option<String>,
    /// USD-equivalent, parsed from strings like `$1.2M` via the funding
    /// suffix table.
    pub total_funding: Option<f64>,
    pub investors: Vec<String>,
    pub technologies: Vec<String>,
    pub social_links: SocialLinks,
    pub social_metrics: SocialMetrics,
    pub swot: SwotAnalysis,
    pub confidence_score: u8,
    pub data_completeness: u8,
    pub data_sources: Vec<DataSource>,
    pub enrichment_date: DateTime<Utc>,
}

/// A contributing source of enrichment data, used to report provenance and
/// to distinguish verified social links from synthesized guesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Website,
    WebsiteCrawl,
    Linkedin,
    Twitter,
    Facebook,
    AiAnalysis,
}

/// A competitor in flight between the Extractor and Persistence, carrying
/// the provisional score and dedup key assigned along the way.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub data: BasicCompetitor,
    pub score: u8,
    pub normalized_domain: String,
}

/// Raw structured output from the enriched-extraction model call. Funding is
/// kept as the model's raw string (`"$1.2M"`) until the merge step parses it
/// through the suffix multiplier table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct EnrichedExtraction {
    pub name: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub tagline: Option<String>,
    pub headquarters: Option<String>,
    pub founders: Vec<String>,
    pub funding_stage: Option<String>,
    pub total_funding_raw: Option<String>,
    pub investors: Vec<String>,
    pub technologies: Vec<String>,
    pub social_links: SocialLinks,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn social_links_merge_prefers_overlay() {
        let base = SocialLinks {
            linkedin: Some("linkedin.com/company/a".into()),
            twitter: None,
            facebook: Some("facebook.com/a".into()),
            instagram: None,
        };
        let overlay = SocialLinks {
            linkedin: Some("linkedin.com/company/regex-found".into()),
            twitter: Some("twitter.com/a".into()),
            facebook: None,
            instagram: None,
        };
        let merged = base.merged_preferring(overlay);
        assert_eq!(merged.linkedin.as_deref(), Some("linkedin.com/company/regex-found"));
        assert_eq!(merged.twitter.as_deref(), Some("twitter.com/a"));
        assert_eq!(merged.facebook.as_deref(), Some("facebook.com/a"));
    }

    #[test]
    fn social_links_is_empty() {
        assert!(SocialLinks::default().is_empty());
        let mut links = SocialLinks::default();
        links.twitter = Some("twitter.com/a".into());
        assert!(!links.is_empty());
    }
}
