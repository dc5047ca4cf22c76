//! Deep single-URL enrichment pipeline: structured scrape, optional
//! crawl, social-link synthesis and probing, AI SWOT analysis, merge, and
//! completeness/confidence scoring.

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use crate::error::PipelineError;
use crate::extractor::extract_enriched;
use crate::funding::parse_funding_usd;
use crate::traits::search::SearchProvider;
use crate::traits::AiClient;
use crate::types::{
    BasicCompetitor, DataSource, EnrichedCompetitor, SocialLinks, SocialMetrics, SwotAnalysis,
};

/// Paths probed during a deep crawl, in probe order. The crawl stops after
/// `crawl_depth` pages regardless of how many of these exist.
const CRAWL_ALLOW_LIST: &[&str] = &["/about", "/team", "/pricing", "/product", "/company"];

const MAX_ADDITIONAL_CONTEXT_CHARS: usize = 2_000;

#[derive(Debug, Clone, Copy)]
pub struct EnrichmentOptions {
    pub include_social_media: bool,
    pub include_ai_analysis: bool,
    pub crawl_depth: u32,
}

impl Default for EnrichmentOptions {
    fn default() -> Self {
        Self {
            include_social_media: true,
            include_ai_analysis: true,
            crawl_depth: 1,
        }
    }
}

/// Run the full deep-enrichment pipeline for one competitor.
pub async fn enrich(
    url: &str,
    initial: Option<BasicCompetitor>,
    options: EnrichmentOptions,
    search: &dyn SearchProvider,
    ai: &dyn AiClient,
) -> Result<EnrichedCompetitor, PipelineError> {
    let mut sources = Vec::new();

    // 1. Structured scrape.
    let scraped_content = search.scrape(url).await.ok();
    let extracted = match &scraped_content {
        Some(content) => {
            sources.push(DataSource::Website);
            extract_enriched(content, url, ai).await
        }
        None => Default::default(),
    };

    // 2. Optional deep crawl.
    let mut additional_context = String::new();
    if options.crawl_depth > 1 {
        let page_cap = options.crawl_depth as usize;
        for path in CRAWL_ALLOW_LIST.iter().take(page_cap) {
            let page_url = format!("{}{}", url.trim_end_matches('/'), path);
            if let Ok(content) = search.scrape(&page_url).await {
                additional_context.push_str(&content);
                additional_context.push('\n');
            }
        }
        if !additional_context.is_empty() && !sources.contains(&DataSource::WebsiteCrawl) {
            sources.push(DataSource::WebsiteCrawl);
        }
    }

    // 3. Social-link synthesis.
    let mut social_links = extracted.social_links.clone();
    let mut synthesized_only = false;
    if social_links.is_empty() {
        let name = extracted
            .name
            .clone()
            .or_else(|| initial.as_ref().map(|i| i.name.clone()));
        if let Some(name) = name {
            social_links = synthesize_social_links(&name);
            synthesized_only = true;
        }
    }

    // 4. Social enrichment (only probes links that weren't just guessed).
    let mut metrics = SocialMetrics::default();
    if options.include_social_media && !synthesized_only {
        probe_social_links(&social_links, search, &mut metrics, &mut sources).await;
    }

    // 5. AI analysis.
    let swot = if options.include_ai_analysis {
        let context = crate::util::truncate_chars(&additional_context, MAX_ADDITIONAL_CONTEXT_CHARS);
        match run_ai_analysis(ai, &extracted, &context).await {
            Some(swot) => {
                sources.push(DataSource::AiAnalysis);
                swot
            }
            None => fallback_swot(&extracted, initial.as_ref()),
        }
    } else {
        SwotAnalysis::default()
    };

    // 6. Merge with precedence: enrichment output > initial input > URL fallback.
    let merged = merge(url, extracted, initial, social_links, swot, metrics, sources);

    Ok(merged)
}

fn merge(
    url: &str,
    extracted: crate::types::EnrichedExtraction,
    initial: Option<BasicCompetitor>,
    social_links: SocialLinks,
    swot: SwotAnalysis,
    social_metrics: SocialMetrics,
    data_sources: Vec<DataSource>,
) -> EnrichedCompetitor {
    let url_fallback_name = domain_to_name(url);

    let name = extracted
        .name
        .or_else(|| initial.as_ref().map(|i| i.name.clone()))
        .unwrap_or(url_fallback_name);
    let website = extracted
        .website
        .or_else(|| initial.as_ref().map(|i| i.website.clone()))
        .unwrap_or_else(|| url.to_string());
    let description = extracted.description.or_else(|| initial.as_ref().and_then(|i| i.description.clone()));
    let industry = extracted.industry.or_else(|| initial.as_ref().and_then(|i| i.industry.clone()));
    let country = extracted.country.or_else(|| initial.as_ref().and_then(|i| i.country.clone()));

    let total_funding = extracted
        .total_funding_raw
        .as_deref()
        .and_then(parse_funding_usd)
        .or_else(|| initial.as_ref().and_then(|i| i.total_funding));

    let mut enriched = EnrichedCompetitor {
        name,
        website,
        description,
        industry,
        country,
        tagline: extracted.tagline,
        headquarters: extracted.headquarters,
        founders: extracted.founders,
        funding_stage: extracted.funding_stage,
        total_funding,
        investors: extracted.investors,
        technologies: extracted.technologies,
        social_links,
        social_metrics,
        swot,
        confidence_score: 0,
        data_completeness: 0,
        data_sources,
        enrichment_date: Utc::now(),
    };

    enriched.data_completeness = data_completeness(&enriched);
    enriched.confidence_score = confidence_score(&enriched);
    enriched
}

fn domain_to_name(url: &str) -> String {
    let without_scheme = url.trim_start_matches("https://").trim_start_matches("http://");
    let host = without_scheme.split('/').next().unwrap_or(without_scheme);
    let host = host.strip_prefix("www.").unwrap_or(host);
    let label = host.split('.').next().unwrap_or(host);
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => host.to_string(),
    }
}

fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// UI-convenience guesses, unverified until a scrape confirms them — the
/// caller must not add a matching `data_sources` entry for these.
fn synthesize_social_links(name: &str) -> SocialLinks {
    let slug = slugify(name);
    SocialLinks {
        linkedin: Some(format!("https://linkedin.com/company/{slug}")),
        twitter: Some(format!("https://twitter.com/{slug}")),
        facebook: Some(format!("https://facebook.com/{slug}")),
        instagram: None,
    }
}

lazy_static! {
    static ref COUNT_RE: Regex =
        Regex::new(r"(?i)([\d.,]+)\s*([kKmM])?\s*(?:followers|abonn[ée]s|likes|j'aime|employees)").unwrap();
}

fn parse_social_count(text: &str) -> Option<u64> {
    let captures = COUNT_RE.captures(text)?;
    let number_str = captures.get(1)?.as_str().replace(',', "");
    let number: f64 = number_str.parse().ok()?;
    let multiplier = match captures.get(2).map(|m| m.as_str().to_lowercase()).as_deref() {
        Some("k") => 1_000.0,
        Some("m") => 1_000_000.0,
        _ => 1.0,
    };
    Some((number * multiplier).round() as u64)
}

async fn probe_social_links(
    links: &SocialLinks,
    search: &dyn SearchProvider,
    metrics: &mut SocialMetrics,
    sources: &mut Vec<DataSource>,
) {
    if let Some(url) = &links.linkedin {
        if let Ok(content) = search.scrape(url).await {
            metrics.linkedin_followers = parse_social_count(&content);
            sources.push(DataSource::Linkedin);
        }
    }
    if let Some(url) = &links.twitter {
        if let Ok(content) = search.scrape(url).await {
            metrics.twitter_followers = parse_social_count(&content);
            sources.push(DataSource::Twitter);
        }
    }
    if let Some(url) = &links.facebook {
        if let Ok(content) = search.scrape(url).await {
            metrics.facebook_likes = parse_social_count(&content);
            sources.push(DataSource::Facebook);
        }
    }
}

fn ai_analysis_system_prompt() -> &'static str {
    "You are a competitive-intelligence analyst. Given the company data \
     below, respond with a strict JSON object: {\"strengths\": [...], \
     \"weaknesses\": [...], \"opportunities\": [...], \"threats\": [...], \
     \"market_positioning\": \"...\", \"growth_signals\": [...], \
     \"risk_factors\": [...]}. Respond with only the JSON object."
}

async fn run_ai_analysis(
    ai: &dyn AiClient,
    extracted: &crate::types::EnrichedExtraction,
    additional_context: &str,
) -> Option<SwotAnalysis> {
    let user = format!(
        "Company: {}\nDescription: {}\nIndustry: {}\nAdditional context: {}",
        extracted.name.as_deref().unwrap_or("unknown"),
        extracted.description.as_deref().unwrap_or(""),
        extracted.industry.as_deref().unwrap_or(""),
        additional_context,
    );
    match ai.analyze_swot(ai_analysis_system_prompt(), &user).await {
        Ok(swot) if !swot.is_empty() => Some(swot),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "AI SWOT analysis failed, using deterministic fallback");
            None
        }
    }
}

/// Deterministic substitute when the AI analysis call fails, derived only
/// from fields already on hand.
fn fallback_swot(
    extracted: &crate::types::EnrichedExtraction,
    initial: Option<&BasicCompetitor>,
) -> SwotAnalysis {
    let mut swot = SwotAnalysis::default();
    if extracted.total_funding_raw.is_some() {
        swot.strengths.push("Has disclosed funding".to_string());
    }
    if !extracted.technologies.is_empty() {
        swot.strengths.push("Documented technology stack".to_string());
    }
    if extracted.founders.is_empty() {
        swot.weaknesses.push("Founders not publicly identified".to_string());
    }
    if let Some(industry) = extracted.industry.clone().or_else(|| initial.and_then(|i| i.industry.clone())) {
        swot.market_positioning = Some(format!("Operates in {industry}"));
    }
    swot
}

/// 14 important fields whose presence drives `data_completeness`.
fn data_completeness(c: &EnrichedCompetitor) -> u8 {
    let checks: [bool; 14] = [
        !c.name.trim().is_empty(),
        !c.website.trim().is_empty(),
        c.description.as_deref().is_some_and(|s| !s.trim().is_empty()),
        c.industry.is_some(),
        c.country.is_some(),
        c.tagline.is_some(),
        c.headquarters.is_some(),
        !c.founders.is_empty(),
        c.funding_stage.is_some(),
        c.total_funding.is_some(),
        !c.investors.is_empty(),
        !c.technologies.is_empty(),
        !c.social_links.is_empty(),
        !c.swot.is_empty(),
    ];
    let filled = checks.iter().filter(|f| **f).count();
    ((filled as f64 / checks.len() as f64) * 100.0).round() as u8
}

fn confidence_score(c: &EnrichedCompetitor) -> u8 {
    let source_points = ((c.data_sources.len() as f64) * 10.0).min(40.0);
    let completeness_points = (c.data_completeness as f64 * 0.3).round();
    let mut bonus = 0.0;
    if !c.website.trim().is_empty() {
        bonus += 5.0;
    }
    if c.social_links.linkedin.is_some() && c.data_sources.contains(&DataSource::Linkedin) {
        bonus += 10.0;
    }
    if c.funding_stage.is_some() {
        bonus += 5.0;
    }
    if !c.founders.is_empty() {
        bonus += 5.0;
    }
    if !c.technologies.is_empty() {
        bonus += 5.0;
    }
    let total = source_points + completeness_points + bonus;
    total.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_social_count_handles_k_suffix() {
        assert_eq!(parse_social_count("32.5K followers"), Some(32_500));
        assert_eq!(parse_social_count("48,000 employees"), Some(48_000));
        assert_eq!(parse_social_count("1.2M likes"), Some(1_200_000));
    }

    #[test]
    fn parse_social_count_handles_locale_keywords() {
        assert_eq!(parse_social_count("2.3K abonnés"), Some(2_300));
        assert_eq!(parse_social_count("500 j'aime"), Some(500));
    }

    #[test]
    fn domain_to_name_capitalizes_host_label() {
        assert_eq!(domain_to_name("https://flutterwave.com"), "Flutterwave");
        assert_eq!(domain_to_name("https://www.kuda.com/about"), "Kuda");
    }

    #[test]
    fn slugify_strips_non_alnum() {
        assert_eq!(slugify("Acme, Inc."), "acmeinc");
    }

    #[test]
    fn confidence_score_is_capped_at_100() {
        let mut c = EnrichedCompetitor {
            data_sources: vec![
                DataSource::Website,
                DataSource::WebsiteCrawl,
                DataSource::Linkedin,
                DataSource::Twitter,
                DataSource::Facebook,
                DataSource::AiAnalysis,
            ],
            data_completeness: 100,
            funding_stage: Some("Series A".into()),
            founders: vec!["Jane".into()],
            technologies: vec!["Rust".into()],
            website: "https://acme.com".into(),
            ..Default::default()
        };
        c.social_links.linkedin = Some("https://linkedin.com/company/acme".into());
        assert_eq!(confidence_score(&c), 100);
    }

    #[test]
    fn zero_sources_yields_low_confidence() {
        let c = EnrichedCompetitor {
            data_completeness: 0,
            ..Default::default()
        };
        assert!(confidence_score(&c) <= 30);
    }
}
