//! Turns search results into structured competitor candidates using a
//! language model plus deterministic regex post-processing for URLs and
//! social links.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use crate::dedup::dedup_within_batch;
use crate::traits::ai::MAX_EXTRACTION_TEMPERATURE;
use crate::traits::{AiClient, SearchResult};
use crate::types::{BasicCompetitor, EnrichedExtraction, SocialLinks};

/// Bounds how many search results are folded into a single prompt.
const MAX_RESULTS_PER_PROMPT: usize = 15;
/// Per-source content is truncated to this many characters before being
/// folded into the prompt, to bound prompt size.
const MAX_CONTENT_CHARS_PER_SOURCE: usize = 1_500;

/// What the candidates are being extracted for.
#[derive(Debug, Clone, Default)]
pub struct ExtractionContext {
    pub keywords: Vec<String>,
    pub regions: Vec<String>,
    pub industry: Option<String>,
}

fn build_source_blocks(results: &[SearchResult]) -> String {
    results
        .iter()
        .take(MAX_RESULTS_PER_PROMPT)
        .map(|r| {
            let content = r
                .content
                .as_deref()
                .map(|c| crate::util::truncate_chars(c, MAX_CONTENT_CHARS_PER_SOURCE))
                .unwrap_or_default();
            format!(
                "URL: {}\nTitle: {}\nSnippet: {}\nContent: {}\n---",
                r.url,
                r.title.as_deref().unwrap_or(""),
                r.snippet.as_deref().unwrap_or(""),
                content,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn basic_extraction_system_prompt() -> &'static str {
    "You extract real companies from web search results. Extract companies \
     from direct company pages and from listicle articles (\"Top 10 X in Y\"). \
     Skip generic news or directory pages unless the page itself is about the \
     subject company. Respond with a strict JSON array of objects, each with \
     name, website, description, industry, country (ISO-3166 alpha-2), \
     business_model, value_proposition, founded_year, total_funding. Omit \
     fields you cannot find. Respond with only the JSON array, no prose."
}

fn basic_extraction_user_prompt(blocks: &str, context: &ExtractionContext) -> String {
    format!(
        "Keywords: {}\nRegions: {}\nIndustry: {}\n\nSources:\n{}",
        context.keywords.join(", "),
        context.regions.join(", "),
        context.industry.as_deref().unwrap_or("unspecified"),
        blocks,
    )
}

/// Locate the first `[` and last `]` in `text` and parse the substring as a
/// JSON array. Returns `None` on any failure — callers treat that as an
/// empty, non-fatal extraction (`ExtractionEmpty`).
fn parse_json_array<T: serde::de::DeserializeOwned>(text: &str) -> Option<Vec<T>> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Normalize a URL: add `https://` if missing, strip trailing slashes.
pub fn normalize_url(url: &str) -> String {
    let with_scheme = if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{url}")
    };
    with_scheme.trim_end_matches('/').to_string()
}

lazy_static! {
    /// Country name / ISO-3166 alpha-3 → alpha-2, covering the markets this
    /// pipeline targets. Anything outside this table that isn't already a
    /// 2-letter code is dropped as ambiguous rather than guessed at.
    static ref COUNTRY_CODE_MAP: std::collections::HashMap<&'static str, &'static str> = {
        let mut m = std::collections::HashMap::new();
        m.insert("nigeria", "NG");
        m.insert("nga", "NG");
        m.insert("ghana", "GH");
        m.insert("gha", "GH");
        m.insert("kenya", "KE");
        m.insert("ken", "KE");
        m.insert("senegal", "SN");
        m.insert("sen", "SN");
        m.insert("south africa", "ZA");
        m.insert("zaf", "ZA");
        m.insert("egypt", "EG");
        m.insert("egy", "EG");
        m.insert("tanzania", "TZ");
        m.insert("tza", "TZ");
        m.insert("uganda", "UG");
        m.insert("uga", "UG");
        m.insert("rwanda", "RW");
        m.insert("rwa", "RW");
        m.insert("ethiopia", "ET");
        m.insert("eth", "ET");
        m.insert("ivory coast", "CI");
        m.insert("cote d'ivoire", "CI");
        m.insert("civ", "CI");
        m.insert("united states", "US");
        m.insert("usa", "US");
        m.insert("united kingdom", "GB");
        m.insert("gbr", "GB");
        m
    };
}

/// Normalize a country string to an ISO-3166 alpha-2 code. Already-2-letter
/// input is uppercased and trusted as-is; longer names/alpha-3 codes are
/// looked up in a known-market table; anything else is dropped as
/// ambiguous rather than guessed at.
pub fn normalize_country(country: &str) -> Option<String> {
    let trimmed = country.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().count() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(trimmed.to_uppercase());
    }
    COUNTRY_CODE_MAP
        .get(trimmed.to_lowercase().as_str())
        .map(|code| code.to_string())
}

fn sanitize(mut candidate: BasicCompetitor) -> Option<BasicCompetitor> {
    if candidate.name.trim().is_empty() || candidate.website.trim().is_empty() {
        return None;
    }
    candidate.website = normalize_url(&candidate.website);
    candidate.country = candidate.country.and_then(|c| normalize_country(&c));
    Some(candidate)
}

/// Extract basic competitor candidates from a batch of search results.
pub async fn extract_basic(
    results: &[SearchResult],
    context: &ExtractionContext,
    ai: &dyn AiClient,
) -> Vec<BasicCompetitor> {
    if results.is_empty() {
        return Vec::new();
    }
    let blocks = build_source_blocks(results);
    let user = basic_extraction_user_prompt(&blocks, context);

    let raw = match ai
        .complete(basic_extraction_system_prompt(), &user, MAX_EXTRACTION_TEMPERATURE)
        .await
    {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "extraction model call failed");
            return Vec::new();
        }
    };

    let Some(parsed) = parse_json_array::<BasicCompetitor>(&raw) else {
        warn!("extraction response was not a parseable JSON array");
        return Vec::new();
    };

    let sanitized: Vec<BasicCompetitor> = parsed.into_iter().filter_map(sanitize).collect();
    dedup_within_batch(sanitized)
}

lazy_static! {
    static ref LINKEDIN_RE: Regex =
        Regex::new(r"https?://(?:www\.)?linkedin\.com/company/[A-Za-z0-9._-]+").unwrap();
    static ref TWITTER_RE: Regex =
        Regex::new(r"https?://(?:www\.)?(?:twitter|x)\.com/[A-Za-z0-9_]+").unwrap();
    static ref FACEBOOK_RE: Regex =
        Regex::new(r"https?://(?:www\.)?facebook\.com/[A-Za-z0-9._-]+").unwrap();
    static ref INSTAGRAM_RE: Regex =
        Regex::new(r"https?://(?:www\.)?instagram\.com/[A-Za-z0-9._-]+").unwrap();
}

const EXCLUDED_SOCIAL_PATH_SEGMENTS: &[&str] = &["/intent", "/share", "/sharer", "/home"];

fn first_valid_match(re: &Regex, content: &str) -> Option<String> {
    re.find_iter(content)
        .map(|m| m.as_str().to_string())
        .find(|url| {
            let lower = url.to_lowercase();
            !EXCLUDED_SOCIAL_PATH_SEGMENTS.iter().any(|seg| lower.contains(seg))
        })
}

/// Deterministically extract social-profile links from raw page content.
/// Always run alongside model extraction; regex hits win on conflicts (see
/// [`crate::types::SocialLinks::merged_preferring`]).
pub fn extract_social_links(content: &str) -> SocialLinks {
    SocialLinks {
        linkedin: first_valid_match(&LINKEDIN_RE, content),
        twitter: first_valid_match(&TWITTER_RE, content),
        facebook: first_valid_match(&FACEBOOK_RE, content),
        instagram: first_valid_match(&INSTAGRAM_RE, content),
    }
}

fn enriched_extraction_system_prompt() -> &'static str {
    "You extract detailed company information from web page content. Respond \
     with a strict JSON object describing the company: name, website, \
     description, industry, country, tagline, headquarters, founders, \
     funding_stage, total_funding_raw (the funding amount exactly as \
     written, e.g. \"$1.2M\"), investors, technologies, and social_links \
     {linkedin, twitter, facebook, instagram}. Omit fields you cannot find. \
     Respond with only the JSON object, no prose."
}

/// Enriched-extraction variant used by the Enrichment Engine.
/// Social links from the model are merged with, and overridden by, regex
/// hits over the same raw content.
pub async fn extract_enriched(
    content: &str,
    url: &str,
    ai: &dyn AiClient,
) -> EnrichedExtraction {
    let user = format!(
        "URL: {}\n\nContent:\n{}",
        url,
        crate::util::truncate_chars(content, 8_000)
    );

    let mut extracted = match ai.extract_enriched(enriched_extraction_system_prompt(), &user).await
    {
        Ok(e) => e,
        Err(e) => {
            warn!(error = %e, "enriched extraction model call failed");
            EnrichedExtraction::default()
        }
    };

    let regex_links = extract_social_links(content);
    extracted.social_links = extracted.social_links.merged_preferring(regex_links);
    extracted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_url_adds_scheme_and_strips_slash() {
        assert_eq!(normalize_url("kuda.com/"), "https://kuda.com");
        assert_eq!(normalize_url("https://kuda.com/"), "https://kuda.com");
        assert_eq!(normalize_url("kuda.com"), "https://kuda.com");
    }

    #[test]
    fn normalize_country_maps_name_and_alpha3_to_alpha2() {
        assert_eq!(normalize_country("nigeria"), Some("NG".to_string()));
        assert_eq!(normalize_country("NGA"), Some("NG".to_string()));
        assert_eq!(normalize_country("gh"), Some("GH".to_string()));
        assert_eq!(normalize_country(""), None);
        assert_eq!(normalize_country("Atlantis"), None);
    }

    #[test]
    fn sanitize_discards_candidates_missing_required_fields() {
        let missing_website = BasicCompetitor {
            name: "Acme".into(),
            website: "".into(),
            ..Default::default()
        };
        assert!(sanitize(missing_website).is_none());
    }

    #[test]
    fn parse_json_array_recovers_from_surrounding_prose() {
        let text = "Here is the result:\n[{\"name\":\"Acme\",\"website\":\"acme.com\"}]\nThanks!";
        let parsed: Vec<BasicCompetitor> = parse_json_array(text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "Acme");
    }

    #[test]
    fn parse_json_array_returns_none_on_garbage() {
        let out: Option<Vec<BasicCompetitor>> = parse_json_array("not json at all");
        assert!(out.is_none());
    }

    #[test]
    fn social_links_exclude_share_intent_paths() {
        let content = "visit https://twitter.com/intent/tweet and https://twitter.com/acmeinc";
        let links = extract_social_links(content);
        assert_eq!(links.twitter.as_deref(), Some("https://twitter.com/acmeinc"));
    }

    #[tokio::test]
    async fn extract_basic_returns_empty_on_unparseable_response() {
        use crate::traits::ai::mock::MockAiClient;
        let ai = MockAiClient::new();
        *ai.complete_response.lock().unwrap() = Some("nonsense".to_string());
        let results = vec![SearchResult::new("https://acme.com").with_title("Acme")];
        let context = ExtractionContext::default();
        let candidates = extract_basic(&results, &context, &ai).await;
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn extract_basic_parses_and_sanitizes_valid_response() {
        use crate::traits::ai::mock::MockAiClient;
        let ai = MockAiClient::new();
        *ai.complete_response.lock().unwrap() = Some(
            r#"[{"name":"Kuda","website":"kuda.com","country":"nigeria"}]"#.to_string(),
        );
        let results = vec![SearchResult::new("https://kuda.com").with_title("Kuda")];
        let context = ExtractionContext::default();
        let candidates = extract_basic(&results, &context, &ai).await;
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].website, "https://kuda.com");
        assert_eq!(candidates[0].country.as_deref(), Some("NG"));
    }
}
